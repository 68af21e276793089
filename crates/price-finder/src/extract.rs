/// Table extraction: document tables → normalized pricing records.
///
/// Column layout (after the header row of each table):
/// 0 product name, 1 sale value, 2 system limit, 3 table limit, 4 five-percent price.
///
/// Rows with fewer than five cells or an empty product name are skipped. Records keep
/// encounter order across pages and tables and are never deduplicated.
use chrono::{DateTime, Utc};
use tracing::debug;

use pricing_common::ids::{self, RowPosition};
use pricing_common::model::{Highlight, PricingRecord};

use crate::color;
use crate::document::{Cell, Row, TableDocument};

const MIN_CELLS: usize = 5;

/// Extract every valid product row of `document`, stamped with `captured_at`.
pub fn extract(document: &TableDocument, captured_at: DateTime<Utc>) -> Vec<PricingRecord> {
    let mut records = Vec::new();
    let mut skipped = 0usize;

    for (page_idx, page) in document.pages.iter().enumerate() {
        for (table_idx, table) in page.tables.iter().enumerate() {
            // Row 0 is the header.
            for (row_idx, row) in table.iter().enumerate().skip(1) {
                match extract_row(row, (page_idx, table_idx, row_idx), captured_at) {
                    Some(record) => records.push(record),
                    None => skipped += 1,
                }
            }
        }
    }

    debug!(records = records.len(), skipped, "table extraction finished");
    records
}

fn extract_row(
    row: &Row,
    position: RowPosition,
    captured_at: DateTime<Utc>,
) -> Option<PricingRecord> {
    if row.len() < MIN_CELLS {
        return None;
    }
    let product_name = cell_text(&row[0]);
    if product_name.is_empty() {
        return None;
    }

    Some(PricingRecord {
        id: ids::record_id(position, &product_name),
        sale_value: cell_text(&row[1]),
        system_limit: cell_text(&row[2]),
        table_limit: cell_text(&row[3]),
        five_percent: cell_text(&row[4]),
        sale_value_highlight: cell_highlight(&row[1]),
        system_limit_highlight: cell_highlight(&row[2]),
        table_limit_highlight: cell_highlight(&row[3]),
        five_percent_highlight: cell_highlight(&row[4]),
        product_name,
        created_at: captured_at,
    })
}

fn cell_text(cell: &Cell) -> String {
    cell.text.as_deref().map(str::trim).unwrap_or_default().to_string()
}

fn cell_highlight(cell: &Cell) -> Highlight {
    color::dominant(&cell.colors)
}
