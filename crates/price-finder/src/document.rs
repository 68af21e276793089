/// Document loading: uploaded bytes → pages of tables of rows of cells.
///
/// Three input formats are accepted:
/// - PDF files. Text placement and fill colors are read from each page's content
///   stream (see `pdf`) and rows are rebuilt against the header's column positions.
/// - JSON table dumps produced by an external layout tool. Cells may carry per-glyph
///   color samples, which feed highlight classification.
/// - Fixed-width text exports, one page per form feed. Cells are separated by two or
///   more spaces or a tab and placed by character column. They carry no colors.
use serde::Deserialize;
use tracing::debug;

use crate::color::Rgb;
use crate::error::AppError;
use crate::{layout, pdf};

/// A parsed document ready for extraction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableDocument {
    pub pages: Vec<Page>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub tables: Vec<Table>,
}

pub type Table = Vec<Row>;
pub type Row = Vec<Cell>;

/// One table cell: its text (absent for empty cells) and the color of each glyph.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cell {
    pub text: Option<String>,
    pub colors: Vec<Rgb>,
}

impl Cell {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            colors: Vec::new(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_colors(mut self, colors: Vec<Rgb>) -> Self {
        self.colors = colors;
        self
    }
}

/// Input format, chosen from the uploaded file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    JsonTables,
    Text,
}

impl DocumentKind {
    pub fn from_file_name(file_name: &str) -> Result<Self, AppError> {
        let lower = file_name.trim().to_lowercase();
        if lower.ends_with(".pdf") {
            Ok(DocumentKind::Pdf)
        } else if lower.ends_with(".json") {
            Ok(DocumentKind::JsonTables)
        } else if lower.ends_with(".txt") {
            Ok(DocumentKind::Text)
        } else {
            Err(AppError::UnsupportedFile(file_name.to_string()))
        }
    }
}

/// Load `bytes` as a document of the given kind.
pub fn load(kind: DocumentKind, bytes: &[u8]) -> Result<TableDocument, AppError> {
    match kind {
        DocumentKind::Pdf => pdf::load_pdf(bytes),
        DocumentKind::JsonTables => load_json_tables(bytes),
        DocumentKind::Text => Ok(load_text(bytes)),
    }
}

// --- JSON table dumps ---

#[derive(Debug, Deserialize)]
struct RawDocument {
    pages: Vec<RawPage>,
}

#[derive(Debug, Deserialize)]
struct RawPage {
    #[serde(default)]
    tables: Vec<Vec<Vec<Option<RawCell>>>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawCell {
    Text(String),
    Detailed {
        text: Option<String>,
        #[serde(default)]
        colors: Vec<Vec<f64>>,
    },
}

/// Parse a JSON table dump:
/// `{"pages": [{"tables": [[[cell, ...], ...], ...]}]}` where a cell is `null`, a
/// string, or `{"text": ..., "colors": [[r, g, b], ...]}`.
pub fn load_json_tables(bytes: &[u8]) -> Result<TableDocument, AppError> {
    let raw: RawDocument = serde_json::from_slice(bytes)
        .map_err(|e| AppError::Document(format!("invalid table dump: {e}")))?;

    let mut pages = Vec::with_capacity(raw.pages.len());
    for raw_page in raw.pages {
        let mut tables = Vec::with_capacity(raw_page.tables.len());
        for raw_table in raw_page.tables {
            let table = raw_table
                .into_iter()
                .map(|raw_row| raw_row.into_iter().map(convert_cell).collect())
                .collect::<Result<Table, AppError>>()?;
            tables.push(table);
        }
        pages.push(Page { tables });
    }

    Ok(TableDocument { pages })
}

fn convert_cell(raw: Option<RawCell>) -> Result<Cell, AppError> {
    match raw {
        None => Ok(Cell::empty()),
        Some(RawCell::Text(text)) => Ok(Cell::text(text)),
        Some(RawCell::Detailed { text, colors }) => {
            let colors = colors
                .iter()
                .map(|components| Rgb::from_components(components))
                .collect::<Result<Vec<_>, _>>()?
                .into_iter()
                .flatten()
                .collect();
            Ok(Cell { text, colors })
        }
    }
}

// --- Fixed-width text ---

/// Read a fixed-width text export. Form feeds separate pages; invalid UTF-8 is
/// replaced rather than rejected.
pub fn load_text(bytes: &[u8]) -> TableDocument {
    let text = String::from_utf8_lossy(bytes);
    let pages = text
        .split('\x0c')
        .enumerate()
        .map(|(idx, page_text)| {
            let tables = layout::split_text_tables(page_text);
            debug!(page = idx + 1, tables = tables.len(), "text page split into tables");
            Page { tables }
        })
        .collect();
    TableDocument { pages }
}
