use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Semantic highlight attached to a price cell, derived from the cell's color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Highlight {
    Green,
    Yellow,
    #[default]
    None,
}

/// One normalized row of a pricing table.
///
/// Price fields are kept as the display strings found in the document (currency
/// symbols and locale separators included). An empty string means "no value".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingRecord {
    /// Stable identifier derived from the row position, e.g. "3f9a0c..."
    pub id: String,
    /// Trimmed, non-empty product name; the primary match key
    pub product_name: String,
    pub sale_value: String,
    pub system_limit: String,
    pub table_limit: String,
    pub five_percent: String,
    #[serde(default)]
    pub sale_value_highlight: Highlight,
    #[serde(default)]
    pub system_limit_highlight: Highlight,
    #[serde(default)]
    pub table_limit_highlight: Highlight,
    #[serde(default)]
    pub five_percent_highlight: Highlight,
    /// When the row was extracted
    pub created_at: DateTime<Utc>,
}

/// Which price field produced the active quotation value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotationSource {
    FivePercent,
    Limit,
    None,
}

impl QuotationSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuotationSource::FivePercent => "five_percent",
            QuotationSource::Limit => "limit",
            QuotationSource::None => "none",
        }
    }
}

impl std::fmt::Display for QuotationSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
