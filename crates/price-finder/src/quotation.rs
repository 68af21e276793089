/// Active-price resolution: prefer the five-percent price, fall back to the table limit.
use pricing_common::model::{PricingRecord, QuotationSource};

/// Shown when neither price field carries a value.
pub const NO_VALUE: &str = "N/A";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quotation {
    pub active_value: String,
    pub source: QuotationSource,
    /// True when the five-percent price was empty and the table limit stood in.
    pub fallback_applied: bool,
}

pub fn resolve(record: &PricingRecord) -> Quotation {
    let five_percent = record.five_percent.trim();
    if !five_percent.is_empty() {
        return Quotation {
            active_value: five_percent.to_string(),
            source: QuotationSource::FivePercent,
            fallback_applied: false,
        };
    }

    let table_limit = record.table_limit.trim();
    if !table_limit.is_empty() {
        return Quotation {
            active_value: table_limit.to_string(),
            source: QuotationSource::Limit,
            fallback_applied: true,
        };
    }

    Quotation {
        active_value: NO_VALUE.to_string(),
        source: QuotationSource::None,
        fallback_applied: false,
    }
}
