use serde::{Deserialize, Serialize};

use crate::model::{Highlight, PricingRecord, QuotationSource};

#[derive(Debug, Clone, Deserialize)]
pub struct QuotationRequest {
    /// Free-text product name to look up.
    pub item_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchRequest {
    /// One lookup per keyword; results come back in the same order.
    pub keywords: Vec<String>,
    /// Maximum candidates per keyword (default: all).
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ItemsQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FavoriteRequest {
    pub product_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub message: String,
    pub items_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountResponse {
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotationResponse {
    pub item_name: String,
    pub quotation_value: String,
    pub source: QuotationSource,
    pub fallback_applied: bool,
    pub score: u8,
    pub exact_match: bool,
    pub is_favorite: bool,
    pub full_item_data: PricingRecord,
}

/// Highlight tags of the four price cells of a record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HighlightSet {
    pub sale_value: Highlight,
    pub system_limit: Highlight,
    pub table_limit: Highlight,
    pub five_percent: Highlight,
}

impl From<&PricingRecord> for HighlightSet {
    fn from(record: &PricingRecord) -> Self {
        Self {
            sale_value: record.sale_value_highlight,
            system_limit: record.system_limit_highlight,
            table_limit: record.table_limit_highlight,
            five_percent: record.five_percent_highlight,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateResponse {
    pub product_name: String,
    pub score: u8,
    pub is_favorite: bool,
    pub quotation_value: String,
    pub source: QuotationSource,
    pub fallback_applied: bool,
    pub highlights: HighlightSet,
    pub record: PricingRecord,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordResultResponse {
    pub keyword: String,
    pub exact_match_found: bool,
    pub results: Vec<CandidateResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<KeywordResultResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FavoriteResponse {
    pub product_name: String,
    pub favorite: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FavoritesResponse {
    /// Favorite product names, sorted.
    pub favorites: Vec<String>,
}
