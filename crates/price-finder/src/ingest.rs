/// Ingest service: uploaded document → pricing records → store.
///
/// A document that yields no product rows is rejected and the stored record set is
/// left as it was. Otherwise the new records replace the old set wholesale.
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use pricing_common::ids;
use pricing_common::store::PricingStore;

use crate::document::{self, DocumentKind};
use crate::error::AppError;
use crate::extract;

/// Result of an ingest operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestResult {
    /// SHA-256 of the uploaded bytes.
    pub digest: String,
    pub page_count: usize,
    /// Number of records now in the store.
    pub items_count: usize,
}

pub struct IngestService {
    store: Arc<dyn PricingStore>,
}

impl IngestService {
    pub fn new(store: Arc<dyn PricingStore>) -> Self {
        Self { store }
    }

    pub async fn ingest(&self, file_name: &str, bytes: Vec<u8>) -> Result<IngestResult, AppError> {
        let kind = DocumentKind::from_file_name(file_name)?;
        let digest = ids::document_digest(&bytes);
        info!(file_name, digest = %digest, size = bytes.len(), "ingesting document");

        // Parsing and extraction are CPU-bound.
        let captured_at = Utc::now();
        let (page_count, records) = tokio::task::spawn_blocking(move || {
            let doc = document::load(kind, &bytes)?;
            let records = extract::extract(&doc, captured_at);
            Ok::<_, AppError>((doc.pages.len(), records))
        })
        .await
        .map_err(|e| AppError::Worker(format!("document task failed: {e}")))??;

        if records.is_empty() {
            warn!(file_name, digest = %digest, page_count, "document has no pricing rows");
            return Err(AppError::NoPricingData);
        }

        let items_count = self
            .store
            .replace_all_records(records)
            .await
            .inspect_err(|e| warn!(error = %e, digest = %digest, "failed to store records"))?;

        info!(digest = %digest, page_count, items_count, "pricing table replaced");
        Ok(IngestResult {
            digest,
            page_count,
            items_count,
        })
    }
}
