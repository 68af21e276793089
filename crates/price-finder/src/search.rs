/// Quote service: keyword lookups over a snapshot of the pricing store.
///
/// Each request reads the record set and favorite set once. Keywords are then matched,
/// resolved and ranked independently on blocking worker tasks, and results come back
/// in keyword order.
use std::collections::HashSet;
use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, info};

use pricing_common::api::{
    CandidateResponse, HighlightSet, KeywordResultResponse, QuotationResponse,
};
use pricing_common::model::PricingRecord;
use pricing_common::store::PricingStore;

use crate::error::AppError;
use crate::favorites;
use crate::matcher::{self, MatchOptions};
use crate::quotation;

pub struct QuoteService {
    store: Arc<dyn PricingStore>,
    options: MatchOptions,
}

impl QuoteService {
    pub fn new(store: Arc<dyn PricingStore>, options: MatchOptions) -> Self {
        Self { store, options }
    }

    /// Look up every keyword. `limit` caps each keyword's candidate list after ranking.
    pub async fn search(
        &self,
        keywords: &[String],
        limit: Option<usize>,
    ) -> Result<Vec<KeywordResultResponse>, AppError> {
        let keywords = normalize_keywords(keywords)?;

        let records = Arc::new(self.store.fetch_all_records().await?);
        let favorites = Arc::new(self.store.fetch_favorite_names().await?);
        debug!(
            keywords = keywords.len(),
            records = records.len(),
            favorites = favorites.len(),
            "evaluating keywords"
        );

        let options = self.options;
        let tasks = keywords.into_iter().map(|keyword| {
            let records = Arc::clone(&records);
            let favorites = Arc::clone(&favorites);
            tokio::task::spawn_blocking(move || {
                evaluate_keyword(&keyword, &records, &favorites, &options, limit)
            })
        });

        let mut results = Vec::new();
        for joined in join_all(tasks).await {
            let result = joined.map_err(|e| AppError::Worker(format!("keyword task failed: {e}")))?;
            results.push(result);
        }

        info!(
            keywords = results.len(),
            matched = results.iter().filter(|r| !r.results.is_empty()).count(),
            "search complete"
        );
        Ok(results)
    }

    /// Quote a single item: the top-ranked candidate for `item_name`.
    pub async fn quote(&self, item_name: &str) -> Result<QuotationResponse, AppError> {
        let item_name = item_name.trim();
        if item_name.is_empty() {
            return Err(AppError::EmptyQuery("item_name"));
        }

        let mut results = self.search(&[item_name.to_string()], Some(1)).await?;
        let Some(result) = results.pop() else {
            return Err(AppError::NotFound(item_name.to_string()));
        };
        let Some(best) = result.results.into_iter().next() else {
            return Err(AppError::NotFound(item_name.to_string()));
        };

        Ok(QuotationResponse {
            item_name: best.product_name,
            quotation_value: best.quotation_value,
            source: best.source,
            fallback_applied: best.fallback_applied,
            score: best.score,
            exact_match: result.exact_match_found,
            is_favorite: best.is_favorite,
            full_item_data: best.record,
        })
    }
}

fn normalize_keywords(keywords: &[String]) -> Result<Vec<String>, AppError> {
    if keywords.is_empty() {
        return Err(AppError::EmptyQuery("keywords"));
    }
    keywords
        .iter()
        .map(|k| {
            let k = k.trim();
            if k.is_empty() {
                Err(AppError::EmptyQuery("keyword"))
            } else {
                Ok(k.to_string())
            }
        })
        .collect()
}

/// Match, resolve and rank one keyword against a snapshot.
pub fn evaluate_keyword(
    keyword: &str,
    records: &[PricingRecord],
    favorite_names: &HashSet<String>,
    options: &MatchOptions,
    limit: Option<usize>,
) -> KeywordResultResponse {
    let result = matcher::match_query(keyword, records, options);
    let mut ranked = favorites::rank(result.candidates, favorite_names);
    if let Some(limit) = limit {
        ranked.truncate(limit);
    }

    let results = ranked
        .into_iter()
        .map(|candidate| {
            let record = candidate.record;
            let quote = quotation::resolve(record);
            CandidateResponse {
                product_name: record.product_name.clone(),
                score: candidate.score,
                is_favorite: favorite_names.contains(&record.product_name),
                quotation_value: quote.active_value,
                source: quote.source,
                fallback_applied: quote.fallback_applied,
                highlights: HighlightSet::from(record),
                record: record.clone(),
            }
        })
        .collect();

    KeywordResultResponse {
        keyword: result.keyword,
        exact_match_found: result.exact_match_found,
        results,
    }
}
