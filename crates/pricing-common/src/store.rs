/// Storage port for pricing records and favorite marks.
///
/// The matching pipeline only ever sees a snapshot returned by `fetch_all_records` and
/// `fetch_favorite_names`. Implementations must make `replace_all_records` atomic with
/// respect to those reads: a reader sees either the old record set or the new one.
use std::collections::HashSet;

use futures::future::{BoxFuture, FutureExt};
use tokio::sync::RwLock;

use crate::error::CommonError;
use crate::model::PricingRecord;

pub trait PricingStore: Send + Sync {
    /// All records in extraction order.
    fn fetch_all_records(&self) -> BoxFuture<'_, Result<Vec<PricingRecord>, CommonError>>;

    fn count_records(&self) -> BoxFuture<'_, Result<usize, CommonError>>;

    /// Overwrite the whole record set. Returns the number of stored records.
    fn replace_all_records(
        &self,
        records: Vec<PricingRecord>,
    ) -> BoxFuture<'_, Result<usize, CommonError>>;

    fn fetch_favorite_names(&self) -> BoxFuture<'_, Result<HashSet<String>, CommonError>>;

    /// Mark a product name as favorite. Returns `true` if it was not already marked.
    fn add_favorite<'a>(
        &'a self,
        product_name: &'a str,
    ) -> BoxFuture<'a, Result<bool, CommonError>>;

    /// Remove a favorite mark. Returns `true` if a mark was removed.
    fn remove_favorite<'a>(
        &'a self,
        product_name: &'a str,
    ) -> BoxFuture<'a, Result<bool, CommonError>>;
}

/// Process-local store used when no Redis URL is configured.
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<Vec<PricingRecord>>,
    favorites: RwLock<HashSet<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PricingStore for MemoryStore {
    fn fetch_all_records(&self) -> BoxFuture<'_, Result<Vec<PricingRecord>, CommonError>> {
        async move { Ok(self.records.read().await.clone()) }.boxed()
    }

    fn count_records(&self) -> BoxFuture<'_, Result<usize, CommonError>> {
        async move { Ok(self.records.read().await.len()) }.boxed()
    }

    fn replace_all_records(
        &self,
        records: Vec<PricingRecord>,
    ) -> BoxFuture<'_, Result<usize, CommonError>> {
        async move {
            let count = records.len();
            *self.records.write().await = records;
            Ok(count)
        }
        .boxed()
    }

    fn fetch_favorite_names(&self) -> BoxFuture<'_, Result<HashSet<String>, CommonError>> {
        async move { Ok(self.favorites.read().await.clone()) }.boxed()
    }

    fn add_favorite<'a>(
        &'a self,
        product_name: &'a str,
    ) -> BoxFuture<'a, Result<bool, CommonError>> {
        async move { Ok(self.favorites.write().await.insert(product_name.to_string())) }.boxed()
    }

    fn remove_favorite<'a>(
        &'a self,
        product_name: &'a str,
    ) -> BoxFuture<'a, Result<bool, CommonError>> {
        async move { Ok(self.favorites.write().await.remove(product_name)) }.boxed()
    }
}
