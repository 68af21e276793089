/// Redis-backed pricing store.
///
/// Key schema (namespaced to avoid collisions):
/// - `pf:v1:records`: JSON-serialized Vec<PricingRecord>, overwritten as a whole
/// - `pf:v1:record_count`: record count written in the same MULTI as `records`
/// - `pf:v1:favorites`: Redis set of favorited product names
///
/// Writing the record set as a single value keeps "replace all" atomic for readers.
use std::collections::HashSet;

use futures::future::{BoxFuture, FutureExt};
use redis::AsyncCommands;
use tracing::{info, warn};

use crate::error::CommonError;
use crate::model::PricingRecord;
use crate::store::PricingStore;

const KEY_PREFIX: &str = "pf:v1:";

pub struct RedisStore {
    client: redis::Client,
}

impl RedisStore {
    /// Create a client for `url`. No connection is made until the first command.
    pub fn new(url: &str) -> Result<Self, CommonError> {
        let client = redis::Client::open(url)
            .inspect_err(|e| warn!(error = %e, url, "failed to create redis client"))?;
        Ok(Self { client })
    }

    /// Test the connection by sending a PING. Returns `true` if Redis is reachable.
    pub async fn is_available(&self) -> bool {
        match self.client.get_multiplexed_async_connection().await {
            Ok(mut conn) => {
                let result: Result<String, _> = redis::cmd("PING").query_async(&mut conn).await;
                result.is_ok()
            }
            Err(_) => false,
        }
    }

    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection, CommonError> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .inspect_err(|e| warn!(error = %e, "redis connection failed"))
            .map_err(|_| CommonError::RedisUnavailable)
    }

    async fn load_records(&self) -> Result<Vec<PricingRecord>, CommonError> {
        let key = records_key();
        let mut conn = self.connection().await?;
        let json: Option<String> = conn
            .get(&key)
            .await
            .inspect_err(|e| warn!(error = %e, key = %key, "redis GET failed"))?;
        match json {
            Some(json) => Ok(serde_json::from_str(&json).inspect_err(
                |e| warn!(error = %e, key = %key, "record set deserialization failed"),
            )?),
            None => Ok(Vec::new()),
        }
    }

    async fn load_count(&self) -> Result<usize, CommonError> {
        let key = count_key();
        let mut conn = self.connection().await?;
        let count: Option<usize> = conn
            .get(&key)
            .await
            .inspect_err(|e| warn!(error = %e, key = %key, "redis GET failed"))?;
        Ok(count.unwrap_or(0))
    }

    async fn store_records(&self, records: Vec<PricingRecord>) -> Result<usize, CommonError> {
        let json = serde_json::to_string(&records)?;
        let count = records.len();
        let mut conn = self.connection().await?;
        let _: () = redis::pipe()
            .atomic()
            .set(records_key(), json)
            .ignore()
            .set(count_key(), count)
            .ignore()
            .query_async(&mut conn)
            .await
            .inspect_err(|e| warn!(error = %e, "redis MULTI record replace failed"))?;
        info!(count, "record set replaced in redis");
        Ok(count)
    }

    async fn load_favorites(&self) -> Result<HashSet<String>, CommonError> {
        let key = favorites_key();
        let mut conn = self.connection().await?;
        let names: HashSet<String> = conn
            .smembers(&key)
            .await
            .inspect_err(|e| warn!(error = %e, key = %key, "redis SMEMBERS failed"))?;
        Ok(names)
    }

    async fn mark_favorite(&self, product_name: &str) -> Result<bool, CommonError> {
        let key = favorites_key();
        let mut conn = self.connection().await?;
        let added: usize = conn
            .sadd(&key, product_name)
            .await
            .inspect_err(|e| warn!(error = %e, key = %key, "redis SADD failed"))?;
        Ok(added > 0)
    }

    async fn unmark_favorite(&self, product_name: &str) -> Result<bool, CommonError> {
        let key = favorites_key();
        let mut conn = self.connection().await?;
        let removed: usize = conn
            .srem(&key, product_name)
            .await
            .inspect_err(|e| warn!(error = %e, key = %key, "redis SREM failed"))?;
        Ok(removed > 0)
    }
}

impl PricingStore for RedisStore {
    fn fetch_all_records(&self) -> BoxFuture<'_, Result<Vec<PricingRecord>, CommonError>> {
        self.load_records().boxed()
    }

    fn count_records(&self) -> BoxFuture<'_, Result<usize, CommonError>> {
        self.load_count().boxed()
    }

    fn replace_all_records(
        &self,
        records: Vec<PricingRecord>,
    ) -> BoxFuture<'_, Result<usize, CommonError>> {
        self.store_records(records).boxed()
    }

    fn fetch_favorite_names(&self) -> BoxFuture<'_, Result<HashSet<String>, CommonError>> {
        self.load_favorites().boxed()
    }

    fn add_favorite<'a>(
        &'a self,
        product_name: &'a str,
    ) -> BoxFuture<'a, Result<bool, CommonError>> {
        self.mark_favorite(product_name).boxed()
    }

    fn remove_favorite<'a>(
        &'a self,
        product_name: &'a str,
    ) -> BoxFuture<'a, Result<bool, CommonError>> {
        self.unmark_favorite(product_name).boxed()
    }
}

fn records_key() -> String {
    format!("{KEY_PREFIX}records")
}

fn count_key() -> String {
    format!("{KEY_PREFIX}record_count")
}

fn favorites_key() -> String {
    format!("{KEY_PREFIX}favorites")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_namespaced() {
        assert_eq!(records_key(), "pf:v1:records");
        assert_eq!(count_key(), "pf:v1:record_count");
        assert_eq!(favorites_key(), "pf:v1:favorites");
    }

    #[test]
    fn invalid_url_is_rejected() {
        assert!(RedisStore::new("not a url").is_err());
    }

    /// Integration test against a live Redis.
    ///
    /// Requires `REDIS_URL`; skipped otherwise. Uses the real key namespace, so point it
    /// at a scratch database.
    #[tokio::test]
    async fn test_favorites_roundtrip_live() {
        let Ok(url) = std::env::var("REDIS_URL") else {
            eprintln!("skipping test_favorites_roundtrip_live: REDIS_URL not set");
            return;
        };
        let store = RedisStore::new(&url).expect("redis client");
        if !store.is_available().await {
            eprintln!("skipping test_favorites_roundtrip_live: redis not reachable");
            return;
        }

        let name = "__price_finder_test_favorite__";
        store.remove_favorite(name).await.expect("SREM");
        assert!(store.add_favorite(name).await.expect("SADD"));
        assert!(!store.add_favorite(name).await.expect("SADD again"));
        assert!(store.fetch_favorite_names().await.expect("SMEMBERS").contains(name));
        assert!(store.remove_favorite(name).await.expect("SREM"));
    }
}
