use std::net::SocketAddr;

use crate::error::AppError;
use crate::matcher::{MatchOptions, ScoringMode, DEFAULT_THRESHOLD};

const DEFAULT_ADDR: &str = "0.0.0.0:8001";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;
const DEFAULT_ITEMS_LIMIT: usize = 100;
pub const ANY_ORIGIN: &str = "*";

/// Application configuration loaded explicitly from environment variables.
///
/// Every setting has a default. Redis URL is optional; if absent, records and
/// favorites live in process memory.
#[derive(Debug, Clone)]
pub struct Config {
    /// Listen address (e.g. "0.0.0.0:8001").
    pub addr: SocketAddr,
    /// Redis connection URL (e.g. "redis://127.0.0.1:6379"). `None` selects the memory store.
    pub redis_url: Option<String>,
    pub match_options: MatchOptions,
    /// Largest accepted upload body.
    pub max_upload_bytes: usize,
    /// Page size of `GET /api/items` when no `limit` is given.
    pub items_default_limit: usize,
    /// Browser origins allowed by CORS. `*` accepts any origin.
    pub cors_origins: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Optional:
    /// - `PRICE_FINDER_ADDR`: listen address (default `0.0.0.0:8001`)
    /// - `REDIS_URL`: Redis connection string (omit for the in-memory store)
    /// - `MATCH_THRESHOLD`: token-sort cutoff, 0–100 (default 60)
    /// - `MATCH_SCORING`: `ranked` or `simple` (default `ranked`)
    /// - `MAX_UPLOAD_BYTES`: upload size limit (default 20 MiB)
    /// - `ITEMS_DEFAULT_LIMIT`: default item listing size (default 100)
    /// - `CORS_ORIGINS`: comma-separated allowed origins (default `*`)
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let non_blank = |key: &str| {
            var(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let addr = non_blank("PRICE_FINDER_ADDR").unwrap_or_else(|| DEFAULT_ADDR.to_string());
        let addr: SocketAddr = addr
            .parse()
            .map_err(|e| AppError::Config(format!("PRICE_FINDER_ADDR '{addr}' is invalid: {e}")))?;

        let threshold = match non_blank("MATCH_THRESHOLD") {
            Some(raw) => raw
                .parse::<u8>()
                .ok()
                .filter(|t| *t <= 100)
                .ok_or_else(|| {
                    AppError::Config(format!("MATCH_THRESHOLD must be 0-100, got '{raw}'"))
                })?,
            None => DEFAULT_THRESHOLD,
        };

        let scoring = match non_blank("MATCH_SCORING") {
            Some(raw) => raw
                .parse::<ScoringMode>()
                .map_err(|e| AppError::Config(format!("MATCH_SCORING: {e}")))?,
            None => ScoringMode::default(),
        };

        let max_upload_bytes = parse_positive(non_blank("MAX_UPLOAD_BYTES"), "MAX_UPLOAD_BYTES")?
            .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES);
        let items_default_limit =
            parse_positive(non_blank("ITEMS_DEFAULT_LIMIT"), "ITEMS_DEFAULT_LIMIT")?
                .unwrap_or(DEFAULT_ITEMS_LIMIT);

        let mut cors_origins: Vec<String> = non_blank("CORS_ORIGINS")
            .unwrap_or_else(|| ANY_ORIGIN.to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();
        if cors_origins.is_empty() {
            cors_origins.push(ANY_ORIGIN.to_string());
        }

        Ok(Self {
            addr,
            redis_url: non_blank("REDIS_URL"),
            match_options: MatchOptions { threshold, scoring },
            max_upload_bytes,
            items_default_limit,
            cors_origins,
        })
    }
}

fn parse_positive(raw: Option<String>, key: &str) -> Result<Option<usize>, AppError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    raw.parse::<usize>()
        .ok()
        .filter(|n| *n > 0)
        .map(Some)
        .ok_or_else(|| AppError::Config(format!("{key} must be a positive integer, got '{raw}'")))
}
