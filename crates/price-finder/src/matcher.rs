/// Query matching against the pricing record set.
///
/// Two passes:
/// 1. Exact pass: the first record whose trimmed, case-folded name equals the query is
///    returned alone with score 100.
/// 2. Partial pass: each record is scored by the first strategy that fires, in order:
///    substring, all words present, token-sort ratio, partial ratio. Records no
///    strategy accepts are excluded.
///
/// Candidates are sorted by score descending, then product name ascending.
use std::str::FromStr;

use pricing_common::model::PricingRecord;

use crate::fuzzy;

pub const EXACT_SCORE: u8 = 100;
pub const SUBSTRING_SCORE: u8 = 95;
pub const SIMPLE_SUBSTRING_SCORE: u8 = 90;
pub const SIMPLE_EQUAL_SCORE: u8 = 100;
pub const ALL_WORDS_SCORE: u8 = 85;
pub const DEFAULT_THRESHOLD: u8 = 60;
/// Partial ratio must clear the threshold by this much.
pub const PARTIAL_RATIO_OFFSET: u8 = 10;

/// Score table for the substring strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScoringMode {
    /// Substring hits score 95.
    #[default]
    Ranked,
    /// Equal substrings score 100, other substring hits 90.
    Simple,
}

impl FromStr for ScoringMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ranked" => Ok(ScoringMode::Ranked),
            "simple" => Ok(ScoringMode::Simple),
            _ => Err(format!("unknown scoring mode: {s}. Use ranked or simple")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchOptions {
    /// Minimum token-sort ratio; partial ratio needs `threshold + 10`.
    pub threshold: u8,
    pub scoring: ScoringMode,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            scoring: ScoringMode::default(),
        }
    }
}

/// A record paired with its match score (0–100).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchCandidate<'a> {
    pub record: &'a PricingRecord,
    pub score: u8,
}

/// Matches for one query keyword.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult<'a> {
    pub keyword: String,
    pub exact_match_found: bool,
    pub candidates: Vec<MatchCandidate<'a>>,
}

/// Query text prepared once per lookup.
struct PreparedQuery<'q> {
    raw: &'q str,
    folded: String,
    words: Vec<String>,
}

impl<'q> PreparedQuery<'q> {
    fn new(query: &'q str) -> Self {
        let raw = query.trim();
        let folded = raw.to_lowercase();
        let words = folded.split_whitespace().map(str::to_string).collect();
        Self { raw, folded, words }
    }
}

/// A strategy returns a score when it accepts the record, `None` otherwise.
type Strategy = fn(&PreparedQuery<'_>, &str, &str, &MatchOptions) -> Option<u8>;

/// Strategies in priority order; the first that returns a score decides.
const STRATEGIES: [(&str, Strategy); 4] = [
    ("substring", substring),
    ("all_words", all_words),
    ("token_sort", token_sort),
    ("partial", partial),
];

fn substring(
    query: &PreparedQuery<'_>,
    _name: &str,
    folded: &str,
    options: &MatchOptions,
) -> Option<u8> {
    if !folded.contains(&query.folded) {
        return None;
    }
    Some(match options.scoring {
        ScoringMode::Ranked => SUBSTRING_SCORE,
        ScoringMode::Simple if folded == query.folded => SIMPLE_EQUAL_SCORE,
        ScoringMode::Simple => SIMPLE_SUBSTRING_SCORE,
    })
}

fn all_words(
    query: &PreparedQuery<'_>,
    _name: &str,
    folded: &str,
    _options: &MatchOptions,
) -> Option<u8> {
    let all_present = !query.words.is_empty()
        && query.words.iter().all(|w| folded.contains(w.as_str()));
    all_present.then_some(ALL_WORDS_SCORE)
}

fn token_sort(
    query: &PreparedQuery<'_>,
    name: &str,
    _folded: &str,
    options: &MatchOptions,
) -> Option<u8> {
    let score = fuzzy::token_sort_ratio(query.raw, name);
    (score >= options.threshold).then_some(score)
}

fn partial(
    query: &PreparedQuery<'_>,
    name: &str,
    _folded: &str,
    options: &MatchOptions,
) -> Option<u8> {
    let score = fuzzy::partial_ratio(query.raw, name);
    let cutoff = options.threshold.saturating_add(PARTIAL_RATIO_OFFSET);
    (score >= cutoff).then_some(score)
}

/// Score one record with the partial-pass strategies.
fn score_record(
    query: &PreparedQuery<'_>,
    record: &PricingRecord,
    options: &MatchOptions,
) -> Option<u8> {
    let name = record.product_name.trim();
    let folded = name.to_lowercase();
    STRATEGIES
        .iter()
        .find_map(|(_, strategy)| strategy(query, name, &folded, options))
}

/// Match `query` against `records`.
///
/// The caller rejects empty queries; an empty record set yields no candidates.
pub fn match_query<'a>(
    query: &str,
    records: &'a [PricingRecord],
    options: &MatchOptions,
) -> QueryResult<'a> {
    let prepared = PreparedQuery::new(query);

    if let Some(record) = records
        .iter()
        .find(|r| r.product_name.trim().to_lowercase() == prepared.folded)
    {
        return QueryResult {
            keyword: prepared.raw.to_string(),
            exact_match_found: true,
            candidates: vec![MatchCandidate {
                record,
                score: EXACT_SCORE,
            }],
        };
    }

    let mut candidates: Vec<MatchCandidate<'a>> = records
        .iter()
        .filter_map(|record| {
            score_record(&prepared, record, options).map(|score| MatchCandidate { record, score })
        })
        .collect();
    candidates.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| a.record.product_name.cmp(&b.record.product_name))
    });

    QueryResult {
        keyword: prepared.raw.to_string(),
        exact_match_found: false,
        candidates,
    }
}
