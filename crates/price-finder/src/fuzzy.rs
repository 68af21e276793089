/// Edit-distance similarity ratios on a 0–100 scale.
///
/// Inputs are preprocessed: lower-cased, non-alphanumeric characters replaced by
/// spaces, whitespace collapsed. `ratio` is `1 - lev / max_len` over chars, rounded
/// half up. Empty inputs score 0.
pub fn ratio(a: &str, b: &str) -> u8 {
    raw_ratio(&preprocess(a), &preprocess(b))
}

/// Word-order-insensitive ratio: tokens on both sides are sorted before comparing.
pub fn token_sort_ratio(a: &str, b: &str) -> u8 {
    ratio(&sorted_tokens(a), &sorted_tokens(b))
}

/// Best `ratio` of the shorter string against every equal-length window of the longer.
pub fn partial_ratio(a: &str, b: &str) -> u8 {
    let (a, b) = (preprocess(a), preprocess(b));
    let (shorter, longer) = if a.chars().count() <= b.chars().count() {
        (a, b)
    } else {
        (b, a)
    };

    let short_len = shorter.chars().count();
    if short_len == 0 {
        return 0;
    }
    let longer: Vec<char> = longer.chars().collect();

    let mut best = 0;
    for start in 0..=(longer.len() - short_len) {
        let window: String = longer[start..start + short_len].iter().collect();
        best = best.max(raw_ratio(&shorter, &window));
        if best == 100 {
            break;
        }
    }
    best
}

pub fn preprocess(s: &str) -> String {
    let replaced: String = s
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    replaced
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn sorted_tokens(s: &str) -> String {
    let processed = preprocess(s);
    let mut tokens: Vec<&str> = processed.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

fn raw_ratio(a: &str, b: &str) -> u8 {
    let max_len = a.chars().count().max(b.chars().count());
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let distance = strsim::levenshtein(a, b);
    let similar = max_len - distance.min(max_len);
    ((similar * 100 + max_len / 2) / max_len) as u8
}
