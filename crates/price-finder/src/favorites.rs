/// Favorites-first ordering of match candidates.
use std::collections::HashSet;

use crate::matcher::MatchCandidate;

/// Move favorited candidates ahead of the rest.
///
/// Stable partition: each group keeps its incoming order. Favorites are keyed by exact
/// product name.
pub fn rank<'a>(
    candidates: Vec<MatchCandidate<'a>>,
    favorite_names: &HashSet<String>,
) -> Vec<MatchCandidate<'a>> {
    let (mut favorites, rest): (Vec<_>, Vec<_>) = candidates
        .into_iter()
        .partition(|c| favorite_names.contains(&c.record.product_name));
    favorites.extend(rest);
    favorites
}
