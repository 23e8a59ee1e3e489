//! Best/worst selection over extracted reviews.

use crate::types::{ExtractionResult, ReviewRecord};

/// Sorts reviews from highest to lowest rating, keeping discovery order
/// among equal ratings.
pub fn sort_by_rating(mut records: Vec<ReviewRecord>) -> Vec<ReviewRecord> {
    records.sort_by(|a, b| b.numeric_rating.total_cmp(&a.numeric_rating));
    records
}

/// Picks the first (best) and last (worst) review after a descending,
/// stable sort by rating. A single review is both best and worst.
pub fn rank(records: Vec<ReviewRecord>) -> ExtractionResult {
    let sorted = sort_by_rating(records);
    match (sorted.first(), sorted.last()) {
        (Some(best), Some(worst)) => ExtractionResult::new(best.clone(), worst.clone()),
        _ => ExtractionResult::empty(),
    }
}
