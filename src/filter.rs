//! Time-window and dedup filter.

use crate::models::ArticleCandidate;
use chrono::{DateTime, Duration, Utc};
use itertools::Itertools;
use tracing::{debug, info, instrument};

/// Whether a dated candidate falls inside `[now - max_age, now]`.
pub fn in_window(published_at: DateTime<Utc>, now: DateTime<Utc>, max_age: Duration) -> bool {
    let age = now - published_at;
    age >= Duration::zero() && age <= max_age
}

/// Keep recent dated candidates, then undated ones, unique by URL.
///
/// Dated candidates older than `max_age_hours` or published in the future
/// are dropped. Undated candidates are kept unless `skip_undated` is set.
/// Output order is dated-recent first, then undated, each in input order, and
/// the first occurrence of a URL wins. Applying the filter twice with the same
/// `now` gives the same result as applying it once.
#[instrument(level = "info", skip_all, fields(input = candidates.len(), max_age_hours = max_age_hours, skip_undated = skip_undated))]
pub fn apply_time_window(
    candidates: Vec<ArticleCandidate>,
    now: DateTime<Utc>,
    max_age_hours: u64,
    skip_undated: bool,
) -> Vec<ArticleCandidate> {
    let max_age = i64::try_from(max_age_hours)
        .ok()
        .and_then(Duration::try_hours)
        .unwrap_or(Duration::MAX);

    let (dated, undated): (Vec<_>, Vec<_>) = candidates
        .into_iter()
        .partition(|c| c.published_at.is_some());

    let recent = dated.into_iter().filter(|c| match c.published_at {
        Some(ts) => {
            let keep = in_window(ts, now, max_age);
            if !keep {
                debug!(url = %c.url, published = %ts, "Outside time window");
            }
            keep
        }
        None => false,
    });

    let undated = undated.into_iter().filter(|_| !skip_undated);

    let kept: Vec<ArticleCandidate> = recent
        .chain(undated)
        .unique_by(|c| c.url.clone())
        .collect();

    info!(kept = kept.len(), "Applied time window and dedup");
    kept
}
