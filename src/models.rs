//! Data models for scraped candidates, classifier verdicts, and feed records.
//!
//! This module defines the core data structures used throughout the pipeline:
//! - [`RawLink`]: A discovered article URL, not yet fetched
//! - [`ArticleCandidate`]: A fetched and parsed article
//! - [`ClassificationResult`]: The gateway's verdict, or the default on failure
//! - [`OutputRecord`]: One row of the emitted feed
//! - [`FeedReport`]: The envelope persisted by the JSON writer
//!
//! Output field names follow the snake_case column names downstream
//! dashboards already read (`vendors_hit`, `is_relevant`, ...).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A discovered link on a source homepage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLink {
    pub url: String,
    pub source_name: String,
}

/// A fetched article that passed the page heuristics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleCandidate {
    /// Configured source name (e.g. `"CXToday"`).
    pub source: String,
    pub title: String,
    /// Absolute article URL; the dedup key for a run.
    pub url: String,
    /// Leading paragraphs, whitespace-collapsed and length-bounded.
    pub snippet: String,
    /// Publish time in UTC, if any extraction strategy found one.
    pub published_at: Option<DateTime<Utc>>,
}

/// Business priority assigned by the classifier.
///
/// Declaration order is the ranking order: `High` sorts first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Engagement {
    High,
    Medium,
    #[default]
    Low,
}

impl Engagement {
    /// Map raw model output onto the closed enum.
    ///
    /// Only the exact upper-case labels are accepted (surrounding whitespace
    /// is ignored); everything else, including lower-case variants, is `Low`.
    pub fn normalize(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("HIGH") => Engagement::High,
            Some("MEDIUM") => Engagement::Medium,
            _ => Engagement::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Engagement::High => "HIGH",
            Engagement::Medium => "MEDIUM",
            Engagement::Low => "LOW",
        }
    }
}

impl fmt::Display for Engagement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The classifier's verdict for one article.
///
/// `Default` is the documented failure value: empty text, `LOW`, not relevant.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub summary: String,
    pub engagement: Engagement,
    pub hook: String,
    pub is_relevant: bool,
}

/// Vendor and keyword lexicon hits for one candidate.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RelevanceHits {
    /// Sorted, unique vendor names found in the candidate text.
    pub vendors: Vec<String>,
    /// Sorted, unique keyword phrases found in the candidate text.
    pub keywords: Vec<String>,
}

impl RelevanceHits {
    pub fn is_empty(&self) -> bool {
        self.vendors.is_empty() && self.keywords.is_empty()
    }
}

/// One row of the emitted feed; at most one per URL per run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputRecord {
    pub date_scraped: NaiveDate,
    pub source: String,
    pub title: String,
    pub url: String,
    /// RFC 3339 publish time in UTC, or empty when undated.
    pub published: String,
    pub summary: String,
    pub engagement: Engagement,
    pub hook: String,
    /// Vendor hits joined with `", "`.
    pub vendors_hit: String,
    /// Keyword hits joined with `", "`.
    pub keywords_hit: String,
    pub is_relevant: bool,
}

impl OutputRecord {
    /// Assemble a record from its three inputs.
    pub fn assemble(
        candidate: ArticleCandidate,
        verdict: ClassificationResult,
        hits: &RelevanceHits,
        date_scraped: NaiveDate,
    ) -> Self {
        Self {
            date_scraped,
            published: candidate
                .published_at
                .map(|dt| dt.to_rfc3339())
                .unwrap_or_default(),
            source: candidate.source,
            title: candidate.title,
            url: candidate.url,
            summary: verdict.summary,
            engagement: verdict.engagement,
            hook: verdict.hook,
            vendors_hit: hits.vendors.join(", "),
            keywords_hit: hits.keywords.join(", "),
            is_relevant: verdict.is_relevant,
        }
    }
}

/// Per-run counters, logged at the end of a run and persisted with the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RunStats {
    pub sources: usize,
    pub sources_failed: usize,
    pub links_discovered: usize,
    pub candidates_fetched: usize,
    pub candidates_in_window: usize,
    pub gated_out: usize,
    pub classification_failures: usize,
    pub records: usize,
}

/// The persisted envelope for one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedReport {
    /// Pipeline name, e.g. `"es"`.
    pub pipeline: String,
    pub date_scraped: NaiveDate,
    pub generated_at: DateTime<Utc>,
    pub stats: RunStats,
    pub records: Vec<OutputRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn candidate(published_at: Option<DateTime<Utc>>) -> ArticleCandidate {
        ArticleCandidate {
            source: "CXToday".to_string(),
            title: "Genesys expands its AI orchestration platform".to_string(),
            url: "https://www.cxtoday.com/contact-center/genesys-expands-ai".to_string(),
            snippet: "Genesys announced...".to_string(),
            published_at,
        }
    }

    #[test]
    fn test_engagement_normalize_accepts_exact_labels() {
        assert_eq!(Engagement::normalize(Some("HIGH")), Engagement::High);
        assert_eq!(Engagement::normalize(Some("MEDIUM")), Engagement::Medium);
        assert_eq!(Engagement::normalize(Some("LOW")), Engagement::Low);
        assert_eq!(Engagement::normalize(Some("  HIGH ")), Engagement::High);
    }

    #[test]
    fn test_engagement_normalize_falls_back_to_low() {
        assert_eq!(Engagement::normalize(Some("high")), Engagement::Low);
        assert_eq!(Engagement::normalize(Some("Medium")), Engagement::Low);
        assert_eq!(Engagement::normalize(Some("CRITICAL")), Engagement::Low);
        assert_eq!(Engagement::normalize(Some("")), Engagement::Low);
        assert_eq!(Engagement::normalize(None), Engagement::Low);
    }

    #[test]
    fn test_engagement_ordering_ranks_high_first() {
        let mut levels = vec![Engagement::Low, Engagement::High, Engagement::Medium];
        levels.sort();
        assert_eq!(
            levels,
            vec![Engagement::High, Engagement::Medium, Engagement::Low]
        );
    }

    #[test]
    fn test_default_classification_is_documented_fallback() {
        let d = ClassificationResult::default();
        assert_eq!(d.summary, "");
        assert_eq!(d.engagement, Engagement::Low);
        assert_eq!(d.hook, "");
        assert!(!d.is_relevant);
    }

    #[test]
    fn test_assemble_joins_hits_and_formats_published() {
        let published = Utc.with_ymd_and_hms(2025, 5, 6, 14, 30, 0).unwrap();
        let hits = RelevanceHits {
            vendors: vec!["genesys".to_string(), "nice".to_string()],
            keywords: vec!["contact center".to_string()],
        };
        let verdict = ClassificationResult {
            summary: "Summary".to_string(),
            engagement: Engagement::High,
            hook: "Hook".to_string(),
            is_relevant: true,
        };
        let date = NaiveDate::from_ymd_opt(2025, 5, 6).unwrap();

        let record = OutputRecord::assemble(candidate(Some(published)), verdict, &hits, date);

        assert_eq!(record.published, "2025-05-06T14:30:00+00:00");
        assert_eq!(record.vendors_hit, "genesys, nice");
        assert_eq!(record.keywords_hit, "contact center");
        assert_eq!(record.engagement, Engagement::High);
        assert!(record.is_relevant);
    }

    #[test]
    fn test_assemble_undated_has_empty_published() {
        let date = NaiveDate::from_ymd_opt(2025, 5, 6).unwrap();
        let record = OutputRecord::assemble(
            candidate(None),
            ClassificationResult::default(),
            &RelevanceHits::default(),
            date,
        );
        assert_eq!(record.published, "");
        assert_eq!(record.vendors_hit, "");
    }

    #[test]
    fn test_output_record_serializes_upper_case_engagement() {
        let date = NaiveDate::from_ymd_opt(2025, 5, 6).unwrap();
        let record = OutputRecord::assemble(
            candidate(None),
            ClassificationResult::default(),
            &RelevanceHits::default(),
            date,
        );
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains(r#""engagement":"LOW""#));
        assert!(json.contains(r#""date_scraped":"2025-05-06""#));
        assert!(json.contains(r#""is_relevant":false"#));
    }
}
