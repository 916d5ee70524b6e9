//! Rule-based relevance detection against static vendor and keyword lexicons.
//!
//! Matching is a case-insensitive substring test over the title and snippet,
//! so short entries can over-match ("infor" inside "information"). The hits
//! are cheap provenance, not a verdict; the classifier decides relevance
//! where the pipeline is configured to let it.

use crate::config::Lexicon;
use crate::models::{ArticleCandidate, RelevanceHits};
use std::collections::BTreeSet;

/// Precomputed lower-case lexicon.
#[derive(Debug, Clone, Default)]
pub struct RelevanceDetector {
    vendors: Vec<String>,
    keywords: Vec<String>,
}

impl RelevanceDetector {
    pub fn new(lexicon: &Lexicon) -> Self {
        let prepare = |items: &[String]| {
            items
                .iter()
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect()
        };
        Self {
            vendors: prepare(&lexicon.vendors),
            keywords: prepare(&lexicon.keywords),
        }
    }

    /// Match free text against both lexicons.
    pub fn detect_text(&self, text: &str) -> RelevanceHits {
        let text = text.to_lowercase();
        let matches = |terms: &[String]| {
            terms
                .iter()
                .filter(|term| text.contains(term.as_str()))
                .cloned()
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect::<Vec<_>>()
        };
        RelevanceHits {
            vendors: matches(&self.vendors),
            keywords: matches(&self.keywords),
        }
    }

    /// Match a candidate's title and snippet.
    pub fn detect(&self, candidate: &ArticleCandidate) -> RelevanceHits {
        self.detect_text(&format!("{} {}", candidate.title, candidate.snippet))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;

    fn candidate(title: &str, snippet: &str) -> ArticleCandidate {
        ArticleCandidate {
            source: "S".to_string(),
            title: title.to_string(),
            url: "https://s.example/a/article".to_string(),
            snippet: snippet.to_string(),
            published_at: None,
        }
    }

    #[test]
    fn test_detects_vendors_and_keywords_case_insensitively() {
        let detector = RelevanceDetector::new(&PipelineConfig::es().lexicon);
        let hits = detector.detect(&candidate(
            "ServiceNow expands ITSM suite",
            "The new Service Desk features target Employee Experience teams.",
        ));
        assert_eq!(hits.vendors, vec!["servicenow"]);
        assert_eq!(
            hits.keywords,
            vec!["employee experience", "itsm", "service desk"]
        );
        assert!(!hits.is_empty());
    }

    #[test]
    fn test_no_hits() {
        let detector = RelevanceDetector::new(&PipelineConfig::es().lexicon);
        let hits = detector.detect(&candidate("Local bakery wins award", "Croissants abound."));
        assert!(hits.is_empty());
    }

    #[test]
    fn test_hits_are_sorted_and_unique() {
        let lexicon = Lexicon {
            vendors: vec!["zeta".into(), "alpha".into(), "Alpha".into(), " ".into()],
            keywords: vec![],
        };
        let detector = RelevanceDetector::new(&lexicon);
        let hits = detector.detect_text("ZETA and alpha and alpha again");
        assert_eq!(hits.vendors, vec!["alpha", "zeta"]);
    }

    #[test]
    fn test_substring_matching_is_best_effort() {
        let detector = RelevanceDetector::new(&PipelineConfig::es().lexicon);
        let hits = detector.detect_text("More information about the weather");
        assert_eq!(hits.vendors, vec!["infor"]);
    }
}
