//! Pipeline orchestration.
//!
//! One parameterized pipeline covers every preset:
//!
//! 1. **Harvest**: per source, index the homepage and fetch articles up to the cap
//! 2. **Window**: drop stale and future-dated candidates, dedup by URL
//! 3. **Gate**: optionally require a lexicon hit before spending an LLM call
//! 4. **Classify**: one paced gateway call per surviving candidate
//! 5. **Assemble**: build [`OutputRecord`]s, apply the LLM relevance flag
//!    where configured, and rank by engagement
//!
//! Sources and classifications run through ordered `buffered` streams, so
//! the output order never depends on which request finishes first.

use crate::api::ChatGateway;
use crate::classifier::{Classified, Classifier};
use crate::config::{PipelineConfig, RelevanceGate, Source};
use crate::filter::apply_time_window;
use crate::models::{ArticleCandidate, OutputRecord, RelevanceHits, RunStats};
use crate::relevance::RelevanceDetector;
use crate::scrapers::PageFetcher;
use crate::scrapers::article::fetch_articles;
use crate::scrapers::links::index_source;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Records plus counters for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    pub records: Vec<OutputRecord>,
    pub stats: RunStats,
}

/// What one source contributed.
#[derive(Debug, Default)]
struct Harvest {
    failed: bool,
    links: usize,
    articles: Vec<ArticleCandidate>,
}

pub struct Pipeline<F, G> {
    config: PipelineConfig,
    fetcher: F,
    classifier: Classifier<G>,
    detector: RelevanceDetector,
}

impl<F, G> Pipeline<F, G>
where
    F: PageFetcher,
    G: ChatGateway,
{
    pub fn new(config: PipelineConfig, fetcher: F, gateway: G) -> Self {
        let classifier = Classifier::new(gateway, &config);
        let detector = RelevanceDetector::new(&config.lexicon);
        Self {
            config,
            fetcher,
            classifier,
            detector,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run against the current wall clock.
    pub async fn run(&self) -> PipelineOutput {
        self.run_at(Utc::now()).await
    }

    /// Run with `now` as the reference time for the window and `date_scraped`.
    #[instrument(level = "info", skip_all, fields(pipeline = %self.config.name, now = %now))]
    pub async fn run_at(&self, now: DateTime<Utc>) -> PipelineOutput {
        let t0 = Instant::now();
        let mut stats = RunStats {
            sources: self.config.sources.len(),
            ..RunStats::default()
        };

        // ---- Harvest ----
        let harvests: Vec<Harvest> = stream::iter(self.config.sources.iter())
            .map(|source| self.harvest(source))
            .buffered(self.config.source_concurrency.max(1))
            .collect()
            .await;

        let mut candidates = Vec::new();
        for harvest in harvests {
            if harvest.failed {
                stats.sources_failed += 1;
            }
            stats.links_discovered += harvest.links;
            candidates.extend(harvest.articles);
        }
        stats.candidates_fetched = candidates.len();
        info!(
            sources = stats.sources,
            failed = stats.sources_failed,
            candidates = stats.candidates_fetched,
            "Harvest complete"
        );

        // ---- Window + dedup ----
        let windowed = apply_time_window(
            candidates,
            now,
            self.config.max_age_hours,
            self.config.skip_undated,
        );
        stats.candidates_in_window = windowed.len();

        // ---- Gate ----
        let scored = windowed.into_iter().map(|c| {
            let hits = self.detector.detect(&c);
            (c, hits)
        });
        let to_classify: Vec<(ArticleCandidate, RelevanceHits)> = match self.config.relevance_gate {
            RelevanceGate::Lexicon => scored
                .filter(|(c, hits)| {
                    let keep = !hits.is_empty();
                    if !keep {
                        stats.gated_out += 1;
                        debug!(url = %c.url, "No lexicon hit; not classifying");
                    }
                    keep
                })
                .collect(),
            RelevanceGate::LlmFlag | RelevanceGate::None => scored.collect(),
        };
        info!(
            gate = ?self.config.relevance_gate,
            to_classify = to_classify.len(),
            "Relevance gate applied"
        );

        // ---- Classify ----
        let total = to_classify.len();
        let classified: Vec<_> = stream::iter(to_classify.into_iter().enumerate())
            .map(|(i, (candidate, hits))| async move {
                debug!(index = i, total, url = %candidate.url, "Classifying");
                let outcome = self.classifier.classify(&candidate).await;
                (candidate, hits, outcome)
            })
            .buffered(self.config.classify_concurrency.max(1))
            .collect()
            .await;

        // ---- Assemble ----
        let date_scraped = now.date_naive();
        let mut records = Vec::with_capacity(classified.len());
        for (candidate, hits, Classified { verdict, failed }) in classified {
            if failed {
                stats.classification_failures += 1;
            }
            if self.config.relevance_gate == RelevanceGate::LlmFlag && !verdict.is_relevant {
                stats.gated_out += 1;
                debug!(url = %candidate.url, "Classifier marked not relevant; dropping");
                continue;
            }
            records.push(OutputRecord::assemble(candidate, verdict, &hits, date_scraped));
        }

        if self.config.sort_by_engagement {
            records.sort_by_key(|r| r.engagement);
        }
        stats.records = records.len();

        if stats.classification_failures > 0 && stats.classification_failures == total {
            warn!(
                failures = stats.classification_failures,
                "Every classification failed; check gateway credentials and connectivity"
            );
        }
        info!(
            sources = stats.sources,
            sources_failed = stats.sources_failed,
            links = stats.links_discovered,
            fetched = stats.candidates_fetched,
            in_window = stats.candidates_in_window,
            gated_out = stats.gated_out,
            classification_failures = stats.classification_failures,
            records = stats.records,
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Pipeline run complete"
        );

        PipelineOutput { records, stats }
    }

    /// Index one source and fetch its articles. Never fails.
    async fn harvest(&self, source: &Source) -> Harvest {
        let Some(links) =
            index_source(&self.fetcher, &source.name, &source.url, &self.config.links).await
        else {
            return Harvest {
                failed: true,
                ..Harvest::default()
            };
        };

        let articles = fetch_articles(
            &self.fetcher,
            &source.name,
            &links,
            &self.config.extraction,
            self.config.max_articles_per_source,
        )
        .await;

        Harvest {
            failed: false,
            links: links.len(),
            articles,
        }
    }
}
