//! Article page fetching and parsing.
//!
//! A page becomes an [`ArticleCandidate`] only if it has a real headline and
//! body text; navigation and landing pages that slipped through link
//! discovery are rejected here by title and snippet heuristics.

use crate::config::ExtractionSettings;
use crate::models::{ArticleCandidate, RawLink};
use crate::scrapers::PageFetcher;
use crate::scrapers::dates::extract_published_date;
use crate::utils::{collapse_whitespace, truncate_chars};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, instrument, warn};

static H1_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("h1").expect("static selector"));
static H2_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("h2").expect("static selector"));
static P_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("p").expect("static selector"));

/// Why a fetched page was not turned into a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageRejection {
    NoTitle,
    NoParagraphs,
    ShortTitle,
    GenericTitle,
    ShortSnippet,
}

fn text_of(element: &ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

/// Parse article markup into a candidate.
///
/// The title comes from the first `<h1>`, or the first `<h2>` when there is
/// no `<h1>`. The snippet is the first `settings.paragraphs` paragraphs,
/// joined and cut to `settings.snippet_chars` characters.
pub fn parse_article(
    source_name: &str,
    url: &str,
    html: &str,
    settings: &ExtractionSettings,
) -> Result<ArticleCandidate, PageRejection> {
    let document = Html::parse_document(html);

    let heading = document
        .select(&H1_SELECTOR)
        .next()
        .or_else(|| document.select(&H2_SELECTOR).next())
        .ok_or(PageRejection::NoTitle)?;
    let title = text_of(&heading);
    if title.is_empty() {
        return Err(PageRejection::NoTitle);
    }
    if title.chars().count() < settings.min_title_chars {
        return Err(PageRejection::ShortTitle);
    }
    let lowered = title.to_lowercase();
    if settings.generic_titles.iter().any(|g| g.to_lowercase() == lowered) {
        return Err(PageRejection::GenericTitle);
    }

    let paragraphs: Vec<String> = document
        .select(&P_SELECTOR)
        .take(settings.paragraphs)
        .map(|p| text_of(&p))
        .collect();
    if paragraphs.is_empty() {
        return Err(PageRejection::NoParagraphs);
    }

    let joined = paragraphs
        .iter()
        .filter(|p| !p.is_empty())
        .cloned()
        .collect::<Vec<_>>()
        .join(" ");
    let snippet = truncate_chars(&joined, settings.snippet_chars).trim_end().to_string();
    if snippet.chars().count() < settings.min_snippet_chars {
        return Err(PageRejection::ShortSnippet);
    }

    Ok(ArticleCandidate {
        source: source_name.to_string(),
        title,
        url: url.to_string(),
        snippet,
        published_at: extract_published_date(&document),
    })
}

/// Fetch one article; any failure is logged and yields `None`.
#[instrument(level = "debug", skip_all, fields(url = %link.url))]
pub async fn fetch_article<F: PageFetcher>(
    fetcher: &F,
    link: &RawLink,
    settings: &ExtractionSettings,
) -> Option<ArticleCandidate> {
    let html = match fetcher.fetch(&link.url).await {
        Ok(html) => html,
        Err(e) => {
            warn!(error = %e, "Article fetch failed; skipping");
            return None;
        }
    };

    match parse_article(&link.source_name, &link.url, &html, settings) {
        Ok(candidate) => {
            debug!(title = %candidate.title, dated = candidate.published_at.is_some(), "Parsed article");
            Some(candidate)
        }
        Err(reason) => {
            debug!(?reason, "Page does not look like an article; skipping");
            None
        }
    }
}

/// Fetch links in order until `cap` candidates have been accepted.
///
/// Rejected or failed links do not count towards the cap.
#[instrument(level = "info", skip_all, fields(source = %source_name, links = links.len(), cap = cap))]
pub async fn fetch_articles<F: PageFetcher>(
    fetcher: &F,
    source_name: &str,
    links: &[RawLink],
    settings: &ExtractionSettings,
    cap: usize,
) -> Vec<ArticleCandidate> {
    let mut articles = Vec::new();
    for link in links {
        if articles.len() >= cap {
            break;
        }
        if let Some(candidate) = fetch_article(fetcher, link, settings).await {
            articles.push(candidate);
        }
    }
    info!(count = articles.len(), "Fetched article contents");
    articles
}
