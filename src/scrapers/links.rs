//! Homepage link discovery.
//!
//! Turns a homepage or category page into an ordered list of candidate
//! article URLs. The heuristics are best-effort and site-agnostic: they will
//! occasionally drop a real article with a short slug or admit a category
//! page with a long one.

use crate::config::LinkFilterSettings;
use crate::error::FetchError;
use crate::models::RawLink;
use crate::scrapers::PageFetcher;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use std::collections::HashSet;
use tracing::{debug, info, instrument, warn};
use url::Url;

static ANCHOR_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("static selector"));

/// Why a link was dropped. Only used for debug logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkRejection {
    Unresolvable,
    NotHttp,
    OtherHost,
    NonArticleToken,
    TooShallow,
    ShortSlug,
    UppercaseSlug,
}

/// Decide whether an already-resolved URL looks like an article on `base`.
pub fn check_link(url: &Url, base: &Url, settings: &LinkFilterSettings) -> Result<(), LinkRejection> {
    if !matches!(url.scheme(), "http" | "https") {
        return Err(LinkRejection::NotHttp);
    }
    if url.host_str() != base.host_str() || url.port_or_known_default() != base.port_or_known_default() {
        return Err(LinkRejection::OtherHost);
    }

    let mut haystack = url.path().to_lowercase();
    if let Some(query) = url.query() {
        haystack.push('?');
        haystack.push_str(&query.to_lowercase());
    }
    if settings
        .non_article_tokens
        .iter()
        .any(|token| haystack.contains(&token.to_lowercase()))
    {
        return Err(LinkRejection::NonArticleToken);
    }

    let segments: Vec<&str> = url.path().split('/').filter(|s| !s.is_empty()).collect();
    if segments.len() < settings.min_path_segments {
        return Err(LinkRejection::TooShallow);
    }

    let last = segments.last().copied().unwrap_or_default();
    if last.chars().count() < settings.min_final_segment_chars {
        return Err(LinkRejection::ShortSlug);
    }
    if is_all_uppercase(last) {
        return Err(LinkRejection::UppercaseSlug);
    }

    Ok(())
}

/// True when the segment has cased letters and none of them are lowercase.
fn is_all_uppercase(segment: &str) -> bool {
    segment.chars().any(char::is_alphabetic) && !segment.chars().any(char::is_lowercase)
}

/// Extract candidate article links from homepage markup.
///
/// Relative hrefs are resolved against `base_url`; fragments are dropped.
/// Returns links in document order with duplicates removed (first wins).
pub fn discover_links(
    source_name: &str,
    base_url: &Url,
    html: &str,
    settings: &LinkFilterSettings,
) -> Vec<RawLink> {
    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for element in document.select(&ANCHOR_SELECTOR) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let mut resolved = match base_url.join(href.trim()) {
            Ok(u) => u,
            Err(_) => {
                debug!(%href, reason = ?LinkRejection::Unresolvable, "Rejected link");
                continue;
            }
        };
        resolved.set_fragment(None);

        if let Err(reason) = check_link(&resolved, base_url, settings) {
            debug!(url = %resolved, ?reason, "Rejected link");
            continue;
        }

        let url = resolved.to_string();
        if seen.insert(url.clone()) {
            links.push(RawLink {
                url,
                source_name: source_name.to_string(),
            });
        }
    }

    links
}

/// Fetch a source homepage and discover its candidate article links.
///
/// Fetch or URL errors are logged and yield an empty list; the caller moves
/// on to the next source.
#[instrument(level = "info", skip(fetcher, settings))]
pub async fn index_source<F: PageFetcher>(
    fetcher: &F,
    source_name: &str,
    base_url: &str,
    settings: &LinkFilterSettings,
) -> Option<Vec<RawLink>> {
    let parsed = Url::parse(base_url).map_err(|source| FetchError::BadUrl {
        url: base_url.to_string(),
        source,
    });
    let base = match parsed {
        Ok(u) => u,
        Err(e) => {
            warn!(error = %e, "Invalid source URL; skipping source");
            return None;
        }
    };

    let html = match fetcher.fetch(base_url).await {
        Ok(html) => html,
        Err(e) => {
            warn!(error = %e, "Homepage fetch failed; source yields no candidates");
            return None;
        }
    };

    let links = discover_links(source_name, &base, &html, settings);
    info!(count = links.len(), "Indexed candidate article links");
    Some(links)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;

    fn settings() -> LinkFilterSettings {
        PipelineConfig::cx_ai().links
    }

    fn check_es(url: &str, base: &str) -> Result<(), LinkRejection> {
        check_link(
            &Url::parse(url).unwrap(),
            &Url::parse(base).unwrap(),
            &PipelineConfig::es().links,
        )
    }

    fn base() -> Url {
        Url::parse("https://www.example.com/contact-center/").unwrap()
    }

    fn check(url: &str) -> Result<(), LinkRejection> {
        check_link(&Url::parse(url).unwrap(), &base(), &settings())
    }

    #[test]
    fn test_accepts_same_host_two_segment_long_slug() {
        assert_eq!(check("https://www.example.com/a/full-article-slug-title"), Ok(()));
        assert_eq!(
            check("https://www.example.com/contact-center/genesys-launches-ai-studio"),
            Ok(())
        );
    }

    #[test]
    fn test_rejects_other_host() {
        assert_eq!(
            check("https://other.example.org/a/full-article-slug-title"),
            Err(LinkRejection::OtherHost)
        );
        assert_eq!(
            check("https://example.com/a/full-article-slug-title"),
            Err(LinkRejection::OtherHost)
        );
        assert_eq!(
            check("https://www.example.com:8443/a/full-article-slug-title"),
            Err(LinkRejection::OtherHost)
        );
    }

    #[test]
    fn test_rejects_non_article_tokens_case_insensitively() {
        assert_eq!(
            check("https://www.example.com/blog/latest-and-greatest"),
            Err(LinkRejection::NonArticleToken)
        );
        assert_eq!(
            check("https://www.example.com/Category/contact-center-software"),
            Err(LinkRejection::NonArticleToken)
        );
        assert_eq!(
            check("https://www.example.com/people/AUTHOR-jane-doe-profile"),
            Err(LinkRejection::NonArticleToken)
        );
    }

    #[test]
    fn test_es_accepts_articles_under_news_paths() {
        assert_eq!(
            check_es(
                "https://www.techtarget.com/searchitoperations/news/366612345/ServiceNow-adds-agentic-AI-to-ITSM",
                "https://www.techtarget.com/news/",
            ),
            Ok(())
        );
        assert_eq!(
            check_es(
                "https://www.cio.com/news/servicenow-buys-moveworks-for-2-8b",
                "https://www.cio.com/news/",
            ),
            Ok(())
        );
        assert_eq!(
            check_es(
                "https://www.cio.com/article/2024/05/outage-hits-the-service-desk",
                "https://www.cio.com/news/",
            ),
            Ok(())
        );
    }

    #[test]
    fn test_es_still_rejects_listing_and_social_paths() {
        let base = "https://www.cio.com/news/";
        for url in [
            "https://www.cio.com/tag/servicenow-coverage",
            "https://www.cio.com/category/it-service-management",
            "https://www.cio.com/author/jane-doe-profile",
            "https://www.cio.com/share/linkedin?u=servicenow-buys-moveworks",
        ] {
            assert_eq!(check_es(url, base), Err(LinkRejection::NonArticleToken), "{url}");
        }
    }

    #[test]
    fn test_discover_links_on_es_news_homepage() {
        let base = Url::parse("https://www.cio.com/news/").unwrap();
        let html = r#"
            <a href="/news/servicenow-buys-moveworks-for-2-8b">Deal</a>
            <a href="/news/">More news</a>
            <a href="/tag/servicenow-coverage">Tag</a>
        "#;
        let links = discover_links("CIO", &base, html, &PipelineConfig::es().links);
        let urls: Vec<&str> = links.iter().map(|l| l.url.as_str()).collect();
        assert_eq!(urls, vec!["https://www.cio.com/news/servicenow-buys-moveworks-for-2-8b"]);
    }

    #[test]
    fn test_rejects_shallow_paths() {
        assert_eq!(
            check("https://www.example.com/single-segment-article"),
            Err(LinkRejection::TooShallow)
        );
        assert_eq!(check("https://www.example.com/"), Err(LinkRejection::TooShallow));
    }

    #[test]
    fn test_rejects_short_or_uppercase_final_segment() {
        assert_eq!(check("https://www.example.com/a/x1"), Err(LinkRejection::ShortSlug));
        assert_eq!(
            check("https://www.example.com/topics/CREATORWORKFLOWS"),
            Err(LinkRejection::UppercaseSlug)
        );
        // Mixed case is fine.
        assert_eq!(check("https://www.example.com/topics/CreatorWorkflows"), Ok(()));
    }

    #[test]
    fn test_rejects_non_http_schemes() {
        assert_eq!(
            check("mailto:editor@example.com"),
            Err(LinkRejection::NotHttp)
        );
    }

    #[test]
    fn test_discover_links_resolves_filters_and_dedups() {
        let html = r##"
            <html><body>
              <a href="/a/full-article-slug-title">Valid</a>
              <a href="/blog/latest">Blog</a>
              <a href="/a/x1">Short</a>
              <a href="https://www.example.com/a/full-article-slug-title#comments">Dup</a>
              <a href="https://twitter.com/share?u=/a/full-article-slug-title">Share</a>
              <a href="javascript:void(0)">JS</a>
              <a href="/b/second-article-slug-here">Second</a>
            </body></html>
        "##;
        let links = discover_links("Example", &base(), html, &settings());
        let urls: Vec<&str> = links.iter().map(|l| l.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://www.example.com/a/full-article-slug-title",
                "https://www.example.com/b/second-article-slug-here",
            ]
        );
        assert!(links.iter().all(|l| l.source_name == "Example"));
    }

    #[test]
    fn test_discover_links_empty_markup() {
        assert!(discover_links("Example", &base(), "", &settings()).is_empty());
    }
}
