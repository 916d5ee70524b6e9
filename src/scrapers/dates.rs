//! Publish-date extraction from article markup.
//!
//! Strategies run in order and the first parseable value wins:
//!
//! 1. JSON-LD blocks (`datePublished`, then `dateModified`, then `uploadDate`)
//! 2. The first `<time>` element (its `datetime` attribute, else its text)
//! 3. Well-known `<meta>` tags
//! 4. The first `span`/`div` whose class mentions "date"
//!
//! A stage that finds nothing parseable is skipped. Results are always UTC;
//! values without an offset are taken to be UTC already.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::trace;

static JSON_LD_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"script[type="application/ld+json"]"#).expect("static selector"));
static TIME_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("time").expect("static selector"));
static DATE_CLASS_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("span[class], div[class]").expect("static selector"));

/// Meta tags checked in order, as `(selector, label)`.
static META_SELECTORS: Lazy<Vec<(Selector, &'static str)>> = Lazy::new(|| {
    [
        r#"meta[property="article:published_time"]"#,
        r#"meta[property="og:updated_time"]"#,
        r#"meta[name="pubdate"]"#,
        r#"meta[name="publish-date"]"#,
        r#"meta[name="date"]"#,
        r#"meta[itemprop="datePublished"]"#,
    ]
    .into_iter()
    .map(|css| (Selector::parse(css).expect("static selector"), css))
    .collect()
});

/// JSON-LD keys in priority order.
const JSON_LD_KEYS: [&str; 3] = ["datePublished", "dateModified", "uploadDate"];

static EMBEDDED_ISO: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\d{4}-\d{2}-\d{2}(?:[T ]\d{2}:\d{2}(?::\d{2}(?:\.\d+)?)?(?:Z|[+-]\d{2}:?\d{2})?)?")
        .expect("static regex")
});
static ORDINAL_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{1,2})(?:st|nd|rd|th)\b").expect("static regex"));

/// Which strategy produced a date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateSource {
    JsonLd,
    TimeElement,
    MetaTag,
    DateClass,
}

/// Extract the best-effort publish time from a parsed document.
pub fn extract_published_date(document: &Html) -> Option<DateTime<Utc>> {
    extract_published_date_with_source(document).map(|(dt, _)| dt)
}

/// Like [`extract_published_date`], also reporting which strategy matched.
pub fn extract_published_date_with_source(document: &Html) -> Option<(DateTime<Utc>, DateSource)> {
    from_json_ld(document)
        .map(|dt| (dt, DateSource::JsonLd))
        .or_else(|| from_time_element(document).map(|dt| (dt, DateSource::TimeElement)))
        .or_else(|| from_meta_tags(document).map(|dt| (dt, DateSource::MetaTag)))
        .or_else(|| from_date_class(document).map(|dt| (dt, DateSource::DateClass)))
}

fn from_json_ld(document: &Html) -> Option<DateTime<Utc>> {
    for script in document.select(&JSON_LD_SELECTOR) {
        let text = script.text().collect::<String>();
        if text.trim().is_empty() {
            continue;
        }
        let data: serde_json::Value = match serde_json::from_str(text.trim()) {
            Ok(v) => v,
            Err(e) => {
                trace!(error = %e, "Skipping unparseable JSON-LD block");
                continue;
            }
        };
        for obj in json_ld_objects(&data) {
            for key in JSON_LD_KEYS {
                let Some(raw) = obj.get(key).and_then(|v| v.as_str()) else {
                    continue;
                };
                if raw.trim().is_empty() {
                    continue;
                }
                if let Some(dt) = parse_flexible_date(raw) {
                    return Some(dt);
                }
            }
        }
    }
    None
}

/// Flatten a JSON-LD payload into the objects worth checking, in order.
///
/// Handles a single object, an array of objects, and `@graph` containers.
fn json_ld_objects(data: &serde_json::Value) -> Vec<&serde_json::Map<String, serde_json::Value>> {
    let mut out = Vec::new();
    match data {
        serde_json::Value::Object(map) => {
            out.push(map);
            if let Some(graph) = map.get("@graph") {
                out.extend(json_ld_objects(graph));
            }
        }
        serde_json::Value::Array(items) => {
            for item in items {
                out.extend(json_ld_objects(item));
            }
        }
        _ => {}
    }
    out
}

fn from_time_element(document: &Html) -> Option<DateTime<Utc>> {
    let time = document.select(&TIME_SELECTOR).next()?;
    match time.value().attr("datetime") {
        Some(attr) => parse_flexible_date(attr),
        None => parse_flexible_date(&element_text(&time)),
    }
}

fn from_meta_tags(document: &Html) -> Option<DateTime<Utc>> {
    for (selector, label) in META_SELECTORS.iter() {
        let Some(tag) = document.select(selector).next() else {
            continue;
        };
        let Some(content) = tag.value().attr("content") else {
            continue;
        };
        if content.trim().is_empty() {
            continue;
        }
        match parse_flexible_date(content) {
            Some(dt) => return Some(dt),
            None => trace!(meta = label, %content, "Unparseable meta date"),
        }
    }
    None
}

fn from_date_class(document: &Html) -> Option<DateTime<Utc>> {
    let element = document.select(&DATE_CLASS_SELECTOR).find(|el| {
        el.value()
            .classes()
            .any(|class| class.to_lowercase().contains("date"))
    })?;
    parse_flexible_date(&element_text(&element))
}

fn element_text(element: &ElementRef<'_>) -> String {
    crate::utils::collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

/// Formats carrying an explicit offset.
const OFFSET_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S %z",
    "%a, %d %b %Y %H:%M:%S %z",
];

/// Formats without an offset; interpreted as UTC.
const NAIVE_DATETIME_FORMATS: [&str; 8] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%B %d, %Y %H:%M",
    "%b %d, %Y %H:%M",
];

/// Date-only formats; interpreted as midnight UTC.
const DATE_FORMATS: [&str; 10] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
    "%a, %B %d, %Y",
    "%A, %B %d, %Y",
    "%B %d %Y",
    "%b. %d, %Y",
];

/// Parse the date formats commonly found in news markup.
///
/// Tries RFC 3339 and RFC 2822, then a list of ISO-like and English
/// month-name formats, then an ISO date embedded in surrounding text
/// ("Published 2024-05-06 10:00"). Naive values are taken as UTC.
pub fn parse_flexible_date(raw: &str) -> Option<DateTime<Utc>> {
    let cleaned = ORDINAL_SUFFIX
        .replace_all(&crate::utils::collapse_whitespace(raw), "$1")
        .into_owned();
    if cleaned.is_empty() {
        return None;
    }

    parse_exact(&cleaned).or_else(|| {
        let embedded = EMBEDDED_ISO.find(&cleaned)?;
        if embedded.as_str() == cleaned {
            return None;
        }
        parse_exact(embedded.as_str())
    })
}

fn parse_exact(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Some(zulu) = s.strip_suffix('Z').or_else(|| s.strip_suffix('z')) {
        if let Some(dt) = parse_naive(zulu) {
            return Some(dt);
        }
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    parse_naive(s)
}

fn parse_naive(s: &str) -> Option<DateTime<Utc>> {
    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return date
                .and_hms_opt(0, 0, 0)
                .map(|naive| Utc.from_utc_datetime(&naive));
        }
    }
    None
}
