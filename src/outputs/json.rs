//! JSON feed writer.
//!
//! Each run overwrites `{output_dir}/{date_scraped}/{pipeline}.json`, so a
//! same-day rerun replaces the earlier feed instead of appending to it.

use crate::models::FeedReport;
use std::error::Error;
use std::path::PathBuf;
use tokio::fs;
use tracing::{error, info, instrument};

/// Path a report is written to under `output_dir`.
pub fn feed_path(report: &FeedReport, output_dir: &str) -> PathBuf {
    PathBuf::from(output_dir)
        .join(report.date_scraped.to_string())
        .join(format!("{}.json", report.pipeline))
}

/// Write a [`FeedReport`] as pretty JSON, creating the date directory.
///
/// # Returns
///
/// The path written, or an error if serialization, directory creation or the
/// write fails.
#[instrument(level = "info", skip_all, fields(output_dir = %output_dir, pipeline = %report.pipeline))]
pub async fn write_feed(report: &FeedReport, output_dir: &str) -> Result<PathBuf, Box<dyn Error>> {
    let json = serde_json::to_string_pretty(report)?;
    let path = feed_path(report, output_dir);

    if let Some(dir) = path.parent() {
        info!(dir = %dir.display(), "Ensuring feed directory exists");
        if let Err(e) = fs::create_dir_all(dir).await {
            error!(dir = %dir.display(), error = %e, "Failed to create feed dir");
            return Err(e.into());
        }
    }

    fs::write(&path, json).await?;
    info!(path = %path.display(), records = report.records.len(), "Wrote feed");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Engagement, OutputRecord, RunStats};
    use chrono::{NaiveDate, TimeZone, Utc};

    fn report() -> FeedReport {
        let date = NaiveDate::from_ymd_opt(2024, 5, 6).unwrap();
        FeedReport {
            pipeline: "ccaas".to_string(),
            date_scraped: date,
            generated_at: Utc.with_ymd_and_hms(2024, 5, 6, 12, 0, 0).unwrap(),
            stats: RunStats {
                records: 1,
                ..RunStats::default()
            },
            records: vec![OutputRecord {
                date_scraped: date,
                source: "NoJitter".to_string(),
                title: "Five9 posts record quarter on AI demand".to_string(),
                url: "https://www.nojitter.com/contact-centers/five9-record-quarter".to_string(),
                published: String::new(),
                summary: "Five9 grew.".to_string(),
                engagement: Engagement::Medium,
                hook: "Five9 rides the AI wave".to_string(),
                vendors_hit: "five9".to_string(),
                keywords_hit: String::new(),
                is_relevant: false,
            }],
        }
    }

    #[test]
    fn test_feed_path_layout() {
        let path = feed_path(&report(), "/srv/feeds");
        assert_eq!(path, PathBuf::from("/srv/feeds/2024-05-06/ccaas.json"));
    }

    #[tokio::test]
    async fn test_write_feed_round_trips_field_names() {
        let dir = std::env::temp_dir().join(format!("awful_news_triage_feed_{}", std::process::id()));
        let dir_str = dir.to_str().unwrap().to_string();

        let path = write_feed(&report(), &dir_str).await.unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&written).unwrap();

        assert_eq!(value["pipeline"], "ccaas");
        assert_eq!(value["stats"]["records"], 1);
        let record = &value["records"][0];
        assert_eq!(record["date_scraped"], "2024-05-06");
        assert_eq!(record["engagement"], "MEDIUM");
        assert_eq!(record["vendors_hit"], "five9");
        assert_eq!(record["is_relevant"], false);
        assert_eq!(record["published"], "");

        let _ = std::fs::remove_dir_all(&dir);
    }
}
