//! Command-line interface definitions for Awful News Triage.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Gateway settings and run thresholds can also come from environment
//! variables; anything given here overrides the preset or config file.

use awful_news_triage::config::PipelineConfig;
use awful_news_triage::utils::parse_flag;
use clap::Parser;

/// Command-line arguments for the Awful News Triage application.
///
/// # Examples
///
/// ```sh
/// # Run the Employee Service preset
/// GATEWAY_API_KEY=... awful_news_triage -o ./feeds
///
/// # Run the CCaaS preset with a wider window
/// awful_news_triage -p ccaas -o ./feeds --max-age-hours 72
///
/// # Start from a YAML file layered over the cx-ai preset
/// awful_news_triage -p cx-ai -c ./triage.yaml -o ./feeds
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Output directory for the JSON feed
    #[arg(short, long)]
    pub output_dir: String,

    /// Built-in preset: es, cx-ai or ccaas
    #[arg(short, long, default_value = "es")]
    pub preset: String,

    /// Optional path to a YAML config layered over the preset
    #[arg(short, long)]
    pub config: Option<String>,

    /// Classification gateway API key
    #[arg(long, env = "GATEWAY_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Classification gateway chat-completions URL
    #[arg(long, env = "GATEWAY_URL")]
    pub gateway_url: Option<String>,

    /// Model identifier sent to the gateway
    #[arg(long, env = "GATEWAY_MODEL")]
    pub model: Option<String>,

    /// Maximum article age in hours
    #[arg(long, env = "MAX_AGE_HOURS")]
    pub max_age_hours: Option<u64>,

    /// Maximum accepted articles per source
    #[arg(long, env = "MAX_ARTICLES_PER_SOURCE")]
    pub max_articles_per_source: Option<usize>,

    /// Drop articles without a detectable publish date (true/1/yes)
    #[arg(long, env = "SKIP_UNDATED", value_parser = parse_bool_like)]
    pub skip_undated: Option<bool>,

    /// Sources indexed concurrently
    #[arg(long)]
    pub source_concurrency: Option<usize>,

    /// Classification calls in flight at once (still paced)
    #[arg(long)]
    pub classify_concurrency: Option<usize>,
}

fn parse_bool_like(raw: &str) -> Result<bool, String> {
    Ok(parse_flag(raw))
}

impl Cli {
    /// Apply flag and env overrides on top of a loaded config.
    pub fn apply_overrides(&self, config: &mut PipelineConfig) {
        if let Some(key) = &self.api_key {
            config.gateway.api_key = key.clone();
        }
        if let Some(url) = &self.gateway_url {
            config.gateway.url = url.clone();
        }
        if let Some(model) = &self.model {
            config.gateway.model = model.clone();
        }
        if let Some(hours) = self.max_age_hours {
            config.max_age_hours = hours;
        }
        if let Some(cap) = self.max_articles_per_source {
            config.max_articles_per_source = cap;
        }
        if let Some(skip) = self.skip_undated {
            config.skip_undated = skip;
        }
        if let Some(n) = self.source_concurrency {
            config.source_concurrency = n;
        }
        if let Some(n) = self.classify_concurrency {
            config.classify_concurrency = n;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from([
            "awful_news_triage",
            "--output-dir",
            "./feeds",
            "--preset",
            "ccaas",
            "--config",
            "./triage.yaml",
        ]);

        assert_eq!(cli.output_dir, "./feeds");
        assert_eq!(cli.preset, "ccaas");
        assert_eq!(cli.config.as_deref(), Some("./triage.yaml"));
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::parse_from(["awful_news_triage", "-o", "/tmp/feeds", "-p", "cx-ai"]);

        assert_eq!(cli.output_dir, "/tmp/feeds");
        assert_eq!(cli.preset, "cx-ai");
    }

    #[test]
    fn test_skip_undated_accepts_boolean_like_values() {
        for (raw, expected) in [("yes", true), ("1", true), ("TRUE", true), ("no", false), ("off", false)] {
            let cli = Cli::parse_from(["awful_news_triage", "-o", "x", "--skip-undated", raw]);
            assert_eq!(cli.skip_undated, Some(expected), "{raw}");
        }
    }

    #[test]
    fn test_overrides_apply_to_config() {
        let cli = Cli::parse_from([
            "awful_news_triage",
            "-o",
            "x",
            "--api-key",
            "k",
            "--gateway-url",
            "http://localhost:9000/v1/chat/completions",
            "--model",
            "gpt-4o",
            "--max-age-hours",
            "72",
            "--max-articles-per-source",
            "5",
            "--skip-undated",
            "true",
            "--classify-concurrency",
            "4",
        ]);
        let mut config = PipelineConfig::es();
        cli.apply_overrides(&mut config);

        assert_eq!(config.gateway.api_key, "k");
        assert_eq!(config.gateway.url, "http://localhost:9000/v1/chat/completions");
        assert_eq!(config.gateway.model, "gpt-4o");
        assert_eq!(config.max_age_hours, 72);
        assert_eq!(config.max_articles_per_source, 5);
        assert!(config.skip_undated);
        assert_eq!(config.classify_concurrency, 4);
        assert!(config.validate().is_ok());
    }
}
