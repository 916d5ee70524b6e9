//! Pipeline configuration: built-in presets, YAML overlays, and validation.
//!
//! A run is driven by exactly one immutable [`PipelineConfig`], passed into
//! [`crate::pipeline::Pipeline::new`]. Nothing in the crate reads process-wide
//! mutable settings.
//!
//! # Presets
//!
//! | Preset | Sources | Relevance gate | Prompt |
//! |--------|---------|----------------|--------|
//! | `es` | ITSM / HR tech press | [`RelevanceGate::Lexicon`] | Employee Service rubric |
//! | `cx-ai` | CX, AI and enterprise tech press | [`RelevanceGate::LlmFlag`] | AI in Customer Service rubric |
//! | `ccaas` | Contact-center press | [`RelevanceGate::None`] | CCaaS rubric |
//!
//! # YAML overlays
//!
//! A config file is merged key-by-key over a preset, so it only needs the
//! fields it changes:
//!
//! ```yaml
//! preset: cx-ai
//! max_age_hours: 24
//! gateway:
//!   model: gpt-4.1-mini
//! sources:
//!   - name: CXToday
//!     url: https://www.cxtoday.com/contact-center/
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use url::Url;

/// Default browser-like user agent sent with every page fetch.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:109.0) Gecko/20100101 Firefox/117.0";

/// Default OpenAI-compatible chat-completions endpoint.
pub const DEFAULT_GATEWAY_URL: &str = "https://ai-gateway.zende.sk/v1/chat/completions";

/// A named homepage or category page to scrape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub name: String,
    pub url: String,
}

impl Source {
    pub fn new(name: &str, url: &str) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
        }
    }
}

/// Where the rule-based lexicon sits relative to the LLM call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelevanceGate {
    /// Only candidates with a vendor or keyword hit are sent to the gateway;
    /// every classified candidate is kept.
    Lexicon,
    /// Every candidate is classified; only those the model marks relevant are kept.
    LlmFlag,
    /// Every candidate is classified and kept.
    None,
}

/// Which built-in classification rubric to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PromptStyle {
    Es,
    CxAi,
    Ccaas,
}

/// Heuristics deciding which homepage links look like articles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkFilterSettings {
    /// Case-insensitive substrings that mark a path as navigation, not an article.
    pub non_article_tokens: Vec<String>,
    pub min_path_segments: usize,
    pub min_final_segment_chars: usize,
}

/// Heuristics deciding whether a fetched page is a real article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionSettings {
    /// Number of leading `<p>` elements joined into the snippet.
    pub paragraphs: usize,
    /// Snippet budget in characters.
    pub snippet_chars: usize,
    pub min_title_chars: usize,
    pub min_snippet_chars: usize,
    /// Lower-case titles that identify landing pages.
    pub generic_titles: Vec<String>,
}

/// Static vendor and keyword lists for the relevance detector.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Lexicon {
    pub vendors: Vec<String>,
    pub keywords: Vec<String>,
}

/// Classification gateway connection settings.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayConfig {
    pub url: String,
    #[serde(default)]
    pub api_key: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout_secs: u64,
}

impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("url", &self.url)
            .field("api_key", &if self.api_key.is_empty() { "<unset>" } else { "<redacted>" })
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Spacing between gateway calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacingConfig {
    /// Lower bound of the randomized gap between call starts.
    pub min_delay_ms: u64,
    /// Upper bound of the randomized gap between call starts.
    pub max_delay_ms: u64,
    /// Extra hold applied after the gateway answers 429.
    pub rate_limit_backoff_ms: u64,
}

/// Everything one pipeline run needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Pipeline name; used in logs and output file names.
    pub name: String,
    /// Sources in scrape order; earlier sources win dedup ties.
    pub sources: Vec<Source>,
    pub max_age_hours: u64,
    pub max_articles_per_source: usize,
    pub skip_undated: bool,
    pub fetch_timeout_secs: u64,
    pub user_agent: String,
    pub links: LinkFilterSettings,
    pub extraction: ExtractionSettings,
    pub lexicon: Lexicon,
    pub relevance_gate: RelevanceGate,
    pub prompt: PromptStyle,
    /// Replaces the built-in rubric; `{title}`, `{url}` and `{snippet}` are substituted.
    #[serde(default)]
    pub prompt_template: Option<String>,
    pub gateway: GatewayConfig,
    pub pacing: PacingConfig,
    pub source_concurrency: usize,
    pub classify_concurrency: usize,
    pub sort_by_engagement: bool,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Employee Service sources publish under `/news/` and `/blog/`, so only
/// listing and profile paths are rejected. Path tokens are slash-bounded so
/// slugs like `outage` or `stage` survive.
fn es_link_filter() -> LinkFilterSettings {
    LinkFilterSettings {
        non_article_tokens: strings(&[
            "/category/",
            "/tag/",
            "/author/",
            "/archive",
            "linkedin",
            "twitter",
            "facebook",
            "youtube",
        ]),
        min_path_segments: 2,
        min_final_segment_chars: 10,
    }
}

fn default_link_filter() -> LinkFilterSettings {
    LinkFilterSettings {
        non_article_tokens: strings(&[
            "guides",
            "definitions",
            "opinions",
            "podcasts",
            "quizzes",
            "techaccelerators",
            "tutorials",
            "videos",
            "news",
            "blog",
            "category",
            "tag",
            "author",
            "archive",
            "contributor",
            "linkedin",
            "twitter",
            "facebook",
            "youtube",
        ]),
        min_path_segments: 2,
        min_final_segment_chars: 10,
    }
}

fn generic_titles() -> Vec<String> {
    strings(&[
        "home",
        "about",
        "categories",
        "category",
        "tags",
        "archives",
        "authors",
        "hr technology",
        "hr tech",
        "itsm",
        "employee service",
    ])
}

fn gateway(max_tokens: u32, temperature: f32, timeout_secs: u64) -> GatewayConfig {
    GatewayConfig {
        url: DEFAULT_GATEWAY_URL.to_string(),
        api_key: String::new(),
        model: "gpt-4".to_string(),
        max_tokens,
        temperature,
        timeout_secs,
    }
}

const DEFAULT_PACING: PacingConfig = PacingConfig {
    min_delay_ms: 800,
    max_delay_ms: 1800,
    rate_limit_backoff_ms: 5000,
};

impl PipelineConfig {
    /// Look up a built-in preset by name.
    pub fn preset(name: &str) -> Result<Self, ConfigError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "es" => Ok(Self::es()),
            "cx-ai" | "cx_ai" | "cxai" => Ok(Self::cx_ai()),
            "ccaas" => Ok(Self::ccaas()),
            other => Err(ConfigError::UnknownPreset(other.to_string())),
        }
    }

    /// Employee Service (ITSM / ESM / HRSM) news, gated by the lexicon.
    pub fn es() -> Self {
        Self {
            name: "es".to_string(),
            sources: vec![
                Source::new("CXToday", "https://www.cxtoday.com/latest-news/"),
                Source::new("JoshBersin", "https://joshbersin.com/category/hr-technology/"),
                Source::new("CIO", "https://www.cio.com/news/"),
                Source::new("HRExecutive", "https://hrexecutive.com/category/hr-technology/"),
                Source::new("TechTargetNews", "https://www.techtarget.com/news/"),
                Source::new("ITSMTools", "https://itsm.tools/itsm/"),
            ],
            max_age_hours: 48,
            max_articles_per_source: 25,
            skip_undated: false,
            fetch_timeout_secs: 15,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            links: es_link_filter(),
            extraction: ExtractionSettings {
                paragraphs: 4,
                snippet_chars: 700,
                min_title_chars: 20,
                min_snippet_chars: 0,
                generic_titles: generic_titles(),
            },
            lexicon: Lexicon {
                vendors: strings(&[
                    "servicenow", "atlassian", "bmc", "bmc helix", "aisera", "moveworks",
                    "freshworks", "freshservice", "manageengine", "sysaid", "halo",
                    "haloitsm", "symphonyai", "zendesk", "ukg", "wtw", "ivanti", "infor",
                    "neocase", "leena ai", "dovetail", "salesforce", "cisco", "dynatrace",
                    "broadcom", "microsoft", "sap", "oracle",
                ]),
                keywords: strings(&[
                    "itsm", "itom", "esm", "employee service", "employee experience",
                    "employee workflow", "employee portal", "ticketing", "hr service",
                    "hrsm", "hr case management", "hr technology", "service desk",
                    "it service management", "it operations management",
                    "workflow automation", "delivery automation", "process automation",
                    "it asset management", "itam", "service catalog",
                ]),
            },
            relevance_gate: RelevanceGate::Lexicon,
            prompt: PromptStyle::Es,
            prompt_template: None,
            gateway: gateway(350, 0.2, 40),
            pacing: DEFAULT_PACING,
            source_concurrency: 1,
            classify_concurrency: 1,
            sort_by_engagement: true,
        }
    }

    /// AI in Customer Service news; the model's relevance flag decides inclusion.
    pub fn cx_ai() -> Self {
        Self {
            name: "cx-ai".to_string(),
            sources: vec![
                Source::new("CXToday", "https://www.cxtoday.com/contact-center/"),
                Source::new("CXTodayAI", "https://www.cxtoday.com/artificial-intelligence/"),
                Source::new("TechTarget", "https://www.techtarget.com/searchcustomerexperience/"),
                Source::new("NoJitter", "https://www.nojitter.com/contact-centers/ccaas"),
                Source::new("CMSWire", "https://www.cmswire.com/customer-experience/"),
                Source::new("CustomerThink", "https://customerthink.com/"),
                Source::new("VentureBeatAI", "https://venturebeat.com/ai/"),
                Source::new("TechCrunchAI", "https://techcrunch.com/tag/artificial-intelligence/"),
                Source::new("ZDNet", "https://www.zdnet.com/topic/artificial-intelligence/"),
                Source::new("InformationWeek", "https://www.informationweek.com/"),
                Source::new("Diginomica", "https://diginomica.com/"),
                Source::new("TechRepublic", "https://www.techrepublic.com/topic/artificial-intelligence/"),
                Source::new("SiliconAngle", "https://siliconangle.com/"),
                Source::new("MarTechSeries", "https://martechseries.com/"),
                Source::new("MyCustomer", "https://www.mycustomer.com/"),
                Source::new("CustomerExperienceInsight", "https://www.cxinsight.com/"),
            ],
            max_age_hours: 48,
            max_articles_per_source: 25,
            skip_undated: false,
            fetch_timeout_secs: 10,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            links: default_link_filter(),
            extraction: ExtractionSettings {
                paragraphs: 3,
                snippet_chars: 500,
                min_title_chars: 20,
                min_snippet_chars: 100,
                generic_titles: generic_titles(),
            },
            lexicon: Lexicon {
                vendors: strings(&[
                    "zendesk", "salesforce", "hubspot", "freshworks", "servicenow",
                    "intercom", "gorgias", "genesys", "nice cxone", "five9", "ringcentral",
                    "8x8", "twilio", "vonage", "infobip", "sierra", "crescendo", "decagon",
                    "forethought", "polyai", "asapp", "kore.ai", "yellow.ai", "cognigy",
                    "replicant", "parloa", "cresta", "uniphore", "observe.ai", "assembled",
                    "calabrio", "openai", "aws", "azure", "google cloud", "databricks",
                    "snowflake",
                ]),
                keywords: strings(&[
                    "contact center", "contact centre", "ccaas", "customer service",
                    "customer experience", "agent assist", "conversational ai", "chatbot",
                    "virtual agent", "ai agent", "copilot", "voice ai",
                    "autonomous resolution",
                ]),
            },
            relevance_gate: RelevanceGate::LlmFlag,
            prompt: PromptStyle::CxAi,
            prompt_template: None,
            gateway: gateway(400, 0.3, 45),
            pacing: DEFAULT_PACING,
            source_concurrency: 1,
            classify_concurrency: 1,
            sort_by_engagement: true,
        }
    }

    /// Contact-center / CCaaS news; everything fetched is classified and kept.
    pub fn ccaas() -> Self {
        Self {
            name: "ccaas".to_string(),
            sources: vec![
                Source::new("CXToday", "https://www.cxtoday.com/contact-center/"),
                Source::new("TechTarget", "https://www.techtarget.com/searchcustomerexperience/"),
                Source::new("NoJitter", "https://www.nojitter.com/contact-centers/ccaas"),
            ],
            max_age_hours: 48,
            max_articles_per_source: 20,
            skip_undated: false,
            fetch_timeout_secs: 10,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            links: default_link_filter(),
            extraction: ExtractionSettings {
                paragraphs: 3,
                snippet_chars: 500,
                min_title_chars: 20,
                min_snippet_chars: 100,
                generic_titles: generic_titles(),
            },
            lexicon: Lexicon {
                vendors: strings(&[
                    "genesys", "nice cxone", "five9", "talkdesk", "8x8", "ringcentral",
                    "vonage", "twilio", "amazon connect", "avaya", "mitel", "dialpad",
                    "zoom contact center", "content guru", "sprinklr",
                ]),
                keywords: strings(&[
                    "contact center", "contact centre", "ccaas", "cpaas",
                    "workforce engagement", "wem", "ivr", "omnichannel", "voice ai",
                    "agent assist", "customer experience",
                ]),
            },
            relevance_gate: RelevanceGate::None,
            prompt: PromptStyle::Ccaas,
            prompt_template: None,
            gateway: gateway(350, 0.3, 45),
            pacing: DEFAULT_PACING,
            source_concurrency: 1,
            classify_concurrency: 1,
            sort_by_engagement: true,
        }
    }

    /// Merge a YAML document over a preset.
    ///
    /// The document may name its own `preset:`; otherwise `default_preset`
    /// is used as the base.
    pub fn from_yaml_str(yaml: &str, default_preset: &str, origin: &str) -> Result<Self, ConfigError> {
        let parse_err = |source| ConfigError::Parse {
            path: origin.to_string(),
            source,
        };

        let mut overlay: serde_yaml::Value = serde_yaml::from_str(yaml).map_err(parse_err)?;
        if overlay.is_null() {
            overlay = serde_yaml::Value::Mapping(Default::default());
        }

        let preset_name = match overlay.as_mapping_mut() {
            Some(map) => map
                .remove("preset")
                .and_then(|v| v.as_str().map(str::to_string))
                .unwrap_or_else(|| default_preset.to_string()),
            None => default_preset.to_string(),
        };

        let base = Self::preset(&preset_name)?;
        let mut merged = serde_yaml::to_value(&base).map_err(parse_err)?;
        merge_yaml(&mut merged, overlay);
        serde_yaml::from_value(merged).map_err(parse_err)
    }

    /// Read a YAML file and merge it over a preset.
    pub fn load(path: &str, default_preset: &str) -> Result<Self, ConfigError> {
        let yaml = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        Self::from_yaml_str(&yaml, default_preset, path)
    }

    /// Reject configurations that cannot produce a meaningful run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.gateway.api_key.trim().is_empty() {
            return Err(ConfigError::MissingCredential);
        }
        if self.sources.is_empty() {
            return Err(ConfigError::NoSources);
        }
        for source in &self.sources {
            let ok = Url::parse(&source.url)
                .map(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
                .unwrap_or(false);
            if !ok || source.name.trim().is_empty() {
                return Err(ConfigError::InvalidSourceUrl {
                    name: source.name.clone(),
                    url: source.url.clone(),
                });
            }
        }
        if Url::parse(&self.gateway.url).is_err() {
            return Err(ConfigError::InvalidValue {
                field: "gateway.url",
                reason: format!("{:?} is not a URL", self.gateway.url),
            });
        }
        if self.max_articles_per_source == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_articles_per_source",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.fetch_timeout_secs == 0 || self.gateway.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "timeout",
                reason: "fetch and gateway timeouts must be non-zero".to_string(),
            });
        }
        if self.pacing.min_delay_ms > self.pacing.max_delay_ms {
            return Err(ConfigError::InvalidValue {
                field: "pacing",
                reason: format!(
                    "min_delay_ms ({}) exceeds max_delay_ms ({})",
                    self.pacing.min_delay_ms, self.pacing.max_delay_ms
                ),
            });
        }
        if self.source_concurrency == 0 || self.classify_concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                field: "concurrency",
                reason: "source and classify concurrency must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

/// Recursively merge `overlay` into `base`: mappings merge key-by-key,
/// anything else replaces.
fn merge_yaml(base: &mut serde_yaml::Value, overlay: serde_yaml::Value) {
    match (base, overlay) {
        (serde_yaml::Value::Mapping(base_map), serde_yaml::Value::Mapping(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge_yaml(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}
