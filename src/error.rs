//! Error types for the triage pipeline.
//!
//! None of these escape a single unit of work at runtime: the fetcher turns a
//! [`FetchError`] into a skipped URL and the classifier turns a
//! [`ClassifyError`] into the default verdict. Only [`ConfigError`] is meant
//! to stop a run, and only before it starts.

use thiserror::Error;

/// Errors raised while retrieving a homepage or article page.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// Connection, TLS, or timeout failure.
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status.
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// The body could not be read as text.
    #[error("failed to read body of {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The URL could not be parsed.
    #[error("invalid URL {url}: {source}")]
    BadUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

/// Reasons a classification call did not produce a usable verdict.
#[derive(Debug, Error)]
pub enum ClassifyError {
    /// Network failure or timeout talking to the gateway.
    #[error("gateway transport error: {0}")]
    Transport(String),

    #[error("gateway rejected credentials (401)")]
    Unauthorized { body: String },

    #[error("gateway refused access (403)")]
    Forbidden { body: String },

    #[error("gateway rate limited the request (429)")]
    RateLimited { body: String },

    /// Any other non-200 status.
    #[error("gateway returned HTTP {status}")]
    Status { status: u16, body: String },

    /// The chat-completion envelope did not carry message content.
    #[error("malformed completion envelope: {0}")]
    Envelope(String),

    /// No JSON object could be recovered from the model text.
    #[error("model output is not JSON: {0}")]
    NotJson(String),

    /// JSON parsed but required keys were missing.
    #[error("model output missing keys: {missing:?}")]
    Incomplete { missing: Vec<&'static str> },
}

/// Invalid configuration, surfaced at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("unknown preset {0:?} (expected one of: es, cx-ai, ccaas)")]
    UnknownPreset(String),

    #[error("gateway API key is missing; set GATEWAY_API_KEY or gateway.api_key")]
    MissingCredential,

    #[error("no sources configured")]
    NoSources,

    #[error("source {name} has an invalid base URL {url:?}")]
    InvalidSourceUrl { name: String, url: String },

    #[error("invalid setting {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}
