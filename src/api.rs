//! Classification gateway transport and call pacing.
//!
//! This module provides the low-level interface to an OpenAI-compatible
//! chat-completions gateway:
//! - [`ChatGateway`]: Core trait for sending one chat request
//! - [`HttpGateway`]: `reqwest` implementation with bearer auth and a timeout
//! - [`Pacer`]: Shared spacing between calls, with a penalty hold after 429s
//!
//! The transport reports status and body verbatim; deciding what a 401 or a
//! malformed body means is left to [`crate::classifier`].
//!
//! # Pacing Strategy
//!
//! - Each call waits until the previous call's start plus a random gap in
//!   `[min_delay, max_delay]`
//! - A 429 pushes the next allowed start out by the configured backoff
//! - Callers queue on one lock, so spacing holds under parallel classification

use crate::config::{GatewayConfig, PacingConfig};
use crate::error::ClassifyError;
use rand::{Rng, rng};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration as StdDuration;
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, instrument, warn};

/// One chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// Request body for the chat-completions endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl ChatRequest {
    /// A single-turn user request.
    pub fn user(model: &str, prompt: String, max_tokens: u32, temperature: f32) -> Self {
        Self {
            model: model.to_string(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt,
            }],
            max_tokens,
            temperature,
        }
    }
}

/// Raw gateway answer: status code and body text, uninterpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayReply {
    pub status: u16,
    pub body: String,
}

/// Trait for sending one chat-completion request.
///
/// Implementors return `Err` only for transport failures (connect, TLS,
/// timeout, unreadable body). Any HTTP answer, including error statuses, is
/// an `Ok(GatewayReply)`.
pub trait ChatGateway {
    async fn complete(&self, request: &ChatRequest) -> Result<GatewayReply, ClassifyError>;
}

/// [`ChatGateway`] that POSTs JSON to a configured endpoint.
pub struct HttpGateway {
    client: Client,
    url: String,
    api_key: String,
}

impl fmt::Debug for HttpGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpGateway")
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

impl HttpGateway {
    pub fn new(config: &GatewayConfig) -> Result<Self, reqwest::Error> {
        let timeout = StdDuration::from_secs(config.timeout_secs);
        let client = Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            url: config.url.clone(),
            api_key: config.api_key.clone(),
        })
    }
}

impl ChatGateway for HttpGateway {
    #[instrument(level = "debug", skip_all, fields(url = %self.url, model = %request.model))]
    async fn complete(&self, request: &ChatRequest) -> Result<GatewayReply, ClassifyError> {
        let t0 = Instant::now();
        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                warn!(
                    elapsed_ms = t0.elapsed().as_millis() as u64,
                    timeout = e.is_timeout(),
                    error = %e,
                    "Gateway call failed"
                );
                ClassifyError::Transport(e.to_string())
            })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| ClassifyError::Transport(e.to_string()))?;
        debug!(
            status,
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Gateway responded"
        );
        Ok(GatewayReply { status, body })
    }
}

/// Spaces out gateway calls across all callers.
pub struct Pacer {
    min_delay: StdDuration,
    max_delay: StdDuration,
    rate_limit_backoff: StdDuration,
    next_allowed: Mutex<Option<Instant>>,
}

impl fmt::Debug for Pacer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pacer")
            .field("min_delay", &self.min_delay)
            .field("max_delay", &self.max_delay)
            .field("rate_limit_backoff", &self.rate_limit_backoff)
            .finish()
    }
}

impl Pacer {
    pub fn new(config: &PacingConfig) -> Self {
        Self {
            min_delay: StdDuration::from_millis(config.min_delay_ms),
            max_delay: StdDuration::from_millis(config.max_delay_ms.max(config.min_delay_ms)),
            rate_limit_backoff: StdDuration::from_millis(config.rate_limit_backoff_ms),
            next_allowed: Mutex::new(None),
        }
    }

    /// Wait for this caller's turn, then reserve the next slot.
    pub async fn acquire(&self) {
        let mut next = self.next_allowed.lock().await;
        if let Some(at) = *next {
            if at > Instant::now() {
                debug!(wait_ms = (at - Instant::now()).as_millis() as u64, "Pacing gateway call");
                sleep_until(at).await;
            }
        }
        *next = Some(Instant::now() + self.gap());
    }

    /// Hold every caller for the rate-limit backoff, measured from now.
    pub async fn penalize(&self) {
        let mut next = self.next_allowed.lock().await;
        let hold = Instant::now() + self.rate_limit_backoff;
        *next = Some(match *next {
            Some(at) if at > hold => at,
            _ => hold,
        });
        warn!(backoff_ms = self.rate_limit_backoff.as_millis() as u64, "Rate limited; holding gateway calls");
    }

    /// Random gap in `[min_delay, max_delay]`.
    fn gap(&self) -> StdDuration {
        let lo = self.min_delay.as_millis() as u64;
        let hi = self.max_delay.as_millis() as u64;
        if hi <= lo {
            return self.min_delay;
        }
        StdDuration::from_millis(rng().random_range(lo..=hi))
    }
}
