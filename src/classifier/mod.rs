//! LLM classification of article candidates.
//!
//! [`Classifier`] renders a prompt, waits on the shared [`Pacer`], sends one
//! request through a [`ChatGateway`] and parses the reply into a
//! [`ClassificationResult`]. Every failure mode degrades to the default
//! verdict (empty summary, `LOW`, empty hook, not relevant) so one bad call
//! never costs the rest of the run.

pub mod parse;
pub mod prompt;

use crate::api::{ChatGateway, ChatRequest, GatewayReply, Pacer};
use crate::config::PipelineConfig;
use crate::error::ClassifyError;
use crate::models::{ArticleCandidate, ClassificationResult};
use crate::utils::truncate_for_log;
use prompt::PromptTemplate;
use std::fmt;
use std::time::Instant;
use tracing::{debug, error, instrument, warn};

/// Maximum response-body characters echoed into logs.
const LOG_BODY_CHARS: usize = 200;

/// A verdict, and whether it is the default standing in for a failed call.
#[derive(Debug, Clone, PartialEq)]
pub struct Classified {
    pub verdict: ClassificationResult,
    pub failed: bool,
}

pub struct Classifier<G> {
    gateway: G,
    pacer: Pacer,
    template: PromptTemplate,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl<G> fmt::Debug for Classifier<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Classifier")
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("pacer", &self.pacer)
            .finish_non_exhaustive()
    }
}

impl<G: ChatGateway> Classifier<G> {
    pub fn new(gateway: G, config: &PipelineConfig) -> Self {
        Self {
            gateway,
            pacer: Pacer::new(&config.pacing),
            template: PromptTemplate::resolve(config.prompt, config.prompt_template.as_deref()),
            model: config.gateway.model.clone(),
            max_tokens: config.gateway.max_tokens,
            temperature: config.gateway.temperature,
        }
    }

    /// Classify one candidate. Any failure is logged and replaced by the
    /// default verdict with `failed` set.
    pub async fn classify(&self, candidate: &ArticleCandidate) -> Classified {
        match self.try_classify(candidate).await {
            Ok(verdict) => Classified {
                verdict,
                failed: false,
            },
            Err(e) => {
                report_failure(&e, &candidate.url);
                Classified {
                    verdict: ClassificationResult::default(),
                    failed: true,
                }
            }
        }
    }

    /// A 429 puts every caller of the shared pacer on hold before returning.
    #[instrument(level = "info", skip_all, fields(url = %candidate.url))]
    async fn try_classify(
        &self,
        candidate: &ArticleCandidate,
    ) -> Result<ClassificationResult, ClassifyError> {
        let request = ChatRequest::user(
            &self.model,
            self.template.render(candidate),
            self.max_tokens,
            self.temperature,
        );

        self.pacer.acquire().await;
        let t0 = Instant::now();
        let reply = self.gateway.complete(&request).await?;
        debug!(
            status = reply.status,
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Classification reply received"
        );

        if reply.status == 429 {
            self.pacer.penalize().await;
        }
        let body = check_status(reply)?;
        parse::parse_response(&body)
    }
}

/// Map a non-200 reply onto its error; pass a 200 body through.
fn check_status(reply: GatewayReply) -> Result<String, ClassifyError> {
    let GatewayReply { status, body } = reply;
    match status {
        200 => Ok(body),
        401 => Err(ClassifyError::Unauthorized { body }),
        403 => Err(ClassifyError::Forbidden { body }),
        429 => Err(ClassifyError::RateLimited { body }),
        _ => Err(ClassifyError::Status { status, body }),
    }
}

/// Log a classification failure with guidance matching its cause.
fn report_failure(err: &ClassifyError, url: &str) {
    match err {
        ClassifyError::Unauthorized { body } => error!(
            %url,
            body = %truncate_for_log(body, LOG_BODY_CHARS),
            "Gateway rejected credentials; check GATEWAY_API_KEY and that the model name is allowed"
        ),
        ClassifyError::Forbidden { body } => error!(
            %url,
            body = %truncate_for_log(body, LOG_BODY_CHARS),
            "Gateway refused access; the key may be expired or lack access to this model"
        ),
        ClassifyError::RateLimited { body } => warn!(
            %url,
            body = %truncate_for_log(body, LOG_BODY_CHARS),
            "Gateway rate limit hit; pausing calls and using default verdict"
        ),
        ClassifyError::Status { status, body } => warn!(
            %url,
            status,
            body = %truncate_for_log(body, LOG_BODY_CHARS),
            "Gateway returned an error status; using default verdict"
        ),
        other => warn!(%url, error = %other, "Classification failed; using default verdict"),
    }
}
