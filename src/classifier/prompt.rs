//! Prompt templates for the classification gateway.
//!
//! Templates use `{title}`, `{url}` and `{snippet}` placeholders. Rendering is
//! plain substitution, so literal JSON braces in a template need no escaping.

use crate::config::PromptStyle;
use crate::models::ArticleCandidate;

const ES_TEMPLATE: &str = r#"You are a B2B market intelligence analyst covering Employee Service (ES).
ES spans ITSM, ITOM, ESM, HR service management, employee experience and workflow automation.

ARTICLE TITLE: {title}
ARTICLE URL: {url}
SNIPPET: {snippet}

1) Summarize the article in 2 to 3 sentences focused on ES: what is changing and why it matters to ITSM, ESM, HRSM or EX buyers.

2) Assign an engagement level:
   HIGH when analyst evaluations (Magic Quadrants, Waves, MarketScapes, buyer guides) cover ITSM, ESM, HRSM, EX or AI for ITSM;
        when a large ES deployment is announced (10k+ employees, >$10M ACV, multi-region);
        when M&A or investment touches a core ES vendor (ServiceNow, Atlassian, BMC, Moveworks, Aisera, Freshworks);
        when agentic AI, automation or copilot launches shift ES roadmaps;
        or when a deep ecosystem partnership is announced.
   MEDIUM for smaller ES partnerships or acquisitions, incremental AI or analytics features, and earnings with clear ES impact.
   LOW for marketing content, minor updates, or stories with little ES angle.

3) Write a Slack hook of at most 12 words that makes a go-to-market team want to click.

4) Set "is_relevant" to true only if the article is primarily about AI in customer service or contact centers.

Return ONLY a JSON object with exactly these keys:
{
  "summary": "...",
  "engagement": "HIGH|MEDIUM|LOW",
  "hook": "...",
  "is_relevant": true|false
}
"#;

const CX_AI_TEMPLATE: &str = r#"You are a market intelligence analyst covering AI in customer service and contact center technology.

TITLE: {title}
URL: {url}
SNIPPET: {snippet}

Ecosystem of interest:
- CS platforms: Zendesk, Salesforce, Microsoft, HubSpot, Freshworks, ServiceNow, Intercom, Gorgias
- CCaaS: Genesys, NICE, Five9, RingCentral, 8x8
- CPaaS: Twilio, Vonage, Infobip
- AI agents: Sierra, Ada, Crescendo, Decagon, Forethought, PolyAI, ASAPP
- Conversational AI: Kore.ai, Yellow.ai, Cognigy, Capacity, Replicant, Parloa
- Agent assist: Cresta, Uniphore, Observe.AI, Gong, Assembled, Calabrio
- AI infrastructure: OpenAI, AWS, Microsoft Azure, Google Cloud, Databricks, Snowflake

1. Summarize the article in 3 sentences focused on AI in customer service.

2. Assign an engagement level:
   HIGH for M&A above $100M involving ecosystem vendors, platform and AI infrastructure partnerships,
        launches with autonomous resolution, analyst reports on AI in CS, large AI deployments
        (>5k seats or >$10M ACV), hyperscaler announcements aimed at CS, or agentic orchestration breakthroughs.
   MEDIUM for smaller AI partnerships, incremental chatbot or copilot features, earnings with AI CS impact,
        or infrastructure updates relevant to CS.
   LOW for general AI news without a CS focus, marketing content, or minor vendor updates.

3. Write a 12-word Slack hook for a CS and CCaaS leadership team.

4. Set "is_relevant" to true ONLY if the article is primarily about AI in a customer service or contact center context.
   Set it to false when AI is mentioned without a CS focus, or when it is CS news without an AI focus.

Respond ONLY with valid JSON in this exact shape:
{
  "summary": "...",
  "engagement": "HIGH|MEDIUM|LOW",
  "hook": "...",
  "is_relevant": true|false
}
"#;

const CCAAS_TEMPLATE: &str = r#"You are a contact center and CCaaS market analyst.

TITLE: {title}
URL: {url}
SNIPPET: {snippet}

1. Summarize the article in 3 sentences.

2. Assign an engagement level:
   HIGH for CCaaS analyst reports or recognition, large CCaaS wins (>5k seats or >$10M ACV),
        agentic orchestration or voice AI breakthroughs, hyperscaler shifts, M&A above $500M,
        strategic ecosystem partnerships, or market forecasts that reset expectations.
   MEDIUM for CCaaS M&A below $500M, AI features without a clear strategic shift,
        telco or CRM integrations, or earnings with AI or CCaaS relevance.
   LOW for small vendor updates, stories with no competitive angle, or marketing content.

3. Write a 12-word Slack hook that is punchy and specific.

Respond ONLY with valid JSON in this exact shape:
{
  "summary": "...",
  "engagement": "HIGH|MEDIUM|LOW",
  "hook": "..."
}
"#;

/// A prompt template. Replies are read for `is_relevant` whichever template is used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    pub fn builtin(style: PromptStyle) -> Self {
        let template = match style {
            PromptStyle::Es => ES_TEMPLATE,
            PromptStyle::CxAi => CX_AI_TEMPLATE,
            PromptStyle::Ccaas => CCAAS_TEMPLATE,
        };
        Self::custom(template)
    }

    pub fn custom(template: &str) -> Self {
        Self {
            template: template.to_string(),
        }
    }

    /// A configured override wins over the built-in style.
    pub fn resolve(style: PromptStyle, custom: Option<&str>) -> Self {
        match custom {
            Some(template) if !template.trim().is_empty() => Self::custom(template),
            _ => Self::builtin(style),
        }
    }

    pub fn render(&self, candidate: &ArticleCandidate) -> String {
        self.template
            .replace("{title}", &candidate.title)
            .replace("{url}", &candidate.url)
            .replace("{snippet}", &candidate.snippet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate() -> ArticleCandidate {
        ArticleCandidate {
            source: "CX Today".to_string(),
            title: "Genesys adds agentic AI to Cloud CX".to_string(),
            url: "https://www.cxtoday.com/contact-center/genesys-agentic-ai".to_string(),
            snippet: "Genesys announced new autonomous agents.".to_string(),
            published_at: None,
        }
    }

    #[test]
    fn test_builtin_templates_render_article_fields() {
        for style in [PromptStyle::Es, PromptStyle::CxAi, PromptStyle::Ccaas] {
            let prompt = PromptTemplate::builtin(style).render(&candidate());
            assert!(prompt.contains("TITLE: Genesys adds agentic AI to Cloud CX"));
            assert!(prompt.contains("URL: https://www.cxtoday.com/contact-center/genesys-agentic-ai"));
            assert!(prompt.contains("SNIPPET: Genesys announced new autonomous agents."));
            assert!(prompt.contains("\"engagement\": \"HIGH|MEDIUM|LOW\""));
            assert!(!prompt.contains("{title}"));
        }
    }

    #[test]
    fn test_relevance_flag_only_requested_where_used() {
        let c = candidate();
        assert!(PromptTemplate::builtin(PromptStyle::CxAi).render(&c).contains("\"is_relevant\""));
        assert!(PromptTemplate::builtin(PromptStyle::Es).render(&c).contains("\"is_relevant\""));
        assert!(!PromptTemplate::builtin(PromptStyle::Ccaas).render(&c).contains("is_relevant"));
    }

    #[test]
    fn test_custom_template_overrides_style() {
        let t = PromptTemplate::resolve(PromptStyle::Es, Some("Classify {title} at {url}: {snippet}"));
        assert_eq!(
            t.render(&candidate()),
            "Classify Genesys adds agentic AI to Cloud CX at https://www.cxtoday.com/contact-center/genesys-agentic-ai: Genesys announced new autonomous agents."
        );
        assert_ne!(t, PromptTemplate::builtin(PromptStyle::Es));
    }

    #[test]
    fn test_blank_custom_template_falls_back() {
        assert_eq!(
            PromptTemplate::resolve(PromptStyle::Ccaas, Some("  ")),
            PromptTemplate::builtin(PromptStyle::Ccaas)
        );
        assert_eq!(
            PromptTemplate::resolve(PromptStyle::Ccaas, None),
            PromptTemplate::builtin(PromptStyle::Ccaas)
        );
    }
}
