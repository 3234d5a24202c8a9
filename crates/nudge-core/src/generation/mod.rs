//! Natural-language rule generation.
//!
//! The generator asks an [`Llm`] for a rule document, pulls the JSON object
//! out of whatever the model wrapped it in, and runs the candidate through
//! the same validation a hand-written rule gets. Candidates are never
//! repaired: a document that does not parse or does not validate is
//! rejected as a whole.

mod prompt;

pub use prompt::schema_prompt;

use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{ErrorCode, NudgeError, NudgeResult};
use crate::rule::{RuleValidator, TriggerRule, Violation};
use crate::traits::{GenerationOptions, Llm, Message};

/// Default upper bound on one generation round trip.
pub const DEFAULT_GENERATION_TIMEOUT: Duration = Duration::from_secs(60);

static CODE_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"```[A-Za-z0-9]*\s*([\s\S]*?)\s*```").expect("code fence pattern is valid")
});

static THINK_TAGS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<think>.*?</think>").expect("think tag pattern is valid"));

/// A validated candidate together with its advisory findings.
#[derive(Debug, Clone)]
pub struct GeneratedRule {
    pub rule: TriggerRule,
    pub warnings: Vec<Violation>,
    /// Model output the rule was parsed from.
    pub raw: String,
}

/// Turns a natural-language request into a validated rule candidate.
pub struct RuleGenerator {
    llm: Arc<dyn Llm>,
    validator: RuleValidator,
    options: Option<GenerationOptions>,
    timeout: Duration,
}

impl RuleGenerator {
    pub fn new(llm: Arc<dyn Llm>) -> Self {
        Self {
            llm,
            validator: RuleValidator::default(),
            options: None,
            timeout: DEFAULT_GENERATION_TIMEOUT,
        }
    }

    pub fn with_validator(mut self, validator: RuleValidator) -> Self {
        self.validator = validator;
        self
    }

    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = Some(options);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Generate one rule from a natural-language prompt.
    pub async fn generate(&self, prompt: &str) -> NudgeResult<GeneratedRule> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(NudgeError::validation("generation prompt is empty"));
        }

        let messages = vec![Message::system(schema_prompt()), Message::user(prompt)];
        debug!(model = %self.llm.model_name(), "Requesting rule generation");

        let response = tokio::time::timeout(self.timeout, self.llm.generate(&messages, self.options.clone()))
            .await
            .map_err(|_| {
                warn!(timeout_secs = self.timeout.as_secs(), "Rule generation timed out");
                NudgeError::Generation {
                    message: format!("no response within {}s", self.timeout.as_secs()),
                    code: ErrorCode::GenTimeout,
                    violations: Vec::new(),
                    raw: None,
                }
            })??;

        let raw = response.content_or_empty().to_string();
        let rule = parse_candidate(&raw).map_err(|e| {
            warn!(error = %e, "Model returned an unusable rule document");
            e
        })?;

        let report = self.validator.validate(&rule);
        if !report.is_valid() {
            warn!(rule_id = %rule.id, errors = report.errors.len(), "Generated rule failed validation");
            return Err(NudgeError::generation_invalid(
                format!("generated rule '{}' failed validation", rule.id),
                report.errors,
            ));
        }

        info!(rule_id = %rule.id, warnings = report.warnings.len(), "Generated rule");
        Ok(GeneratedRule {
            rule,
            warnings: report.warnings,
            raw,
        })
    }
}

/// Strip a markdown fence, then cut out the outermost JSON object.
pub fn extract_json_object(content: &str) -> Option<&str> {
    let content = content.trim();
    let inner = CODE_FENCE
        .captures(content)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or(content);

    let start = inner.find('{')?;
    let end = inner.rfind('}')?;
    (start < end).then(|| &inner[start..=end])
}

/// Sections a generated document must spell out. Defaults that are fine for
/// hand-written rules (an empty AND root always matches) are not for model
/// output.
const REQUIRED_SECTIONS: [&str; 3] = ["id", "conditions", "actions"];

/// Parse model output into a rule document without validating it.
///
/// Accepts the bare document or a `{"rule": {...}}` envelope. The id,
/// conditions and actions must be present.
pub fn parse_candidate(content: &str) -> NudgeResult<TriggerRule> {
    let cleaned = THINK_TAGS.replace_all(content, "");
    let json = extract_json_object(&cleaned).ok_or_else(|| {
        NudgeError::generation("response contains no JSON object", Some(content.to_string()))
    })?;

    let mut value: Value = serde_json::from_str(json).map_err(|e| {
        NudgeError::generation(format!("invalid JSON from model: {}", e), Some(content.to_string()))
    })?;
    if let Some(inner) = value.get_mut("rule").filter(|v| v.is_object()).map(Value::take) {
        if value.as_object().map_or(false, |o| o.len() == 1) {
            value = inner;
        } else if let Some(obj) = value.as_object_mut() {
            // not an envelope, put it back
            obj.insert("rule".to_string(), inner);
        }
    }

    let missing: Vec<&str> = match value.as_object() {
        Some(obj) => REQUIRED_SECTIONS
            .into_iter()
            .filter(|key| obj.get(*key).map_or(true, Value::is_null))
            .collect(),
        None => REQUIRED_SECTIONS.to_vec(),
    };
    if !missing.is_empty() {
        return Err(NudgeError::generation(
            format!("rule document is missing {}", missing.join(", ")),
            Some(content.to_string()),
        ));
    }

    serde_json::from_value(value).map_err(|e| {
        NudgeError::generation(
            format!("JSON does not describe a rule: {}", e),
            Some(content.to_string()),
        )
    })
}
