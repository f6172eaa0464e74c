//! Drafting task descriptions with a hosted language model.
//!
//! `DraftingService` owns the prompt and the parsing of the answer; the network
//! call sits behind `CompletionProvider` so tests can substitute a canned reply.

use async_trait::async_trait;
use log::{error, info};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use crate::error::AppError;
use crate::models::TaskPriority;

/// Sends a single-message prompt and returns the raw JSON-object completion, if any.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete_json(&self, prompt: &str) -> Result<Option<String>, AppError>;
}

/// A drafted description, as returned to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftedDescription {
    pub description: String,
    pub priority: TaskPriority,
}

#[derive(Deserialize)]
struct RawDraft {
    description: String,
    priority: String,
}

fn generation_error(reason: impl std::fmt::Display) -> AppError {
    AppError::GenerationError(format!("Error generating description: {}", reason))
}

pub fn build_prompt(brief: &str) -> String {
    format!(
        r#"Based on this brief: {brief}

1. Generate a detailed task description that:
   - Is clear and concise
   - Includes key objectives
   - Mentions important considerations
   - Is professional in tone

2. Suggest a priority level (ONLY respond with exactly one of: "Low", "Medium", "High")
   Consider:
   - Task urgency
   - Business impact
   - Complexity

Format your response as JSON with two fields:
- description: your detailed description
- priority: one of ["Low", "Medium", "High"]"#
    )
}

/// Parses the model's JSON answer, validating the priority against the enum.
pub fn parse_draft(content: &str) -> Result<DraftedDescription, AppError> {
    let raw: RawDraft = serde_json::from_str(content).map_err(generation_error)?;
    let priority = TaskPriority::parse_loose(&raw.priority)
        .ok_or_else(|| generation_error(format!("unsupported priority '{}'", raw.priority)))?;
    Ok(DraftedDescription {
        description: raw.description.trim().to_string(),
        priority,
    })
}

#[derive(Clone)]
pub struct DraftingService {
    provider: Arc<dyn CompletionProvider>,
}

impl DraftingService {
    pub fn new(provider: Arc<dyn CompletionProvider>) -> Self {
        Self { provider }
    }

    /// Turns a short brief into a description and a suggested priority.
    ///
    /// Provider failures are reported once; there is no retry.
    pub async fn draft(&self, brief: &str) -> Result<DraftedDescription, AppError> {
        let brief = brief.trim();
        if brief.is_empty() {
            return Err(AppError::ValidationError("Brief must not be empty".into()));
        }

        let content = self
            .provider
            .complete_json(&build_prompt(brief))
            .await
            .map_err(|e| {
                error!("description provider failed: {}", e);
                match e {
                    AppError::GenerationError(_) => e,
                    other => generation_error(other),
                }
            })?
            .ok_or_else(|| generation_error("No content received from the model"))?;

        let draft = parse_draft(&content)?;
        info!("drafted description with priority {}", draft.priority.as_str());
        Ok(draft)
    }
}

/// OpenAI chat-completions client.
pub struct OpenAiProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

#[derive(Deserialize)]
struct ChatCompletion {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

impl OpenAiProvider {
    pub fn new(
        api_key: String,
        base_url: String,
        model: String,
        timeout: Duration,
    ) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::InternalServerError(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    async fn complete_json(&self, prompt: &str) -> Result<Option<String>, AppError> {
        let body = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "response_format": { "type": "json_object" },
        });

        let completion: ChatCompletion = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Canned(Result<Option<String>, String>);

    #[async_trait]
    impl CompletionProvider for Canned {
        async fn complete_json(&self, prompt: &str) -> Result<Option<String>, AppError> {
            assert!(prompt.contains("Based on this brief:"));
            self.0.clone().map_err(AppError::GenerationError)
        }
    }

    fn service(reply: Result<Option<&str>, &str>) -> DraftingService {
        let reply = reply
            .map(|content| content.map(str::to_string))
            .map_err(str::to_string);
        DraftingService::new(Arc::new(Canned(reply)))
    }

    #[test]
    fn test_prompt_embeds_brief() {
        let prompt = build_prompt("migrate the billing database");
        assert!(prompt.contains("Based on this brief: migrate the billing database"));
        assert!(prompt.contains(r#"["Low", "Medium", "High"]"#));
    }

    #[actix_rt::test]
    async fn test_draft_parses_both_fields() {
        let drafter = service(Ok(Some(
            r#"{"description": "  Move billing to Postgres.  ", "priority": "high"}"#,
        )));
        let draft = drafter.draft("migrate billing").await.unwrap();
        assert_eq!(draft.description, "Move billing to Postgres.");
        assert_eq!(draft.priority, TaskPriority::High);
    }

    #[actix_rt::test]
    async fn test_draft_failures_are_generation_errors() {
        let cases = [
            service(Err("connection refused")),
            service(Ok(None)),
            service(Ok(Some("not json"))),
            service(Ok(Some(r#"{"description": "only one field"}"#))),
            service(Ok(Some(r#"{"description": "d", "priority": "Critical"}"#))),
        ];
        for drafter in cases {
            let result = drafter.draft("anything").await;
            assert!(
                matches!(result, Err(AppError::GenerationError(_))),
                "unexpected result: {:?}",
                result
            );
        }
    }

    #[actix_rt::test]
    async fn test_empty_brief_is_rejected() {
        let drafter = service(Ok(Some("{}")));
        assert!(matches!(
            drafter.draft("   ").await,
            Err(AppError::ValidationError(_))
        ));
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let provider = OpenAiProvider::new(
            "key".into(),
            "https://api.openai.com/v1/".into(),
            "gpt-3.5-turbo".into(),
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(provider.endpoint(), "https://api.openai.com/v1/chat/completions");
    }
}
