use std::time::Duration;

use migralint_core::{ApiShape, LintError, Provider, ReviewConfig};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// A message in a chat conversation with the reviewer.
///
/// # Examples
///
/// ```
/// use migralint_review::llm::{ChatMessage, Role};
///
/// let msg = ChatMessage {
///     role: Role::User,
///     content: "Check these migrations".into(),
/// };
/// assert!(matches!(msg.role, Role::User));
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    /// Role of the message sender.
    pub role: Role,
    /// Text content of the message.
    pub content: String,
}

/// Role in the chat conversation.
///
/// # Examples
///
/// ```
/// use migralint_review::llm::Role;
///
/// let role = Role::System;
/// assert_eq!(serde_json::to_string(&role).unwrap(), "\"system\"");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System-level instructions.
    System,
    /// User input.
    User,
    /// Assistant response.
    Assistant,
}

/// Sends review prompts to a [`Provider`] and returns the reply text.
///
/// One request per call, no retries. Requests time out after the configured
/// number of seconds.
///
/// # Examples
///
/// ```
/// use migralint_core::ReviewConfig;
/// use migralint_review::llm::ReviewClient;
///
/// let client = ReviewClient::new(&ReviewConfig::default(), false).unwrap();
/// ```
pub struct ReviewClient {
    client: reqwest::Client,
    base_url: Option<String>,
    debug_thinking: bool,
}

impl ReviewClient {
    /// Create a client from review settings.
    ///
    /// # Errors
    ///
    /// Returns [`LintError::Http`] if the HTTP client cannot be built.
    pub fn new(config: &ReviewConfig, debug_thinking: bool) -> Result<Self, LintError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LintError::Http(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            debug_thinking,
        })
    }

    /// Full endpoint URL for `provider`, honoring a base URL override.
    pub fn endpoint(&self, provider: Provider) -> String {
        let base = self
            .base_url
            .as_deref()
            .unwrap_or_else(|| provider.base_url())
            .trim_end_matches('/');
        format!("{base}{}", provider.path())
    }

    /// Ask `provider` to review the prompts and return its reply.
    ///
    /// # Errors
    ///
    /// Returns [`LintError::Http`] on transport failure,
    /// [`LintError::RemoteService`] on a non-success status, and
    /// [`LintError::MalformedResponse`] when the reply text is missing.
    pub async fn review(
        &self,
        provider: Provider,
        system_prompt: &str,
        user_prompt: &str,
        credential: &str,
    ) -> Result<String, LintError> {
        let url = self.endpoint(provider);
        let body = request_body(provider, system_prompt, user_prompt);
        info!(provider = provider.key(), model = provider.model(), "requesting review");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {credential}"))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| LintError::Http(format!("{} request failed: {e}", provider.display_name())))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = match response.text().await {
                Ok(text) => text,
                Err(e) => format!("<failed to read response body: {e}>"),
            };
            return Err(LintError::RemoteService {
                service: provider.display_name().into(),
                status: status.as_u16(),
                body: body_text,
            });
        }

        let response_body: serde_json::Value =
            response
                .json()
                .await
                .map_err(|e| LintError::MalformedResponse {
                    service: provider.display_name().into(),
                    detail: format!("response is not JSON: {e}"),
                })?;

        let reply = extract_reply(provider, &response_body)?;
        match reply.trace_to_log(self.debug_thinking) {
            Some(thinking) => info!(provider = provider.key(), "reasoning trace:\n{thinking}"),
            None => {
                if let Some(thinking) = &reply.thinking {
                    debug!(chars = thinking.len(), "reasoning trace omitted");
                }
            }
        }
        Ok(reply.text)
    }
}

/// Reply text plus the optional reasoning trace some providers return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// The assistant's answer.
    pub text: String,
    /// Reasoning trace, when the provider sends one.
    pub thinking: Option<String>,
}

impl Reply {
    /// The reasoning trace to log, if any. Traces are only logged when
    /// `debug_thinking` is on.
    ///
    /// # Examples
    ///
    /// ```
    /// use migralint_review::llm::Reply;
    ///
    /// let reply = Reply {
    ///     text: "OK".into(),
    ///     thinking: Some("columns match".into()),
    /// };
    /// assert_eq!(reply.trace_to_log(true), Some("columns match"));
    /// assert_eq!(reply.trace_to_log(false), None);
    /// ```
    pub fn trace_to_log(&self, debug_thinking: bool) -> Option<&str> {
        if debug_thinking {
            self.thinking.as_deref()
        } else {
            None
        }
    }
}

/// Build the JSON request body for `provider`.
///
/// Chat providers get role-tagged messages; the legacy completion provider
/// gets one prompt string with the system text first.
///
/// # Examples
///
/// ```
/// use migralint_core::Provider;
/// use migralint_review::llm::request_body;
///
/// let body = request_body(Provider::OpenAi, "sys", "usr");
/// assert_eq!(body["messages"][0]["role"], "system");
///
/// let body = request_body(Provider::OpenAiLegacy, "sys", "usr");
/// assert_eq!(body["prompt"], "sys\n\nusr");
/// ```
pub fn request_body(provider: Provider, system_prompt: &str, user_prompt: &str) -> serde_json::Value {
    match provider.shape() {
        ApiShape::Chat => {
            let messages = vec![
                ChatMessage {
                    role: Role::System,
                    content: system_prompt.to_string(),
                },
                ChatMessage {
                    role: Role::User,
                    content: user_prompt.to_string(),
                },
            ];
            serde_json::json!({
                "model": provider.model(),
                "messages": messages,
                "temperature": 0,
            })
        }
        ApiShape::Completion => serde_json::json!({
            "model": provider.model(),
            "prompt": format!("{system_prompt}\n\n{user_prompt}"),
            "temperature": 0,
            "max_tokens": 1024,
        }),
    }
}

/// Pull the reply text out of a provider response.
///
/// # Errors
///
/// Returns [`LintError::MalformedResponse`] if the text field is absent or
/// blank.
///
/// # Examples
///
/// ```
/// use migralint_core::Provider;
/// use migralint_review::llm::extract_reply;
///
/// let body = serde_json::json!({"choices": [{"message": {"content": "OK"}}]});
/// assert_eq!(extract_reply(Provider::Gemini, &body).unwrap().text, "OK");
/// ```
pub fn extract_reply(provider: Provider, body: &serde_json::Value) -> Result<Reply, LintError> {
    let choice = body.get("choices").and_then(|c| c.get(0));
    let (text, thinking) = match provider.shape() {
        ApiShape::Chat => {
            let message = choice.and_then(|c| c.get("message"));
            (
                message.and_then(|m| m.get("content")).and_then(|c| c.as_str()),
                message
                    .and_then(|m| m.get("reasoning_content"))
                    .and_then(|r| r.as_str()),
            )
        }
        ApiShape::Completion => (choice.and_then(|c| c.get("text")).and_then(|t| t.as_str()), None),
    };

    let text = text
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| LintError::MalformedResponse {
            service: provider.display_name().into(),
            detail: format!("no reply text in response: {body}"),
        })?;

    Ok(Reply {
        text: text.to_string(),
        thinking: thinking
            .filter(|t| !t.trim().is_empty())
            .map(str::to_string),
    })
}
