//! AI investment advisor chat
//!
//! Pass-through to an OpenAI-compatible chat completion endpoint. Unrelated to
//! the wallet: it only shares the notifier for surfacing failures.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::config::Web3Config;
use crate::error::{Result, Web3Error};
use crate::notify::{Notification, Notifier};

pub const ADVISOR_MODEL: &str = "llama3-8b-8192";
const TEMPERATURE: f64 = 0.7;
const MAX_TOKENS: u32 = 800;
/// Previous messages sent along with each question
const CONTEXT_MESSAGES: usize = 4;

const SYSTEM_PROMPT: &str = "You are an expert real estate investment advisor named EquiXtate Advisor \
specializing in tokenized real estate and blockchain-based property investments.

Provide detailed, accurate, and specific advice about:
- Real estate tokenization mechanisms and benefits
- Fractional ownership structures in real estate
- Blockchain applications in property markets
- Token economics for real estate assets
- Regulatory considerations for tokenized properties
- Investment strategies specific to digital real estate assets
- Market trend analysis with data-driven insights
- Risk assessment for different tokenization models

Use concrete examples, specific numbers when appropriate, and reference real-world applications. \
Avoid generic advice. Your responses should be informative but concise (150-200 words maximum).";

const GREETING: &str = "Hello! I'm your EquiXtate AI financial advisor. \
How can I help you with real estate investing today?";

const MISSING_KEY_REPLY: &str = "I'm unable to provide real AI assistance because the GROQ API key \
is missing. Please check the logs for instructions on how to add your API key.";

const ERROR_REPLY: &str = "I encountered an error while processing your request. This might be due \
to an issue with the API connection. Please try again later.";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub content: String,
    pub is_user: bool,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    fn user(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_user: true,
            timestamp: Utc::now(),
        }
    }

    fn assistant(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_user: false,
            timestamp: Utc::now(),
        }
    }

    fn role(&self) -> &'static str {
        if self.is_user {
            "user"
        } else {
            "assistant"
        }
    }
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: String,
}

pub struct AdvisorClient {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
    messages: Mutex<Vec<ChatMessage>>,
    notifier: Arc<dyn Notifier>,
}

impl AdvisorClient {
    pub fn new(url: impl Into<String>, api_key: Option<String>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            api_key,
            messages: Mutex::new(vec![ChatMessage::assistant(GREETING)]),
            notifier,
        }
    }

    pub fn from_config(config: &Web3Config, notifier: Arc<dyn Notifier>) -> Self {
        Self::new(config.advisor_url.clone(), config.groq_api_key.clone(), notifier)
    }

    /// Conversation so far, starting with the greeting
    pub fn messages(&self) -> Vec<ChatMessage> {
        self.lock().clone()
    }

    /// Ask a question and record both sides of the exchange
    ///
    /// Always yields a reply: without an API key, or when the request fails,
    /// the reply explains the problem and a destructive notification is sent.
    /// Blank questions are ignored and return `None`.
    pub async fn ask(&self, question: &str) -> Option<String> {
        if question.trim().is_empty() {
            return None;
        }

        let context: Vec<ChatMessage> = {
            let mut messages = self.lock();
            let start = messages.len().saturating_sub(CONTEXT_MESSAGES);
            let context = messages[start..].to_vec();
            messages.push(ChatMessage::user(question));
            context
        };

        let reply = match &self.api_key {
            None => {
                log::error!("Missing GROQ API key. Set GROQ_API_KEY to enable the AI advisor");
                self.notifier.notify(Notification::error(
                    "API Key Missing",
                    "Please add your GROQ API key in the .env file to access the AI advisor.",
                ));
                MISSING_KEY_REPLY.to_string()
            }
            Some(key) => match self.complete(key, &context, question).await {
                Ok(answer) => answer,
                Err(e) => {
                    log::error!("Error getting AI response: {}", e);
                    self.notifier.notify(Notification::error(
                        "Error",
                        e.user_message(
                            "Failed to get a response from the AI advisor. Please try again.",
                        ),
                    ));
                    ERROR_REPLY.to_string()
                }
            },
        };

        self.lock().push(ChatMessage::assistant(reply.clone()));
        Some(reply)
    }

    async fn complete(&self, key: &str, context: &[ChatMessage], question: &str) -> Result<String> {
        let mut messages = vec![json!({"role": "system", "content": SYSTEM_PROMPT})];
        messages.extend(
            context
                .iter()
                .map(|m| json!({"role": m.role(), "content": m.content})),
        );
        messages.push(json!({"role": "user", "content": question}));

        let body = json!({
            "model": ADVISOR_MODEL,
            "messages": messages,
            "temperature": TEMPERATURE,
            "max_tokens": MAX_TOKENS,
        });

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .json::<serde_json::Value>()
                .await
                .ok()
                .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
                .unwrap_or_else(|| "Unknown error".to_string());
            return Err(Web3Error::Advisor(format!(
                "API request failed with status {}: {}",
                status.as_u16(),
                detail
            )));
        }

        let parsed: CompletionResponse = response
            .json()
            .await
            .map_err(|_| Web3Error::Advisor("Failed to parse the API response".to_string()))?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| Web3Error::Advisor("Failed to parse the API response".to_string()))
    }

    fn lock(&self) -> MutexGuard<'_, Vec<ChatMessage>> {
        self.messages.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
