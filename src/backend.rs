use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Shown in place of an answer whenever the backend cannot be reached,
/// returns a non-2xx status, or sends back something unparseable.
pub const FALLBACK_REPLY: &str =
    "I'm having trouble connecting to the research database. Please try again shortly.";

#[derive(Serialize)]
struct QuestionRequest<'a> {
    question: &'a str,
}

#[derive(Deserialize)]
struct AnswerResponse {
    response: String,
}

/// Client for the research site's RAG backend.
#[derive(Clone)]
pub struct AssistantClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl AssistantClient {
    pub fn new(base_url: &str, api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send one question and wait for the answer. Every failure mode
    /// (connection error, non-2xx status, malformed body) comes back as
    /// a plain error; callers do not distinguish between them.
    pub async fn ask(&self, question: &str) -> Result<String> {
        let url = format!("{}/process_input", self.base_url);

        let mut request = self.client.post(&url).json(&QuestionRequest { question });
        if let Some(key) = &self.api_key {
            request = request.header("X-API-KEY", key);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "backend request failed with status {}",
                response.status()
            ));
        }

        let answer: AnswerResponse = response.json().await?;
        Ok(answer.response)
    }
}
