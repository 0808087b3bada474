use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::OpenAiConfig;

pub const MISSING_KEY_REPLY: &str =
    "OPENAI_API_KEY не задан. Добавь переменную OPENAI_API_KEY и перезапусти бота.";
pub const EMPTY_REPLY: &str = "Пустой ответ модели.";

#[derive(Serialize)]
struct ResponsesRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct ResponsesBody {
    #[serde(default)]
    output_text: Option<String>,
    #[serde(default)]
    output: Vec<OutputItem>,
}

#[derive(Deserialize)]
struct OutputItem {
    #[serde(default)]
    content: Vec<ContentPart>,
}

#[derive(Deserialize)]
struct ContentPart {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

impl ResponsesBody {
    fn text(&self) -> String {
        if let Some(text) = self.output_text.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            return text.to_string();
        }
        self.output
            .iter()
            .flat_map(|item| item.content.iter())
            .filter(|part| part.kind == "output_text")
            .filter_map(|part| part.text.as_deref())
            .collect::<Vec<_>>()
            .join("")
            .trim()
            .to_string()
    }
}

/// Free-text replies through the OpenAI responses API. Always yields text for the chat.
#[derive(Clone)]
pub struct Assistant {
    http: reqwest::Client,
    api_key: Option<String>,
    model: String,
    api_url: String,
}

impl Assistant {
    pub fn new(http: reqwest::Client, config: &OpenAiConfig) -> Self {
        Self {
            http,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            api_url: config.api_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }

    pub async fn reply(&self, user_text: &str) -> String {
        let Some(api_key) = &self.api_key else {
            return MISSING_KEY_REPLY.to_string();
        };

        debug!("Asking {} ({} chars)", self.model, user_text.chars().count());

        let result = self
            .http
            .post(format!("{}/responses", self.api_url))
            .bearer_auth(api_key)
            .json(&ResponsesRequest {
                model: &self.model,
                input: user_text,
            })
            .send()
            .await;

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                warn!("OpenAI request failed: {}", e);
                return format!("Ошибка OpenAI: {}", e);
            }
        };

        let status = response.status();
        if status.as_u16() >= 400 {
            let body = response.text().await.unwrap_or_default();
            warn!("OpenAI returned {}: {}", status, body);
            return format!("Ошибка OpenAI: {} {}", status.as_u16(), body);
        }

        match response.json::<ResponsesBody>().await {
            Ok(body) => {
                let text = body.text();
                if text.is_empty() {
                    EMPTY_REPLY.to_string()
                } else {
                    text
                }
            }
            Err(e) => {
                warn!("Failed to parse OpenAI response: {}", e);
                EMPTY_REPLY.to_string()
            }
        }
    }
}
