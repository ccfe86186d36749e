use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{json, Value};
use tracing::debug;

use super::types::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage, ErrorResponse};
use super::{BottleResearcher, ResearchQuery};
use crate::config::ResearchConfig;

const SYSTEM_PROMPT: &str = "You are a spirits expert. When given a bottle name, provide detailed \
information in JSON format with the following fields: tasting_notes, history, \
production_process, price_range (estimated, USD), rarity (common, uncommon, rare, very rare), \
recommended_glassware, serving_suggestions, awards.";

pub struct OpenAiResearcher {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiResearcher {
    pub fn new(cfg: &ResearchConfig, api_key: String) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .context("build research http client")?;
        Ok(Self {
            client,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            api_key,
            model: cfg.model.clone(),
        })
    }
}

#[async_trait]
impl BottleResearcher for OpenAiResearcher {
    async fn research(&self, query: &ResearchQuery) -> anyhow::Result<Option<Value>> {
        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".into(),
                    content: SYSTEM_PROMPT.into(),
                },
                ChatMessage {
                    role: "user".into(),
                    content: format!(
                        "Please provide detailed information about: {}",
                        query.search_text()
                    ),
                },
            ],
            temperature: Some(0.7),
            max_tokens: Some(1000),
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .context("research request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let message = response
                .json::<ErrorResponse>()
                .await
                .map(|e| e.error.message)
                .unwrap_or_else(|_| "unknown error".into());
            anyhow::bail!("research endpoint returned {status}: {message}");
        }

        let body: ChatCompletionResponse = response
            .json()
            .await
            .context("parse research response")?;
        let content = body
            .choices
            .first()
            .map(|c| c.message.content.clone())
            .unwrap_or_default();
        debug!(len = content.len(), "research completion received");

        Ok(Some(parse_research_content(&content)))
    }
}

/// Pulls the first `{...}` block out of the completion; falls back to the raw text.
pub(crate) fn parse_research_content(content: &str) -> Value {
    lazy_static! {
        static ref JSON_BLOCK: Regex = Regex::new(r"(?s)\{.*\}").unwrap();
    }
    let parsed = JSON_BLOCK
        .find(content)
        .and_then(|m| serde_json::from_str::<Value>(m.as_str()).ok());

    match parsed {
        Some(Value::Object(mut map)) => {
            map.insert("source".into(), json!("openai"));
            Value::Object(map)
        }
        _ => json!({ "source": "openai", "raw_response": content }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_embedded_json_object() {
        let content = "Here you go:\n```json\n{\"rarity\": \"rare\", \"awards\": []}\n```";
        let v = parse_research_content(content);
        assert_eq!(v["rarity"], "rare");
        assert_eq!(v["source"], "openai");
    }

    #[test]
    fn falls_back_to_raw_text() {
        let v = parse_research_content("I could not find that bottle.");
        assert_eq!(v["source"], "openai");
        assert_eq!(v["raw_response"], "I could not find that bottle.");
    }

    #[test]
    fn malformed_json_is_kept_raw() {
        let v = parse_research_content("{not json}");
        assert_eq!(v["raw_response"], "{not json}");
    }

    #[test]
    fn trims_trailing_slash_from_base_url() {
        let cfg = ResearchConfig {
            api_key: Some("k".into()),
            base_url: "http://localhost:11434/v1/".into(),
            model: "llama3".into(),
            timeout_secs: 5,
        };
        let r = OpenAiResearcher::new(&cfg, "k".into()).unwrap();
        assert_eq!(r.base_url, "http://localhost:11434/v1");
        assert_eq!(r.model, "llama3");
    }
}
