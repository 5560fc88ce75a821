//! Hosted language-model analyzer.
//!
//! Sends the article to an OpenAI-compatible chat-completions endpoint and
//! asks for a JSON object with the score, keywords and category.

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{AnalysisResult, Analyzer, Category};
use crate::{EchoscapeError, Result};

/// Chat-completions endpoint configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub endpoint: String,
    pub model: String,
    /// API key; read from `api_key_env` when unset
    pub api_key: Option<String>,
    pub api_key_env: String,
    pub temperature: f64,
    /// Article text beyond this many characters is not sent
    pub max_input_chars: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key: None,
            api_key_env: "OPENAI_API_KEY".to_string(),
            temperature: 0.0,
            max_input_chars: 12_000,
        }
    }
}

/// The JSON object the model is asked to return
#[derive(Debug, Deserialize)]
struct LlmReply {
    #[serde(alias = "sentiment", alias = "score")]
    sentiment_score: f64,
    #[serde(default)]
    keywords: Vec<String>,
    #[serde(default)]
    category: String,
}

pub struct LlmAnalyzer {
    client: reqwest::Client,
    config: LlmConfig,
    api_key: String,
    keyword_cap: usize,
}

impl LlmAnalyzer {
    /// Builds the analyzer, resolving the API key.
    ///
    /// # Errors
    ///
    /// Returns [`EchoscapeError::Analyzer`] when no API key is configured.
    pub fn new(config: LlmConfig, keyword_cap: usize) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var(&config.api_key_env).ok())
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| EchoscapeError::Analyzer(format!("no API key: set {} or llm.api_key", config.api_key_env)))?;

        Ok(Self { client: reqwest::Client::new(), config, api_key, keyword_cap })
    }

    fn payload(&self, text: &str) -> serde_json::Value {
        let text: String = text.chars().take(self.config.max_input_chars).collect();
        let categories = Category::ALL.iter().map(|c| c.label()).collect::<Vec<_>>().join(", ");

        json!({
            "model": self.config.model,
            "messages": [
                {
                    "role": "system",
                    "content": format!(
                        "You analyze news articles. Reply with only a JSON object with the keys \
                         \"sentiment_score\" (a number from -1.0, extremely negative, to 1.0, extremely positive), \
                         \"keywords\" (up to {} distinct topical keywords, most relevant first) and \
                         \"category\" (exactly one of: {}).",
                        self.keyword_cap, categories
                    )
                },
                { "role": "user", "content": format!("Article:\n{}", text) }
            ],
            "temperature": self.config.temperature
        })
    }
}

#[async_trait]
impl Analyzer for LlmAnalyzer {
    async fn analyze(&self, text: &str) -> Result<AnalysisResult> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.api_key))
                .map_err(|e| EchoscapeError::Analyzer(format!("invalid API key header: {}", e)))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let response = self
            .client
            .post(&self.config.endpoint)
            .headers(headers)
            .json(&self.payload(text))
            .send()
            .await?
            .error_for_status()?;

        let body = response.json::<serde_json::Value>().await?;
        let content = body["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| EchoscapeError::Analyzer("response has no message content".to_string()))?;

        parse_reply(content, self.keyword_cap)
    }

    fn name(&self) -> &'static str {
        "llm"
    }
}

/// Parses the model's reply, tolerating code fences and surrounding prose.
pub fn parse_reply(content: &str, keyword_cap: usize) -> Result<AnalysisResult> {
    let start = content.find('{');
    let end = content.rfind('}');
    let object = match (start, end) {
        (Some(start), Some(end)) if start < end => &content[start..=end],
        _ => return Err(EchoscapeError::Analyzer(format!("reply is not a JSON object: {}", content.trim()))),
    };

    let reply: LlmReply = serde_json::from_str(object)
        .map_err(|e| EchoscapeError::Analyzer(format!("malformed analysis reply: {}", e)))?;

    Ok(AnalysisResult::new(reply.sentiment_score, reply.keywords, Category::from_label(&reply.category), keyword_cap))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_json() {
        let reply = r#"{"sentiment_score": -0.4, "keywords": ["flood", "rain"], "category": "World News"}"#;
        let result = parse_reply(reply, 10).unwrap();

        assert_eq!(result.sentiment_score, -0.4);
        assert_eq!(result.keywords, vec!["flood", "rain"]);
        assert_eq!(result.category, Category::WorldNews);
    }

    #[test]
    fn test_parse_fenced_reply_clamps_and_caps() {
        let reply = "```json\n{\"sentiment\": 7, \"keywords\": [\"a\", \"b\", \"c\"], \"category\": \"gossip\"}\n```";
        let result = parse_reply(reply, 2).unwrap();

        assert_eq!(result.sentiment_score, 1.0);
        assert_eq!(result.keywords.len(), 2);
        assert_eq!(result.category, Category::Other);
    }

    #[test]
    fn test_parse_rejects_non_json() {
        assert!(matches!(parse_reply("0.5", 10), Err(EchoscapeError::Analyzer(_))));
        assert!(matches!(parse_reply("{\"keywords\": []}", 10), Err(EchoscapeError::Analyzer(_))));
    }

    #[test]
    fn test_missing_api_key() {
        let config = LlmConfig {
            api_key: None,
            api_key_env: "ECHOSCAPE_TEST_UNSET_KEY".to_string(),
            ..Default::default()
        };
        assert!(matches!(LlmAnalyzer::new(config, 10), Err(EchoscapeError::Analyzer(_))));
    }

    #[test]
    fn test_payload_truncates_input() {
        let config = LlmConfig { api_key: Some("key".to_string()), max_input_chars: 5, ..Default::default() };
        let analyzer = LlmAnalyzer::new(config, 10).unwrap();
        let payload = analyzer.payload("abcdefghij");

        assert_eq!(payload["messages"][1]["content"], "Article:\nabcde");
        assert!(payload["messages"][0]["content"].as_str().unwrap().contains("World News"));
    }
}
