use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{WordSource, WordSourceError};
use crate::difficulty::Difficulty;

pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

const SYSTEM_INSTRUCTION: &str = "The prompt is a number from 0 to 3, where 0 is easy, \
1 is medium, 2 is hard and 3 is very hard. Based on it, generate a paragraph of meaningful \
words that will be used for typing practice. At level 3 the paragraph should make no sense \
and be made of random words; at every other level it should read normally. Do not write \
about typing exercises or anything related to them, and never use 'The quick brown fox \
jumps over the lazy dog'. Level 0: at most 3 sentences of simple words. Levels 1 and 2: at \
most 2 and 3 sentences respectively, with somewhat harder words. Level 3: at most 2 \
sentences of words people rarely know exist.";

/// Connection settings for the Gemini `generateContent` endpoint.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub endpoint: String,
    pub timeout: Duration,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Word source backed by a generative language model.
pub struct GeminiWordSource {
    config: GeminiConfig,
    client: Client,
}

impl GeminiWordSource {
    pub fn new(config: GeminiConfig) -> Result<Self, WordSourceError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }

    pub fn url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.endpoint.trim_end_matches('/'),
            self.config.model
        )
    }
}

impl WordSource for GeminiWordSource {
    fn fetch_words(&self, difficulty: Difficulty) -> Result<Vec<String>, WordSourceError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(WordSourceError::MissingApiKey)?;

        let prompt = difficulty.level().to_string();
        let body = GenerateRequest::new(&prompt);

        debug!(model = %self.config.model, %difficulty, "requesting text");
        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()?;

        let status = response.status();
        let text = response.text()?;

        if !status.is_success() {
            return Err(WordSourceError::Status {
                status: status.as_u16(),
                message: error_message(&text),
            });
        }

        parse_response(&text)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    system_instruction: RequestContent<'a>,
    contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

impl<'a> GenerateRequest<'a> {
    fn new(prompt: &'a str) -> Self {
        Self {
            system_instruction: RequestContent {
                role: None,
                parts: vec![RequestPart {
                    text: SYSTEM_INSTRUCTION,
                }],
            },
            contents: vec![RequestContent {
                role: Some("user"),
                parts: vec![RequestPart { text: prompt }],
            }],
        }
    }
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Extracts the words of the first candidate. Line breaks from the model
/// collapse into single spaces since they cannot be typed.
pub fn parse_response(body: &str) -> Result<Vec<String>, WordSourceError> {
    let response: GenerateResponse = serde_json::from_str(body)
        .map_err(|e| WordSourceError::MalformedResponse(e.to_string()))?;

    let content = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| WordSourceError::MalformedResponse("no candidates".to_string()))?
        .content
        .ok_or_else(|| WordSourceError::MalformedResponse("candidate has no content".to_string()))?;

    let text: String = content
        .parts
        .into_iter()
        .filter_map(|p| p.text)
        .collect::<Vec<String>>()
        .join("");

    Ok(text.split_whitespace().map(str::to_string).collect())
}

fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => envelope.error.message,
        Err(_) => body.chars().take(200).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_request_body_shape() {
        let body = serde_json::to_value(GenerateRequest::new("2")).unwrap();

        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "2");
        assert!(body["systemInstruction"]["parts"][0]["text"]
            .as_str()
            .unwrap()
            .contains("typing practice"));
        assert!(body["systemInstruction"].get("role").is_none());
    }

    #[test]
    fn test_url_trims_trailing_slash() {
        let source = GeminiWordSource::new(GeminiConfig {
            endpoint: "http://localhost:9/v1beta/".to_string(),
            model: "test-model".to_string(),
            ..GeminiConfig::default()
        })
        .unwrap();

        assert_eq!(
            source.url(),
            "http://localhost:9/v1beta/models/test-model:generateContent"
        );
    }

    #[test]
    fn test_missing_api_key_fails_before_any_request() {
        let source = GeminiWordSource::new(GeminiConfig::default()).unwrap();
        assert_matches!(
            source.fetch_words(Difficulty::Easy),
            Err(WordSourceError::MissingApiKey)
        );

        let blank = GeminiWordSource::new(GeminiConfig {
            api_key: Some("   ".to_string()),
            ..GeminiConfig::default()
        })
        .unwrap();
        assert_matches!(
            blank.fetch_words(Difficulty::Easy),
            Err(WordSourceError::MissingApiKey)
        );
    }

    #[test]
    fn test_parse_response_splits_words() {
        let body = r#"{
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [{"text": "Birds sing at dawn.\nThe river "}, {"text": "flows."}]
                },
                "finishReason": "STOP"
            }]
        }"#;

        let words = parse_response(body).unwrap();
        assert_eq!(
            words,
            vec!["Birds", "sing", "at", "dawn.", "The", "river", "flows."]
        );
    }

    #[test]
    fn test_parse_response_empty_text_is_not_an_error() {
        let body = r#"{"candidates": [{"content": {"parts": [{"text": "  "}]}}]}"#;
        assert_eq!(parse_response(body).unwrap(), Vec::<String>::new());
    }

    #[test]
    fn test_parse_response_without_candidates_is_malformed() {
        assert_matches!(
            parse_response(r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#),
            Err(WordSourceError::MalformedResponse(_))
        );
        assert_matches!(
            parse_response(r#"{"candidates": [{"finishReason": "SAFETY"}]}"#),
            Err(WordSourceError::MalformedResponse(_))
        );
    }

    #[test]
    fn test_parse_response_rejects_garbage() {
        assert_matches!(
            parse_response("<html>bad gateway</html>"),
            Err(WordSourceError::MalformedResponse(_))
        );
    }

    #[test]
    fn test_error_message_prefers_api_message() {
        let body = r#"{"error": {"code": 400, "message": "API key not valid", "status": "INVALID_ARGUMENT"}}"#;
        assert_eq!(error_message(body), "API key not valid");
        assert_eq!(error_message("plain failure"), "plain failure");
    }
}
