//! Gemini API backend for the structured generation client
//!
//! Uses a long-lived reqwest::Client for connection pooling. Schema
//! descriptions reach the model only as prose inside the instruction;
//! enforcement happens after the fact in `structured`.

use crate::error::AuditError;
use crate::structured::GenerativeModel;
use crate::Result;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{error, info};

const DEFAULT_BASE_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent";

const SYSTEM_PROMPT: &str = r#"You are an expert government procurement audit AI.

Guidelines:
- Be precise with amounts, dates and vendor names
- Base conclusions only on the supplied records
- Flag uncertainty explicitly instead of inventing figures
- When asked for JSON, return exactly one JSON object and nothing else"#;

/// Reusable Gemini backend (connection-pooled)
pub struct GeminiModel {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiModel {
    pub fn new(api_key: String) -> Self {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .timeout(Duration::from_secs(45))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

}

#[async_trait::async_trait]
impl GenerativeModel for GeminiModel {
    async fn complete(&self, instruction: &str) -> Result<String> {
        if self.api_key.is_empty() {
            return Err(AuditError::GenerationError(
                "GEMINI_API_KEY not configured".to_string(),
            ));
        }

        let url = format!("{}?key={}", self.base_url, self.api_key);

        let request = GeminiRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: instruction.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.3,
                top_p: 0.9,
                top_k: 40,
                max_output_tokens: 4096,
            },
            system_instruction: SystemInstruction {
                parts: vec![Part {
                    text: SYSTEM_PROMPT.to_string(),
                }],
            },
        };

        info!(instruction_len = instruction.len(), "Calling Gemini API");

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("Gemini API request failed: {}", e);
                if e.is_timeout() {
                    AuditError::Timeout(format!("Gemini API: {}", e))
                } else {
                    AuditError::GenerationError(format!("Gemini API error: {}", e))
                }
            })?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Gemini API error response: {}", error_text);
            return Err(AuditError::GenerationError(format!(
                "Gemini API error: {}",
                error_text
            )));
        }

        let gemini_response: GeminiResponse = response.json().await.map_err(|e| {
            error!("Failed to parse Gemini response: {}", e);
            AuditError::GenerationError(format!("Gemini parse error: {}", e))
        })?;

        let text = gemini_response
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.clone())
            .ok_or_else(|| {
                AuditError::GenerationError("Empty response from Gemini".to_string())
            })?;

        info!(response_len = text.len(), "Gemini response received");

        Ok(text)
    }
}

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
    system_instruction: SystemInstruction,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    top_k: i32,
    max_output_tokens: i32,
}

#[derive(Debug, Serialize)]
struct SystemInstruction {
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structured::GenerativeModel;

    #[test]
    fn request_serialization_carries_instruction() {
        let request = GeminiRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: "Compare contract and invoice".to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.3,
                top_p: 0.9,
                top_k: 40,
                max_output_tokens: 4096,
            },
            system_instruction: SystemInstruction {
                parts: vec![Part {
                    text: SYSTEM_PROMPT.to_string(),
                }],
            },
        };

        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("Compare contract and invoice"));
        assert!(json.contains("procurement audit"));
    }

    #[tokio::test]
    async fn missing_api_key_fails_before_any_request() {
        let model = GeminiModel::new(String::new());
        let err = model.complete("anything").await.unwrap_err();
        assert!(err.to_string().contains("GEMINI_API_KEY"));
    }
}
