//! Google Cloud Vision OCR provider
//!
//! Second tier of the chain: quota-limited cloud OCR. Only constructed
//! when a key is configured, so a missing credential degrades the chain
//! instead of breaking it. The full annotate response is kept as the
//! audit payload.

use super::{ExtractionProvider, ProviderOutput};
use crate::error::AuditError;
use crate::models::ExtractionMethod;
use crate::Result;
use base64::Engine as _;
use reqwest::Client;
use serde_json::{json, Value};
use std::env;
use std::time::Duration;
use tracing::debug;

const VISION_ENDPOINT: &str = "https://vision.googleapis.com/v1/images:annotate";

pub struct GoogleVisionProvider {
    client: Client,
    api_key: String,
    endpoint: String,
}

impl GoogleVisionProvider {
    pub fn new(api_key: String) -> Self {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(60))
            .pool_max_idle_per_host(8)
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            api_key,
            endpoint: VISION_ENDPOINT.to_string(),
        }
    }

    pub fn from_env() -> Option<Self> {
        env::var("GOOGLE_VISION_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .map(Self::new)
    }
}

#[async_trait::async_trait]
impl ExtractionProvider for GoogleVisionProvider {
    fn method(&self) -> ExtractionMethod {
        ExtractionMethod::GoogleVision
    }

    async fn attempt_extract(
        &self,
        document: &[u8],
        file_name: &str,
        _mime_type: &str,
    ) -> Result<ProviderOutput> {
        let content = base64::engine::general_purpose::STANDARD.encode(document);

        let body = json!({
            "requests": [
                {
                    "image": { "content": content },
                    "features": [
                        { "type": "TEXT_DETECTION" },
                        { "type": "DOCUMENT_TEXT_DETECTION" }
                    ]
                }
            ]
        });

        let url = format!("{}?key={}", self.endpoint, self.api_key);

        debug!(file = file_name, bytes = document.len(), "Calling Vision API");

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                AuditError::ProviderUnavailable(format!("Vision API request failed: {}", e))
            })?;

        if !response.status().is_success() {
            return Err(AuditError::ProviderUnavailable(format!(
                "Vision API returned {}",
                response.status()
            )));
        }

        let payload: Value = response.json().await.map_err(|e| {
            AuditError::ProviderUnavailable(format!("Vision API sent invalid JSON: {}", e))
        })?;

        if let Some(error) = payload.get("error") {
            return Err(AuditError::ProviderUnavailable(format!(
                "Vision API error: {}",
                error
            )));
        }

        let extracted_text = annotation_text(&payload).unwrap_or_default();

        Ok(ProviderOutput {
            extracted_text,
            vendor_name: None,
            total_amount: None,
            document_date: None,
            raw_payload: Some(payload),
        })
    }
}

/// `responses[0].textAnnotations[0].description`, the first annotation is
/// the full-page text, the rest are per-word boxes we do not need.
fn annotation_text(payload: &Value) -> Option<String> {
    payload
        .get("responses")?
        .get(0)?
        .get("textAnnotations")?
        .get(0)?
        .get("description")?
        .as_str()
        .map(|s| s.to_string())
}
