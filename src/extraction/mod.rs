//! Document extraction with cost-ordered fallback
//!
//! Providers are tried cheapest/most-available first; failure is expected
//! and routine (rate limits, missing credentials), so the coordinator
//! absorbs it as control flow. The first non-empty result wins, no
//! best-of-N, no speculative parallel calls. When every provider is
//! exhausted the document is handed downstream as a terminal record, not
//! an error.

pub mod local;
pub mod vision;

pub use local::LocalTextProvider;
pub use vision::GoogleVisionProvider;

use crate::models::{ExtractionMethod, ExtractionRecord};
use crate::Result;
use chrono::{NaiveDate, Utc};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Sentinel vendor name marking a document no provider could resolve.
pub const UNRESOLVED_VENDOR: &str = "Unresolved vendor";

const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(30);

/// Raw text plus best-guess fields from a single provider attempt.
#[derive(Debug, Clone, Default)]
pub struct ProviderOutput {
    pub extracted_text: String,
    pub vendor_name: Option<String>,
    pub total_amount: Option<f64>,
    pub document_date: Option<NaiveDate>,
    pub raw_payload: Option<Value>,
}

/// One extraction capability. Adding a provider is a list insertion in the
/// coordinator, not a new catch block.
#[async_trait::async_trait]
pub trait ExtractionProvider: Send + Sync {
    fn method(&self) -> ExtractionMethod;

    async fn attempt_extract(
        &self,
        document: &[u8],
        file_name: &str,
        mime_type: &str,
    ) -> Result<ProviderOutput>;
}

/// Fallback extraction coordinator. Never fails outward.
pub struct DocumentExtractor {
    providers: Vec<Arc<dyn ExtractionProvider>>,
    attempt_timeout: Duration,
}

impl DocumentExtractor {
    pub fn new(providers: Vec<Arc<dyn ExtractionProvider>>) -> Self {
        Self {
            providers,
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
        }
    }

    pub fn with_attempt_timeout(mut self, attempt_timeout: Duration) -> Self {
        self.attempt_timeout = attempt_timeout;
        self
    }

    /// Try providers in priority order and return the first non-empty
    /// result, or the terminal unresolved record when all are exhausted.
    ///
    /// Attempts are strictly sequential: trying a second provider only
    /// after the first definitively fails is the point of cost ordering.
    pub async fn extract(
        &self,
        document: &[u8],
        file_name: &str,
        mime_type: &str,
    ) -> ExtractionRecord {
        let fingerprint = hex::encode(Sha256::digest(document));
        debug!(
            file = file_name,
            mime = mime_type,
            bytes = document.len(),
            sha256 = %fingerprint,
            "Starting document extraction"
        );

        for provider in &self.providers {
            let method = provider.method();

            let attempt = timeout(
                self.attempt_timeout,
                provider.attempt_extract(document, file_name, mime_type),
            )
            .await;

            match attempt {
                Err(_) => {
                    warn!(provider = %method, "Extraction attempt timed out, advancing to next provider");
                }
                Ok(Err(e)) => {
                    warn!(provider = %method, error = %e, "Extraction attempt failed, advancing to next provider");
                }
                Ok(Ok(output)) => {
                    if output.extracted_text.trim().is_empty() {
                        warn!(provider = %method, "Provider returned empty text, advancing to next provider");
                        continue;
                    }

                    info!(
                        provider = %method,
                        text_len = output.extracted_text.len(),
                        "Document extraction succeeded"
                    );
                    return normalize(output, method, file_name);
                }
            }
        }

        info!(
            file = file_name,
            "All extraction providers exhausted, deferring document to downstream reasoning"
        );

        ExtractionRecord {
            source_file_name: file_name.to_string(),
            extracted_text: String::new(),
            vendor_name: UNRESOLVED_VENDOR.to_string(),
            total_amount: 0.0,
            document_date: Utc::now().date_naive(),
            extraction_method: ExtractionMethod::Unresolved,
            raw_provider_payload: None,
        }
    }
}

fn normalize(output: ProviderOutput, method: ExtractionMethod, file_name: &str) -> ExtractionRecord {
    ExtractionRecord {
        source_file_name: file_name.to_string(),
        extracted_text: output.extracted_text,
        vendor_name: output
            .vendor_name
            .unwrap_or_else(|| format!("Detected by {}", method)),
        total_amount: output.total_amount.unwrap_or(0.0).max(0.0),
        document_date: output
            .document_date
            .unwrap_or_else(|| Utc::now().date_naive()),
        extraction_method: method,
        raw_provider_payload: output.raw_payload,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AuditError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubProvider {
        method: ExtractionMethod,
        output: Option<ProviderOutput>,
        calls: AtomicUsize,
    }

    impl StubProvider {
        fn succeeding(method: ExtractionMethod, text: &str) -> Arc<Self> {
            Arc::new(Self {
                method,
                output: Some(ProviderOutput {
                    extracted_text: text.to_string(),
                    ..ProviderOutput::default()
                }),
                calls: AtomicUsize::new(0),
            })
        }

        fn failing(method: ExtractionMethod) -> Arc<Self> {
            Arc::new(Self {
                method,
                output: None,
                calls: AtomicUsize::new(0),
            })
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl ExtractionProvider for StubProvider {
        fn method(&self) -> ExtractionMethod {
            self.method
        }

        async fn attempt_extract(
            &self,
            _document: &[u8],
            _file_name: &str,
            _mime_type: &str,
        ) -> Result<ProviderOutput> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.output {
                Some(output) => Ok(output.clone()),
                None => Err(AuditError::ProviderUnavailable("stubbed outage".to_string())),
            }
        }
    }

    #[tokio::test]
    async fn first_success_skips_remaining_providers() {
        let first = StubProvider::succeeding(ExtractionMethod::LocalText, "INVOICE #42");
        let second = StubProvider::succeeding(ExtractionMethod::GoogleVision, "unused");

        let extractor = DocumentExtractor::new(vec![first.clone(), second.clone()]);
        let record = extractor.extract(b"INVOICE #42", "invoice.txt", "text/plain").await;

        assert_eq!(record.extraction_method, ExtractionMethod::LocalText);
        assert_eq!(first.call_count(), 1);
        assert_eq!(second.call_count(), 0);
    }

    #[tokio::test]
    async fn failures_advance_down_the_chain() {
        let first = StubProvider::failing(ExtractionMethod::LocalText);
        let second = StubProvider::succeeding(ExtractionMethod::GoogleVision, "scanned text");

        let extractor = DocumentExtractor::new(vec![first.clone(), second.clone()]);
        let record = extractor.extract(&[0xff, 0xd8], "scan.jpg", "image/jpeg").await;

        assert_eq!(record.extraction_method, ExtractionMethod::GoogleVision);
        assert_eq!(record.extracted_text, "scanned text");
        assert_eq!(first.call_count(), 1);
        assert_eq!(second.call_count(), 1);
    }

    #[tokio::test]
    async fn empty_text_counts_as_failure() {
        let first = StubProvider::succeeding(ExtractionMethod::LocalText, "   ");
        let second = StubProvider::succeeding(ExtractionMethod::GoogleVision, "real text");

        let extractor = DocumentExtractor::new(vec![first, second]);
        let record = extractor.extract(b"x", "doc.png", "image/png").await;

        assert_eq!(record.extraction_method, ExtractionMethod::GoogleVision);
    }

    #[tokio::test]
    async fn exhausted_chain_yields_terminal_record() {
        let first = StubProvider::failing(ExtractionMethod::LocalText);
        let second = StubProvider::failing(ExtractionMethod::GoogleVision);

        let extractor = DocumentExtractor::new(vec![first, second]);
        let record = extractor.extract(&[0x00], "opaque.bin", "application/octet-stream").await;

        assert_eq!(record.extraction_method, ExtractionMethod::Unresolved);
        assert_eq!(record.vendor_name, UNRESOLVED_VENDOR);
        assert_eq!(record.total_amount, 0.0);
        assert!(record.extracted_text.is_empty());
        assert_eq!(record.document_date, Utc::now().date_naive());
    }

    struct StalledProvider;

    #[async_trait::async_trait]
    impl ExtractionProvider for StalledProvider {
        fn method(&self) -> ExtractionMethod {
            ExtractionMethod::GoogleVision
        }

        async fn attempt_extract(
            &self,
            _document: &[u8],
            _file_name: &str,
            _mime_type: &str,
        ) -> Result<ProviderOutput> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(ProviderOutput::default())
        }
    }

    #[tokio::test]
    async fn slow_provider_times_out_and_falls_through() {
        let fallback = StubProvider::succeeding(ExtractionMethod::LocalText, "recovered");

        let extractor = DocumentExtractor::new(vec![Arc::new(StalledProvider), fallback.clone()])
            .with_attempt_timeout(Duration::from_millis(20));
        let record = extractor.extract(b"doc", "doc.txt", "text/plain").await;

        assert_eq!(record.extraction_method, ExtractionMethod::LocalText);
        assert_eq!(fallback.call_count(), 1);
    }

    #[tokio::test]
    async fn empty_provider_list_still_returns_a_record() {
        let extractor = DocumentExtractor::new(vec![]);
        let record = extractor.extract(b"anything", "doc.pdf", "application/pdf").await;

        assert_eq!(record.extraction_method, ExtractionMethod::Unresolved);
    }

    #[tokio::test]
    async fn normalization_fills_placeholders() {
        let provider = StubProvider::succeeding(ExtractionMethod::GoogleVision, "some text");

        let extractor = DocumentExtractor::new(vec![provider]);
        let record = extractor.extract(b"img", "scan.png", "image/png").await;

        assert_eq!(record.vendor_name, "Detected by google-vision");
        assert_eq!(record.total_amount, 0.0);
    }
}
