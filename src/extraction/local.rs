//! Offline heuristic text provider
//!
//! First tier of the cost-ordered chain: free, unlimited, no credentials.
//! Accepts text-like payloads as-is and scans them for best-guess fields,
//! so the coordinator can run in a degraded-but-working mode with no
//! external services at all.

use super::{ExtractionProvider, ProviderOutput};
use crate::error::AuditError;
use crate::models::ExtractionMethod;
use crate::Result;
use chrono::NaiveDate;

/// Line prefixes that usually introduce the vendor on Indian procurement
/// paperwork.
const VENDOR_MARKERS: &[&str] = &[
    "vendor:", "supplier:", "contractor:", "billed by:", "from:",
];

const AMOUNT_MARKERS: &[&str] = &[
    "grand total", "total amount", "amount payable", "net payable", "total:",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y"];

pub struct LocalTextProvider;

#[async_trait::async_trait]
impl ExtractionProvider for LocalTextProvider {
    fn method(&self) -> ExtractionMethod {
        ExtractionMethod::LocalText
    }

    async fn attempt_extract(
        &self,
        document: &[u8],
        _file_name: &str,
        mime_type: &str,
    ) -> Result<ProviderOutput> {
        let text = std::str::from_utf8(document).map_err(|_| {
            AuditError::ProviderUnavailable("payload is not UTF-8 text".to_string())
        })?;

        if !is_text_like(mime_type) && !is_mostly_printable(text) {
            return Err(AuditError::ProviderUnavailable(format!(
                "payload of type {} needs an OCR-capable provider",
                mime_type
            )));
        }

        Ok(ProviderOutput {
            extracted_text: text.to_string(),
            vendor_name: guess_vendor(text),
            total_amount: guess_amount(text),
            document_date: guess_date(text),
            raw_payload: None,
        })
    }
}

fn is_text_like(mime_type: &str) -> bool {
    mime_type.starts_with("text/")
        || mime_type == "application/json"
        || mime_type == "application/xml"
}

fn is_mostly_printable(text: &str) -> bool {
    if text.is_empty() {
        return false;
    }
    let control = text
        .chars()
        .filter(|c| c.is_control() && *c != '\n' && *c != '\r' && *c != '\t')
        .count();
    control * 20 < text.chars().count()
}

fn guess_vendor(text: &str) -> Option<String> {
    for line in text.lines() {
        let lowered = line.to_lowercase();
        for marker in VENDOR_MARKERS {
            if let Some(pos) = lowered.find(marker) {
                let candidate = line[pos + marker.len()..].trim();
                if !candidate.is_empty() {
                    return Some(candidate.to_string());
                }
            }
        }
    }
    None
}

fn guess_amount(text: &str) -> Option<f64> {
    for line in text.lines() {
        let lowered = line.to_lowercase();
        if AMOUNT_MARKERS.iter().any(|m| lowered.contains(m)) {
            if let Some(amount) = first_number(line) {
                return Some(amount);
            }
        }
    }
    None
}

/// First non-negative number on a line, tolerating currency prefixes and
/// thousands separators ("₹1,50,000", "Rs. 50000.00").
fn first_number(line: &str) -> Option<f64> {
    for token in line.split_whitespace() {
        let cleaned: String = token
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '.')
            .collect();
        if cleaned.is_empty() {
            continue;
        }
        if let Ok(value) = cleaned.parse::<f64>() {
            if value >= 0.0 {
                return Some(value);
            }
        }
    }
    None
}

fn guess_date(text: &str) -> Option<NaiveDate> {
    for token in text.split_whitespace() {
        let token = token.trim_matches(|c: char| !c.is_ascii_digit());
        for format in DATE_FORMATS {
            if let Ok(date) = NaiveDate::parse_from_str(token, format) {
                return Some(date);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_INVOICE: &str = "\
INVOICE NO 2041
Date: 2026-03-14
Vendor: Acme Infrastructure Ltd
Item: road resurfacing, 4.2 km
Grand Total: ₹1,50,000.00
";

    #[tokio::test]
    async fn extracts_fields_from_plain_text_invoice() {
        let provider = LocalTextProvider;
        let output = provider
            .attempt_extract(SAMPLE_INVOICE.as_bytes(), "invoice.txt", "text/plain")
            .await
            .unwrap();

        assert_eq!(output.vendor_name.as_deref(), Some("Acme Infrastructure Ltd"));
        assert_eq!(output.total_amount, Some(150000.0));
        assert_eq!(
            output.document_date,
            Some(NaiveDate::from_ymd_opt(2026, 3, 14).unwrap())
        );
        assert_eq!(output.extracted_text, SAMPLE_INVOICE);
    }

    #[tokio::test]
    async fn rejects_binary_payloads() {
        let provider = LocalTextProvider;
        let err = provider
            .attempt_extract(&[0xff, 0xd8, 0xff, 0xe0], "scan.jpg", "image/jpeg")
            .await
            .unwrap_err();

        assert!(matches!(err, AuditError::ProviderUnavailable(_)));
    }

    #[test]
    fn vendor_guessing_is_case_insensitive() {
        assert_eq!(
            guess_vendor("SUPPLIER: Bharat Traders"),
            Some("Bharat Traders".to_string())
        );
        assert_eq!(guess_vendor("no marker here"), None);
    }

    #[test]
    fn amount_guessing_skips_unmarked_numbers() {
        assert_eq!(guess_amount("Item 17 quantity 40"), None);
        assert_eq!(guess_amount("Total: Rs. 42,000"), Some(42000.0));
    }

    #[test]
    fn date_guessing_accepts_common_formats() {
        assert_eq!(
            guess_date("issued 14/03/2026 at Delhi"),
            Some(NaiveDate::from_ymd_opt(2026, 3, 14).unwrap())
        );
        assert_eq!(guess_date("no date"), None);
    }
}
