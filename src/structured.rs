//! Structured generation client
//!
//! Sends a natural-language instruction to a generative text backend,
//! locates the JSON object in the free-form reply, and enforces a target
//! schema after the parse. The prose description of the shape still lives
//! in the instruction text (the backend is not expected to enforce it),
//! but the machine-checked contract lives here, at the call site.
//!
//! No retry is performed in this client; retry policy belongs to callers.

use crate::error::AuditError;
use crate::Result;
use serde_json::Value;
use std::sync::Arc;

/// A generative text backend: instruction in, free text out.
#[async_trait::async_trait]
pub trait GenerativeModel: Send + Sync {
    async fn complete(&self, instruction: &str) -> Result<String>;
}

/// Structured generation over any [`GenerativeModel`].
#[derive(Clone)]
pub struct StructuredClient {
    model: Arc<dyn GenerativeModel>,
}

impl StructuredClient {
    pub fn new(model: Arc<dyn GenerativeModel>) -> Self {
        Self { model }
    }

    /// Raw completion, no coercion. Used where unstructured output is an
    /// acceptable outcome (policy Q&A, degraded intelligence paths).
    pub async fn complete(&self, instruction: &str) -> Result<String> {
        self.model.complete(instruction).await
    }

    /// Coerce already-received text into a schema-conforming value.
    ///
    /// Split out from [`generate`](Self::generate) so callers that need the
    /// raw text on failure (the risk aggregator) can keep it.
    pub fn coerce(&self, raw: &str, schema: &Value) -> Result<Value> {
        let span = extract_json_span(raw).ok_or(AuditError::NoStructuredOutput)?;

        let value: Value = serde_json::from_str(span)
            .map_err(|e| AuditError::MalformedOutput(e.to_string()))?;

        let violations = collect_schema_violations(schema, &value);
        if !violations.is_empty() {
            return Err(AuditError::SchemaViolation(violations));
        }

        Ok(value)
    }

    /// Full structured generation: complete, locate, parse, validate.
    pub async fn generate(&self, instruction: &str, schema: &Value) -> Result<Value> {
        let raw = self.complete(instruction).await?;
        self.coerce(&raw, schema)
    }
}

/// Locate the brace-delimited JSON span in a free-form response.
///
/// Policy: greedy match from the first `{` to the last `}`. Trailing prose
/// after the object is tolerated; two independent JSON objects in one
/// response is unsupported and will fail downstream as a parse error.
pub fn extract_json_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

/// Validate an instance against a JSON Schema, collecting every violation
/// with its instance path.
pub fn collect_schema_violations(schema: &Value, instance: &Value) -> Vec<String> {
    match jsonschema::Validator::new(schema) {
        Ok(validator) => validator
            .iter_errors(instance)
            .map(|error| format!("at '{}': {}", error.instance_path, error))
            .collect(),
        Err(e) => vec![format!("schema compilation error: {}", e)],
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::ScriptedModel;
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    fn schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "verdict": { "type": "string" },
                "score": { "type": "integer", "minimum": 0, "maximum": 100 }
            },
            "required": ["verdict", "score"]
        })
    }

    #[tokio::test]
    async fn generate_accepts_json_wrapped_in_prose() {
        let model = Arc::new(ScriptedModel::new(
            "Here is the analysis:\n{\"verdict\": \"ok\", \"score\": 88}\nLet me know if you need more.",
        ));
        let client = StructuredClient::new(model);

        let value = client.generate("assess", &schema()).await.unwrap();
        assert_eq!(value["verdict"], "ok");
        assert_eq!(value["score"], 88);
    }

    #[tokio::test]
    async fn generate_without_braces_is_no_structured_output() {
        let model = Arc::new(ScriptedModel::new("I cannot produce a report."));
        let client = StructuredClient::new(model);

        let err = client.generate("assess", &schema()).await.unwrap_err();
        assert!(matches!(err, AuditError::NoStructuredOutput));
    }

    #[tokio::test]
    async fn generate_with_unparseable_span_is_malformed() {
        let model = Arc::new(ScriptedModel::new("{\"verdict\": oops}"));
        let client = StructuredClient::new(model);

        let err = client.generate("assess", &schema()).await.unwrap_err();
        assert!(matches!(err, AuditError::MalformedOutput(_)));
    }

    #[tokio::test]
    async fn generate_reports_every_schema_violation() {
        let model = Arc::new(ScriptedModel::new(
            "{\"verdict\": 12, \"score\": 250}",
        ));
        let client = StructuredClient::new(model);

        let err = client.generate("assess", &schema()).await.unwrap_err();
        match err {
            AuditError::SchemaViolation(violations) => {
                assert_eq!(violations.len(), 2);
            }
            other => panic!("expected SchemaViolation, got {:?}", other),
        }
    }

    #[test]
    fn span_extraction_is_greedy_first_to_last() {
        assert_eq!(extract_json_span("{\"a\":1}"), Some("{\"a\":1}"));
        assert_eq!(
            extract_json_span("x {\"a\": {\"b\": 2}} y"),
            Some("{\"a\": {\"b\": 2}}")
        );
        // Two independent objects: the greedy span covers both and is not
        // valid JSON, defined (if fragile) behavior.
        assert_eq!(extract_json_span("{\"a\":1} {\"b\":2}"), Some("{\"a\":1} {\"b\":2}"));
        assert_eq!(extract_json_span("no braces"), None);
        assert_eq!(extract_json_span("} {"), None);
    }
}
