//! Advisory generation
//!
//! The non-verdict outputs of the audit desk: correspondence drafts,
//! investigation narratives, and policy Q&A. All three ride the structured
//! generation client; only the Q&A path accepts unstructured output as a
//! first-class result.

use crate::error::AuditError;
use crate::models::{EmailDraft, EmailDraftRequest, InvestigationNarrative, NarrativeRequest};
use crate::structured::{extract_json_span, StructuredClient};
use crate::Result;
use serde_json::{json, Value};
use tracing::info;

pub struct AdvisoryGenerator {
    client: StructuredClient,
}

impl AdvisoryGenerator {
    pub fn new(client: StructuredClient) -> Self {
        Self { client }
    }

    /// Draft a professional audit email around one case.
    pub async fn draft_email(&self, request: &EmailDraftRequest) -> Result<EmailDraft> {
        if request.recipient.trim().is_empty() || request.purpose.trim().is_empty() {
            return Err(AuditError::InvalidInput(
                "recipient and purpose are required".to_string(),
            ));
        }

        let case_json = serde_json::to_string_pretty(&request.case_data)?;
        let tone = request.tone.as_deref().unwrap_or("formal");

        let prompt = format!(
            r#"Draft a professional government audit email.

CASE DETAILS:
{case_json}

RECIPIENT: {recipient}
TONE: {tone}
PURPOSE: {purpose}

Generate email in JSON format:
{{
  "subject": "clear, professional subject line",
  "body": "complete email body with proper formatting",
  "cc": ["suggested CC recipients"],
  "attachments": ["suggested documents to attach"],
  "priority": "normal" | "high" | "urgent",
  "followUpDate": "suggested follow-up date"
}}"#,
            recipient = request.recipient,
            purpose = request.purpose,
        );

        let value = self.client.generate(&prompt, &email_schema()).await?;
        let draft: EmailDraft = serde_json::from_value(value)
            .map_err(|e| AuditError::SchemaViolation(vec![format!("email shape: {}", e)]))?;

        info!(recipient = %request.recipient, "Email draft generated");
        Ok(draft)
    }

    /// Generate an investigation summary suitable for legal proceedings.
    pub async fn generate_narrative(
        &self,
        request: &NarrativeRequest,
    ) -> Result<InvestigationNarrative> {
        if request.transaction_data.is_null() {
            return Err(AuditError::InvalidInput(
                "transaction data is required".to_string(),
            ));
        }

        let transaction_json = serde_json::to_string_pretty(&request.transaction_data)?;
        let vendor_json =
            serde_json::to_string_pretty(request.vendor_data.as_ref().unwrap_or(&json!({})))?;
        let cases_json = serde_json::to_string_pretty(&request.related_cases)?;

        let prompt = format!(
            r#"Generate a professional investigation summary suitable for legal proceedings.

TRANSACTION:
{transaction_json}

VENDOR INFO:
{vendor_json}

RELATED CASES:
{cases_json}

Generate comprehensive narrative in JSON:
{{
  "executiveSummary": "brief 2-3 sentence overview",
  "timeline": [{{ "date": "ISO date", "event": "what happened", "evidence": "supporting evidence" }}],
  "narrative": "detailed chronological narrative in formal language",
  "keyFindings": [{{ "finding": "specific finding", "evidence": "supporting evidence", "significance": "why it matters" }}],
  "connections": {{ "vendors": [], "transactions": [], "individuals": [] }},
  "financialImpact": {{ "totalAmount": "rupees", "potentialLoss": "estimated loss", "recoveryPotential": "potential recovery amount" }},
  "legalAssessment": "preliminary legal assessment",
  "recommendations": ["next steps for investigation"],
  "attachments": ["list of supporting documents"]
}}"#
        );

        let value = self.client.generate(&prompt, &narrative_schema()).await?;
        let narrative: InvestigationNarrative = serde_json::from_value(value)
            .map_err(|e| AuditError::SchemaViolation(vec![format!("narrative shape: {}", e)]))?;

        info!("Investigation narrative generated");
        Ok(narrative)
    }

    /// Free-form policy question. A JSON object in the reply is passed
    /// through as-is; plain prose is wrapped as `{"answer": text}`.
    pub async fn policy_qa(&self, prompt: &str) -> Result<Value> {
        if prompt.trim().is_empty() {
            return Err(AuditError::InvalidInput("prompt is required".to_string()));
        }

        let text = self.client.complete(prompt).await?;

        let answer = extract_json_span(&text)
            .and_then(|span| serde_json::from_str::<Value>(span).ok())
            .unwrap_or_else(|| json!({ "answer": text }));

        Ok(answer)
    }
}

fn email_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "subject": { "type": "string" },
            "body": { "type": "string" },
            "cc": { "type": "array", "items": { "type": "string" } },
            "attachments": { "type": "array", "items": { "type": "string" } },
            "priority": { "enum": ["normal", "high", "urgent"] },
            "followUpDate": { "type": "string" }
        },
        "required": ["subject", "body", "cc", "attachments", "priority", "followUpDate"]
    })
}

fn narrative_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "executiveSummary": { "type": "string" },
            "timeline": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "date": { "type": "string" },
                        "event": { "type": "string" },
                        "evidence": { "type": "string" }
                    },
                    "required": ["date", "event", "evidence"]
                }
            },
            "narrative": { "type": "string" },
            "keyFindings": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "finding": { "type": "string" },
                        "evidence": { "type": "string" },
                        "significance": { "type": "string" }
                    },
                    "required": ["finding", "evidence", "significance"]
                }
            },
            "connections": {
                "type": "object",
                "properties": {
                    "vendors": { "type": "array", "items": { "type": "string" } },
                    "transactions": { "type": "array", "items": { "type": "string" } },
                    "individuals": { "type": "array", "items": { "type": "string" } }
                },
                "required": ["vendors", "transactions", "individuals"]
            },
            "financialImpact": {
                "type": "object",
                "properties": {
                    "totalAmount": { "type": "string" },
                    "potentialLoss": { "type": "string" },
                    "recoveryPotential": { "type": "string" }
                },
                "required": ["totalAmount", "potentialLoss", "recoveryPotential"]
            },
            "legalAssessment": { "type": "string" },
            "recommendations": { "type": "array", "items": { "type": "string" } },
            "attachments": { "type": "array", "items": { "type": "string" } }
        },
        "required": [
            "executiveSummary", "timeline", "narrative", "keyFindings",
            "connections", "financialImpact", "legalAssessment",
            "recommendations", "attachments"
        ]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EmailPriority;
    use crate::structured::test_support::ScriptedModel;
    use std::sync::Arc;

    fn advisory_with(response: &str) -> AdvisoryGenerator {
        AdvisoryGenerator::new(StructuredClient::new(Arc::new(ScriptedModel::new(response))))
    }

    #[tokio::test]
    async fn email_draft_is_typed() {
        let advisory = advisory_with(
            r#"{
                "subject": "Clarification sought: invoice 2041",
                "body": "Dear Sir/Madam, ...",
                "cc": ["audit-cell@example.gov.in"],
                "attachments": ["invoice-2041.pdf"],
                "priority": "high",
                "followUpDate": "2026-08-21"
            }"#,
        );

        let request = EmailDraftRequest {
            case_data: json!({ "caseId": "AUD-17" }),
            recipient: "Acme Infrastructure Ltd".to_string(),
            tone: None,
            purpose: "seek clarification on excess billing".to_string(),
        };

        let draft = advisory.draft_email(&request).await.unwrap();
        assert_eq!(draft.priority, EmailPriority::High);
        assert_eq!(draft.cc.len(), 1);
    }

    #[tokio::test]
    async fn email_draft_requires_recipient_and_purpose() {
        let advisory = advisory_with("{}");

        let request = EmailDraftRequest {
            case_data: json!({}),
            recipient: String::new(),
            tone: None,
            purpose: "follow up".to_string(),
        };

        let err = advisory.draft_email(&request).await.unwrap_err();
        assert!(matches!(err, AuditError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn policy_qa_passes_json_through() {
        let advisory = advisory_with(r#"{"answer": "Yes", "rule": "GFR 2017 Rule 144"}"#);

        let value = advisory.policy_qa("Is single-bid procurement allowed?").await.unwrap();
        assert_eq!(value["rule"], "GFR 2017 Rule 144");
    }

    #[tokio::test]
    async fn policy_qa_wraps_prose_answers() {
        let advisory = advisory_with("Single-bid procurement requires prior approval.");

        let value = advisory.policy_qa("Is single-bid procurement allowed?").await.unwrap();
        assert_eq!(
            value["answer"],
            "Single-bid procurement requires prior approval."
        );
    }

    #[tokio::test]
    async fn narrative_requires_transaction_data() {
        let advisory = advisory_with("{}");

        let request = NarrativeRequest {
            transaction_data: Value::Null,
            vendor_data: None,
            related_cases: vec![],
        };

        let err = advisory.generate_narrative(&request).await.unwrap_err();
        assert!(matches!(err, AuditError::InvalidInput(_)));
    }
}
