//! Discrepancy reconciliation engine
//!
//! Compares one contract record against one-or-many invoice records via
//! the structured generation client and emits a typed compliance report.
//! A failed generation is surfaced verbatim, this module never fabricates
//! compliance data, since that would produce false audit conclusions.

use crate::error::AuditError;
use crate::models::{ComplianceReport, DiscrepancyType, ExtractionRecord, Severity};
use crate::structured::StructuredClient;
use crate::Result;
use serde_json::{json, Value};
use tracing::{info, warn};

pub struct ContractValidator {
    client: StructuredClient,
}

impl ContractValidator {
    pub fn new(client: StructuredClient) -> Self {
        Self { client }
    }

    /// Reconcile a contract against its invoices.
    ///
    /// Requires at least one invoice record; an empty sequence is a
    /// precondition violation and makes no external call. An unresolved
    /// extraction record is valid low-confidence input, not an error.
    pub async fn reconcile(
        &self,
        contract: &ExtractionRecord,
        invoices: &[ExtractionRecord],
    ) -> Result<ComplianceReport> {
        if invoices.is_empty() {
            return Err(AuditError::InvalidInput(
                "at least one invoice record is required".to_string(),
            ));
        }

        let prompt = build_prompt(contract, invoices)?;
        let value = self.client.generate(&prompt, &report_schema()).await?;

        // The generic schema keeps type/severity as plain strings, this is
        // the engine-specific stricter pass over the closed enums. A stray
        // value downgrades the whole call even though the JSON parsed.
        enforce_closed_enums(&value)?;

        let mut report: ComplianceReport = serde_json::from_value(value)
            .map_err(|e| AuditError::SchemaViolation(vec![format!("report shape: {}", e)]))?;

        repair_compliance_flag(&mut report);

        info!(
            compliant = report.is_compliant,
            score = report.compliance_score,
            discrepancies = report.discrepancies.len(),
            "Contract reconciliation complete"
        );

        Ok(report)
    }
}

fn build_prompt(contract: &ExtractionRecord, invoices: &[ExtractionRecord]) -> Result<String> {
    let contract_json = serde_json::to_string_pretty(contract)?;
    let invoices_json = serde_json::to_string_pretty(invoices)?;

    Ok(format!(
        r#"You are a government audit expert. Compare this contract with the invoices and identify discrepancies.

CONTRACT:
{contract_json}

INVOICES:
{invoices_json}

Analyze and return JSON with:
{{
  "isCompliant": boolean,
  "complianceScore": number (0-100),
  "discrepancies": [
    {{
      "type": "overbilling" | "unauthorized_charge" | "quantity_mismatch" | "price_variance" | "terms_violation",
      "severity": "critical" | "high" | "medium" | "low",
      "description": "detailed explanation",
      "contractValue": "value from contract",
      "invoiceValue": "value from invoice",
      "financialImpact": "amount in rupees"
    }}
  ],
  "authorizedAmount": "as per contract",
  "invoicedAmount": "as per invoice",
  "excessCharged": "difference if any",
  "recommendations": ["action items"],
  "summary": "brief overall assessment"
}}"#
    ))
}

/// Generic target schema: shape and primitive types only. The closed enums
/// are enforced separately in [`enforce_closed_enums`].
fn report_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "isCompliant": { "type": "boolean" },
            "complianceScore": { "type": "integer", "minimum": 0, "maximum": 100 },
            "discrepancies": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "type": { "type": "string" },
                        "severity": { "type": "string" },
                        "description": { "type": "string" },
                        "contractValue": { "type": "string" },
                        "invoiceValue": { "type": "string" },
                        "financialImpact": { "type": "string" }
                    },
                    "required": [
                        "type", "severity", "description",
                        "contractValue", "invoiceValue", "financialImpact"
                    ]
                }
            },
            "authorizedAmount": { "type": "string" },
            "invoicedAmount": { "type": "string" },
            "excessCharged": { "type": "string" },
            "recommendations": { "type": "array", "items": { "type": "string" } },
            "summary": { "type": "string" }
        },
        "required": [
            "isCompliant", "complianceScore", "discrepancies",
            "authorizedAmount", "invoicedAmount", "excessCharged",
            "recommendations", "summary"
        ]
    })
}

fn enforce_closed_enums(value: &Value) -> Result<()> {
    let mut violations = Vec::new();

    if let Some(items) = value.get("discrepancies").and_then(Value::as_array) {
        for (index, item) in items.iter().enumerate() {
            let kind = item.get("type").and_then(Value::as_str).unwrap_or_default();
            if DiscrepancyType::parse(kind).is_none() {
                violations.push(format!(
                    "at '/discrepancies/{}/type': '{}' is not a known discrepancy type",
                    index, kind
                ));
            }

            let severity = item
                .get("severity")
                .and_then(Value::as_str)
                .unwrap_or_default();
            if Severity::parse(severity).is_none() {
                violations.push(format!(
                    "at '/discrepancies/{}/severity': '{}' is not a known severity",
                    index, severity
                ));
            }
        }
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(AuditError::SchemaViolation(violations))
    }
}

/// Local consistency repair: a critical or high discrepancy overrides a
/// contradictory `isCompliant: true` from the generator. The weaker
/// "any discrepancy implies non-compliance" property is deliberately not
/// enforced here.
fn repair_compliance_flag(report: &mut ComplianceReport) {
    let material = report
        .discrepancies
        .iter()
        .any(|d| d.severity >= Severity::High);

    if material && report.is_compliant {
        warn!("Generator marked report compliant despite critical/high discrepancies, overriding");
        report.is_compliant = false;
    }
}
