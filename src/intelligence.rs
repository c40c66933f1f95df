//! Entity risk aggregator
//!
//! Aggregates free-text intelligence about a vendor/company into a fixed
//! risk schema with banded scoring. Unlike a compliance ruling, this
//! output is advisory: when the generation step produces text the schema
//! cannot coerce, the result degrades to the raw text for human review
//! instead of failing hard.

use crate::error::AuditError;
use crate::models::{
    ComplianceRiskReport, GeneralRiskReport, MisconductRiskReport, RiskCategory, RiskReport,
    UnparsedIntelligence,
};
use crate::structured::StructuredClient;
use crate::Result;
use serde_json::{json, Value};
use tracing::{info, warn};

pub struct CompanyIntelligence {
    client: StructuredClient,
}

impl CompanyIntelligence {
    pub fn new(client: StructuredClient) -> Self {
        Self { client }
    }

    /// Assess one company under one report category.
    ///
    /// Transport and timeout failures surface as errors, there is no raw
    /// text to fall back to. Coercion failures degrade to
    /// [`RiskReport::Unparsed`].
    pub async fn assess(&self, company_name: &str, category: RiskCategory) -> Result<RiskReport> {
        if company_name.trim().is_empty() {
            return Err(AuditError::InvalidInput(
                "company name is required".to_string(),
            ));
        }

        let schema = category_schema(category);
        let prompt = build_prompt(company_name, category, &schema)?;

        let raw = self.client.complete(&prompt).await?;

        match self.client.coerce(&raw, &schema) {
            Ok(value) => {
                let report = typed_report(value, category)?;
                info!(company = company_name, category = %category, "Risk report parsed");
                Ok(report)
            }
            Err(
                AuditError::NoStructuredOutput
                | AuditError::MalformedOutput(_)
                | AuditError::SchemaViolation(_),
            ) => {
                warn!(
                    company = company_name,
                    category = %category,
                    "Risk report did not conform to schema, degrading to raw text"
                );
                Ok(RiskReport::Unparsed(UnparsedIntelligence {
                    company_name: company_name.to_string(),
                    parsed: false,
                    raw_text: raw,
                }))
            }
            Err(other) => Err(other),
        }
    }
}

fn build_prompt(company_name: &str, category: RiskCategory, schema: &Value) -> Result<String> {
    let request = match category {
        RiskCategory::Compliance => format!(
            "Provide a comprehensive compliance report for \"{}\". Include regulatory \
             compliance status, blacklists, legal cases, certifications, audit findings, \
             and news items. Estimate a risk score from 0-100.",
            company_name
        ),
        RiskCategory::Misconduct => format!(
            "Search for any misconduct, fraud, or suspicious activities related to \"{}\". \
             Include fraud cases, corruption scandals, financial irregularities, complaints, \
             and investigations. Assess severity.",
            company_name
        ),
        RiskCategory::General => format!(
            "Provide comprehensive information about \"{}\". Include company overview, \
             financial health, reputation, government contracts, and risk indicators. \
             Specifically include verification status for GST and PAN if available. \
             Estimate an overall risk score from 0-100.",
            company_name
        ),
    };

    let schema_text = serde_json::to_string_pretty(schema)?;

    Ok(format!(
        "{request}\n\nReturn a single JSON object conforming to this JSON Schema:\n{schema_text}"
    ))
}

fn string_list() -> Value {
    json!({ "type": "array", "items": { "type": "string" } })
}

fn category_schema(category: RiskCategory) -> Value {
    match category {
        RiskCategory::General => json!({
            "type": "object",
            "properties": {
                "companyName": { "type": "string" },
                "overview": { "type": "string" },
                "financial_health": { "type": "string" },
                "reputation": { "type": "string" },
                "gst_pan_status": { "type": "string" },
                "contracts": string_list(),
                "risk_indicators": string_list(),
                "news": string_list(),
                "overall_risk_score": { "type": "integer", "minimum": 0, "maximum": 100 }
            },
            "required": [
                "companyName", "overview", "financial_health", "reputation",
                "contracts", "risk_indicators", "news", "overall_risk_score"
            ]
        }),
        RiskCategory::Compliance => json!({
            "type": "object",
            "properties": {
                "companyName": { "type": "string" },
                "compliance_status": { "type": "string" },
                "blacklists": string_list(),
                "legal_cases": string_list(),
                "certifications": string_list(),
                "audit_findings": string_list(),
                "news_items": string_list(),
                "overall_risk_score": { "type": "integer", "minimum": 0, "maximum": 100 },
                "recommendation": { "type": "string" }
            },
            "required": [
                "companyName", "compliance_status", "blacklists", "legal_cases",
                "certifications", "audit_findings", "news_items",
                "overall_risk_score", "recommendation"
            ]
        }),
        RiskCategory::Misconduct => json!({
            "type": "object",
            "properties": {
                "companyName": { "type": "string" },
                "fraud_cases": string_list(),
                "corruption": string_list(),
                "financial_issues": string_list(),
                "complaints": string_list(),
                "investigations": string_list(),
                "court_cases": string_list(),
                "severity": { "enum": ["low", "medium", "high", "critical"] },
                "summary": { "type": "string" }
            },
            "required": [
                "companyName", "fraud_cases", "corruption", "financial_issues",
                "complaints", "investigations", "court_cases", "severity", "summary"
            ]
        }),
    }
}

fn typed_report(value: Value, category: RiskCategory) -> Result<RiskReport> {
    let report = match category {
        RiskCategory::General => {
            RiskReport::General(serde_json::from_value::<GeneralRiskReport>(value)?)
        }
        RiskCategory::Compliance => {
            RiskReport::Compliance(serde_json::from_value::<ComplianceRiskReport>(value)?)
        }
        RiskCategory::Misconduct => {
            RiskReport::Misconduct(serde_json::from_value::<MisconductRiskReport>(value)?)
        }
    };
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Severity;
    use crate::structured::test_support::ScriptedModel;
    use std::sync::Arc;

    fn intelligence_with(response: &str) -> (CompanyIntelligence, Arc<ScriptedModel>) {
        let model = Arc::new(ScriptedModel::new(response));
        let intelligence = CompanyIntelligence::new(StructuredClient::new(model.clone()));
        (intelligence, model)
    }

    #[tokio::test]
    async fn empty_company_name_fails_before_any_call() {
        let (intelligence, model) = intelligence_with("{}");

        let err = intelligence
            .assess("  ", RiskCategory::General)
            .await
            .unwrap_err();

        assert!(matches!(err, AuditError::InvalidInput(_)));
        assert_eq!(model.call_count(), 0);
    }

    #[tokio::test]
    async fn misconduct_report_is_typed_and_banded() {
        let (intelligence, _model) = intelligence_with(
            r#"{
                "companyName": "Acme Ltd",
                "fraud_cases": ["2019 tender collusion", "2023 shell billing"],
                "corruption": [],
                "financial_issues": ["delayed statutory filings"],
                "complaints": [],
                "investigations": ["ED inquiry ongoing"],
                "court_cases": [],
                "severity": "high",
                "summary": "Two substantiated fraud cases on record"
            }"#,
        );

        let report = intelligence
            .assess("Acme Ltd", RiskCategory::Misconduct)
            .await
            .unwrap();

        match report {
            RiskReport::Misconduct(r) => {
                assert_eq!(r.severity, Severity::High);
                assert_eq!(r.fraud_cases.len(), 2);
                assert_eq!(r.company_name, "Acme Ltd");
            }
            other => panic!("expected misconduct report, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn general_report_tolerates_missing_gst_pan_status() {
        let (intelligence, _model) = intelligence_with(
            r#"{
                "companyName": "Bharat Traders",
                "overview": "Mid-size civil works contractor",
                "financial_health": "stable",
                "reputation": "mixed",
                "contracts": ["NH-48 resurfacing"],
                "risk_indicators": [],
                "news": [],
                "overall_risk_score": 35
            }"#,
        );

        let report = intelligence
            .assess("Bharat Traders", RiskCategory::General)
            .await
            .unwrap();

        match report {
            RiskReport::General(r) => {
                assert_eq!(r.overall_risk_score, 35);
                assert!(r.gst_pan_status.is_none());
            }
            other => panic!("expected general report, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn unstructured_response_degrades_instead_of_failing() {
        let raw = "I could not find reliable records for this company.";
        let (intelligence, _model) = intelligence_with(raw);

        let report = intelligence
            .assess("Ghost Supplies", RiskCategory::Compliance)
            .await
            .unwrap();

        assert!(!report.is_parsed());
        match report {
            RiskReport::Unparsed(r) => {
                assert!(!r.parsed);
                assert_eq!(r.raw_text, raw);
                assert_eq!(r.company_name, "Ghost Supplies");
            }
            other => panic!("expected degraded report, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn out_of_band_severity_degrades_to_raw_text() {
        let (intelligence, _model) = intelligence_with(
            r#"{
                "companyName": "Acme Ltd",
                "fraud_cases": [],
                "corruption": [],
                "financial_issues": [],
                "complaints": [],
                "investigations": [],
                "court_cases": [],
                "severity": "catastrophic",
                "summary": "n/a"
            }"#,
        );

        let report = intelligence
            .assess("Acme Ltd", RiskCategory::Misconduct)
            .await
            .unwrap();

        assert!(matches!(report, RiskReport::Unparsed(_)));
    }
}
