use procurement_audit_engine::{
    extraction::{DocumentExtractor, LocalTextProvider},
    intelligence::CompanyIntelligence,
    models::RiskCategory,
    structured::{GenerativeModel, StructuredClient},
    validation::ContractValidator,
    Result,
};
use std::sync::Arc;
use tracing::info;

/// Scripted backend for offline demo runs (no network, no credentials).
struct ScriptedAuditModel {
    response: &'static str,
}

#[async_trait::async_trait]
impl GenerativeModel for ScriptedAuditModel {
    async fn complete(&self, _instruction: &str) -> Result<String> {
        Ok(self.response.to_string())
    }
}

const SCRIPTED_RECONCILIATION: &str = r#"{
  "isCompliant": false,
  "complianceScore": 45,
  "discrepancies": [
    {
      "type": "overbilling",
      "severity": "critical",
      "description": "Invoice total exceeds the contracted amount by 50%",
      "contractValue": "₹100000",
      "invoiceValue": "₹150000",
      "financialImpact": "₹50000"
    }
  ],
  "authorizedAmount": "₹100000",
  "invoicedAmount": "₹150000",
  "excessCharged": "₹50000",
  "recommendations": ["Withhold payment pending vendor clarification"],
  "summary": "Material overbilling detected against contract terms"
}"#;

const SCRIPTED_INTELLIGENCE: &str = r#"{
  "companyName": "Acme Infrastructure Ltd",
  "fraud_cases": ["2019 tender collusion inquiry"],
  "corruption": [],
  "financial_issues": ["repeated late statutory filings"],
  "complaints": [],
  "investigations": [],
  "court_cases": [],
  "severity": "medium",
  "summary": "One historic fraud inquiry, otherwise unremarkable"
}"#;

const SAMPLE_CONTRACT: &str = "\
WORKS CONTRACT 2026/PWD/117
Date: 2026-01-15
Contractor: Acme Infrastructure Ltd
Scope: road resurfacing, 4.2 km
Total amount: ₹100000
";

const SAMPLE_INVOICE: &str = "\
TAX INVOICE 2041
Date: 2026-03-14
Vendor: Acme Infrastructure Ltd
Item: road resurfacing, 4.2 km
Grand Total: ₹150000
";

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    info!("Procurement Audit Engine demo starting");

    // Extraction: offline chain only
    let extractor = DocumentExtractor::new(vec![Arc::new(LocalTextProvider)]);

    let contract = extractor
        .extract(SAMPLE_CONTRACT.as_bytes(), "contract-117.txt", "text/plain")
        .await;
    let invoice = extractor
        .extract(SAMPLE_INVOICE.as_bytes(), "invoice-2041.txt", "text/plain")
        .await;

    info!(
        vendor = %contract.vendor_name,
        amount = contract.total_amount,
        method = %contract.extraction_method,
        "Contract extracted"
    );
    info!(
        vendor = %invoice.vendor_name,
        amount = invoice.total_amount,
        method = %invoice.extraction_method,
        "Invoice extracted"
    );

    // Reconciliation against a scripted generation backend
    let validator = ContractValidator::new(StructuredClient::new(Arc::new(ScriptedAuditModel {
        response: SCRIPTED_RECONCILIATION,
    })));

    let report = validator.reconcile(&contract, &[invoice]).await?;

    info!(
        compliant = report.is_compliant,
        score = report.compliance_score,
        discrepancies = report.discrepancies.len(),
        excess = %report.excess_charged,
        "Reconciliation complete"
    );
    for discrepancy in &report.discrepancies {
        info!(
            kind = discrepancy.kind.as_str(),
            severity = %discrepancy.severity,
            impact = %discrepancy.financial_impact,
            "Discrepancy"
        );
    }

    // Vendor intelligence against a scripted backend
    let intelligence = CompanyIntelligence::new(StructuredClient::new(Arc::new(
        ScriptedAuditModel {
            response: SCRIPTED_INTELLIGENCE,
        },
    )));

    let risk = intelligence
        .assess("Acme Infrastructure Ltd", RiskCategory::Misconduct)
        .await?;

    info!(
        company = risk.company_name(),
        parsed = risk.is_parsed(),
        "Risk assessment complete"
    );

    println!("\n{}", serde_json::to_string_pretty(&report)?);
    println!("\n{}", serde_json::to_string_pretty(&risk)?);

    Ok(())
}
