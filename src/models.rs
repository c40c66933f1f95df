//! Core data models for the audit pipeline
//!
//! All of these are transient value objects: constructed by one component,
//! consumed by the immediate caller, never mutated after construction.
//! External JSON field names follow the dashboard contract, hence the
//! serde renames.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;

//
// ================= Extraction =================
//

/// Identifies which provider produced an extraction record.
///
/// Always set, even on total-failure paths, callers never see a record
/// with an undefined method.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ExtractionMethod {
    #[serde(rename = "local-text")]
    LocalText,
    #[serde(rename = "google-vision")]
    GoogleVision,
    /// Terminal sentinel: every provider was exhausted and the document is
    /// deferred to downstream reasoning.
    #[serde(rename = "deferred-analysis")]
    Unresolved,
}

impl ExtractionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionMethod::LocalText => "local-text",
            ExtractionMethod::GoogleVision => "google-vision",
            ExtractionMethod::Unresolved => "deferred-analysis",
        }
    }
}

impl fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One scanned document's normalized facts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionRecord {
    pub source_file_name: String,
    /// May be empty, an empty text with a non-unresolved method means the
    /// provider succeeded but found nothing to read.
    pub extracted_text: String,
    /// May be a placeholder sentinel when no vendor was detected.
    pub vendor_name: String,
    /// Non-negative, currency-agnostic unit.
    pub total_amount: f64,
    pub document_date: NaiveDate,
    pub extraction_method: ExtractionMethod,
    /// Provider-specific response body, kept verbatim for the audit trail.
    pub raw_provider_payload: Option<Value>,
}

//
// ================= Discrepancies =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DiscrepancyType {
    Overbilling,
    UnauthorizedCharge,
    QuantityMismatch,
    PriceVariance,
    TermsViolation,
}

impl DiscrepancyType {
    pub const ALL: [DiscrepancyType; 5] = [
        DiscrepancyType::Overbilling,
        DiscrepancyType::UnauthorizedCharge,
        DiscrepancyType::QuantityMismatch,
        DiscrepancyType::PriceVariance,
        DiscrepancyType::TermsViolation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DiscrepancyType::Overbilling => "overbilling",
            DiscrepancyType::UnauthorizedCharge => "unauthorized_charge",
            DiscrepancyType::QuantityMismatch => "quantity_mismatch",
            DiscrepancyType::PriceVariance => "price_variance",
            DiscrepancyType::TermsViolation => "terms_violation",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.as_str() == value)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| s.as_str() == value)
    }

    fn rank(&self) -> u8 {
        match self {
            Severity::Low => 0,
            Severity::Medium => 1,
            Severity::High => 2,
            Severity::Critical => 3,
        }
    }
}

impl PartialOrd for Severity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Severity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One detected mismatch between contract and invoice.
///
/// Contract/invoice values stay as provider-reported text, source
/// formatting varies too much to coerce them to numbers here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DiscrepancyItem {
    #[serde(rename = "type")]
    pub kind: DiscrepancyType,
    pub severity: Severity,
    pub description: String,
    pub contract_value: String,
    pub invoice_value: String,
    /// Currency-denominated, e.g. "₹50000".
    pub financial_impact: String,
}

/// Result of reconciling one contract against one-or-many invoices.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceReport {
    pub is_compliant: bool,
    /// 0–100 inclusive.
    pub compliance_score: u8,
    /// Insertion order = order returned by the generation step.
    pub discrepancies: Vec<DiscrepancyItem>,
    pub authorized_amount: String,
    pub invoiced_amount: String,
    pub excess_charged: String,
    pub recommendations: Vec<String>,
    pub summary: String,
}

//
// ================= Entity Risk =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RiskCategory {
    General,
    Compliance,
    Misconduct,
}

impl RiskCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskCategory::General => "general",
            RiskCategory::Compliance => "compliance",
            RiskCategory::Misconduct => "misconduct",
        }
    }

    /// Anything outside the closed set falls back to a general lookup,
    /// matching the dashboard's search-type routing.
    pub fn from_search_type(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "compliance" => RiskCategory::Compliance,
            "misconduct" => RiskCategory::Misconduct,
            _ => RiskCategory::General,
        }
    }
}

impl fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeneralRiskReport {
    #[serde(rename = "companyName")]
    pub company_name: String,
    pub overview: String,
    pub financial_health: String,
    pub reputation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gst_pan_status: Option<String>,
    pub contracts: Vec<String>,
    pub risk_indicators: Vec<String>,
    pub news: Vec<String>,
    pub overall_risk_score: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComplianceRiskReport {
    #[serde(rename = "companyName")]
    pub company_name: String,
    pub compliance_status: String,
    pub blacklists: Vec<String>,
    pub legal_cases: Vec<String>,
    pub certifications: Vec<String>,
    pub audit_findings: Vec<String>,
    pub news_items: Vec<String>,
    pub overall_risk_score: u8,
    pub recommendation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MisconductRiskReport {
    #[serde(rename = "companyName")]
    pub company_name: String,
    pub fraud_cases: Vec<String>,
    pub corruption: Vec<String>,
    pub financial_issues: Vec<String>,
    pub complaints: Vec<String>,
    pub investigations: Vec<String>,
    pub court_cases: Vec<String>,
    pub severity: Severity,
    pub summary: String,
}

/// Degraded result: the generation step produced text the schema could not
/// coerce. The raw text is kept for human review, advisory output is still
/// useful to an auditor even unstructured.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UnparsedIntelligence {
    #[serde(rename = "companyName")]
    pub company_name: String,
    pub parsed: bool,
    #[serde(rename = "rawText")]
    pub raw_text: String,
}

/// Category-specific entity intelligence.
///
/// Keyed by company name only, cross-linking to extraction records or
/// compliance reports is a caller concern.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum RiskReport {
    Compliance(ComplianceRiskReport),
    Misconduct(MisconductRiskReport),
    General(GeneralRiskReport),
    Unparsed(UnparsedIntelligence),
}

impl RiskReport {
    pub fn company_name(&self) -> &str {
        match self {
            RiskReport::Compliance(r) => &r.company_name,
            RiskReport::Misconduct(r) => &r.company_name,
            RiskReport::General(r) => &r.company_name,
            RiskReport::Unparsed(r) => &r.company_name,
        }
    }

    pub fn is_parsed(&self) -> bool {
        !matches!(self, RiskReport::Unparsed(_))
    }
}

//
// ================= Advisory =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmailPriority {
    Normal,
    High,
    Urgent,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmailDraft {
    pub subject: String,
    pub body: String,
    pub cc: Vec<String>,
    pub attachments: Vec<String>,
    pub priority: EmailPriority,
    #[serde(rename = "followUpDate")]
    pub follow_up_date: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailDraftRequest {
    #[serde(rename = "caseData")]
    pub case_data: Value,
    pub recipient: String,
    #[serde(default)]
    pub tone: Option<String>,
    pub purpose: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NarrativeRequest {
    #[serde(rename = "transactionData")]
    pub transaction_data: Value,
    #[serde(rename = "vendorData", default)]
    pub vendor_data: Option<Value>,
    #[serde(rename = "relatedCases", default)]
    pub related_cases: Vec<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimelineEvent {
    pub date: String,
    pub event: String,
    pub evidence: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KeyFinding {
    pub finding: String,
    pub evidence: String,
    pub significance: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CaseConnections {
    pub vendors: Vec<String>,
    pub transactions: Vec<String>,
    pub individuals: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FinancialExposure {
    #[serde(rename = "totalAmount")]
    pub total_amount: String,
    #[serde(rename = "potentialLoss")]
    pub potential_loss: String,
    #[serde(rename = "recoveryPotential")]
    pub recovery_potential: String,
}

/// Investigation summary suitable for legal proceedings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InvestigationNarrative {
    #[serde(rename = "executiveSummary")]
    pub executive_summary: String,
    pub timeline: Vec<TimelineEvent>,
    pub narrative: String,
    #[serde(rename = "keyFindings")]
    pub key_findings: Vec<KeyFinding>,
    pub connections: CaseConnections,
    #[serde(rename = "financialImpact")]
    pub financial_impact: FinancialExposure,
    #[serde(rename = "legalAssessment")]
    pub legal_assessment: String,
    pub recommendations: Vec<String>,
    pub attachments: Vec<String>,
}
