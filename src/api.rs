//! REST API server for the procurement audit pipeline
//!
//! Exposes extraction, reconciliation, intelligence and advisory
//! generation via HTTP endpoints. Integrates with the dashboard frontend.

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;
use uuid::Uuid;

use crate::advisory::AdvisoryGenerator;
use crate::error::AuditError;
use crate::extraction::DocumentExtractor;
use crate::intelligence::CompanyIntelligence;
use crate::models::{EmailDraftRequest, ExtractionRecord, NarrativeRequest, RiskCategory};
use crate::validation::ContractValidator;

/// =============================
/// Request Models
/// =============================

#[derive(Debug, Deserialize)]
pub struct ExtractRequest {
    #[serde(rename = "fileName")]
    pub file_name: String,
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    /// Base64-encoded document bytes.
    pub content: String,
}

/// The dashboard sends either one invoice record or an array of them.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(Box<ExtractionRecord>),
    Many(Vec<ExtractionRecord>),
}

impl OneOrMany {
    fn into_vec(self) -> Vec<ExtractionRecord> {
        match self {
            OneOrMany::One(record) => vec![*record],
            OneOrMany::Many(records) => records,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ValidationRequest {
    #[serde(rename = "contractData")]
    pub contract_data: ExtractionRecord,
    #[serde(rename = "invoiceData")]
    pub invoice_data: OneOrMany,
}

#[derive(Debug, Deserialize)]
pub struct IntelligenceRequest {
    #[serde(rename = "companyName")]
    pub company_name: String,
    #[serde(rename = "searchType", default)]
    pub search_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PolicyQaRequest {
    pub prompt: String,
}

/// =============================
/// Response Wrapper
/// =============================

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
    pub timestamp: String,
}

impl ApiResponse {
    pub fn success<T: Serialize>(data: T) -> Self {
        Self {
            success: true,
            data: serde_json::to_value(data).ok(),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    pub extractor: Arc<DocumentExtractor>,
    pub validator: Arc<ContractValidator>,
    pub intelligence: Arc<CompanyIntelligence>,
    pub advisory: Arc<AdvisoryGenerator>,
}

fn error_status(error: &AuditError) -> StatusCode {
    match error {
        AuditError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        AuditError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn failure(error: &AuditError) -> (StatusCode, Json<ApiResponse>) {
    (error_status(error), Json(ApiResponse::error(error.to_string())))
}

/// =============================
/// Health Endpoint
/// =============================

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// =============================
/// Document Extraction Endpoint
/// =============================

async fn extract_document(
    State(state): State<ApiState>,
    Json(req): Json<ExtractRequest>,
) -> (StatusCode, Json<ApiResponse>) {
    let request_id = Uuid::new_v4();
    info!(%request_id, file = %req.file_name, "Received extraction request");

    let document = match base64::engine::general_purpose::STANDARD.decode(&req.content) {
        Ok(bytes) => bytes,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::error(format!("Invalid base64 content: {}", e))),
            );
        }
    };

    let record = state
        .extractor
        .extract(&document, &req.file_name, &req.mime_type)
        .await;

    (StatusCode::OK, Json(ApiResponse::success(record)))
}

/// =============================
/// Contract Validation Endpoint
/// =============================

async fn validate_contract(
    State(state): State<ApiState>,
    Json(req): Json<ValidationRequest>,
) -> (StatusCode, Json<ApiResponse>) {
    let request_id = Uuid::new_v4();
    let invoices = req.invoice_data.into_vec();
    info!(
        %request_id,
        contract = %req.contract_data.source_file_name,
        invoices = invoices.len(),
        "Received contract validation request"
    );

    match state.validator.reconcile(&req.contract_data, &invoices).await {
        Ok(report) => (StatusCode::OK, Json(ApiResponse::success(report))),
        Err(e) => failure(&e),
    }
}

/// =============================
/// Company Intelligence Endpoint
/// =============================

async fn company_intelligence(
    State(state): State<ApiState>,
    Json(req): Json<IntelligenceRequest>,
) -> (StatusCode, Json<ApiResponse>) {
    let category = RiskCategory::from_search_type(req.search_type.as_deref().unwrap_or_default());
    info!(company = %req.company_name, category = %category, "Received intelligence request");

    match state.intelligence.assess(&req.company_name, category).await {
        Ok(report) => (StatusCode::OK, Json(ApiResponse::success(report))),
        Err(e) => failure(&e),
    }
}

/// =============================
/// Advisory Endpoints
/// =============================

async fn email_draft(
    State(state): State<ApiState>,
    Json(req): Json<EmailDraftRequest>,
) -> (StatusCode, Json<ApiResponse>) {
    match state.advisory.draft_email(&req).await {
        Ok(draft) => (StatusCode::OK, Json(ApiResponse::success(draft))),
        Err(e) => failure(&e),
    }
}

async fn narrative_generator(
    State(state): State<ApiState>,
    Json(req): Json<NarrativeRequest>,
) -> (StatusCode, Json<ApiResponse>) {
    match state.advisory.generate_narrative(&req).await {
        Ok(narrative) => (StatusCode::OK, Json(ApiResponse::success(narrative))),
        Err(e) => failure(&e),
    }
}

async fn policy_qa(
    State(state): State<ApiState>,
    Json(req): Json<PolicyQaRequest>,
) -> (StatusCode, Json<ApiResponse>) {
    match state.advisory.policy_qa(&req.prompt).await {
        Ok(answer) => (StatusCode::OK, Json(ApiResponse::success(answer))),
        Err(e) => failure(&e),
    }
}

/// =============================
/// Router
/// =============================

pub fn create_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/documents/extract", post(extract_document))
        .route("/api/contract-validation", post(validate_contract))
        .route("/api/company-intelligence", post(company_intelligence))
        .route("/api/email-draft", post(email_draft))
        .route("/api/narrative-generator", post(narrative_generator))
        .route("/api/policy-qa", post(policy_qa))
        .with_state(state)
        .layer(CorsLayer::permissive())
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(
    state: ApiState,
    port: u16,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!("API Server listening on http://0.0.0.0:{}", port);
    info!("Local: http://127.0.0.1:{}", port);

    axum::serve(listener, router).await?;

    Ok(())
}
