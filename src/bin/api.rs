use procurement_audit_engine::{
    advisory::AdvisoryGenerator,
    api::{start_server, ApiState},
    extraction::{DocumentExtractor, ExtractionProvider, GoogleVisionProvider, LocalTextProvider},
    gemini::GeminiModel,
    intelligence::CompanyIntelligence,
    structured::StructuredClient,
    validation::ContractValidator,
};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    // Load environment variables
    dotenv::dotenv().ok();

    let gemini_api_key = std::env::var("GEMINI_API_KEY").unwrap_or_else(|_| {
        eprintln!("⚠️  GEMINI_API_KEY not set in .env");
        eprintln!("📌 Reconciliation and intelligence endpoints will fail until it is configured");
        String::new()
    });

    let api_port: u16 = std::env::var("PORT")
        .or_else(|_| std::env::var("API_PORT"))
        .unwrap_or_else(|_| "8080".to_string())
        .parse()?;

    info!("🚀 Procurement Audit Engine - API Server");
    info!("📍 Port: {}", api_port);

    // Cost-ordered extraction chain: free local tier first, cloud OCR
    // only when a key is configured.
    let mut providers: Vec<Arc<dyn ExtractionProvider>> = vec![Arc::new(LocalTextProvider)];
    match GoogleVisionProvider::from_env() {
        Some(vision) => {
            info!("Google Vision provider enabled");
            providers.push(Arc::new(vision));
        }
        None => {
            info!("GOOGLE_VISION_API_KEY not set, running with local extraction only");
        }
    }

    let client = StructuredClient::new(Arc::new(GeminiModel::new(gemini_api_key)));

    let state = ApiState {
        extractor: Arc::new(DocumentExtractor::new(providers)),
        validator: Arc::new(ContractValidator::new(client.clone())),
        intelligence: Arc::new(CompanyIntelligence::new(client.clone())),
        advisory: Arc::new(AdvisoryGenerator::new(client)),
    };

    info!("✅ Pipeline initialized");
    info!("📡 Starting API server...");

    start_server(state, api_port).await?;

    Ok(())
}
