use anyhow::Context;
use axum::{
    Router,
    extract::{
        DefaultBodyLimit, Multipart, State,
        multipart::MultipartError,
        rejection::JsonRejection,
    },
    http::{HeaderMap, header::AUTHORIZATION},
    response::Json,
    routing::{get, post},
};
use doctormate_directory::Enricher;
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::{
    analysis::{GeminiBackend, OnnxLesionModel, SkinAnalyzer, SymptomAnalyzer},
    config::{DEFAULT_MAX_UPLOAD_BYTES, ServiceConfig},
    error::AnalysisError,
    knowledge::KnowledgeBase,
    models::{ApiResponse, SkinAnalysis, SymptomAnalysis, SymptomsRequest},
    preprocess::preprocess_image,
};

type ApiResult<T> = Result<Json<ApiResponse<T>>, AnalysisError>;

const SERVICE_NAME: &str = "DoctorMate AI";

/// Long-lived services shared by every request.
#[derive(Clone)]
pub struct AppState {
    pub skin: Arc<SkinAnalyzer>,
    pub symptoms: Arc<SymptomAnalyzer>,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(skin: SkinAnalyzer, symptoms: SymptomAnalyzer) -> Self {
        Self {
            skin: Arc::new(skin),
            symptoms: Arc::new(symptoms),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    pub fn with_max_upload_bytes(mut self, max_upload_bytes: usize) -> Self {
        self.max_upload_bytes = max_upload_bytes;
        self
    }
}

/// Loads every long-lived service described by `config` and wires the router.
pub fn create_app(config: &ServiceConfig) -> anyhow::Result<Router> {
    let app_state = create_app_state(config)?;
    Ok(build_router(app_state))
}

fn create_app_state(config: &ServiceConfig) -> anyhow::Result<AppState> {
    let knowledge = match &config.skin_rules_path {
        Some(path) => KnowledgeBase::load(path)?,
        None => KnowledgeBase::bundled()?,
    };
    info!(entries = knowledge.len(), "Skin knowledge base loaded");

    let model = OnnxLesionModel::load(&config.model_path)?;
    let enricher = Enricher::new(config.directory_url.as_str(), config.doctor_limit)
        .context("failed to build DoctorMate HTTP client")?;
    let backend = GeminiBackend::new(&config.gemini_api_key, &config.gemini_model);

    let skin = SkinAnalyzer::new(Arc::new(model), knowledge, enricher.clone());
    let symptoms = SymptomAnalyzer::new(Arc::new(backend), enricher);

    Ok(AppState::new(skin, symptoms).with_max_upload_bytes(config.max_upload_bytes))
}

pub fn build_router(app_state: AppState) -> Router {
    let body_limit = app_state.max_upload_bytes;

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/ai/skin/check", post(skin_check))
        .route("/ai/symptoms/check", post(symptoms_check))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

async fn root() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": SERVICE_NAME,
        "endpoints": ["/ai/skin/check", "/ai/symptoms/check"]
    }))
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn skin_check(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> ApiResult<SkinAnalysis> {
    let token = bearer_token(&headers);
    let upload = read_file_field(multipart).await?;

    info!(
        bytes = upload.len(),
        authenticated = token.is_some(),
        "Received skin lesion image"
    );

    let input = preprocess_image(&upload)?;
    let prediction = state.skin.predict(input, token).await?;

    Ok(Json(ApiResponse::ok(
        "Skin lesion analysis completed successfully",
        prediction,
    )))
}

async fn symptoms_check(
    State(state): State<AppState>,
    headers: HeaderMap,
    request: Result<Json<SymptomsRequest>, JsonRejection>,
) -> ApiResult<SymptomAnalysis> {
    let Json(request) = request.map_err(|e| AnalysisError::InvalidInput(e.body_text()))?;
    let token = bearer_token(&headers);

    info!(authenticated = token.is_some(), "Received symptoms check");

    let analysis = state.symptoms.analyze(&request.symptoms, token).await?;

    Ok(Json(ApiResponse::ok(
        "Symptom analysis completed successfully",
        analysis,
    )))
}

/// Returns the bytes of the multipart field named `file`, ignoring any other fields.
async fn read_file_field(mut multipart: Multipart) -> Result<Vec<u8>, AnalysisError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(upload_error)?
    {
        if field.name() == Some("file") {
            let bytes = field.bytes().await.map_err(upload_error)?;
            if bytes.is_empty() {
                return Err(AnalysisError::MissingFile);
            }
            return Ok(bytes.to_vec());
        }
    }
    Err(AnalysisError::MissingFile)
}

fn upload_error(e: MultipartError) -> AnalysisError {
    AnalysisError::Upload {
        status: e.status(),
        detail: e.body_text(),
    }
}

/// Extracts the token from `Authorization: Bearer <token>`, if present and non-empty.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(auth: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(auth).unwrap());
        headers
    }

    #[test]
    fn bearer_token_is_extracted() {
        assert_eq!(bearer_token(&headers_with("Bearer abc.def")), Some("abc.def"));
        assert_eq!(bearer_token(&headers_with("bearer xyz")), Some("xyz"));
    }

    #[test]
    fn missing_or_blank_token_is_none() {
        assert_eq!(bearer_token(&HeaderMap::new()), None);
        assert_eq!(bearer_token(&headers_with("Bearer ")), None);
        assert_eq!(bearer_token(&headers_with("Basic dXNlcjpwYXNz")), None);
        assert_eq!(bearer_token(&headers_with("token-without-scheme")), None);
    }
}
