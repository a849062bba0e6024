use std::{io::Cursor, sync::Arc};

use async_trait::async_trait;
use axum::{
    Json, Router,
    body::Body,
    http::{Request, StatusCode, header},
    routing::get,
};
use doctormate_ai::{
    AppState, build_router,
    analysis::{CompletionBackend, LesionModel, SkinAnalyzer, SymptomAnalyzer},
    knowledge::KnowledgeBase,
    preprocess::ImageTensor,
};
use doctormate_directory::{
    Enricher,
    mapper::{CARDIOLOGY, DERMATOLOGY},
};
use image::{ImageFormat, Rgb, RgbImage};
use serde_json::{Value, json};
use tower::ServiceExt;

const BOUNDARY: &str = "doctormate-test-boundary";

/// Scores a lesion by the mean brightness of the image so different inputs give different classes.
struct BrightnessModel;

impl LesionModel for BrightnessModel {
    fn infer(&self, input: &ImageTensor) -> anyhow::Result<Vec<f32>> {
        let mean = input.data.iter().sum::<f32>() / input.data.len() as f32;
        Ok((0..7).map(|i| -((i as f32 / 6.0) - mean).abs() * 4.0).collect())
    }
}

struct FixedReply(&'static str);

#[async_trait]
impl CompletionBackend for FixedReply {
    async fn complete(&self, _prompt: &str) -> anyhow::Result<String> {
        Ok(self.0.to_string())
    }
}

const CHEST_PAIN_REPLY: &str = r#"{
    "possible_diagnosis": "Costochondritis",
    "confidence": 58,
    "severity": "Mild",
    "description": "Inflammation of the cartilage connecting ribs to the breastbone.",
    "recommendations": ["Rest", "Over-the-counter pain relief"],
    "emergency_care": "Go to the emergency room if pain spreads to the arm or jaw.",
    "disclaimer": "This is an AI-generated assessment and not a substitute for professional medical advice. Please consult a healthcare provider for proper diagnosis and treatment."
}"#;

fn app(reply: &'static str, directory_url: &str) -> Router {
    let enricher = Enricher::new(directory_url, 3).unwrap();
    let skin = SkinAnalyzer::new(
        Arc::new(BrightnessModel),
        KnowledgeBase::bundled().unwrap(),
        enricher.clone(),
    );
    let symptoms = SymptomAnalyzer::new(Arc::new(FixedReply(reply)), enricher);
    build_router(AppState::new(skin, symptoms))
}

/// A DoctorMate stand-in that lists every specialty and ten doctors per specialty.
async fn spawn_directory() -> String {
    let router = Router::new()
        .route(
            "/api/Specialties",
            get(|| async {
                Json(json!({
                    "data": [
                        { "id": CARDIOLOGY, "name": "Cardiology", "description": "Heart", "imageUrl": "c.png" },
                        { "id": DERMATOLOGY, "name": "Dermatology", "description": "Skin", "imageUrl": "d.png" }
                    ]
                }))
            }),
        )
        .route(
            "/api/Specialties/{id}/doctors",
            get(|| async {
                let doctors: Vec<Value> = (0..10)
                    .map(|i| json!({ "id": i, "fullName": format!("Dr. {i}"), "consultationFee": 300 }))
                    .collect();
                Json(json!({ "data": { "doctors": doctors } }))
            }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}/api")
}

fn solid_png(colour: [u8; 3]) -> Vec<u8> {
    let image = RgbImage::from_pixel(10, 10, Rgb(colour));
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

fn multipart_body(field: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"lesion.png\"\r\nContent-Type: image/png\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn skin_request(field: &str, bytes: &[u8], token: Option<&str>) -> Request<Body> {
    let mut builder = Request::post("/ai/skin/check").header(
        header::CONTENT_TYPE,
        format!("multipart/form-data; boundary={BOUNDARY}"),
    );
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(multipart_body(field, bytes))).unwrap()
}

fn symptoms_request(body: &str, token: Option<&str>) -> Request<Body> {
    let mut builder =
        Request::post("/ai/symptoms/check").header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn assert_valid_assessment(data: &Value) {
    let confidence = data["confidence"].as_u64().expect("integer confidence");
    assert!(confidence <= 100);
    let severity = data["severity"].as_str().unwrap();
    assert!(["Mild", "Moderate", "Severe"].contains(&severity));
}

#[tokio::test]
async fn root_reports_liveness() {
    let request = Request::get("/").body(Body::empty()).unwrap();
    let (status, body) = send(app(CHEST_PAIN_REPLY, "http://127.0.0.1:9/api"), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["endpoints"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn health_reports_timestamp() {
    let request = Request::get("/health").body(Body::empty()).unwrap();
    let (status, body) = send(app(CHEST_PAIN_REPLY, "http://127.0.0.1:9/api"), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn skin_check_on_solid_png_returns_full_distribution() {
    let app = app(CHEST_PAIN_REPLY, "http://127.0.0.1:9/api");
    let (status, body) = send(app, skin_request("file", &solid_png([180, 120, 90]), None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["code"], 200);
    assert_eq!(body["message"], "Skin lesion analysis completed successfully");

    let data = &body["data"];
    assert!(data["possible_diagnosis"].is_string());
    assert_valid_assessment(data);

    let probabilities = data["additional_info"]["all_probabilities"]
        .as_object()
        .unwrap();
    assert_eq!(probabilities.len(), 7);
    let total: f64 = probabilities.values().map(|v| v.as_f64().unwrap()).sum();
    assert!((total - 100.0).abs() < 0.5, "total was {total}");

    assert_eq!(data["specialty"], json!({}));
    assert_eq!(data["recommended_doctors"], json!([]));
}

#[tokio::test]
async fn skin_check_with_token_adds_dermatology_and_bounded_doctors() {
    let directory = spawn_directory().await;
    let (status, body) = send(
        app(CHEST_PAIN_REPLY, &directory),
        skin_request("file", &solid_png([20, 20, 20]), Some("user-token")),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["specialty"]["id"], DERMATOLOGY);
    assert_eq!(data["specialty"]["name"], "Dermatology");
    assert_eq!(data["recommended_doctors"].as_array().unwrap().len(), 3);
    assert_eq!(data["recommended_doctors"][0]["fullName"], "Dr. 0");
}

#[tokio::test]
async fn skin_check_survives_unreachable_directory() {
    let (status, body) = send(
        app(CHEST_PAIN_REPLY, "http://127.0.0.1:9/api"),
        skin_request("file", &solid_png([250, 240, 230]), Some("user-token")),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["specialty"], json!({}));
    assert_eq!(body["data"]["recommended_doctors"], json!([]));
}

#[tokio::test]
async fn skin_check_without_file_field_is_rejected() {
    let (status, body) = send(
        app(CHEST_PAIN_REPLY, "http://127.0.0.1:9/api"),
        skin_request("picture", &solid_png([1, 2, 3]), None),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains("file"));
}

#[tokio::test]
async fn oversized_upload_is_payload_too_large() {
    let enricher = Enricher::new("http://127.0.0.1:9/api", 3).unwrap();
    let state = AppState::new(
        SkinAnalyzer::new(
            Arc::new(BrightnessModel),
            KnowledgeBase::bundled().unwrap(),
            enricher.clone(),
        ),
        SymptomAnalyzer::new(Arc::new(FixedReply(CHEST_PAIN_REPLY)), enricher),
    )
    .with_max_upload_bytes(1024);

    let (status, body) = send(
        build_router(state),
        skin_request("file", &vec![7u8; 8 * 1024], None),
    )
    .await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn skin_check_with_undecodable_upload_fails() {
    let (status, body) = send(
        app(CHEST_PAIN_REPLY, "http://127.0.0.1:9/api"),
        skin_request("file", b"not really a png", None),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn symptoms_check_without_token_has_empty_enrichment() {
    let (status, body) = send(
        app(CHEST_PAIN_REPLY, "http://127.0.0.1:9/api"),
        symptoms_request(r#"{"symptoms": "chest pain when breathing deeply"}"#, None),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Symptom analysis completed successfully");
    let data = &body["data"];
    assert_eq!(data["possible_diagnosis"], "Costochondritis");
    assert_valid_assessment(data);
    assert_eq!(data["specialty"], json!({}));
    assert_eq!(data["recommended_doctors"], json!([]));
}

#[tokio::test]
async fn symptoms_check_with_token_maps_chest_pain_to_cardiology() {
    let directory = spawn_directory().await;
    let (status, body) = send(
        app(CHEST_PAIN_REPLY, &directory),
        symptoms_request(
            r#"{"symptoms": "chest pain and a small rash on my child"}"#,
            Some("user-token"),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["specialty"]["id"], CARDIOLOGY);
    assert!(body["data"]["recommended_doctors"].as_array().unwrap().len() <= 3);
}

#[tokio::test]
async fn blank_symptoms_are_a_bad_request() {
    let (status, body) = send(
        app(CHEST_PAIN_REPLY, "http://127.0.0.1:9/api"),
        symptoms_request(r#"{"symptoms": "   "}"#, None),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn missing_symptoms_field_is_a_bad_request() {
    let (status, body) = send(
        app(CHEST_PAIN_REPLY, "http://127.0.0.1:9/api"),
        symptoms_request(r#"{"text": "headache"}"#, None),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn malformed_model_reply_is_a_server_error() {
    let (status, body) = send(
        app("Sorry, I can't help with that.", "http://127.0.0.1:9/api"),
        symptoms_request(r#"{"symptoms": "headache"}"#, None),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["detail"].as_str().unwrap().starts_with("Gemini API error"));
}
