//! Inkpost - upload a photo of handwriting, transcribe it with a multimodal
//! model, optionally summarize or rewrite the text, export the result.

mod error;
mod export;
mod image_prep;
mod model;
mod prompts;
mod upload;

use anyhow::Context;
use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::header,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use error::ApiError;
use model::{ModelClient, OpenRouterClient};
use prompts::Mode;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const INDEX_HTML: &str = include_str!("../static/index.html");

/// Application state shared across handlers.
#[derive(Clone)]
struct AppState {
    model: Arc<dyn ModelClient>,
    upload_dir: Arc<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "inkpost=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let state = AppState {
        model: Arc::new(OpenRouterClient::from_env()),
        upload_dir: Arc::new(std::env::temp_dir()),
    };

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!("Server listening on http://0.0.0.0:{}", port);
    axum::serve(listener, app(state)).await?;

    Ok(())
}

/// Build the router. Non-POST requests to the API routes get a 405 with an
/// `Allow: POST` header from the method router itself.
fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/extract", post(extract))
        .route("/api/summarize", post(summarize))
        .route("/api/export", post(export_pdf))
        .layer(DefaultBodyLimit::max(25 * 1024 * 1024)) // 25MB
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ============================================================================
// Handlers
// ============================================================================

/// Serve the embedded single-page client.
async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

#[derive(Serialize)]
struct TextResponse {
    text: String,
}

/// Transcribe handwriting from an uploaded photo.
///
/// The upload is spooled to a temp file during multipart parsing; its guard
/// deletes the file on every exit path. The image always goes through the
/// fixed grayscale + contrast + PNG pipeline before the model sees it.
async fn extract(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<TextResponse>, ApiError> {
    let form = upload::parse_form(multipart, &state.upload_dir).await?;
    info!(
        "Received upload: {} (language hint: {:?})",
        form.file.file_name(),
        form.language
    );

    let raw = form
        .file
        .read()
        .await
        .context("Failed to read spooled upload")?;
    let png = image_prep::normalize(&raw)?;
    let prompt = prompts::extraction_prompt(form.language.as_deref());

    let text = state.model.generate(prompt, Some(&png)).await.map_err(|e| {
        error!("Extraction failed: {}", e);
        ApiError::Internal(e)
    })?;

    Ok(Json(TextResponse { text }))
}

#[derive(Deserialize)]
struct TransformRequest {
    #[serde(default)]
    text: String,
    #[serde(default)]
    mode: String,
}

/// Summarize or rewrite already-transcribed text.
async fn summarize(
    State(state): State<AppState>,
    Json(req): Json<TransformRequest>,
) -> Result<Json<TextResponse>, ApiError> {
    if req.text.trim().is_empty() {
        return Err(ApiError::BadRequest("Missing text to transform".into()));
    }
    let mode = Mode::parse(&req.mode).ok_or_else(|| {
        ApiError::BadRequest(format!(
            "Invalid mode: {:?} (expected \"summarize\" or \"rewrite\")",
            req.mode
        ))
    })?;

    let prompt = prompts::transform_prompt(mode, &req.text);
    let text = state.model.generate(&prompt, None).await.map_err(|e| {
        error!("Transform failed: {}", e);
        ApiError::Internal(e)
    })?;

    Ok(Json(TextResponse { text }))
}

#[derive(Deserialize)]
struct ExportRequest {
    #[serde(default)]
    text: String,
}

/// Lay the transcription out as a paginated PDF and hand it back as a
/// download. The text never leaves the application.
async fn export_pdf(Json(req): Json<ExportRequest>) -> Result<Response, ApiError> {
    if req.text.trim().is_empty() {
        return Err(ApiError::BadRequest("Missing text to export".into()));
    }
    let pdf = export::render_pdf(&req.text)?;
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"transcription.pdf\"",
            ),
        ],
        pdf,
    )
        .into_response())
}

// ============================================================================
// Endpoint tests
// ============================================================================
