mod config;
mod error;
mod models;
mod services;

use axum::{
    Router,
    extract::{State, rejection::JsonRejection},
    response::{Html, IntoResponse, Json},
    routing::{get, post},
};
use http::{HeaderValue, header};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{EnvFilter, fmt};

use config::Config;
use error::EbookError;
use models::{EbookRequest, EbookResponse, ExportRequest};
use services::llm::{CompletionClient, LLMClient};
use services::pipeline::EbookPipeline;

#[derive(Clone)]
struct AppState {
    llm_client: Arc<dyn CompletionClient>,
    config: Arc<Config>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env()?;
    let llm_client = Arc::new(LLMClient::new(&config)?);

    let bind_addr = config.bind_addr.clone();
    let app_state = AppState {
        llm_client,
        config: Arc::new(config),
    };

    let listener = TcpListener::bind(&bind_addr).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, app(app_state)).await?;

    Ok(())
}

fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .route("/create_ebook", post(create_ebook))
        .route("/export", post(export_ebook))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::AllowMethods::any())
                .allow_headers(tower_http::cors::AllowHeaders::any()),
        )
}

async fn index() -> Html<&'static str> {
    Html(
        r#"
    <!DOCTYPE html>
    <html>
    <head>
        <title>Ebook Writer Service</title>
        <meta charset="utf-8">
        <style>
            body { font-family: Arial, sans-serif; margin: 40px; }
            .info-box { background-color: #f0f8ff; padding: 20px; border-radius: 8px; margin: 20px 0; }
            .endpoint { background-color: #f5f5f5; padding: 10px; margin: 10px 0; border-radius: 4px; font-family: monospace; }
        </style>
    </head>
    <body>
        <h1>Ebook Writer Service</h1>

        <div class="info-box">
            <h2>Service Information</h2>
            <p>This service writes a complete ebook from a title and a short description.</p>
            <p>It outlines the chapters, then drafts them one by one, keeping a running summary so each chapter follows on from the last.</p>
        </div>

        <h2>Available Endpoints:</h2>
        <div class="endpoint">GET / - This information page</div>
        <div class="endpoint">GET /health - Health check</div>
        <div class="endpoint">POST /create_ebook - Write an ebook and return it as HTML</div>
        <div class="endpoint">POST /export - Convert returned HTML into an EPUB download</div>

        <h2>How to Use:</h2>
        <p>POST JSON to /create_ebook with <code>title</code>, optional <code>description</code>,
        <code>number_of_chapters</code>, <code>words_per_chapter</code>, optional <code>model</code>
        and optional <code>api_key</code>. The reply carries <code>ebook_content</code>.</p>
        <p>POST <code>ebook_content</code> and a <code>file_name</code> to /export to download the book.</p>
    </body>
    </html>
    "#,
    )
}

async fn health_check() -> &'static str {
    "OK"
}

async fn create_ebook(
    State(state): State<AppState>,
    payload: Result<Json<EbookRequest>, JsonRejection>,
) -> Result<Json<EbookResponse>, EbookError> {
    let Json(request) = payload.map_err(|e| EbookError::Validation(e.body_text()))?;
    let job = request.validate(&state.config.default_model)?;

    let output = EbookPipeline::new(&job, state.llm_client.as_ref())
        .run()
        .await?;

    Ok(Json(EbookResponse {
        ebook_content: output.ebook_content,
    }))
}

async fn export_ebook(
    payload: Result<Json<ExportRequest>, JsonRejection>,
) -> Result<impl IntoResponse, EbookError> {
    let Json(request) = payload.map_err(|e| EbookError::Validation(e.body_text()))?;

    let exported = tokio::task::spawn_blocking(move || {
        services::export::export_epub(
            &request.ebook_content,
            &request.file_name,
            request.title.as_deref(),
        )
    })
    .await
    .map_err(|e| EbookError::Export(e.to_string()))??;

    let disposition = HeaderValue::from_str(&format!(
        "attachment; filename=\"{}\"",
        exported.file_name
    ))
    .unwrap_or_else(|_| HeaderValue::from_static("attachment; filename=\"ebook.epub\""));

    Ok((
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/epub+zip"),
            ),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        exported.bytes,
    ))
}
