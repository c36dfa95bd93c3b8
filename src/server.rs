//! HTTPサーバー
//!
//! - POST /recognize : multipart の `file` フィールドを受け取り照合結果を返す
//! - GET  /health    : 稼働確認
//! - GET  /categories: 読み込み済みカテゴリ表

use crate::error::Result;
use crate::recognizer::Recognizer;
use axum::{
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use ingredient_recognizer_common::{CategoryTable, Resolution};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{info, warn};

/// アップロードファイルのフィールド名
pub const FILE_FIELD: &str = "file";

#[derive(Clone)]
pub struct AppState {
    pub recognizer: Recognizer,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecognizeResponse {
    pub results: Vec<Resolution>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub categories: usize,
    pub classifier: String,
    /// 照合方針（exact / substring）
    pub policy: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
}

/// ハンドラのエラー応答
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn no_file() -> Self {
        Self::new(StatusCode::BAD_REQUEST, "No file uploaded")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                message: self.message,
            }),
        )
            .into_response()
    }
}

pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/recognize", post(recognize))
        .route("/health", get(health))
        .route("/categories", get(categories))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}

/// サーバーを起動し、Ctrl+C で停止する
pub async fn serve(addr: SocketAddr, state: AppState, max_upload_bytes: usize) -> Result<()> {
    let app = router(state, max_upload_bytes);

    let listener = TcpListener::bind(addr).await?;
    info!("Server is running on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
    }
}

async fn recognize(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> std::result::Result<Json<RecognizeResponse>, ApiError> {
    info!("Received POST request at /recognize");

    let mut multipart = multipart.map_err(|e| {
        warn!(error = %e, "not a multipart request");
        ApiError::no_file()
    })?;

    let image = read_file_field(&mut multipart).await?;
    info!(bytes = image.len(), "File uploaded successfully");

    let results = state.recognizer.recognize(&image).await;
    Ok(Json(RecognizeResponse { results }))
}

/// `file` フィールドを探して中身を返す（空ファイルは未アップロード扱い）
async fn read_file_field(multipart: &mut Multipart) -> std::result::Result<Vec<u8>, ApiError> {
    loop {
        let field = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::new(e.status(), e.body_text()))?;

        let Some(field) = field else {
            return Err(ApiError::no_file());
        };

        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::new(e.status(), e.body_text()))?;

        if bytes.is_empty() {
            return Err(ApiError::no_file());
        }
        return Ok(bytes.to_vec());
    }
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        categories: state.recognizer.table().len(),
        classifier: state.recognizer.classifier_name().to_string(),
        policy: state.recognizer.options().policy.to_string(),
    })
}

async fn categories(State(state): State<AppState>) -> Json<CategoryTable> {
    Json(state.recognizer.table().clone())
}
