use axum::{
    Extension, Json, Router,
    body::Bytes,
    extract::State,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use chat::{ActiveModel, ModelListing, ModelStatus};
use serde::Serialize;
use serde_json::json;
use tracing::{error, info};

use crate::AppState;
use crate::api::{CompleteRequest, RegisterRequest, SelectRequest};
use crate::correlation::{CorrelationId, correlate};
use crate::error::ApiError;

type ApiResult<T> = Result<T, ApiError>;

#[derive(Serialize)]
struct ActiveModelView<'a> {
    id: &'a str,
    path: String,
    display_name: &'a str,
    context_size: u32,
    file_size_bytes: u64,
    loaded_at: String,
}

impl<'a> From<&'a ActiveModel> for ActiveModelView<'a> {
    fn from(active: &'a ActiveModel) -> Self {
        Self {
            id: &active.entry.id,
            path: active.entry.path.display().to_string(),
            display_name: &active.entry.display_name,
            context_size: active.context_size,
            file_size_bytes: active.entry.file_size_bytes,
            loaded_at: active.loaded_at.to_rfc3339(),
        }
    }
}

/// Run `fut` on its own task so a dropped connection cannot cancel it.
async fn detached<F, T>(fut: F) -> ApiResult<T>
where
    F: Future<Output = chat::Result<T>> + Send + 'static,
    T: Send + 'static,
{
    match tokio::spawn(fut).await {
        Ok(res) => res.map_err(ApiError::from),
        Err(e) => {
            error!(error = %e, "request task failed");
            Err(ApiError::internal("request task failed"))
        }
    }
}

pub async fn list_models(State(state): State<AppState>) -> impl IntoResponse {
    let models = state.registry.list().await;
    Json(json!({
        "models": models,
        "active_model_id": state.lifecycle.active_model_id(),
    }))
}

pub async fn register_model(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<impl IntoResponse> {
    let req = RegisterRequest::parse(&body)?;
    let entry = state
        .registry
        .register(&req.path, req.display_name.as_deref())
        .await
        .map_err(|e| ApiError::from(e).with_field("path"))?;
    let listing = ModelListing {
        entry,
        status: ModelStatus::Available,
    };
    Ok((StatusCode::CREATED, Json(json!({ "model": listing }))))
}

pub async fn select_model(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<impl IntoResponse> {
    let req = SelectRequest::parse(&body)?;
    let lifecycle = state.lifecycle.clone();
    let active =
        detached(async move { lifecycle.select(&req.model_id, req.context_size).await }).await?;
    Ok(Json(json!({ "active_model": ActiveModelView::from(&active) })))
}

pub async fn chat_complete(
    State(state): State<AppState>,
    Extension(CorrelationId(cid)): Extension<CorrelationId>,
    body: Bytes,
) -> ApiResult<impl IntoResponse> {
    let req = CompleteRequest::parse(&body)?;
    let chat = state.chat.clone();
    let completion = detached(async move { chat.complete(&req.message).await }).await?;
    info!(
        correlation_id = %cid,
        model_id = %completion.model_id,
        latency_ms = completion.latency.as_millis() as u64,
        "chat completion served"
    );
    Ok(Json(json!({
        "text": completion.text,
        "model_id": completion.model_id,
        "metrics": {
            "latency_ms": completion.latency.as_millis() as u64,
            "context_turns": completion.context_turns,
        },
    })))
}

pub async fn chat_reset(State(state): State<AppState>) -> impl IntoResponse {
    state.chat.reset().await;
    Json(json!({
        "status": "cleared",
        "model_id": state.lifecycle.active_model_id(),
    }))
}

pub async fn chat_history(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({ "turns": state.chat.history().await }))
}

pub async fn healthz() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// Build the application router with the provided state.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/models", get(list_models))
        .route("/api/models/register", post(register_model))
        .route("/api/models/select", post(select_model))
        .route("/api/chat/complete", post(chat_complete))
        .route("/api/chat/reset", post(chat_reset))
        .route("/api/chat/history", get(chat_history))
        .layer(middleware::from_fn(correlate))
        .with_state(state)
}
