use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chat::ChatError;
use serde_json::{Value, json};

/// Error returned by HTTP handlers, rendered as the JSON error envelope.
///
/// The rendered response also carries a copy of the error in its extensions
/// so [`crate::correlation::correlate`] can stamp the correlation id into the
/// body.
#[derive(Debug, Clone)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub category: &'static str,
    pub message: String,
    pub retryable: bool,
    /// Request field that failed validation.
    pub field: Option<String>,
}

impl ApiError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code: "invalid_argument",
            category: "validation",
            message: message.into(),
            retryable: false,
            field: Some(field.to_string()),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: "internal",
            category: "server_error",
            message: message.into(),
            retryable: true,
            field: None,
        }
    }

    /// Attach the offending request field.
    pub fn with_field(mut self, field: &str) -> Self {
        self.field = Some(field.to_string());
        self
    }

    pub fn body(&self, correlation_id: Option<&str>) -> Value {
        let mut error = json!({
            "code": self.code,
            "category": self.category,
            "message": self.message,
            "retryable": self.retryable,
            "correlation_id": correlation_id,
        });
        if let Some(field) = &self.field {
            error["details"] = json!({ "field": field });
        }
        json!({ "error": error })
    }

    pub fn render(&self, correlation_id: Option<&str>) -> Response {
        let mut res = (self.status, Json(self.body(correlation_id))).into_response();
        res.extensions_mut().insert(self.clone());
        res
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        let (status, category) = match &err {
            ChatError::InvalidArgument(_) | ChatError::InvalidPath { .. } => {
                (StatusCode::BAD_REQUEST, "validation")
            }
            ChatError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            ChatError::NoActiveModel => (StatusCode::CONFLICT, "conflict"),
            ChatError::LoadFailure { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "server_error"),
            ChatError::GenerationFailure(_) => (StatusCode::BAD_GATEWAY, "upstream"),
        };
        Self {
            status,
            code: err.kind(),
            category,
            message: err.to_string(),
            retryable: err.is_retryable(),
            field: None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.render(None)
    }
}
