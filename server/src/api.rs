//! Typed request bodies, parsed once at the HTTP boundary.
//!
//! Bodies are decoded into a JSON object first and then checked field by
//! field so a validation failure can name the offending field.

use serde_json::{Map, Value};

use crate::error::ApiError;

type Object = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterRequest {
    pub path: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectRequest {
    pub model_id: String,
    pub context_size: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompleteRequest {
    pub message: String,
}

impl RegisterRequest {
    pub fn parse(body: &[u8]) -> Result<Self, ApiError> {
        let obj = object(body)?;
        Ok(Self {
            path: non_empty_string(&obj, "path")?,
            display_name: optional_string(&obj, "display_name")?,
        })
    }
}

impl SelectRequest {
    pub fn parse(body: &[u8]) -> Result<Self, ApiError> {
        let obj = object(body)?;
        Ok(Self {
            model_id: non_empty_string(&obj, "model_id")?,
            context_size: optional_positive(&obj, "context_size")?,
        })
    }
}

impl CompleteRequest {
    pub fn parse(body: &[u8]) -> Result<Self, ApiError> {
        let obj = object(body)?;
        Ok(Self {
            message: non_empty_string(&obj, "message")?,
        })
    }
}

fn object(body: &[u8]) -> Result<Object, ApiError> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(obj)) => Ok(obj),
        _ => Err(ApiError::validation("body", "Body must be a JSON object")),
    }
}

fn non_empty_string(obj: &Object, field: &str) -> Result<String, ApiError> {
    match obj.get(field) {
        Some(Value::String(s)) if s.is_empty() => Err(ApiError::validation(
            field,
            format!("Field '{field}' cannot be empty"),
        )),
        Some(Value::String(s)) => Ok(s.clone()),
        _ => Err(ApiError::validation(
            field,
            format!("Field '{field}' is required and must be a string"),
        )),
    }
}

fn optional_string(obj: &Object, field: &str) -> Result<Option<String>, ApiError> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(ApiError::validation(
            field,
            format!("Field '{field}' must be a string"),
        )),
    }
}

fn optional_positive(obj: &Object, field: &str) -> Result<Option<u32>, ApiError> {
    let value = match obj.get(field) {
        None | Some(Value::Null) => return Ok(None),
        Some(value) => value,
    };
    let Some(n) = value.as_i64() else {
        return Err(ApiError::validation(
            field,
            format!("Field '{field}' must be an integer"),
        ));
    };
    if n <= 0 {
        return Err(ApiError::validation(
            field,
            format!("Field '{field}' must be positive"),
        ));
    }
    u32::try_from(n).map(Some).map_err(|_| {
        ApiError::validation(field, format!("Field '{field}' is too large"))
    })
}
