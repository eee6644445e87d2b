//! Known model artifacts.
//!
//! Every successful [`ModelRegistry::register`] produces a new [`ModelEntry`]
//! with an id derived from the artifact's file stem. Registering the same path
//! twice yields two entries; ids are never reused within a process.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::info;

use crate::error::{ChatError, Result};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ModelEntry {
    pub id: String,
    pub path: PathBuf,
    pub display_name: String,
    /// Context window requested when the model is loaded without an override.
    pub context_size: u32,
    pub file_size_bytes: u64,
    pub registered_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelStatus {
    Available,
    Unavailable,
}

/// A registry entry together with whether its artifact is still on disk.
#[derive(Clone, Debug, Serialize)]
pub struct ModelListing {
    #[serde(flatten)]
    pub entry: ModelEntry,
    pub status: ModelStatus,
}

pub struct ModelRegistry {
    models: RwLock<HashMap<String, ModelEntry>>,
    default_context_size: u32,
}

impl ModelRegistry {
    pub fn new(default_context_size: u32) -> Self {
        Self {
            models: RwLock::new(HashMap::new()),
            default_context_size,
        }
    }

    /// Record the artifact at `path` under a freshly allocated id.
    ///
    /// A blank `display_name` falls back to the file stem.
    pub async fn register(
        &self,
        path: impl AsRef<Path>,
        display_name: Option<&str>,
    ) -> Result<ModelEntry> {
        let raw = path.as_ref();
        if raw.as_os_str().is_empty() {
            return Err(ChatError::InvalidArgument("model path cannot be empty".into()));
        }
        let path: PathBuf = raw.components().collect();
        let file_size_bytes = check_readable(&path).await?;

        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let display_name = match display_name.map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => stem.clone(),
        };
        let base = sanitize_model_id(&stem);

        let mut models = self.models.write().await;
        let id = unique_id(&models, base);
        let entry = ModelEntry {
            id: id.clone(),
            path,
            display_name,
            context_size: self.default_context_size,
            file_size_bytes,
            registered_at: Utc::now(),
        };
        models.insert(id, entry.clone());
        info!(id = %entry.id, path = %entry.path.display(), "model registered");
        Ok(entry)
    }

    pub async fn get(&self, id: &str) -> Result<ModelEntry> {
        self.models
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| ChatError::NotFound(id.to_string()))
    }

    /// All entries sorted by display name, each with its current availability.
    pub async fn list(&self) -> Vec<ModelListing> {
        let entries: Vec<ModelEntry> = self.models.read().await.values().cloned().collect();
        let mut out = Vec::with_capacity(entries.len());
        for entry in entries {
            let status = match tokio::fs::metadata(&entry.path).await {
                Ok(_) => ModelStatus::Available,
                Err(_) => ModelStatus::Unavailable,
            };
            out.push(ModelListing { entry, status });
        }
        out.sort_by(|a, b| {
            a.entry
                .display_name
                .cmp(&b.entry.display_name)
                .then_with(|| a.entry.id.cmp(&b.entry.id))
        });
        out
    }

    pub async fn len(&self) -> usize {
        self.models.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.models.read().await.is_empty()
    }
}

/// Ensure `path` is a readable regular file and return its size.
async fn check_readable(path: &Path) -> Result<u64> {
    let invalid = |reason: String| ChatError::InvalidPath {
        path: path.to_path_buf(),
        reason,
    };
    let meta = tokio::fs::metadata(path)
        .await
        .map_err(|e| invalid(e.to_string()))?;
    if !meta.is_file() {
        return Err(invalid("not a regular file".into()));
    }
    tokio::fs::File::open(path)
        .await
        .map_err(|e| invalid(e.to_string()))?;
    Ok(meta.len())
}

fn unique_id(models: &HashMap<String, ModelEntry>, base: String) -> String {
    if !models.contains_key(&base) {
        return base;
    }
    let mut suffix = 2;
    loop {
        let candidate = format!("{base}-{suffix}");
        if !models.contains_key(&candidate) {
            return candidate;
        }
        suffix += 1;
    }
}

/// Lower-case `input`, replace anything non-alphanumeric with `-` and trim
/// dashes from both ends.
pub fn sanitize_model_id(input: &str) -> String {
    let mapped: String = input
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect();
    let trimmed = mapped.trim_matches('-');
    if trimmed.is_empty() {
        "model".to_string()
    } else {
        trimmed.to_string()
    }
}
