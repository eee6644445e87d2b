//! Drives a running chat server through the reset/memory scenario.

use anyhow::{bail, Context};
use serde_json::{json, Value};

pub const FIRST_MESSAGE: &str = "My arbitrary favorite color is neon magenta.";
pub const FOLLOW_UP: &str = "What is my favorite color?";

pub struct Driver {
    http: reqwest::Client,
    base_url: String,
}

impl Driver {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// POST `body` to `path` and return the decoded response, failing on
    /// any non-2xx status.
    pub async fn post(&self, path: &str, body: Option<Value>) -> anyhow::Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.http.post(&url);
        if let Some(body) = body {
            req = req.json(&body);
        }
        let res = req.send().await.with_context(|| format!("POST {url}"))?;
        let status = res.status();
        let text = res.text().await?;
        if !status.is_success() {
            bail!("POST {path} returned {status}: {text}");
        }
        serde_json::from_str(&text).with_context(|| format!("decoding response of POST {path}"))
    }
}

/// Responses collected while running [`run_scenario`].
#[derive(Debug)]
pub struct Transcript {
    pub register: Value,
    pub select: Value,
    pub first: Value,
    pub reset: Value,
    pub follow_up: Value,
}

/// Register `model_path`, select it, chat, reset and ask the follow-up
/// question. `log` sees every response as it arrives.
pub async fn run_scenario(
    driver: &Driver,
    model_path: &str,
    display_name: Option<&str>,
    mut log: impl FnMut(&str, &Value),
) -> anyhow::Result<Transcript> {
    let mut body = json!({ "path": model_path });
    if let Some(name) = display_name {
        body["display_name"] = json!(name);
    }
    let register = driver.post("/api/models/register", Some(body)).await?;
    log("register", &register);
    let model_id = register["model"]["id"]
        .as_str()
        .context("register response has no model id")?
        .to_string();

    let select = driver
        .post("/api/models/select", Some(json!({ "model_id": model_id })))
        .await?;
    log("select", &select);

    let first = driver
        .post("/api/chat/complete", Some(json!({ "message": FIRST_MESSAGE })))
        .await?;
    log("complete", &first);

    let reset = driver.post("/api/chat/reset", None).await?;
    log("reset", &reset);

    let follow_up = driver
        .post("/api/chat/complete", Some(json!({ "message": FOLLOW_UP })))
        .await?;
    log("complete", &follow_up);

    Ok(Transcript {
        register,
        select,
        first,
        reset,
        follow_up,
    })
}
