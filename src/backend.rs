//! HTTP client for the photo-studio backend
//!
//! Three endpoints: `/api/init` hands out the initial schema, `/api/chat`
//! advances the conversation, `/api/generate` produces the image. The
//! backend runs locally; the base URL is a source constant per the app's
//! no-configuration policy.

use std::time::Duration;

use log::info;
use serde_json::{json, Value};

use crate::models::{ChatReply, ExposureSettings, GenerateReply};

const BACKEND_BASE_URL: &str = "http://localhost:8000";

/// Generation covers model inference plus server-side watermarking, which
/// can take minutes. Everything else uses reqwest's default timeout.
const GENERATE_TIMEOUT: Duration = Duration::from_secs(360);

/// Fetches the initial schema. Callers degrade to an empty schema when
/// this fails; no user-visible error is raised.
pub async fn init_schema() -> Result<Value, String> {
    let client = reqwest::Client::new();
    let response = client
        .post(format!("{}/api/init", BACKEND_BASE_URL))
        .send()
        .await
        .map_err(|e| format!("Init request failed: {}", e))?;

    if !response.status().is_success() {
        return Err(format!("Init returned HTTP {}", response.status()));
    }

    response
        .json()
        .await
        .map_err(|e| format!("Failed to parse init response: {}", e))
}

/// Sends one chat turn along with the current schema. The server returns
/// the updated schema, its reply text, and whether the request is
/// semantically complete.
pub async fn send_chat(
    message: &str,
    schema: &Value,
    has_character_image: bool,
) -> Result<ChatReply, String> {
    let client = reqwest::Client::new();
    let response = client
        .post(format!("{}/api/chat", BACKEND_BASE_URL))
        .json(&json!({
            "message": message,
            "schema_data": schema,
            "has_character_image": has_character_image
        }))
        .send()
        .await
        .map_err(|e| format!("Chat request failed: {}", e))?;

    if !response.status().is_success() {
        let status = response.status();
        let error_text = response.text().await.unwrap_or_default();
        return Err(format!("Chat API error ({}): {}", status, error_text));
    }

    response
        .json()
        .await
        .map_err(|e| format!("Failed to parse chat response: {}", e))
}

/// Requests image generation for a completed schema, carrying the
/// reference image and the confirmed camera settings.
pub async fn generate_image(
    schema: &Value,
    character_image: Option<&str>,
    exposure: &ExposureSettings,
    model_name: &str,
) -> Result<GenerateReply, String> {
    info!("[generate] requesting image for model {}", model_name);

    let client = reqwest::Client::new();
    let response = client
        .post(format!("{}/api/generate", BACKEND_BASE_URL))
        .timeout(GENERATE_TIMEOUT)
        .json(&json!({
            "schema_data": schema,
            "character_image": character_image,
            "camera_settings": {
                "aperture": exposure.aperture,
                "shutter": exposure.shutter,
                "iso": exposure.iso,
                "model": model_name
            }
        }))
        .send()
        .await
        .map_err(|e| format!("Generate request failed: {}", e))?;

    if !response.status().is_success() {
        let status = response.status();
        let error_text = response.text().await.unwrap_or_default();
        return Err(format!("Generate API error ({}): {}", status, error_text));
    }

    response
        .json()
        .await
        .map_err(|e| format!("Failed to parse generate response: {}", e))
}
