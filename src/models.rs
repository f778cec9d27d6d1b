//! Data models shared between the Rust backend and the webview frontend

use serde::{Deserialize, Serialize};

/// A single turn in the conversation log. Append-only; insertion order is
/// display order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// "user" or "ai"
    pub role: String,
    pub text: String,
    pub timestamp: String,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self::new("user", text)
    }

    pub fn ai(text: impl Into<String>) -> Self {
        Self::new("ai", text)
    }

    fn new(role: &str, text: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            text: text.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// A catalog entry for a camera/film model. Loaded from the fixed in-memory
/// table in `catalog.rs`, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CameraModel {
    pub id: &'static str,
    pub name: &'static str,
    /// Aspect ratio as "W/H", e.g. "3/2"
    pub ratio: &'static str,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub desc: &'static str,
}

/// Manual exposure triple. Two live copies exist in the session: a pending
/// copy edited by the sliders and a confirmed copy applied to the schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExposureSettings {
    pub aperture: String,
    pub shutter: String,
    pub iso: String,
}

impl Default for ExposureSettings {
    fn default() -> Self {
        Self {
            aperture: "f/2.8".to_string(),
            shutter: "1/125".to_string(),
            iso: "400".to_string(),
        }
    }
}

/// A map coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

/// A geocoding hit, normalized from either provider's response shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub lat: f64,
    pub lon: f64,
    pub display_name: String,
}

/// The two inline search error kinds. Mutually exclusive; both clear on the
/// next keystroke.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchError {
    NoResults,
    Failed,
}

impl SearchError {
    pub fn message(&self) -> &'static str {
        match self {
            SearchError::NoResults => "No places found, try a different keyword",
            SearchError::Failed => "Search failed, check your network connection and retry",
        }
    }
}

/// Response from POST /api/chat.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatReply {
    pub schema: serde_json::Value,
    pub reply: String,
    #[serde(default)]
    pub is_ready: bool,
}

/// Response from POST /api/generate.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateReply {
    pub image_url: String,
}
