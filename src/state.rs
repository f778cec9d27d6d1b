//! Session state and transitions
//!
//! The whole photo-request session lives in one `SessionState` struct owned
//! by the managed `AppState`. Every external event (chat turn, camera pick,
//! slider edit, map click, search keystroke) is a transition method on this
//! struct, so the logic unit-tests without Tauri or the network.

use log::warn;
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::catalog::{APERTURE_STOPS, CAMERA_MODELS, ISO_VALUES, SHUTTER_SPEEDS};
use crate::models::{
    CameraModel, ChatMessage, ChatReply, Coordinate, ExposureSettings, SearchError, SearchResult,
};

pub const GREETING: &str = "👋 Hi! I'm your AI photographer. What kind of photo are we shooting?";
pub const CHAT_FAILED_MESSAGE: &str =
    "⚠️ Couldn't reach the studio backend. Your settings are intact, please try again.";
pub const DEVELOPING_MESSAGE: &str = "📷 Developing the film...";
pub const PHOTO_READY_MESSAGE: &str = "✨ Photo developed!";
pub const GENERATION_FAILED_MESSAGE: &str =
    "❌ Generation failed, likely a network timeout or a busy server. Rephrase the request or adjust the parameters and try again.";

/// Label used when a location is confirmed from a bare map click rather
/// than a named search result.
pub const DEFAULT_LOCATION_LABEL: &str = "Selected Location";

/// Direct confirmations performed while a chat call is outstanding. The
/// server's returned schema would silently overwrite them, so they are
/// recorded here and merged back on top when the in-flight response lands.
/// When the busy window ends without a new schema (chat failure, either
/// generation outcome) the overlay is discarded instead.
#[derive(Debug, Default)]
struct LocalEdits {
    camera: Option<&'static CameraModel>,
    exposure: Option<ExposureSettings>,
    location: Option<(Coordinate, String)>,
}

/// Everything one generation call needs, captured at the moment the
/// server signals the schema is complete. Snapshotting here pins the call
/// to the server-returned schema even if the session changes afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationInput {
    pub schema: Value,
    pub character_image: Option<String>,
    pub exposure: ExposureSettings,
    pub model_name: &'static str,
}

/// Full session state. Serialized as-is to the frontend as a snapshot.
#[derive(Debug, Serialize)]
pub struct SessionState {
    /// Bumped on every reset. Continuations of calls started before a
    /// reset carry the old epoch and are dropped when they land, the same
    /// way a page reload killed them in the original UI.
    pub epoch: u64,
    /// The accumulating photo-request schema. The backend is authoritative
    /// on its structure after each chat turn; always a JSON object.
    pub schema: Value,
    pub messages: Vec<ChatMessage>,
    /// True while a chat or generate call is outstanding. A second chat
    /// submission during that window is silently dropped.
    pub busy: bool,
    pub generated_image: Option<String>,
    /// Sticky generation failure flag, cleared only by the next successful
    /// generation.
    pub generation_failed: bool,
    /// Reference photo as a base64 data URL.
    pub character_image: Option<String>,
    pub selected_model: CameraModel,
    /// Confirmed exposure, shown in the viewfinder header.
    pub exposure: ExposureSettings,
    /// Pending exposure, edited by the sliders.
    pub pending_exposure: ExposureSettings,
    pub confirmed_location: Option<Coordinate>,
    pub pending_location: Option<Coordinate>,
    /// Display name of the picked search result, if the pending coordinate
    /// came from one. Cleared on confirm.
    pub pending_location_label: Option<String>,
    pub search_query: String,
    pub search_results: Vec<SearchResult>,
    pub searching: bool,
    pub search_error: Option<SearchError>,
    pub exposure_panel_open: bool,
    pub location_panel_open: bool,
    #[serde(skip)]
    local_edits: LocalEdits,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            epoch: 0,
            schema: json!({}),
            messages: Vec::new(),
            busy: false,
            generated_image: None,
            generation_failed: false,
            character_image: None,
            selected_model: CAMERA_MODELS[0].clone(),
            exposure: ExposureSettings::default(),
            pending_exposure: ExposureSettings::default(),
            confirmed_location: None,
            pending_location: None,
            pending_location_label: None,
            search_query: String::new(),
            search_results: Vec::new(),
            searching: false,
            search_error: None,
            exposure_panel_open: false,
            location_panel_open: false,
            local_edits: LocalEdits::default(),
        }
    }

    /// Starts a fresh session around the given initial schema ("advance
    /// film"). Everything is reset, the epoch advances so responses still
    /// in flight for the old session get dropped, and the greeting is
    /// appended.
    pub fn reset(&mut self, initial_schema: Value) {
        let epoch = self.epoch.wrapping_add(1);
        *self = Self::new();
        self.epoch = epoch;
        self.install_schema(initial_schema);
        self.messages.push(ChatMessage::ai(GREETING));
    }

    fn is_stale(&self, epoch: u64, what: &str) -> bool {
        if epoch != self.epoch {
            warn!("[session] {} from a previous session dropped", what);
            return true;
        }
        false
    }

    // ---- Conversation ----

    /// Accepts a chat submission. Returns the epoch the continuation must
    /// hand back when the response lands, or None (changing nothing) for
    /// blank text or while a request is already outstanding.
    pub fn begin_chat(&mut self, text: &str) -> Option<u64> {
        if text.trim().is_empty() || self.busy {
            return None;
        }
        self.messages.push(ChatMessage::user(text));
        self.busy = true;
        Some(self.epoch)
    }

    /// Applies a successful chat response: the server's schema replaces the
    /// local one (with recorded local edits merged back on top) and the
    /// reply joins the log. When the server signals the request is ready to
    /// shoot, generation begins here and the input for the single
    /// generation call is returned. A reply from before a reset is dropped.
    pub fn apply_chat_reply(&mut self, epoch: u64, reply: ChatReply) -> Option<GenerationInput> {
        if self.is_stale(epoch, "chat reply") {
            return None;
        }
        self.install_schema(reply.schema);
        self.messages.push(ChatMessage::ai(reply.reply));
        self.busy = false;
        if !reply.is_ready {
            return None;
        }
        self.begin_generation();
        Some(GenerationInput {
            schema: self.schema.clone(),
            character_image: self.character_image.clone(),
            exposure: self.exposure.clone(),
            model_name: self.selected_model.name,
        })
    }

    /// Applies a chat transport failure: canned AI message, busy cleared,
    /// conversation stays usable. The edit overlay is discarded: those
    /// edits are already in the local schema, which no reply will replace.
    pub fn apply_chat_failure(&mut self, epoch: u64) {
        if self.is_stale(epoch, "chat failure") {
            return;
        }
        self.messages.push(ChatMessage::ai(CHAT_FAILED_MESSAGE));
        self.busy = false;
        self.local_edits = LocalEdits::default();
    }

    // ---- Generation ----

    pub fn begin_generation(&mut self) {
        self.messages.push(ChatMessage::ai(DEVELOPING_MESSAGE));
        self.busy = true;
    }

    pub fn apply_generation_success(&mut self, epoch: u64, image_url: String) {
        if self.is_stale(epoch, "generation result") {
            return;
        }
        self.generated_image = Some(image_url);
        self.generation_failed = false;
        self.messages.push(ChatMessage::ai(PHOTO_READY_MESSAGE));
        self.busy = false;
        // Generation never replaces the schema, so edits recorded during
        // the busy window are already in place and must not replay later.
        self.local_edits = LocalEdits::default();
    }

    /// Marks a failed generation. The previous image, if any, stays
    /// visible; only the error flag is raised.
    pub fn apply_generation_failure(&mut self, epoch: u64) {
        if self.is_stale(epoch, "generation result") {
            return;
        }
        self.generation_failed = true;
        self.messages.push(ChatMessage::ai(GENERATION_FAILED_MESSAGE));
        self.busy = false;
        self.local_edits = LocalEdits::default();
    }

    // ---- Camera & exposure ----

    /// Selects a camera model. Local-only: merges the model's style, film
    /// stock and lens into the schema without a server round-trip.
    pub fn select_camera(&mut self, model: &'static CameraModel) {
        self.selected_model = model.clone();
        merge_camera_model(&mut self.schema, model);
        if self.busy {
            self.local_edits.camera = Some(model);
        }
    }

    /// Stages slider values. Only the pending copy changes; values must be
    /// stops from the option tables.
    pub fn set_pending_exposure(&mut self, exposure: ExposureSettings) -> Result<(), String> {
        validate_exposure(&exposure)?;
        self.pending_exposure = exposure;
        Ok(())
    }

    /// Whether the pending exposure differs from the confirmed one on any
    /// of the three fields. The Apply Settings action is disabled when
    /// this is false.
    pub fn exposure_dirty(&self) -> bool {
        self.pending_exposure != self.exposure
    }

    /// Applies the pending exposure. Idempotent no-op when nothing changed;
    /// otherwise merges into the schema and collapses the panel.
    pub fn confirm_exposure(&mut self) -> bool {
        if !self.exposure_dirty() {
            return false;
        }
        self.exposure = self.pending_exposure.clone();
        merge_exposure(&mut self.schema, &self.exposure);
        if self.busy {
            self.local_edits.exposure = Some(self.exposure.clone());
        }
        self.exposure_panel_open = false;
        true
    }

    // ---- Location workflow ----

    /// A bare map click: stages the coordinate with the default label. Does
    /// not touch the schema or an already-confirmed location.
    pub fn pick_location(&mut self, coordinate: Coordinate) {
        self.pending_location = Some(coordinate);
        self.pending_location_label = None;
    }

    /// Promotes a search result to the pending coordinate and clears the
    /// result list and query text. Returns the coordinate for the map
    /// fly-to animation.
    pub fn select_search_result(&mut self, index: usize) -> Option<Coordinate> {
        let result = self.search_results.get(index)?.clone();
        let coordinate = Coordinate {
            lat: result.lat,
            lng: result.lon,
        };
        self.pending_location = Some(coordinate);
        self.pending_location_label = Some(result.display_name);
        self.search_results.clear();
        self.search_query.clear();
        Some(coordinate)
    }

    /// Confirms the pending location: merges the formatted coordinates and
    /// label into the schema's environment group, clears the transient
    /// label and collapses the panel. Unreachable no-op without a pending
    /// coordinate.
    pub fn confirm_location(&mut self) -> bool {
        let coordinate = match self.pending_location {
            Some(c) => c,
            None => return false,
        };
        let label = self
            .pending_location_label
            .take()
            .unwrap_or_else(|| DEFAULT_LOCATION_LABEL.to_string());
        self.confirmed_location = Some(coordinate);
        merge_location(&mut self.schema, coordinate, &label);
        if self.busy {
            self.local_edits.location = Some((coordinate, label));
        }
        self.location_panel_open = false;
        true
    }

    // ---- Location search ----

    /// Records a search-box keystroke. Clears any previous inline error
    /// immediately. Returns true when a debounced search should be armed;
    /// a blank query instead clears the result list.
    pub fn set_search_query(&mut self, query: &str) -> bool {
        self.search_query = query.to_string();
        self.search_error = None;
        if query.trim().is_empty() {
            self.search_results.clear();
            return false;
        }
        true
    }

    pub fn begin_search(&mut self) -> u64 {
        self.searching = true;
        self.search_error = None;
        self.epoch
    }

    /// Stores results from a provider that answered. Zero results raise the
    /// "no results" message. Returns false when the search belongs to a
    /// session that has since been reset.
    pub fn apply_search_results(&mut self, epoch: u64, results: Vec<SearchResult>) -> bool {
        if self.is_stale(epoch, "search results") {
            return false;
        }
        if results.is_empty() {
            self.search_error = Some(SearchError::NoResults);
        }
        self.search_results = results;
        self.searching = false;
        true
    }

    /// Every provider failed.
    pub fn apply_search_failure(&mut self, epoch: u64) -> bool {
        if self.is_stale(epoch, "search failure") {
            return false;
        }
        self.search_results.clear();
        self.search_error = Some(SearchError::Failed);
        self.searching = false;
        true
    }

    // ---- Reference image ----

    pub fn set_character_image(&mut self, data_url: String) {
        self.character_image = Some(data_url);
    }

    /// Clears the stored reference image. No chat message is emitted.
    pub fn remove_character_image(&mut self) {
        self.character_image = None;
    }

    // ---- Panels ----

    pub fn set_exposure_panel_open(&mut self, open: bool) {
        self.exposure_panel_open = open;
    }

    pub fn set_location_panel_open(&mut self, open: bool) {
        self.location_panel_open = open;
    }

    /// Installs a schema returned by the backend, coercing non-objects to
    /// an empty object, then reapplies any local edits recorded while the
    /// request was in flight.
    fn install_schema(&mut self, schema: Value) {
        self.schema = if schema.is_object() { schema } else { json!({}) };
        let edits = std::mem::take(&mut self.local_edits);
        if let Some(model) = edits.camera {
            merge_camera_model(&mut self.schema, model);
        }
        if let Some(exposure) = edits.exposure {
            merge_exposure(&mut self.schema, &exposure);
        }
        if let Some((coordinate, label)) = edits.location {
            merge_location(&mut self.schema, coordinate, &label);
        }
    }
}

fn validate_exposure(exposure: &ExposureSettings) -> Result<(), String> {
    if !APERTURE_STOPS.contains(&exposure.aperture.as_str()) {
        return Err(format!("Unknown aperture stop: {}", exposure.aperture));
    }
    if !SHUTTER_SPEEDS.contains(&exposure.shutter.as_str()) {
        return Err(format!("Unknown shutter speed: {}", exposure.shutter));
    }
    if !ISO_VALUES.contains(&exposure.iso.as_str()) {
        return Err(format!("Unknown ISO value: {}", exposure.iso));
    }
    Ok(())
}

/// Returns the named nested group of the schema, creating it (or replacing
/// a non-object value) on demand.
fn group_mut<'a>(schema: &'a mut Value, key: &str) -> &'a mut Map<String, Value> {
    if !schema.is_object() {
        *schema = Value::Object(Map::new());
    }
    let root = schema
        .as_object_mut()
        .expect("schema coerced to object above");
    let entry = root
        .entry(key.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if !entry.is_object() {
        *entry = Value::Object(Map::new());
    }
    entry
        .as_object_mut()
        .expect("group coerced to object above")
}

fn merge_camera_model(schema: &mut Value, model: &CameraModel) {
    let camera = group_mut(schema, "camera");
    camera.insert("camera_style".to_string(), json!(model.name));
    camera.insert("film_stock".to_string(), json!(model.name));
    camera.insert("lens".to_string(), json!(model.kind));
}

fn merge_exposure(schema: &mut Value, exposure: &ExposureSettings) {
    let camera = group_mut(schema, "camera");
    camera.insert("aperture".to_string(), json!(exposure.aperture));
    camera.insert("shutter".to_string(), json!(exposure.shutter));
    camera.insert("iso".to_string(), json!(exposure.iso));
}

fn merge_location(schema: &mut Value, coordinate: Coordinate, label: &str) {
    let environment = group_mut(schema, "environment");
    environment.insert("location_type".to_string(), json!(label));
    environment.insert(
        "coordinates".to_string(),
        json!(format!("{:.4}, {:.4}", coordinate.lat, coordinate.lng)),
    );
}
