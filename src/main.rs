// Prevents additional console window on Windows in release
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

// Module declarations
mod backend;
mod catalog;
mod debounce;
mod geocode;
mod models;
mod state;

use std::path::Path;
use std::sync::Mutex;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use log::{error, info, warn};
use serde_json::{json, Value};
use tauri::{command, AppHandle, Emitter, Manager, State};

use catalog::{APERTURE_STOPS, CAMERA_MODELS, ISO_VALUES, SHUTTER_SPEEDS};
use debounce::{Debouncer, SEARCH_DEBOUNCE};
use models::{CameraModel, ExposureSettings};
use state::{GenerationInput, SessionState};

// ============ App State ============

pub struct AppState {
    pub session: Mutex<SessionState>,
    pub search_debounce: Debouncer,
}

/// Serializes the session for the frontend. Commands return a fresh
/// snapshot after every transition; the webview renders from these.
fn snapshot_of(session: &SessionState) -> Result<Value, String> {
    let mut value =
        serde_json::to_value(session).map_err(|e| format!("Failed to serialize session: {}", e))?;
    // Numeric form of the selected model's "W/H" ratio, driving the
    // viewfinder's aspect ratio.
    value["aspect_ratio"] = json!(catalog::aspect_ratio_value(session.selected_model.ratio));
    Ok(value)
}

fn snapshot(state: &State<'_, AppState>) -> Result<Value, String> {
    snapshot_of(&state.session.lock().unwrap())
}

// ============ Session Commands ============

/// Starts (or restarts, "advance film") a session. The backend hands out
/// the initial schema; on failure we degrade to an empty one with no
/// user-visible error beyond the normal greeting. The reset advances the
/// session epoch, so chat/generate/search responses still in flight for
/// the old session are dropped when they land; the debounce timer is
/// killed here directly.
#[command]
async fn init_session(state: State<'_, AppState>) -> Result<Value, String> {
    let schema = match backend::init_schema().await {
        Ok(schema) => schema,
        Err(e) => {
            warn!("[init] falling back to empty schema: {}", e);
            json!({})
        }
    };

    state.search_debounce.cancel();
    let mut session = state.session.lock().unwrap();
    session.reset(schema);
    snapshot_of(&session)
}

#[command]
fn get_session(state: State<'_, AppState>) -> Result<Value, String> {
    snapshot(&state)
}

// ============ Chat & Generation Commands ============

#[command]
async fn send_chat_message(state: State<'_, AppState>, message: String) -> Result<Value, String> {
    let (epoch, schema, has_character_image) = {
        let mut session = state.session.lock().unwrap();
        let epoch = match session.begin_chat(&message) {
            Some(epoch) => epoch,
            None => {
                info!("[chat] submission dropped (blank or request outstanding)");
                return snapshot_of(&session);
            }
        };
        (epoch, session.schema.clone(), session.character_image.is_some())
    };

    match backend::send_chat(&message, &schema, has_character_image).await {
        Ok(reply) => {
            let generation_input = state.session.lock().unwrap().apply_chat_reply(epoch, reply);
            // The server signalled the schema is complete: shoot exactly
            // once, with the schema it just returned.
            if let Some(input) = generation_input {
                run_generation(&state, epoch, input).await;
            }
        }
        Err(e) => {
            error!("[chat] request failed: {}", e);
            state.session.lock().unwrap().apply_chat_failure(epoch);
        }
    }

    snapshot(&state)
}

async fn run_generation(state: &State<'_, AppState>, epoch: u64, input: GenerationInput) {
    let outcome = backend::generate_image(
        &input.schema,
        input.character_image.as_deref(),
        &input.exposure,
        input.model_name,
    )
    .await;

    match outcome {
        Ok(reply) => {
            info!("[generate] image ready: {}", reply.image_url);
            state
                .session
                .lock()
                .unwrap()
                .apply_generation_success(epoch, reply.image_url);
        }
        Err(e) => {
            error!("[generate] failed: {}", e);
            state.session.lock().unwrap().apply_generation_failure(epoch);
        }
    }
}

// ============ Camera & Exposure Commands ============

#[command]
fn list_camera_models() -> Vec<CameraModel> {
    CAMERA_MODELS.to_vec()
}

#[command]
fn get_exposure_options() -> Value {
    json!({
        "aperture": APERTURE_STOPS,
        "shutter": SHUTTER_SPEEDS,
        "iso": ISO_VALUES
    })
}

#[command]
fn select_camera_model(state: State<'_, AppState>, model_id: String) -> Result<Value, String> {
    let model = catalog::find_model(&model_id)
        .ok_or_else(|| format!("Unknown camera model: {}", model_id))?;
    let mut session = state.session.lock().unwrap();
    session.select_camera(model);
    info!("[camera] selected {}", model.name);
    snapshot_of(&session)
}

#[command]
fn set_pending_exposure(
    state: State<'_, AppState>,
    aperture: String,
    shutter: String,
    iso: String,
) -> Result<Value, String> {
    let mut session = state.session.lock().unwrap();
    session.set_pending_exposure(ExposureSettings {
        aperture,
        shutter,
        iso,
    })?;
    snapshot_of(&session)
}

#[command]
fn confirm_exposure(state: State<'_, AppState>) -> Result<Value, String> {
    let mut session = state.session.lock().unwrap();
    if session.confirm_exposure() {
        info!(
            "[camera] exposure applied: {} {} ISO {}",
            session.exposure.aperture, session.exposure.shutter, session.exposure.iso
        );
    }
    snapshot_of(&session)
}

#[command]
fn set_exposure_panel_open(state: State<'_, AppState>, open: bool) -> Result<Value, String> {
    let mut session = state.session.lock().unwrap();
    session.set_exposure_panel_open(open);
    snapshot_of(&session)
}

// ============ Location Commands ============

#[command]
fn pick_map_location(state: State<'_, AppState>, lat: f64, lng: f64) -> Result<Value, String> {
    let mut session = state.session.lock().unwrap();
    session.pick_location(models::Coordinate { lat, lng });
    snapshot_of(&session)
}

#[command]
fn select_search_result(
    app: AppHandle,
    state: State<'_, AppState>,
    index: usize,
) -> Result<Value, String> {
    let mut session = state.session.lock().unwrap();
    if let Some(coordinate) = session.select_search_result(index) {
        let _ = app.emit(
            "map-fly-to",
            json!({ "lat": coordinate.lat, "lng": coordinate.lng }),
        );
    }
    snapshot_of(&session)
}

#[command]
fn confirm_location(state: State<'_, AppState>) -> Result<Value, String> {
    let mut session = state.session.lock().unwrap();
    if session.confirm_location() {
        info!(
            "[location] confirmed {}",
            session.schema["environment"]["coordinates"]
        );
    }
    snapshot_of(&session)
}

#[command]
fn set_location_panel_open(state: State<'_, AppState>, open: bool) -> Result<Value, String> {
    let mut session = state.session.lock().unwrap();
    session.set_location_panel_open(open);
    snapshot_of(&session)
}

// ============ Location Search Commands ============

/// A search-box keystroke. Arms the 500 ms debounced search (cancelling
/// any prior timer); a blank query cancels instead.
#[command]
async fn set_search_query(
    app: AppHandle,
    state: State<'_, AppState>,
    query: String,
) -> Result<Value, String> {
    let arm = state.session.lock().unwrap().set_search_query(&query);
    if arm {
        state
            .search_debounce
            .schedule(SEARCH_DEBOUNCE, run_search(app, query));
    } else {
        state.search_debounce.cancel();
    }
    snapshot(&state)
}

/// Explicit submit: the pending timer is invalidated first, so a stale
/// debounced search can never overwrite this one.
#[command]
async fn submit_search(app: AppHandle, state: State<'_, AppState>) -> Result<Value, String> {
    state.search_debounce.cancel();
    let query = state.session.lock().unwrap().search_query.clone();
    if !query.trim().is_empty() {
        run_search(app, query).await;
    }
    snapshot(&state)
}

/// Runs the geocoder query and pushes the outcome to the webview. Used by
/// both the debounced path (which completes long after its command
/// returned) and the explicit-submit path.
async fn run_search(app: AppHandle, query: String) {
    let state = app.state::<AppState>();
    let epoch = state.session.lock().unwrap().begin_search();

    let outcome = geocode::search(&query).await;

    let payload = {
        let mut session = state.session.lock().unwrap();
        let applied = match outcome {
            Ok(results) => session.apply_search_results(epoch, results),
            Err(e) => {
                error!("[geocode] search for {:?} failed: {}", query, e);
                session.apply_search_failure(epoch)
            }
        };
        // Searches started before a session reset must not reach the new
        // session's webview either.
        if !applied {
            return;
        }
        json!({
            "results": session.search_results,
            "error": session.search_error,
            "error_message": session.search_error.map(|e| e.message()),
        })
    };

    let _ = app.emit("search-results", payload);
}

// ============ Reference Image Commands ============

/// Attaches a reference photo: reads the file, embeds it as a base64 data
/// URL, and announces the upload in the conversation so the backend learns
/// about it in the same turn.
#[command]
async fn attach_character_image(state: State<'_, AppState>, path: String) -> Result<Value, String> {
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|e| format!("Failed to read image file: {}", e))?;

    let mime = mime_guess::from_path(&path).first_or(mime_guess::mime::IMAGE_PNG);
    let data_url = format!("data:{};base64,{}", mime.essence_str(), BASE64.encode(&bytes));

    let file_name = Path::new(&path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("image")
        .to_string();

    info!("[image] attached {} ({} bytes)", file_name, bytes.len());
    state.session.lock().unwrap().set_character_image(data_url);

    send_chat_message(state, format!("Uploaded reference photo: {}", file_name)).await
}

/// Removes the reference photo. No chat message is emitted for removal.
#[command]
fn remove_character_image(state: State<'_, AppState>) -> Result<Value, String> {
    let mut session = state.session.lock().unwrap();
    session.remove_character_image();
    snapshot_of(&session)
}

// ============ Entry Point ============

fn main() {
    tauri::Builder::default()
        .manage(AppState {
            session: Mutex::new(SessionState::new()),
            search_debounce: Debouncer::new(),
        })
        .plugin(tauri_plugin_dialog::init())
        .plugin(
            tauri_plugin_log::Builder::new()
                .target(tauri_plugin_log::Target::new(
                    tauri_plugin_log::TargetKind::LogDir {
                        file_name: Some("vibe-camera.log".into()),
                    },
                ))
                .level(log::LevelFilter::Info)
                .build(),
        )
        .invoke_handler(tauri::generate_handler![
            init_session,
            get_session,
            send_chat_message,
            list_camera_models,
            get_exposure_options,
            select_camera_model,
            set_pending_exposure,
            confirm_exposure,
            set_exposure_panel_open,
            pick_map_location,
            select_search_result,
            confirm_location,
            set_location_panel_open,
            set_search_query,
            submit_search,
            attach_character_image,
            remove_character_image,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
