//! HTTP endpoint handlers

use std::{convert::Infallible, sync::Arc};
use axum::{
    extract::State,
    response::{
        sse::{Event, KeepAlive, Sse},
        Json,
    },
};
use futures::stream::{self, Stream};
use tracing::{info, warn};

use crate::state::{app_state::Intent, AppState, RunState};
use super::responses::{ApiResponse, DurationRequest, HealthResponse, StatusResponse};

/// Handle POST /duration - Set the countdown length from raw input text
pub async fn duration_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<DurationRequest>,
) -> Json<ApiResponse> {
    let timer = state.apply(Intent::SetDuration, Some(&request.input));
    info!("Duration endpoint called - input {:?}", request.input);

    // An accepted edit always leaves the timer idle with nothing elapsed
    let message = if timer.run_state == RunState::Running || timer.edit_locked {
        "Duration is locked until the countdown is restarted".to_string()
    } else {
        format!("Duration set to {}", timer.display_text)
    };
    Json(ApiResponse::new(message, timer))
}

/// Handle POST /start - Start or resume the countdown
pub async fn start_handler(State(state): State<Arc<AppState>>) -> Json<ApiResponse> {
    let timer = state.apply(Intent::Start, None);
    info!("Start endpoint called - {} remaining", timer.display_text);
    Json(ApiResponse::new("Countdown started".to_string(), timer))
}

/// Handle POST /pause - Pause the countdown
pub async fn pause_handler(State(state): State<Arc<AppState>>) -> Json<ApiResponse> {
    let timer = state.apply(Intent::Pause, None);
    info!("Pause endpoint called - {} remaining", timer.display_text);
    Json(ApiResponse::new("Countdown paused".to_string(), timer))
}

/// Handle POST /restart - Rewind and start the countdown again
pub async fn restart_handler(State(state): State<Arc<AppState>>) -> Json<ApiResponse> {
    let timer = state.apply(Intent::Restart, None);
    info!("Restart endpoint called - {} remaining", timer.display_text);
    Json(ApiResponse::new("Countdown restarted".to_string(), timer))
}

/// Handle GET /status - Return current timer and server status
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let (last_action, last_action_time) = state.get_last_action();

    Json(StatusResponse {
        timer: state.engine.snapshot(),
        tick_period_ms: state.engine.tick_period().as_millis() as u64,
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    })
}

/// Handle GET /events - Stream a snapshot on every timer change
pub async fn events_handler(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    info!("Events endpoint called - new subscriber");
    let updates = state.engine.subscribe();

    // First item is the current state, then one per change until the engine goes away
    let events = stream::unfold((updates, true), |(mut updates, first)| async move {
        if !first && updates.changed().await.is_err() {
            return None;
        }
        let snapshot = updates.borrow_and_update().clone();
        let event = match Event::default().event("timer").json_data(&snapshot) {
            Ok(event) => event,
            Err(e) => {
                warn!("Failed to encode timer event: {}", e);
                Event::default().comment("encoding failed")
            }
        };
        Some((Ok::<_, Infallible>(event), (updates, false)))
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
