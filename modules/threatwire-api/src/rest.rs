use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use tracing::error;

use threatwire_common::{RecordKind, ThreatwireError};

use crate::feed::render_feed;
use crate::AppState;

/// Service index: what this is and where the endpoints live.
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "service": state.config.feed_title,
        "description": state.config.feed_description,
        "endpoints": {
            "feed": "GET /rss",
            "news": "GET /api/news",
            "update": "POST /api/update",
            "status": "GET /api/status",
        },
        "source": "https://www.ransomware.live",
    }))
}

pub async fn rss_feed(State(state): State<Arc<AppState>>) -> Response {
    match state.store.recent_items(state.config.feed_max_items).await {
        Ok(items) => {
            let body = render_feed(&items, &state.config);
            (
                [(
                    header::CONTENT_TYPE,
                    "application/rss+xml; charset=utf-8",
                )],
                body,
            )
                .into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to generate RSS feed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Feed generation failed").into_response()
        }
    }
}

pub async fn api_news(State(state): State<Arc<AppState>>) -> Response {
    match state.store.recent_items(state.config.feed_max_items).await {
        Ok(items) => Json(json!({
            "status": "success",
            "count": items.len(),
            "data": items,
        }))
        .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to load news items");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"status": "error", "message": "Failed to load news items"})),
            )
                .into_response()
        }
    }
}

/// Manual trigger. Runs the identical two-lane sequence the timer runs;
/// a run already in flight is rejected with 409 rather than queued.
pub async fn api_update(State(state): State<Arc<AppState>>) -> Response {
    match state.ingestor.run_cycle().await {
        Ok(report) => Json(json!({
            "status": "success",
            "victims": report.victims,
            "cyberattacks": report.attacks,
            "elapsed_ms": report.elapsed_ms,
        }))
        .into_response(),
        Err(ThreatwireError::CycleInProgress) => (
            StatusCode::CONFLICT,
            Json(json!({"status": "busy", "message": "An ingest cycle is already running"})),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Manual update failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"status": "error", "message": "Update failed"})),
            )
                .into_response()
        }
    }
}

pub async fn api_status(State(state): State<Arc<AppState>>) -> Response {
    let victims = state.store.stats(RecordKind::Victim).await;
    let attacks = state.store.stats(RecordKind::Cyberattack).await;

    match (victims, attacks) {
        (Ok((victims_count, last_victim)), Ok((attacks_count, last_attack))) => Json(json!({
            "status": "running",
            "victims_count": victims_count,
            "cyberattacks_count": attacks_count,
            "last_victim_update": last_victim,
            "last_attack_update": last_attack,
            "current_time": chrono::Utc::now(),
            "config": {
                "update_interval_hours": state.config.update_interval_hours,
                "window_days": state.config.window_days,
                "target_countries": state.config.target_countries,
                "target_activity": state.config.target_activity,
                "feed_max_items": state.config.feed_max_items,
                "llm_enabled": state.config.llm_configured(),
                "llm_model": if state.config.llm_configured() {
                    Some(state.config.llm_model.clone())
                } else {
                    None
                },
            },
        }))
        .into_response(),
        (v, a) => {
            if let Err(e) = v {
                error!(error = %e, "Status query failed for victims");
            }
            if let Err(e) = a {
                error!(error = %e, "Status query failed for cyberattacks");
            }
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"status": "error", "message": "Status unavailable"})),
            )
                .into_response()
        }
    }
}
