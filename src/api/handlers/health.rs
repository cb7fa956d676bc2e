use crate::AppState;
use axum::{Json, extract::State, response::IntoResponse};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub database: String,
    pub storage: String,
    pub media_tools: String,
    pub version: String,
}

fn describe(ok: bool, up: &'static str, down: &'static str) -> String {
    let label = if ok { up } else { down };
    label.to_string()
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "System health status", body = HealthResponse)
    ),
    tag = "system"
)]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let database = state.videos.ping().await;
    // A missing probe key still proves the bucket answers
    let storage = state.objects.file_exists("health-check").await.is_ok();
    let media_tools = state.media_tool.health_check().await;

    Json(HealthResponse {
        status: describe(database && storage && media_tools, "ok", "degraded"),
        database: describe(database, "connected", "disconnected"),
        storage: describe(storage, "connected", "disconnected"),
        media_tools: describe(media_tools, "available", "unavailable"),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
