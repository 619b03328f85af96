use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::settings::{SettingsHistoryPage, UpdateSettingsRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::PlatformSettings,
    response::ApiResponse,
    routes::params::CursorQuery,
    services::settings_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_settings).put(update_settings))
        .route("/history", get(get_settings_history))
}

#[utoipa::path(
    get,
    path = "/api/admin/settings",
    responses(
        (status = 200, description = "Current platform settings", body = ApiResponse<PlatformSettings>),
        (status = 403, description = "Admin role required")
    ),
    security(("bearer_auth" = [])),
    tag = "Settings"
)]
pub async fn get_settings(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<PlatformSettings>>> {
    let resp = settings_service::get_platform_settings(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/admin/settings",
    request_body = UpdateSettingsRequest,
    responses(
        (status = 200, description = "Settings updated (or no-op)", body = ApiResponse<PlatformSettings>),
        (status = 403, description = "Admin role required")
    ),
    security(("bearer_auth" = [])),
    tag = "Settings"
)]
pub async fn update_settings(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpdateSettingsRequest>,
) -> AppResult<Json<ApiResponse<PlatformSettings>>> {
    let resp = settings_service::update_platform_settings(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/settings/history",
    params(
        ("cursor" = Option<Uuid>, Query, description = "Last-seen history row id"),
        ("limit" = Option<i64>, Query, description = "Page size, max 50"),
        ("search" = Option<String>, Query, description = "Match updating admin name/email")
    ),
    responses(
        (status = 200, description = "Settings change history", body = ApiResponse<SettingsHistoryPage>),
        (status = 403, description = "Admin role required")
    ),
    security(("bearer_auth" = [])),
    tag = "Settings"
)]
pub async fn get_settings_history(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<CursorQuery>,
) -> AppResult<Json<ApiResponse<SettingsHistoryPage>>> {
    let resp = settings_service::get_platform_settings_history(&state, &user, query).await?;
    Ok(Json(resp))
}
