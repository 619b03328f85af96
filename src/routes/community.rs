use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::community::{BookmarkDto, BookmarkPage, ToggleResult},
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    routes::params::BookmarkListQuery,
    services::bookmark_service::{self, relation, target_type},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/posts/{id}/bookmark", post(toggle_post_bookmark))
        .route("/posts/{id}/like", post(toggle_post_like))
        .route("/reels/{id}/bookmark", post(toggle_reel_bookmark))
        .route("/reels/{id}/like", post(toggle_reel_like))
        .route("/bookmarks", get(list_my_bookmarks))
        .route("/bookmarks/{id}", get(get_bookmark))
}

#[utoipa::path(
    post,
    path = "/api/community/posts/{id}/bookmark",
    params(("id" = Uuid, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Bookmark toggled", body = ApiResponse<ToggleResult>),
        (status = 404, description = "Post not found or not active")
    ),
    security(("bearer_auth" = [])),
    tag = "Community"
)]
pub async fn toggle_post_bookmark(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<ToggleResult>>> {
    let resp =
        bookmark_service::toggle(&state, &user, target_type::POST, id, relation::BOOKMARK).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/community/posts/{id}/like",
    params(("id" = Uuid, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Like toggled", body = ApiResponse<ToggleResult>),
        (status = 404, description = "Post not found or not active")
    ),
    security(("bearer_auth" = [])),
    tag = "Community"
)]
pub async fn toggle_post_like(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<ToggleResult>>> {
    let resp =
        bookmark_service::toggle(&state, &user, target_type::POST, id, relation::LIKE).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/community/reels/{id}/bookmark",
    params(("id" = Uuid, Path, description = "Reel ID")),
    responses(
        (status = 200, description = "Bookmark toggled", body = ApiResponse<ToggleResult>),
        (status = 404, description = "Reel not found or not active")
    ),
    security(("bearer_auth" = [])),
    tag = "Community"
)]
pub async fn toggle_reel_bookmark(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<ToggleResult>>> {
    let resp =
        bookmark_service::toggle(&state, &user, target_type::REEL, id, relation::BOOKMARK).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/community/reels/{id}/like",
    params(("id" = Uuid, Path, description = "Reel ID")),
    responses(
        (status = 200, description = "Like toggled", body = ApiResponse<ToggleResult>),
        (status = 404, description = "Reel not found or not active")
    ),
    security(("bearer_auth" = [])),
    tag = "Community"
)]
pub async fn toggle_reel_like(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<ToggleResult>>> {
    let resp =
        bookmark_service::toggle(&state, &user, target_type::REEL, id, relation::LIKE).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/community/bookmarks",
    params(
        ("cursor" = Option<Uuid>, Query, description = "Last-seen bookmark id"),
        ("limit" = Option<i64>, Query, description = "Page size, max 50"),
        ("filter" = Option<String>, Query, description = "Restrict to post or reel")
    ),
    responses(
        (status = 200, description = "Caller's bookmarks", body = ApiResponse<BookmarkPage>)
    ),
    security(("bearer_auth" = [])),
    tag = "Community"
)]
pub async fn list_my_bookmarks(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<BookmarkListQuery>,
) -> AppResult<Json<ApiResponse<BookmarkPage>>> {
    let resp = bookmark_service::list_my_bookmarks(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/community/bookmarks/{id}",
    params(("id" = Uuid, Path, description = "Bookmark ID")),
    responses(
        (status = 200, description = "Bookmark with its target", body = ApiResponse<BookmarkDto>),
        (status = 404, description = "Bookmark or target missing")
    ),
    security(("bearer_auth" = [])),
    tag = "Community"
)]
pub async fn get_bookmark(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<BookmarkDto>>> {
    let resp = bookmark_service::get_bookmark(&state, &user, id).await?;
    Ok(Json(resp))
}
