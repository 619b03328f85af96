use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, patch, post},
};
use uuid::Uuid;

use crate::{
    dto::admissions::{
        AdmissionList, AdmissionRequestDto, EnrollCourseRequest, RespondAdmissionRequest,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::admission_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/enroll", post(enroll_to_course))
        .route("/requests", get(list_enroll_requests))
        .route("/{id}", get(get_admission_details))
        .route("/{id}/respond", patch(respond_to_admission))
}

#[utoipa::path(
    post,
    path = "/api/admissions/enroll",
    request_body = EnrollCourseRequest,
    responses(
        (status = 200, description = "Enrollment requested, pending school approval"),
        (status = 400, description = "No seats or already enrolled"),
        (status = 403, description = "Pet does not belong to caller")
    ),
    security(("bearer_auth" = [])),
    tag = "Admissions"
)]
pub async fn enroll_to_course(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<EnrollCourseRequest>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = admission_service::enroll_to_course(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admissions/requests",
    responses(
        (status = 200, description = "Enrollment requests for the calling school", body = ApiResponse<AdmissionList>),
        (status = 403, description = "School role required")
    ),
    security(("bearer_auth" = [])),
    tag = "Admissions"
)]
pub async fn list_enroll_requests(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<AdmissionList>>> {
    let resp = admission_service::list_enroll_requests(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admissions/{id}",
    params(("id" = Uuid, Path, description = "Admission request ID")),
    responses(
        (status = 200, description = "Admission request details", body = ApiResponse<AdmissionRequestDto>),
        (status = 404, description = "Not found or not this school's course")
    ),
    security(("bearer_auth" = [])),
    tag = "Admissions"
)]
pub async fn get_admission_details(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<AdmissionRequestDto>>> {
    let resp = admission_service::get_admission_details(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/admissions/{id}/respond",
    params(("id" = Uuid, Path, description = "Admission request ID")),
    request_body = RespondAdmissionRequest,
    responses(
        (status = 200, description = "Admission decided"),
        (status = 400, description = "Already decided or no seats left"),
        (status = 403, description = "Not this school's course")
    ),
    security(("bearer_auth" = [])),
    tag = "Admissions"
)]
pub async fn respond_to_admission(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<RespondAdmissionRequest>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = admission_service::respond_to_admission(&state, &user, id, payload).await?;
    Ok(Json(resp))
}
