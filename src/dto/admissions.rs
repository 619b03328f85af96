use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::EnrollmentStatus;

#[derive(Debug, Deserialize, ToSchema)]
pub struct EnrollCourseRequest {
    pub course_id: Uuid,
    pub schedule_id: Uuid,
    pub pet_profile_id: Uuid,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RespondAdmissionRequest {
    /// APPROVED or REJECTED; PENDING is not an allowed response.
    pub status: EnrollmentStatus,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AdmissionRequestDto {
    pub id: Uuid,
    pub pet_name: String,
    pub course_name: String,
    pub schedule_time: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AdmissionList {
    pub items: Vec<AdmissionRequestDto>,
}
