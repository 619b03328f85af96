use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, FromQueryResult, JoinType, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::admissions::{
        AdmissionList, AdmissionRequestDto, EnrollCourseRequest, RespondAdmissionRequest,
    },
    entity::{
        course_schedules::{Column as ScheduleCol, Entity as CourseSchedules},
        courses::{Column as CourseCol, Entity as Courses},
        enrollments::{
            self, ActiveModel as EnrollmentActive, Column as EnrollCol, Entity as Enrollments,
        },
        pet_profiles::{Column as PetCol, Entity as PetProfiles},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_school},
    models::EnrollmentStatus,
    response::ApiResponse,
    state::AppState,
};

/// Request-time enrollment. The seat check here is advisory only; seats are
/// consumed at approval, so pending requests may exceed capacity by design.
pub async fn enroll_to_course(
    state: &AppState,
    user: &AuthUser,
    payload: EnrollCourseRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let pet = PetProfiles::find_by_id(payload.pet_profile_id)
        .one(&state.orm)
        .await?;
    match pet {
        Some(p) if p.owner_id == user.user_id => {}
        _ => return Err(AppError::Forbidden),
    }

    let course = Courses::find_by_id(payload.course_id).one(&state.orm).await?;
    if course.is_none() {
        return Err(AppError::NotFound);
    }

    let schedule = CourseSchedules::find_by_id(payload.schedule_id)
        .one(&state.orm)
        .await?;
    let schedule = match schedule {
        Some(s) => s,
        None => return Err(AppError::NotFound),
    };

    if schedule.available_seats <= 0 {
        return Err(AppError::BadRequest("No seats available".into()));
    }

    let already = Enrollments::find()
        .filter(
            Condition::all()
                .add(EnrollCol::PetProfileId.eq(payload.pet_profile_id))
                .add(EnrollCol::ScheduleId.eq(payload.schedule_id)),
        )
        .one(&state.orm)
        .await?;
    if already.is_some() {
        return Err(AppError::BadRequest(
            "Already enrolled in this course schedule".into(),
        ));
    }

    let insert = EnrollmentActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        pet_profile_id: Set(payload.pet_profile_id),
        course_id: Set(payload.course_id),
        schedule_id: Set(payload.schedule_id),
        status: Set(EnrollmentStatus::Pending.as_str().into()),
        enrolled_at: Set(None),
        cancelled_at: Set(None),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await;

    let enrollment = match insert {
        Ok(e) => e,
        Err(err) => {
            // A concurrent request won the insert race; the unique
            // constraint on (pet_profile_id, schedule_id) is authoritative.
            let app = AppError::from(err);
            if app.is_unique_violation() {
                return Err(AppError::BadRequest(
                    "Already enrolled in this course schedule".into(),
                ));
            }
            return Err(app);
        }
    };

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "course_enroll",
        Some("enrollments"),
        Some(serde_json::json!({ "enrollment_id": enrollment.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::message_only(
        "Enrolled successfully, please wait for approval",
    ))
}

pub async fn respond_to_admission(
    state: &AppState,
    user: &AuthUser,
    admission_id: Uuid,
    payload: RespondAdmissionRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_school(user)?;

    if payload.status == EnrollmentStatus::Pending {
        return Err(AppError::BadRequest(
            "Response must be APPROVED or REJECTED".into(),
        ));
    }

    let txn = state.orm.begin().await?;

    let enrollment = Enrollments::find_by_id(admission_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?;
    let enrollment = match enrollment {
        Some(e) => e,
        None => return Err(AppError::NotFound),
    };

    let course = Courses::find_by_id(enrollment.course_id).one(&txn).await?;
    let course = match course {
        Some(c) => c,
        None => return Err(AppError::NotFound),
    };
    if course.school_id != user.user_id {
        return Err(AppError::Forbidden);
    }

    // Idempotency guard: a decided admission stays decided.
    if enrollment.status != EnrollmentStatus::Pending.as_str() {
        return Err(AppError::BadRequest(format!(
            "Admission request is already {}",
            enrollment.status.to_lowercase()
        )));
    }

    if payload.status == EnrollmentStatus::Approved {
        // Authoritative seat check: the schedule row is locked until commit,
        // so two approvals cannot both take the last seat.
        let schedule = CourseSchedules::find_by_id(enrollment.schedule_id)
            .lock(LockType::Update)
            .one(&txn)
            .await?;
        let schedule = match schedule {
            Some(s) => s,
            None => return Err(AppError::NotFound),
        };
        if schedule.available_seats <= 0 {
            return Err(AppError::BadRequest(
                "No seats available for this schedule".into(),
            ));
        }

        CourseSchedules::update_many()
            .col_expr(
                ScheduleCol::AvailableSeats,
                Expr::col(ScheduleCol::AvailableSeats).sub(1),
            )
            .filter(ScheduleCol::Id.eq(enrollment.schedule_id))
            .exec(&txn)
            .await?;
    }

    let mut active: EnrollmentActive = enrollment.into();
    active.status = Set(payload.status.as_str().into());
    match payload.status {
        EnrollmentStatus::Approved => active.enrolled_at = Set(Some(Utc::now().into())),
        EnrollmentStatus::Rejected => active.cancelled_at = Set(Some(Utc::now().into())),
        EnrollmentStatus::Pending => unreachable!(),
    }
    let enrollment = active.update(&txn).await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "admission_respond",
        Some("enrollments"),
        Some(serde_json::json!({ "enrollment_id": enrollment.id, "status": enrollment.status })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let message = if payload.status == EnrollmentStatus::Approved {
        "Admission request accepted"
    } else {
        "Admission request rejected"
    };
    Ok(ApiResponse::message_only(message))
}

#[derive(Debug, FromQueryResult)]
struct AdmissionRow {
    id: Uuid,
    pet_name: String,
    course_name: String,
    schedule_time: String,
    status: String,
    created_at: chrono::DateTime<chrono::FixedOffset>,
}

pub async fn list_enroll_requests(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<AdmissionList>> {
    ensure_school(user)?;

    let rows = Enrollments::find()
        .select_only()
        .column_as(EnrollCol::Id, "id")
        .column_as(EnrollCol::Status, "status")
        .column_as(EnrollCol::CreatedAt, "created_at")
        .join(JoinType::InnerJoin, enrollments::Relation::Courses.def())
        .join(JoinType::InnerJoin, enrollments::Relation::PetProfiles.def())
        .join(
            JoinType::InnerJoin,
            enrollments::Relation::CourseSchedules.def(),
        )
        .column_as(PetCol::PetName, "pet_name")
        .column_as(CourseCol::Name, "course_name")
        .column_as(ScheduleCol::Time, "schedule_time")
        .filter(CourseCol::SchoolId.eq(user.user_id))
        .order_by_desc(EnrollCol::CreatedAt)
        .into_model::<AdmissionRow>()
        .all(&state.orm)
        .await?;

    let items = rows.into_iter().map(admission_from_row).collect();
    Ok(ApiResponse::success(
        "Enroll requests found",
        AdmissionList { items },
        None,
    ))
}

pub async fn get_admission_details(
    state: &AppState,
    user: &AuthUser,
    admission_id: Uuid,
) -> AppResult<ApiResponse<AdmissionRequestDto>> {
    ensure_school(user)?;

    let row = Enrollments::find()
        .select_only()
        .column_as(EnrollCol::Id, "id")
        .column_as(EnrollCol::Status, "status")
        .column_as(EnrollCol::CreatedAt, "created_at")
        .join(JoinType::InnerJoin, enrollments::Relation::Courses.def())
        .join(JoinType::InnerJoin, enrollments::Relation::PetProfiles.def())
        .join(
            JoinType::InnerJoin,
            enrollments::Relation::CourseSchedules.def(),
        )
        .column_as(PetCol::PetName, "pet_name")
        .column_as(CourseCol::Name, "course_name")
        .column_as(ScheduleCol::Time, "schedule_time")
        .filter(EnrollCol::Id.eq(admission_id))
        .filter(CourseCol::SchoolId.eq(user.user_id))
        .into_model::<AdmissionRow>()
        .one(&state.orm)
        .await?;

    let row = match row {
        Some(r) => r,
        None => return Err(AppError::NotFound),
    };

    Ok(ApiResponse::success(
        "Admission request found",
        admission_from_row(row),
        None,
    ))
}

fn admission_from_row(row: AdmissionRow) -> AdmissionRequestDto {
    AdmissionRequestDto {
        id: row.id,
        pet_name: row.pet_name,
        course_name: row.course_name,
        schedule_time: row.schedule_time,
        status: row.status,
        created_at: row.created_at.with_timezone(&Utc),
    }
}
