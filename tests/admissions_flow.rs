mod common;

use pet_marketplace_api::{
    dto::admissions::{EnrollCourseRequest, RespondAdmissionRequest},
    entity::{
        course_schedules::{ActiveModel as ScheduleActive, Entity as CourseSchedules},
        courses::ActiveModel as CourseActive,
        enrollments::{Column as EnrollCol, Entity as Enrollments},
        pet_profiles::ActiveModel as PetActive,
    },
    error::AppError,
    middleware::auth::AuthUser,
    models::EnrollmentStatus,
    services::admission_service,
    state::AppState,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

// Integration flow: two owners race for the single seat of a schedule.
// Requests are cheap; the seat is only consumed when the school approves.
#[tokio::test]
async fn admission_request_and_approval_flow() -> anyhow::Result<()> {
    let database_url = match common::test_database_url() {
        Some(url) => url,
        None => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(());
        }
    };

    let state = common::setup_state(&database_url).await?;

    let school_id = common::create_user(&state, "school", "school@example.com").await?;
    let other_school_id = common::create_user(&state, "school", "school2@example.com").await?;
    let owner_a_id = common::create_user(&state, "user", "owner-a@example.com").await?;
    let owner_b_id = common::create_user(&state, "user", "owner-b@example.com").await?;

    let school = AuthUser {
        user_id: school_id,
        role: "school".into(),
    };
    let other_school = AuthUser {
        user_id: other_school_id,
        role: "school".into(),
    };
    let owner_a = AuthUser {
        user_id: owner_a_id,
        role: "user".into(),
    };
    let owner_b = AuthUser {
        user_id: owner_b_id,
        role: "user".into(),
    };

    let course_id = create_course(&state, school_id, "Puppy Obedience").await?;
    let schedule_id = create_schedule(&state, course_id, 1).await?;
    let pet_a = create_pet(&state, owner_a_id, "Milo").await?;
    let pet_b = create_pet(&state, owner_b_id, "Luna").await?;

    // Enrolling someone else's pet is refused outright.
    let err = admission_service::enroll_to_course(
        &state,
        &owner_a,
        EnrollCourseRequest {
            course_id,
            schedule_id,
            pet_profile_id: pet_b,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    // Both owners request the one remaining seat.
    admission_service::enroll_to_course(
        &state,
        &owner_a,
        EnrollCourseRequest {
            course_id,
            schedule_id,
            pet_profile_id: pet_a,
        },
    )
    .await?;
    admission_service::enroll_to_course(
        &state,
        &owner_b,
        EnrollCourseRequest {
            course_id,
            schedule_id,
            pet_profile_id: pet_b,
        },
    )
    .await?;

    // Same pet, same schedule: the second request is a duplicate.
    let err = admission_service::enroll_to_course(
        &state,
        &owner_a,
        EnrollCourseRequest {
            course_id,
            schedule_id,
            pet_profile_id: pet_a,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(ref msg) if msg.contains("Already enrolled")));

    let admission_a = find_enrollment(&state, pet_a).await?;
    let admission_b = find_enrollment(&state, pet_b).await?;

    // Only the owning school may decide, and a PENDING verdict is not a verdict.
    assert!(matches!(
        admission_service::respond_to_admission(
            &state,
            &other_school,
            admission_a,
            RespondAdmissionRequest {
                status: EnrollmentStatus::Approved,
            },
        )
        .await
        .unwrap_err(),
        AppError::Forbidden
    ));
    assert!(matches!(
        admission_service::respond_to_admission(
            &state,
            &school,
            admission_a,
            RespondAdmissionRequest {
                status: EnrollmentStatus::Pending,
            },
        )
        .await
        .unwrap_err(),
        AppError::BadRequest(_)
    ));

    let requests = admission_service::list_enroll_requests(&state, &school).await?;
    assert_eq!(requests.data.unwrap().items.len(), 2);

    // First approval takes the seat.
    admission_service::respond_to_admission(
        &state,
        &school,
        admission_a,
        RespondAdmissionRequest {
            status: EnrollmentStatus::Approved,
        },
    )
    .await?;
    let schedule = CourseSchedules::find_by_id(schedule_id)
        .one(&state.orm)
        .await?
        .unwrap();
    assert_eq!(schedule.available_seats, 0);

    let approved = Enrollments::find_by_id(admission_a).one(&state.orm).await?.unwrap();
    assert_eq!(approved.status, EnrollmentStatus::Approved.as_str());
    assert!(approved.enrolled_at.is_some());

    // A decided admission stays decided.
    let err = admission_service::respond_to_admission(
        &state,
        &school,
        admission_a,
        RespondAdmissionRequest {
            status: EnrollmentStatus::Rejected,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(ref msg) if msg.contains("already")));

    // The second approval finds no seat left; the request stays pending.
    let err = admission_service::respond_to_admission(
        &state,
        &school,
        admission_b,
        RespondAdmissionRequest {
            status: EnrollmentStatus::Approved,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(ref msg) if msg.contains("No seats")));
    let pending = Enrollments::find_by_id(admission_b).one(&state.orm).await?.unwrap();
    assert_eq!(pending.status, EnrollmentStatus::Pending.as_str());

    // Rejection works without a seat and stamps cancelled_at.
    admission_service::respond_to_admission(
        &state,
        &school,
        admission_b,
        RespondAdmissionRequest {
            status: EnrollmentStatus::Rejected,
        },
    )
    .await?;
    let rejected = Enrollments::find_by_id(admission_b).one(&state.orm).await?.unwrap();
    assert_eq!(rejected.status, EnrollmentStatus::Rejected.as_str());
    assert!(rejected.cancelled_at.is_some());

    // With zero seats, new requests are turned away at the door.
    let pet_c = create_pet(&state, owner_a_id, "Biscuit").await?;
    let err = admission_service::enroll_to_course(
        &state,
        &owner_a,
        EnrollCourseRequest {
            course_id,
            schedule_id,
            pet_profile_id: pet_c,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(ref msg) if msg.contains("No seats")));

    Ok(())
}

async fn create_course(state: &AppState, school_id: Uuid, name: &str) -> anyhow::Result<Uuid> {
    let course = CourseActive {
        id: Set(Uuid::new_v4()),
        school_id: Set(school_id),
        name: Set(name.into()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(course.id)
}

async fn create_schedule(state: &AppState, course_id: Uuid, seats: i32) -> anyhow::Result<Uuid> {
    let schedule = ScheduleActive {
        id: Set(Uuid::new_v4()),
        course_id: Set(course_id),
        time: Set("Saturdays 10:00".into()),
        total_seats: Set(seats),
        available_seats: Set(seats),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(schedule.id)
}

async fn create_pet(state: &AppState, owner_id: Uuid, name: &str) -> anyhow::Result<Uuid> {
    let pet = PetActive {
        id: Set(Uuid::new_v4()),
        owner_id: Set(owner_id),
        pet_name: Set(name.into()),
        pet_type: Set("dog".into()),
        breed: Set(None),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(pet.id)
}

async fn find_enrollment(state: &AppState, pet_profile_id: Uuid) -> anyhow::Result<Uuid> {
    let enrollment = Enrollments::find()
        .filter(EnrollCol::PetProfileId.eq(pet_profile_id))
        .one(&state.orm)
        .await?
        .expect("enrollment row");
    Ok(enrollment.id)
}
