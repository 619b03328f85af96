mod common;

use pet_marketplace_api::{
    dto::{
        admissions::{EnrollCourseRequest, RespondAdmissionRequest},
        cart::AddToCartRequest,
        orders::CreateOrderRequest,
    },
    entity::{
        course_schedules::{ActiveModel as ScheduleActive, Entity as CourseSchedules},
        courses::ActiveModel as CourseActive,
        enrollments::{Column as EnrollCol, Entity as Enrollments},
        pet_profiles::ActiveModel as PetActive,
        products::ActiveModel as ProductActive,
        shipping_addresses::ActiveModel as AddressActive,
        variants::{ActiveModel as VariantActive, Entity as Variants},
    },
    middleware::auth::AuthUser,
    models::EnrollmentStatus,
    services::{admission_service, cart_service, order_service},
    state::AppState,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

// Two callers race for the last unit of stock and the last seat of a
// schedule. The row locks serialize the transactions, so exactly one
// caller on each side wins and nothing goes negative.
#[tokio::test]
async fn last_unit_goes_to_exactly_one_caller() -> anyhow::Result<()> {
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

    // --- checkout: one unit, two buyers ---

    let vendor_id = common::create_user(&state, "vendor", "vendor@example.com").await?;
    let buyer_a_id = common::create_user(&state, "user", "buyer-a@example.com").await?;
    let buyer_b_id = common::create_user(&state, "user", "buyer-b@example.com").await?;
    let buyer_a = AuthUser {
        user_id: buyer_a_id,
        role: "user".into(),
    };
    let buyer_b = AuthUser {
        user_id: buyer_b_id,
        role: "user".into(),
    };

    let variant_id = create_variant(&state, vendor_id, "Last Chew Rope", 1000, 1).await?;
    let address_a = create_address(&state, buyer_a_id).await?;
    let address_b = create_address(&state, buyer_b_id).await?;
    let cart_a = add_to_cart(&state, &buyer_a, variant_id, 1).await?;
    let cart_b = add_to_cart(&state, &buyer_b, variant_id, 1).await?;

    let (res_a, res_b) = tokio::join!(
        order_service::create_order(
            &state,
            &buyer_a,
            CreateOrderRequest {
                cart_item_ids: vec![cart_a],
                shipping_address_id: address_a,
            },
        ),
        order_service::create_order(
            &state,
            &buyer_b,
            CreateOrderRequest {
                cart_item_ids: vec![cart_b],
                shipping_address_id: address_b,
            },
        ),
    );

    let wins = [res_a.is_ok(), res_b.is_ok()].iter().filter(|w| **w).count();
    assert_eq!(wins, 1, "exactly one checkout must take the last unit");

    let variant = Variants::find_by_id(variant_id).one(&state.orm).await?.unwrap();
    assert_eq!(variant.stock, 0);

    // --- admission: one seat, two pending requests ---

    let school_id = common::create_user(&state, "school", "school@example.com").await?;
    let school = AuthUser {
        user_id: school_id,
        role: "school".into(),
    };

    let course = CourseActive {
        id: Set(Uuid::new_v4()),
        school_id: Set(school_id),
        name: Set("Agility Basics".into()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    let schedule = ScheduleActive {
        id: Set(Uuid::new_v4()),
        course_id: Set(course.id),
        time: Set("Sundays 09:00".into()),
        total_seats: Set(1),
        available_seats: Set(1),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    let pet_a = create_pet(&state, buyer_a_id, "Milo").await?;
    let pet_b = create_pet(&state, buyer_b_id, "Luna").await?;
    for (owner, pet) in [(&buyer_a, pet_a), (&buyer_b, pet_b)] {
        admission_service::enroll_to_course(
            &state,
            owner,
            EnrollCourseRequest {
                course_id: course.id,
                schedule_id: schedule.id,
                pet_profile_id: pet,
            },
        )
        .await?;
    }

    let admission_a = find_enrollment(&state, pet_a).await?;
    let admission_b = find_enrollment(&state, pet_b).await?;

    let (res_a, res_b) = tokio::join!(
        admission_service::respond_to_admission(
            &state,
            &school,
            admission_a,
            RespondAdmissionRequest {
                status: EnrollmentStatus::Approved,
            },
        ),
        admission_service::respond_to_admission(
            &state,
            &school,
            admission_b,
            RespondAdmissionRequest {
                status: EnrollmentStatus::Approved,
            },
        ),
    );

    let wins = [res_a.is_ok(), res_b.is_ok()].iter().filter(|w| **w).count();
    assert_eq!(wins, 1, "exactly one approval must take the last seat");

    let schedule = CourseSchedules::find_by_id(schedule.id)
        .one(&state.orm)
        .await?
        .unwrap();
    assert_eq!(schedule.available_seats, 0);

    let approved = Enrollments::find()
        .filter(EnrollCol::Status.eq(EnrollmentStatus::Approved.as_str()))
        .all(&state.orm)
        .await?;
    assert_eq!(approved.len(), 1);

    Ok(())
}

async fn create_variant(
    state: &AppState,
    vendor_id: Uuid,
    name: &str,
    price: i64,
    stock: i32,
) -> anyhow::Result<Uuid> {
    let product = ProductActive {
        id: Set(Uuid::new_v4()),
        vendor_id: Set(vendor_id),
        name: Set(name.into()),
        description: Set(None),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    let variant = VariantActive {
        id: Set(Uuid::new_v4()),
        product_id: Set(product.id),
        attributes: Set(serde_json::json!({})),
        original_price: Set(price),
        selling_price: Set(price),
        stock: Set(stock),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(variant.id)
}

async fn create_address(state: &AppState, user_id: Uuid) -> anyhow::Result<Uuid> {
    let address = AddressActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        label: Set("Home".into()),
        address_line: Set("12 Harbor Lane".into()),
        city: Set("Portsmouth".into()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(address.id)
}

async fn add_to_cart(
    state: &AppState,
    user: &AuthUser,
    variant_id: Uuid,
    quantity: i32,
) -> anyhow::Result<Uuid> {
    let resp = cart_service::add_to_cart(
        &state.pool,
        user,
        AddToCartRequest {
            variant_id,
            quantity,
        },
    )
    .await?;
    Ok(resp.data.unwrap().id)
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
