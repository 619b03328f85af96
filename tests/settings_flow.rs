mod common;

use pet_marketplace_api::{
    dto::settings::UpdateSettingsRequest,
    entity::platform_settings_history::Entity as History,
    error::AppError,
    middleware::auth::AuthUser,
    routes::params::CursorQuery,
    services::settings_service,
};
use sea_orm::{EntityTrait, PaginatorTrait};

// Integration flow: every effective settings change appends a history row
// and bumps the version; no-op saves leave no trace.
#[tokio::test]
async fn settings_versioning_and_history_flow() -> anyhow::Result<()> {
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

    let admin_id = common::create_user(&state, "admin", "admin@example.com").await?;
    let user_id = common::create_user(&state, "user", "user@example.com").await?;

    let admin = AuthUser {
        user_id: admin_id,
        role: "admin".into(),
    };
    // A token can claim admin; the stored role is what counts.
    let impostor = AuthUser {
        user_id,
        role: "admin".into(),
    };

    assert!(matches!(
        settings_service::get_platform_settings(&state, &impostor)
            .await
            .unwrap_err(),
        AppError::Forbidden
    ));

    // First read bootstraps the singleton with defaults at version 1.
    let settings = settings_service::get_platform_settings(&state, &admin)
        .await?
        .data
        .unwrap();
    assert_eq!(settings.platform_fee_bps, 200);
    assert_eq!(settings.commission_rate_bps, 1000);
    assert_eq!(settings.version, 1);

    // Effective change: version 2, one history row recording old and new.
    let updated = settings_service::update_platform_settings(
        &state,
        &admin,
        UpdateSettingsRequest {
            platform_fee_bps: Some(300),
            commission_rate_bps: None,
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(updated.platform_fee_bps, 300);
    assert_eq!(updated.version, 2);

    // Saving the same values again must not bump anything.
    let noop = settings_service::update_platform_settings(
        &state,
        &admin,
        UpdateSettingsRequest {
            platform_fee_bps: Some(300),
            commission_rate_bps: Some(1000),
        },
    )
    .await?;
    assert_eq!(noop.message, "No changes detected");
    assert_eq!(noop.data.unwrap().version, 2);
    assert_eq!(History::find().count(&state.orm).await?, 1);

    // Second effective change: version 3, two history rows.
    let updated = settings_service::update_platform_settings(
        &state,
        &admin,
        UpdateSettingsRequest {
            platform_fee_bps: None,
            commission_rate_bps: Some(1200),
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(updated.version, 3);
    assert_eq!(History::find().count(&state.orm).await?, 2);

    // History is newest first and records the transition, not just the result.
    let page = settings_service::get_platform_settings_history(
        &state,
        &admin,
        CursorQuery {
            cursor: None,
            limit: None,
            search: None,
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(page.items.len(), 2);
    assert!(page.next_cursor.is_none());
    let newest = &page.items[0];
    assert_eq!(newest.commission_rate_old, 1000);
    assert_eq!(newest.commission_rate_new, 1200);
    assert_eq!(newest.updated_by_email, "admin@example.com");
    let oldest = &page.items[1];
    assert_eq!(oldest.platform_fee_old, 200);
    assert_eq!(oldest.platform_fee_new, 300);

    // Keyset pagination: page of one, then continue from the cursor.
    let first = settings_service::get_platform_settings_history(
        &state,
        &admin,
        CursorQuery {
            cursor: None,
            limit: Some(1),
            search: None,
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(first.items.len(), 1);
    let cursor = first.next_cursor.expect("cursor for next page");

    let second = settings_service::get_platform_settings_history(
        &state,
        &admin,
        CursorQuery {
            cursor: Some(cursor),
            limit: Some(1),
            search: None,
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(second.items.len(), 1);
    assert_ne!(first.items[0].id, second.items[0].id);
    assert!(second.next_cursor.is_none());

    // Search narrows by the updating admin, not the values.
    let none = settings_service::get_platform_settings_history(
        &state,
        &admin,
        CursorQuery {
            cursor: None,
            limit: None,
            search: Some("nobody".into()),
        },
    )
    .await?
    .data
    .unwrap();
    assert!(none.items.is_empty());

    Ok(())
}
