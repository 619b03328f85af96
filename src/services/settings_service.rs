use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, EntityTrait, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    config::{DEFAULT_COMMISSION_RATE_BPS, DEFAULT_PLATFORM_FEE_BPS},
    dto::settings::{SettingsHistoryEntry, SettingsHistoryPage, UpdateSettingsRequest},
    entity::{
        platform_settings::{
            ActiveModel as SettingsActive, Entity as SettingsEntity, Model as SettingsModel,
        },
        platform_settings_history::ActiveModel as HistoryActive,
        users::Entity as Users,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{PlatformSettings, roles},
    response::{ApiResponse, Meta},
    routes::params::CursorQuery,
    state::AppState,
};

/// Well-known primary key of the settings singleton.
pub const SETTINGS_ID: &str = "PLATFORM_SETTINGS";

/// Fee rate consumed by checkout. Callers inside a transaction pass the
/// transaction handle so the read shares its snapshot.
pub async fn platform_fee_bps<C: ConnectionTrait>(conn: &C) -> AppResult<i32> {
    let settings = SettingsEntity::find_by_id(SETTINGS_ID).one(conn).await?;
    Ok(settings
        .map(|s| s.platform_fee_bps)
        .unwrap_or(DEFAULT_PLATFORM_FEE_BPS))
}

/// The role check re-reads the user row; a stale token alone is not enough
/// to change platform settings.
async fn ensure_stored_admin(state: &AppState, user: &AuthUser) -> AppResult<()> {
    let admin = Users::find_by_id(user.user_id).one(&state.orm).await?;
    let admin = match admin {
        Some(u) => u,
        None => return Err(AppError::NotFound),
    };
    if admin.role != roles::ADMIN {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

pub async fn update_platform_settings(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateSettingsRequest,
) -> AppResult<ApiResponse<PlatformSettings>> {
    ensure_stored_admin(state, user).await?;

    let txn = state.orm.begin().await?;

    let settings = SettingsEntity::find_by_id(SETTINGS_ID)
        .lock(LockType::Update)
        .one(&txn)
        .await?;

    let settings = match settings {
        None => {
            // Bootstrap: first write creates the singleton at version 1,
            // with no history entry.
            let created = SettingsActive {
                id: Set(SETTINGS_ID.into()),
                platform_fee_bps: Set(payload
                    .platform_fee_bps
                    .unwrap_or(DEFAULT_PLATFORM_FEE_BPS)),
                commission_rate_bps: Set(payload
                    .commission_rate_bps
                    .unwrap_or(DEFAULT_COMMISSION_RATE_BPS)),
                version: Set(1),
                created_at: NotSet,
                updated_at: NotSet,
            }
            .insert(&txn)
            .await?;
            txn.commit().await?;
            return Ok(ApiResponse::success(
                "Settings created",
                settings_from_entity(created),
                Some(Meta::empty()),
            ));
        }
        Some(s) => s,
    };

    let fee_changed = payload
        .platform_fee_bps
        .is_some_and(|v| v != settings.platform_fee_bps);
    let rate_changed = payload
        .commission_rate_bps
        .is_some_and(|v| v != settings.commission_rate_bps);

    if !fee_changed && !rate_changed {
        // No-op saves must not pollute the audit trail or bump the version.
        txn.rollback().await?;
        return Ok(ApiResponse::success(
            "No changes detected",
            settings_from_entity(settings),
            Some(Meta::empty()),
        ));
    }

    let now = Utc::now();
    let new_fee = payload.platform_fee_bps.unwrap_or(settings.platform_fee_bps);
    let new_rate = payload
        .commission_rate_bps
        .unwrap_or(settings.commission_rate_bps);

    // History row and version bump commit together or not at all.
    HistoryActive {
        id: Set(Uuid::new_v4()),
        settings_id: Set(settings.id.clone()),
        updated_by: Set(user.user_id),
        version: Set(settings.version),
        platform_fee_old: Set(settings.platform_fee_bps),
        platform_fee_new: Set(new_fee),
        commission_rate_old: Set(settings.commission_rate_bps),
        commission_rate_new: Set(new_rate),
        updated_at: Set(now.into()),
    }
    .insert(&txn)
    .await?;

    let old_version = settings.version;
    let mut active: SettingsActive = settings.into();
    active.platform_fee_bps = Set(new_fee);
    active.commission_rate_bps = Set(new_rate);
    active.version = Set(old_version + 1);
    active.updated_at = Set(now.into());
    let updated = active.update(&txn).await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "settings_update",
        Some("platform_settings"),
        Some(serde_json::json!({ "version": updated.version })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Settings updated",
        settings_from_entity(updated),
        Some(Meta::empty()),
    ))
}

pub async fn get_platform_settings(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<PlatformSettings>> {
    ensure_stored_admin(state, user).await?;

    let settings = SettingsEntity::find_by_id(SETTINGS_ID).one(&state.orm).await?;
    let settings = match settings {
        Some(s) => s,
        None => {
            SettingsActive {
                id: Set(SETTINGS_ID.into()),
                platform_fee_bps: Set(DEFAULT_PLATFORM_FEE_BPS),
                commission_rate_bps: Set(DEFAULT_COMMISSION_RATE_BPS),
                version: Set(1),
                created_at: NotSet,
                updated_at: NotSet,
            }
            .insert(&state.orm)
            .await?
        }
    };

    Ok(ApiResponse::success(
        "Settings fetched",
        settings_from_entity(settings),
        Some(Meta::empty()),
    ))
}

pub async fn get_platform_settings_history(
    state: &AppState,
    user: &AuthUser,
    query: CursorQuery,
) -> AppResult<ApiResponse<SettingsHistoryPage>> {
    ensure_stored_admin(state, user).await?;

    let limit = query.limit.unwrap_or(20).clamp(1, 50);
    let search = query
        .search
        .as_ref()
        .filter(|s| !s.is_empty())
        .map(|s| format!("%{}%", s));

    // Keyset pagination on (updated_at, id): updated_at alone is not a
    // total order, the id tiebreak keeps pages stable.
    let rows: Vec<SettingsHistoryEntry> = sqlx::query_as(
        r#"
        SELECT h.id, h.version,
               h.platform_fee_old, h.platform_fee_new,
               h.commission_rate_old, h.commission_rate_new,
               h.updated_at,
               u.full_name AS updated_by_name, u.email AS updated_by_email
        FROM platform_settings_history h
        JOIN users u ON u.id = h.updated_by
        WHERE ($1::uuid IS NULL OR (h.updated_at, h.id) <
               (SELECT updated_at, id FROM platform_settings_history WHERE id = $1))
          AND ($2::text IS NULL OR u.full_name ILIKE $2 OR u.email ILIKE $2)
        ORDER BY h.updated_at DESC, h.id DESC
        LIMIT $3
        "#,
    )
    .bind(query.cursor)
    .bind(search)
    .bind(limit + 1)
    .fetch_all(&state.pool)
    .await?;

    let has_next = rows.len() as i64 > limit;
    let mut items = rows;
    if has_next {
        items.truncate(limit as usize);
    }
    let next_cursor = if has_next {
        items.last().map(|e| e.id)
    } else {
        None
    };

    Ok(ApiResponse::success(
        "Settings history fetched",
        SettingsHistoryPage { items, next_cursor },
        Some(Meta::empty()),
    ))
}

fn settings_from_entity(model: SettingsModel) -> PlatformSettings {
    PlatformSettings {
        id: model.id,
        platform_fee_bps: model.platform_fee_bps,
        commission_rate_bps: model.commission_rate_bps,
        version: model.version,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}
