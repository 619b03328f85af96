use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, ModelTrait, QueryFilter, QuerySelect,
    Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::community::{BookmarkDto, BookmarkPage, BookmarkedPost, BookmarkedReel, ToggleResult},
    entity::{
        engagements::{ActiveModel as EngagementActive, Column as EngCol, Entity as Engagements},
        posts::{Column as PostCol, Entity as Posts},
        reels::{Column as ReelCol, Entity as Reels},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::content_state,
    response::{ApiResponse, Meta},
    routes::params::BookmarkListQuery,
    state::AppState,
};

pub mod target_type {
    pub const POST: &str = "post";
    pub const REEL: &str = "reel";
}

pub mod relation {
    pub const BOOKMARK: &str = "bookmark";
    pub const LIKE: &str = "like";
}

/// Flip one membership row on or off. The composite unique constraint on
/// (user_id, target_type, target_id, relation) makes concurrent toggles
/// safe: losing an insert race is handled by re-running the toggle, which
/// then sees the winner's row and resolves to a delete.
pub async fn toggle(
    state: &AppState,
    user: &AuthUser,
    target_type: &str,
    target_id: Uuid,
    relation: &str,
) -> AppResult<ApiResponse<ToggleResult>> {
    ensure_target_active(state, target_type, target_id).await?;

    let engaged = match toggle_once(state, user, target_type, target_id, relation).await {
        Ok(v) => v,
        Err(err) if err.is_unique_violation() => {
            toggle_once(state, user, target_type, target_id, relation).await?
        }
        Err(err) => return Err(err),
    };

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "engagement_toggle",
        Some("engagements"),
        Some(serde_json::json!({
            "target_type": target_type,
            "target_id": target_id,
            "relation": relation,
            "engaged": engaged,
        })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let verb = if engaged { "added" } else { "removed" };
    Ok(ApiResponse::success(
        format!("{} {} {}", target_type, relation, verb),
        ToggleResult { engaged },
        Some(Meta::empty()),
    ))
}

async fn toggle_once(
    state: &AppState,
    user: &AuthUser,
    target_type: &str,
    target_id: Uuid,
    relation: &str,
) -> AppResult<bool> {
    let txn = state.orm.begin().await?;

    let existing = Engagements::find()
        .filter(
            Condition::all()
                .add(EngCol::UserId.eq(user.user_id))
                .add(EngCol::TargetType.eq(target_type))
                .add(EngCol::TargetId.eq(target_id))
                .add(EngCol::Relation.eq(relation)),
        )
        .lock(LockType::Update)
        .one(&txn)
        .await?;

    let engaged = match existing {
        Some(row) => {
            row.delete(&txn).await?;
            false
        }
        None => {
            EngagementActive {
                id: Set(Uuid::new_v4()),
                user_id: Set(user.user_id),
                target_type: Set(target_type.into()),
                target_id: Set(target_id),
                relation: Set(relation.into()),
                created_at: NotSet,
            }
            .insert(&txn)
            .await?;
            true
        }
    };

    txn.commit().await?;
    Ok(engaged)
}

async fn ensure_target_active(
    state: &AppState,
    target_type: &str,
    target_id: Uuid,
) -> AppResult<()> {
    let found = match target_type {
        target_type::POST => Posts::find_by_id(target_id)
            .filter(PostCol::State.eq(content_state::ACTIVE))
            .one(&state.orm)
            .await?
            .is_some(),
        target_type::REEL => Reels::find_by_id(target_id)
            .filter(ReelCol::State.eq(content_state::ACTIVE))
            .one(&state.orm)
            .await?
            .is_some(),
        _ => false,
    };
    if !found {
        return Err(AppError::NotFound);
    }
    Ok(())
}

#[derive(Debug, sqlx::FromRow)]
struct BookmarkRow {
    id: Uuid,
    target_type: String,
    created_at: DateTime<Utc>,
    post_id: Option<Uuid>,
    post_caption: Option<String>,
    post_media: Option<String>,
    post_state: Option<String>,
    post_created_at: Option<DateTime<Utc>>,
    reel_id: Option<Uuid>,
    reel_caption: Option<String>,
    reel_video: Option<String>,
    reel_duration: Option<i32>,
    reel_state: Option<String>,
    reel_created_at: Option<DateTime<Utc>>,
}

pub async fn list_my_bookmarks(
    state: &AppState,
    user: &AuthUser,
    query: BookmarkListQuery,
) -> AppResult<ApiResponse<BookmarkPage>> {
    let limit = query.limit.unwrap_or(20).clamp(1, 50);
    let filter = query
        .filter
        .as_deref()
        .filter(|s| !s.is_empty());

    let rows: Vec<BookmarkRow> = sqlx::query_as(
        r#"
        SELECT e.id, e.target_type, e.created_at,
               p.id AS post_id, p.caption AS post_caption, p.media AS post_media,
               p.state AS post_state, p.created_at AS post_created_at,
               r.id AS reel_id, r.caption AS reel_caption, r.video AS reel_video,
               r.duration AS reel_duration, r.state AS reel_state,
               r.created_at AS reel_created_at
        FROM engagements e
        LEFT JOIN posts p ON e.target_type = 'post' AND p.id = e.target_id
        LEFT JOIN reels r ON e.target_type = 'reel' AND r.id = e.target_id
        WHERE e.user_id = $1
          AND e.relation = 'bookmark'
          AND ($2::text IS NULL OR e.target_type = $2)
          AND ($3::uuid IS NULL OR (e.created_at, e.id) <
               (SELECT created_at, id FROM engagements WHERE id = $3))
        ORDER BY e.created_at DESC, e.id DESC
        LIMIT $4
        "#,
    )
    .bind(user.user_id)
    .bind(filter)
    .bind(query.cursor)
    .bind(limit + 1)
    .fetch_all(&state.pool)
    .await?;

    // A target can go deleted or hidden after it was bookmarked; no hard
    // cascade is assumed, so drop those rows here and recompute the cursor
    // from what actually survived.
    let mut valid: Vec<BookmarkRow> = rows
        .into_iter()
        .filter(|row| {
            (row.target_type == target_type::POST
                && row.post_state.as_deref() == Some(content_state::ACTIVE))
                || (row.target_type == target_type::REEL
                    && row.reel_state.as_deref() == Some(content_state::ACTIVE))
        })
        .collect();

    let next_cursor = if valid.len() as i64 > limit {
        valid.truncate(limit as usize);
        valid.last().map(|row| row.id)
    } else {
        None
    };

    let items = valid.into_iter().map(bookmark_from_row).collect();
    Ok(ApiResponse::success(
        "Bookmarks fetched",
        BookmarkPage { items, next_cursor },
        Some(Meta::empty()),
    ))
}

pub async fn get_bookmark(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<BookmarkDto>> {
    let row: Option<BookmarkRow> = sqlx::query_as(
        r#"
        SELECT e.id, e.target_type, e.created_at,
               p.id AS post_id, p.caption AS post_caption, p.media AS post_media,
               p.state AS post_state, p.created_at AS post_created_at,
               r.id AS reel_id, r.caption AS reel_caption, r.video AS reel_video,
               r.duration AS reel_duration, r.state AS reel_state,
               r.created_at AS reel_created_at
        FROM engagements e
        LEFT JOIN posts p ON e.target_type = 'post' AND p.id = e.target_id
        LEFT JOIN reels r ON e.target_type = 'reel' AND r.id = e.target_id
        WHERE e.id = $1 AND e.user_id = $2 AND e.relation = 'bookmark'
        "#,
    )
    .bind(id)
    .bind(user.user_id)
    .fetch_optional(&state.pool)
    .await?;

    let row = match row {
        Some(r) => r,
        None => return Err(AppError::NotFound),
    };

    let active = (row.target_type == target_type::POST
        && row.post_state.as_deref() == Some(content_state::ACTIVE))
        || (row.target_type == target_type::REEL
            && row.reel_state.as_deref() == Some(content_state::ACTIVE));
    if !active {
        return Err(AppError::NotFound);
    }

    Ok(ApiResponse::success(
        "Bookmark found",
        bookmark_from_row(row),
        Some(Meta::empty()),
    ))
}

fn bookmark_from_row(row: BookmarkRow) -> BookmarkDto {
    let post = match (row.post_id, row.post_created_at) {
        (Some(id), Some(created_at)) => Some(BookmarkedPost {
            id,
            caption: row.post_caption,
            media: row.post_media,
            created_at,
        }),
        _ => None,
    };
    let reel = match (row.reel_id, row.reel_video.clone(), row.reel_created_at) {
        (Some(id), Some(video), Some(created_at)) => Some(BookmarkedReel {
            id,
            caption: row.reel_caption,
            video,
            duration: row.reel_duration,
            created_at,
        }),
        _ => None,
    };
    BookmarkDto {
        id: row.id,
        target_type: row.target_type,
        created_at: row.created_at,
        post,
        reel,
    }
}
