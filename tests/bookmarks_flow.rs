mod common;

use pet_marketplace_api::{
    entity::posts::{ActiveModel as PostActive, Entity as Posts},
    entity::reels::ActiveModel as ReelActive,
    error::AppError,
    middleware::auth::AuthUser,
    models::content_state,
    routes::params::BookmarkListQuery,
    services::bookmark_service::{self, relation, target_type},
    state::AppState,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use uuid::Uuid;

// Integration flow: toggling bookmarks and likes on posts and reels, and
// listings that hide targets withdrawn after being bookmarked.
#[tokio::test]
async fn bookmark_toggle_and_listing_flow() -> anyhow::Result<()> {
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

    let author_id = common::create_user(&state, "user", "author@example.com").await?;
    let reader_id = common::create_user(&state, "user", "reader@example.com").await?;
    let reader = AuthUser {
        user_id: reader_id,
        role: "user".into(),
    };

    let post_a = create_post(&state, author_id, "Beach day", content_state::ACTIVE).await?;
    let post_b = create_post(&state, author_id, "Nap time", content_state::ACTIVE).await?;
    let gone_post = create_post(&state, author_id, "Oops", content_state::DELETED).await?;
    let reel = create_reel(&state, author_id, "Zoomies").await?;

    // Withdrawn targets cannot be engaged with at all.
    let err = bookmark_service::toggle(&state, &reader, target_type::POST, gone_post, relation::BOOKMARK)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    // Toggle flips membership each time.
    let on = bookmark_service::toggle(&state, &reader, target_type::POST, post_a, relation::BOOKMARK)
        .await?
        .data
        .unwrap();
    assert!(on.engaged);
    let off = bookmark_service::toggle(&state, &reader, target_type::POST, post_a, relation::BOOKMARK)
        .await?
        .data
        .unwrap();
    assert!(!off.engaged);
    let on_again =
        bookmark_service::toggle(&state, &reader, target_type::POST, post_a, relation::BOOKMARK)
            .await?
            .data
            .unwrap();
    assert!(on_again.engaged);

    // Likes and bookmarks are independent relations on the same target.
    let liked = bookmark_service::toggle(&state, &reader, target_type::POST, post_a, relation::LIKE)
        .await?
        .data
        .unwrap();
    assert!(liked.engaged);

    bookmark_service::toggle(&state, &reader, target_type::POST, post_b, relation::BOOKMARK).await?;
    bookmark_service::toggle(&state, &reader, target_type::REEL, reel, relation::BOOKMARK).await?;

    // Likes never show up in the bookmark listing.
    let all = list(&state, &reader, None).await?;
    assert_eq!(all.len(), 3);

    let posts_only = list(&state, &reader, Some("post".into())).await?;
    assert_eq!(posts_only.len(), 2);
    assert!(posts_only.iter().all(|b| b.target_type == target_type::POST));

    // A target deleted after being bookmarked disappears from the listing
    // and its bookmark detail turns into NotFound.
    set_post_state(&state, post_b, content_state::DELETED).await?;
    let visible = list(&state, &reader, None).await?;
    assert_eq!(visible.len(), 2);
    assert!(visible.iter().all(|b| b.post.as_ref().map(|p| p.id) != Some(post_b)));

    let hidden_bookmark_id = all
        .iter()
        .find(|b| b.post.as_ref().map(|p| p.id) == Some(post_b))
        .map(|b| b.id)
        .expect("bookmark for post_b");
    let err = bookmark_service::get_bookmark(&state, &reader, hidden_bookmark_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    // Surviving bookmarks still resolve, with their target attached.
    let detail = bookmark_service::get_bookmark(&state, &reader, visible[0].id)
        .await?
        .data
        .unwrap();
    assert!(detail.post.is_some() || detail.reel.is_some());

    // Another user's bookmarks are invisible.
    let author = AuthUser {
        user_id: author_id,
        role: "user".into(),
    };
    let theirs = list(&state, &author, None).await?;
    assert!(theirs.is_empty());

    Ok(())
}

async fn list(
    state: &AppState,
    user: &AuthUser,
    filter: Option<String>,
) -> anyhow::Result<Vec<pet_marketplace_api::dto::community::BookmarkDto>> {
    let page = bookmark_service::list_my_bookmarks(
        state,
        user,
        BookmarkListQuery {
            cursor: None,
            limit: None,
            filter,
        },
    )
    .await?
    .data
    .unwrap();
    Ok(page.items)
}

async fn create_post(
    state: &AppState,
    author_id: Uuid,
    caption: &str,
    post_state: &str,
) -> anyhow::Result<Uuid> {
    let post = PostActive {
        id: Set(Uuid::new_v4()),
        author_id: Set(author_id),
        caption: Set(Some(caption.into())),
        media: Set(None),
        state: Set(post_state.into()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(post.id)
}

async fn create_reel(state: &AppState, author_id: Uuid, caption: &str) -> anyhow::Result<Uuid> {
    let reel = ReelActive {
        id: Set(Uuid::new_v4()),
        author_id: Set(author_id),
        caption: Set(Some(caption.into())),
        video: Set("https://cdn.example.com/clip.mp4".into()),
        duration: Set(Some(30)),
        state: Set(content_state::ACTIVE.into()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(reel.id)
}

async fn set_post_state(state: &AppState, post_id: Uuid, new_state: &str) -> anyhow::Result<()> {
    let post = Posts::find_by_id(post_id).one(&state.orm).await?.unwrap();
    let mut active: PostActive = post.into();
    active.state = Set(new_state.into());
    active.update(&state.orm).await?;
    Ok(())
}
