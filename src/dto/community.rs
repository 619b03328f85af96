use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, ToSchema)]
pub struct ToggleResult {
    pub engaged: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BookmarkedPost {
    pub id: Uuid,
    pub caption: Option<String>,
    pub media: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BookmarkedReel {
    pub id: Uuid,
    pub caption: Option<String>,
    pub video: String,
    pub duration: Option<i32>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BookmarkDto {
    pub id: Uuid,
    pub target_type: String,
    pub created_at: DateTime<Utc>,
    pub post: Option<BookmarkedPost>,
    pub reel: Option<BookmarkedReel>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BookmarkPage {
    pub items: Vec<BookmarkDto>,
    pub next_cursor: Option<Uuid>,
}
