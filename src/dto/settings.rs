use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateSettingsRequest {
    /// Basis points; omitted fields are carried forward unchanged.
    pub platform_fee_bps: Option<i32>,
    pub commission_rate_bps: Option<i32>,
}

#[derive(Debug, Serialize, ToSchema, sqlx::FromRow)]
pub struct SettingsHistoryEntry {
    pub id: Uuid,
    pub version: i32,
    pub platform_fee_old: i32,
    pub platform_fee_new: i32,
    pub commission_rate_old: i32,
    pub commission_rate_new: i32,
    pub updated_at: DateTime<Utc>,
    pub updated_by_name: String,
    pub updated_by_email: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SettingsHistoryPage {
    pub items: Vec<SettingsHistoryEntry>,
    pub next_cursor: Option<Uuid>,
}
