use sea_orm::entity::prelude::*;

/// Singleton row keyed by the fixed id `PLATFORM_SETTINGS`. `version` is
/// monotonic and bumps by exactly one per applied change.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "platform_settings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub platform_fee_bps: i32,
    pub commission_rate_bps: i32,
    pub version: i32,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::platform_settings_history::Entity")]
    History,
}

impl Related<super::platform_settings_history::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::History.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
