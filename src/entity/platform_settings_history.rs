use sea_orm::entity::prelude::*;

/// Append-only ledger. Rows are never updated or deleted.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "platform_settings_history")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: Uuid,
    pub settings_id: String,
    pub updated_by: Uuid,
    pub version: i32,
    pub platform_fee_old: i32,
    pub platform_fee_new: i32,
    pub commission_rate_old: i32,
    pub commission_rate_new: i32,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::platform_settings::Entity",
        from = "Column::SettingsId",
        to = "super::platform_settings::Column::Id"
    )]
    PlatformSettings,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UpdatedBy",
        to = "super::users::Column::Id"
    )]
    Users,
}

impl Related<super::platform_settings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PlatformSettings.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
