use sea_orm::entity::prelude::*;

/// One pet's enrollment attempt in one schedule. Never physically deleted;
/// (pet_profile_id, schedule_id) carries a unique constraint.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "enrollments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub pet_profile_id: Uuid,
    pub course_id: Uuid,
    pub schedule_id: Uuid,
    pub status: String,
    pub enrolled_at: Option<DateTimeWithTimeZone>,
    pub cancelled_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id"
    )]
    Users,
    #[sea_orm(
        belongs_to = "super::courses::Entity",
        from = "Column::CourseId",
        to = "super::courses::Column::Id"
    )]
    Courses,
    #[sea_orm(
        belongs_to = "super::course_schedules::Entity",
        from = "Column::ScheduleId",
        to = "super::course_schedules::Column::Id"
    )]
    CourseSchedules,
    #[sea_orm(
        belongs_to = "super::pet_profiles::Entity",
        from = "Column::PetProfileId",
        to = "super::pet_profiles::Column::Id"
    )]
    PetProfiles,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::courses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Courses.def()
    }
}

impl Related<super::course_schedules::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CourseSchedules.def()
    }
}

impl Related<super::pet_profiles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PetProfiles.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
