use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Cycle de vie : DRAFT -> PENDING -> {APPROVED -> PUBLISHED, REJECTED}
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "UPPERCASE")]
pub enum CourseStatus {
    #[default]
    #[sea_orm(string_value = "DRAFT")]
    Draft,
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "APPROVED")]
    Approved,
    #[sea_orm(string_value = "PUBLISHED")]
    Published,
    #[sea_orm(string_value = "REJECTED")]
    Rejected,
}

impl CourseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CourseStatus::Draft => "DRAFT",
            CourseStatus::Pending => "PENDING",
            CourseStatus::Approved => "APPROVED",
            CourseStatus::Published => "PUBLISHED",
            CourseStatus::Rejected => "REJECTED",
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "UPPERCASE")]
pub enum DifficultyLevel {
    #[default]
    #[sea_orm(string_value = "BEGINNER")]
    Beginner,
    #[sea_orm(string_value = "INTERMEDIATE")]
    Intermediate,
    #[sea_orm(string_value = "ADVANCED")]
    Advanced,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "courses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    #[sea_orm(unique)]
    pub slug: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub short_description: String,
    pub instructor_id: Uuid,
    pub category_id: Option<Uuid>,
    pub difficulty_level: DifficultyLevel,
    pub price_cents: i64, // Prix en centimes (0 = gratuit)
    pub is_free: bool,
    pub thumbnail: Option<String>,
    pub preview_video: String,
    pub duration_hours: i32,
    #[sea_orm(column_type = "Text")]
    pub requirements: String,
    #[sea_orm(column_type = "Text")]
    pub learning_outcomes: String,
    #[sea_orm(column_type = "Text")]
    pub target_audience: String,
    #[sea_orm(column_type = "Text")]
    pub who_can_join: String,
    pub status: CourseStatus,
    pub reviewed_by: Option<Uuid>,
    #[sea_orm(column_type = "Text")]
    pub review_notes: String,
    pub reviewed_at: Option<DateTimeUtc>,
    pub enrollment_count: i32,
    #[sea_orm(column_type = "Double")]
    pub average_rating: f64,
    pub total_reviews: i32,
    pub total_seats: i32,
    pub available_seats: i32,
    pub class_starts: Option<Date>,
    pub admission_deadline: Option<Date>,
    pub schedule: String,
    pub venue: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
    pub published_at: Option<DateTimeUtc>,
}

impl Model {
    pub fn is_full(&self) -> bool {
        self.available_seats <= 0
    }

    /// Inscriptions ouvertes : publié, places restantes, date limite non dépassée
    pub fn is_admission_open(&self, today: Date) -> bool {
        self.status == CourseStatus::Published
            && !self.is_full()
            && self
                .admission_deadline
                .is_none_or(|deadline| deadline >= today)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::InstructorId",
        to = "super::users::Column::Id",
        on_delete = "Cascade"
    )]
    Instructor,

    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::ReviewedBy",
        to = "super::users::Column::Id",
        on_delete = "SetNull"
    )]
    Reviewer,

    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::CategoryId",
        to = "super::categories::Column::Id",
        on_delete = "SetNull"
    )]
    Category,

    #[sea_orm(has_many = "super::sections::Entity")]
    Sections,

    #[sea_orm(has_many = "super::reviews::Entity")]
    Reviews,

    #[sea_orm(has_many = "super::enrollments::Entity")]
    Enrollments,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Instructor.def()
    }
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::sections::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sections.def()
    }
}

impl Related<super::reviews::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reviews.def()
    }
}

impl Related<super::enrollments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Enrollments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
