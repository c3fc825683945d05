use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "UPPERCASE")]
pub enum LessonType {
    #[default]
    #[sea_orm(string_value = "VIDEO")]
    Video,
    #[sea_orm(string_value = "TEXT")]
    Text,
    #[sea_orm(string_value = "QUIZ")]
    Quiz,
    #[sea_orm(string_value = "ASSIGNMENT")]
    Assignment,
    #[sea_orm(string_value = "RESOURCE")]
    Resource,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "lessons")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub section_id: Uuid,
    pub title: String,
    pub lesson_type: LessonType,
    #[sea_orm(column_type = "Text")]
    pub content: String,
    pub video_url: String,
    pub video_duration: i32, // secondes
    pub resources: Option<String>, // URL, pas d'upload
    pub is_preview: bool,
    pub order: i32, // unique par section
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::sections::Entity",
        from = "Column::SectionId",
        to = "super::sections::Column::Id",
        on_delete = "Cascade"
    )]
    Section,
}

impl Related<super::sections::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Section.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
