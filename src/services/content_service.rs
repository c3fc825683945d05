// ============================================================================
// CONTENU D'UN COURS : sections et leçons
// ============================================================================
//
// Accès:
//   - Lecture des sections / liste des leçons : quiconque voit le cours
//   - Détail d'une leçon : inscrit, propriétaire, admin, ou leçon en aperçu
//   - Écriture : propriétaire du cours ou admin
//
// L'ordre est unique par cours (sections) et par section (leçons).
//
// ============================================================================

use chrono::Utc;
use sea_orm::*;
use uuid::Uuid;
use validator::Validate;

use crate::models::dto::{LessonResponse, SectionResponse};
use crate::models::requests::{LessonInput, SectionInput};
use crate::models::{courses, enrollments, lessons, sections, users};
use crate::services::course_service::CourseService;
use crate::utils::error::ApiError;
use crate::utils::response::{Page, PageParams};

pub struct ContentService;

const SECTION_ORDER_TAKEN: &str = "The fields course, order must make a unique set.";
const LESSON_ORDER_TAKEN: &str = "The fields section, order must make a unique set.";

impl ContentService {
    // ------------------------------------------------------------------------
    // Sections
    // ------------------------------------------------------------------------

    async fn section_lessons<C: ConnectionTrait>(
        db: &C,
        section_id: Uuid,
    ) -> Result<Vec<lessons::Model>, DbErr> {
        lessons::Entity::find()
            .filter(lessons::Column::SectionId.eq(section_id))
            .order_by_asc(lessons::Column::Order)
            .all(db)
            .await
    }

    async fn section_response(
        db: &DatabaseConnection,
        section: &sections::Model,
    ) -> Result<SectionResponse, DbErr> {
        let lessons = Self::section_lessons(db, section.id).await?;
        Ok(SectionResponse::build(section, &lessons))
    }

    pub async fn list_sections(
        db: &DatabaseConnection,
        user: Option<&users::Model>,
        course_id: Uuid,
        params: &PageParams,
    ) -> Result<Page<SectionResponse>, ApiError> {
        let course = CourseService::find_visible(db, user, course_id).await?;

        let paginator = sections::Entity::find()
            .filter(sections::Column::CourseId.eq(course.id))
            .order_by_asc(sections::Column::Order)
            .paginate(db, params.page_size());
        let count = paginator.num_items().await?;
        let rows = paginator.fetch_page(params.page() - 1).await?;

        let mut data = Vec::with_capacity(rows.len());
        for section in &rows {
            data.push(Self::section_response(db, section).await?);
        }
        Ok(Page::new(data, count, params))
    }

    async fn find_section(
        db: &DatabaseConnection,
        course: &courses::Model,
        section_id: Uuid,
    ) -> Result<sections::Model, ApiError> {
        sections::Entity::find_by_id(section_id)
            .filter(sections::Column::CourseId.eq(course.id))
            .one(db)
            .await?
            .ok_or_else(|| ApiError::not_found("Not found."))
    }

    pub async fn get_section(
        db: &DatabaseConnection,
        user: Option<&users::Model>,
        course_id: Uuid,
        section_id: Uuid,
    ) -> Result<SectionResponse, ApiError> {
        let course = CourseService::find_visible(db, user, course_id).await?;
        let section = Self::find_section(db, &course, section_id).await?;
        Ok(Self::section_response(db, &section).await?)
    }

    /// Cours visible + droits d'écriture (propriétaire ou admin)
    async fn writable_course(
        db: &DatabaseConnection,
        user: &users::Model,
        course_id: Uuid,
    ) -> Result<courses::Model, ApiError> {
        let course = CourseService::find_visible(db, Some(user), course_id).await?;
        CourseService::ensure_owner_or_admin(&course, user)?;
        Ok(course)
    }

    async fn section_order_taken(
        db: &DatabaseConnection,
        course_id: Uuid,
        order: i32,
        exclude: Option<Uuid>,
    ) -> Result<bool, DbErr> {
        let mut query = sections::Entity::find()
            .filter(sections::Column::CourseId.eq(course_id))
            .filter(sections::Column::Order.eq(order));
        if let Some(id) = exclude {
            query = query.filter(sections::Column::Id.ne(id));
        }
        Ok(query.count(db).await? > 0)
    }

    /// Sans `order`, la section est ajoutée à la fin
    async fn next_section_order(db: &DatabaseConnection, course_id: Uuid) -> Result<i32, DbErr> {
        let last = sections::Entity::find()
            .filter(sections::Column::CourseId.eq(course_id))
            .order_by_desc(sections::Column::Order)
            .one(db)
            .await?;
        Ok(last.map_or(1, |section| section.order + 1))
    }

    pub async fn create_section(
        db: &DatabaseConnection,
        user: &users::Model,
        course_id: Uuid,
        input: SectionInput,
    ) -> Result<SectionResponse, ApiError> {
        let course = Self::writable_course(db, user, course_id).await?;
        input.validate()?;

        let title = input
            .title
            .ok_or_else(|| ApiError::field("title", "This field is required."))?;

        let order = match input.order {
            Some(order) => order,
            None => Self::next_section_order(db, course.id).await?,
        };
        if Self::section_order_taken(db, course.id, order, None).await? {
            return Err(ApiError::non_field(SECTION_ORDER_TAKEN));
        }

        let now = Utc::now();
        let section = sections::ActiveModel {
            id: Set(Uuid::new_v4()),
            course_id: Set(course.id),
            title: Set(title),
            description: Set(input.description.unwrap_or_default()),
            order: Set(order),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await?;

        log::info!("Section {} added to course {}", section.title, course.title);
        Ok(Self::section_response(db, &section).await?)
    }

    pub async fn update_section(
        db: &DatabaseConnection,
        user: &users::Model,
        course_id: Uuid,
        section_id: Uuid,
        input: SectionInput,
        partial: bool,
    ) -> Result<SectionResponse, ApiError> {
        let course = Self::writable_course(db, user, course_id).await?;
        let section = Self::find_section(db, &course, section_id).await?;
        input.validate()?;

        if !partial && input.title.is_none() {
            return Err(ApiError::field("title", "This field is required."));
        }

        if let Some(order) = input.order {
            if Self::section_order_taken(db, course.id, order, Some(section.id)).await? {
                return Err(ApiError::non_field(SECTION_ORDER_TAKEN));
            }
        }

        let mut active: sections::ActiveModel = section.into();
        if let Some(title) = input.title {
            active.title = Set(title);
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }
        if let Some(order) = input.order {
            active.order = Set(order);
        }
        active.updated_at = Set(Utc::now());

        let section = active.update(db).await?;
        Ok(Self::section_response(db, &section).await?)
    }

    pub async fn delete_section(
        db: &DatabaseConnection,
        user: &users::Model,
        course_id: Uuid,
        section_id: Uuid,
    ) -> Result<(), ApiError> {
        let course = Self::writable_course(db, user, course_id).await?;
        let section = Self::find_section(db, &course, section_id).await?;
        section.delete(db).await?;
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Leçons
    // ------------------------------------------------------------------------

    pub async fn list_lessons(
        db: &DatabaseConnection,
        user: Option<&users::Model>,
        course_id: Uuid,
        section_id: Uuid,
        params: &PageParams,
    ) -> Result<Page<LessonResponse>, ApiError> {
        let course = CourseService::find_visible(db, user, course_id).await?;
        let section = Self::find_section(db, &course, section_id).await?;

        let paginator = lessons::Entity::find()
            .filter(lessons::Column::SectionId.eq(section.id))
            .order_by_asc(lessons::Column::Order)
            .paginate(db, params.page_size());
        let count = paginator.num_items().await?;
        let rows = paginator.fetch_page(params.page() - 1).await?;

        Ok(Page::new(rows.iter().map(LessonResponse::from).collect(), count, params))
    }

    async fn find_lesson(
        db: &DatabaseConnection,
        section: &sections::Model,
        lesson_id: Uuid,
    ) -> Result<lessons::Model, ApiError> {
        lessons::Entity::find_by_id(lesson_id)
            .filter(lessons::Column::SectionId.eq(section.id))
            .one(db)
            .await?
            .ok_or_else(|| ApiError::not_found("Not found."))
    }

    /// Contenu complet : inscrit, propriétaire, admin ou leçon en aperçu
    pub async fn get_lesson(
        db: &DatabaseConnection,
        user: Option<&users::Model>,
        course_id: Uuid,
        section_id: Uuid,
        lesson_id: Uuid,
    ) -> Result<LessonResponse, ApiError> {
        let course = CourseService::find_visible(db, user, course_id).await?;
        let section = Self::find_section(db, &course, section_id).await?;
        let lesson = Self::find_lesson(db, &section, lesson_id).await?;

        if lesson.is_preview {
            return Ok(LessonResponse::from(&lesson));
        }

        let user = user.ok_or_else(ApiError::not_authenticated)?;
        if user.is_admin() || course.instructor_id == user.id {
            return Ok(LessonResponse::from(&lesson));
        }

        let enrolled = enrollments::Entity::find()
            .filter(enrollments::Column::StudentId.eq(user.id))
            .filter(enrollments::Column::CourseId.eq(course.id))
            .count(db)
            .await?
            > 0;

        if !enrolled {
            return Err(ApiError::permission_denied());
        }

        Ok(LessonResponse::from(&lesson))
    }

    async fn lesson_order_taken(
        db: &DatabaseConnection,
        section_id: Uuid,
        order: i32,
        exclude: Option<Uuid>,
    ) -> Result<bool, DbErr> {
        let mut query = lessons::Entity::find()
            .filter(lessons::Column::SectionId.eq(section_id))
            .filter(lessons::Column::Order.eq(order));
        if let Some(id) = exclude {
            query = query.filter(lessons::Column::Id.ne(id));
        }
        Ok(query.count(db).await? > 0)
    }

    pub async fn create_lesson(
        db: &DatabaseConnection,
        user: &users::Model,
        course_id: Uuid,
        section_id: Uuid,
        input: LessonInput,
    ) -> Result<LessonResponse, ApiError> {
        let course = Self::writable_course(db, user, course_id).await?;
        let section = Self::find_section(db, &course, section_id).await?;
        input.validate()?;

        let title = input
            .title
            .ok_or_else(|| ApiError::field("title", "This field is required."))?;

        let order = match input.order {
            Some(order) => order,
            None => Self::section_lessons(db, section.id)
                .await?
                .last()
                .map_or(1, |lesson| lesson.order + 1),
        };
        if Self::lesson_order_taken(db, section.id, order, None).await? {
            return Err(ApiError::non_field(LESSON_ORDER_TAKEN));
        }

        let now = Utc::now();
        let lesson = lessons::ActiveModel {
            id: Set(Uuid::new_v4()),
            section_id: Set(section.id),
            title: Set(title),
            lesson_type: Set(input.lesson_type.unwrap_or_default()),
            content: Set(input.content.unwrap_or_default()),
            video_url: Set(input.video_url.unwrap_or_default()),
            video_duration: Set(input.video_duration.unwrap_or(0)),
            resources: Set(input.resources.filter(|url| !url.is_empty())),
            is_preview: Set(input.is_preview.unwrap_or(false)),
            order: Set(order),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await?;

        Ok(LessonResponse::from(&lesson))
    }

    pub async fn update_lesson(
        db: &DatabaseConnection,
        user: &users::Model,
        ids: (Uuid, Uuid, Uuid),
        input: LessonInput,
        partial: bool,
    ) -> Result<LessonResponse, ApiError> {
        let (course_id, section_id, lesson_id) = ids;
        let course = Self::writable_course(db, user, course_id).await?;
        let section = Self::find_section(db, &course, section_id).await?;
        let lesson = Self::find_lesson(db, &section, lesson_id).await?;
        input.validate()?;

        if !partial && input.title.is_none() {
            return Err(ApiError::field("title", "This field is required."));
        }

        if let Some(order) = input.order {
            if Self::lesson_order_taken(db, section.id, order, Some(lesson.id)).await? {
                return Err(ApiError::non_field(LESSON_ORDER_TAKEN));
            }
        }

        let mut active: lessons::ActiveModel = lesson.into();
        if let Some(title) = input.title {
            active.title = Set(title);
        }
        if let Some(lesson_type) = input.lesson_type {
            active.lesson_type = Set(lesson_type);
        }
        if let Some(content) = input.content {
            active.content = Set(content);
        }
        if let Some(video_url) = input.video_url {
            active.video_url = Set(video_url);
        }
        if let Some(video_duration) = input.video_duration {
            active.video_duration = Set(video_duration);
        }
        if let Some(resources) = input.resources {
            active.resources = Set(Some(resources).filter(|url| !url.is_empty()));
        }
        if let Some(is_preview) = input.is_preview {
            active.is_preview = Set(is_preview);
        }
        if let Some(order) = input.order {
            active.order = Set(order);
        }
        active.updated_at = Set(Utc::now());

        let lesson = active.update(db).await?;
        Ok(LessonResponse::from(&lesson))
    }

    pub async fn delete_lesson(
        db: &DatabaseConnection,
        user: &users::Model,
        ids: (Uuid, Uuid, Uuid),
    ) -> Result<(), ApiError> {
        let (course_id, section_id, lesson_id) = ids;
        let course = Self::writable_course(db, user, course_id).await?;
        let section = Self::find_section(db, &course, section_id).await?;
        let lesson = Self::find_lesson(db, &section, lesson_id).await?;
        lesson.delete(db).await?;
        Ok(())
    }
}
