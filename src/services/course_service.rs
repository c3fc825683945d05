// ============================================================================
// SERVICE COURS
// ============================================================================
//
// Description:
//   Liste / détail / création / édition / suppression des cours, revue admin
//   et soumission à la revue. Les règles de transition sont dans
//   `course_workflow`, ce module fait les accès BD.
//
// Visibilité:
//   - Anonyme et STUDENT : cours PUBLISHED
//   - INSTRUCTOR : ses cours + les PUBLISHED
//   - ADMIN : tous les cours
//   Un cours invisible répond 404, jamais 403.
//
// ============================================================================

use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use sea_orm::sea_query::Expr;
use sea_orm::*;
use std::collections::HashMap;
use uuid::Uuid;
use validator::Validate;

use crate::models::courses::{self, CourseStatus, Entity as Courses};
use crate::models::dto::{
    CategoryResponse, CourseDetail, CourseListItem, CourseStats, ReviewResponse, SectionResponse,
    UserResponse, format_price, round_rating,
};
use crate::models::requests::{CourseFilters, CourseInput, CourseReviewRequest};
use crate::models::{categories, enrollments, lessons, reviews, sections, users};
use crate::services::category_service::CategoryService;
use crate::services::course_workflow::{
    check_edit_status, check_review, check_submit, clamp_seats, published_at_after,
};
use crate::services::query::{self, categories_by_id, icontains, search_term, users_by_id};
use crate::utils::error::{ApiError, FieldErrors, into_result, push_error};
use crate::utils::response::{Page, PageParams};
use crate::utils::slug::slugify;

pub const DEFAULT_TOTAL_SEATS: i32 = 30;

pub struct CourseService;

/// Condition de visibilité selon l'appelant (None = aucun filtre)
pub fn visibility(user: Option<&users::Model>) -> Option<Condition> {
    match user {
        Some(user) if user.is_admin() => None,
        Some(user) if user.is_instructor() => Some(
            Condition::any()
                .add(courses::Column::InstructorId.eq(user.id))
                .add(courses::Column::Status.eq(CourseStatus::Published)),
        ),
        _ => Some(Condition::all().add(courses::Column::Status.eq(CourseStatus::Published))),
    }
}

/// Champs triables de la liste des cours
const COURSE_ORDERING: &[(&str, courses::Column)] = &[
    ("created_at", courses::Column::CreatedAt),
    ("published_at", courses::Column::PublishedAt),
    ("enrollment_count", courses::Column::EnrollmentCount),
    ("average_rating", courses::Column::AverageRating),
    ("price", courses::Column::PriceCents),
];

pub fn parse_ordering(value: Option<&str>) -> (courses::Column, Order) {
    query::parse_ordering(value, COURSE_ORDERING, (courses::Column::CreatedAt, Order::Desc))
}

/// Prix décimal -> centimes (None si négatif ou hors bornes)
pub fn price_to_cents(price: Decimal) -> Option<i64> {
    if price.is_sign_negative() && !price.is_zero() {
        return None;
    }
    (price * Decimal::ONE_HUNDRED).round().to_i64()
}

#[derive(Debug, FromQueryResult)]
struct CourseLessonCount {
    course_id: Uuid,
    total: i64,
}

/// Nombre de leçons par cours (total_classes)
pub async fn lesson_counts<C: ConnectionTrait>(
    db: &C,
    course_ids: Vec<Uuid>,
) -> Result<HashMap<Uuid, u64>, DbErr> {
    if course_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows = lessons::Entity::find()
        .select_only()
        .column(sections::Column::CourseId)
        .column_as(Expr::col((lessons::Entity, lessons::Column::Id)).count(), "total")
        .join(JoinType::InnerJoin, lessons::Relation::Section.def())
        .filter(sections::Column::CourseId.is_in(course_ids))
        .group_by(sections::Column::CourseId)
        .into_model::<CourseLessonCount>()
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .map(|row| (row.course_id, row.total.max(0) as u64))
        .collect())
}

impl CourseService {
    /// Cours visible par l'appelant, sinon 404
    pub async fn find_visible(
        db: &DatabaseConnection,
        user: Option<&users::Model>,
        id: Uuid,
    ) -> Result<courses::Model, ApiError> {
        let mut query = Courses::find_by_id(id);
        if let Some(condition) = visibility(user) {
            query = query.filter(condition);
        }

        query
            .one(db)
            .await?
            .ok_or_else(|| ApiError::not_found("Not found."))
    }

    pub fn ensure_owner_or_admin(
        course: &courses::Model,
        user: &users::Model,
    ) -> Result<(), ApiError> {
        if user.is_admin() || course.instructor_id == user.id {
            Ok(())
        } else {
            Err(ApiError::permission_denied())
        }
    }

    pub async fn list(
        db: &DatabaseConnection,
        user: Option<&users::Model>,
        filters: &CourseFilters,
        params: &PageParams,
    ) -> Result<Page<CourseListItem>, ApiError> {
        let mut query = Courses::find();

        // 1. Visibilité
        if let Some(condition) = visibility(user) {
            query = query.filter(condition);
        }

        // 2. Filtres
        if let Some(category) = filters.category {
            query = query.filter(courses::Column::CategoryId.eq(category));
        }
        if let Some(level) = filters.difficulty_level {
            query = query.filter(courses::Column::DifficultyLevel.eq(level));
        }
        if let Some(is_free) = filters.is_free {
            query = query.filter(courses::Column::IsFree.eq(is_free));
        }
        if let Some(status) = filters.status {
            query = query.filter(courses::Column::Status.eq(status));
        }

        // 3. Recherche (titre, description, nom de l'instructeur)
        if let Some(term) = search_term(&filters.search) {
            query = query
                .join(JoinType::LeftJoin, courses::Relation::Instructor.def())
                .filter(
                    Condition::any()
                        .add(icontains((courses::Entity, courses::Column::Title), term))
                        .add(icontains((courses::Entity, courses::Column::Description), term))
                        .add(icontains((users::Entity, users::Column::FirstName), term))
                        .add(icontains((users::Entity, users::Column::LastName), term)),
                );
        }

        // 4. Tri + pagination
        let (column, order) = parse_ordering(filters.ordering.as_deref());
        let paginator = query
            .order_by(column, order)
            .order_by_asc(courses::Column::Id)
            .paginate(db, params.page_size());
        let count = paginator.num_items().await?;
        let courses = paginator.fetch_page(params.page() - 1).await?;

        let data = Self::build_list_items(db, &courses).await?;
        Ok(Page::new(data, count, params))
    }

    /// Tous les cours de l'instructeur, quel que soit leur statut
    pub async fn my_courses(
        db: &DatabaseConnection,
        instructor: &users::Model,
        params: &PageParams,
    ) -> Result<Page<CourseListItem>, ApiError> {
        let paginator = Courses::find()
            .filter(courses::Column::InstructorId.eq(instructor.id))
            .order_by_desc(courses::Column::CreatedAt)
            .paginate(db, params.page_size());
        let count = paginator.num_items().await?;
        let courses = paginator.fetch_page(params.page() - 1).await?;

        let data = Self::build_list_items(db, &courses).await?;
        Ok(Page::new(data, count, params))
    }

    /// Version "liste" des cours, avec instructeur, catégorie et nombre de leçons
    pub async fn build_list_items<C: ConnectionTrait>(
        db: &C,
        courses: &[courses::Model],
    ) -> Result<Vec<CourseListItem>, DbErr> {
        let instructors = users_by_id(db, courses.iter().map(|c| c.instructor_id)).await?;
        let categories = categories_by_id(db, courses.iter().filter_map(|c| c.category_id)).await?;
        let counts = lesson_counts(db, courses.iter().map(|c| c.id).collect()).await?;
        let today = Utc::now().date_naive();

        Ok(courses
            .iter()
            .map(|course| {
                CourseListItem::build(
                    course,
                    instructors.get(&course.instructor_id),
                    course.category_id.and_then(|id| categories.get(&id)),
                    CourseStats {
                        total_classes: counts.get(&course.id).copied().unwrap_or(0),
                        today,
                    },
                )
            })
            .collect())
    }

    /// Détail complet : sections + leçons, avis, inscription de l'appelant
    pub async fn detail(
        db: &DatabaseConnection,
        user: Option<&users::Model>,
        course: &courses::Model,
    ) -> Result<CourseDetail, ApiError> {
        // 1. Instructeur et catégorie
        let instructor = users::Entity::find_by_id(course.instructor_id).one(db).await?;

        let category = match course.category_id {
            Some(category_id) => match categories::Entity::find_by_id(category_id).one(db).await? {
                Some(category) => {
                    let count = CategoryService::published_course_count(db, category.id).await?;
                    Some(CategoryResponse::build(&category, count))
                }
                None => None,
            },
            None => None,
        };

        // 2. Sections et leçons, dans l'ordre
        let course_sections = sections::Entity::find()
            .filter(sections::Column::CourseId.eq(course.id))
            .order_by_asc(sections::Column::Order)
            .all(db)
            .await?;

        let section_ids: Vec<Uuid> = course_sections.iter().map(|s| s.id).collect();
        let course_lessons = if section_ids.is_empty() {
            Vec::new()
        } else {
            lessons::Entity::find()
                .filter(lessons::Column::SectionId.is_in(section_ids))
                .order_by_asc(lessons::Column::Order)
                .all(db)
                .await?
        };

        let mut lessons_by_section: HashMap<Uuid, Vec<lessons::Model>> = HashMap::new();
        for lesson in &course_lessons {
            lessons_by_section
                .entry(lesson.section_id)
                .or_default()
                .push(lesson.clone());
        }

        let section_responses = course_sections
            .iter()
            .map(|section| {
                let lessons = lessons_by_section
                    .get(&section.id)
                    .map(Vec::as_slice)
                    .unwrap_or(&[]);
                SectionResponse::build(section, lessons)
            })
            .collect();

        // 3. Avis, du plus récent au plus ancien
        let course_reviews = reviews::Entity::find()
            .filter(reviews::Column::CourseId.eq(course.id))
            .order_by_desc(reviews::Column::CreatedAt)
            .all(db)
            .await?;
        let students = users_by_id(db, course_reviews.iter().map(|r| r.student_id)).await?;
        let review_responses = course_reviews
            .iter()
            .filter_map(|review| {
                students
                    .get(&review.student_id)
                    .map(|student| ReviewResponse::build(review, student))
            })
            .collect();

        // 4. L'appelant est-il inscrit ?
        let is_enrolled = match user {
            Some(user) => {
                enrollments::Entity::find()
                    .filter(enrollments::Column::StudentId.eq(user.id))
                    .filter(enrollments::Column::CourseId.eq(course.id))
                    .count(db)
                    .await?
                    > 0
            }
            None => false,
        };

        let today = Utc::now().date_naive();

        Ok(CourseDetail {
            id: course.id,
            title: course.title.clone(),
            slug: course.slug.clone(),
            description: course.description.clone(),
            short_description: course.short_description.clone(),
            instructor: instructor.as_ref().map(UserResponse::from),
            category,
            difficulty_level: course.difficulty_level,
            price: format_price(course.price_cents),
            is_free: course.is_free,
            thumbnail: course.thumbnail.clone(),
            preview_video: course.preview_video.clone(),
            duration_hours: course.duration_hours,
            requirements: course.requirements.clone(),
            learning_outcomes: course.learning_outcomes.clone(),
            target_audience: course.target_audience.clone(),
            who_can_join: course.who_can_join.clone(),
            status: course.status,
            review_notes: course.review_notes.clone(),
            reviewed_at: course.reviewed_at,
            sections: section_responses,
            enrollment_count: course.enrollment_count,
            average_rating: round_rating(course.average_rating),
            total_reviews: course.total_reviews,
            reviews: review_responses,
            is_enrolled,
            total_classes: course_lessons.len() as u64,
            available_seats: course.available_seats,
            total_seats: course.total_seats,
            class_starts: course.class_starts,
            admission_deadline: course.admission_deadline,
            schedule: course.schedule.clone(),
            venue: course.venue.clone(),
            is_admission_open: course.is_admission_open(today),
            is_full: course.is_full(),
            created_at: course.created_at,
            updated_at: course.updated_at,
            published_at: course.published_at,
        })
    }

    /// Validations communes à la création et à l'édition
    async fn validate_input(
        db: &DatabaseConnection,
        input: &CourseInput,
        existing: Option<&courses::Model>,
        require_all: bool,
    ) -> Result<(), ApiError> {
        let mut errors = match input.validate() {
            Ok(()) => FieldErrors::new(),
            Err(e) => match ApiError::from(e) {
                ApiError::Validation(fields) => fields,
                other => return Err(other),
            },
        };

        // 1. Champs obligatoires
        if require_all {
            if input.title.is_none() {
                push_error(&mut errors, "title", "This field is required.");
            }
            if input.description.is_none() {
                push_error(&mut errors, "description", "This field is required.");
            }
        }

        // 2. Titre -> slug unique
        if let Some(title) = &input.title {
            let slug = slugify(title);
            if slug.is_empty() {
                push_error(&mut errors, "title", "Course title must contain letters or digits.");
            } else {
                let mut query = Courses::find().filter(courses::Column::Slug.eq(slug));
                if let Some(course) = existing {
                    query = query.filter(courses::Column::Id.ne(course.id));
                }
                if query.count(db).await? > 0 {
                    push_error(&mut errors, "title", "Course with this title already exists.");
                }
            }
        }

        // 3. Catégorie existante
        if let Some(category_id) = input.category {
            if categories::Entity::find_by_id(category_id).one(db).await?.is_none() {
                push_error(
                    &mut errors,
                    "category",
                    format!("Invalid pk \"{}\" - object does not exist.", category_id),
                );
            }
        }

        // 4. Prix
        if let Some(price) = input.price {
            if price_to_cents(price).is_none() {
                push_error(&mut errors, "price", "Ensure this value is greater than or equal to 0.");
            }
        }

        // 5. Places
        if let Some(total) = input.total_seats {
            if total < 1 {
                push_error(&mut errors, "total_seats", "Total seats must be at least 1.");
            }
        }
        if let Some(available) = input.available_seats {
            let total = input
                .total_seats
                .or(existing.map(|c| c.total_seats))
                .unwrap_or(DEFAULT_TOTAL_SEATS);
            if available < 0 {
                push_error(
                    &mut errors,
                    "available_seats",
                    "Ensure this value is greater than or equal to 0.",
                );
            } else if available > total {
                push_error(
                    &mut errors,
                    "available_seats",
                    "Available seats cannot exceed total seats.",
                );
            }
        }

        // 6. Dates dans le futur
        let today = Utc::now().date_naive();
        if input.class_starts.is_some_and(|date| date < today) {
            push_error(&mut errors, "class_starts", "Class start date cannot be in the past.");
        }
        if input.admission_deadline.is_some_and(|date| date < today) {
            push_error(
                &mut errors,
                "admission_deadline",
                "Admission deadline cannot be in the past.",
            );
        }

        into_result(errors)
    }

    /// Reporte les champs fournis sur le modèle actif
    fn apply_input(active: &mut courses::ActiveModel, input: CourseInput) {
        if let Some(title) = input.title {
            active.slug = Set(slugify(&title));
            active.title = Set(title.trim().to_string());
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }
        if let Some(short_description) = input.short_description {
            active.short_description = Set(short_description);
        }
        if let Some(category) = input.category {
            active.category_id = Set(Some(category));
        }
        if let Some(level) = input.difficulty_level {
            active.difficulty_level = Set(level);
        }
        if let Some(cents) = input.price.and_then(price_to_cents) {
            active.price_cents = Set(cents);
        }
        if let Some(thumbnail) = input.thumbnail {
            active.thumbnail = Set(Some(thumbnail).filter(|url| !url.is_empty()));
        }
        if let Some(preview_video) = input.preview_video {
            active.preview_video = Set(preview_video);
        }
        if let Some(duration_hours) = input.duration_hours {
            active.duration_hours = Set(duration_hours);
        }
        if let Some(requirements) = input.requirements {
            active.requirements = Set(requirements);
        }
        if let Some(learning_outcomes) = input.learning_outcomes {
            active.learning_outcomes = Set(learning_outcomes);
        }
        if let Some(target_audience) = input.target_audience {
            active.target_audience = Set(target_audience);
        }
        if let Some(who_can_join) = input.who_can_join {
            active.who_can_join = Set(who_can_join);
        }
        if let Some(class_starts) = input.class_starts {
            active.class_starts = Set(Some(class_starts));
        }
        if let Some(admission_deadline) = input.admission_deadline {
            active.admission_deadline = Set(Some(admission_deadline));
        }
        if let Some(schedule) = input.schedule {
            active.schedule = Set(schedule);
        }
        if let Some(venue) = input.venue {
            active.venue = Set(venue);
        }
        if let Some(total_seats) = input.total_seats {
            active.total_seats = Set(total_seats);
        }
        if let Some(available_seats) = input.available_seats {
            active.available_seats = Set(available_seats);
        }
    }

    /// Invariants recalculés à chaque écriture : is_free et bornes des places
    fn normalize(active: &mut courses::ActiveModel) {
        if let ActiveValue::Set(price) | ActiveValue::Unchanged(price) = &active.price_cents {
            active.is_free = Set(*price == 0);
        }

        let total = match &active.total_seats {
            ActiveValue::Set(v) | ActiveValue::Unchanged(v) => *v,
            ActiveValue::NotSet => DEFAULT_TOTAL_SEATS,
        };
        let available = match &active.available_seats {
            ActiveValue::Set(v) | ActiveValue::Unchanged(v) => *v,
            ActiveValue::NotSet => total,
        };
        let (total, available) = clamp_seats(total, available);
        active.total_seats = Set(total);
        active.available_seats = Set(available);
    }

    /// Création par un instructeur : toujours en DRAFT
    pub async fn create(
        db: &DatabaseConnection,
        instructor: &users::Model,
        mut input: CourseInput,
    ) -> Result<courses::Model, ApiError> {
        Self::validate_input(db, &input, None, true).await?;

        // Le statut fourni est ignoré à la création
        input.status = None;
        if input.available_seats.is_none() {
            input.available_seats = Some(input.total_seats.unwrap_or(DEFAULT_TOTAL_SEATS));
        }

        let now = Utc::now();
        let mut active = courses::ActiveModel {
            id: Set(Uuid::new_v4()),
            instructor_id: Set(instructor.id),
            status: Set(CourseStatus::Draft),
            title: Set(String::new()),
            slug: Set(String::new()),
            description: Set(String::new()),
            short_description: Set(String::new()),
            category_id: Set(None),
            difficulty_level: Set(Default::default()),
            price_cents: Set(0),
            is_free: Set(true),
            thumbnail: Set(None),
            preview_video: Set(String::new()),
            duration_hours: Set(0),
            requirements: Set(String::new()),
            learning_outcomes: Set(String::new()),
            target_audience: Set(String::new()),
            who_can_join: Set(String::new()),
            reviewed_by: Set(None),
            review_notes: Set(String::new()),
            reviewed_at: Set(None),
            enrollment_count: Set(0),
            average_rating: Set(0.0),
            total_reviews: Set(0),
            total_seats: Set(DEFAULT_TOTAL_SEATS),
            available_seats: Set(DEFAULT_TOTAL_SEATS),
            class_starts: Set(None),
            admission_deadline: Set(None),
            schedule: Set(String::new()),
            venue: Set(String::new()),
            created_at: Set(now),
            updated_at: Set(now),
            published_at: Set(None),
        };

        Self::apply_input(&mut active, input);
        Self::normalize(&mut active);

        let course = active.insert(db).await?;

        log::info!("New course created: {} by {}", course.title, instructor.email);
        Ok(course)
    }

    /// PUT (partial = false) ou PATCH (partial = true) par le propriétaire ou un admin
    pub async fn update(
        db: &DatabaseConnection,
        user: &users::Model,
        id: Uuid,
        input: CourseInput,
        partial: bool,
    ) -> Result<courses::Model, ApiError> {
        let course = Self::find_visible(db, Some(user), id).await?;
        Self::ensure_owner_or_admin(&course, user)?;

        Self::validate_input(db, &input, Some(&course), !partial).await?;

        let new_status = input.status.filter(|status| *status != course.status);
        if let Some(status) = new_status {
            let section_count = sections::Entity::find()
                .filter(sections::Column::CourseId.eq(course.id))
                .count(db)
                .await?;
            check_edit_status(course.status, status, user.is_admin(), section_count)?;
        }

        let now = Utc::now();
        let published_at = course.published_at;
        let mut active: courses::ActiveModel = course.into();

        Self::apply_input(&mut active, input);
        if let Some(status) = new_status {
            active.status = Set(status);
            active.published_at = Set(published_at_after(status, published_at, now));
        }
        Self::normalize(&mut active);
        active.updated_at = Set(now);

        let course = active.update(db).await?;

        if new_status == Some(CourseStatus::Published) {
            log::info!("Course published: {}", course.title);
        }
        Ok(course)
    }

    pub async fn delete(db: &DatabaseConnection, user: &users::Model, id: Uuid) -> Result<(), ApiError> {
        let course = Self::find_visible(db, Some(user), id).await?;
        Self::ensure_owner_or_admin(&course, user)?;

        let title = course.title.clone();
        course.delete(db).await?;

        log::info!("Course deleted: {} by {}", title, user.email);
        Ok(())
    }

    /// Revue admin : APPROVED, PUBLISHED ou REJECTED
    pub async fn review(
        db: &DatabaseConnection,
        admin: &users::Model,
        id: Uuid,
        input: CourseReviewRequest,
    ) -> Result<courses::Model, ApiError> {
        let course = Self::find_visible(db, Some(admin), id).await?;
        check_review(course.status, input.status)?;

        let now = Utc::now();
        let published_at = course.published_at;
        let mut active: courses::ActiveModel = course.into();
        active.status = Set(input.status);
        active.review_notes = Set(input.review_notes);
        active.reviewed_by = Set(Some(admin.id));
        active.reviewed_at = Set(Some(now));
        active.published_at = Set(published_at_after(input.status, published_at, now));
        active.updated_at = Set(now);

        let course = active.update(db).await?;

        log::info!(
            "Course {} reviewed by {}: {}",
            course.title,
            admin.email,
            course.status.as_str()
        );
        Ok(course)
    }

    /// DRAFT -> PENDING par l'instructeur propriétaire
    pub async fn submit_for_review(
        db: &DatabaseConnection,
        user: &users::Model,
        id: Uuid,
    ) -> Result<courses::Model, ApiError> {
        let course = Self::find_visible(db, Some(user), id).await?;

        let section_count = sections::Entity::find()
            .filter(sections::Column::CourseId.eq(course.id))
            .count(db)
            .await?;
        check_submit(&course, user.id, section_count)?;

        let mut active: courses::ActiveModel = course.into();
        active.status = Set(CourseStatus::Pending);
        active.updated_at = Set(Utc::now());
        let course = active.update(db).await?;

        log::info!("Course submitted for review: {}", course.title);
        Ok(course)
    }
}
