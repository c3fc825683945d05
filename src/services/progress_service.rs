// ============================================================================
// PROGRESSION ET CERTIFICATS
// ============================================================================
//
// Une ligne lesson_progress par (inscription, leçon).
//
// mark_complete (transaction):
//   1. completed / completed_at posés une seule fois
//   2. progress_percentage = leçons terminées / leçons du cours * 100
//   3. À 100 % : completed_at de l'inscription (une fois) + certificat
//      s'il n'existe pas encore
//
// ============================================================================

use chrono::Utc;
use sea_orm::*;
use std::collections::HashMap;
use uuid::Uuid;
use validator::Validate;

use crate::models::dto::{CertificateResponse, LessonProgressResponse};
use crate::models::requests::{ProgressCreate, ProgressUpdate};
use crate::models::{certificates, courses, enrollments, lesson_progress, lessons, sections, users};
use crate::utils::error::ApiError;
use crate::utils::response::{Page, PageParams};
use crate::utils::tokens::generate_certificate_number;

pub struct ProgressService;

/// Pourcentage de progression (0 pour un cours sans leçon)
pub fn progress_percentage(completed: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (completed.min(total) as f64 / total as f64) * 100.0
}

impl ProgressService {
    async fn to_responses(
        db: &DatabaseConnection,
        rows: &[lesson_progress::Model],
    ) -> Result<Vec<LessonProgressResponse>, DbErr> {
        let lesson_ids: Vec<Uuid> = rows.iter().map(|p| p.lesson_id).collect();
        let lessons: HashMap<Uuid, lessons::Model> = if lesson_ids.is_empty() {
            HashMap::new()
        } else {
            lessons::Entity::find()
                .filter(lessons::Column::Id.is_in(lesson_ids))
                .all(db)
                .await?
                .into_iter()
                .map(|lesson| (lesson.id, lesson))
                .collect()
        };

        Ok(rows
            .iter()
            .map(|progress| LessonProgressResponse::build(progress, lessons.get(&progress.lesson_id)))
            .collect())
    }

    async fn to_response(
        db: &DatabaseConnection,
        progress: &lesson_progress::Model,
    ) -> Result<LessonProgressResponse, DbErr> {
        let lesson = lessons::Entity::find_by_id(progress.lesson_id).one(db).await?;
        Ok(LessonProgressResponse::build(progress, lesson.as_ref()))
    }

    pub async fn list(
        db: &DatabaseConnection,
        student: &users::Model,
        params: &PageParams,
    ) -> Result<Page<LessonProgressResponse>, ApiError> {
        let paginator = lesson_progress::Entity::find()
            .inner_join(enrollments::Entity)
            .filter(enrollments::Column::StudentId.eq(student.id))
            .order_by_desc(lesson_progress::Column::LastAccessed)
            .paginate(db, params.page_size());
        let count = paginator.num_items().await?;
        let rows = paginator.fetch_page(params.page() - 1).await?;

        let data = Self::to_responses(db, &rows).await?;
        Ok(Page::new(data, count, params))
    }

    async fn find_own(
        db: &DatabaseConnection,
        student: &users::Model,
        id: Uuid,
    ) -> Result<lesson_progress::Model, ApiError> {
        lesson_progress::Entity::find_by_id(id)
            .inner_join(enrollments::Entity)
            .filter(enrollments::Column::StudentId.eq(student.id))
            .one(db)
            .await?
            .ok_or_else(|| ApiError::not_found("Not found."))
    }

    pub async fn get(
        db: &DatabaseConnection,
        student: &users::Model,
        id: Uuid,
    ) -> Result<LessonProgressResponse, ApiError> {
        let progress = Self::find_own(db, student, id).await?;
        Ok(Self::to_response(db, &progress).await?)
    }

    /// Démarre le suivi d'une leçon ; renvoie la ligne existante si déjà suivie
    pub async fn create(
        db: &DatabaseConnection,
        student: &users::Model,
        input: ProgressCreate,
    ) -> Result<(LessonProgressResponse, bool), ApiError> {
        // 1. L'inscription doit appartenir à l'appelant
        let enrollment = enrollments::Entity::find_by_id(input.enrollment)
            .filter(enrollments::Column::StudentId.eq(student.id))
            .one(db)
            .await?
            .ok_or_else(|| {
                ApiError::field(
                    "enrollment",
                    format!("Invalid pk \"{}\" - object does not exist.", input.enrollment),
                )
            })?;

        // 2. La leçon doit faire partie du cours
        let lesson = lessons::Entity::find_by_id(input.lesson)
            .one(db)
            .await?
            .ok_or_else(|| {
                ApiError::field(
                    "lesson",
                    format!("Invalid pk \"{}\" - object does not exist.", input.lesson),
                )
            })?;

        let in_course = sections::Entity::find_by_id(lesson.section_id)
            .filter(sections::Column::CourseId.eq(enrollment.course_id))
            .count(db)
            .await?
            > 0;
        if !in_course {
            return Err(ApiError::field("lesson", "Lesson does not belong to this course."));
        }

        // 3. Doublon -> ligne existante
        let existing = lesson_progress::Entity::find()
            .filter(lesson_progress::Column::EnrollmentId.eq(enrollment.id))
            .filter(lesson_progress::Column::LessonId.eq(lesson.id))
            .one(db)
            .await?;
        if let Some(progress) = existing {
            return Ok((LessonProgressResponse::build(&progress, Some(&lesson)), false));
        }

        let now = Utc::now();
        let progress = lesson_progress::ActiveModel {
            id: Set(Uuid::new_v4()),
            enrollment_id: Set(enrollment.id),
            lesson_id: Set(lesson.id),
            completed: Set(false),
            watched_duration: Set(0),
            started_at: Set(now),
            completed_at: Set(None),
            last_accessed: Set(now),
        }
        .insert(db)
        .await?;

        let mut active: enrollments::ActiveModel = enrollment.into();
        active.last_accessed = Set(now);
        active.update(db).await?;

        Ok((LessonProgressResponse::build(&progress, Some(&lesson)), true))
    }

    /// PATCH : seul watched_duration est modifiable
    pub async fn update(
        db: &DatabaseConnection,
        student: &users::Model,
        id: Uuid,
        input: ProgressUpdate,
    ) -> Result<LessonProgressResponse, ApiError> {
        input.validate()?;
        let progress = Self::find_own(db, student, id).await?;

        let mut active: lesson_progress::ActiveModel = progress.into();
        if let Some(watched_duration) = input.watched_duration {
            active.watched_duration = Set(watched_duration);
        }
        active.last_accessed = Set(Utc::now());
        let progress = active.update(db).await?;

        Ok(Self::to_response(db, &progress).await?)
    }

    /// Nombre de leçons du cours
    async fn course_lesson_count<C: ConnectionTrait>(conn: &C, course_id: Uuid) -> Result<u64, DbErr> {
        lessons::Entity::find()
            .inner_join(sections::Entity)
            .filter(sections::Column::CourseId.eq(course_id))
            .count(conn)
            .await
    }

    /// Recalcule la progression de l'inscription, certificat à 100 %
    async fn update_enrollment_progress<C: ConnectionTrait>(
        conn: &C,
        enrollment: enrollments::Model,
    ) -> Result<(), DbErr> {
        let total = Self::course_lesson_count(conn, enrollment.course_id).await?;
        let completed = lesson_progress::Entity::find()
            .filter(lesson_progress::Column::EnrollmentId.eq(enrollment.id))
            .filter(lesson_progress::Column::Completed.eq(true))
            .count(conn)
            .await?;

        let percentage = progress_percentage(completed, total);
        let now = Utc::now();
        let finished = percentage >= 100.0;
        let enrollment_id = enrollment.id;
        let already_completed = enrollment.completed_at.is_some();

        let mut active: enrollments::ActiveModel = enrollment.into();
        active.progress_percentage = Set(percentage);
        active.last_accessed = Set(now);
        if finished && !already_completed {
            active.completed_at = Set(Some(now));
        }
        active.update(conn).await?;

        if finished {
            let has_certificate = certificates::Entity::find()
                .filter(certificates::Column::EnrollmentId.eq(enrollment_id))
                .count(conn)
                .await?
                > 0;

            if !has_certificate {
                let certificate = certificates::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    enrollment_id: Set(enrollment_id),
                    certificate_number: Set(generate_certificate_number()),
                    issued_at: Set(now),
                }
                .insert(conn)
                .await?;

                log::info!(
                    "Certificate {} issued for enrollment {}",
                    certificate.certificate_number,
                    enrollment_id
                );
            }
        }

        Ok(())
    }

    pub async fn mark_complete(
        db: &DatabaseConnection,
        student: &users::Model,
        id: Uuid,
    ) -> Result<(), ApiError> {
        let progress = Self::find_own(db, student, id).await?;
        if progress.completed {
            return Ok(());
        }

        let txn = db.begin().await?;

        let enrollment_id = progress.enrollment_id;
        let now = Utc::now();
        let mut active: lesson_progress::ActiveModel = progress.into();
        active.completed = Set(true);
        active.completed_at = Set(Some(now));
        active.last_accessed = Set(now);
        active.update(&txn).await?;

        let enrollment = enrollments::Entity::find_by_id(enrollment_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ApiError::not_found("Not found."))?;
        Self::update_enrollment_progress(&txn, enrollment).await?;

        txn.commit().await?;
        Ok(())
    }

    /// Certificats de l'appelant, les plus récents d'abord
    pub async fn certificates(
        db: &DatabaseConnection,
        student: &users::Model,
        params: &PageParams,
    ) -> Result<Page<CertificateResponse>, ApiError> {
        let paginator = certificates::Entity::find()
            .inner_join(enrollments::Entity)
            .filter(enrollments::Column::StudentId.eq(student.id))
            .order_by_desc(certificates::Column::IssuedAt)
            .paginate(db, params.page_size());
        let count = paginator.num_items().await?;
        let rows = paginator.fetch_page(params.page() - 1).await?;

        let enrollment_ids: Vec<Uuid> = rows.iter().map(|c| c.enrollment_id).collect();
        let enrollment_courses: HashMap<Uuid, Uuid> = if enrollment_ids.is_empty() {
            HashMap::new()
        } else {
            enrollments::Entity::find()
                .filter(enrollments::Column::Id.is_in(enrollment_ids))
                .all(db)
                .await?
                .into_iter()
                .map(|e| (e.id, e.course_id))
                .collect()
        };

        let course_ids: Vec<Uuid> = enrollment_courses.values().copied().collect();
        let courses: HashMap<Uuid, courses::Model> = if course_ids.is_empty() {
            HashMap::new()
        } else {
            courses::Entity::find()
                .filter(courses::Column::Id.is_in(course_ids))
                .all(db)
                .await?
                .into_iter()
                .map(|c| (c.id, c))
                .collect()
        };

        let data = rows
            .iter()
            .filter_map(|certificate| {
                let course_id = enrollment_courses.get(&certificate.enrollment_id)?;
                courses
                    .get(course_id)
                    .map(|course| CertificateResponse::build(certificate, course))
            })
            .collect();

        Ok(Page::new(data, count, params))
    }
}
