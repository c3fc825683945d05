// ============================================================================
// INSCRIPTIONS
// ============================================================================
//
// Un étudiant s'inscrit à un cours PUBLISHED. Chaque inscription prend une
// place (available_seats - 1, jamais sous 0) et incrémente enrollment_count ;
// la désinscription fait l'inverse (jamais au-dessus de total_seats).
//
// Les deux écritures (inscription + compteurs du cours) sont dans une
// même transaction.
//
// ============================================================================

use chrono::Utc;
use sea_orm::*;
use std::collections::HashMap;
use uuid::Uuid;

use crate::models::courses::{self, CourseStatus};
use crate::models::dto::EnrollmentResponse;
use crate::models::{enrollments, users};
use crate::services::course_service::CourseService;
use crate::services::course_workflow::{release_seat, take_seat};
use crate::utils::error::ApiError;
use crate::utils::response::{Page, PageParams};

pub struct EnrollmentService;

/// Résultat d'une demande d'inscription
pub struct EnrollOutcome {
    pub enrollment: EnrollmentResponse,
    pub created: bool,
}

impl EnrollmentService {
    /// Réponses avec le résumé de chaque cours
    async fn to_responses(
        db: &DatabaseConnection,
        student: &users::Model,
        rows: &[enrollments::Model],
    ) -> Result<Vec<EnrollmentResponse>, ApiError> {
        let course_ids: Vec<Uuid> = rows.iter().map(|e| e.course_id).collect();
        let courses = courses::Entity::find()
            .filter(courses::Column::Id.is_in(course_ids))
            .all(db)
            .await?;

        let items = CourseService::build_list_items(db, &courses).await?;
        let mut items_by_id: HashMap<Uuid, _> =
            items.into_iter().map(|item| (item.id, item)).collect();

        let mut responses = Vec::with_capacity(rows.len());
        for enrollment in rows {
            let item = items_by_id.remove(&enrollment.course_id).ok_or_else(|| {
                ApiError::Internal(format!("enrollment {} has no course", enrollment.id))
            })?;
            responses.push(EnrollmentResponse::build(enrollment, student, item));
        }
        Ok(responses)
    }

    async fn to_response(
        db: &DatabaseConnection,
        student: &users::Model,
        enrollment: &enrollments::Model,
    ) -> Result<EnrollmentResponse, ApiError> {
        let mut responses = Self::to_responses(db, student, std::slice::from_ref(enrollment)).await?;
        responses
            .pop()
            .ok_or_else(|| ApiError::Internal(format!("enrollment {} has no course", enrollment.id)))
    }

    /// Les inscriptions de l'appelant, les plus récentes d'abord
    pub async fn list(
        db: &DatabaseConnection,
        student: &users::Model,
        params: &PageParams,
    ) -> Result<Page<EnrollmentResponse>, ApiError> {
        let paginator = enrollments::Entity::find()
            .filter(enrollments::Column::StudentId.eq(student.id))
            .order_by_desc(enrollments::Column::EnrolledAt)
            .paginate(db, params.page_size());
        let count = paginator.num_items().await?;
        let rows = paginator.fetch_page(params.page() - 1).await?;

        let data = Self::to_responses(db, student, &rows).await?;
        Ok(Page::new(data, count, params))
    }

    /// Inscription de l'appelant, sinon 404
    pub async fn find_own(
        db: &DatabaseConnection,
        student: &users::Model,
        id: Uuid,
    ) -> Result<enrollments::Model, ApiError> {
        enrollments::Entity::find_by_id(id)
            .filter(enrollments::Column::StudentId.eq(student.id))
            .one(db)
            .await?
            .ok_or_else(|| ApiError::not_found("Not found."))
    }

    pub async fn get(
        db: &DatabaseConnection,
        student: &users::Model,
        id: Uuid,
    ) -> Result<EnrollmentResponse, ApiError> {
        let enrollment = Self::find_own(db, student, id).await?;
        Self::to_response(db, student, &enrollment).await
    }

    /// POST /enrollments : idempotent pour un étudiant déjà inscrit
    pub async fn enroll(
        db: &DatabaseConnection,
        student: &users::Model,
        course_id: Uuid,
    ) -> Result<EnrollOutcome, ApiError> {
        // 1. Le cours doit être publié
        let course = courses::Entity::find_by_id(course_id)
            .filter(courses::Column::Status.eq(CourseStatus::Published))
            .one(db)
            .await?
            .ok_or_else(|| ApiError::not_found("Course not found"))?;

        // 2. Déjà inscrit -> on renvoie l'inscription existante
        let existing = enrollments::Entity::find()
            .filter(enrollments::Column::StudentId.eq(student.id))
            .filter(enrollments::Column::CourseId.eq(course.id))
            .one(db)
            .await?;

        if let Some(enrollment) = existing {
            return Ok(EnrollOutcome {
                enrollment: Self::to_response(db, student, &enrollment).await?,
                created: false,
            });
        }

        // 3. Places restantes
        if course.is_full() {
            return Err(ApiError::bad_request("This course is full."));
        }

        // 4. Inscription + compteurs du cours
        let txn = db.begin().await?;

        let now = Utc::now();
        let enrollment = enrollments::ActiveModel {
            id: Set(Uuid::new_v4()),
            student_id: Set(student.id),
            course_id: Set(course.id),
            progress_percentage: Set(0.0),
            enrolled_at: Set(now),
            last_accessed: Set(now),
            completed_at: Set(None),
        }
        .insert(&txn)
        .await?;

        let enrollment_count = course.enrollment_count.saturating_add(1);
        let available_seats = take_seat(course.available_seats);
        let title = course.title.clone();

        let mut active: courses::ActiveModel = course.into();
        active.enrollment_count = Set(enrollment_count);
        active.available_seats = Set(available_seats);
        active.update(&txn).await?;

        txn.commit().await?;

        log::info!("New enrollment: {} in {}", student.email, title);

        Ok(EnrollOutcome {
            enrollment: Self::to_response(db, student, &enrollment).await?,
            created: true,
        })
    }

    /// DELETE /enrollments/{id} : libère la place
    pub async fn unenroll(
        db: &DatabaseConnection,
        student: &users::Model,
        id: Uuid,
    ) -> Result<(), ApiError> {
        let enrollment = Self::find_own(db, student, id).await?;

        let txn = db.begin().await?;

        let course = courses::Entity::find_by_id(enrollment.course_id).one(&txn).await?;
        enrollment.delete(&txn).await?;

        if let Some(course) = course {
            let enrollment_count = (course.enrollment_count - 1).max(0);
            let available_seats = release_seat(course.available_seats, course.total_seats);
            let title = course.title.clone();

            let mut active: courses::ActiveModel = course.into();
            active.enrollment_count = Set(enrollment_count);
            active.available_seats = Set(available_seats);
            active.update(&txn).await?;

            log::info!("Unenrolled: {} from {}", student.email, title);
        }

        txn.commit().await?;
        Ok(())
    }
}
