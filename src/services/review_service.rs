// ============================================================================
// AVIS SUR LES COURS
// ============================================================================
//
// Règles:
//   - Créer : être inscrit au cours, un seul avis par (cours, étudiant)
//   - Modifier : l'auteur uniquement
//   - Supprimer : l'auteur ou un admin
//
// Chaque écriture recalcule average_rating et total_reviews du cours,
// dans la même transaction.
//
// ============================================================================

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::*;
use uuid::Uuid;
use validator::Validate;

use crate::models::dto::{ReviewResponse, round_rating};
use crate::models::requests::{ReviewFilters, ReviewInput};
use crate::models::{courses, enrollments, reviews, users};
use crate::services::course_service::CourseService;
use crate::services::query::{parse_ordering, users_by_id};
use crate::utils::error::ApiError;
use crate::utils::response::{Page, PageParams};

pub struct ReviewService;

/// Moyenne arrondie à 2 décimales (0 sans avis) et nombre d'avis
pub fn rating_summary(ratings: &[i32]) -> (f64, i32) {
    if ratings.is_empty() {
        return (0.0, 0);
    }

    let total: i64 = ratings.iter().map(|&r| i64::from(r)).sum();
    let average = total as f64 / ratings.len() as f64;
    (round_rating(average), ratings.len() as i32)
}

impl ReviewService {
    /// Recalcule l'agrégat de notes du cours
    async fn refresh_course_rating<C: ConnectionTrait>(
        conn: &C,
        course_id: Uuid,
    ) -> Result<(), DbErr> {
        let ratings: Vec<i32> = reviews::Entity::find()
            .select_only()
            .column(reviews::Column::Rating)
            .filter(reviews::Column::CourseId.eq(course_id))
            .into_tuple()
            .all(conn)
            .await?;

        let (average, total) = rating_summary(&ratings);

        courses::Entity::update_many()
            .col_expr(courses::Column::AverageRating, Expr::value(average))
            .col_expr(courses::Column::TotalReviews, Expr::value(total))
            .filter(courses::Column::Id.eq(course_id))
            .exec(conn)
            .await?;

        Ok(())
    }

    async fn to_response(
        db: &DatabaseConnection,
        review: &reviews::Model,
    ) -> Result<ReviewResponse, ApiError> {
        let student = users::Entity::find_by_id(review.student_id)
            .one(db)
            .await?
            .ok_or_else(|| ApiError::Internal(format!("review {} has no author", review.id)))?;
        Ok(ReviewResponse::build(review, &student))
    }

    pub async fn list(
        db: &DatabaseConnection,
        user: &users::Model,
        course_id: Uuid,
        filters: &ReviewFilters,
        params: &PageParams,
    ) -> Result<Page<ReviewResponse>, ApiError> {
        let course = CourseService::find_visible(db, Some(user), course_id).await?;

        let (column, order) = parse_ordering(
            filters.ordering.as_deref(),
            &[
                ("created_at", reviews::Column::CreatedAt),
                ("rating", reviews::Column::Rating),
            ],
            (reviews::Column::CreatedAt, Order::Desc),
        );

        let paginator = reviews::Entity::find()
            .filter(reviews::Column::CourseId.eq(course.id))
            .order_by(column, order)
            .paginate(db, params.page_size());
        let count = paginator.num_items().await?;
        let rows = paginator.fetch_page(params.page() - 1).await?;

        let students = users_by_id(db, rows.iter().map(|r| r.student_id)).await?;
        let data = rows
            .iter()
            .filter_map(|review| {
                students
                    .get(&review.student_id)
                    .map(|student| ReviewResponse::build(review, student))
            })
            .collect();

        Ok(Page::new(data, count, params))
    }

    async fn find(
        db: &DatabaseConnection,
        course: &courses::Model,
        review_id: Uuid,
    ) -> Result<reviews::Model, ApiError> {
        reviews::Entity::find_by_id(review_id)
            .filter(reviews::Column::CourseId.eq(course.id))
            .one(db)
            .await?
            .ok_or_else(|| ApiError::not_found("Not found."))
    }

    pub async fn get(
        db: &DatabaseConnection,
        user: &users::Model,
        course_id: Uuid,
        review_id: Uuid,
    ) -> Result<ReviewResponse, ApiError> {
        let course = CourseService::find_visible(db, Some(user), course_id).await?;
        let review = Self::find(db, &course, review_id).await?;
        Self::to_response(db, &review).await
    }

    pub async fn create(
        db: &DatabaseConnection,
        user: &users::Model,
        course_id: Uuid,
        input: ReviewInput,
    ) -> Result<ReviewResponse, ApiError> {
        let course = CourseService::find_visible(db, Some(user), course_id).await?;
        input.validate()?;

        let rating = input
            .rating
            .ok_or_else(|| ApiError::field("rating", "This field is required."))?;

        // 1. Inscription obligatoire
        let enrolled = enrollments::Entity::find()
            .filter(enrollments::Column::StudentId.eq(user.id))
            .filter(enrollments::Column::CourseId.eq(course.id))
            .count(db)
            .await?
            > 0;
        if !enrolled {
            return Err(ApiError::non_field(
                "You must be enrolled in this course to leave a review.",
            ));
        }

        // 2. Un seul avis par étudiant
        let existing = reviews::Entity::find()
            .filter(reviews::Column::StudentId.eq(user.id))
            .filter(reviews::Column::CourseId.eq(course.id))
            .count(db)
            .await?;
        if existing > 0 {
            return Err(ApiError::non_field(
                "You have already reviewed this course. You can update your existing review.",
            ));
        }

        // 3. Insertion + agrégat
        let txn = db.begin().await?;

        let now = Utc::now();
        let review = reviews::ActiveModel {
            id: Set(Uuid::new_v4()),
            course_id: Set(course.id),
            student_id: Set(user.id),
            rating: Set(rating),
            review_text: Set(input.review_text.unwrap_or_default()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        Self::refresh_course_rating(&txn, course.id).await?;
        txn.commit().await?;

        log::info!("Review {} on course {} ({}/5)", user.email, course.title, rating);
        Ok(ReviewResponse::build(&review, user))
    }

    pub async fn update(
        db: &DatabaseConnection,
        user: &users::Model,
        ids: (Uuid, Uuid),
        input: ReviewInput,
        partial: bool,
    ) -> Result<ReviewResponse, ApiError> {
        let (course_id, review_id) = ids;
        let course = CourseService::find_visible(db, Some(user), course_id).await?;
        let review = Self::find(db, &course, review_id).await?;

        if review.student_id != user.id {
            return Err(ApiError::forbidden("You can only update your own reviews."));
        }

        input.validate()?;
        if !partial && input.rating.is_none() {
            return Err(ApiError::field("rating", "This field is required."));
        }

        let txn = db.begin().await?;

        let mut active: reviews::ActiveModel = review.into();
        if let Some(rating) = input.rating {
            active.rating = Set(rating);
        }
        if let Some(review_text) = input.review_text {
            active.review_text = Set(review_text);
        }
        active.updated_at = Set(Utc::now());
        let review = active.update(&txn).await?;

        Self::refresh_course_rating(&txn, course.id).await?;
        txn.commit().await?;

        Ok(ReviewResponse::build(&review, user))
    }

    pub async fn delete(
        db: &DatabaseConnection,
        user: &users::Model,
        ids: (Uuid, Uuid),
    ) -> Result<(), ApiError> {
        let (course_id, review_id) = ids;
        let course = CourseService::find_visible(db, Some(user), course_id).await?;
        let review = Self::find(db, &course, review_id).await?;

        if review.student_id != user.id && !user.is_admin() {
            return Err(ApiError::permission_denied());
        }

        let txn = db.begin().await?;
        review.delete(&txn).await?;
        Self::refresh_course_rating(&txn, course.id).await?;
        txn.commit().await?;

        Ok(())
    }
}
