// Statistiques agrégées pour les tableaux de bord instructeur et admin

use sea_orm::*;
use serde::Serialize;

use crate::models::courses::{self, CourseStatus};
use crate::models::dto::round_rating;
use crate::models::enrollments;
use crate::models::instructor_requests::{self, InstructorRequestStatus};
use crate::models::users::{self, UserRole};

#[derive(Debug, Serialize)]
pub struct InstructorStats {
    pub total_courses: u64,
    pub published_courses: u64,
    pub total_enrollments: u64,
    pub average_rating: f64,
    pub total_reviews: i64,
}

#[derive(Debug, Serialize)]
pub struct AdminStats {
    pub total_users: u64,
    pub total_students: u64,
    pub total_instructors: u64,
    pub total_courses: u64,
    pub published_courses: u64,
    pub pending_courses: u64,
    pub total_enrollments: u64,
    pub pending_instructor_requests: u64,
}

pub struct AnalyticsService;

impl AnalyticsService {
    pub async fn instructor(
        db: &DatabaseConnection,
        instructor: &users::Model,
    ) -> Result<InstructorStats, DbErr> {
        let courses = courses::Entity::find()
            .filter(courses::Column::InstructorId.eq(instructor.id))
            .all(db)
            .await?;

        let published_courses = courses
            .iter()
            .filter(|c| c.status == CourseStatus::Published)
            .count() as u64;

        let total_enrollments = enrollments::Entity::find()
            .inner_join(courses::Entity)
            .filter(courses::Column::InstructorId.eq(instructor.id))
            .count(db)
            .await?;

        // moyenne des notes moyennes de chaque cours
        let average_rating = if courses.is_empty() {
            0.0
        } else {
            let sum: f64 = courses.iter().map(|c| c.average_rating).sum();
            round_rating(sum / courses.len() as f64)
        };

        let total_reviews = courses.iter().map(|c| i64::from(c.total_reviews)).sum();

        Ok(InstructorStats {
            total_courses: courses.len() as u64,
            published_courses,
            total_enrollments,
            average_rating,
            total_reviews,
        })
    }

    pub async fn admin(db: &DatabaseConnection) -> Result<AdminStats, DbErr> {
        Ok(AdminStats {
            total_users: users::Entity::find().count(db).await?,
            total_students: count_users_with_role(db, UserRole::Student).await?,
            total_instructors: count_users_with_role(db, UserRole::Instructor).await?,
            total_courses: courses::Entity::find().count(db).await?,
            published_courses: count_courses_with_status(db, CourseStatus::Published).await?,
            pending_courses: count_courses_with_status(db, CourseStatus::Pending).await?,
            total_enrollments: enrollments::Entity::find().count(db).await?,
            pending_instructor_requests: instructor_requests::Entity::find()
                .filter(instructor_requests::Column::Status.eq(InstructorRequestStatus::Pending))
                .count(db)
                .await?,
        })
    }
}

async fn count_users_with_role(db: &DatabaseConnection, role: UserRole) -> Result<u64, DbErr> {
    users::Entity::find()
        .filter(users::Column::Role.eq(role))
        .count(db)
        .await
}

async fn count_courses_with_status(
    db: &DatabaseConnection,
    status: CourseStatus,
) -> Result<u64, DbErr> {
    courses::Entity::find()
        .filter(courses::Column::Status.eq(status))
        .count(db)
        .await
}
