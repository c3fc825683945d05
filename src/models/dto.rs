// pour les réponses structurées (ce que l'API expose, jamais le password_hash)
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use super::courses::{CourseStatus, DifficultyLevel};
use super::instructor_requests::InstructorRequestStatus;
use super::lessons::LessonType;
use super::users::UserRole;
use super::{
    categories, certificates, courses, enrollments, instructor_requests, lesson_progress, lessons,
    reviews, sections, users,
};

/// Prix en centimes -> "49.99"
pub fn format_price(price_cents: i64) -> String {
    Decimal::new(price_cents, 2).to_string()
}

/// Note arrondie à 2 décimales
pub fn round_rating(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub role: UserRole,
    pub bio: String,
    pub profile_picture: Option<String>,
    pub phone_number: String,
    pub email_verified: bool,
    pub is_active: bool,
    pub date_joined: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl From<&users::Model> for UserResponse {
    fn from(user: &users::Model) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            full_name: user.full_name(),
            role: user.role,
            bio: user.bio.clone(),
            profile_picture: user.profile_picture.clone(),
            phone_number: user.phone_number.clone(),
            email_verified: user.email_verified,
            is_active: user.is_active,
            date_joined: user.date_joined,
            last_login: user.last_login,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct InstructorRequestResponse {
    pub id: Uuid,
    pub user: Uuid,
    pub user_email: String,
    pub user_name: String,
    pub status: InstructorRequestStatus,
    pub reason: String,
    pub qualifications: String,
    pub teaching_interests: String,
    pub reviewed_by: Option<Uuid>,
    pub reviewed_by_email: Option<String>,
    pub review_notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
}

impl InstructorRequestResponse {
    pub fn build(
        request: &instructor_requests::Model,
        user: &users::Model,
        reviewer: Option<&users::Model>,
    ) -> Self {
        Self {
            id: request.id,
            user: request.user_id,
            user_email: user.email.clone(),
            user_name: user.full_name(),
            status: request.status,
            reason: request.reason.clone(),
            qualifications: request.qualifications.clone(),
            teaching_interests: request.teaching_interests.clone(),
            reviewed_by: request.reviewed_by,
            reviewed_by_email: reviewer.map(|r| r.email.clone()),
            review_notes: request.review_notes.clone(),
            created_at: request.created_at,
            updated_at: request.updated_at,
            reviewed_at: request.reviewed_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub icon: String,
    pub is_active: bool,
    pub course_count: u64,
    pub created_at: DateTime<Utc>,
}

impl CategoryResponse {
    pub fn build(category: &categories::Model, course_count: u64) -> Self {
        Self {
            id: category.id,
            name: category.name.clone(),
            slug: category.slug.clone(),
            description: category.description.clone(),
            icon: category.icon.clone(),
            is_active: category.is_active,
            course_count,
            created_at: category.created_at,
        }
    }
}

/// Version allégée d'une leçon (dans les sections)
#[derive(Debug, Serialize)]
pub struct LessonSummary {
    pub id: Uuid,
    pub title: String,
    pub lesson_type: LessonType,
    pub video_duration: i32,
    pub is_preview: bool,
    pub order: i32,
}

impl From<&lessons::Model> for LessonSummary {
    fn from(lesson: &lessons::Model) -> Self {
        Self {
            id: lesson.id,
            title: lesson.title.clone(),
            lesson_type: lesson.lesson_type,
            video_duration: lesson.video_duration,
            is_preview: lesson.is_preview,
            order: lesson.order,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LessonResponse {
    pub id: Uuid,
    pub section: Uuid,
    pub title: String,
    pub lesson_type: LessonType,
    pub content: String,
    pub video_url: String,
    pub video_duration: i32,
    pub resources: Option<String>,
    pub is_preview: bool,
    pub order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&lessons::Model> for LessonResponse {
    fn from(lesson: &lessons::Model) -> Self {
        Self {
            id: lesson.id,
            section: lesson.section_id,
            title: lesson.title.clone(),
            lesson_type: lesson.lesson_type,
            content: lesson.content.clone(),
            video_url: lesson.video_url.clone(),
            video_duration: lesson.video_duration,
            resources: lesson.resources.clone(),
            is_preview: lesson.is_preview,
            order: lesson.order,
            created_at: lesson.created_at,
            updated_at: lesson.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SectionResponse {
    pub id: Uuid,
    pub course: Uuid,
    pub title: String,
    pub description: String,
    pub order: i32,
    pub lessons: Vec<LessonSummary>,
    pub lesson_count: usize,
    pub created_at: DateTime<Utc>,
}

impl SectionResponse {
    pub fn build(section: &sections::Model, lessons: &[lessons::Model]) -> Self {
        Self {
            id: section.id,
            course: section.course_id,
            title: section.title.clone(),
            description: section.description.clone(),
            order: section.order,
            lessons: lessons.iter().map(LessonSummary::from).collect(),
            lesson_count: lessons.len(),
            created_at: section.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReviewResponse {
    pub id: Uuid,
    pub course: Uuid,
    pub student: Uuid,
    pub student_name: String,
    pub student_email: String,
    pub rating: i32,
    pub review_text: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ReviewResponse {
    pub fn build(review: &reviews::Model, student: &users::Model) -> Self {
        Self {
            id: review.id,
            course: review.course_id,
            student: review.student_id,
            student_name: student.full_name(),
            student_email: student.email.clone(),
            rating: review.rating,
            review_text: review.review_text.clone(),
            created_at: review.created_at,
            updated_at: review.updated_at,
        }
    }
}

/// Données dérivées d'un cours, calculées au moment de la réponse
#[derive(Debug, Clone, Copy)]
pub struct CourseStats {
    pub total_classes: u64,
    pub today: NaiveDate,
}

#[derive(Debug, Serialize)]
pub struct CourseListItem {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub short_description: String,
    pub instructor_name: String,
    pub category_name: Option<String>,
    pub difficulty_level: DifficultyLevel,
    pub price: String,
    pub is_free: bool,
    pub thumbnail: Option<String>,
    pub who_can_join: String,
    pub duration_hours: i32,
    pub status: CourseStatus,
    pub enrollment_count: i32,
    pub average_rating: f64,
    pub total_reviews: i32,
    pub total_classes: u64,
    pub available_seats: i32,
    pub total_seats: i32,
    pub is_admission_open: bool,
    pub is_full: bool,
    pub class_starts: Option<NaiveDate>,
    pub admission_deadline: Option<NaiveDate>,
    pub schedule: String,
    pub venue: String,
    pub created_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
}

impl CourseListItem {
    pub fn build(
        course: &courses::Model,
        instructor: Option<&users::Model>,
        category: Option<&categories::Model>,
        stats: CourseStats,
    ) -> Self {
        Self {
            id: course.id,
            title: course.title.clone(),
            slug: course.slug.clone(),
            short_description: course.short_description.clone(),
            instructor_name: instructor.map(|u| u.full_name()).unwrap_or_default(),
            category_name: category.map(|c| c.name.clone()),
            difficulty_level: course.difficulty_level,
            price: format_price(course.price_cents),
            is_free: course.is_free,
            thumbnail: course.thumbnail.clone(),
            who_can_join: course.who_can_join.clone(),
            duration_hours: course.duration_hours,
            status: course.status,
            enrollment_count: course.enrollment_count,
            average_rating: round_rating(course.average_rating),
            total_reviews: course.total_reviews,
            total_classes: stats.total_classes,
            available_seats: course.available_seats,
            total_seats: course.total_seats,
            is_admission_open: course.is_admission_open(stats.today),
            is_full: course.is_full(),
            class_starts: course.class_starts,
            admission_deadline: course.admission_deadline,
            schedule: course.schedule.clone(),
            venue: course.venue.clone(),
            created_at: course.created_at,
            published_at: course.published_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CourseDetail {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub short_description: String,
    pub instructor: Option<UserResponse>,
    pub category: Option<CategoryResponse>,
    pub difficulty_level: DifficultyLevel,
    pub price: String,
    pub is_free: bool,
    pub thumbnail: Option<String>,
    pub preview_video: String,
    pub duration_hours: i32,
    pub requirements: String,
    pub learning_outcomes: String,
    pub target_audience: String,
    pub who_can_join: String,
    pub status: CourseStatus,
    pub review_notes: String,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub sections: Vec<SectionResponse>,
    pub enrollment_count: i32,
    pub average_rating: f64,
    pub total_reviews: i32,
    pub reviews: Vec<ReviewResponse>,
    pub is_enrolled: bool,
    pub total_classes: u64,
    pub available_seats: i32,
    pub total_seats: i32,
    pub class_starts: Option<NaiveDate>,
    pub admission_deadline: Option<NaiveDate>,
    pub schedule: String,
    pub venue: String,
    pub is_admission_open: bool,
    pub is_full: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct EnrollmentResponse {
    pub id: Uuid,
    pub student: Uuid,
    pub student_name: String,
    pub course: CourseListItem,
    pub progress_percentage: f64,
    pub enrolled_at: DateTime<Utc>,
    pub last_accessed: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl EnrollmentResponse {
    pub fn build(
        enrollment: &enrollments::Model,
        student: &users::Model,
        course: CourseListItem,
    ) -> Self {
        Self {
            id: enrollment.id,
            student: enrollment.student_id,
            student_name: student.full_name(),
            course,
            progress_percentage: round_rating(enrollment.progress_percentage),
            enrolled_at: enrollment.enrolled_at,
            last_accessed: enrollment.last_accessed,
            completed_at: enrollment.completed_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LessonProgressResponse {
    pub id: Uuid,
    pub enrollment: Uuid,
    pub lesson: Uuid,
    pub lesson_title: String,
    pub completed: bool,
    pub watched_duration: i32,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub last_accessed: DateTime<Utc>,
}

impl LessonProgressResponse {
    pub fn build(progress: &lesson_progress::Model, lesson: Option<&lessons::Model>) -> Self {
        Self {
            id: progress.id,
            enrollment: progress.enrollment_id,
            lesson: progress.lesson_id,
            lesson_title: lesson.map(|l| l.title.clone()).unwrap_or_default(),
            completed: progress.completed,
            watched_duration: progress.watched_duration,
            started_at: progress.started_at,
            completed_at: progress.completed_at,
            last_accessed: progress.last_accessed,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CertificateResponse {
    pub id: Uuid,
    pub enrollment: Uuid,
    pub course: Uuid,
    pub course_title: String,
    pub certificate_number: String,
    pub issued_at: DateTime<Utc>,
}

impl CertificateResponse {
    pub fn build(certificate: &certificates::Model, course: &courses::Model) -> Self {
        Self {
            id: certificate.id,
            enrollment: certificate.enrollment_id,
            course: course.id,
            course_title: course.title.clone(),
            certificate_number: certificate.certificate_number.clone(),
            issued_at: certificate.issued_at,
        }
    }
}
