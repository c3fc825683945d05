// Corps de requête et paramètres de query acceptés par l'API
// (validation déclarative avec `validator`, le reste dans les services)

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use super::courses::{CourseStatus, DifficultyLevel};
use super::instructor_requests::InstructorRequestStatus;
use super::lessons::LessonType;
use super::users::UserRole;

// ----------------------------------------------------------------------------
// Comptes
// ----------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,
    pub password: String,
    pub password_confirm: String,
    #[serde(default)]
    #[validate(length(max = 150, message = "Ensure this field has no more than 150 characters."))]
    pub first_name: String,
    #[serde(default)]
    #[validate(length(max = 150, message = "Ensure this field has no more than 150 characters."))]
    pub last_name: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyEmailRequest {
    pub token: String,
}

/// Utilisé par /resend-verification et /password/reset
#[derive(Debug, Deserialize, Validate)]
pub struct EmailRequest {
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
    pub new_password_confirm: String,
}

#[derive(Debug, Deserialize)]
pub struct PasswordResetConfirmRequest {
    pub token: String,
    pub new_password: String,
    pub new_password_confirm: String,
}

/// PUT et PATCH /profile : seuls les champs présents sont modifiés
#[derive(Debug, Default, Deserialize, Validate)]
pub struct ProfileUpdateRequest {
    #[validate(length(max = 150, message = "Ensure this field has no more than 150 characters."))]
    pub first_name: Option<String>,
    #[validate(length(max = 150, message = "Ensure this field has no more than 150 characters."))]
    pub last_name: Option<String>,
    pub bio: Option<String>,
    #[validate(url(message = "Enter a valid URL."))]
    pub profile_picture: Option<String>,
    #[validate(length(max = 20, message = "Ensure this field has no more than 20 characters."))]
    pub phone_number: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct InstructorRequestCreate {
    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub reason: String,
    #[serde(default)]
    pub qualifications: String,
    #[serde(default)]
    pub teaching_interests: String,
}

#[derive(Debug, Deserialize)]
pub struct InstructorRequestReview {
    pub status: InstructorRequestStatus,
    #[serde(default)]
    pub review_notes: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct InstructorRequestFilters {
    pub status: Option<InstructorRequestStatus>,
    pub search: Option<String>,
    pub ordering: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UserFilters {
    pub role: Option<UserRole>,
    pub is_active: Option<bool>,
    pub email_verified: Option<bool>,
    pub search: Option<String>,
    pub ordering: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: UserRole,
}

// ----------------------------------------------------------------------------
// Catalogue
// ----------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize, Validate)]
pub struct CategoryInput {
    #[validate(length(min = 1, max = 100, message = "Ensure this field has between 1 and 100 characters."))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(length(max = 50, message = "Ensure this field has no more than 50 characters."))]
    pub icon: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CategoryFilters {
    pub search: Option<String>,
    pub ordering: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReviewFilters {
    pub ordering: Option<String>,
}

/// Création et modification d'un cours
#[derive(Debug, Default, Deserialize, Validate)]
pub struct CourseInput {
    #[validate(length(min = 1, max = 200, message = "Ensure this field has between 1 and 200 characters."))]
    pub title: Option<String>,
    pub description: Option<String>,
    #[validate(length(max = 300, message = "Ensure this field has no more than 300 characters."))]
    pub short_description: Option<String>,
    pub category: Option<Uuid>,
    pub difficulty_level: Option<DifficultyLevel>,
    pub price: Option<Decimal>,
    pub thumbnail: Option<String>,
    pub preview_video: Option<String>,
    #[validate(range(min = 0, message = "Ensure this value is greater than or equal to 0."))]
    pub duration_hours: Option<i32>,
    pub requirements: Option<String>,
    pub learning_outcomes: Option<String>,
    pub target_audience: Option<String>,
    pub who_can_join: Option<String>,
    pub class_starts: Option<NaiveDate>,
    pub admission_deadline: Option<NaiveDate>,
    pub schedule: Option<String>,
    pub venue: Option<String>,
    pub total_seats: Option<i32>,
    pub available_seats: Option<i32>,
    pub status: Option<CourseStatus>,
}

#[derive(Debug, Deserialize)]
pub struct CourseReviewRequest {
    pub status: CourseStatus,
    #[serde(default)]
    pub review_notes: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct CourseFilters {
    pub category: Option<Uuid>,
    pub difficulty_level: Option<DifficultyLevel>,
    pub is_free: Option<bool>,
    pub status: Option<CourseStatus>,
    pub search: Option<String>,
    pub ordering: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct SectionInput {
    #[validate(length(min = 1, max = 200, message = "Ensure this field has between 1 and 200 characters."))]
    pub title: Option<String>,
    pub description: Option<String>,
    #[validate(range(min = 0, message = "Ensure this value is greater than or equal to 0."))]
    pub order: Option<i32>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct LessonInput {
    #[validate(length(min = 1, max = 200, message = "Ensure this field has between 1 and 200 characters."))]
    pub title: Option<String>,
    pub lesson_type: Option<LessonType>,
    pub content: Option<String>,
    pub video_url: Option<String>,
    #[validate(range(min = 0, message = "Ensure this value is greater than or equal to 0."))]
    pub video_duration: Option<i32>,
    pub resources: Option<String>,
    pub is_preview: Option<bool>,
    #[validate(range(min = 0, message = "Ensure this value is greater than or equal to 0."))]
    pub order: Option<i32>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct ReviewInput {
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5."))]
    pub rating: Option<i32>,
    pub review_text: Option<String>,
}

// ----------------------------------------------------------------------------
// Inscriptions
// ----------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct EnrollRequest {
    pub course: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct ProgressCreate {
    pub enrollment: Uuid,
    pub lesson: Uuid,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ProgressUpdate {
    #[validate(range(min = 0, message = "Ensure this value is greater than or equal to 0."))]
    pub watched_duration: Option<i32>,
}
