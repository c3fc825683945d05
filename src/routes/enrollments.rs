use actix_web::{HttpResponse, delete, get, patch, post, web};
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::middleware::AuthUser;
use crate::models::requests::{EnrollRequest, ProgressCreate, ProgressUpdate};
use crate::services::enrollment_service::EnrollmentService;
use crate::services::progress_service::ProgressService;
use crate::utils::error::ApiError;
use crate::utils::response::{self, PageParams};

// ============================================================================
// Inscriptions (PROTÉGÉES, toujours celles de l'appelant)
// ============================================================================

#[get("/enrollments")]
pub async fn list_enrollments(
    auth_user: AuthUser,
    page: web::Query<PageParams>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let page = EnrollmentService::list(&db, &auth_user.user, &page).await?;
    Ok(page.into_response())
}

#[get("/enrollments/{id}")]
pub async fn get_enrollment(
    auth_user: AuthUser,
    path: web::Path<Uuid>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let enrollment = EnrollmentService::get(&db, &auth_user.user, path.into_inner()).await?;
    Ok(response::ok(enrollment))
}

/// POST /enrollments - 201 à la création, 200 si déjà inscrit
#[post("/enrollments")]
pub async fn enroll(
    auth_user: AuthUser,
    body: web::Json<EnrollRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let outcome = EnrollmentService::enroll(&db, &auth_user.user, body.course).await?;

    if outcome.created {
        Ok(response::created("Enrolled successfully", outcome.enrollment))
    } else {
        Ok(response::ok_with_message("Already enrolled", outcome.enrollment))
    }
}

#[delete("/enrollments/{id}")]
pub async fn unenroll(
    auth_user: AuthUser,
    path: web::Path<Uuid>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    EnrollmentService::unenroll(&db, &auth_user.user, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

// ============================================================================
// Progression
// ============================================================================

#[get("/progress")]
pub async fn list_progress(
    auth_user: AuthUser,
    page: web::Query<PageParams>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let page = ProgressService::list(&db, &auth_user.user, &page).await?;
    Ok(page.into_response())
}

#[get("/progress/{id}")]
pub async fn get_progress(
    auth_user: AuthUser,
    path: web::Path<Uuid>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let progress = ProgressService::get(&db, &auth_user.user, path.into_inner()).await?;
    Ok(response::ok(progress))
}

#[post("/progress")]
pub async fn create_progress(
    auth_user: AuthUser,
    body: web::Json<ProgressCreate>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let (progress, created) =
        ProgressService::create(&db, &auth_user.user, body.into_inner()).await?;

    if created {
        Ok(response::created("Lesson progress started", progress))
    } else {
        Ok(response::ok(progress))
    }
}

#[patch("/progress/{id}")]
pub async fn update_progress(
    auth_user: AuthUser,
    path: web::Path<Uuid>,
    body: web::Json<ProgressUpdate>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let progress =
        ProgressService::update(&db, &auth_user.user, path.into_inner(), body.into_inner()).await?;
    Ok(response::ok(progress))
}

#[post("/progress/{id}/mark_complete")]
pub async fn mark_complete(
    auth_user: AuthUser,
    path: web::Path<Uuid>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    ProgressService::mark_complete(&db, &auth_user.user, path.into_inner()).await?;
    Ok(response::message("Lesson marked as complete"))
}

// ============================================================================
// Certificats
// ============================================================================

#[get("/certificates")]
pub async fn list_certificates(
    auth_user: AuthUser,
    page: web::Query<PageParams>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let page = ProgressService::certificates(&db, &auth_user.user, &page).await?;
    Ok(page.into_response())
}

pub fn enrollments_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/enrollments")
            .service(list_enrollments)
            .service(get_enrollment)
            .service(enroll)
            .service(unenroll)
            .service(list_progress)
            .service(get_progress)
            .service(create_progress)
            .service(update_progress)
            .service(mark_complete)
            .service(list_certificates),
    );
}
