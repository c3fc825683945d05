use actix_web::{HttpResponse, get, web};
use sea_orm::DatabaseConnection;

use crate::middleware::AuthUser;
use crate::services::analytics_service::AnalyticsService;
use crate::utils::error::ApiError;
use crate::utils::response;

/// GET /analytics/instructor - Stats des cours de l'instructeur (INSTRUCTOR)
#[get("/instructor")]
pub async fn instructor_stats(
    auth_user: AuthUser,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    auth_user.require_instructor()?;
    let stats = AnalyticsService::instructor(&db, &auth_user.user).await?;
    Ok(response::ok(stats))
}

/// GET /analytics/admin - Stats globales de la plateforme (ADMIN)
#[get("/admin")]
pub async fn admin_stats(
    auth_user: AuthUser,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    auth_user.require_admin()?;
    let stats = AnalyticsService::admin(&db).await?;
    Ok(response::ok(stats))
}

pub fn analytics_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/analytics")
            .service(instructor_stats)
            .service(admin_stats),
    );
}
