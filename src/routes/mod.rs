pub mod accounts;
pub mod analytics;
pub mod courses;
pub mod enrollments;
pub mod health;

use actix_web::web;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(health::health_check)
            .service(
                web::scope("/v1")
                    .configure(accounts::accounts_routes)
                    .configure(courses::courses_routes)
                    .configure(enrollments::enrollments_routes)
                    .configure(analytics::analytics_routes),
            ),
    );
}
