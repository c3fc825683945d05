pub mod config;
pub mod db;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use actix_web::web;

/// Routes + gestion des erreurs d'extraction (partagé par le serveur et les tests)
pub fn configure_app(cfg: &mut web::ServiceConfig) {
    cfg.app_data(middleware::errors::json_config())
        .app_data(middleware::errors::query_config())
        .app_data(middleware::errors::path_config())
        .configure(routes::configure_routes);
}
