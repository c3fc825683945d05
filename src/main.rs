use actix_cors::Cors;
use actix_web::{
    App, HttpServer, http::header,
    middleware::{Logger, NormalizePath, from_fn},
    web,
};

use learning_platform::config::AppConfig;
use learning_platform::middleware::errors::reveal_internal_errors;
use learning_platform::services::mail::EmailDispatcher;
use learning_platform::{configure_app, db};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::from_env().map_err(std::io::Error::other)?;

    log::info!("Connecting to database...");
    let db = db::establish_connection(&config.database_url)
        .await
        .map_err(std::io::Error::other)?;
    log::info!("Database connected");

    let mailer = EmailDispatcher::from_config(&config.mail).map_err(std::io::Error::other)?;

    let bind_address = config.bind_address.clone();
    let cors_origins = config.cors_origins.clone();
    let db = web::Data::new(db);
    let config = web::Data::new(config);
    let mailer = web::Data::new(mailer);

    log::info!("Starting server on http://{}", bind_address);

    HttpServer::new(move || {
        let mut cors = Cors::default()
            .allowed_methods(vec!["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"])
            .allowed_headers(vec![header::AUTHORIZATION, header::ACCEPT, header::CONTENT_TYPE])
            .max_age(3600);
        for origin in &cors_origins {
            cors = cors.allowed_origin(origin);
        }

        App::new()
            .app_data(db.clone())
            .app_data(config.clone())
            .app_data(mailer.clone())
            .wrap(from_fn(reveal_internal_errors))
            .wrap(NormalizePath::trim())
            .wrap(cors)
            .wrap(Logger::default())
            .configure(configure_app)
    })
    .bind(bind_address)?
    .run()
    .await
}
