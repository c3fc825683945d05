// Helpers partagés par les tests d'intégration : base SQLite en mémoire,
// mailer qui enregistre, création directe d'utilisateurs et de cours.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use actix_web::http::header;
use actix_web::web;
use chrono::Utc;
use sea_orm::*;
use uuid::Uuid;

use learning_platform::config::AppConfig;
use learning_platform::db::establish_connection;
use learning_platform::models::courses::CourseStatus;
use learning_platform::models::requests::{CourseInput, CourseReviewRequest, SectionInput};
use learning_platform::models::users::{self, UserRole};
use learning_platform::services::content_service::ContentService;
use learning_platform::services::course_service::CourseService;
use learning_platform::services::mail::{EmailDispatcher, RecordingMailer};
use learning_platform::utils::{jwt, password};

pub const PASSWORD: &str = "Sup3rSecret!";

pub struct TestContext {
    pub db: web::Data<DatabaseConnection>,
    pub config: web::Data<AppConfig>,
    pub mailer: web::Data<EmailDispatcher>,
    pub recorder: Arc<RecordingMailer>,
}

impl TestContext {
    pub async fn new() -> Self {
        let mut config = AppConfig::with_defaults("sqlite::memory:");
        config.password_hash_iterations = 1_000;

        let db = establish_connection(&config.database_url)
            .await
            .expect("failed to open the test database");

        let recorder = Arc::new(RecordingMailer::new());
        let mailer = EmailDispatcher::new(recorder.clone(), 0, Duration::ZERO);

        Self {
            db: web::Data::new(db),
            config: web::Data::new(config),
            mailer: web::Data::new(mailer),
            recorder,
        }
    }

    pub fn db(&self) -> &DatabaseConnection {
        self.db.get_ref()
    }

    /// Utilisateur actif et vérifié, mot de passe PASSWORD
    pub async fn create_user(&self, email: &str, role: UserRole) -> users::Model {
        let now = Utc::now();
        users::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(email.to_string()),
            password_hash: Set(password::hash_password(PASSWORD, 1_000).unwrap()),
            first_name: Set("Test".to_string()),
            last_name: Set(role.as_str().to_lowercase()),
            role: Set(role),
            is_active: Set(true),
            is_staff: Set(role == UserRole::Admin),
            email_verified: Set(true),
            bio: Set(String::new()),
            profile_picture: Set(None),
            phone_number: Set(String::new()),
            date_joined: Set(now),
            last_login: Set(None),
            updated_at: Set(now),
        }
        .insert(self.db())
        .await
        .unwrap()
    }

    pub async fn reload_user(&self, id: Uuid) -> users::Model {
        users::Entity::find_by_id(id)
            .one(self.db())
            .await
            .unwrap()
            .unwrap()
    }

    /// Header Authorization avec un access token valide
    pub fn auth(&self, user: &users::Model) -> (header::HeaderName, String) {
        let tokens = jwt::generate_token_pair(user, &self.config.jwt).unwrap();
        (header::AUTHORIZATION, format!("Bearer {}", tokens.access))
    }

    /// Cours DRAFT avec une section
    pub async fn create_draft_course(&self, instructor: &users::Model, total_seats: i32) -> Uuid {
        let course = CourseService::create(
            self.db(),
            instructor,
            CourseInput {
                title: Some(format!("Course {}", Uuid::new_v4().simple())),
                description: Some("A course used in tests.".to_string()),
                total_seats: Some(total_seats),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        ContentService::create_section(
            self.db(),
            instructor,
            course.id,
            SectionInput {
                title: Some("Getting started".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        course.id
    }

    /// Cours soumis puis publié par l'admin
    pub async fn create_published_course(
        &self,
        instructor: &users::Model,
        admin: &users::Model,
        total_seats: i32,
    ) -> Uuid {
        let course_id = self.create_draft_course(instructor, total_seats).await;

        CourseService::submit_for_review(self.db(), instructor, course_id)
            .await
            .unwrap();
        CourseService::review(
            self.db(),
            admin,
            course_id,
            CourseReviewRequest {
                status: CourseStatus::Published,
                review_notes: String::new(),
            },
        )
        .await
        .unwrap();

        course_id
    }
}

/// App complète (mêmes middlewares que le serveur) sur le contexte de test
macro_rules! init_app {
    ($ctx:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data($ctx.db.clone())
                .app_data($ctx.config.clone())
                .app_data($ctx.mailer.clone())
                .wrap(actix_web::middleware::from_fn(
                    learning_platform::middleware::errors::reveal_internal_errors,
                ))
                .wrap(actix_web::middleware::NormalizePath::trim())
                .configure(learning_platform::configure_app),
        )
        .await
    };
}

pub(crate) use init_app;
