// ============================================================================
// SEED - Données de démonstration
// ============================================================================
//
// Usage:
//   cargo run --bin seed -- [nombre_de_cours]
//   (ou SEED_COURSE_COUNT dans l'environnement, 5 par défaut)
//
// Crée (ou réutilise) un admin, un instructeur et une catégorie, puis des
// cours DRAFT de démonstration avec une section et une leçon chacun.
//
// ============================================================================

use std::env;
use std::error::Error;

use chrono::Utc;
use sea_orm::*;
use uuid::Uuid;

use learning_platform::config::AppConfig;
use learning_platform::db;
use learning_platform::models::lessons::LessonType;
use learning_platform::models::requests::{CategoryInput, CourseInput, LessonInput, SectionInput};
use learning_platform::models::users::{self, UserRole};
use learning_platform::models::{categories, courses::DifficultyLevel};
use learning_platform::services::auth_service::normalize_email;
use learning_platform::services::category_service::CategoryService;
use learning_platform::services::content_service::ContentService;
use learning_platform::services::course_service::CourseService;
use learning_platform::utils::password::hash_password;

const ADMIN_EMAIL: &str = "admin@admin.com";
const INSTRUCTOR_EMAIL: &str = "instructor@example.com";
const DEFAULT_PASSWORD: &str = "admin1234";
const CATEGORY_NAME: &str = "Networking";
const DEFAULT_COURSE_COUNT: usize = 5;

const TOPICS: [&str; 6] = [
    "TCP/IP Fundamentals",
    "Routing and Switching",
    "Network Security Basics",
    "Wireless Networking",
    "Cloud Networking",
    "Network Troubleshooting",
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::from_env()?;
    let course_count = course_count()?;

    let db = db::establish_connection(&config.database_url).await?;

    let _admin = get_or_create_user(&db, &config, ADMIN_EMAIL, UserRole::Admin).await?;
    let instructor = get_or_create_user(&db, &config, INSTRUCTOR_EMAIL, UserRole::Instructor).await?;
    let category_id = get_or_create_category(&db).await?;

    for i in 0..course_count {
        let topic = TOPICS[i % TOPICS.len()];
        let title = format!("{} {}", topic, i + 1);

        let course = CourseService::create(
            &db,
            &instructor,
            CourseInput {
                title: Some(title.clone()),
                description: Some(format!("A hands-on introduction to {}.", topic.to_lowercase())),
                short_description: Some(format!("Learn {} step by step.", topic)),
                category: Some(category_id),
                difficulty_level: Some(DifficultyLevel::Beginner),
                duration_hours: Some(10),
                total_seats: Some(30),
                ..Default::default()
            },
        )
        .await?;

        let section = ContentService::create_section(
            &db,
            &instructor,
            course.id,
            SectionInput {
                title: Some("Introduction".to_string()),
                description: Some(format!("Getting started with {}.", topic)),
                order: Some(1),
            },
        )
        .await?;

        ContentService::create_lesson(
            &db,
            &instructor,
            course.id,
            section.id,
            LessonInput {
                title: Some("Welcome".to_string()),
                lesson_type: Some(LessonType::Text),
                content: Some(format!("Welcome to {}!", title)),
                is_preview: Some(true),
                order: Some(1),
                ..Default::default()
            },
        )
        .await?;

        log::info!("Created course {} ({})", course.title, course.slug);
    }

    log::info!(
        "Seeding done: {} course(s) for {} in category {}",
        course_count,
        INSTRUCTOR_EMAIL,
        CATEGORY_NAME
    );
    Ok(())
}

/// Argument en ligne de commande, puis SEED_COURSE_COUNT, puis la valeur par défaut
fn course_count() -> Result<usize, Box<dyn Error>> {
    let raw = env::args()
        .nth(1)
        .or_else(|| env::var("SEED_COURSE_COUNT").ok());

    match raw {
        Some(value) => value
            .parse()
            .map_err(|_| format!("Invalid course count: {}", value).into()),
        None => Ok(DEFAULT_COURSE_COUNT),
    }
}

async fn get_or_create_user(
    db: &DatabaseConnection,
    config: &AppConfig,
    email: &str,
    role: UserRole,
) -> Result<users::Model, Box<dyn Error>> {
    let email = normalize_email(email);

    if let Some(user) = users::Entity::find()
        .filter(users::Column::Email.eq(email.as_str()))
        .one(db)
        .await?
    {
        log::info!("User already exists: {} ({})", user.email, user.role);
        return Ok(user);
    }

    let now = Utc::now();
    let user = users::ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(email),
        password_hash: Set(hash_password(DEFAULT_PASSWORD, config.password_hash_iterations)?),
        first_name: Set(role.as_str().to_lowercase()),
        last_name: Set(String::new()),
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
    .insert(db)
    .await?;

    log::info!("Created {} account: {}", user.role, user.email);
    Ok(user)
}

async fn get_or_create_category(db: &DatabaseConnection) -> Result<Uuid, Box<dyn Error>> {
    if let Some(category) = categories::Entity::find()
        .filter(categories::Column::Name.eq(CATEGORY_NAME))
        .one(db)
        .await?
    {
        log::info!("Category already exists: {}", category.name);
        return Ok(category.id);
    }

    let category = CategoryService::create(
        db,
        CategoryInput {
            name: Some(CATEGORY_NAME.to_string()),
            description: Some("Computer networks, protocols and infrastructure.".to_string()),
            icon: Some("network".to_string()),
            is_active: Some(true),
        },
    )
    .await?;

    log::info!("Created category: {}", category.name);
    Ok(category.id)
}
