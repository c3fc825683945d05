use actix_web::{HttpResponse, delete, get, patch, post, put, web};
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::middleware::{AuthUser, MaybeAuthUser};
use crate::models::requests::{
    CategoryFilters, CategoryInput, CourseFilters, CourseInput, CourseReviewRequest, LessonInput,
    ReviewFilters, ReviewInput, SectionInput,
};
use crate::services::category_service::CategoryService;
use crate::services::content_service::ContentService;
use crate::services::course_service::CourseService;
use crate::services::review_service::ReviewService;
use crate::utils::error::ApiError;
use crate::utils::response::{self, PageParams};

fn no_content() -> HttpResponse {
    HttpResponse::NoContent().finish()
}

// ============================================================================
// Catégories (lecture PUBLIC, écriture ADMIN)
// ============================================================================

#[get("/categories")]
pub async fn list_categories(
    filters: web::Query<CategoryFilters>,
    page: web::Query<PageParams>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let page = CategoryService::list(&db, &filters, &page).await?;
    Ok(page.into_response())
}

#[get("/categories/{id}")]
pub async fn get_category(
    path: web::Path<Uuid>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let category = CategoryService::get(&db, path.into_inner()).await?;
    Ok(response::ok(category))
}

#[post("/categories")]
pub async fn create_category(
    auth_user: AuthUser,
    body: web::Json<CategoryInput>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    auth_user.require_admin()?;
    let category = CategoryService::create(&db, body.into_inner()).await?;
    Ok(response::created("Category created successfully.", category))
}

async fn save_category(
    auth_user: AuthUser,
    id: Uuid,
    body: CategoryInput,
    db: &DatabaseConnection,
    partial: bool,
) -> Result<HttpResponse, ApiError> {
    auth_user.require_admin()?;
    let category = CategoryService::update(db, id, body, partial).await?;
    Ok(response::ok_with_message("Category updated successfully.", category))
}

#[put("/categories/{id}")]
pub async fn update_category(
    auth_user: AuthUser,
    path: web::Path<Uuid>,
    body: web::Json<CategoryInput>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    save_category(auth_user, path.into_inner(), body.into_inner(), &db, false).await
}

#[patch("/categories/{id}")]
pub async fn partial_update_category(
    auth_user: AuthUser,
    path: web::Path<Uuid>,
    body: web::Json<CategoryInput>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    save_category(auth_user, path.into_inner(), body.into_inner(), &db, true).await
}

#[delete("/categories/{id}")]
pub async fn delete_category(
    auth_user: AuthUser,
    path: web::Path<Uuid>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    auth_user.require_admin()?;
    CategoryService::delete(&db, path.into_inner()).await?;
    Ok(no_content())
}

// ============================================================================
// Cours
// ============================================================================

/// GET /courses - Liste filtrée selon le rôle de l'appelant (PUBLIC)
#[get("/courses")]
pub async fn list_courses(
    auth: MaybeAuthUser,
    filters: web::Query<CourseFilters>,
    page: web::Query<PageParams>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let page = CourseService::list(&db, auth.user(), &filters, &page).await?;
    Ok(page.into_response())
}

/// GET /courses/{id} - Détail complet (PUBLIC, 404 si invisible)
#[get("/courses/{id}")]
pub async fn get_course(
    auth: MaybeAuthUser,
    path: web::Path<Uuid>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let course = CourseService::find_visible(&db, auth.user(), path.into_inner()).await?;
    let detail = CourseService::detail(&db, auth.user(), &course).await?;
    Ok(response::ok(detail))
}

/// POST /courses - Créer un cours en DRAFT (INSTRUCTOR)
#[post("/courses")]
pub async fn create_course(
    auth_user: AuthUser,
    body: web::Json<CourseInput>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    auth_user.require_instructor()?;

    let course = CourseService::create(&db, &auth_user.user, body.into_inner()).await?;
    let detail = CourseService::detail(&db, Some(&auth_user.user), &course).await?;
    Ok(response::created("Course created successfully.", detail))
}

async fn save_course(
    auth_user: AuthUser,
    id: Uuid,
    body: CourseInput,
    db: &DatabaseConnection,
    partial: bool,
) -> Result<HttpResponse, ApiError> {
    let course = CourseService::update(db, &auth_user.user, id, body, partial).await?;
    let detail = CourseService::detail(db, Some(&auth_user.user), &course).await?;
    Ok(response::ok_with_message("Course updated successfully.", detail))
}

/// PUT /courses/{id} (PROPRIÉTAIRE ou ADMIN)
#[put("/courses/{id}")]
pub async fn update_course(
    auth_user: AuthUser,
    path: web::Path<Uuid>,
    body: web::Json<CourseInput>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    save_course(auth_user, path.into_inner(), body.into_inner(), &db, false).await
}

/// PATCH /courses/{id} (PROPRIÉTAIRE ou ADMIN)
#[patch("/courses/{id}")]
pub async fn partial_update_course(
    auth_user: AuthUser,
    path: web::Path<Uuid>,
    body: web::Json<CourseInput>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    save_course(auth_user, path.into_inner(), body.into_inner(), &db, true).await
}

#[delete("/courses/{id}")]
pub async fn delete_course(
    auth_user: AuthUser,
    path: web::Path<Uuid>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    CourseService::delete(&db, &auth_user.user, path.into_inner()).await?;
    Ok(no_content())
}

/// POST /courses/{id}/review - Décision admin
#[post("/courses/{id}/review")]
pub async fn review_course(
    auth_user: AuthUser,
    path: web::Path<Uuid>,
    body: web::Json<CourseReviewRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    auth_user.require_admin()?;

    let course = CourseService::review(&db, &auth_user.user, path.into_inner(), body.into_inner())
        .await?;
    let detail = CourseService::detail(&db, Some(&auth_user.user), &course).await?;

    Ok(response::ok_with_message(
        format!("Course {} successfully.", course.status.as_str().to_lowercase()),
        detail,
    ))
}

/// POST /courses/{id}/submit_for_review - DRAFT -> PENDING (PROPRIÉTAIRE)
#[post("/courses/{id}/submit_for_review")]
pub async fn submit_course_for_review(
    auth_user: AuthUser,
    path: web::Path<Uuid>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    CourseService::submit_for_review(&db, &auth_user.user, path.into_inner()).await?;
    Ok(response::message("Course submitted for review successfully."))
}

/// GET /my-courses - Tous les cours de l'instructeur (INSTRUCTOR)
#[get("/my-courses")]
pub async fn my_courses(
    auth_user: AuthUser,
    page: web::Query<PageParams>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    auth_user.require_instructor()?;
    let page = CourseService::my_courses(&db, &auth_user.user, &page).await?;
    Ok(page.into_response())
}

// ============================================================================
// Sections
// ============================================================================

#[get("/courses/{course_id}/sections")]
pub async fn list_sections(
    auth: MaybeAuthUser,
    path: web::Path<Uuid>,
    page: web::Query<PageParams>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let page = ContentService::list_sections(&db, auth.user(), path.into_inner(), &page).await?;
    Ok(page.into_response())
}

#[get("/courses/{course_id}/sections/{id}")]
pub async fn get_section(
    auth: MaybeAuthUser,
    path: web::Path<(Uuid, Uuid)>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let (course_id, id) = path.into_inner();
    let section = ContentService::get_section(&db, auth.user(), course_id, id).await?;
    Ok(response::ok(section))
}

#[post("/courses/{course_id}/sections")]
pub async fn create_section(
    auth_user: AuthUser,
    path: web::Path<Uuid>,
    body: web::Json<SectionInput>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let section =
        ContentService::create_section(&db, &auth_user.user, path.into_inner(), body.into_inner())
            .await?;
    Ok(response::created("Section created successfully.", section))
}

async fn save_section(
    auth_user: AuthUser,
    (course_id, id): (Uuid, Uuid),
    body: SectionInput,
    db: &DatabaseConnection,
    partial: bool,
) -> Result<HttpResponse, ApiError> {
    let section =
        ContentService::update_section(db, &auth_user.user, course_id, id, body, partial).await?;
    Ok(response::ok_with_message("Section updated successfully.", section))
}

#[put("/courses/{course_id}/sections/{id}")]
pub async fn update_section(
    auth_user: AuthUser,
    path: web::Path<(Uuid, Uuid)>,
    body: web::Json<SectionInput>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    save_section(auth_user, path.into_inner(), body.into_inner(), &db, false).await
}

#[patch("/courses/{course_id}/sections/{id}")]
pub async fn partial_update_section(
    auth_user: AuthUser,
    path: web::Path<(Uuid, Uuid)>,
    body: web::Json<SectionInput>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    save_section(auth_user, path.into_inner(), body.into_inner(), &db, true).await
}

#[delete("/courses/{course_id}/sections/{id}")]
pub async fn delete_section(
    auth_user: AuthUser,
    path: web::Path<(Uuid, Uuid)>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let (course_id, id) = path.into_inner();
    ContentService::delete_section(&db, &auth_user.user, course_id, id).await?;
    Ok(no_content())
}

// ============================================================================
// Leçons
// ============================================================================

#[get("/courses/{course_id}/sections/{section_id}/lessons")]
pub async fn list_lessons(
    auth: MaybeAuthUser,
    path: web::Path<(Uuid, Uuid)>,
    page: web::Query<PageParams>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let (course_id, section_id) = path.into_inner();
    let page = ContentService::list_lessons(&db, auth.user(), course_id, section_id, &page).await?;
    Ok(page.into_response())
}

/// Contenu complet : inscrit, propriétaire, admin, ou leçon en aperçu
#[get("/courses/{course_id}/sections/{section_id}/lessons/{id}")]
pub async fn get_lesson(
    auth: MaybeAuthUser,
    path: web::Path<(Uuid, Uuid, Uuid)>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let (course_id, section_id, id) = path.into_inner();
    let lesson = ContentService::get_lesson(&db, auth.user(), course_id, section_id, id).await?;
    Ok(response::ok(lesson))
}

#[post("/courses/{course_id}/sections/{section_id}/lessons")]
pub async fn create_lesson(
    auth_user: AuthUser,
    path: web::Path<(Uuid, Uuid)>,
    body: web::Json<LessonInput>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let (course_id, section_id) = path.into_inner();
    let lesson = ContentService::create_lesson(
        &db,
        &auth_user.user,
        course_id,
        section_id,
        body.into_inner(),
    )
    .await?;
    Ok(response::created("Lesson created successfully.", lesson))
}

#[put("/courses/{course_id}/sections/{section_id}/lessons/{id}")]
pub async fn update_lesson(
    auth_user: AuthUser,
    path: web::Path<(Uuid, Uuid, Uuid)>,
    body: web::Json<LessonInput>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let lesson =
        ContentService::update_lesson(&db, &auth_user.user, path.into_inner(), body.into_inner(), false)
            .await?;
    Ok(response::ok_with_message("Lesson updated successfully.", lesson))
}

#[patch("/courses/{course_id}/sections/{section_id}/lessons/{id}")]
pub async fn partial_update_lesson(
    auth_user: AuthUser,
    path: web::Path<(Uuid, Uuid, Uuid)>,
    body: web::Json<LessonInput>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let lesson =
        ContentService::update_lesson(&db, &auth_user.user, path.into_inner(), body.into_inner(), true)
            .await?;
    Ok(response::ok_with_message("Lesson updated successfully.", lesson))
}

#[delete("/courses/{course_id}/sections/{section_id}/lessons/{id}")]
pub async fn delete_lesson(
    auth_user: AuthUser,
    path: web::Path<(Uuid, Uuid, Uuid)>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    ContentService::delete_lesson(&db, &auth_user.user, path.into_inner()).await?;
    Ok(no_content())
}

// ============================================================================
// Avis (PROTÉGÉES)
// ============================================================================

#[get("/courses/{course_id}/reviews")]
pub async fn list_reviews(
    auth_user: AuthUser,
    path: web::Path<Uuid>,
    filters: web::Query<ReviewFilters>,
    page: web::Query<PageParams>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let page =
        ReviewService::list(&db, &auth_user.user, path.into_inner(), &filters, &page).await?;
    Ok(page.into_response())
}

#[get("/courses/{course_id}/reviews/{id}")]
pub async fn get_review(
    auth_user: AuthUser,
    path: web::Path<(Uuid, Uuid)>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let (course_id, id) = path.into_inner();
    let review = ReviewService::get(&db, &auth_user.user, course_id, id).await?;
    Ok(response::ok(review))
}

#[post("/courses/{course_id}/reviews")]
pub async fn create_review(
    auth_user: AuthUser,
    path: web::Path<Uuid>,
    body: web::Json<ReviewInput>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let review =
        ReviewService::create(&db, &auth_user.user, path.into_inner(), body.into_inner()).await?;
    Ok(response::created("Review submitted successfully.", review))
}

#[put("/courses/{course_id}/reviews/{id}")]
pub async fn update_review(
    auth_user: AuthUser,
    path: web::Path<(Uuid, Uuid)>,
    body: web::Json<ReviewInput>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let review =
        ReviewService::update(&db, &auth_user.user, path.into_inner(), body.into_inner(), false)
            .await?;
    Ok(response::ok_with_message("Review updated successfully.", review))
}

#[patch("/courses/{course_id}/reviews/{id}")]
pub async fn partial_update_review(
    auth_user: AuthUser,
    path: web::Path<(Uuid, Uuid)>,
    body: web::Json<ReviewInput>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let review =
        ReviewService::update(&db, &auth_user.user, path.into_inner(), body.into_inner(), true)
            .await?;
    Ok(response::ok_with_message("Review updated successfully.", review))
}

#[delete("/courses/{course_id}/reviews/{id}")]
pub async fn delete_review(
    auth_user: AuthUser,
    path: web::Path<(Uuid, Uuid)>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    ReviewService::delete(&db, &auth_user.user, path.into_inner()).await?;
    Ok(no_content())
}

pub fn courses_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/courses")
            // catégories
            .service(list_categories)
            .service(get_category)
            .service(create_category)
            .service(update_category)
            .service(partial_update_category)
            .service(delete_category)
            // cours
            .service(list_courses)
            .service(get_course)
            .service(create_course)
            .service(update_course)
            .service(partial_update_course)
            .service(delete_course)
            .service(review_course)
            .service(submit_course_for_review)
            .service(my_courses)
            // sections
            .service(list_sections)
            .service(get_section)
            .service(create_section)
            .service(update_section)
            .service(partial_update_section)
            .service(delete_section)
            // leçons
            .service(list_lessons)
            .service(get_lesson)
            .service(create_lesson)
            .service(update_lesson)
            .service(partial_update_lesson)
            .service(delete_lesson)
            // avis
            .service(list_reviews)
            .service(get_review)
            .service(create_review)
            .service(update_review)
            .service(partial_update_review)
            .service(delete_review),
    );
}
