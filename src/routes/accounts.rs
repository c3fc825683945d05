use actix_web::{HttpResponse, get, patch, post, put, web};
use sea_orm::DatabaseConnection;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::config::AppConfig;
use crate::middleware::AuthUser;
use crate::models::dto::UserResponse;
use crate::models::requests::{
    ChangePasswordRequest, EmailRequest, InstructorRequestCreate, InstructorRequestFilters,
    InstructorRequestReview, LoginRequest, PasswordResetConfirmRequest, ProfileUpdateRequest,
    RefreshRequest, RegisterRequest, UpdateRoleRequest, UserFilters, VerifyEmailRequest,
};
use crate::services::auth_service::AuthService;
use crate::services::instructor_request_service::InstructorRequestService;
use crate::services::mail::EmailDispatcher;
use crate::services::user_admin_service::UserAdminService;
use crate::utils::error::ApiError;
use crate::utils::response::{self, PageParams};

// ============================================================================
// Authentification
// ============================================================================

/// POST /accounts/register - Créer un compte STUDENT (PUBLIC)
#[post("/register")]
pub async fn register(
    body: web::Json<RegisterRequest>,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
    mailer: web::Data<EmailDispatcher>,
) -> Result<HttpResponse, ApiError> {
    let user = AuthService::register(&db, &config, &mailer, body.into_inner()).await?;

    Ok(response::created(
        "Registration successful. Please check your email to verify your account.",
        UserResponse::from(&user),
    ))
}

/// POST /accounts/verify-email - Consommer le token de vérification (PUBLIC)
#[post("/verify-email")]
pub async fn verify_email(
    body: web::Json<VerifyEmailRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    AuthService::verify_email(&db, &body.token).await?;
    Ok(response::message("Email verified successfully. You can now log in."))
}

/// POST /accounts/resend-verification - Renvoyer l'email de vérification (PUBLIC)
#[post("/resend-verification")]
pub async fn resend_verification(
    body: web::Json<EmailRequest>,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
    mailer: web::Data<EmailDispatcher>,
) -> Result<HttpResponse, ApiError> {
    body.validate()?;
    AuthService::resend_verification(&db, &config, &mailer, &body.email).await?;

    // Même réponse que le compte existe ou non
    Ok(response::message(
        "If the account exists and is not verified, a verification email has been sent.",
    ))
}

/// POST /accounts/login - Se connecter (PUBLIC)
#[post("/login")]
pub async fn login(
    body: web::Json<LoginRequest>,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, ApiError> {
    let (user, tokens) = AuthService::login(&db, &config, body.into_inner()).await?;

    Ok(response::ok_with_message(
        "Login successful.",
        json!({
            "user": UserResponse::from(&user),
            "tokens": tokens,
        }),
    ))
}

/// POST /accounts/token/refresh - Nouveau access token (PUBLIC)
#[post("/token/refresh")]
pub async fn refresh_token(
    body: web::Json<RefreshRequest>,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, ApiError> {
    let access = AuthService::refresh(&db, &config, &body.refresh).await?;
    Ok(response::ok(json!({ "access": access })))
}

// ============================================================================
// Mot de passe
// ============================================================================

/// POST /accounts/password/change (PROTÉGÉE)
#[post("/password/change")]
pub async fn change_password(
    auth_user: AuthUser,
    body: web::Json<ChangePasswordRequest>,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, ApiError> {
    AuthService::change_password(&db, &config, &auth_user.user, body.into_inner()).await?;
    Ok(response::message("Password changed successfully."))
}

/// POST /accounts/password/reset - Demander un lien de reset (PUBLIC)
#[post("/password/reset")]
pub async fn password_reset(
    body: web::Json<EmailRequest>,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
    mailer: web::Data<EmailDispatcher>,
) -> Result<HttpResponse, ApiError> {
    body.validate()?;
    AuthService::request_password_reset(&db, &config, &mailer, &body.email).await?;
    Ok(response::message(
        "If the email exists, a password reset link has been sent.",
    ))
}

/// POST /accounts/password/reset/confirm (PUBLIC)
#[post("/password/reset/confirm")]
pub async fn password_reset_confirm(
    body: web::Json<PasswordResetConfirmRequest>,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, ApiError> {
    AuthService::confirm_password_reset(&db, &config, body.into_inner()).await?;
    Ok(response::message(
        "Password reset successfully. You can now log in with your new password.",
    ))
}

// ============================================================================
// Profil
// ============================================================================

/// GET /accounts/profile (PROTÉGÉE)
#[get("/profile")]
pub async fn get_profile(auth_user: AuthUser) -> Result<HttpResponse, ApiError> {
    Ok(response::ok(UserResponse::from(&auth_user.user)))
}

async fn save_profile(
    auth_user: AuthUser,
    body: web::Json<ProfileUpdateRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let user = AuthService::update_profile(&db, &auth_user.user, body.into_inner()).await?;
    Ok(response::ok_with_message(
        "Profile updated successfully.",
        UserResponse::from(&user),
    ))
}

/// PUT /accounts/profile (PROTÉGÉE)
#[put("/profile")]
pub async fn update_profile(
    auth_user: AuthUser,
    body: web::Json<ProfileUpdateRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    save_profile(auth_user, body, db).await
}

/// PATCH /accounts/profile (PROTÉGÉE)
#[patch("/profile")]
pub async fn partial_update_profile(
    auth_user: AuthUser,
    body: web::Json<ProfileUpdateRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    save_profile(auth_user, body, db).await
}

// ============================================================================
// Demandes instructeur
// ============================================================================

/// GET /accounts/instructor-requests - Les siennes, ou toutes pour un admin
#[get("/instructor-requests")]
pub async fn list_instructor_requests(
    auth_user: AuthUser,
    filters: web::Query<InstructorRequestFilters>,
    page: web::Query<PageParams>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let page = InstructorRequestService::list(&db, &auth_user.user, &filters, &page).await?;
    Ok(page.into_response())
}

/// POST /accounts/instructor-requests - Demander le rôle INSTRUCTOR
#[post("/instructor-requests")]
pub async fn create_instructor_request(
    auth_user: AuthUser,
    body: web::Json<InstructorRequestCreate>,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
    mailer: web::Data<EmailDispatcher>,
) -> Result<HttpResponse, ApiError> {
    let request = InstructorRequestService::create(
        &db,
        &config,
        &mailer,
        &auth_user.user,
        body.into_inner(),
    )
    .await?;

    Ok(response::created(
        "Instructor request submitted successfully. You will be notified once reviewed.",
        request,
    ))
}

/// GET /accounts/instructor-requests/{id}
#[get("/instructor-requests/{id}")]
pub async fn get_instructor_request(
    auth_user: AuthUser,
    path: web::Path<Uuid>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let request = InstructorRequestService::get(&db, &auth_user.user, path.into_inner()).await?;
    Ok(response::ok(request))
}

/// POST /accounts/instructor-requests/{id}/review (ADMIN)
#[post("/instructor-requests/{id}/review")]
pub async fn review_instructor_request(
    auth_user: AuthUser,
    path: web::Path<Uuid>,
    body: web::Json<InstructorRequestReview>,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
    mailer: web::Data<EmailDispatcher>,
) -> Result<HttpResponse, ApiError> {
    auth_user.require_admin()?;

    let request = InstructorRequestService::review(
        &db,
        &config,
        &mailer,
        &auth_user.user,
        path.into_inner(),
        body.into_inner(),
    )
    .await?;

    Ok(response::ok_with_message(
        format!("Request {} successfully.", request.status.as_str().to_lowercase()),
        request,
    ))
}

// ============================================================================
// Gestion des utilisateurs (ADMIN)
// ============================================================================

/// GET /accounts/users
#[get("/users")]
pub async fn list_users(
    auth_user: AuthUser,
    filters: web::Query<UserFilters>,
    page: web::Query<PageParams>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    auth_user.require_admin()?;
    let page = UserAdminService::list(&db, &filters, &page).await?;
    Ok(page.into_response())
}

/// GET /accounts/users/{id}
#[get("/users/{id}")]
pub async fn get_user(
    auth_user: AuthUser,
    path: web::Path<Uuid>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    auth_user.require_admin()?;
    let user = UserAdminService::get(&db, path.into_inner()).await?;
    Ok(response::ok(UserResponse::from(&user)))
}

/// PATCH /accounts/users/{id}/update_role
#[patch("/users/{id}/update_role")]
pub async fn update_user_role(
    auth_user: AuthUser,
    path: web::Path<Uuid>,
    body: web::Json<UpdateRoleRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    auth_user.require_admin()?;
    let user = UserAdminService::update_role(&db, path.into_inner(), body.role).await?;

    Ok(response::ok_with_message(
        format!("User role updated to {}.", user.role),
        UserResponse::from(&user),
    ))
}

/// POST /accounts/users/{id}/deactivate
#[post("/users/{id}/deactivate")]
pub async fn deactivate_user(
    auth_user: AuthUser,
    path: web::Path<Uuid>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    auth_user.require_admin()?;
    UserAdminService::deactivate(&db, path.into_inner()).await?;
    Ok(response::message("User account deactivated successfully."))
}

/// POST /accounts/users/{id}/activate
#[post("/users/{id}/activate")]
pub async fn activate_user(
    auth_user: AuthUser,
    path: web::Path<Uuid>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    auth_user.require_admin()?;
    UserAdminService::activate(&db, path.into_inner()).await?;
    Ok(response::message("User account activated successfully."))
}

pub fn accounts_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/accounts")
            .service(register)
            .service(verify_email)
            .service(resend_verification)
            .service(login)
            .service(refresh_token)
            .service(change_password)
            .service(password_reset)
            .service(password_reset_confirm)
            .service(get_profile)
            .service(update_profile)
            .service(partial_update_profile)
            .service(list_instructor_requests)
            .service(create_instructor_request)
            .service(get_instructor_request)
            .service(review_instructor_request)
            .service(list_users)
            .service(get_user)
            .service(update_user_role)
            .service(deactivate_user)
            .service(activate_user),
    );
}
