// ============================================================================
// SERVICE COMPTES : inscription, vérification email, login, mots de passe
// ============================================================================
//
// Points d'attention:
//   - L'inscription crée toujours un STUDENT non vérifié
//   - La demande de reset ne révèle jamais si l'email existe
//   - Les emails partent en arrière-plan (EmailDispatcher), jamais bloquants
//
// ============================================================================

use chrono::Utc;
use sea_orm::*;
use uuid::Uuid;
use validator::Validate;

use crate::config::AppConfig;
use crate::models::requests::{
    ChangePasswordRequest, LoginRequest, PasswordResetConfirmRequest, ProfileUpdateRequest,
    RegisterRequest,
};
use crate::models::users::{self, Entity as Users, UserRole};
use crate::services::mail::{EmailDispatcher, EmailVerificationEmail, PasswordResetEmail};
use crate::services::token_service::TokenService;
use crate::utils::error::{ApiError, FieldErrors, into_result, push_error};
use crate::utils::jwt::{self, TokenPair, TokenType};
use crate::utils::password;

pub struct AuthService;

/// Met le domaine de l'email en minuscules (la partie locale est conservée)
pub fn normalize_email(email: &str) -> String {
    let email = email.trim();
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{}@{}", local, domain.to_lowercase()),
        None => email.to_string(),
    }
}

/// Vérifie confirmation + robustesse d'un nouveau mot de passe
fn check_new_password(
    errors: &mut FieldErrors,
    field: &str,
    password: &str,
    confirm: &str,
    mismatch_message: &str,
) {
    if password != confirm {
        push_error(errors, field, mismatch_message);
    }
    if let Err(messages) = password::validate_password_strength(password) {
        for message in messages {
            push_error(errors, field, message);
        }
    }
}

impl AuthService {
    pub async fn find_by_email(
        db: &DatabaseConnection,
        email: &str,
    ) -> Result<Option<users::Model>, DbErr> {
        Users::find()
            .filter(users::Column::Email.eq(normalize_email(email)))
            .one(db)
            .await
    }

    /// Crée un compte STUDENT non vérifié et envoie l'email de vérification
    pub async fn register(
        db: &DatabaseConnection,
        config: &AppConfig,
        mailer: &EmailDispatcher,
        input: RegisterRequest,
    ) -> Result<users::Model, ApiError> {
        // 1. Validation des champs
        let mut errors = match input.validate() {
            Ok(()) => FieldErrors::new(),
            Err(e) => match ApiError::from(e) {
                ApiError::Validation(fields) => fields,
                other => return Err(other),
            },
        };

        let email = normalize_email(&input.email);
        if Self::find_by_email(db, &email).await?.is_some() {
            push_error(&mut errors, "email", "user with this email already exists.");
        }

        check_new_password(
            &mut errors,
            "password",
            &input.password,
            &input.password_confirm,
            "Password fields didn't match.",
        );
        into_result(errors)?;

        // 2. Hash du mot de passe
        let password_hash = password::hash_password(&input.password, config.password_hash_iterations)?;

        // 3. User + token dans la même transaction
        let now = Utc::now();
        let txn = db.begin().await?;

        let user = users::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(email),
            password_hash: Set(password_hash),
            first_name: Set(input.first_name.trim().to_string()),
            last_name: Set(input.last_name.trim().to_string()),
            role: Set(UserRole::Student),
            is_active: Set(true),
            is_staff: Set(false),
            email_verified: Set(false),
            bio: Set(String::new()),
            profile_picture: Set(None),
            phone_number: Set(String::new()),
            date_joined: Set(now),
            last_login: Set(None),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        let token =
            TokenService::issue_email_verification(&txn, user.id, config.email_verification_ttl)
                .await?;

        txn.commit().await?;

        log::info!("New user registered: {}", user.email);

        // 4. Email de vérification (arrière-plan)
        Self::send_verification_email(config, mailer, &user, &token.token);

        Ok(user)
    }

    fn send_verification_email(
        config: &AppConfig,
        mailer: &EmailDispatcher,
        user: &users::Model,
        token: &str,
    ) {
        let email = EmailVerificationEmail {
            user_name: display_name(user),
            site_name: config.site_name.clone(),
            site_url: config.frontend_url.clone(),
            verification_url: format!("{}/verify-email?token={}", config.frontend_url, token),
            expiry_hours: config.email_verification_ttl.num_hours(),
        };
        mailer.dispatch(&user.email, &email);
    }

    /// Consomme un token de vérification (supprimé après usage)
    pub async fn verify_email(db: &DatabaseConnection, token: &str) -> Result<users::Model, ApiError> {
        let verification = TokenService::find_email_verification(db, token)
            .await?
            .ok_or_else(|| ApiError::bad_request("Invalid verification token."))?;

        if verification.is_expired() {
            return Err(ApiError::bad_request("Verification token has expired."));
        }

        let txn = db.begin().await?;

        let user = Users::find_by_id(verification.user_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ApiError::bad_request("Invalid verification token."))?;

        let mut active: users::ActiveModel = user.into();
        active.email_verified = Set(true);
        active.updated_at = Set(Utc::now());
        let user = active.update(&txn).await?;

        verification.delete(&txn).await?;
        txn.commit().await?;

        log::info!("Email verified for user {}", user.email);
        Ok(user)
    }

    /// Renvoie un email de vérification si le compte existe et n'est pas vérifié
    pub async fn resend_verification(
        db: &DatabaseConnection,
        config: &AppConfig,
        mailer: &EmailDispatcher,
        email: &str,
    ) -> Result<(), ApiError> {
        let Some(user) = Self::find_by_email(db, email).await? else {
            return Ok(());
        };

        if !user.is_active || user.email_verified {
            return Ok(());
        }

        let txn = db.begin().await?;
        let token =
            TokenService::issue_email_verification(&txn, user.id, config.email_verification_ttl)
                .await?;
        txn.commit().await?;

        Self::send_verification_email(config, mailer, &user, &token.token);
        Ok(())
    }

    /// Vérifie les identifiants et retourne le user + la paire de JWT
    pub async fn login(
        db: &DatabaseConnection,
        config: &AppConfig,
        input: LoginRequest,
    ) -> Result<(users::Model, TokenPair), ApiError> {
        input.validate()?;

        // 1. Le compte existe, est vérifié et actif
        let user = Self::find_by_email(db, &input.email)
            .await?
            .ok_or_else(|| ApiError::field("email", "No account found with this email address."))?;

        if !user.email_verified {
            return Err(ApiError::field(
                "email",
                "Please verify your email address before logging in.",
            ));
        }

        if !user.is_active {
            return Err(ApiError::field("email", "This account has been deactivated."));
        }

        // 2. Mot de passe
        if !password::verify_password(&input.password, &user.password_hash)? {
            return Err(ApiError::field("password", "Incorrect password."));
        }

        // 3. Dernière connexion
        let mut active: users::ActiveModel = user.into();
        active.last_login = Set(Some(Utc::now()));
        let user = active.update(db).await?;

        let tokens = jwt::generate_token_pair(&user, &config.jwt)?;
        Ok((user, tokens))
    }

    /// Échange un refresh token valide contre un nouvel access token
    pub async fn refresh(
        db: &DatabaseConnection,
        config: &AppConfig,
        refresh_token: &str,
    ) -> Result<String, ApiError> {
        let invalid = || ApiError::Unauthorized("Token is invalid or expired".to_string());

        let claims = jwt::verify_token(refresh_token, TokenType::Refresh, &config.jwt)
            .map_err(|_| invalid())?;

        let user = Users::find_by_id(claims.sub)
            .one(db)
            .await?
            .filter(|user| user.is_active)
            .ok_or_else(invalid)?;

        Ok(jwt::generate_token(&user, TokenType::Access, &config.jwt)?)
    }

    pub async fn change_password(
        db: &DatabaseConnection,
        config: &AppConfig,
        user: &users::Model,
        input: ChangePasswordRequest,
    ) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();

        if !password::verify_password(&input.old_password, &user.password_hash)? {
            push_error(&mut errors, "old_password", "Old password is incorrect.");
        }

        check_new_password(
            &mut errors,
            "new_password",
            &input.new_password,
            &input.new_password_confirm,
            "New password fields didn't match.",
        );
        into_result(errors)?;

        let password_hash =
            password::hash_password(&input.new_password, config.password_hash_iterations)?;

        let mut active: users::ActiveModel = user.clone().into();
        active.password_hash = Set(password_hash);
        active.updated_at = Set(Utc::now());
        active.update(db).await?;

        log::info!("Password changed for user {}", user.email);
        Ok(())
    }

    /// Émet un token de reset si un compte actif existe, sans jamais le révéler
    pub async fn request_password_reset(
        db: &DatabaseConnection,
        config: &AppConfig,
        mailer: &EmailDispatcher,
        email: &str,
    ) -> Result<(), ApiError> {
        let Some(user) = Self::find_by_email(db, email).await?.filter(|u| u.is_active) else {
            return Ok(());
        };

        let txn = db.begin().await?;
        let token =
            TokenService::issue_password_reset(&txn, user.id, config.password_reset_ttl).await?;
        txn.commit().await?;

        let email = PasswordResetEmail {
            user_name: display_name(&user),
            site_name: config.site_name.clone(),
            site_url: config.frontend_url.clone(),
            reset_url: format!("{}/reset-password?token={}", config.frontend_url, token.token),
            expiry_hours: config.password_reset_ttl.num_hours(),
        };
        mailer.dispatch(&user.email, &email);

        Ok(())
    }

    /// Consomme un token de reset (marqué used) et change le mot de passe
    pub async fn confirm_password_reset(
        db: &DatabaseConnection,
        config: &AppConfig,
        input: PasswordResetConfirmRequest,
    ) -> Result<users::Model, ApiError> {
        // 1. Validation du nouveau mot de passe
        let mut errors = FieldErrors::new();
        check_new_password(
            &mut errors,
            "new_password",
            &input.new_password,
            &input.new_password_confirm,
            "Password fields didn't match.",
        );
        into_result(errors)?;

        // 2. Token existant, non expiré, non utilisé
        let reset = TokenService::find_password_reset(db, &input.token)
            .await?
            .ok_or_else(|| ApiError::bad_request("Invalid password reset token."))?;

        if reset.is_expired() {
            return Err(ApiError::bad_request("Password reset token has expired."));
        }

        let password_hash =
            password::hash_password(&input.new_password, config.password_hash_iterations)?;

        // 3. Nouveau mot de passe + token consommé
        let txn = db.begin().await?;

        let user = Users::find_by_id(reset.user_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ApiError::bad_request("Invalid password reset token."))?;

        let mut active: users::ActiveModel = user.into();
        active.password_hash = Set(password_hash);
        active.updated_at = Set(Utc::now());
        let user = active.update(&txn).await?;

        let mut reset: crate::models::password_reset_tokens::ActiveModel = reset.into();
        reset.used = Set(true);
        reset.update(&txn).await?;

        txn.commit().await?;

        log::info!("Password reset for user {}", user.email);
        Ok(user)
    }

    pub async fn update_profile(
        db: &DatabaseConnection,
        user: &users::Model,
        input: ProfileUpdateRequest,
    ) -> Result<users::Model, ApiError> {
        input.validate()?;

        let mut active: users::ActiveModel = user.clone().into();
        if let Some(first_name) = input.first_name {
            active.first_name = Set(first_name);
        }
        if let Some(last_name) = input.last_name {
            active.last_name = Set(last_name);
        }
        if let Some(bio) = input.bio {
            active.bio = Set(bio);
        }
        if let Some(profile_picture) = input.profile_picture {
            active.profile_picture = Set(Some(profile_picture).filter(|url| !url.is_empty()));
        }
        if let Some(phone_number) = input.phone_number {
            active.phone_number = Set(phone_number);
        }
        active.updated_at = Set(Utc::now());

        Ok(active.update(db).await?)
    }
}

/// Nom affiché dans les emails (email si le nom est vide)
pub fn display_name(user: &users::Model) -> String {
    let name = user.full_name();
    if name.is_empty() {
        user.email.clone()
    } else {
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email_lowercases_domain_only() {
        assert_eq!(normalize_email(" Alice@Example.COM "), "Alice@example.com");
        assert_eq!(normalize_email("no-at-sign"), "no-at-sign");
    }

    #[test]
    fn test_check_new_password_collects_all_problems() {
        let mut errors = FieldErrors::new();
        check_new_password(&mut errors, "password", "1234", "4321", "Password fields didn't match.");

        let messages = &errors["password"];
        assert!(messages.contains(&"Password fields didn't match.".to_string()));
        assert!(messages.len() >= 2);
    }

    #[test]
    fn test_check_new_password_accepts_good_password() {
        let mut errors = FieldErrors::new();
        check_new_password(
            &mut errors,
            "password",
            "correct-horse-battery",
            "correct-horse-battery",
            "Password fields didn't match.",
        );
        assert!(errors.is_empty());
    }
}
