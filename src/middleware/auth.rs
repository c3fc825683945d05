use actix_web::{FromRequest, HttpRequest, dev::Payload, http::header, web};
use futures::future::LocalBoxFuture;
use sea_orm::{DatabaseConnection, EntityTrait};

use crate::config::AppConfig;
use crate::models::users::{self, Entity as Users};
use crate::utils::error::ApiError;
use crate::utils::jwt::{self, TokenType};

/// Utilisateur authentifié (access token valide + compte actif)
/// Utilisé comme extracteur dans les routes protégées
///
/// L'utilisateur est rechargé depuis la BD à chaque requête : un changement
/// de rôle ou une désactivation prend effet immédiatement.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: users::Model,
}

impl AuthUser {
    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.user.is_admin() {
            Ok(())
        } else {
            Err(ApiError::permission_denied())
        }
    }

    pub fn require_instructor(&self) -> Result<(), ApiError> {
        if self.user.is_instructor() {
            Ok(())
        } else {
            Err(ApiError::permission_denied())
        }
    }
}

/// Variante pour les routes publiques : None si aucun header Authorization
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<AuthUser>);

impl MaybeAuthUser {
    pub fn user(&self) -> Option<&users::Model> {
        self.0.as_ref().map(|auth| &auth.user)
    }
}

/// Extrait le token du header "Authorization: Bearer <token>"
/// Ok(None) si le header est absent
pub fn bearer_token(req: &HttpRequest) -> Result<Option<String>, ApiError> {
    let Some(auth_header) = req.headers().get(header::AUTHORIZATION) else {
        return Ok(None);
    };

    let auth_str = auth_header
        .to_str()
        .map_err(|_| ApiError::Unauthorized("Invalid Authorization header".to_string()))?;

    match auth_str.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(Some(token.trim().to_string())),
        _ => Err(ApiError::Unauthorized(
            "Invalid Authorization format (expected: Bearer <token>)".to_string(),
        )),
    }
}

/// Vérifie un access token et recharge l'utilisateur
pub async fn authenticate(
    db: &DatabaseConnection,
    config: &AppConfig,
    token: &str,
) -> Result<users::Model, ApiError> {
    let claims = jwt::verify_token(token, TokenType::Access, &config.jwt)
        .map_err(|_| ApiError::Unauthorized("Given token not valid for any token type".to_string()))?;

    let user = Users::find_by_id(claims.sub)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("User not found".to_string()))?;

    if !user.is_active {
        return Err(ApiError::Unauthorized("User is inactive".to_string()));
    }

    Ok(user)
}

type AppHandles = (web::Data<DatabaseConnection>, web::Data<AppConfig>);

fn app_handles(req: &HttpRequest) -> Result<AppHandles, ApiError> {
    let db = req
        .app_data::<web::Data<DatabaseConnection>>()
        .cloned()
        .ok_or_else(|| ApiError::Internal("database connection not configured".to_string()))?;
    let config = req
        .app_data::<web::Data<AppConfig>>()
        .cloned()
        .ok_or_else(|| ApiError::Internal("application config not configured".to_string()))?;
    Ok((db, config))
}

impl FromRequest for AuthUser {
    type Error = ApiError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        // 1. Extraire le token (header obligatoire)
        let token = bearer_token(req);
        // 2. Récupérer la BD et la config
        let handles = app_handles(req);

        Box::pin(async move {
            let token = token?.ok_or_else(ApiError::not_authenticated)?;
            let (db, config) = handles?;

            // 3. Vérifier le JWT et recharger l'utilisateur
            let user = authenticate(db.get_ref(), config.get_ref(), &token).await?;
            Ok(AuthUser { user })
        })
    }
}

impl FromRequest for MaybeAuthUser {
    type Error = ApiError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let token = bearer_token(req);
        let handles = app_handles(req);

        Box::pin(async move {
            let Some(token) = token? else {
                return Ok(MaybeAuthUser(None));
            };
            let (db, config) = handles?;

            let user = authenticate(db.get_ref(), config.get_ref(), &token).await?;
            Ok(MaybeAuthUser(Some(AuthUser { user })))
        })
    }
}
