// ============================================================================
// TOKENS À USAGE UNIQUE (vérification email, reset password)
// ============================================================================
//
// Émettre un nouveau token supprime d'abord les tokens en cours du même type
// pour ce user. Les appels sont faits dans la transaction de l'appelant.
//
// ============================================================================

use chrono::{Duration, Utc};
use sea_orm::*;
use uuid::Uuid;

use crate::models::{email_verification_tokens, password_reset_tokens};
use crate::utils::tokens::generate_url_token;

pub struct TokenService;

impl TokenService {
    /// Remplace les tokens de vérification du user par un nouveau
    pub async fn issue_email_verification<C: ConnectionTrait>(
        conn: &C,
        user_id: Uuid,
        ttl: Duration,
    ) -> Result<email_verification_tokens::Model, DbErr> {
        // 1. Invalider les anciens tokens
        email_verification_tokens::Entity::delete_many()
            .filter(email_verification_tokens::Column::UserId.eq(user_id))
            .exec(conn)
            .await?;

        // 2. Créer le nouveau
        let now = Utc::now();
        email_verification_tokens::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            token: Set(generate_url_token()),
            created_at: Set(now),
            expires_at: Set(now + ttl),
        }
        .insert(conn)
        .await
    }

    /// Remplace les tokens de reset non utilisés du user par un nouveau
    pub async fn issue_password_reset<C: ConnectionTrait>(
        conn: &C,
        user_id: Uuid,
        ttl: Duration,
    ) -> Result<password_reset_tokens::Model, DbErr> {
        password_reset_tokens::Entity::delete_many()
            .filter(password_reset_tokens::Column::UserId.eq(user_id))
            .filter(password_reset_tokens::Column::Used.eq(false))
            .exec(conn)
            .await?;

        let now = Utc::now();
        password_reset_tokens::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            token: Set(generate_url_token()),
            created_at: Set(now),
            expires_at: Set(now + ttl),
            used: Set(false),
        }
        .insert(conn)
        .await
    }

    pub async fn find_email_verification<C: ConnectionTrait>(
        conn: &C,
        token: &str,
    ) -> Result<Option<email_verification_tokens::Model>, DbErr> {
        email_verification_tokens::Entity::find()
            .filter(email_verification_tokens::Column::Token.eq(token))
            .one(conn)
            .await
    }

    pub async fn find_password_reset<C: ConnectionTrait>(
        conn: &C,
        token: &str,
    ) -> Result<Option<password_reset_tokens::Model>, DbErr> {
        password_reset_tokens::Entity::find()
            .filter(password_reset_tokens::Column::Token.eq(token))
            .one(conn)
            .await
    }
}
