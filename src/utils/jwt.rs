use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::JwtConfig;
use crate::models::users;

/// Type de token : access (requêtes) ou refresh (renouvellement)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid, // user_id
    pub email: String,
    pub role: String,
    pub token_type: TokenType,
    pub iat: i64,
    pub exp: i64, // expiration timestamp
    pub jti: String,
}

/// Paire renvoyée au login
#[derive(Debug, Serialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Génère un JWT pour un utilisateur
pub fn generate_token(
    user: &users::Model,
    token_type: TokenType,
    config: &JwtConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let ttl = match token_type {
        TokenType::Access => config.access_ttl,
        TokenType::Refresh => config.refresh_ttl,
    };

    let claims = Claims {
        sub: user.id,
        email: user.email.clone(),
        role: user.role.to_string(),
        token_type,
        iat: now.timestamp(),
        exp: (now + ttl).timestamp(),
        jti: Uuid::new_v4().simple().to_string(),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
}

/// Génère la paire access + refresh
pub fn generate_token_pair(
    user: &users::Model,
    config: &JwtConfig,
) -> Result<TokenPair, jsonwebtoken::errors::Error> {
    Ok(TokenPair {
        access: generate_token(user, TokenType::Access, config)?,
        refresh: generate_token(user, TokenType::Refresh, config)?,
    })
}

/// Vérifie et décode un JWT du type attendu
pub fn verify_token(
    token: &str,
    expected: TokenType,
    config: &JwtConfig,
) -> Result<Claims, String> {
    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map(|data| data.claims)
    .map_err(|e| format!("Invalid token: {}", e))?;

    if claims.token_type != expected {
        return Err("Invalid token: wrong token type".to_string());
    }

    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::UserRole;
    use chrono::Duration;

    fn test_config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret".to_string(),
            access_ttl: Duration::minutes(5),
            refresh_ttl: Duration::days(1),
        }
    }

    fn test_user() -> users::Model {
        let now = Utc::now();
        users::Model {
            id: Uuid::new_v4(),
            email: "alice@example.com".to_string(),
            password_hash: String::new(),
            first_name: "Alice".to_string(),
            last_name: "Martin".to_string(),
            role: UserRole::Instructor,
            is_active: true,
            is_staff: false,
            email_verified: true,
            bio: String::new(),
            profile_picture: None,
            phone_number: String::new(),
            date_joined: now,
            last_login: None,
            updated_at: now,
        }
    }

    #[test]
    fn test_generate_and_verify_token() {
        let config = test_config();
        let user = test_user();

        let token = generate_token(&user, TokenType::Access, &config).unwrap();
        let claims = verify_token(&token, TokenType::Access, &config).unwrap();

        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.email, user.email);
        assert_eq!(claims.role, "INSTRUCTOR");
    }

    #[test]
    fn test_refresh_token_rejected_as_access() {
        let config = test_config();
        let pair = generate_token_pair(&test_user(), &config).unwrap();

        assert!(verify_token(&pair.refresh, TokenType::Access, &config).is_err());
        assert!(verify_token(&pair.refresh, TokenType::Refresh, &config).is_ok());
        assert!(verify_token(&pair.access, TokenType::Refresh, &config).is_err());
    }

    #[test]
    fn test_wrong_secret() {
        let config = test_config();
        let token = generate_token(&test_user(), TokenType::Access, &config).unwrap();

        let other = JwtConfig {
            secret: "another-secret".to_string(),
            ..test_config()
        };
        assert!(verify_token(&token, TokenType::Access, &other).is_err());
    }

    #[test]
    fn test_invalid_token() {
        let result = verify_token("invalid.token.here", TokenType::Access, &test_config());
        assert!(result.is_err());
    }
}
