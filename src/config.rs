// ============================================================================
// CONFIGURATION
// ============================================================================
//
// Description:
//   Lit la configuration de l'application depuis les variables d'environnement
//   (chargées au préalable depuis `.env` par dotenv dans les binaires).
//
// Points d'attention:
//   - DATABASE_URL est obligatoire
//   - Toute valeur numérique invalide est une erreur de configuration
//   - Sans EMAIL_API_URL, les emails sont seulement loggés (LogMailer)
//
// ============================================================================

use chrono::Duration;
use std::env;
use std::time::Duration as StdDuration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("Invalid {name} value: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Paramètres des tokens JWT (access + refresh)
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

/// Paramètres de l'envoi d'emails
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub api_url: Option<String>,
    pub api_key: String,
    pub from_email: String,
    pub from_name: String,
    pub max_retries: u32,
    pub retry_backoff: StdDuration,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_address: String,
    pub database_url: String,
    pub jwt: JwtConfig,
    pub password_hash_iterations: u32,
    pub email_verification_ttl: Duration,
    pub password_reset_ttl: Duration,
    pub frontend_url: String,
    pub site_name: String,
    pub cors_origins: Vec<String>,
    pub mail: MailConfig,
}

impl AppConfig {
    /// Configuration par défaut pour une base donnée (utilisée par les tests et le seed)
    pub fn with_defaults(database_url: impl Into<String>) -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
            database_url: database_url.into(),
            jwt: JwtConfig {
                secret: "dev-insecure-jwt-secret-change-me".to_string(),
                access_ttl: Duration::minutes(60),
                refresh_ttl: Duration::days(7),
            },
            password_hash_iterations: 600_000,
            email_verification_ttl: Duration::hours(24),
            password_reset_ttl: Duration::hours(1),
            frontend_url: "http://localhost:3000".to_string(),
            site_name: "Learning Platform".to_string(),
            cors_origins: vec!["http://localhost:3000".to_string()],
            mail: MailConfig {
                api_url: None,
                api_key: String::new(),
                from_email: "noreply@learning-platform.local".to_string(),
                from_name: "Learning Platform".to_string(),
                max_retries: 3,
                retry_backoff: StdDuration::from_secs(60),
            },
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url =
            env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;

        let mut config = Self::with_defaults(database_url);

        if let Ok(bind_address) = env::var("BIND_ADDRESS") {
            config.bind_address = bind_address;
        }

        match env::var("JWT_SECRET") {
            Ok(secret) if !secret.is_empty() => config.jwt.secret = secret,
            _ => log::warn!("JWT_SECRET not set, using the insecure development secret"),
        }

        config.jwt.access_ttl = Duration::minutes(parse_var("JWT_ACCESS_TTL_MINUTES", 60)?);
        config.jwt.refresh_ttl = Duration::days(parse_var("JWT_REFRESH_TTL_DAYS", 7)?);
        config.password_hash_iterations = parse_var("PASSWORD_HASH_ITERATIONS", 600_000)?;
        config.email_verification_ttl =
            Duration::hours(parse_var("EMAIL_VERIFICATION_TTL_HOURS", 24)?);
        config.password_reset_ttl = Duration::hours(parse_var("PASSWORD_RESET_TTL_HOURS", 1)?);

        if let Ok(frontend_url) = env::var("FRONTEND_URL") {
            config.frontend_url = frontend_url.trim_end_matches('/').to_string();
        }
        if let Ok(site_name) = env::var("SITE_NAME") {
            config.site_name = site_name;
        }
        if let Ok(origins) = env::var("CORS_ORIGINS") {
            config.cors_origins = origins
                .split(',')
                .map(|origin| origin.trim().to_string())
                .filter(|origin| !origin.is_empty())
                .collect();
        }

        // Emails
        config.mail.api_url = env::var("EMAIL_API_URL").ok().filter(|url| !url.is_empty());
        config.mail.api_key = env::var("EMAIL_API_KEY").unwrap_or_default();
        if let Ok(from_email) = env::var("EMAIL_FROM") {
            config.mail.from_email = from_email;
        }
        if let Ok(from_name) = env::var("EMAIL_FROM_NAME") {
            config.mail.from_name = from_name;
        }
        config.mail.max_retries = parse_var("EMAIL_MAX_RETRIES", 3)?;
        config.mail.retry_backoff =
            StdDuration::from_secs(parse_var("EMAIL_RETRY_BACKOFF_SECONDS", 60)?);

        Ok(config)
    }
}

/// Lit une variable numérique, avec valeur par défaut si absente
fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::with_defaults("sqlite::memory:");

        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.jwt.access_ttl, Duration::minutes(60));
        assert_eq!(config.jwt.refresh_ttl, Duration::days(7));
        assert_eq!(config.email_verification_ttl, Duration::hours(24));
        assert_eq!(config.password_reset_ttl, Duration::hours(1));
        assert_eq!(config.mail.max_retries, 3);
        assert!(config.mail.api_url.is_none());
    }

    #[test]
    fn test_parse_var_missing_uses_default() {
        let value: u32 = parse_var("LEARNING_PLATFORM_SURELY_UNSET_VAR", 42).unwrap();
        assert_eq!(value, 42);
    }
}
