use base64::{Engine, engine::general_purpose::STANDARD};
use hmac::Hmac;
use pbkdf2::pbkdf2;
use rand::Rng;
use rand::distributions::Alphanumeric;
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "pbkdf2_sha256";
const SALT_LENGTH: usize = 22;
const KEY_LENGTH: usize = 32;
pub const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("Invalid hash format")]
    InvalidFormat,

    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Invalid iterations")]
    InvalidIterations,

    #[error("Failed to decode hash: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("PBKDF2 failure")]
    Pbkdf2,
}

/// Hash un mot de passe au format Django : pbkdf2_sha256$iterations$salt$hash
/// PBKDF2-HMAC-SHA256, salt alphanumérique de 22 caractères, hash en base64 standard
pub fn hash_password(password: &str, iterations: u32) -> Result<String, PasswordError> {
    let salt: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SALT_LENGTH)
        .map(char::from)
        .collect();

    let key = derive_key(password, salt.as_bytes(), iterations, KEY_LENGTH)?;

    Ok(format!(
        "{}${}${}${}",
        ALGORITHM,
        iterations,
        salt,
        STANDARD.encode(key)
    ))
}

/// Vérifie un mot de passe contre un hash Django
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, PasswordError> {
    // Format: algorithme$iterations$salt$hash
    let parts: Vec<&str> = stored_hash.splitn(4, '$').collect();
    if parts.len() != 4 {
        return Err(PasswordError::InvalidFormat);
    }

    if parts[0] != ALGORITHM {
        return Err(PasswordError::UnsupportedAlgorithm(parts[0].to_string()));
    }

    let iterations = parts[1]
        .parse::<u32>()
        .map_err(|_| PasswordError::InvalidIterations)?;
    let expected = STANDARD.decode(parts[3])?;

    let computed = derive_key(password, parts[2].as_bytes(), iterations, expected.len())?;

    Ok(constant_time_eq(&computed, &expected))
}

/// Règles de robustesse : longueur minimale et pas uniquement numérique
pub fn validate_password_strength(password: &str) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if password.chars().count() < MIN_PASSWORD_LENGTH {
        errors.push(format!(
            "This password is too short. It must contain at least {} characters.",
            MIN_PASSWORD_LENGTH
        ));
    }

    if !password.is_empty() && password.chars().all(|c| c.is_ascii_digit()) {
        errors.push("This password is entirely numeric.".to_string());
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

fn derive_key(
    password: &str,
    salt: &[u8],
    iterations: u32,
    length: usize,
) -> Result<Vec<u8>, PasswordError> {
    if iterations == 0 {
        return Err(PasswordError::InvalidIterations);
    }

    let mut key = vec![0u8; length];
    pbkdf2::<HmacSha256>(password.as_bytes(), salt, iterations, &mut key)
        .map_err(|_| PasswordError::Pbkdf2)?;
    Ok(key)
}

// Comparaison en temps constant (évite les timing attacks)
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("correct horse", 1_000).unwrap();

        assert!(hash.starts_with("pbkdf2_sha256$1000$"));
        assert!(verify_password("correct horse", &hash).unwrap());
        assert!(!verify_password("wrong horse", &hash).unwrap());
    }

    #[test]
    fn test_salts_differ() {
        let first = hash_password("same-password", 1_000).unwrap();
        let second = hash_password("same-password", 1_000).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_verify_hash_built_by_hand() {
        // Même format que le PBKDF2PasswordHasher de Django
        let salt = "abcdefghijklmnopqrstuv";
        let key = derive_key("secret123", salt.as_bytes(), 1_000, KEY_LENGTH).unwrap();
        let stored = format!("pbkdf2_sha256$1000${}${}", salt, STANDARD.encode(key));

        assert!(verify_password("secret123", &stored).unwrap());
    }

    #[test]
    fn test_invalid_hash_format() {
        assert!(matches!(
            verify_password("x", "pbkdf2:sha256:1000$salt$hash"),
            Err(PasswordError::InvalidFormat)
        ));
        assert!(matches!(
            verify_password("x", "argon2$1$salt$hash"),
            Err(PasswordError::UnsupportedAlgorithm(_))
        ));
    }

    #[test]
    fn test_password_strength() {
        assert!(validate_password_strength("longenough1").is_ok());

        let errors = validate_password_strength("short").unwrap_err();
        assert_eq!(errors.len(), 1);

        let errors = validate_password_strength("12345678").unwrap_err();
        assert_eq!(errors, vec!["This password is entirely numeric.".to_string()]);

        let errors = validate_password_strength("1234").unwrap_err();
        assert_eq!(errors.len(), 2);
    }
}
