// ============================================================================
// ERREURS API
// ============================================================================
//
// Toutes les routes et services retournent Result<_, ApiError>.
// La conversion en réponse HTTP produit l'enveloppe :
//   {"success": false, "error": {"message": "...", "details": ...}}
//
// Les 500 ne révèlent jamais le détail ici : c'est le middleware
// `reveal_internal_errors` qui l'ajoute pour un appelant ADMIN.
//
// ============================================================================

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use sea_orm::DbErr;
use serde_json::json;
use std::collections::BTreeMap;
use thiserror::Error;
use validator::{ValidationErrors, ValidationErrorsKind};

use super::password::PasswordError;

/// Erreurs par champ : champ -> liste de messages
pub type FieldErrors = BTreeMap<String, Vec<String>>;

pub const NON_FIELD_ERRORS: &str = "non_field_errors";
pub const UNEXPECTED_ERROR_MESSAGE: &str = "An unexpected error occurred.";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Validation error: {0:?}")]
    Validation(FieldErrors),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Erreur de validation sur un seul champ
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.to_string(), vec![message.into()]);
        ApiError::Validation(errors)
    }

    /// Erreur de validation globale (non liée à un champ)
    pub fn non_field(message: impl Into<String>) -> Self {
        Self::field(NON_FIELD_ERRORS, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn permission_denied() -> Self {
        ApiError::Forbidden("You do not have permission to perform this action.".to_string())
    }

    pub fn not_authenticated() -> Self {
        ApiError::Unauthorized("Authentication credentials were not provided.".to_string())
    }

    pub fn is_internal(&self) -> bool {
        matches!(self, ApiError::Database(_) | ApiError::Internal(_))
    }

    fn public_message(&self) -> String {
        match self {
            ApiError::Validation(errors) => errors
                .values()
                .flatten()
                .next()
                .cloned()
                .unwrap_or_else(|| "Invalid input.".to_string()),
            ApiError::BadRequest(message)
            | ApiError::Unauthorized(message)
            | ApiError::Forbidden(message)
            | ApiError::NotFound(message) => message.clone(),
            ApiError::Database(_) | ApiError::Internal(_) => UNEXPECTED_ERROR_MESSAGE.to_string(),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.is_internal() {
            log::error!("Unhandled error: {}", self);
        }

        let details = match self {
            ApiError::Validation(errors) => json!(errors),
            _ => serde_json::Value::Null,
        };

        HttpResponse::build(self.status_code()).json(json!({
            "success": false,
            "error": {
                "message": self.public_message(),
                "details": details,
            }
        }))
    }
}

impl From<PasswordError> for ApiError {
    fn from(error: PasswordError) -> Self {
        ApiError::Internal(format!("password hashing failed: {}", error))
    }
}

impl From<jsonwebtoken::errors::Error> for ApiError {
    fn from(error: jsonwebtoken::errors::Error) -> Self {
        ApiError::Internal(format!("token signing failed: {}", error))
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields = FieldErrors::new();
        collect_validation_errors(&errors, "", &mut fields);
        ApiError::Validation(fields)
    }
}

fn collect_validation_errors(errors: &ValidationErrors, prefix: &str, out: &mut FieldErrors) {
    for (field, kind) in errors.errors() {
        let name = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", prefix, field)
        };

        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                let messages = field_errors.iter().map(|error| match &error.message {
                    Some(message) => message.to_string(),
                    None => format!("Invalid value ({}).", error.code),
                });
                out.entry(name).or_default().extend(messages);
            }
            ValidationErrorsKind::Struct(nested) => {
                collect_validation_errors(nested, &name, out);
            }
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    collect_validation_errors(nested, &format!("{}[{}]", name, index), out);
                }
            }
        }
    }
}

/// Ajoute une erreur à un champ (validations manuelles)
pub fn push_error(errors: &mut FieldErrors, field: &str, message: impl Into<String>) {
    errors.entry(field.to_string()).or_default().push(message.into());
}

/// Transforme un ensemble d'erreurs accumulées en résultat
pub fn into_result(errors: FieldErrors) -> Result<(), ApiError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ApiError::Validation(errors))
    }
}
