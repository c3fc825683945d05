use actix_web::{
    Error, HttpResponse,
    body::{EitherBody, MessageBody},
    dev::{ServiceRequest, ServiceResponse},
    http::StatusCode,
    error::{JsonPayloadError, PathError, QueryPayloadError},
    middleware::Next,
    web,
};
use sea_orm::DatabaseConnection;
use serde_json::json;

use super::auth::{authenticate, bearer_token};
use crate::config::AppConfig;
use crate::utils::error::{ApiError, UNEXPECTED_ERROR_MESSAGE};

/// Sur une 500, ajoute le détail de l'erreur dans `error.details`
/// uniquement si l'appelant présente un access token ADMIN valide
pub async fn reveal_internal_errors<B: MessageBody + 'static>(
    req: ServiceRequest,
    next: Next<B>,
) -> Result<ServiceResponse<EitherBody<B>>, Error> {
    // La requête est consommée par `next` : on garde ce qu'il faut avant
    let token = bearer_token(req.request()).ok().flatten();
    let db = req.app_data::<web::Data<DatabaseConnection>>().cloned();
    let config = req.app_data::<web::Data<AppConfig>>().cloned();

    let res = next.call(req).await?;

    if res.status() != StatusCode::INTERNAL_SERVER_ERROR {
        return Ok(res.map_into_left_body());
    }

    let detail = res
        .response()
        .error()
        .and_then(|e| e.as_error::<ApiError>())
        .filter(|e| e.is_internal())
        .map(|e| e.to_string());

    let (Some(detail), Some(token), Some(db), Some(config)) = (detail, token, db, config) else {
        return Ok(res.map_into_left_body());
    };

    let is_admin = authenticate(db.get_ref(), config.get_ref(), &token)
        .await
        .map(|user| user.is_admin())
        .unwrap_or(false);

    if !is_admin {
        return Ok(res.map_into_left_body());
    }

    let (req, _) = res.into_parts();
    let response = HttpResponse::InternalServerError().json(json!({
        "success": false,
        "error": {
            "message": UNEXPECTED_ERROR_MESSAGE,
            "details": detail,
        }
    }));

    Ok(ServiceResponse::new(req, response).map_into_right_body())
}

// Erreurs des extracteurs : corps JSON et query invalides -> 400, id de chemin invalide -> 404

pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err: JsonPayloadError, _req| {
        ApiError::bad_request(format!("Malformed request body: {}", err)).into()
    })
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err: QueryPayloadError, _req| {
        ApiError::bad_request(format!("Invalid query parameters: {}", err)).into()
    })
}

pub fn path_config() -> web::PathConfig {
    web::PathConfig::default()
        .error_handler(|_err: PathError, _req| ApiError::not_found("Not found.").into())
}
