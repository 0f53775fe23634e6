pub(crate) mod cards;
pub(crate) mod upload;
pub(crate) mod user_management;

use crate::error::ApiError;
use actix_web::web;

/// Uploads larger than this are refused before parsing
const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Every endpoint plus the extractor configs that turn malformed input into JSON errors
pub(crate) fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _| ApiError::BadRequest(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _| ApiError::BadRequest(err.to_string()).into()),
    )
    .app_data(
        web::PathConfig::default()
            .error_handler(|err, _| ApiError::BadRequest(err.to_string()).into()),
    )
    .app_data(web::PayloadConfig::new(MAX_UPLOAD_BYTES))
    .service(cards::list_cards)
    .service(cards::batch_create_cards)
    .service(cards::create_card)
    .service(cards::get_card)
    .service(cards::put_card)
    .service(cards::delete_card)
    .service(user_management::register)
    .service(user_management::login)
    .service(user_management::get_user)
    .service(upload::validate_upload)
    .service(upload::import_upload)
    .service(upload::upload_template);
}

/// Endpoint table printed at startup
pub(crate) const ENDPOINTS: &[&str] = &[
    "GET    /cards",
    "GET    /cards/{id}",
    "POST   /cards",
    "PUT    /cards/{id}",
    "DELETE /cards/{id}",
    "POST   /cards/batch",
    "POST   /auth/register",
    "POST   /auth/login",
    "GET    /users/{id}",
    "POST   /upload/validate",
    "POST   /upload/import",
    "GET    /upload/template",
];
