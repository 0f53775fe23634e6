use crate::{
    db::MockStore,
    error::ApiError,
    models::User,
};
use actix_web::{get, post, web};
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Placeholder credential handed to every client, never checked
pub(crate) const MOCK_TOKEN: &str = "mock-jwt-token";

#[derive(Debug, Serialize)]
pub(crate) struct AuthResponse {
    token: &'static str,
    user: User,
}

impl AuthResponse {
    fn new(user: User) -> Self {
        Self {
            token: MOCK_TOKEN,
            user,
        }
    }
}

/// The post body for registering. `password` may be sent but is ignored.
#[derive(Debug, Deserialize)]
pub(crate) struct RegisterForm {
    #[serde(default)]
    email: String,
    name: Option<String>,
}

/// The post body for logging in
#[derive(Debug, Deserialize)]
pub(crate) struct LoginForm {
    #[serde(default)]
    email: String,
}

// blank is rejected, anything else is stored and matched byte for byte
fn required_email(email: &str) -> Result<&str, ApiError> {
    if email.trim().is_empty() {
        Err(ApiError::BadRequest("Email is required".to_string()))
    } else {
        Ok(email)
    }
}

#[post("/auth/register")]
pub(crate) async fn register(
    store: web::Data<MockStore>,
    form: web::Json<RegisterForm>,
) -> Result<web::Json<AuthResponse>, ApiError> {
    let email = required_email(&form.email)?;
    let name = form
        .name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| email.split('@').next().unwrap_or(email));
    match store.register(email, name)? {
        Some(user) => {
            log::info!("Registered user {}", user.id);
            Ok(web::Json(AuthResponse::new(user)))
        }
        None => Err(ApiError::Conflict(format!(
            "A user with email {email} already exists"
        ))),
    }
}

/// Login-or-create: an unknown email gets a fresh user
#[post("/auth/login")]
pub(crate) async fn login(
    store: web::Data<MockStore>,
    form: web::Json<LoginForm>,
) -> Result<web::Json<AuthResponse>, ApiError> {
    let email = required_email(&form.email)?;
    let user = store.login(email)?;
    Ok(web::Json(AuthResponse::new(user)))
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserIdPath {
    user_id: String,
}

#[get("/users/{user_id}")]
pub(crate) async fn get_user(
    store: web::Data<MockStore>,
    path: web::Path<UserIdPath>,
) -> Result<web::Json<User>, ApiError> {
    let UserIdPath { user_id } = path.into_inner();
    store
        .get_user(&user_id, Utc::now())
        .map(web::Json)
        .ok_or(ApiError::NotFound("User not found"))
}
