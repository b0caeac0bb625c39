/*
 * src/controllers/account.rs
 *
 * File for Account Controller API Endpoints
 *
 * Purpose:
 *   Serve Account Related API Requests
 *
 * Include:
 *   api_signup         - POST /api/account/signup -> creates an account
 *   api_login          - POST /api/account/login  -> authenticates and sets auth cookie
 *   api_validate       - POST /api/account/validate -> returns current user (protected by middleware)
 */

use axum::{Extension, Json, http::StatusCode, routing::post};

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use serde::Serialize;
use tower_cookies::{
    Cookie, Cookies,
    cookie::{Key, SameSite, time::Duration},
};
use utoipa::{OpenApi, ToSchema};

use chrono::{Duration as ChronoDuration, Utc};
use sqlx::PgPool;
use tracing::{error, info};

use crate::controllers::AxumRouter;
use crate::error::{ApiResult, AppError, PublicError};
use crate::http_models::account::{LoginRequest, SignupRequest};
use crate::middleware::{AuthUser, auth_middleware};
use crate::swagger::SecurityAddon;

#[derive(Serialize, ToSchema)]
pub struct SignupResponse {
	pub id: i32,
	pub email: String,
}

#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
	pub id: i32,
	pub token: String,
}

#[derive(Serialize, ToSchema)]
pub struct ValidateResponse {
	pub id: i32,
}

#[derive(OpenApi)]
#[openapi(
	paths(api_signup, api_login, api_validate),
	modifiers(&SecurityAddon),
	info(
		title = "Account Routes",
		description = "API endpoints for creating and authenticating accounts."
	),
	tags((name = "Account"))
)]
pub struct AccountApiDoc;

/// Create a new user.
///
/// # Method
/// `POST /api/account/signup`
///
/// # Responses
/// - `201 CREATED` - JSON body `{ "id": i32, "email": string }`
/// - `400 BAD_REQUEST` - Validation failure (public error)
/// - `409 CONFLICT` - Email already exists (public error)
/// - `500 INTERNAL_SERVER_ERROR` - Internal error (private)
#[utoipa::path(
	post,
	path = "/signup",
	request_body = SignupRequest,
	responses(
		(status = 201, description = "Signup successful", body = SignupResponse),
		(status = 400, description = "Validation failure"),
		(status = 409, description = "Email already exists"),
		(status = 500, description = "Internal Server Error"),
	),
	tag = "Account"
)]
pub async fn api_signup(
    Extension(pool): Extension<PgPool>,
    Json(payload): Json<SignupRequest>,
) -> ApiResult<(StatusCode, Json<SignupResponse>)> {
    info!("HANDLER ->> /api/account/signup 'api_signup'");

    if let Err(validation_error) = payload.validate() {
        error!(
            "ERROR ->> /api/account/signup 'api_signup' REASON: Validation failed: {}",
            validation_error
        );
        return Err(PublicError::Validation(validation_error).into());
    }

    let existing = sqlx::query!("SELECT id FROM accounts WHERE email = $1", payload.email)
        .fetch_optional(&pool)
        .await?;

    if existing.is_some() {
        error!(
            "ERROR ->> /api/account/signup 'api_signup' REASON: Email already exists: {}",
            payload.email
        );
        return Err(PublicError::Conflict("email already exists".to_string()).into());
    }

    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(payload.password.as_bytes(), &salt)?
        .to_string();

    let record = sqlx::query!(
        "INSERT INTO accounts (email, first_name, last_name, password)
         VALUES ($1, $2, $3, $4)
         RETURNING id",
        payload.email,
        payload.first_name,
        payload.last_name,
        password_hash
    )
    .fetch_one(&pool)
    .await?;

    info!(
        "INFO ->> /api/account/signup 'api_signup' - Created user with ID: {}",
        record.id
    );

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            id: record.id,
            email: payload.email,
        }),
    ))
}

/// Attempt user login.
///
/// # Method
/// `POST /api/account/login`
///
/// Notes:
/// - Token format is `user-<id>.<exp>.sign`, where `<exp>` is epoch seconds (UTC) ~3 days out.
/// - Cookie name is `auth-token`; in development it uses `SameSite=Lax`, not `Secure`.
#[utoipa::path(
	post,
	path = "/login",
	request_body = LoginRequest,
	responses(
		(status = 200, description = "Login successful", body = LoginResponse),
		(status = 400, description = "Invalid credentials"),
		(status = 500, description = "Internal Server Error"),
	),
	tag = "Account"
)]
pub async fn api_login(
    cookies: Cookies,
    Extension(key): Extension<Key>,
    Extension(pool): Extension<PgPool>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    info!("HANDLER ->> /api/account/login 'api_login'");

    let row = sqlx::query!(
        "SELECT id, email, password FROM accounts WHERE email = $1;",
        payload.email
    )
    .fetch_optional(&pool)
    .await?;

    let Some(row) = row else {
        error!(
            "ERROR ->> /api/account/login 'api_login' REASON: No account for Email: {}",
            payload.email
        );
        return Err(PublicError::BadRequest("invalid credentials".to_string()).into());
    };

    let parsed_hash = PasswordHash::new(&row.password)?;
    if Argon2::default()
        .verify_password(payload.password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Err(PublicError::BadRequest("invalid credentials".to_string()).into());
    }

    let domain = option_env!("DOMAIN").unwrap_or("localhost");
    let app_env = option_env!("APP_ENV").unwrap_or("development");
    let on_production = app_env == "production";

    let exp_epoch = (Utc::now() + ChronoDuration::days(3)).timestamp();
    let token_value = format!("user-{}.{}.sign", row.id, exp_epoch);

    info!(
        "INFO ->> /api/account/login 'api_login' - Generated token for user {}",
        row.id
    );

    let cookie = Cookie::build(("auth-token", token_value.clone()))
        .domain(domain.to_string())
        .path("/")
        .secure(on_production)
        .http_only(true)
        .same_site(if on_production {
            SameSite::None
        } else {
            SameSite::Lax
        })
        .max_age(Duration::days(3))
        .build();

    cookies.private(&key).add(cookie);

    Ok(Json(LoginResponse {
        id: row.id,
        token: token_value,
    }))
}

/// Return the current authenticated user's ID.
///
/// # Method
/// `POST /api/account/validate`
///
/// # Auth
/// Protected by `auth_middleware`, which validates the `auth-token` private
/// cookie, checks expiration, and injects `Extension<AuthUser>`.
#[utoipa::path(
	post,
	path = "/validate",
	responses(
		(status = 200, description = "Authenticated", body = ValidateResponse),
		(status = 401, description = "Unauthorized"),
	),
	security(("set-cookie" = [])),
	tag = "Account"
)]
pub async fn api_validate(Extension(user): Extension<AuthUser>) -> ApiResult<Json<ValidateResponse>> {
    Ok(Json(ValidateResponse { id: user.id }))
}

pub fn account_routes() -> AxumRouter {
    AxumRouter::new()
        .route("/validate", post(api_validate))
        .route_layer(axum::middleware::from_fn(auth_middleware))
        .route("/signup", post(api_signup))
        .route("/login", post(api_login))
}
