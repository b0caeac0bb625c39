use axum::{
	Json,
	http::StatusCode,
	response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;
use tracing::error;

pub type ApiResult<T> = std::result::Result<T, AppError>;

/// Errors safe to describe to the caller verbatim. Converts into the
/// matching [`AppError`] variant; kept as a separate type so handlers can
/// talk about "this is a public error" without reaching for the full enum.
#[derive(Debug)]
pub enum PublicError {
	BadRequest(String),
	Validation(String),
	Conflict(String),
	NotFound,
	Unauthorized,
}

/// Errors that must never reach the caller: logged at `error!`, then
/// collapsed to an opaque 500 by [`AppError`]'s `IntoResponse` impl.
#[derive(Debug)]
pub enum PrivateError {
	Db(sqlx::Error),
	PasswordHash(argon2::password_hash::Error),
	Internal(String),
}

/// Crate-wide error type returned by every HTTP handler.
///
/// Tool and agent-internal failures (`UpstreamUnavailable`, `ParseFailure`)
/// never surface here; they're absorbed inside `agent::` and turned into
/// degraded-but-well-formed values (spec's error handling design). `AppError`
/// only fronts the HTTP boundary: account/chat-session/itinerary CRUD and
/// the handlers that front the orchestration graph and chat core.
#[derive(Debug)]
pub enum AppError {
	BadRequest(String),
	Validation(String),
	Conflict(String),
	NotFound,
	Unauthorized,
	Internal(String),
	Db(sqlx::Error),
	PasswordHash(argon2::password_hash::Error),
}

impl From<PublicError> for AppError {
	fn from(value: PublicError) -> Self {
		match value {
			PublicError::BadRequest(msg) => AppError::BadRequest(msg),
			PublicError::Validation(msg) => AppError::Validation(msg),
			PublicError::Conflict(msg) => AppError::Conflict(msg),
			PublicError::NotFound => AppError::NotFound,
			PublicError::Unauthorized => AppError::Unauthorized,
		}
	}
}

impl From<PrivateError> for AppError {
	fn from(value: PrivateError) -> Self {
		match value {
			PrivateError::Db(e) => AppError::Db(e),
			PrivateError::PasswordHash(e) => AppError::PasswordHash(e),
			PrivateError::Internal(msg) => AppError::Internal(msg),
		}
	}
}

impl From<sqlx::Error> for AppError {
	fn from(value: sqlx::Error) -> Self {
		match value {
			sqlx::Error::RowNotFound => AppError::NotFound,
			other => AppError::Db(other),
		}
	}
}

impl From<argon2::password_hash::Error> for AppError {
	fn from(value: argon2::password_hash::Error) -> Self {
		AppError::PasswordHash(value)
	}
}

#[derive(Serialize)]
struct ErrorBody {
	error: String,
}

impl AppError {
	/// Public accessor for the HTTP status this error maps to; used by
	/// handler-level tests that call controllers directly.
	pub fn status_code(&self) -> StatusCode {
		self.status()
	}

	fn status(&self) -> StatusCode {
		match self {
			AppError::BadRequest(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
			AppError::Conflict(_) => StatusCode::CONFLICT,
			AppError::NotFound => StatusCode::NOT_FOUND,
			AppError::Unauthorized => StatusCode::UNAUTHORIZED,
			AppError::Internal(_) | AppError::Db(_) | AppError::PasswordHash(_) => {
				StatusCode::INTERNAL_SERVER_ERROR
			}
		}
	}

	fn public_message(&self) -> String {
		match self {
			AppError::BadRequest(msg) | AppError::Validation(msg) | AppError::Conflict(msg) => {
				msg.clone()
			}
			AppError::NotFound => "not found".to_string(),
			AppError::Unauthorized => "unauthorized".to_string(),
			AppError::Internal(_) | AppError::Db(_) | AppError::PasswordHash(_) => {
				"internal server error".to_string()
			}
		}
	}
}

impl IntoResponse for AppError {
	fn into_response(self) -> Response {
		if matches!(self, AppError::Internal(_) | AppError::Db(_) | AppError::PasswordHash(_)) {
			error!(target: "app_error", "{:?}", self);
		}
		let status = self.status();
		let body = Json(json!(ErrorBody { error: self.public_message() }));
		(status, body).into_response()
	}
}
