/*
 * src/controllers/itinerary.rs
 *
 * File for Itinerary Controller API Endpoints
 *
 * Purpose:
 *   Serve Itinerary Related API Requests
 *
 * Include:
 *   api_saved_itineraries  - GET /api/itinerary/saved   -> returns user's saved itineraries
 *   api_get_itinerary      - GET /api/itinerary/{id}    -> returns a single saved itinerary
 *   api_save_itinerary     - POST /api/itinerary/save/{id} -> marks an itinerary as saved
 */

use axum::{Extension, Json, extract::Path, routing::{get, post}};
use sqlx::PgPool;
use tracing::info;
use utoipa::OpenApi;

use crate::agent::models::itinerary::FinalItinerary;
use crate::controllers::AxumRouter;
use crate::error::{ApiResult, AppError};
use crate::http_models::itinerary::{SaveResponse, SavedItinerary, SavedResponse};
use crate::middleware::{AuthUser, auth_middleware};
use crate::sql_models::itinerary::ItineraryRow;
use crate::swagger::SecurityAddon;

#[derive(OpenApi)]
#[openapi(
	paths(api_saved_itineraries, api_get_itinerary, api_save_itinerary),
	modifiers(&SecurityAddon),
	security(("set-cookie" = [])),
	info(
		title = "Itinerary Routes",
		description = "API endpoints for fetching and saving generated itineraries."
	),
	tags((name = "Itinerary"))
)]
pub struct ItineraryApiDoc;

fn row_into_saved(row: ItineraryRow) -> ApiResult<SavedItinerary> {
	let body: FinalItinerary = serde_json::from_value(row.body)
		.map_err(|e| AppError::Internal(format!("corrupt itinerary body: {e}")))?;
	Ok(SavedItinerary {
		id: row.id,
		start_date: row.start_date,
		end_date: row.end_date,
		chat_session_id: row.chat_session_id,
		title: row.title,
		body,
	})
}

/// Get all saved itineraries for the authenticated user.
///
/// # Method
/// `GET /api/itinerary/saved`
///
/// # Auth
/// Protected by `auth_middleware` which validates the `auth-token` private cookie,
/// checks expiration, and injects `Extension<AuthUser>`.
#[utoipa::path(
	get,
	path = "/saved",
	summary = "Fetch the user's saved itineraries",
	responses(
		(status = 200, description = "Saved itineraries retrieved successfully", body = SavedResponse, content_type = "application/json"),
		(status = 401, description = "User has an invalid cookie/no cookie"),
		(status = 500, description = "Internal Server Error")
	),
	security(("set-cookie" = [])),
	tag = "Itinerary"
)]
pub async fn api_saved_itineraries(
	Extension(user): Extension<AuthUser>,
	Extension(pool): Extension<PgPool>,
) -> ApiResult<Json<SavedResponse>> {
	info!(
		"HANDLER ->> /api/itinerary/saved 'api_saved_itineraries' - User ID: {}",
		user.id
	);

	let rows = sqlx::query_as!(
		ItineraryRow,
		r#"SELECT id, account_id, start_date, end_date, chat_session_id, title, body
		   FROM itineraries WHERE account_id = $1 AND saved = TRUE"#,
		user.id
	)
	.fetch_all(&pool)
	.await?;

	let itineraries = rows.into_iter().map(row_into_saved).collect::<ApiResult<Vec<_>>>()?;

	Ok(Json(SavedResponse { itineraries }))
}

/// Get a single itinerary by id, owned by the authenticated user.
///
/// # Method
/// `GET /api/itinerary/{id}`
#[utoipa::path(
	get,
	path = "/{id}",
	summary = "Fetch a single itinerary",
	params(("id" = i32, Path, description = "Itinerary id")),
	responses(
		(status = 200, description = "Itinerary retrieved successfully", body = SavedItinerary, content_type = "application/json"),
		(status = 401, description = "User has an invalid cookie/no cookie"),
		(status = 404, description = "Itinerary not found for this user"),
		(status = 500, description = "Internal Server Error")
	),
	security(("set-cookie" = [])),
	tag = "Itinerary"
)]
pub async fn api_get_itinerary(
	Extension(user): Extension<AuthUser>,
	Extension(pool): Extension<PgPool>,
	Path(id): Path<i32>,
) -> ApiResult<Json<SavedItinerary>> {
	let row = sqlx::query_as!(
		ItineraryRow,
		r#"SELECT id, account_id, start_date, end_date, chat_session_id, title, body
		   FROM itineraries WHERE id = $1 AND account_id = $2"#,
		id,
		user.id
	)
	.fetch_optional(&pool)
	.await?
	.ok_or(AppError::NotFound)?;

	Ok(Json(row_into_saved(row)?))
}

/// Mark an itinerary as saved (persisted beyond the originating chat session).
///
/// # Method
/// `POST /api/itinerary/save/{id}`
#[utoipa::path(
	post,
	path = "/save/{id}",
	summary = "Mark an itinerary as saved",
	params(("id" = i32, Path, description = "Itinerary id")),
	responses(
		(status = 200, description = "Itinerary saved successfully", body = SaveResponse, content_type = "application/json"),
		(status = 401, description = "User has an invalid cookie/no cookie"),
		(status = 404, description = "Itinerary not found for this user"),
		(status = 500, description = "Internal Server Error")
	),
	security(("set-cookie" = [])),
	tag = "Itinerary"
)]
pub async fn api_save_itinerary(
	Extension(user): Extension<AuthUser>,
	Extension(pool): Extension<PgPool>,
	Path(id): Path<i32>,
) -> ApiResult<Json<SaveResponse>> {
	let record = sqlx::query!(
		"UPDATE itineraries SET saved = TRUE WHERE id = $1 AND account_id = $2 RETURNING id",
		id,
		user.id
	)
	.fetch_optional(&pool)
	.await?
	.ok_or(AppError::NotFound)?;

	Ok(Json(SaveResponse { id: record.id }))
}

/// Create the itinerary routes with authentication middleware.
///
/// # Routes
/// - `GET /saved`       - Get user's saved itineraries (protected)
/// - `GET /{id}`        - Get a single itinerary (protected)
/// - `POST /save/{id}`  - Mark an itinerary as saved (protected)
pub fn itinerary_routes() -> AxumRouter {
	AxumRouter::new()
		.route("/saved", get(api_saved_itineraries))
		.route("/{id}", get(api_get_itinerary))
		.route("/save/{id}", post(api_save_itinerary))
		.route_layer(axum::middleware::from_fn(auth_middleware))
}
