use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{ToResponse, ToSchema};

use crate::agent::models::itinerary::FinalItinerary;

/// A saved itinerary as returned to the frontend: persistence metadata plus
/// the finalized document the orchestration graph produced.
#[derive(Debug, Serialize, Deserialize, ToSchema, ToResponse)]
pub struct SavedItinerary {
	/// Primary key
	pub id: i32,
	pub start_date: NaiveDate,
	pub end_date: NaiveDate,
	/// Possible associated chat session for easy editing on frontend
	pub chat_session_id: Option<i32>,
	/// Title of itinerary, defaults to include location and date range
	pub title: String,
	pub body: FinalItinerary,
}

/// API route response for GET `/api/itinerary/saved`
#[derive(Debug, Serialize, Deserialize, ToSchema, ToResponse)]
pub struct SavedResponse {
	/// List of saved itineraries for the user.
	pub itineraries: Vec<SavedItinerary>
}

/// Response model from `/api/itinerary/save` endpoint
#[derive(Serialize, ToSchema, ToResponse)]
pub struct SaveResponse {
	/// id of the itinerary that was just saved
	/// * May be the same as the itinerary id passed in the request
	pub id: i32
}
