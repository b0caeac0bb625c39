use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use chrono::NaiveDateTime;

#[derive(Serialize, Deserialize, FromRow)]
pub struct MessageRow {
	pub id: i32,
	pub chat_session_id: i32,
	pub itinerary_id: Option<i32>,
	pub is_user: bool,
	pub timestamp: NaiveDateTime,
	pub text: String
}

/// Row model for the `chat_sessions` table, as returned by listing queries.
#[derive(Serialize, Deserialize, FromRow)]
pub struct ChatSessionRow {
	pub id: i32,
	pub title: String,
}
