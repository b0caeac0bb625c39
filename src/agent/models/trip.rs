use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::user::TripFormState;

/// Immutable input for a single orchestration run.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TripInput {
	pub origin: Option<String>,
	pub destination: String,
	/// ISO date, e.g. "2025-12-01"
	pub start_date: String,
	/// ISO date, e.g. "2025-12-03"
	pub end_date: String,
	pub start_time: Option<String>,
	pub end_time: Option<String>,
	/// Positive integer, local currency
	pub budget: i64,
	pub traveler_count: u32,
	pub adult_count: u32,
	pub child_count: u32,
	#[serde(default)]
	pub preferences: Vec<String>,
	#[serde(default)]
	pub hotel_preferences: Vec<String>,
	#[serde(default)]
	pub notes: Vec<String>,
}

impl TripInput {
	/// Number of nights implied by start/end date, used by the accommodation
	/// agent's price-tier formula. Falls back to 1 if dates don't parse.
	pub fn nights(&self) -> i64 {
		let fmt = "%Y-%m-%d";
		match (
			chrono::NaiveDate::parse_from_str(&self.start_date, fmt),
			chrono::NaiveDate::parse_from_str(&self.end_date, fmt),
		) {
			(Ok(start), Ok(end)) => (end - start).num_days().max(1),
			_ => 1,
		}
	}

	pub fn day_count(&self) -> i64 {
		self.nights() + 1
	}
}

impl TryFrom<TripFormState> for TripInput {
	type Error = String;

	/// Only called after `TripFormState::validate` reports `is_valid`, so
	/// the required fields are assumed present; this still returns `Err`
	/// defensively rather than panicking if a caller skips that check.
	fn try_from(form: TripFormState) -> Result<Self, Self::Error> {
		Ok(TripInput {
			origin: None,
			destination: form.destination.ok_or("missing destination")?,
			start_date: form.start_date.ok_or("missing start_date")?,
			end_date: form.end_date.ok_or("missing end_date")?,
			start_time: None,
			end_time: None,
			budget: form.budget.ok_or("missing budget")?,
			traveler_count: form.travelers.ok_or("missing travelers")?,
			adult_count: form.travelers.ok_or("missing travelers")?,
			child_count: 0,
			preferences: form.preferences,
			hotel_preferences: Vec::new(),
			notes: Vec::new(),
		})
	}
}
