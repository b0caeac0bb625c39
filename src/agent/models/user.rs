/*
 * src/agent/models/user.rs
 *
 * Trip-form state backing the chat core's prepare_trip_form /
 * confirm_and_generate_trip tools.
 */

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TripFormState {
	pub destination: Option<String>,
	pub start_date: Option<String>,
	pub end_date: Option<String>,
	pub budget: Option<i64>,
	pub travelers: Option<u32>,
	#[serde(default)]
	pub preferences: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormValidation {
	pub is_valid: bool,
	pub missing_required: Vec<String>,
	pub missing_optional: Vec<String>,
}

impl TripFormState {
	/// Required = {destination, start_date, end_date, budget, travelers}.
	/// Additionally invalid if end_date < start_date.
	pub fn validate(&self) -> FormValidation {
		let mut missing_required = Vec::new();
		if self.destination.is_none() {
			missing_required.push("destination".to_string());
		}
		if self.start_date.is_none() {
			missing_required.push("start_date".to_string());
		}
		if self.end_date.is_none() {
			missing_required.push("end_date".to_string());
		}
		if self.budget.is_none() {
			missing_required.push("budget".to_string());
		}
		if self.travelers.is_none() {
			missing_required.push("travelers".to_string());
		}

		let mut is_valid = missing_required.is_empty();

		if let (Some(start), Some(end)) = (&self.start_date, &self.end_date) {
			let fmt = "%Y-%m-%d";
			if let (Ok(start), Ok(end)) = (
				chrono::NaiveDate::parse_from_str(start, fmt),
				chrono::NaiveDate::parse_from_str(end, fmt),
			) {
				if end < start {
					is_valid = false;
				}
			}
		}

		let missing_optional = if self.preferences.is_empty() {
			vec!["preferences".to_string()]
		} else {
			vec![]
		};

		FormValidation {
			is_valid,
			missing_required,
			missing_optional,
		}
	}
}
