use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use super::itinerary::FinalItinerary;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
	Add,
	Remove,
	Modify,
	Reorder,
}

/// The supported `prepare_itinerary_modification` operations. `split_day`,
/// `merge_days`, and `regenerate_trip_segment` are named in the tool
/// surface but rejected at runtime (see `ModificationOperation::parse`);
/// they aren't represented here.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ModificationOperation {
	AddAttraction,
	RemoveAttraction,
	ReorderAttraction,
	UpdateAttraction,
	ChangeTime,
	AddDay,
	RemoveDay,
	ChangeHotel,
	ChangeRestaurant,
	OptimizeRoute,
	ReplanDay,
	AdjustForWeather,
}

impl ModificationOperation {
	/// Declared in the tool surface, rejected at runtime: future work.
	pub const REJECTED: [&'static str; 3] = ["split_day", "merge_days", "regenerate_trip_segment"];

	pub fn parse(raw: &str) -> Result<Self, String> {
		if Self::REJECTED.contains(&raw) {
			return Err(format!("operation `{raw}` is declared but not supported"));
		}
		serde_json::from_value(Value::String(raw.to_string())).map_err(|_| format!("unknown operation `{raw}`"))
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ModificationChange {
	pub kind: ChangeKind,
	pub day_index: u32,
	/// "attraction" | "meal" | "day" | "hotel" | "restaurant"
	pub item_kind: String,
	pub description: String,
	pub before: Option<Value>,
	pub after: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ModificationImpact {
	pub affected_days: Vec<u32>,
	pub cost_delta: f64,
	pub time_impact: String,
	#[serde(default)]
	pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ModificationStatus {
	Pending,
	Confirmed,
	Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ModificationPreview {
	pub id: String,
	pub trip_id: String,
	pub operation: String,
	pub before_summary: String,
	pub after_summary: String,
	pub changes: Vec<ModificationChange>,
	pub impact: ModificationImpact,
	pub created_at: DateTime<Utc>,
	pub expires_at: DateTime<Utc>,
	pub status: ModificationStatus,
}

impl ModificationPreview {
	pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
		now >= self.expires_at
	}

	/// `pending -> {confirmed, cancelled}` are the only legal transitions;
	/// both are terminal.
	pub fn transition(&mut self, to: ModificationStatus) -> Result<(), String> {
		if self.status != ModificationStatus::Pending {
			return Err(format!("cannot transition from terminal status {:?}", self.status));
		}
		self.status = to;
		Ok(())
	}
}

/// A user-requested time tweak applied at confirm time: moves the named
/// activity on `day_index` to `new_time` ("HH:MM") without re-running the
/// modification that produced the preview.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TimeAdjustment {
	pub day_index: u32,
	pub activity_name: String,
	pub new_time: String,
}

/// What's actually cached server-side: the preview shown to the user plus
/// the already-computed after-state it was derived from, so confirm never
/// has to recompute.
#[derive(Debug, Clone)]
pub struct CachedModification {
	pub preview: ModificationPreview,
	pub after: FinalItinerary,
}
