use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::geo::LatLng;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MealType {
	Breakfast,
	Lunch,
	Dinner,
	Snack,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AttractionSlot {
	/// "HH:MM"
	pub start_time: String,
	pub name: String,
	/// Minutes
	pub duration_minutes: u32,
	#[serde(default)]
	pub attraction_type: Option<String>,
	#[serde(default)]
	pub location: Option<LatLng>,
	/// Carried over from the enrichment pass; `None` when the attraction was
	/// never priced (e.g. added later by a HITL modification).
	#[serde(default)]
	pub ticket_price: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MealSlot {
	/// "HH:MM"
	pub time: String,
	pub meal_type: MealType,
	#[serde(default)]
	pub cuisine: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DraftDay {
	/// 1-based, contiguous within a DraftItinerary
	pub day_index: u32,
	/// ISO date
	pub date: String,
	pub attractions: Vec<AttractionSlot>,
	pub meals: Vec<MealSlot>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, ToSchema)]
pub struct DraftItinerary {
	pub days: Vec<DraftDay>,
	pub total_attraction_count: u32,
	pub total_meal_count: u32,
	pub estimated_attraction_cost: f64,
}

impl DraftItinerary {
	/// Renumber day indices to a contiguous 1-based sequence, matching the
	/// invariant that every insertion/removal renumbers days.
	pub fn renumber(&mut self) {
		for (i, day) in self.days.iter_mut().enumerate() {
			day.day_index = (i + 1) as u32;
		}
		self.total_attraction_count = self.days.iter().map(|d| d.attractions.len() as u32).sum();
		self.total_meal_count = self.days.iter().map(|d| d.meals.len() as u32).sum();
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EnrichedAttraction {
	pub name: String,
	pub location: Option<LatLng>,
	pub address: Option<String>,
	pub ticket_price: Option<f64>,
	pub opening_hours: Option<String>,
	pub rating: Option<f64>,
	#[serde(default)]
	pub photos: Vec<String>,
	pub tel: Option<String>,
	pub description: Option<String>,
	pub recommended_duration_minutes: Option<u32>,
	pub tips: Option<String>,
	#[serde(default)]
	pub tags: Vec<String>,
	pub vendor_poi_id: Option<String>,
	pub category: Option<String>,
}

// --- Final, persisted itinerary -------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FinalActivity {
	pub time: String,
	pub name: String,
	pub activity_type: String,
	pub location: Option<LatLng>,
	pub duration: String,
	pub description: String,
	pub ticket_price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FinalMeal {
	pub time: String,
	pub meal_type: MealType,
	pub name: String,
	pub price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FinalDay {
	pub day_index: u32,
	pub date: String,
	pub activities: Vec<FinalActivity>,
	pub meals: Vec<FinalMeal>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FinalAccommodation {
	pub name: String,
	pub location: Option<LatLng>,
	pub price_per_night: f64,
	pub nights: i64,
	pub total_cost: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FinalTransportation {
	pub to_destination: String,
	pub from_destination: String,
	pub local_methods: Vec<String>,
	pub estimated_local_cost: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, ToSchema)]
pub struct CostBreakdown {
	pub attractions: f64,
	pub accommodation: f64,
	pub transport: f64,
	pub dining: f64,
	/// ~5% reserve added by the finalizer
	pub other: f64,
	pub total: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FinalItinerary {
	pub destination: String,
	pub days: Vec<FinalDay>,
	pub accommodation: Vec<FinalAccommodation>,
	pub transportation: FinalTransportation,
	pub cost: CostBreakdown,
	pub summary: String,
}
