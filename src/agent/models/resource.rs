use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::geo::LatLng;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PriceTier {
	Economy,
	Standard,
	Luxury,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HotelRecommendation {
	pub name: String,
	pub location: Option<LatLng>,
	pub price_per_night: f64,
	pub tier: PriceTier,
	pub rating: Option<f64>,
	pub vendor_poi_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AccommodationResult {
	pub recommendations: Vec<HotelRecommendation>,
	pub selected: HotelRecommendation,
	pub total_cost: f64,
	pub centroid: Option<LatLng>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TransportMode {
	Driving,
	Transit,
	Walking,
	Cycling,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TransportSegment {
	/// 1-based, matching the `DraftDay` this leg belongs to.
	pub day_index: u32,
	pub from: String,
	pub to: String,
	pub mode: TransportMode,
	pub duration_minutes: f64,
	pub distance_meters: f64,
	pub cost: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TransportResult {
	pub segments: Vec<TransportSegment>,
	pub total_cost: f64,
	pub total_distance_meters: f64,
	pub recommended_modes: Vec<TransportMode>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DiningRecommendation {
	pub day_index: u32,
	pub meal_type: super::itinerary::MealType,
	pub name: String,
	pub location: Option<LatLng>,
	pub price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DiningResult {
	pub recommendations: Vec<DiningRecommendation>,
	pub total_cost: f64,
}

/// The disjoint-field outputs of the three resource agents. The
/// orchestration graph's reducer merges these by field name ("last writer
/// wins" per leaf field); the three agents never write the same field, so
/// fan-in order never matters.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind")]
pub enum ResourceResult {
	Accommodation(AccommodationResult),
	Transport(TransportResult),
	Dining(DiningResult),
}
