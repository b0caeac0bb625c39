use serde::{Deserialize, Serialize};

use super::budget::BudgetResult;
use super::hitl::HITLState;
use super::itinerary::{DraftItinerary, FinalItinerary};
use super::resource::{AccommodationResult, DiningResult, TransportResult};
use super::trip::TripInput;
use super::weather::WeatherReport;

/// The single typed state bag threaded through every orchestration graph
/// node. Nodes return a `Partial<PlannerState>`-shaped update (see
/// [`StateUpdate`]); they never mutate this struct directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerState {
	pub trip: TripInput,
	pub weather: Option<WeatherReport>,
	pub draft_itinerary: Option<DraftItinerary>,
	pub accommodation: Option<AccommodationResult>,
	pub transport: Option<TransportResult>,
	pub dining: Option<DiningResult>,
	pub budget_result: Option<BudgetResult>,
	pub final_itinerary: Option<FinalItinerary>,
	/// Monotonically non-decreasing; incremented iff the budget critic
	/// produces feedback and the graph re-enters the planner.
	pub retry_count: u32,
	pub hitl: HITLState,
	/// Free-form metadata; the reducer shallow-merges this field.
	#[serde(default)]
	pub meta: serde_json::Map<String, serde_json::Value>,
}

impl PlannerState {
	pub fn new(trip: TripInput) -> Self {
		PlannerState {
			trip,
			weather: None,
			draft_itinerary: None,
			accommodation: None,
			transport: None,
			dining: None,
			budget_result: None,
			final_itinerary: None,
			retry_count: 0,
			hitl: HITLState::default(),
			meta: serde_json::Map::new(),
		}
	}
}

/// A sum type of per-field updates: the Rust encoding of "each agent returns
/// a partial of the state". Fan-in is the composition of disjoint field
/// updates; `apply` implements the reducer rule for each field (leaf fields
/// are last-writer-wins, `retry_count` adds, `meta` shallow-merges).
#[derive(Debug, Clone)]
pub enum StateUpdate {
	Weather(WeatherReport),
	DraftItinerary(DraftItinerary),
	Accommodation(AccommodationResult),
	Transport(TransportResult),
	Dining(DiningResult),
	BudgetResult(BudgetResult),
	FinalItinerary(FinalItinerary),
	IncrementRetry,
	Hitl(HITLState),
	MergeMeta(serde_json::Map<String, serde_json::Value>),
}

impl StateUpdate {
	pub fn apply(self, state: &mut PlannerState) {
		match self {
			StateUpdate::Weather(w) => state.weather = Some(w),
			StateUpdate::DraftItinerary(d) => state.draft_itinerary = Some(d),
			StateUpdate::Accommodation(a) => state.accommodation = Some(a),
			StateUpdate::Transport(t) => state.transport = Some(t),
			StateUpdate::Dining(d) => state.dining = Some(d),
			StateUpdate::BudgetResult(b) => state.budget_result = Some(b),
			StateUpdate::FinalItinerary(f) => state.final_itinerary = Some(f),
			StateUpdate::IncrementRetry => state.retry_count += 1,
			StateUpdate::Hitl(h) => state.hitl = h,
			StateUpdate::MergeMeta(m) => state.meta.extend(m),
		}
	}
}

/// Apply a batch of updates as produced by one node (or, for the fan-out
/// step, by several nodes whose updates are known to touch disjoint
/// fields) in any order; the result is independent of application order
/// because every leaf field is written by at most one update in the batch.
pub fn apply_all(state: &mut PlannerState, updates: Vec<StateUpdate>) {
	for update in updates {
		update.apply(state);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn sample_trip() -> TripInput {
		TripInput {
			origin: None,
			destination: "Hangzhou".to_string(),
			start_date: "2025-12-01".to_string(),
			end_date: "2025-12-03".to_string(),
			start_time: None,
			end_time: None,
			budget: 3000,
			traveler_count: 2,
			adult_count: 2,
			child_count: 0,
			preferences: vec![],
			hotel_preferences: vec![],
			notes: vec![],
		}
	}

	#[test]
	fn fan_in_is_order_independent() {
		let accommodation = AccommodationResult {
			recommendations: vec![],
			selected: super::super::resource::HotelRecommendation {
				name: "Test Hotel".into(),
				location: None,
				price_per_night: 100.0,
				tier: super::super::resource::PriceTier::Standard,
				rating: None,
				vendor_poi_id: None,
			},
			total_cost: 300.0,
			centroid: None,
		};
		let transport = TransportResult {
			segments: vec![],
			total_cost: 50.0,
			total_distance_meters: 0.0,
			recommended_modes: vec![],
		};
		let dining = DiningResult {
			recommendations: vec![],
			total_cost: 75.0,
		};

		let mut a = PlannerState::new(sample_trip());
		let mut b = PlannerState::new(sample_trip());

		apply_all(
			&mut a,
			vec![
				StateUpdate::Accommodation(accommodation.clone()),
				StateUpdate::Transport(transport.clone()),
				StateUpdate::Dining(dining.clone()),
			],
		);
		apply_all(
			&mut b,
			vec![
				StateUpdate::Dining(dining),
				StateUpdate::Accommodation(accommodation),
				StateUpdate::Transport(transport),
			],
		);

		assert_eq!(a.accommodation.unwrap().total_cost, b.accommodation.unwrap().total_cost);
		assert_eq!(a.transport.unwrap().total_cost, b.transport.unwrap().total_cost);
		assert_eq!(a.dining.unwrap().total_cost, b.dining.unwrap().total_cost);
	}

	#[test]
	fn retry_count_is_additive() {
		let mut state = PlannerState::new(sample_trip());
		apply_all(&mut state, vec![StateUpdate::IncrementRetry, StateUpdate::IncrementRetry]);
		assert_eq!(state.retry_count, 2);
	}
}
