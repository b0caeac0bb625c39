/*
 * src/agent/agents/transport.rs
 *
 * Transport agent: chooses a mode per leg from its distance and prices it.
 * Mode selection is a straight length rule; short walkable hops and long
 * intercity hops both skip the map adapter's route call since the formula
 * is cheap and doesn't need live traffic data.
 *
 * Segments are built per day: hotel -> first attraction, attraction ->
 * attraction in itinerary order, last attraction -> hotel. The "hotel"
 * anchor is the same attraction centroid the accommodation agent searches
 * around; the real selected hotel is written by a concurrently-running
 * agent this one has no dependency on (see DESIGN.md).
 */

use langchain_rust::language_models::llm::LLM;

use crate::agent::map_adapter::MapAdapter;
use crate::agent::models::geo::{haversine_meters, LatLng};
use crate::agent::models::resource::{TransportMode, TransportResult, TransportSegment};

use super::llm::invoke_json;

const PROMPT_TEMPLATE: &str = include_str!("../prompts/transport.md");
const HOTEL_LABEL: &str = "Hotel";

/// One day's ordered attraction waypoints, named for the segment labels.
pub struct DayWaypoints {
	pub day_index: u32,
	pub attractions: Vec<(String, LatLng)>,
}

fn mode_for_distance_km(km: f64) -> Vec<TransportMode> {
	if km < 1.0 {
		vec![TransportMode::Walking]
	} else if km < 5.0 {
		vec![TransportMode::Cycling]
	} else if km < 15.0 {
		vec![TransportMode::Transit, TransportMode::Driving]
	} else {
		vec![TransportMode::Driving, TransportMode::Transit]
	}
}

fn cost_for_mode(mode: TransportMode, km: f64) -> f64 {
	match mode {
		TransportMode::Walking => 0.0,
		TransportMode::Cycling => {
			if km <= 5.0 {
				1.5
			} else {
				5.0
			}
		}
		TransportMode::Transit => (km / 5.0 * 2.0).min(10.0),
		TransportMode::Driving => {
			if km <= 3.0 {
				13.0
			} else {
				13.0 + (km - 3.0) * 2.5
			}
		}
	}
}

#[derive(serde::Deserialize)]
struct LlmModePreference {
	prefer: String,
}

/// Asks, once per run, which of transit/driving should lead when a leg's
/// distance leaves both as plausible candidates. `None` if the LLM is
/// absent or its answer doesn't parse into one of the two modes.
async fn llm_mode_preference(llm: &dyn LLM) -> Option<TransportMode> {
	let parsed = invoke_json::<LlmModePreference>(llm, PROMPT_TEMPLATE).await?;
	match parsed.prefer.to_lowercase().as_str() {
		"transit" => Some(TransportMode::Transit),
		"driving" => Some(TransportMode::Driving),
		_ => None,
	}
}

pub async fn run(llm: &dyn LLM, map_adapter: &MapAdapter, hotel: LatLng, days: &[DayWaypoints], travelers: u32) -> TransportResult {
	let mut segments = Vec::new();
	let mut total_cost = 0.0;
	let mut total_distance = 0.0;
	let mut recommended_modes = Vec::new();
	let mode_preference = llm_mode_preference(llm).await;

	for day in days {
		if day.attractions.is_empty() {
			continue;
		}

		let mut waypoints = Vec::with_capacity(day.attractions.len() + 2);
		waypoints.push((HOTEL_LABEL.to_string(), hotel));
		waypoints.extend(day.attractions.iter().cloned());
		waypoints.push((HOTEL_LABEL.to_string(), hotel));

		for pair in waypoints.windows(2) {
			let (from_name, from_point) = &pair[0];
			let (to_name, to_point) = &pair[1];

			let distance_meters = haversine_meters(*from_point, *to_point);
			let km = distance_meters / 1000.0;
			let modes = mode_for_distance_km(km);
			let primary_mode = match mode_preference {
				Some(preferred) if modes.contains(&preferred) => preferred,
				_ => modes[0],
			};

			let leg = map_adapter.distance(*from_point, *to_point, mode_label(primary_mode)).await;
			let duration_minutes = leg.map(|l| l.duration_minutes).unwrap_or(km / 20.0 * 60.0);
			let cost = cost_for_mode(primary_mode, km);

			segments.push(TransportSegment {
				day_index: day.day_index,
				from: from_name.clone(),
				to: to_name.clone(),
				mode: primary_mode,
				duration_minutes,
				distance_meters,
				cost,
			});

			total_cost += cost;
			total_distance += distance_meters;
			if !recommended_modes.contains(&primary_mode) {
				recommended_modes.push(primary_mode);
			}
		}
	}

	TransportResult {
		segments,
		total_cost: total_cost * travelers.max(1) as f64,
		total_distance_meters: total_distance,
		recommended_modes,
	}
}

fn mode_label(mode: TransportMode) -> &'static str {
	match mode {
		TransportMode::Driving => "driving",
		TransportMode::Transit => "transit",
		TransportMode::Walking => "walking",
		TransportMode::Cycling => "bicycling",
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn short_hops_select_walking() {
		assert_eq!(mode_for_distance_km(0.5), vec![TransportMode::Walking]);
	}

	#[test]
	fn mid_hops_select_cycling() {
		assert_eq!(mode_for_distance_km(3.0), vec![TransportMode::Cycling]);
	}

	#[test]
	fn long_hops_prefer_transit_then_driving() {
		assert_eq!(mode_for_distance_km(10.0), vec![TransportMode::Transit, TransportMode::Driving]);
	}

	#[test]
	fn very_long_hops_prefer_driving_then_transit() {
		assert_eq!(mode_for_distance_km(20.0), vec![TransportMode::Driving, TransportMode::Transit]);
	}

	#[test]
	fn driving_cost_charges_beyond_three_km() {
		assert_eq!(cost_for_mode(TransportMode::Driving, 3.0), 13.0);
		assert_eq!(cost_for_mode(TransportMode::Driving, 13.0), 13.0 + 10.0 * 2.5);
	}

	#[test]
	fn transit_cost_caps_at_ten() {
		assert_eq!(cost_for_mode(TransportMode::Transit, 50.0), 10.0);
	}
}
