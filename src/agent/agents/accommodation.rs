/*
 * src/agent/agents/accommodation.rs
 *
 * Accommodation agent: picks a price tier from the trip's budget (or an
 * explicit preference keyword), scores candidate hotels from nearby-search
 * results, and asks the LLM to rank up to three of them; falls back to a
 * rating sort when the LLM is absent or its response doesn't parse.
 */

use langchain_rust::language_models::llm::LLM;

use crate::agent::map_adapter::{MapAdapter, PoiResult};
use crate::agent::models::geo::{centroid, LatLng};
use crate::agent::models::resource::{AccommodationResult, HotelRecommendation, PriceTier};
use crate::agent::models::trip::TripInput;

use super::llm::invoke_json;

const PROMPT_TEMPLATE: &str = include_str!("../prompts/accommodation.md");

fn tier_from_preferences(preferences: &[String]) -> Option<PriceTier> {
	for pref in preferences {
		let pref = pref.to_lowercase();
		if pref.contains("luxury") || pref.contains("upscale") {
			return Some(PriceTier::Luxury);
		}
		if pref.contains("budget") || pref.contains("economy") || pref.contains("cheap") {
			return Some(PriceTier::Economy);
		}
	}
	None
}

/// Per-night budget-derived price tier: `budget * 0.3 / nights / travelers`,
/// bucketed into economy/standard/luxury price bands.
fn tier_from_budget(trip: &TripInput) -> (PriceTier, f64) {
	let nights = trip.nights().max(1) as f64;
	let travelers = trip.traveler_count.max(1) as f64;
	let per_night_per_traveler = trip.budget as f64 * 0.3 / nights / travelers;

	let tier = if per_night_per_traveler < 150.0 {
		PriceTier::Economy
	} else if per_night_per_traveler < 400.0 {
		PriceTier::Standard
	} else {
		PriceTier::Luxury
	};
	(tier, per_night_per_traveler * travelers)
}

fn tier_price_band(tier: PriceTier) -> (f64, f64) {
	match tier {
		PriceTier::Economy => (80.0, 250.0),
		PriceTier::Standard => (250.0, 600.0),
		PriceTier::Luxury => (600.0, 1500.0),
	}
}

pub async fn run(llm: &dyn LLM, map_adapter: &MapAdapter, trip: &TripInput, attraction_points: &[LatLng]) -> AccommodationResult {
	let center = centroid(attraction_points).unwrap_or(LatLng { lat: 0.0, lng: 0.0 });

	let tier = tier_from_preferences(&trip.hotel_preferences).unwrap_or_else(|| tier_from_budget(trip).0);
	let (min_price, max_price) = tier_price_band(tier);

	let candidates = map_adapter.nearby_search(center, 5000.0, "hotel").await;
	let mut recommendations = candidates
		.into_iter()
		.map(|poi| hotel_from_poi(poi, tier, min_price, max_price))
		.collect::<Vec<_>>();

	recommendations.sort_by(|a, b| b.rating.unwrap_or(0.0).partial_cmp(&a.rating.unwrap_or(0.0)).unwrap());

	if let Some(ranked) = rank_with_llm(llm, trip, tier, &recommendations).await {
		recommendations = ranked;
	}

	let selected = recommendations.first().cloned().unwrap_or_else(|| HotelRecommendation {
		name: format!("{:?} tier hotel near {}", tier, trip.destination),
		location: Some(center),
		price_per_night: (min_price + max_price) / 2.0,
		tier,
		rating: None,
		vendor_poi_id: None,
	});

	let nights = trip.nights().max(1);
	let total_cost = selected.price_per_night * nights as f64;

	AccommodationResult {
		recommendations,
		selected,
		total_cost,
		centroid: Some(center),
	}
}

#[derive(serde::Deserialize)]
struct LlmRankResponse {
	ranked_names: Vec<String>,
}

/// Asks the LLM to rank up to three candidates by name; reorders
/// `candidates` so the ranked ones lead (in the LLM's order), followed by
/// whatever's left. Returns `None` (leave the caller's rating sort alone)
/// if the LLM is unconfigured, its response doesn't parse, or it names
/// nothing that's actually in the candidate list.
async fn rank_with_llm(llm: &dyn LLM, trip: &TripInput, tier: PriceTier, candidates: &[HotelRecommendation]) -> Option<Vec<HotelRecommendation>> {
	if candidates.is_empty() {
		return None;
	}
	let summary: Vec<_> = candidates.iter().map(|h| serde_json::json!({ "name": h.name, "rating": h.rating, "price_per_night": h.price_per_night })).collect();
	let prompt = format!(
		"{template}\n\nDestination: {destination}\nTier: {tier:?}\nCandidates: {candidates_json}",
		template = PROMPT_TEMPLATE,
		destination = trip.destination,
		candidates_json = serde_json::to_string(&summary).unwrap_or_default(),
	);
	let parsed = invoke_json::<LlmRankResponse>(llm, &prompt).await?;

	let mut ranked = Vec::new();
	for name in parsed.ranked_names.iter().take(3) {
		if let Some(hotel) = candidates.iter().find(|h| &h.name == name) {
			ranked.push(hotel.clone());
		}
	}
	if ranked.is_empty() {
		return None;
	}
	for hotel in candidates {
		if !ranked.iter().any(|h| h.name == hotel.name) {
			ranked.push(hotel.clone());
		}
	}
	Some(ranked)
}

fn hotel_from_poi(poi: PoiResult, tier: PriceTier, min_price: f64, max_price: f64) -> HotelRecommendation {
	let price_per_night = poi
		.price_level
		.map(|level| min_price + (max_price - min_price) * (level.clamp(0, 4) as f64 / 4.0))
		.unwrap_or((min_price + max_price) / 2.0);

	HotelRecommendation {
		name: poi.name,
		location: poi.location,
		price_per_night,
		tier,
		rating: poi.rating,
		vendor_poi_id: Some(poi.vendor_poi_id),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn sample_trip(budget: i64, travelers: u32) -> TripInput {
		TripInput {
			origin: None,
			destination: "Kyoto".to_string(),
			start_date: "2025-12-01".to_string(),
			end_date: "2025-12-04".to_string(),
			start_time: None,
			end_time: None,
			budget,
			traveler_count: travelers,
			adult_count: travelers,
			child_count: 0,
			preferences: vec![],
			hotel_preferences: vec![],
			notes: vec![],
		}
	}

	#[test]
	fn low_budget_selects_economy() {
		let (tier, _) = tier_from_budget(&sample_trip(1500, 2));
		assert_eq!(tier, PriceTier::Economy);
	}

	#[test]
	fn high_budget_selects_luxury() {
		let (tier, _) = tier_from_budget(&sample_trip(30000, 2));
		assert_eq!(tier, PriceTier::Luxury);
	}

	#[test]
	fn keyword_preference_overrides_budget() {
		let tier = tier_from_preferences(&["budget-friendly".to_string()]);
		assert_eq!(tier, Some(PriceTier::Economy));
	}
}
