/*
 * src/agent/agents/itinerary_planner.rs
 *
 * Itinerary planner: turns weather-informed trip state into a
 * DraftItinerary. Asks the LLM to propose a day-by-day attraction/meal
 * plan, carrying the budget critic's feedback on a retry so the prompt can
 * act on a requested cut; every attraction the LLM returns without
 * coordinates is resolved via POI search, falling back to geocode, and
 * left un-geocoded if both miss. Degrades to an even heuristic slice of
 * nearby-search results, same as before this agent existed, when the LLM
 * is absent or its JSON doesn't parse.
 */

use chrono::NaiveDate;

use langchain_rust::language_models::llm::LLM;

use crate::agent::agents::attraction;
use crate::agent::map_adapter::MapAdapter;
use crate::agent::models::budget::{BudgetAction, BudgetFeedback};
use crate::agent::models::geo::LatLng;
use crate::agent::models::itinerary::{AttractionSlot, DraftDay, DraftItinerary, MealSlot, MealType};
use crate::agent::models::trip::TripInput;
use crate::agent::models::weather::{StrategyTag, WeatherReport};

use super::llm::invoke_json;

const PROMPT_TEMPLATE: &str = include_str!("../prompts/itinerary_planner.md");

/// Minimum attractions per day even after a `reduce_attractions` cut.
const MIN_ATTRACTIONS_PER_DAY: usize = 4;
/// Minimum spacing between per-attraction coordinate-resolution calls, to
/// avoid tripping the vendor's rate limiter on a long attraction list.
const ENRICHMENT_RATE_LIMIT: std::time::Duration = std::time::Duration::from_millis(200);

/// Input: full trip state including weather and, on a budget retry, the
/// critic's feedback. Output: a renumbered DraftItinerary with an
/// up-to-date `estimated_attraction_cost`.
pub async fn run(
	llm: &dyn LLM,
	map_adapter: &MapAdapter,
	trip: &TripInput,
	weather: Option<&WeatherReport>,
	budget_feedback: Option<&BudgetFeedback>,
) -> DraftItinerary {
	let strategy_tags = weather.map(|w| w.strategy_tags.clone()).unwrap_or_default();

	let prompt = format!(
		"{template}\n\nTrip: {trip_json}\nStrategy tags: {tags_json}\nBudget feedback: {feedback_json}",
		template = PROMPT_TEMPLATE,
		trip_json = serde_json::to_string(trip).unwrap_or_default(),
		tags_json = serde_json::to_string(&strategy_tags).unwrap_or_default(),
		feedback_json = budget_feedback.map(|f| serde_json::to_string(f).unwrap_or_default()).unwrap_or_else(|| "null".to_string()),
	);

	let mut draft = match invoke_json::<LlmDraftResponse>(llm, &prompt).await.and_then(|parsed| parsed.into_draft(trip)) {
		Some(parsed) => parsed,
		None => build_heuristic_draft(llm, map_adapter, trip, &strategy_tags, budget_feedback).await,
	};

	resolve_missing_coordinates(map_adapter, &mut draft).await;
	for day in &mut draft.days {
		apply_strategy_rules(&mut day.attractions, &strategy_tags);
	}
	draft.renumber();
	draft.estimated_attraction_cost =
		draft.days.iter().flat_map(|d| d.attractions.iter()).filter_map(|a| a.ticket_price).sum::<f64>() * trip.traveler_count as f64;
	draft
}

#[derive(serde::Deserialize)]
struct LlmDraftResponse {
	days: Vec<LlmDay>,
}

#[derive(serde::Deserialize)]
struct LlmDay {
	date: String,
	attractions: Vec<LlmAttraction>,
	#[serde(default)]
	meals: Vec<LlmMeal>,
}

#[derive(serde::Deserialize)]
struct LlmAttraction {
	name: String,
	start_time: String,
	#[serde(default)]
	duration_minutes: Option<u32>,
	#[serde(default)]
	attraction_type: Option<String>,
	#[serde(default)]
	estimated_ticket_price: Option<f64>,
}

#[derive(serde::Deserialize)]
struct LlmMeal {
	time: String,
	meal_type: MealType,
	#[serde(default)]
	cuisine: Option<String>,
}

impl LlmDraftResponse {
	/// `None` for an unusable response (e.g. an empty plan), so the caller
	/// falls back to the heuristic builder exactly as it would for a
	/// missing/unparseable LLM reply.
	fn into_draft(self, trip: &TripInput) -> Option<DraftItinerary> {
		let days = self
			.days
			.into_iter()
			.enumerate()
			.map(|(i, d)| DraftDay {
				day_index: (i + 1) as u32,
				date: d.date,
				attractions: d
					.attractions
					.into_iter()
					.map(|a| AttractionSlot {
						start_time: a.start_time,
						name: a.name,
						duration_minutes: a.duration_minutes.unwrap_or(90),
						attraction_type: a.attraction_type,
						location: None,
						ticket_price: a.estimated_ticket_price,
					})
					.collect(),
				meals: d
					.meals
					.into_iter()
					.map(|m| MealSlot { time: m.time, meal_type: m.meal_type, cuisine: m.cuisine })
					.collect(),
			})
			.collect::<Vec<_>>();

		if days.is_empty() || days.iter().all(|d| d.attractions.is_empty()) {
			return None;
		}

		let mut draft = DraftItinerary { days, total_attraction_count: 0, total_meal_count: 0, estimated_attraction_cost: 0.0 };
		draft.renumber();
		let _ = trip;
		Some(draft)
	}
}

/// The rule-based plan this agent used exclusively before it gained an LLM
/// path: an even slice of nearby-search results across the trip's days,
/// fixed meal times, and (when budget feedback asks for it) a trim of the
/// lowest-priced attractions.
async fn build_heuristic_draft(
	llm: &dyn LLM,
	map_adapter: &MapAdapter,
	trip: &TripInput,
	strategy_tags: &[StrategyTag],
	budget_feedback: Option<&BudgetFeedback>,
) -> DraftItinerary {
	let center = map_adapter.geocode(&trip.destination).await.unwrap_or(LatLng { lat: 0.0, lng: 0.0 });
	let keyword = trip.preferences.first().cloned().unwrap_or_else(|| "attraction".to_string());
	let pois = map_adapter.nearby_search(center, 10_000.0, &keyword).await;
	let enriched = attraction::enrich_all(llm, map_adapter, &pois).await;

	let day_count = trip.day_count().max(1) as usize;
	let per_day = (enriched.len() / day_count.max(1)).max(1);

	let start_date = NaiveDate::parse_from_str(&trip.start_date, "%Y-%m-%d").ok();
	let mut days = Vec::with_capacity(day_count);

	for day_index in 0..day_count {
		let slice_start = day_index * per_day;
		let slice_end = (slice_start + per_day).min(enriched.len());
		let day_attractions = enriched.get(slice_start..slice_end).unwrap_or(&[]);

		let mut attractions = day_attractions
			.iter()
			.enumerate()
			.map(|(i, a)| AttractionSlot {
				start_time: format!("{:02}:00", 9 + i * 2),
				name: a.name.clone(),
				duration_minutes: a.recommended_duration_minutes.unwrap_or(90),
				attraction_type: a.category.clone(),
				location: a.location,
				ticket_price: a.ticket_price,
			})
			.collect::<Vec<_>>();

		apply_strategy_rules(&mut attractions, strategy_tags);

		let meals = vec![
			MealSlot { time: "08:00".to_string(), meal_type: MealType::Breakfast, cuisine: None },
			MealSlot { time: "12:30".to_string(), meal_type: MealType::Lunch, cuisine: None },
			MealSlot { time: "18:30".to_string(), meal_type: MealType::Dinner, cuisine: None },
		];

		let date = start_date
			.map(|d| (d + chrono::Duration::days(day_index as i64)).format("%Y-%m-%d").to_string())
			.unwrap_or_else(|| trip.start_date.clone());

		days.push(DraftDay { day_index: (day_index + 1) as u32, date, attractions, meals });
	}

	if let Some(feedback) = budget_feedback.filter(|f| f.action == BudgetAction::ReduceAttractions) {
		trim_attractions(&mut days, feedback.target_reduction, trip.traveler_count.max(1));
	}

	let mut draft = DraftItinerary { days, total_attraction_count: 0, total_meal_count: 0, estimated_attraction_cost: 0.0 };
	draft.renumber();
	draft
}

/// Drops the day's cheapest attraction(s) first, stopping once either the
/// requested reduction is covered or every day has hit `MIN_ATTRACTIONS_PER_DAY`.
fn trim_attractions(days: &mut [DraftDay], target_reduction: f64, travelers: u32) {
	let mut remaining = target_reduction;
	loop {
		let Some((day_idx, slot_idx, price)) = days
			.iter()
			.enumerate()
			.filter(|(_, d)| d.attractions.len() > MIN_ATTRACTIONS_PER_DAY)
			.flat_map(|(di, d)| d.attractions.iter().enumerate().map(move |(si, a)| (di, si, a.ticket_price.unwrap_or(0.0))))
			.min_by(|a, b| a.2.partial_cmp(&b.2).unwrap())
		else {
			break;
		};
		days[day_idx].attractions.remove(slot_idx);
		remaining -= price * travelers as f64;
		if remaining <= 0.0 {
			break;
		}
	}
}

const INDOOR_KEYWORDS: &[&str] = &["museum", "gallery", "aquarium", "mall", "theater", "indoor"];
const OUTDOOR_KEYWORDS: &[&str] = &["park", "garden", "beach", "mountain", "zoo", "square", "street"];

fn is_indoor_slot(slot: &AttractionSlot) -> bool {
	let t = slot.attraction_type.as_deref().unwrap_or("").to_lowercase();
	if INDOOR_KEYWORDS.iter().any(|k| t.contains(k)) {
		return true;
	}
	!OUTDOOR_KEYWORDS.iter().any(|k| t.contains(k))
}

/// Applies the weather strategy tags the planner must respect (spec
/// §4.3): `indoor_priority` forces at least one indoor slot per day,
/// `hot_weather` forbids outdoor slots between 12:00 and 14:00.
fn apply_strategy_rules(attractions: &mut [AttractionSlot], tags: &[StrategyTag]) {
	if tags.contains(&StrategyTag::IndoorPriority) && !attractions.is_empty() && !attractions.iter().any(is_indoor_slot) {
		attractions[0].attraction_type = Some("indoor".to_string());
	}

	if tags.contains(&StrategyTag::HotWeather) {
		for slot in attractions.iter_mut() {
			let outdoor = slot.attraction_type.as_deref().map(|t| t.to_lowercase()).map(|t| OUTDOOR_KEYWORDS.iter().any(|k| t.contains(k))).unwrap_or(false);
			if !outdoor {
				continue;
			}
			if let Some(hour) = slot.start_time.split(':').next().and_then(|h| h.parse::<u32>().ok()) {
				if (12..14).contains(&hour) {
					slot.start_time = "14:00".to_string();
				}
			}
		}
	}
}

/// Resolves every attraction slot with no coordinates: city-scoped POI
/// search first, falling back to a bare geocode of the attraction's name
/// plus destination, leaving it un-geocoded if both miss. Rate-limited so
/// a long plan doesn't trip the vendor's throttling.
async fn resolve_missing_coordinates(map_adapter: &MapAdapter, draft: &mut DraftItinerary) {
	let mut first = true;
	for day in &mut draft.days {
		for slot in &mut day.attractions {
			if slot.location.is_some() {
				continue;
			}
			if !first {
				tokio::time::sleep(ENRICHMENT_RATE_LIMIT).await;
			}
			first = false;

			let destination_hint = format!("{} {}", slot.name, day.date);
			let mut found = map_adapter.poi_search(&destination_hint, &slot.name, None, 1).await;
			slot.location = found.pop().and_then(|p| p.location);
			if slot.location.is_none() {
				slot.location = map_adapter.geocode(&slot.name).await;
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn slot(name: &str, hour: u32, attraction_type: Option<&str>) -> AttractionSlot {
		AttractionSlot {
			start_time: format!("{hour:02}:00"),
			name: name.to_string(),
			duration_minutes: 90,
			attraction_type: attraction_type.map(|s| s.to_string()),
			location: None,
			ticket_price: None,
		}
	}

	#[test]
	fn indoor_priority_forces_one_indoor_slot() {
		let mut attractions = vec![slot("Beach", 9, Some("beach")), slot("Garden", 11, Some("garden"))];
		apply_strategy_rules(&mut attractions, &[StrategyTag::IndoorPriority]);
		assert!(attractions.iter().any(is_indoor_slot));
	}

	#[test]
	fn indoor_priority_leaves_existing_indoor_slot_alone() {
		let mut attractions = vec![slot("Museum", 9, Some("museum")), slot("Garden", 11, Some("garden"))];
		apply_strategy_rules(&mut attractions, &[StrategyTag::IndoorPriority]);
		assert_eq!(attractions[0].attraction_type.as_deref(), Some("museum"));
	}

	#[test]
	fn hot_weather_moves_outdoor_slots_out_of_midday() {
		let mut attractions = vec![slot("Park", 12, Some("park")), slot("Museum", 13, Some("museum"))];
		apply_strategy_rules(&mut attractions, &[StrategyTag::HotWeather]);
		assert_eq!(attractions[0].start_time, "14:00");
		assert_eq!(attractions[1].start_time, "13:00");
	}

	fn day_with_prices(prices: &[f64]) -> DraftDay {
		DraftDay {
			day_index: 1,
			date: "2025-12-01".to_string(),
			attractions: prices
				.iter()
				.enumerate()
				.map(|(i, p)| AttractionSlot {
					start_time: format!("{:02}:00", 9 + i),
					name: format!("Spot {i}"),
					duration_minutes: 90,
					attraction_type: None,
					location: None,
					ticket_price: Some(*p),
				})
				.collect(),
			meals: vec![],
		}
	}

	#[test]
	fn trim_attractions_drops_cheapest_first_and_respects_floor() {
		let mut days = vec![day_with_prices(&[10.0, 50.0, 5.0, 20.0, 100.0])];
		trim_attractions(&mut days, 30.0, 1);
		assert_eq!(days[0].attractions.len(), MIN_ATTRACTIONS_PER_DAY);
		assert!(days[0].attractions.iter().all(|a| a.ticket_price != Some(5.0)));
	}

	#[test]
	fn trim_attractions_never_drops_below_minimum() {
		let mut days = vec![day_with_prices(&[10.0, 20.0, 30.0, 40.0])];
		trim_attractions(&mut days, 1000.0, 1);
		assert_eq!(days[0].attractions.len(), MIN_ATTRACTIONS_PER_DAY);
	}
}
