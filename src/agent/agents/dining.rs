/*
 * src/agent/agents/dining.rs
 *
 * Dining agent: picks a restaurant per meal slot near that slot's nearest
 * prior attraction and prices it from the trip's dining allowance
 * (`total_budget * 0.25`, split across meals by a per-meal-type factor).
 * Search keywords come from a meal-type table (breakfast/snack/other),
 * refined with an LLM-suggested local specialty when one is offered.
 */

use langchain_rust::language_models::llm::LLM;

use crate::agent::map_adapter::MapAdapter;
use crate::agent::models::geo::LatLng;
use crate::agent::models::itinerary::{DraftDay, DraftItinerary, MealSlot, MealType};
use crate::agent::models::resource::{DiningRecommendation, DiningResult};
use crate::agent::models::trip::TripInput;

use super::llm::invoke_json;

const PROMPT_TEMPLATE: &str = include_str!("../prompts/dining.md");

fn price_factor(meal_type: MealType) -> f64 {
	match meal_type {
		MealType::Breakfast => 0.5,
		MealType::Lunch => 1.0,
		MealType::Dinner => 1.3,
		MealType::Snack => 0.4,
	}
}

/// Meal-type-derived search keyword (spec: breakfast -> 早餐; snack -> 小吃/甜品;
/// everything else -> 餐厅). An explicit, non-empty `cuisine` on the slot
/// overrides the table.
fn keyword_for_meal(meal: &MealSlot) -> String {
	if let Some(cuisine) = meal.cuisine.as_deref() {
		if !cuisine.is_empty() {
			return cuisine.to_string();
		}
	}
	match meal.meal_type {
		MealType::Breakfast => "早餐".to_string(),
		MealType::Snack => "小吃/甜品".to_string(),
		MealType::Lunch | MealType::Dinner => "餐厅".to_string(),
	}
}

/// The nearest prior attraction to a meal's time, falling back to the
/// day's first located attraction, then an unset origin. `"HH:MM"` strings
/// compare lexicographically in chronological order.
fn anchor_for_meal(day: &DraftDay, meal: &MealSlot) -> LatLng {
	day.attractions
		.iter()
		.filter(|a| a.location.is_some() && a.start_time.as_str() <= meal.time.as_str())
		.last()
		.or_else(|| day.attractions.iter().find(|a| a.location.is_some()))
		.and_then(|a| a.location)
		.unwrap_or(LatLng { lat: 0.0, lng: 0.0 })
}

#[derive(serde::Deserialize)]
struct LlmSpecialtyResponse {
	specialty: Option<String>,
}

async fn llm_specialty(llm: &dyn LLM, trip: &TripInput) -> Option<String> {
	let prompt = format!(
		"{template}\n\nDestination: {destination}\nPreferences: {preferences_json}",
		template = PROMPT_TEMPLATE,
		destination = trip.destination,
		preferences_json = serde_json::to_string(&trip.preferences).unwrap_or_default(),
	);
	invoke_json::<LlmSpecialtyResponse>(llm, &prompt).await.and_then(|r| r.specialty).filter(|s| !s.is_empty())
}

pub async fn run(llm: &dyn LLM, map_adapter: &MapAdapter, trip: &TripInput, draft: &DraftItinerary) -> DiningResult {
	let dining_budget = trip.budget as f64 * 0.25;
	let meal_count = draft.total_meal_count.max(1) as f64;
	let base_price = dining_budget / meal_count;
	let specialty = llm_specialty(llm, trip).await;

	let mut recommendations = Vec::new();
	let mut total_cost = 0.0;

	for day in &draft.days {
		for meal in &day.meals {
			let anchor = anchor_for_meal(day, meal);
			let price = (base_price * price_factor(meal.meal_type)).round();
			let keyword = keyword_for_meal(meal);
			let search_term = match &specialty {
				Some(specialty) => format!("{keyword} {specialty}"),
				None => keyword,
			};
			let candidates = map_adapter.nearby_search(anchor, 1500.0, &search_term).await;
			let name = candidates
				.first()
				.map(|p| p.name.clone())
				.unwrap_or_else(|| format!("Local {:?} spot", meal.meal_type));

			recommendations.push(DiningRecommendation {
				day_index: day.day_index,
				meal_type: meal.meal_type,
				name,
				location: candidates.first().and_then(|p| p.location),
				price,
			});
			total_cost += price;
		}
	}

	DiningResult { recommendations, total_cost: total_cost * trip.traveler_count.max(1) as f64 }
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn dinner_costs_more_than_breakfast() {
		assert!(price_factor(MealType::Dinner) > price_factor(MealType::Breakfast));
	}

	#[test]
	fn factors_match_spec_table() {
		assert_eq!(price_factor(MealType::Breakfast), 0.5);
		assert_eq!(price_factor(MealType::Lunch), 1.0);
		assert_eq!(price_factor(MealType::Dinner), 1.3);
		assert_eq!(price_factor(MealType::Snack), 0.4);
	}

	fn meal(meal_type: MealType, time: &str, cuisine: Option<&str>) -> MealSlot {
		MealSlot { time: time.to_string(), meal_type, cuisine: cuisine.map(str::to_string) }
	}

	#[test]
	fn keyword_table_matches_spec() {
		assert_eq!(keyword_for_meal(&meal(MealType::Breakfast, "08:00", None)), "早餐");
		assert_eq!(keyword_for_meal(&meal(MealType::Snack, "15:00", None)), "小吃/甜品");
		assert_eq!(keyword_for_meal(&meal(MealType::Lunch, "12:30", None)), "餐厅");
		assert_eq!(keyword_for_meal(&meal(MealType::Dinner, "18:30", None)), "餐厅");
	}

	#[test]
	fn explicit_cuisine_overrides_table() {
		assert_eq!(keyword_for_meal(&meal(MealType::Breakfast, "08:00", Some("dim sum"))), "dim sum");
	}

	fn attraction_slot(name: &str, start_time: &str, location: Option<LatLng>) -> crate::agent::models::itinerary::AttractionSlot {
		crate::agent::models::itinerary::AttractionSlot {
			start_time: start_time.to_string(),
			name: name.to_string(),
			duration_minutes: 90,
			attraction_type: None,
			location,
			ticket_price: None,
		}
	}

	#[test]
	fn anchor_picks_nearest_prior_attraction() {
		let near = LatLng { lat: 1.0, lng: 1.0 };
		let far = LatLng { lat: 2.0, lng: 2.0 };
		let day = DraftDay {
			day_index: 1,
			date: "2025-12-01".to_string(),
			attractions: vec![attraction_slot("Morning Spot", "09:00", Some(near)), attraction_slot("Afternoon Spot", "14:00", Some(far))],
			meals: vec![],
		};
		let lunch = meal(MealType::Lunch, "12:30", None);
		assert_eq!(anchor_for_meal(&day, &lunch), near);

		let dinner = meal(MealType::Dinner, "19:00", None);
		assert_eq!(anchor_for_meal(&day, &dinner), far);
	}
}
