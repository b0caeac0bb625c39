/*
 * src/agent/agents/finalizer.rs
 *
 * Finalizer: assembles the accepted draft plus the resource results into
 * the persisted `FinalItinerary` shape. Fills in sensible placeholders for
 * anything an upstream agent left unset, since this is the last stop
 * before the plan is shown to the traveler.
 */

use crate::agent::models::budget::CategoryBreakdown;
use crate::agent::models::itinerary::{
	CostBreakdown, DraftItinerary, FinalAccommodation, FinalActivity, FinalDay, FinalItinerary, FinalMeal, FinalTransportation,
};
use crate::agent::models::resource::{AccommodationResult, DiningResult, TransportResult};
use crate::agent::models::trip::TripInput;

const DEFAULT_TIME: &str = "10:00";
const DEFAULT_DURATION: &str = "2 hours";
const DEFAULT_MEAL_PRICE: f64 = 50.0;
const OTHER_RESERVE_FRACTION: f64 = 0.05;

pub fn finalize(
	trip: &TripInput,
	draft: &DraftItinerary,
	accommodation: &AccommodationResult,
	transport: &TransportResult,
	dining: &DiningResult,
) -> FinalItinerary {
	let mut days = Vec::with_capacity(draft.days.len());
	let mut attraction_cost = 0.0;
	let mut dining_cost = 0.0;

	for day in &draft.days {
		let activities = day
			.attractions
			.iter()
			.map(|a| {
				let price = a.ticket_price.unwrap_or(0.0);
				attraction_cost += price * trip.traveler_count as f64;
				FinalActivity {
					time: if a.start_time.is_empty() { DEFAULT_TIME.to_string() } else { a.start_time.clone() },
					name: a.name.clone(),
					activity_type: a.attraction_type.clone().unwrap_or_else(|| "sightseeing".to_string()),
					location: a.location,
					duration: DEFAULT_DURATION.to_string(),
					description: format!("Visit {}", a.name),
					ticket_price: price,
				}
			})
			.collect::<Vec<_>>();

		let meals = dining
			.recommendations
			.iter()
			.filter(|d| d.day_index == day.day_index)
			.map(|d| {
				dining_cost += d.price;
				FinalMeal {
					time: day
						.meals
						.iter()
						.find(|m| m.meal_type == d.meal_type)
						.map(|m| m.time.clone())
						.unwrap_or_else(|| DEFAULT_TIME.to_string()),
					meal_type: d.meal_type,
					name: d.name.clone(),
					price: if d.price > 0.0 { d.price } else { DEFAULT_MEAL_PRICE },
				}
			})
			.collect::<Vec<_>>();

		days.push(FinalDay {
			day_index: day.day_index,
			date: day.date.clone(),
			activities,
			meals,
		});
	}

	let accommodations = vec![FinalAccommodation {
		name: accommodation.selected.name.clone(),
		location: accommodation.selected.location,
		price_per_night: accommodation.selected.price_per_night,
		nights: trip.nights(),
		total_cost: accommodation.total_cost,
	}];

	let transportation = FinalTransportation {
		to_destination: trip.origin.clone().unwrap_or_else(|| "origin".to_string()),
		from_destination: trip.destination.clone(),
		local_methods: transport.recommended_modes.iter().map(|m| format!("{:?}", m)).collect(),
		estimated_local_cost: transport.total_cost,
	};

	let subtotal = attraction_cost + accommodation.total_cost + transport.total_cost + dining_cost;
	let other = subtotal * OTHER_RESERVE_FRACTION;
	let cost = CostBreakdown {
		attractions: attraction_cost,
		accommodation: accommodation.total_cost,
		transport: transport.total_cost,
		dining: dining_cost,
		other,
		total: subtotal + other,
	};

	let summary = build_summary(trip, draft, accommodation, subtotal + other);

	FinalItinerary {
		destination: trip.destination.clone(),
		days,
		accommodation: accommodations,
		transportation,
		cost,
		summary,
	}
}

/// Two sentences: destination/day-count/cost, then up to three top
/// attractions (in day order) and the selected hotel.
fn build_summary(trip: &TripInput, draft: &DraftItinerary, accommodation: &AccommodationResult, total: f64) -> String {
	let first_sentence = format!(
		"{} day trip to {} for {} traveler(s), estimated total {:.0}.",
		trip.day_count(),
		trip.destination,
		trip.traveler_count,
		total
	);

	let top_attractions: Vec<&str> = draft.days.iter().flat_map(|d| d.attractions.iter()).map(|a| a.name.as_str()).take(3).collect();

	let second_sentence = if top_attractions.is_empty() {
		format!("Staying at {}.", accommodation.selected.name)
	} else {
		format!("Highlights include {}, with accommodation at {}.", top_attractions.join(", "), accommodation.selected.name)
	};

	format!("{first_sentence} {second_sentence}")
}

pub fn to_category_breakdown(cost: &CostBreakdown) -> CategoryBreakdown {
	CategoryBreakdown {
		attractions: cost.attractions,
		accommodation: cost.accommodation,
		transport: cost.transport,
		dining: cost.dining,
	}
}
