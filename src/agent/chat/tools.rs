/*
 * src/agent/chat/tools.rs
 *
 * The chat core's tool surface. Each variant is a distinct capability the
 * LLM can invoke mid-conversation; `ToolCall::dispatch` is the single place
 * that turns a requested call into a `ToolExecution` record, so the chat
 * loop itself stays free of per-tool branching logic.
 */

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::agent::chat::modification::{impact_from_costs, ModificationCache};
use crate::agent::chat::modify_ops;
use crate::agent::graph::checkpoint::Checkpointer;
use crate::agent::map_adapter::MapAdapter;
use crate::agent::models::context::ToolExecution;
use crate::agent::models::itinerary::FinalItinerary;
use crate::agent::models::modification::{ModificationChange, ModificationOperation, ModificationPreview, ModificationStatus, TimeAdjustment};
use crate::agent::models::trip::TripInput;
use crate::agent::models::user::TripFormState;

use langchain_rust::language_models::llm::LLM;

/// `confirm_and_generate_trip`'s success sentinel: the tool never runs the
/// orchestration graph itself, it only tells the transport layer (the chat
/// controller) that the form validated and generation should be triggered.
pub const TRIGGER_GENERATION_ACTION: &str = "trigger_generation";

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "tool", content = "args", rename_all = "snake_case")]
pub enum ToolCall {
	/// City-scoped POI search for sightseeing spots.
	SearchAttractions { city: String, #[serde(default)] keywords: Option<String>, #[serde(default)] r#type: Option<String>, #[serde(default)] limit: Option<usize> },
	/// City-scoped POI search for lodging.
	SearchHotels { city: String, #[serde(default)] price_range: Option<String>, #[serde(default)] r#type: Option<String>, #[serde(default)] limit: Option<usize> },
	/// City-scoped POI search for dining.
	SearchRestaurants { city: String, #[serde(default)] cuisine: Option<String>, #[serde(default)] price_range: Option<String>, #[serde(default)] limit: Option<usize> },
	/// Day-by-day forecast for a city, optionally anchored to one date.
	GetWeather { city: String, #[serde(default)] date: Option<String> },
	/// Distance/duration estimate between two addresses.
	CalculateRoute { origin: String, destination: String, #[serde(default)] mode: Option<String> },
	/// Generic recommendation lookup across one of the resource categories.
	GetRecommendations { city: String, category: String, #[serde(default)] preferences: Vec<String> },
	/// Echoes back the trip id; the actual itinerary detail is already
	/// rendered into the system prompt's `TripContextBlock` by the chat
	/// controller, since this tool context carries no database handle.
	GetTripDetails { trip_id: String },
	/// Merge newly-extracted fields into the in-progress trip form and
	/// report what's still missing.
	PrepareTripForm { fields: TripFormState },
	/// Re-validates the form and, on success, returns a sentinel instructing
	/// the transport layer to launch the orchestration graph.
	ConfirmAndGenerateTrip { form_data: TripFormState, #[serde(default)] session_id: Option<String> },
	/// Preview a requested edit against the current itinerary without
	/// committing it. `current` stands in for the trip-store load this
	/// tool context has no database handle to perform (see DESIGN.md).
	PrepareItineraryModification {
		trip_id: String,
		operation: String,
		#[serde(default)]
		params: Value,
		#[serde(default)]
		reason: Option<String>,
		current: FinalItinerary,
	},
	/// Commit a previously prepared modification, optionally applying user
	/// time tweaks on top of it.
	ConfirmItineraryModification {
		modification_id: String,
		#[serde(default)]
		user_adjustments: Vec<TimeAdjustment>,
	},
	/// Discard a previously prepared modification.
	CancelItineraryModification { modification_id: String },
}

pub struct ToolContext<'a> {
	pub map_adapter: &'a MapAdapter,
	pub llm: &'a dyn LLM,
	pub checkpointer: &'a dyn Checkpointer,
	pub modification_cache: &'a ModificationCache,
}

impl ToolCall {
	pub fn name(&self) -> &'static str {
		match self {
			ToolCall::SearchAttractions { .. } => "search_attractions",
			ToolCall::SearchHotels { .. } => "search_hotels",
			ToolCall::SearchRestaurants { .. } => "search_restaurants",
			ToolCall::GetWeather { .. } => "get_weather",
			ToolCall::CalculateRoute { .. } => "calculate_route",
			ToolCall::GetRecommendations { .. } => "get_recommendations",
			ToolCall::GetTripDetails { .. } => "get_trip_details",
			ToolCall::PrepareTripForm { .. } => "prepare_trip_form",
			ToolCall::ConfirmAndGenerateTrip { .. } => "confirm_and_generate_trip",
			ToolCall::PrepareItineraryModification { .. } => "prepare_itinerary_modification",
			ToolCall::ConfirmItineraryModification { .. } => "confirm_itinerary_modification",
			ToolCall::CancelItineraryModification { .. } => "cancel_itinerary_modification",
		}
	}

	pub async fn dispatch(self, ctx: &ToolContext<'_>) -> ToolExecution {
		let tool_name = self.name().to_string();
		let input = self.to_input_value();
		let (output, success) = self.run(ctx).await;

		ToolExecution {
			tool_name,
			timestamp: chrono::Utc::now().to_rfc3339(),
			input,
			output,
			success,
		}
	}

	pub(crate) fn to_input_value(&self) -> Value {
		serde_json::to_value(self).unwrap_or(Value::Null)
	}

	async fn run(self, ctx: &ToolContext<'_>) -> (Value, bool) {
		match self {
			ToolCall::SearchAttractions { city, keywords, r#type, limit } => {
				let results = ctx.map_adapter.poi_search(&city, keywords.as_deref().unwrap_or("attraction"), r#type.as_deref(), limit.unwrap_or(10)).await;
				(json!({ "results": results }), true)
			}
			ToolCall::SearchHotels { city, price_range, r#type, limit } => {
				let results = ctx.map_adapter.poi_search(&city, "hotel", r#type.as_deref(), limit.unwrap_or(10)).await;
				(json!({ "results": results, "price_range": price_range }), true)
			}
			ToolCall::SearchRestaurants { city, cuisine, price_range, limit } => {
				let keyword = cuisine.clone().unwrap_or_else(|| "restaurant".to_string());
				let results = ctx.map_adapter.poi_search(&city, &keyword, None, limit.unwrap_or(10)).await;
				(json!({ "results": results, "price_range": price_range }), true)
			}
			ToolCall::GetWeather { city, date } => {
				let forecast = ctx.map_adapter.weather_forecast(&city).await;
				let forecast = match date {
					Some(d) => forecast.into_iter().filter(|f| f.date == d).collect(),
					None => forecast,
				};
				(json!({ "forecast": forecast }), true)
			}
			ToolCall::CalculateRoute { origin, destination, mode } => {
				let Some(from) = ctx.map_adapter.geocode(&origin).await else {
					return (json!({ "error": format!("couldn't geocode {origin}") }), false);
				};
				let Some(to) = ctx.map_adapter.geocode(&destination).await else {
					return (json!({ "error": format!("couldn't geocode {destination}") }), false);
				};
				match ctx.map_adapter.distance(from, to, mode.as_deref().unwrap_or("driving")).await {
					Some(leg) => (json!({ "route": leg }), true),
					None => (json!({ "error": "no route found" }), false),
				}
			}
			ToolCall::GetRecommendations { city, category, preferences } => {
				let keyword = preferences.first().cloned().unwrap_or_else(|| category.clone());
				let results = ctx.map_adapter.poi_search(&city, &keyword, Some(&category), 10).await;
				(json!({ "category": category, "results": results }), true)
			}
			ToolCall::GetTripDetails { trip_id } => (
				json!({
					"trip_id": trip_id,
					"note": "full itinerary detail is already provided in the current-trip context block",
				}),
				true,
			),
			ToolCall::PrepareTripForm { fields } => {
				let validation = fields.validate();
				(json!({ "form": fields, "validation": validation }), true)
			}
			ToolCall::ConfirmAndGenerateTrip { form_data, session_id } => {
				let validation = form_data.validate();
				if !validation.is_valid {
					return (json!({ "validation": validation }), false);
				}
				match TripInput::try_from(form_data.clone()) {
					Ok(_) => (
						json!({
							"action": TRIGGER_GENERATION_ACTION,
							"form_data": form_data,
							"session_id": session_id,
						}),
						true,
					),
					Err(err) => (json!({ "error": err }), false),
				}
			}
			ToolCall::PrepareItineraryModification { trip_id, operation, params, reason, current } => {
				let op = match ModificationOperation::parse(&operation) {
					Ok(op) => op,
					Err(err) => return (json!({ "error": err }), false),
				};
				match modify_ops::apply(op, &current, &params, ctx.llm).await {
					Ok((after, changes)) => {
						let preview = build_preview(trip_id, operation, reason, &current, &after, changes);
						let value = json!({ "preview": &preview });
						ctx.modification_cache.insert(preview, after);
						(value, true)
					}
					Err(err) => (json!({ "error": err }), false),
				}
			}
			ToolCall::ConfirmItineraryModification { modification_id, user_adjustments } => match ctx.modification_cache.confirm(&modification_id, &user_adjustments) {
				Some(itinerary) => (json!({ "confirmed": true, "itinerary": itinerary }), true),
				None => (json!({ "confirmed": false, "reason": "not found or expired" }), false),
			},
			ToolCall::CancelItineraryModification { modification_id } => {
				let ok = ctx.modification_cache.cancel(&modification_id);
				(json!({ "cancelled": ok }), ok)
			}
		}
	}
}

/// Warn when a day has no activities or more than six: both are signs the
/// modification produced an unreasonable day plan.
const MAX_REASONABLE_DAY_ACTIVITIES: usize = 6;

fn build_preview(
	trip_id: String,
	operation: String,
	reason: Option<String>,
	before: &FinalItinerary,
	after: &FinalItinerary,
	changes: Vec<ModificationChange>,
) -> ModificationPreview {
	let now = chrono::Utc::now();
	let affected_days: Vec<u32> = {
		let mut days: Vec<u32> = changes.iter().map(|c| c.day_index).filter(|&d| d > 0).collect();
		days.sort_unstable();
		days.dedup();
		days
	};

	let mut warnings = Vec::new();
	for day in &after.days {
		if day.activities.is_empty() {
			warnings.push(format!("day {} has no activities", day.day_index));
		} else if day.activities.len() > MAX_REASONABLE_DAY_ACTIVITIES {
			warnings.push(format!("day {} has {} activities, which may be too packed", day.day_index, day.activities.len()));
		}
	}

	let mut impact = impact_from_costs(total_cost(before), total_cost(after), affected_days);
	impact.warnings = warnings;

	if let Some(reason) = &reason {
		tracing::debug!(target: "chat::tools", %reason, "modification requested with a stated reason");
	}

	let before_summary = format!("{} activities across {} days", before.days.iter().map(|d| d.activities.len()).sum::<usize>(), before.days.len());
	let after_summary = format!("{} activities across {} days", after.days.iter().map(|d| d.activities.len()).sum::<usize>(), after.days.len());

	ModificationPreview {
		id: uuid::Uuid::new_v4().to_string(),
		trip_id,
		operation,
		before_summary,
		after_summary,
		changes,
		impact,
		created_at: now,
		expires_at: now + chrono::Duration::seconds(crate::global::MODIFICATION_TTL_SECS as i64),
		status: ModificationStatus::Pending,
	}
}

fn total_cost(it: &FinalItinerary) -> f64 {
	let activities: f64 = it.days.iter().flat_map(|d| d.activities.iter()).map(|a| a.ticket_price).sum();
	let meals: f64 = it.days.iter().flat_map(|d| d.meals.iter()).map(|m| m.price).sum();
	let accommodation: f64 = it.accommodation.iter().map(|a| a.total_cost).sum();
	activities + meals + accommodation
}
