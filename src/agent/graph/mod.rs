/*
 * src/agent/graph/mod.rs
 *
 * The orchestration graph: a concrete fan-out/fan-in pipeline over
 * `PlannerState`, rather than a generic reusable graph DSL. Nodes run in
 * the fixed order the planning domain actually needs (weather -> draft ->
 * resources in parallel -> budget critique, looping back to draft on a
 * rejection -> finalize), with checkpoints taken after every node so a
 * HITL interrupt can suspend and later resume a run.
 */

pub mod checkpoint;

use chrono::NaiveDate;

use crate::agent::agents::{accommodation, budget_critic, dining, finalizer, itinerary_planner, transport, weather};
use crate::agent::map_adapter::MapAdapter;
use crate::agent::models::budget::BudgetFeedback;
use crate::agent::models::geo::LatLng;
use crate::agent::models::hitl::{BudgetDecision, InterruptType, ItineraryReviewDecision};
use crate::agent::models::itinerary::{AttractionSlot, DraftItinerary};
use crate::agent::models::modification::{ChangeKind, ModificationChange};
use crate::agent::models::state::{apply_all, PlannerState, StateUpdate};
use crate::agent::models::trip::TripInput;
use crate::agent::models::weather::DailyForecast;
use crate::agent::tracer::{self, SpanStatus, SpanType, Tracer};

use checkpoint::Checkpointer;
use langchain_rust::language_models::llm::LLM;
use std::future::Future;

/// How many budget-critic rejections the graph will loop on before giving
/// up and handing control to a human via a `BudgetDecision` interrupt.
pub const MAX_BUDGET_RETRIES: u32 = 3;

/// Runs the full pipeline for a fresh trip, checkpointing after every node.
/// Returns the resulting state, which may have `hitl.awaiting_input` set if
/// the itinerary_review wrapper or the budget critic suspended the run.
pub async fn run(
	thread_id: &str,
	trip: TripInput,
	map_adapter: &MapAdapter,
	llm: &dyn LLM,
	checkpointer: &dyn Checkpointer,
	hitl_itinerary_review: bool,
) -> Result<PlannerState, String> {
	let mut state = PlannerState::new(trip);
	let mut parent = None;
	let tracer = Tracer::new(format!("trip:{thread_id}"), tracer::sink_from_env());
	tracer.start_trace().await;

	parent = Some(traced_node(&tracer, "weather", run_weather_node(&mut state, map_adapter, llm, checkpointer, thread_id, parent)).await?);
	parent = Some(traced_node(&tracer, "draft", run_draft_node(&mut state, map_adapter, llm, None, checkpointer, thread_id, parent)).await?);

	if hitl_itinerary_review {
		state.hitl.raise(InterruptType::ItineraryReview, itinerary_review_options(&state));
		checkpointer.save(thread_id, parent, &state).await?;
		tracer.end_trace().await;
		return Ok(state);
	}

	run_budget_retry_loop(&mut state, map_adapter, llm, checkpointer, thread_id, parent, &tracer).await?;
	tracer.end_trace().await;
	Ok(state)
}

/// Resumes a suspended run from its latest checkpoint, applying the
/// traveler's decision before continuing the pipeline.
pub async fn resume(
	thread_id: &str,
	decision: serde_json::Value,
	map_adapter: &MapAdapter,
	llm: &dyn LLM,
	checkpointer: &dyn Checkpointer,
) -> Result<PlannerState, String> {
	let checkpoint = checkpointer
		.latest(thread_id)
		.await?
		.ok_or_else(|| "no checkpoint for thread".to_string())?;
	let mut state = checkpoint.state;
	let interrupt_type = state.hitl.active_interrupt;
	let parent = Some(checkpoint.id);
	let tracer = Tracer::new(format!("trip:{thread_id}"), tracer::sink_from_env());
	tracer.start_trace().await;

	match interrupt_type {
		Some(InterruptType::ItineraryReview) => {
			let review: ItineraryReviewDecision =
				serde_json::from_value(decision.clone()).map_err(|e| format!("bad itinerary_review decision: {e}"))?;
			state.hitl.resume(decision);
			match review {
				ItineraryReviewDecision::Cancel => return Err("trip planning cancelled during itinerary review".to_string()),
				ItineraryReviewDecision::Retry => {
					let new_parent = traced_node(&tracer, "draft", run_draft_node(&mut state, map_adapter, llm, None, checkpointer, thread_id, parent)).await?;
					state.hitl.raise(InterruptType::ItineraryReview, itinerary_review_options(&state));
					checkpointer.save(thread_id, Some(new_parent), &state).await?;
					tracer.end_trace().await;
					return Ok(state);
				}
				ItineraryReviewDecision::Modify { mods } => {
					let mut draft = state.draft_itinerary.clone().unwrap_or_default();
					apply_draft_changes(&mut draft, &mods)?;
					draft.renumber();
					apply_all(&mut state, vec![StateUpdate::DraftItinerary(draft)]);
				}
				ItineraryReviewDecision::Approve => {}
			}
			run_budget_retry_loop(&mut state, map_adapter, llm, checkpointer, thread_id, parent, &tracer).await?;
		}
		Some(InterruptType::BudgetDecision) => {
			let budget: BudgetDecision =
				serde_json::from_value(decision.clone()).map_err(|e| format!("bad budget_decision: {e}"))?;
			state.hitl.resume(decision);
			match budget {
				BudgetDecision::Cancel => return Err("trip planning cancelled during budget review".to_string()),
				BudgetDecision::Accept => {
					traced_node(&tracer, "finalize", run_finalize_node(&mut state, checkpointer, thread_id, parent)).await?;
				}
				BudgetDecision::Option { index: _ } => {
					apply_all(&mut state, vec![StateUpdate::IncrementRetry]);
					run_budget_retry_loop(&mut state, map_adapter, llm, checkpointer, thread_id, parent, &tracer).await?;
				}
			}
		}
		None | Some(InterruptType::FinalConfirm) => {
			state.hitl.resume(decision);
			if !state.hitl.awaiting_input {
				traced_node(&tracer, "finalize", run_finalize_node(&mut state, checkpointer, thread_id, parent)).await?;
			} else {
				checkpointer.save(thread_id, parent, &state).await?;
			}
		}
	}

	tracer.end_trace().await;
	Ok(state)
}

/// Wraps a single pipeline node in a `Node` span, recording its success or
/// failure, while leaving the checkpoint-parent threading (the `Uuid` each
/// node returns) untouched.
async fn traced_node<F, T>(tracer: &Tracer, name: &str, fut: F) -> Result<T, String>
where
	F: Future<Output = Result<T, String>>,
{
	let span_id = tracer.start_span(name, SpanType::Node, None, None).await;
	let result = fut.await;
	match &result {
		Ok(_) => tracer.end_span(span_id, SpanStatus::Completed, None, None, None).await,
		Err(e) => tracer.end_span(span_id, SpanStatus::Error, None, Some(e.clone()), None).await,
	}
	result
}

/// The draft -> resources -> budget_critic loop: on an over-budget verdict
/// it carries the critic's `BudgetFeedback` back into the itinerary planner
/// (spec §4.4: `budget_critic -> itinerary_planner` on rejection) before
/// re-running resources, rather than just relaxing the acceptance threshold
/// by incrementing `retry_count` alone. Loops until it converges, retries
/// run out (raising `BudgetDecision`), or a HITL interrupt is already
/// pending, then finalizes.
async fn run_budget_retry_loop(
	state: &mut PlannerState,
	map_adapter: &MapAdapter,
	llm: &dyn LLM,
	checkpointer: &dyn Checkpointer,
	thread_id: &str,
	mut parent: Option<uuid::Uuid>,
	tracer: &Tracer,
) -> Result<(), String> {
	loop {
		parent = Some(traced_node(tracer, "resources", run_resources_node(state, map_adapter, llm, checkpointer, thread_id, parent)).await?);
		parent = Some(traced_node(tracer, "budget_critic", run_budget_node(state, checkpointer, thread_id, parent)).await?);

		if state.budget_result.as_ref().map(|b| b.is_within_budget).unwrap_or(true) {
			break;
		}
		if state.retry_count >= MAX_BUDGET_RETRIES {
			state.hitl.raise(
				InterruptType::BudgetDecision,
				serde_json::to_value(&state.budget_result).unwrap_or(serde_json::Value::Null),
			);
			checkpointer.save(thread_id, parent, state).await?;
			return Ok(());
		}

		let feedback: Option<BudgetFeedback> = state.budget_result.as_ref().and_then(|b| b.feedback.clone());
		apply_all(state, vec![StateUpdate::IncrementRetry]);
		parent = Some(
			traced_node(tracer, "itinerary_planner", run_draft_node(state, map_adapter, llm, feedback.as_ref(), checkpointer, thread_id, parent)).await?,
		);
	}

	if !state.hitl.awaiting_input {
		traced_node(tracer, "finalize", run_finalize_node(state, checkpointer, thread_id, parent)).await?;
	}
	Ok(())
}

fn itinerary_review_options(state: &PlannerState) -> serde_json::Value {
	serde_json::json!({
		"draft": state.draft_itinerary,
		"weather_warnings": state.weather.as_ref().map(|w| w.warnings.clone()).unwrap_or_default(),
	})
}

/// Applies a reviewer's `modify` decision to the draft itinerary. Each
/// change's `day_index` selects the day; `add`/`remove`/`modify` carry a
/// single serialized `AttractionSlot` in `after`/`before`, matched by name
/// for remove/modify; `reorder` carries the day's attraction names in their
/// new order.
fn apply_draft_changes(draft: &mut DraftItinerary, changes: &[ModificationChange]) -> Result<(), String> {
	for change in changes {
		let day = draft
			.days
			.get_mut(change.day_index.saturating_sub(1) as usize)
			.ok_or_else(|| format!("no such day {}", change.day_index))?;

		match change.kind {
			ChangeKind::Add => {
				let slot: AttractionSlot = serde_json::from_value(change.after.clone().ok_or("add change missing after")?)
					.map_err(|e| e.to_string())?;
				day.attractions.push(slot);
			}
			ChangeKind::Remove => {
				let slot: AttractionSlot = serde_json::from_value(change.before.clone().ok_or("remove change missing before")?)
					.map_err(|e| e.to_string())?;
				day.attractions.retain(|a| a.name != slot.name);
			}
			ChangeKind::Modify => {
				let slot: AttractionSlot = serde_json::from_value(change.after.clone().ok_or("modify change missing after")?)
					.map_err(|e| e.to_string())?;
				let before_name = change
					.before
					.as_ref()
					.and_then(|v| v.get("name"))
					.and_then(|v| v.as_str())
					.unwrap_or(slot.name.as_str())
					.to_string();
				if let Some(existing) = day.attractions.iter_mut().find(|a| a.name == before_name) {
					*existing = slot;
				} else {
					day.attractions.push(slot);
				}
			}
			ChangeKind::Reorder => {
				let order: Vec<String> = serde_json::from_value(change.after.clone().ok_or("reorder change missing after")?)
					.map_err(|e| e.to_string())?;
				let mut reordered = Vec::with_capacity(day.attractions.len());
				for name in &order {
					if let Some(pos) = day.attractions.iter().position(|a| &a.name == name) {
						reordered.push(day.attractions.remove(pos));
					}
				}
				reordered.extend(day.attractions.drain(..));
				day.attractions = reordered;
			}
		}
	}
	Ok(())
}

async fn run_weather_node(
	state: &mut PlannerState,
	map_adapter: &MapAdapter,
	llm: &dyn LLM,
	checkpointer: &dyn Checkpointer,
	thread_id: &str,
	parent: Option<uuid::Uuid>,
) -> Result<uuid::Uuid, String> {
	let from_adapter = map_adapter.weather_forecast(&state.trip.destination).await;
	let forecasts = if from_adapter.is_empty() { synthesize_forecast(&state.trip) } else { from_adapter };
	let report = weather::run(llm, &state.trip, forecasts).await;
	apply_all(state, vec![StateUpdate::Weather(report)]);
	checkpointer.save(thread_id, parent, state).await
}

async fn run_draft_node(
	state: &mut PlannerState,
	map_adapter: &MapAdapter,
	llm: &dyn LLM,
	budget_feedback: Option<&BudgetFeedback>,
	checkpointer: &dyn Checkpointer,
	thread_id: &str,
	parent: Option<uuid::Uuid>,
) -> Result<uuid::Uuid, String> {
	let draft = itinerary_planner::run(llm, map_adapter, &state.trip, state.weather.as_ref(), budget_feedback).await;
	apply_all(state, vec![StateUpdate::DraftItinerary(draft)]);
	checkpointer.save(thread_id, parent, state).await
}

async fn run_resources_node(
	state: &mut PlannerState,
	map_adapter: &MapAdapter,
	llm: &dyn LLM,
	checkpointer: &dyn Checkpointer,
	thread_id: &str,
	parent: Option<uuid::Uuid>,
) -> Result<uuid::Uuid, String> {
	let draft = state.draft_itinerary.clone().unwrap_or_default();
	let attraction_points: Vec<LatLng> = draft.days.iter().flat_map(|d| d.attractions.iter().filter_map(|a| a.location)).collect();
	let hotel_anchor = crate::agent::models::geo::centroid(&attraction_points).unwrap_or(LatLng { lat: 0.0, lng: 0.0 });

	let day_waypoints: Vec<transport::DayWaypoints> = draft
		.days
		.iter()
		.map(|d| transport::DayWaypoints {
			day_index: d.day_index,
			attractions: d.attractions.iter().filter_map(|a| a.location.map(|loc| (a.name.clone(), loc))).collect(),
		})
		.collect();

	let (accommodation_result, transport_result, dining_result) = tokio::join!(
		accommodation::run(llm, map_adapter, &state.trip, &attraction_points),
		transport::run(llm, map_adapter, hotel_anchor, &day_waypoints, state.trip.traveler_count),
		dining::run(llm, map_adapter, &state.trip, &draft),
	);

	apply_all(
		state,
		vec![
			StateUpdate::Accommodation(accommodation_result),
			StateUpdate::Transport(transport_result),
			StateUpdate::Dining(dining_result),
		],
	);
	checkpointer.save(thread_id, parent, state).await
}

async fn run_budget_node(
	state: &mut PlannerState,
	checkpointer: &dyn Checkpointer,
	thread_id: &str,
	parent: Option<uuid::Uuid>,
) -> Result<uuid::Uuid, String> {
	let breakdown = crate::agent::models::budget::CategoryBreakdown {
		attractions: state.draft_itinerary.as_ref().map(|d| d.estimated_attraction_cost).unwrap_or(0.0),
		accommodation: state.accommodation.as_ref().map(|a| a.total_cost).unwrap_or(0.0),
		transport: state.transport.as_ref().map(|t| t.total_cost).unwrap_or(0.0),
		dining: state.dining.as_ref().map(|d| d.total_cost).unwrap_or(0.0),
	};

	let mut exhausted = exhausted_budget_categories(state);
	let result = budget_critic::critique(breakdown, state.trip.budget as f64, state.retry_count, &exhausted);

	if let Some(feedback) = &result.feedback {
		let category = category_for_action(feedback.action);
		if !exhausted.contains(&category) {
			exhausted.push(category);
		}
		apply_all(
			state,
			vec![StateUpdate::MergeMeta(serde_json::Map::from_iter([(
				"budget_exhausted_categories".to_string(),
				serde_json::json!(exhausted),
			)]))],
		);
	}

	apply_all(state, vec![StateUpdate::BudgetResult(result)]);
	checkpointer.save(thread_id, parent, state).await
}

/// Categories a prior budget-critic pass already targeted this run, so a
/// retry rotates to the next-largest reducible category instead of
/// re-proposing the same cut (spec: retries "rotate to the next-largest to
/// avoid loops"). Tracked in `PlannerState::meta` since it isn't one of the
/// typed leaf fields the reducer otherwise merges.
fn exhausted_budget_categories(state: &PlannerState) -> Vec<String> {
	state
		.meta
		.get("budget_exhausted_categories")
		.and_then(|v| v.as_array())
		.map(|arr| arr.iter().filter_map(|v| v.as_str().map(String::from)).collect())
		.unwrap_or_default()
}

fn category_for_action(action: crate::agent::models::budget::BudgetAction) -> String {
	use crate::agent::models::budget::BudgetAction;
	match action {
		BudgetAction::DowngradeHotel => "accommodation",
		BudgetAction::ReduceAttractions => "attractions",
		BudgetAction::CheaperTransport => "transport",
		BudgetAction::AdjustMeals => "dining",
	}
	.to_string()
}

async fn run_finalize_node(
	state: &mut PlannerState,
	checkpointer: &dyn Checkpointer,
	thread_id: &str,
	parent: Option<uuid::Uuid>,
) -> Result<uuid::Uuid, String> {
	let final_itinerary = finalizer::finalize(
		&state.trip,
		state.draft_itinerary.as_ref().unwrap_or(&DraftItinerary::default()),
		state.accommodation.as_ref().unwrap_or(&default_accommodation()),
		state.transport.as_ref().unwrap_or(&default_transport()),
		state.dining.as_ref().unwrap_or(&default_dining()),
	);
	apply_all(state, vec![StateUpdate::FinalItinerary(final_itinerary)]);
	checkpointer.save(thread_id, parent, state).await
}

fn default_accommodation() -> crate::agent::models::resource::AccommodationResult {
	crate::agent::models::resource::AccommodationResult {
		recommendations: vec![],
		selected: crate::agent::models::resource::HotelRecommendation {
			name: "Unassigned".to_string(),
			location: None,
			price_per_night: 0.0,
			tier: crate::agent::models::resource::PriceTier::Standard,
			rating: None,
			vendor_poi_id: None,
		},
		total_cost: 0.0,
		centroid: None,
	}
}

fn default_transport() -> crate::agent::models::resource::TransportResult {
	crate::agent::models::resource::TransportResult {
		segments: vec![],
		total_cost: 0.0,
		total_distance_meters: 0.0,
		recommended_modes: vec![],
	}
}

fn default_dining() -> crate::agent::models::resource::DiningResult {
	crate::agent::models::resource::DiningResult { recommendations: vec![], total_cost: 0.0 }
}

/// Fallback forecast for when `MapAdapter::weather_forecast` has no product
/// wired up for the transport in use (e.g. direct-HTTP, which has none).
/// Produces mild, rain-free days so the rule-based fallback in
/// `WeatherReport` degrades to `outdoor_friendly` rather than making up
/// alarming conditions.
fn synthesize_forecast(trip: &TripInput) -> Vec<DailyForecast> {
	let start_date = NaiveDate::parse_from_str(&trip.start_date, "%Y-%m-%d").ok();
	(0..trip.day_count().max(1))
		.map(|i| {
			let date = start_date
				.map(|d| (d + chrono::Duration::days(i)).format("%Y-%m-%d").to_string())
				.unwrap_or_else(|| trip.start_date.clone());
			DailyForecast {
				date,
				day_weather: "Sunny".to_string(),
				night_weather: "Clear".to_string(),
				day_temp_c: 22.0,
				night_temp_c: 14.0,
				wind_kph: 10.0,
			}
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn exhausted_categories_round_trip_through_meta() {
		let mut state = PlannerState::new(TripInput {
			origin: None,
			destination: "Test".to_string(),
			start_date: "2025-12-01".to_string(),
			end_date: "2025-12-02".to_string(),
			start_time: None,
			end_time: None,
			budget: 1000,
			traveler_count: 2,
			adult_count: 2,
			child_count: 0,
			preferences: vec![],
			hotel_preferences: vec![],
			notes: vec![],
		});
		assert!(exhausted_budget_categories(&state).is_empty());
		apply_all(
			&mut state,
			vec![StateUpdate::MergeMeta(serde_json::Map::from_iter([(
				"budget_exhausted_categories".to_string(),
				serde_json::json!(["accommodation"]),
			)]))],
		);
		assert_eq!(exhausted_budget_categories(&state), vec!["accommodation".to_string()]);
	}

	#[test]
	fn category_for_action_matches_budget_categories() {
		use crate::agent::models::budget::BudgetAction;
		assert_eq!(category_for_action(BudgetAction::DowngradeHotel), "accommodation");
		assert_eq!(category_for_action(BudgetAction::ReduceAttractions), "attractions");
		assert_eq!(category_for_action(BudgetAction::CheaperTransport), "transport");
		assert_eq!(category_for_action(BudgetAction::AdjustMeals), "dining");
	}
}
