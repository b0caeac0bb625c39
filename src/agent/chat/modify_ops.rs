/*
 * src/agent/chat/modify_ops.rs
 *
 * Applies one `ModificationOperation` to a deep copy of a `FinalItinerary`,
 * producing the `ModificationChange` list `prepare_itinerary_modification`
 * caches alongside the after-state. Every function here is a pure
 * `(&mut FinalItinerary, &Value) -> Result<Vec<ModificationChange>, String>`
 * transform; impact assessment (cost delta, warnings) happens one level up
 * in `tools.rs` once the after-state is known.
 */

use langchain_rust::language_models::llm::LLM;
use serde_json::Value;

use crate::agent::agents::llm::invoke_json;
use crate::agent::geo::tsp::{compute_route, EndpointMode, Pt};
use crate::agent::models::itinerary::{FinalAccommodation, FinalActivity, FinalDay, FinalItinerary};
use crate::agent::models::modification::{ChangeKind, ModificationChange, ModificationOperation};

const SLACK_MINUTES: i64 = 30;
const DEFAULT_ACTIVITY_MINUTES: i64 = 120;

pub async fn apply(
	op: ModificationOperation,
	current: &FinalItinerary,
	params: &Value,
	llm: &dyn LLM,
) -> Result<(FinalItinerary, Vec<ModificationChange>), String> {
	let mut after = current.clone();
	let changes = match op {
		ModificationOperation::AddAttraction => add_attraction(&mut after, params)?,
		ModificationOperation::RemoveAttraction => remove_attraction(&mut after, params)?,
		ModificationOperation::ReorderAttraction => reorder_attraction(&mut after, params)?,
		ModificationOperation::UpdateAttraction => update_attraction(&mut after, params)?,
		ModificationOperation::ChangeTime => change_time(&mut after, params)?,
		ModificationOperation::AddDay => add_day(&mut after, params),
		ModificationOperation::RemoveDay => remove_day(&mut after, params)?,
		ModificationOperation::ChangeHotel => change_hotel(&mut after, params)?,
		ModificationOperation::ChangeRestaurant => change_restaurant(&mut after, params)?,
		ModificationOperation::OptimizeRoute => optimize_route(&mut after, params)?,
		ModificationOperation::ReplanDay => replan_day(&mut after, params, llm).await?,
		ModificationOperation::AdjustForWeather => adjust_for_weather(&mut after, params, llm).await?,
	};
	Ok((after, changes))
}

fn day_index(params: &Value) -> Result<usize, String> {
	params.get("day_index").and_then(|v| v.as_u64()).map(|v| v as usize).ok_or_else(|| "missing day_index".to_string())
}

fn day_mut(it: &mut FinalItinerary, day_index: usize) -> Result<&mut FinalDay, String> {
	it.days.get_mut(day_index.saturating_sub(1)).ok_or_else(|| format!("no such day {day_index}"))
}

fn renumber(it: &mut FinalItinerary) {
	for (i, d) in it.days.iter_mut().enumerate() {
		d.day_index = (i + 1) as u32;
	}
}

fn add_attraction(it: &mut FinalItinerary, params: &Value) -> Result<Vec<ModificationChange>, String> {
	let di = day_index(params)?;
	let activity: FinalActivity =
		serde_json::from_value(params.get("activity").cloned().ok_or("missing activity")?).map_err(|e| e.to_string())?;
	let day = day_mut(it, di)?;
	day.activities.push(activity.clone());
	Ok(vec![ModificationChange {
		kind: ChangeKind::Add,
		day_index: di as u32,
		item_kind: "attraction".to_string(),
		description: format!("Added {} to day {di}", activity.name),
		before: None,
		after: serde_json::to_value(&activity).ok(),
	}])
}

fn remove_attraction(it: &mut FinalItinerary, params: &Value) -> Result<Vec<ModificationChange>, String> {
	let di = day_index(params)?;
	let idx = params.get("index").and_then(|v| v.as_u64()).ok_or("missing index")? as usize;
	let day = day_mut(it, di)?;
	if idx >= day.activities.len() {
		return Err(format!("no activity at index {idx} on day {di}"));
	}
	let removed = day.activities.remove(idx);
	Ok(vec![ModificationChange {
		kind: ChangeKind::Remove,
		day_index: di as u32,
		item_kind: "attraction".to_string(),
		description: format!("Removed {} from day {di}", removed.name),
		before: serde_json::to_value(&removed).ok(),
		after: None,
	}])
}

fn reorder_attraction(it: &mut FinalItinerary, params: &Value) -> Result<Vec<ModificationChange>, String> {
	let di = day_index(params)?;
	let from = params.get("from").and_then(|v| v.as_u64()).ok_or("missing from")? as usize;
	let to = params.get("to").and_then(|v| v.as_u64()).ok_or("missing to")? as usize;
	let day = day_mut(it, di)?;
	if from >= day.activities.len() || to >= day.activities.len() {
		return Err("reorder index out of range".to_string());
	}
	let moved = day.activities.remove(from);
	day.activities.insert(to, moved.clone());
	Ok(vec![ModificationChange {
		kind: ChangeKind::Reorder,
		day_index: di as u32,
		item_kind: "attraction".to_string(),
		description: format!("Moved {} from slot {from} to {to} on day {di}", moved.name),
		before: None,
		after: serde_json::to_value(&moved).ok(),
	}])
}

fn update_attraction(it: &mut FinalItinerary, params: &Value) -> Result<Vec<ModificationChange>, String> {
	let di = day_index(params)?;
	let idx = params.get("index").and_then(|v| v.as_u64()).ok_or("missing index")? as usize;
	let activity: FinalActivity =
		serde_json::from_value(params.get("activity").cloned().ok_or("missing activity")?).map_err(|e| e.to_string())?;
	let day = day_mut(it, di)?;
	if idx >= day.activities.len() {
		return Err(format!("no activity at index {idx} on day {di}"));
	}
	let before = day.activities[idx].clone();
	day.activities[idx] = activity.clone();
	Ok(vec![ModificationChange {
		kind: ChangeKind::Modify,
		day_index: di as u32,
		item_kind: "attraction".to_string(),
		description: format!("Updated {} on day {di}", activity.name),
		before: serde_json::to_value(&before).ok(),
		after: serde_json::to_value(&activity).ok(),
	}])
}

fn change_time(it: &mut FinalItinerary, params: &Value) -> Result<Vec<ModificationChange>, String> {
	let di = day_index(params)?;
	let idx = params.get("index").and_then(|v| v.as_u64()).ok_or("missing index")? as usize;
	let time = params.get("time").and_then(|v| v.as_str()).ok_or("missing time")?.to_string();
	let day = day_mut(it, di)?;
	if idx >= day.activities.len() {
		return Err(format!("no activity at index {idx} on day {di}"));
	}
	let before = day.activities[idx].time.clone();
	day.activities[idx].time = time.clone();
	Ok(vec![ModificationChange {
		kind: ChangeKind::Modify,
		day_index: di as u32,
		item_kind: "attraction".to_string(),
		description: format!("Changed time on day {di} from {before} to {time}"),
		before: Some(Value::String(before)),
		after: Some(Value::String(time)),
	}])
}

fn add_day(it: &mut FinalItinerary, params: &Value) -> Vec<ModificationChange> {
	let after_day_index = params.get("after_day_index").and_then(|v| v.as_u64()).unwrap_or(it.days.len() as u64) as usize;
	let date = params.get("date").and_then(|v| v.as_str()).unwrap_or("").to_string();
	let new_day = FinalDay { day_index: 0, date: date.clone(), activities: vec![], meals: vec![] };
	let insert_at = after_day_index.min(it.days.len());
	it.days.insert(insert_at, new_day);
	renumber(it);
	vec![ModificationChange {
		kind: ChangeKind::Add,
		day_index: (insert_at + 1) as u32,
		item_kind: "day".to_string(),
		description: format!("Added a new day ({date}) at position {}", insert_at + 1),
		before: None,
		after: None,
	}]
}

fn remove_day(it: &mut FinalItinerary, params: &Value) -> Result<Vec<ModificationChange>, String> {
	let di = day_index(params)?;
	if di == 0 || di > it.days.len() {
		return Err(format!("no such day {di}"));
	}
	let removed = it.days.remove(di - 1);
	renumber(it);
	Ok(vec![ModificationChange {
		kind: ChangeKind::Remove,
		day_index: di as u32,
		item_kind: "day".to_string(),
		description: format!("Removed day {di} ({})", removed.date),
		before: None,
		after: None,
	}])
}

fn change_hotel(it: &mut FinalItinerary, params: &Value) -> Result<Vec<ModificationChange>, String> {
	let name = params.get("name").and_then(|v| v.as_str()).ok_or("missing name")?.to_string();
	let price_per_night = params.get("price_per_night").and_then(|v| v.as_f64()).ok_or("missing price_per_night")?;
	let before = it.accommodation.first().cloned();
	let nights = params.get("nights").and_then(|v| v.as_i64()).unwrap_or_else(|| before.as_ref().map(|a| a.nights).unwrap_or(1));
	let updated = FinalAccommodation {
		name: name.clone(),
		location: before.as_ref().and_then(|a| a.location),
		price_per_night,
		nights,
		total_cost: price_per_night * nights as f64,
	};
	if it.accommodation.is_empty() {
		it.accommodation.push(updated.clone());
	} else {
		it.accommodation[0] = updated.clone();
	}
	Ok(vec![ModificationChange {
		kind: ChangeKind::Modify,
		day_index: 0,
		item_kind: "hotel".to_string(),
		description: format!("Changed hotel to {name}"),
		before: before.and_then(|b| serde_json::to_value(&b).ok()),
		after: serde_json::to_value(&updated).ok(),
	}])
}

fn change_restaurant(it: &mut FinalItinerary, params: &Value) -> Result<Vec<ModificationChange>, String> {
	let di = day_index(params)?;
	let meal_index = params.get("meal_index").and_then(|v| v.as_u64()).ok_or("missing meal_index")? as usize;
	let name = params.get("name").and_then(|v| v.as_str()).ok_or("missing name")?.to_string();
	let price = params.get("price").and_then(|v| v.as_f64()).unwrap_or(0.0);
	let day = day_mut(it, di)?;
	if meal_index >= day.meals.len() {
		return Err(format!("no meal at index {meal_index} on day {di}"));
	}
	let before = day.meals[meal_index].clone();
	day.meals[meal_index].name = name.clone();
	day.meals[meal_index].price = price;
	let after = day.meals[meal_index].clone();
	Ok(vec![ModificationChange {
		kind: ChangeKind::Modify,
		day_index: di as u32,
		item_kind: "restaurant".to_string(),
		description: format!("Changed day {di} {:?} to {name}", before.meal_type),
		before: serde_json::to_value(&before).ok(),
		after: serde_json::to_value(&after).ok(),
	}])
}

/// Nearest-neighbor + 2-opt over the day's attraction coordinates, then
/// redistributes start times from the day's original first time with a
/// fixed `DEFAULT_ACTIVITY_MINUTES` duration and `SLACK_MINUTES` of slack
/// between stops.
fn optimize_route(it: &mut FinalItinerary, params: &Value) -> Result<Vec<ModificationChange>, String> {
	let di = day_index(params)?;
	let day = day_mut(it, di)?;
	if day.activities.len() < 2 {
		return Ok(vec![]);
	}
	if day.activities.iter().any(|a| a.location.is_none()) {
		return Err("optimize_route needs coordinates for every activity on this day".to_string());
	}

	let start_time = day.activities.first().map(|a| a.time.clone()).unwrap_or_else(|| "09:00".to_string());
	let names: Vec<String> = day.activities.iter().map(|a| a.name.clone()).collect();
	let points: Vec<Pt> = day
		.activities
		.iter()
		.enumerate()
		.map(|(i, a)| {
			let loc = a.location.expect("checked above");
			Pt { id: Some(names[i].as_str()), lat: loc.lat, lng: loc.lng }
		})
		.collect();

	let order = compute_route(&points, EndpointMode::Path);
	let before_order = names.clone();
	let mut reordered: Vec<FinalActivity> = order.iter().map(|&i| day.activities[i].clone()).collect();

	let mut clock = parse_hhmm(&start_time).unwrap_or((9, 0));
	for activity in reordered.iter_mut() {
		activity.time = format!("{:02}:{:02}", clock.0, clock.1);
		clock = add_minutes(clock, DEFAULT_ACTIVITY_MINUTES + SLACK_MINUTES);
	}

	let after_order: Vec<String> = reordered.iter().map(|a| a.name.clone()).collect();
	day.activities = reordered;

	Ok(vec![ModificationChange {
		kind: ChangeKind::Reorder,
		day_index: di as u32,
		item_kind: "attraction".to_string(),
		description: format!("Optimized visiting order for day {di}"),
		before: serde_json::to_value(&before_order).ok(),
		after: serde_json::to_value(&after_order).ok(),
	}])
}

fn parse_hhmm(s: &str) -> Option<(i64, i64)> {
	let mut parts = s.split(':');
	let h = parts.next()?.parse().ok()?;
	let m = parts.next()?.parse().ok()?;
	Some((h, m))
}

fn add_minutes(t: (i64, i64), minutes: i64) -> (i64, i64) {
	let total = t.0 * 60 + t.1 + minutes;
	((total.div_euclid(60)).rem_euclid(24), total.rem_euclid(60))
}

/// LLM-driven regeneration of one day under `{keep_attractions,
/// exclude_attractions, preferences, budget_adjustment, reason}`; falls
/// back to dropping excluded attractions in place if the model can't be
/// reached or returns something unparseable.
async fn replan_day(it: &mut FinalItinerary, params: &Value, llm: &dyn LLM) -> Result<Vec<ModificationChange>, String> {
	let di = day_index(params)?;
	let keep = string_array(params, "keep_attractions");
	let exclude = string_array(params, "exclude_attractions");
	let preferences = string_array(params, "preferences");
	let reason = params.get("reason").and_then(|v| v.as_str()).unwrap_or("traveler requested a replan").to_string();

	let day = day_mut(it, di)?;
	let before = day.activities.clone();

	let prompt = format!(
		"Replan day {di} of a trip itinerary. Keep these attractions if present: {keep:?}. \
		 Exclude these entirely: {exclude:?}. Traveler preferences: {preferences:?}. Reason: {reason}. \
		 Current activities: {before:?}. Respond with only a JSON array of activities, each shaped \
		 {{\"time\",\"name\",\"activity_type\",\"location\",\"duration\",\"description\",\"ticket_price\"}}."
	);

	let regenerated: Option<Vec<FinalActivity>> = invoke_json(llm, &prompt).await;
	let new_activities = match regenerated {
		Some(acts) if !acts.is_empty() => acts,
		_ => before.iter().filter(|a| !exclude.contains(&a.name)).cloned().collect(),
	};

	let day = day_mut(it, di)?;
	day.activities = new_activities.clone();

	Ok(vec![ModificationChange {
		kind: ChangeKind::Modify,
		day_index: di as u32,
		item_kind: "day".to_string(),
		description: format!("Replanned day {di}: {reason}"),
		before: serde_json::to_value(&before).ok(),
		after: serde_json::to_value(&new_activities).ok(),
	}])
}

/// Classifies the day as indoor/outdoor/mixed via `params.strategy`
/// (computed upstream from the weather report) and, when `strategy ==
/// "indoor"`, asks the model to swap out activities whose `activity_type`
/// names an outdoor pursuit.
async fn adjust_for_weather(it: &mut FinalItinerary, params: &Value, llm: &dyn LLM) -> Result<Vec<ModificationChange>, String> {
	let di = day_index(params)?;
	let strategy = params.get("strategy").and_then(|v| v.as_str()).unwrap_or("mixed").to_string();
	let day = day_mut(it, di)?;
	let before = day.activities.clone();

	if strategy != "indoor" {
		return Ok(vec![ModificationChange {
			kind: ChangeKind::Modify,
			day_index: di as u32,
			item_kind: "day".to_string(),
			description: format!("Day {di} weather classified as {strategy}; no changes needed"),
			before: None,
			after: None,
		}]);
	}

	let outdoor_names: Vec<String> =
		before.iter().filter(|a| a.activity_type.to_lowercase().contains("outdoor")).map(|a| a.name.clone()).collect();
	if outdoor_names.is_empty() {
		return Ok(vec![]);
	}

	let prompt = format!(
		"Day {di}'s forecast calls for indoor activities. Replace these outdoor activities: {outdoor_names:?}. \
		 Current activities: {before:?}. Respond with only a JSON array of replacement activities, one per \
		 replaced activity, same shape as the inputs."
	);
	let replacements: Option<Vec<FinalActivity>> = invoke_json(llm, &prompt).await;

	let day = day_mut(it, di)?;
	if let Some(replacements) = replacements {
		let mut replacement_iter = replacements.into_iter();
		for activity in day.activities.iter_mut() {
			if outdoor_names.contains(&activity.name) {
				if let Some(replacement) = replacement_iter.next() {
					*activity = replacement;
				}
			}
		}
	}
	let after = day.activities.clone();

	Ok(vec![ModificationChange {
		kind: ChangeKind::Modify,
		day_index: di as u32,
		item_kind: "day".to_string(),
		description: format!("Swapped outdoor activities for indoor alternatives on day {di}"),
		before: serde_json::to_value(&before).ok(),
		after: serde_json::to_value(&after).ok(),
	}])
}

fn string_array(params: &Value, key: &str) -> Vec<String> {
	params.get(key).and_then(|v| v.as_array()).map(|a| a.iter().filter_map(|v| v.as_str().map(str::to_string)).collect()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::agent::models::itinerary::CostBreakdown;
	use crate::agent::models::itinerary::FinalTransportation;

	fn sample() -> FinalItinerary {
		FinalItinerary {
			destination: "Kyoto".to_string(),
			days: vec![FinalDay {
				day_index: 1,
				date: "2026-04-01".to_string(),
				activities: vec![
					FinalActivity {
						time: "09:00".to_string(),
						name: "Fushimi Inari".to_string(),
						activity_type: "outdoor".to_string(),
						location: Some(crate::agent::models::geo::LatLng { lat: 34.9671, lng: 135.7727 }),
						duration: "2 hours".to_string(),
						description: "shrine".to_string(),
						ticket_price: 0.0,
					},
					FinalActivity {
						time: "13:00".to_string(),
						name: "Kinkaku-ji".to_string(),
						activity_type: "outdoor".to_string(),
						location: Some(crate::agent::models::geo::LatLng { lat: 35.0394, lng: 135.7292 }),
						duration: "2 hours".to_string(),
						description: "temple".to_string(),
						ticket_price: 500.0,
					},
				],
				meals: vec![],
			}],
			accommodation: vec![],
			transportation: FinalTransportation {
				to_destination: String::new(),
				from_destination: String::new(),
				local_methods: vec![],
				estimated_local_cost: 0.0,
			},
			cost: CostBreakdown::default(),
			summary: String::new(),
		}
	}

	#[test]
	fn rejects_declared_but_unsupported_operations() {
		assert!(ModificationOperation::parse("split_day").is_err());
		assert!(ModificationOperation::parse("merge_days").is_err());
		assert!(ModificationOperation::parse("regenerate_trip_segment").is_err());
	}

	#[test]
	fn parses_every_supported_operation() {
		for name in [
			"add_attraction",
			"remove_attraction",
			"reorder_attraction",
			"update_attraction",
			"change_time",
			"add_day",
			"remove_day",
			"change_hotel",
			"change_restaurant",
			"optimize_route",
			"replan_day",
			"adjust_for_weather",
		] {
			assert!(ModificationOperation::parse(name).is_ok(), "expected {name} to parse");
		}
	}

	#[tokio::test]
	async fn optimize_route_keeps_every_activity_and_adds_slack() {
		let it = sample();
		let (after, changes) = apply(ModificationOperation::OptimizeRoute, &it, &serde_json::json!({ "day_index": 1 }), &crate::agent::configs::mock::MockLLM)
			.await
			.unwrap();
		assert_eq!(after.days[0].activities.len(), 2);
		assert_eq!(changes.len(), 1);
		assert_eq!(changes[0].kind, ChangeKind::Reorder);
	}

	#[tokio::test]
	async fn remove_day_renumbers_remaining_days() {
		let mut it = sample();
		it.days.push(FinalDay { day_index: 2, date: "2026-04-02".to_string(), activities: vec![], meals: vec![] });
		let (after, _) = apply(ModificationOperation::RemoveDay, &it, &serde_json::json!({ "day_index": 1 }), &crate::agent::configs::mock::MockLLM)
			.await
			.unwrap();
		assert_eq!(after.days.len(), 1);
		assert_eq!(after.days[0].day_index, 1);
	}
}
