/*
 * src/agent/agents/weather.rs
 *
 * Weather agent: turns a day-by-day forecast into strategy tags and
 * clothing advice. The LLM is asked to reason about edge cases (mixed
 * rain/sun days, rapid temperature swings) the rule-based fallback can't
 * capture; if it's unavailable or returns unparseable JSON, the rule-based
 * analysis in the data model still produces a usable report.
 */

use langchain_rust::language_models::llm::LLM;

use crate::agent::models::trip::TripInput;
use crate::agent::models::weather::{DailyForecast, WeatherReport};

use super::llm::invoke_json;

const PROMPT_TEMPLATE: &str = include_str!("../prompts/weather.md");

pub async fn run(llm: &dyn LLM, trip: &TripInput, forecasts: Vec<DailyForecast>) -> WeatherReport {
	let prompt = format!(
		"{template}\n\nTrip destination: {destination}\nForecast: {forecast_json}",
		template = PROMPT_TEMPLATE,
		destination = trip.destination,
		forecast_json = serde_json::to_string(&forecasts).unwrap_or_default(),
	);

	if let Some(parsed) = invoke_json::<LlmWeatherResponse>(llm, &prompt).await {
		return WeatherReport {
			forecasts,
			strategy_tags: parsed.strategy_tags,
			clothing_advice: parsed.clothing_advice,
			warnings: parsed.warnings,
		};
	}

	WeatherReport::analyze_rule_based(forecasts)
}

#[derive(serde::Deserialize)]
struct LlmWeatherResponse {
	strategy_tags: Vec<crate::agent::models::weather::StrategyTag>,
	clothing_advice: String,
	#[serde(default)]
	warnings: Vec<String>,
}
