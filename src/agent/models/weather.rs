use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum StrategyTag {
	IndoorPriority,
	OutdoorFriendly,
	RainPrepared,
	ColdWeather,
	HotWeather,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DailyForecast {
	/// ISO date
	pub date: String,
	pub day_weather: String,
	pub night_weather: String,
	pub day_temp_c: f64,
	pub night_temp_c: f64,
	pub wind_kph: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WeatherReport {
	pub forecasts: Vec<DailyForecast>,
	pub strategy_tags: Vec<StrategyTag>,
	pub clothing_advice: String,
	#[serde(default)]
	pub warnings: Vec<String>,
}

impl WeatherReport {
	/// Rule-based fallback used when the LLM is unavailable or its JSON
	/// fails to parse: rain implies indoor_priority + rain_prepared, a hot
	/// day max implies hot_weather, a cold night min implies cold_weather,
	/// otherwise outdoor_friendly.
	pub fn analyze_rule_based(forecasts: Vec<DailyForecast>) -> Self {
		let mut tags = Vec::new();
		let mut warnings = Vec::new();

		let is_rainy = forecasts
			.iter()
			.any(|f| f.day_weather.to_lowercase().contains("rain") || f.night_weather.to_lowercase().contains("rain"));
		let max_day = forecasts.iter().map(|f| f.day_temp_c).fold(f64::MIN, f64::max);
		let min_night = forecasts.iter().map(|f| f.night_temp_c).fold(f64::MAX, f64::min);

		if is_rainy {
			tags.push(StrategyTag::IndoorPriority);
			tags.push(StrategyTag::RainPrepared);
			warnings.push("Rain expected during the trip; pack accordingly.".to_string());
		}
		if forecasts.iter().any(|f| f.day_temp_c.is_finite()) && max_day > 30.0 {
			tags.push(StrategyTag::HotWeather);
		}
		if forecasts.iter().any(|f| f.night_temp_c.is_finite()) && min_night < 10.0 {
			tags.push(StrategyTag::ColdWeather);
		}
		if tags.is_empty() {
			tags.push(StrategyTag::OutdoorFriendly);
		}

		let clothing_advice = if tags.contains(&StrategyTag::ColdWeather) {
			"Bring warm layers for cool evenings.".to_string()
		} else if tags.contains(&StrategyTag::HotWeather) {
			"Light, breathable clothing and sun protection recommended.".to_string()
		} else {
			"Pack for mild, variable conditions.".to_string()
		};

		WeatherReport {
			forecasts,
			strategy_tags: tags,
			clothing_advice,
			warnings,
		}
	}
}
