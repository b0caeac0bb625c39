/*
 * src/agent/agents/attraction.rs
 *
 * Attraction enricher: takes the map adapter's raw POI results for a draft
 * day's attraction slots and fills in the details a traveler actually needs
 * (price, hours, tips). Ticket prices are estimated from a keyword table
 * when the vendor doesn't supply one, since most free-tier place lookups
 * don't return pricing. When the LLM is configured, its description/tips/
 * opening-hours merge over the heuristic pass, but vendor identifiers,
 * photos, and ratings always come from the heuristic pass, never the LLM.
 */

use langchain_rust::language_models::llm::LLM;

use crate::agent::map_adapter::{MapAdapter, PoiResult};
use crate::agent::models::itinerary::EnrichedAttraction;

use super::llm::invoke_json;

const PROMPT_TEMPLATE: &str = include_str!("../prompts/attraction.md");

/// Free: parks, squares, streets. Checked first since "theme park" and
/// "water park" both contain "park" but price much higher.
const FREE_KEYWORDS: &[&str] = &["park", "square", "plaza", "street"];
/// Theme parks price highest of the three bands.
const THEME_PARK_KEYWORDS: &[&str] = &["theme park", "disneyland", "universal studio", "legoland", "six flags", "water park"];
/// A closed set of world-famous sight categories, priced at 150.
const WORLD_FAMOUS_KEYWORDS: &[&str] =
	&["museum", "palace", "temple", "tower", "castle", "cathedral", "monument", "shrine", "basilica", "zoo", "aquarium"];
const FALLBACK_PRICE: f64 = 60.0;

fn estimate_ticket_price(name: &str, types: &[String]) -> f64 {
	let haystack = format!("{} {}", name.to_lowercase(), types.join(" ").to_lowercase());
	if THEME_PARK_KEYWORDS.iter().any(|k| haystack.contains(k)) {
		300.0
	} else if WORLD_FAMOUS_KEYWORDS.iter().any(|k| haystack.contains(k)) {
		150.0
	} else if FREE_KEYWORDS.iter().any(|k| haystack.contains(k)) {
		0.0
	} else {
		FALLBACK_PRICE
	}
}

#[derive(serde::Deserialize, Default)]
struct LlmEnrichment {
	#[serde(default)]
	description: Option<String>,
	#[serde(default)]
	tips: Option<String>,
	#[serde(default)]
	opening_hours: Option<String>,
}

pub async fn enrich(llm: &dyn LLM, map_adapter: &MapAdapter, poi: &PoiResult) -> EnrichedAttraction {
	let detail = map_adapter.poi_detail(&poi.vendor_poi_id).await;
	let poi = detail.as_ref().unwrap_or(poi);

	let mut enriched = EnrichedAttraction {
		name: poi.name.clone(),
		location: poi.location,
		address: poi.address.clone(),
		ticket_price: Some(estimate_ticket_price(&poi.name, &poi.types)),
		opening_hours: None,
		rating: poi.rating,
		photos: Vec::new(),
		tel: None,
		description: None,
		recommended_duration_minutes: Some(90),
		tips: None,
		tags: poi.types.clone(),
		vendor_poi_id: Some(poi.vendor_poi_id.clone()),
		category: poi.types.first().cloned(),
	};

	let vendor_poi_id = enriched.vendor_poi_id.clone();
	let photos = enriched.photos.clone();
	let rating = enriched.rating;

	if let Some(llm_enrichment) = llm_enrich(llm, &enriched).await {
		if llm_enrichment.description.is_some() {
			enriched.description = llm_enrichment.description;
		}
		if llm_enrichment.tips.is_some() {
			enriched.tips = llm_enrichment.tips;
		}
		if llm_enrichment.opening_hours.is_some() {
			enriched.opening_hours = llm_enrichment.opening_hours;
		}
	}

	// LLM merge must never touch vendor-sourced identity fields.
	enriched.vendor_poi_id = vendor_poi_id;
	enriched.photos = photos;
	enriched.rating = rating;
	enriched
}

async fn llm_enrich(llm: &dyn LLM, heuristic: &EnrichedAttraction) -> Option<LlmEnrichment> {
	let prompt = format!(
		"{template}\n\nName: {name}\nTags: {tags}\nAddress: {address}",
		template = PROMPT_TEMPLATE,
		name = heuristic.name,
		tags = heuristic.tags.join(", "),
		address = heuristic.address.clone().unwrap_or_default(),
	);
	invoke_json::<LlmEnrichment>(llm, &prompt).await
}

/// Minimum spacing between upstream enrichment calls, to avoid tripping
/// the vendor's rate limiter on a long attraction list.
const ENRICHMENT_RATE_LIMIT: std::time::Duration = std::time::Duration::from_millis(200);

pub async fn enrich_all(llm: &dyn LLM, map_adapter: &MapAdapter, pois: &[PoiResult]) -> Vec<EnrichedAttraction> {
	let mut out = Vec::with_capacity(pois.len());
	for (i, poi) in pois.iter().enumerate() {
		if i > 0 {
			tokio::time::sleep(ENRICHMENT_RATE_LIMIT).await;
		}
		out.push(enrich(llm, map_adapter, poi).await);
	}
	out
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn keyword_match_is_case_insensitive() {
		assert_eq!(estimate_ticket_price("National Museum", &[]), 150.0);
		assert_eq!(estimate_ticket_price("Central Park", &["park".to_string()]), 0.0);
		assert_eq!(estimate_ticket_price("Unnamed Spot", &[]), 60.0);
	}

	#[test]
	fn theme_parks_price_above_world_famous_sites() {
		assert_eq!(estimate_ticket_price("Universal Studios Theme Park", &[]), 300.0);
	}
}
