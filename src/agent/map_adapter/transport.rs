use async_trait::async_trait;
use num_traits::ToPrimitive;
use serde_json::Value;
use tracing::warn;

use crate::agent::models::geo::LatLng;
use crate::agent::models::weather::DailyForecast;

/// A place or business returned by search/detail calls. Deliberately
/// provider-agnostic: both transports normalize into this shape so callers
/// never see Google/Amap-specific field names.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PoiResult {
	pub vendor_poi_id: String,
	pub name: String,
	pub location: Option<LatLng>,
	pub address: Option<String>,
	pub rating: Option<f64>,
	pub price_level: Option<i32>,
	pub types: Vec<String>,
	pub raw: Value,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RouteLeg {
	pub distance_meters: f64,
	pub duration_minutes: f64,
	pub mode: String,
}

/// The uniform transport contract the facade drives. Implementations never
/// propagate errors upward: a failed call returns an empty/null shape so a
/// single flaky provider call degrades gracefully instead of aborting the
/// whole planning run.
#[async_trait]
pub trait MapTransport: Send + Sync {
	async fn geocode(&self, address: &str) -> Option<LatLng>;
	/// Inverse of `geocode`: the formatted address nearest `point`, or
	/// `None` if the vendor can't resolve it.
	async fn reverse_geocode(&self, point: LatLng) -> Option<String>;
	async fn nearby_search(&self, center: LatLng, radius_meters: f64, keyword: &str) -> Vec<PoiResult>;
	/// City-scoped POI search by keyword/type, as used by the attraction
	/// enricher (spec calls this `searchPOI`, distinct from the
	/// coordinate-anchored `searchNearby`). `limit` caps the result count;
	/// the enricher calls this with `limit = 1`.
	async fn poi_search(&self, city: &str, keywords: &str, poi_type: Option<&str>, limit: usize) -> Vec<PoiResult>;
	async fn poi_detail(&self, vendor_poi_id: &str) -> Option<PoiResult>;
	async fn distance(&self, from: LatLng, to: LatLng, mode: &str) -> Option<RouteLeg>;
	async fn route(&self, waypoints: &[LatLng], mode: &str) -> Vec<RouteLeg>;
	/// Day-by-day forecast for `city`. Empty if the vendor has no weather
	/// product wired up for this transport; the weather agent's rule-based
	/// fallback still produces a usable report from an empty forecast list
	/// being treated as "no signal" upstream of this call.
	async fn weather_forecast(&self, city: &str) -> Vec<DailyForecast>;
}

/// Direct HTTPS calls via the `google_maps` client. This is the transport
/// used only when `MAP_ADAPTER_TRANSPORT=http` is set explicitly, or as the
/// fallback candidate `MapAdapter::connect()` swaps to if tool-RPC (the
/// default primary transport) fails to connect.
pub struct HttpTransport {
	client: google_maps::Client,
}

impl HttpTransport {
	pub fn new(api_key: String) -> Result<Self, String> {
		let client = google_maps::Client::try_new(api_key).map_err(|e| e.to_string())?;
		Ok(HttpTransport { client })
	}
}

#[async_trait]
impl MapTransport for HttpTransport {
	async fn geocode(&self, address: &str) -> Option<LatLng> {
		let res = self.client.geocoding().with_address(address).execute().await.ok()?;
		if !matches!(res.status, google_maps::geocoding::Status::Ok) {
			return None;
		}
		let first = res.results.into_iter().next()?;
		Some(LatLng {
			lat: first.geometry.location.lat.to_f64()?,
			lng: first.geometry.location.lng.to_f64()?,
		})
	}

	async fn reverse_geocode(&self, point: LatLng) -> Option<String> {
		// This client build only wires up the forward-geocoding and
		// nearby-search features (see Cargo.toml); reverse geocoding isn't
		// enabled on the vendor feature set this transport is compiled
		// with, so it degrades to the empty shape like any other
		// unsupported upstream call.
		warn!(target: "map_adapter", lat = point.lat, lng = point.lng, "reverse geocoding is not enabled on this transport");
		None
	}

	async fn poi_search(&self, city: &str, keywords: &str, poi_type: Option<&str>, limit: usize) -> Vec<PoiResult> {
		let Some(center) = self.geocode(city).await else {
			return Vec::new();
		};
		let keyword = match poi_type {
			Some(t) => format!("{} {}", keywords, t),
			None => keywords.to_string(),
		};
		let mut results = self.nearby_search(center, 10_000.0, &keyword).await;
		results.truncate(limit);
		results
	}

	async fn weather_forecast(&self, city: &str) -> Vec<DailyForecast> {
		warn!(target: "map_adapter", city = %city, "direct-HTTP transport has no weather product wired up, returning empty forecast");
		Vec::new()
	}

	async fn nearby_search(&self, center: LatLng, radius_meters: f64, _keyword: &str) -> Vec<PoiResult> {
		let Ok(builder) = self.client.nearby_search((center.lat, center.lng, radius_meters)) else {
			return Vec::new();
		};
		let Ok(res) = builder.execute().await else {
			return Vec::new();
		};
		if res.error().is_some() {
			return Vec::new();
		}
		res.places()
			.into_iter()
			.filter_map(|p| {
				Some(PoiResult {
					vendor_poi_id: p.id.clone().unwrap_or_default(),
					name: p.display_name.clone().map(|n| n.text).unwrap_or_default(),
					location: None,
					address: p.adr_format_address.clone(),
					rating: None,
					price_level: None,
					types: p.types.clone().unwrap_or_default(),
					raw: serde_json::to_value(p).unwrap_or(Value::Null),
				})
			})
			.collect()
	}

	async fn poi_detail(&self, _vendor_poi_id: &str) -> Option<PoiResult> {
		// Google's Places API fetches full detail as part of nearby/text
		// search in this client version; a dedicated detail call is not
		// wired up here.
		None
	}

	async fn distance(&self, from: LatLng, to: LatLng, mode: &str) -> Option<RouteLeg> {
		let meters = super::super::models::geo::haversine_meters(from, to);
		Some(RouteLeg {
			distance_meters: meters,
			duration_minutes: meters / 1000.0 / 30.0 * 60.0,
			mode: mode.to_string(),
		})
	}

	async fn route(&self, waypoints: &[LatLng], mode: &str) -> Vec<RouteLeg> {
		let mut legs = Vec::new();
		for pair in waypoints.windows(2) {
			if let Some(leg) = self.distance(pair[0], pair[1], mode).await {
				legs.push(leg);
			}
		}
		legs
	}
}

/// Persistent tool-RPC session transport (e.g. an MCP-style long-lived
/// subprocess). Talks JSON-RPC over a `reqwest` client pointed at a local
/// RPC endpoint rather than calling the vendor API directly per-request.
pub struct ToolRpcTransport {
	client: reqwest::Client,
	endpoint: String,
}

impl ToolRpcTransport {
	pub fn new(endpoint: String) -> Self {
		ToolRpcTransport {
			client: reqwest::Client::new(),
			endpoint,
		}
	}

	async fn call(&self, method: &str, params: Value) -> Option<Value> {
		let body = serde_json::json!({
			"jsonrpc": "2.0",
			"id": 1,
			"method": method,
			"params": params,
		});
		let resp = self.client.post(&self.endpoint).json(&body).send().await.ok()?;
		let parsed: Value = resp.json().await.ok()?;
		parsed.get("result").cloned()
	}
}

#[async_trait]
impl MapTransport for ToolRpcTransport {
	async fn geocode(&self, address: &str) -> Option<LatLng> {
		let result = self.call("geocode", serde_json::json!({ "address": address })).await?;
		serde_json::from_value(result).ok()
	}

	async fn reverse_geocode(&self, point: LatLng) -> Option<String> {
		let result = self.call("reverse_geocode", serde_json::json!({ "point": point })).await?;
		result.get("address").and_then(|v| v.as_str()).map(str::to_string)
	}

	async fn nearby_search(&self, center: LatLng, radius_meters: f64, keyword: &str) -> Vec<PoiResult> {
		let Some(result) = self
			.call(
				"nearby_search",
				serde_json::json!({ "center": center, "radius_meters": radius_meters, "keyword": keyword }),
			)
			.await
		else {
			return Vec::new();
		};
		serde_json::from_value(result).unwrap_or_default()
	}

	async fn poi_search(&self, city: &str, keywords: &str, poi_type: Option<&str>, limit: usize) -> Vec<PoiResult> {
		let Some(result) = self
			.call(
				"poi_search",
				serde_json::json!({ "city": city, "keywords": keywords, "type": poi_type, "limit": limit }),
			)
			.await
		else {
			return Vec::new();
		};
		let mut results: Vec<PoiResult> = serde_json::from_value(result).unwrap_or_default();
		results.truncate(limit);
		results
	}

	async fn weather_forecast(&self, city: &str) -> Vec<DailyForecast> {
		let Some(result) = self.call("get_weather_forecast", serde_json::json!({ "city": city })).await else {
			return Vec::new();
		};
		serde_json::from_value(result).unwrap_or_default()
	}

	async fn poi_detail(&self, vendor_poi_id: &str) -> Option<PoiResult> {
		let result = self.call("poi_detail", serde_json::json!({ "vendor_poi_id": vendor_poi_id })).await?;
		serde_json::from_value(result).ok()
	}

	async fn distance(&self, from: LatLng, to: LatLng, mode: &str) -> Option<RouteLeg> {
		let result = self.call("distance", serde_json::json!({ "from": from, "to": to, "mode": mode })).await?;
		serde_json::from_value(result).ok()
	}

	async fn route(&self, waypoints: &[LatLng], mode: &str) -> Vec<RouteLeg> {
		let Some(result) = self.call("route", serde_json::json!({ "waypoints": waypoints, "mode": mode })).await else {
			return Vec::new();
		};
		serde_json::from_value(result).unwrap_or_default()
	}
}
