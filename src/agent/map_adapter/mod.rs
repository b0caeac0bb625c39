/*
 * src/agent/map_adapter/mod.rs
 *
 * MapAdapter: the single facade every specialist agent and tool uses to
 * reach external geospatial/weather providers. Wraps a transport behind a
 * tool-result cache and a connection-state machine so callers never touch
 * `google_maps`/HTTP directly.
 */

pub mod transport;

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use tracing::{info, warn};

use crate::agent::cache::{CacheType, ToolCache};
use crate::agent::models::geo::LatLng;
use crate::agent::models::weather::DailyForecast;
use crate::agent::settings::{AgentSettings, MapTransportKind};
use crate::tool_trace;

pub use transport::{MapTransport, PoiResult, RouteLeg};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
	Disconnected,
	Connecting,
	Connected,
	Reconnecting,
	Error,
}

impl From<u8> for ConnectionState {
	fn from(v: u8) -> Self {
		match v {
			1 => ConnectionState::Connecting,
			2 => ConnectionState::Connected,
			3 => ConnectionState::Reconnecting,
			4 => ConnectionState::Error,
			_ => ConnectionState::Disconnected,
		}
	}
}

impl From<ConnectionState> for u8 {
	fn from(s: ConnectionState) -> u8 {
		match s {
			ConnectionState::Disconnected => 0,
			ConnectionState::Connecting => 1,
			ConnectionState::Connected => 2,
			ConnectionState::Reconnecting => 3,
			ConnectionState::Error => 4,
		}
	}
}

const DEFAULT_RPC_ENDPOINT: &str = "http://127.0.0.1:8787/rpc";

pub struct MapAdapter {
	transport: RwLock<Arc<dyn MapTransport>>,
	/// The untried alternate transport `connect()` swaps in if the primary
	/// exhausts its retries. Taken (set to `None`) the moment it's used.
	fallback_transport: Mutex<Option<Arc<dyn MapTransport>>>,
	cache: ToolCache,
	state: AtomicU8,
	reconnect_attempts: AtomicU32,
	connect_timeout: Duration,
	auto_reconnect: bool,
	reconnect_interval: Duration,
	max_reconnect_attempts: u32,
	/// Set once `connect()` actually swaps from the primary transport to
	/// the fallback candidate after the primary failed to connect.
	fallback: AtomicBool,
}

impl MapAdapter {
	/// Builds a transport from settings. Default policy (spec): attempt
	/// tool-RPC first, falling through to direct-HTTP only if tool-RPC
	/// fails to connect. Explicitly requesting `MAP_ADAPTER_TRANSPORT=http`
	/// inverts that: direct-HTTP primary, tool-RPC as the fallback
	/// candidate, falling back immediately (construction can't be retried
	/// the way a live connect can) only if no API key is configured or the
	/// HTTP client fails to construct.
	pub fn from_settings(settings: &AgentSettings) -> Self {
		let rpc_endpoint = std::env::var("MAP_ADAPTER_RPC_ENDPOINT").unwrap_or_else(|_| DEFAULT_RPC_ENDPOINT.to_string());

		let (transport, fallback_transport, fallback): (Arc<dyn MapTransport>, Option<Arc<dyn MapTransport>>, bool) = match settings.map_transport {
			MapTransportKind::ToolRpc => {
				let rpc: Arc<dyn MapTransport> = Arc::new(transport::ToolRpcTransport::new(rpc_endpoint));
				let http = settings.google_maps_api_key.as_ref().and_then(|key| transport::HttpTransport::new(key.clone()).ok());
				(rpc, http.map(|t| Arc::new(t) as Arc<dyn MapTransport>), false)
			}
			MapTransportKind::Http => match &settings.google_maps_api_key {
				Some(key) => match transport::HttpTransport::new(key.clone()) {
					Ok(t) => (Arc::new(t), Some(Arc::new(transport::ToolRpcTransport::new(rpc_endpoint)) as Arc<dyn MapTransport>), false),
					Err(e) => {
						warn!(target: "map_adapter", error = %e, "falling back to RPC transport");
						(Arc::new(transport::ToolRpcTransport::new(rpc_endpoint)), None, true)
					}
				},
				None => {
					warn!(target: "map_adapter", "no Google Maps API key configured, RPC transport will be used");
					(Arc::new(transport::ToolRpcTransport::new(rpc_endpoint)), None, true)
				}
			},
		};

		MapAdapter {
			transport: RwLock::new(transport),
			fallback_transport: Mutex::new(fallback_transport),
			cache: ToolCache::new(500),
			state: AtomicU8::new(ConnectionState::Disconnected.into()),
			reconnect_attempts: AtomicU32::new(0),
			connect_timeout: Duration::from_secs(settings.connect_timeout_secs),
			auto_reconnect: settings.auto_reconnect,
			reconnect_interval: Duration::from_secs(settings.reconnect_interval_secs),
			max_reconnect_attempts: settings.max_reconnect_attempts,
			fallback: AtomicBool::new(fallback),
		}
	}

	/// True if the adapter is (or fell through to, during `connect()`) a
	/// transport other than the one `MAP_ADAPTER_TRANSPORT` requested.
	pub fn used_fallback(&self) -> bool {
		self.fallback.load(Ordering::Relaxed)
	}

	fn current_transport(&self) -> Arc<dyn MapTransport> {
		self.transport.read().unwrap().clone()
	}

	/// Establishes the adapter's session. Direct-HTTP has no real handshake
	/// and connects instantly; the tool-RPC transport is probed with a
	/// `geocode` no-op bounded by `connect_timeout`, retried up to
	/// `max_reconnect_attempts` times (when `auto_reconnect` is set). If the
	/// primary transport exhausts its retries and a fallback candidate was
	/// recorded at construction, the adapter swaps to it, marks
	/// `used_fallback`, and retries once more before settling into
	/// `ConnectionState::Error`. Idempotent: a call while already connected
	/// is a no-op.
	pub async fn connect(&self) -> Result<(), String> {
		if self.state() == ConnectionState::Connected {
			return Ok(());
		}
		self.set_state(ConnectionState::Connecting);

		match self.try_connect_current().await {
			Ok(()) => Ok(()),
			Err(primary_err) => {
				let Some(fallback_transport) = self.fallback_transport.lock().unwrap().take() else {
					self.set_state(ConnectionState::Error);
					return Err(primary_err);
				};
				warn!(target: "map_adapter", error = %primary_err, "primary transport exhausted retries, falling back");
				*self.transport.write().unwrap() = fallback_transport;
				self.fallback.store(true, Ordering::Relaxed);
				self.reconnect_attempts.store(0, Ordering::Relaxed);
				self.set_state(ConnectionState::Reconnecting);
				self.try_connect_current().await.map_err(|fallback_err| {
					self.set_state(ConnectionState::Error);
					format!("{primary_err}; fallback transport also failed: {fallback_err}")
				})
			}
		}
	}

	/// Probes `self.current_transport()`, retrying per `auto_reconnect`.
	async fn try_connect_current(&self) -> Result<(), String> {
		let transport = self.current_transport();
		let mut attempt = 0u32;
		loop {
			match tokio::time::timeout(self.connect_timeout, transport.geocode("probe")).await {
				Ok(_) => {
					self.reconnect_attempts.store(0, Ordering::Relaxed);
					self.set_state(ConnectionState::Connected);
					tool_trace!("map_adapter", "connect", "ok");
					return Ok(());
				}
				Err(_) => {
					attempt += 1;
					self.reconnect_attempts.store(attempt, Ordering::Relaxed);
					if !self.auto_reconnect || attempt >= self.max_reconnect_attempts {
						tool_trace!("map_adapter", "connect", "error", format!("gave up after {attempt} attempts"));
						return Err(format!("failed to connect after {attempt} attempts"));
					}
					self.set_state(ConnectionState::Reconnecting);
					tool_trace!("map_adapter", "connect", "retrying", format!("attempt {attempt}"));
					tokio::time::sleep(self.reconnect_interval).await;
				}
			}
		}
	}

	/// Idempotent: disconnecting an already-disconnected adapter is a no-op.
	pub fn disconnect(&self) {
		self.reconnect_attempts.store(0, Ordering::Relaxed);
		self.set_state(ConnectionState::Disconnected);
	}

	pub fn state(&self) -> ConnectionState {
		ConnectionState::from(self.state.load(Ordering::Relaxed))
	}

	fn set_state(&self, s: ConnectionState) {
		self.state.store(s.into(), Ordering::Relaxed);
	}

	pub async fn geocode(&self, address: &str) -> Option<LatLng> {
		let key = ToolCache::key_for(CacheType::Geocode, &address);
		if let Some(cached) = self.cache.get(&key) {
			return serde_json::from_str(&cached).ok();
		}
		self.set_state(ConnectionState::Connecting);
		let result = self.current_transport().geocode(address).await;
		self.set_state(if result.is_some() {
			ConnectionState::Connected
		} else {
			ConnectionState::Error
		});
		if let Some(ref latlng) = result {
			if let Ok(serialized) = serde_json::to_string(latlng) {
				self.cache.put(key, serialized, CacheType::Geocode);
			}
		}
		result
	}

	pub async fn nearby_search(&self, center: LatLng, radius_meters: f64, keyword: &str) -> Vec<PoiResult> {
		let key = ToolCache::key_for(CacheType::NearbySearch, &(center.lat, center.lng, radius_meters, keyword));
		if let Some(cached) = self.cache.get(&key) {
			return serde_json::from_str(&cached).unwrap_or_default();
		}
		let results = self.current_transport().nearby_search(center, radius_meters, keyword).await;
		info!(target: "map_adapter", count = results.len(), "nearby_search completed");
		if let Ok(serialized) = serde_json::to_string(&results) {
			self.cache.put(key, serialized, CacheType::NearbySearch);
		}
		results
	}

	pub async fn poi_detail(&self, vendor_poi_id: &str) -> Option<PoiResult> {
		let key = ToolCache::key_for(CacheType::PoiDetail, &vendor_poi_id);
		if let Some(cached) = self.cache.get(&key) {
			return serde_json::from_str(&cached).ok();
		}
		let result = self.current_transport().poi_detail(vendor_poi_id).await;
		if let Some(ref poi) = result {
			if let Ok(serialized) = serde_json::to_string(poi) {
				self.cache.put(key, serialized, CacheType::PoiDetail);
			}
		}
		result
	}

	pub async fn distance(&self, from: LatLng, to: LatLng, mode: &str) -> Option<RouteLeg> {
		let key = ToolCache::key_for(CacheType::Distance, &(from.lat, from.lng, to.lat, to.lng, mode));
		if let Some(cached) = self.cache.get(&key) {
			return serde_json::from_str(&cached).ok();
		}
		let result = self.current_transport().distance(from, to, mode).await;
		if let Some(ref leg) = result {
			if let Ok(serialized) = serde_json::to_string(leg) {
				self.cache.put(key, serialized, CacheType::Distance);
			}
		}
		result
	}

	pub async fn route(&self, waypoints: &[LatLng], mode: &str) -> Vec<RouteLeg> {
		let key = ToolCache::key_for(CacheType::Route, &(waypoints, mode));
		if let Some(cached) = self.cache.get(&key) {
			return serde_json::from_str(&cached).unwrap_or_default();
		}
		let results = self.current_transport().route(waypoints, mode).await;
		if let Ok(serialized) = serde_json::to_string(&results) {
			self.cache.put(key, serialized, CacheType::Route);
		}
		results
	}

	pub async fn reverse_geocode(&self, point: LatLng) -> Option<String> {
		let key = ToolCache::key_for(CacheType::Geocode, &(point.lat, point.lng));
		if let Some(cached) = self.cache.get(&key) {
			return serde_json::from_str(&cached).ok();
		}
		let result = self.current_transport().reverse_geocode(point).await;
		tool_trace!("map_adapter", "reverse_geocode", if result.is_some() { "hit" } else { "miss" });
		if let Some(ref address) = result {
			if let Ok(serialized) = serde_json::to_string(address) {
				self.cache.put(key, serialized, CacheType::Geocode);
			}
		}
		result
	}

	/// City-scoped POI search by keyword/type (`searchPOI` in the spec,
	/// distinct from the coordinate-anchored `nearby_search`).
	pub async fn poi_search(&self, city: &str, keywords: &str, poi_type: Option<&str>, limit: usize) -> Vec<PoiResult> {
		let key = ToolCache::key_for(CacheType::PoiSearch, &(city, keywords, poi_type, limit));
		if let Some(cached) = self.cache.get(&key) {
			return serde_json::from_str(&cached).unwrap_or_default();
		}
		let results = self.current_transport().poi_search(city, keywords, poi_type, limit).await;
		tool_trace!("map_adapter", "poi_search", "ok", format!("{} results", results.len()));
		if let Ok(serialized) = serde_json::to_string(&results) {
			self.cache.put(key, serialized, CacheType::PoiSearch);
		}
		results
	}

	pub async fn weather_forecast(&self, city: &str) -> Vec<DailyForecast> {
		let key = ToolCache::key_for(CacheType::Weather, &city);
		if let Some(cached) = self.cache.get(&key) {
			return serde_json::from_str(&cached).unwrap_or_default();
		}
		let results = self.current_transport().weather_forecast(city).await;
		tool_trace!("map_adapter", "weather_forecast", if results.is_empty() { "empty" } else { "ok" });
		if let Ok(serialized) = serde_json::to_string(&results) {
			self.cache.put(key, serialized, CacheType::Weather);
		}
		results
	}

	pub fn cache_stats(&self) -> crate::agent::cache::CacheStats {
		self.cache.stats()
	}
}
