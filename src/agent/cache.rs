/*
 * src/agent/cache.rs
 *
 * Tool-result cache shared by the map adapter's geocode/search/route calls.
 * Keys are content-addressed so identical params always hit, regardless of
 * call order; entries expire per cache-type TTL and the whole cache evicts
 * oldest-first once it reaches its size cap.
 */

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheType {
	Weather,
	PoiSearch,
	NearbySearch,
	PoiDetail,
	Geocode,
	Distance,
	Route,
}

impl CacheType {
	pub fn ttl(self) -> Duration {
		match self {
			CacheType::Weather => Duration::from_secs(30 * 60),
			CacheType::PoiSearch | CacheType::NearbySearch => Duration::from_secs(6 * 60 * 60),
			CacheType::PoiDetail | CacheType::Geocode | CacheType::Distance => Duration::from_secs(24 * 60 * 60),
			CacheType::Route => Duration::from_secs(2 * 60 * 60),
		}
	}

	fn prefix(self) -> &'static str {
		match self {
			CacheType::Weather => "weather",
			CacheType::PoiSearch => "poi_search",
			CacheType::NearbySearch => "nearby_search",
			CacheType::PoiDetail => "poi_detail",
			CacheType::Geocode => "geocode",
			CacheType::Distance => "distance",
			CacheType::Route => "route",
		}
	}
}

struct Entry {
	value: String,
	inserted_at: Instant,
	ttl: Duration,
}

impl Entry {
	fn is_expired(&self, now: Instant) -> bool {
		now.duration_since(self.inserted_at) >= self.ttl
	}
}

#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct CacheStats {
	pub hits: u64,
	pub misses: u64,
	pub evictions: u64,
	pub size: usize,
	/// `hits / (hits + misses)`, rounded to 2 decimals; `0.0` with no
	/// lookups yet.
	pub hit_rate: f64,
}

/// md5-hash-based cache, keyed on `"<cache_type>:<first 12 hex chars of
/// md5(canonical JSON params)>"`. FIFO eviction once `max_size` is reached.
pub struct ToolCache {
	max_size: usize,
	entries: DashMap<String, Entry>,
	insertion_order: Mutex<VecDeque<String>>,
	stats: Mutex<CacheStats>,
}

impl ToolCache {
	pub fn new(max_size: usize) -> Self {
		ToolCache {
			max_size,
			entries: DashMap::new(),
			insertion_order: Mutex::new(VecDeque::new()),
			stats: Mutex::new(CacheStats::default()),
		}
	}

	pub fn key_for<P: Serialize>(cache_type: CacheType, params: &P) -> String {
		let canonical = serde_json::to_value(params)
			.ok()
			.and_then(|v| serde_json::to_string(&canonicalize(&v)).ok())
			.unwrap_or_default();
		let digest = format!("{:x}", md5::compute(canonical.as_bytes()));
		format!("{}:{}", cache_type.prefix(), &digest[..12])
	}

	pub fn get(&self, key: &str) -> Option<String> {
		let now = Instant::now();
		let expired = self.entries.get(key).map(|entry| entry.is_expired(now));
		let hit = match expired {
			Some(false) => self.entries.get(key).map(|entry| entry.value.clone()),
			Some(true) => {
				self.entries.remove(key);
				self.insertion_order.lock().unwrap().retain(|k| k != key);
				None
			}
			None => None,
		};

		let mut stats = self.stats.lock().unwrap();
		if hit.is_some() {
			stats.hits += 1;
		} else {
			stats.misses += 1;
			if expired == Some(true) {
				stats.evictions += 1;
			}
		}
		hit
	}

	pub fn put(&self, key: String, value: String, cache_type: CacheType) {
		if !self.entries.contains_key(&key) {
			let mut order = self.insertion_order.lock().unwrap();
			order.push_back(key.clone());
			while order.len() > self.max_size {
				if let Some(evicted) = order.pop_front() {
					self.entries.remove(&evicted);
					self.stats.lock().unwrap().evictions += 1;
				}
			}
		}
		self.entries.insert(
			key,
			Entry {
				value,
				inserted_at: Instant::now(),
				ttl: cache_type.ttl(),
			},
		);
	}

	pub fn stats(&self) -> CacheStats {
		let mut stats = *self.stats.lock().unwrap();
		stats.size = self.entries.len();
		let total = stats.hits + stats.misses;
		stats.hit_rate = if total == 0 { 0.0 } else { (stats.hits as f64 / total as f64 * 100.0).round() / 100.0 };
		stats
	}
}

/// Recursively sorts object keys so two semantically identical param sets
/// serialize to the same string regardless of field insertion order.
fn canonicalize(value: &serde_json::Value) -> serde_json::Value {
	match value {
		serde_json::Value::Object(map) => {
			let mut entries: Vec<_> = map.iter().map(|(k, v)| (k.clone(), canonicalize(v))).collect();
			entries.sort_by(|a, b| a.0.cmp(&b.0));
			serde_json::Value::Object(entries.into_iter().collect())
		}
		serde_json::Value::Array(arr) => serde_json::Value::Array(arr.iter().map(canonicalize).collect()),
		other => other.clone(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn key_is_order_independent() {
		let a = json!({"lat": 1.0, "lng": 2.0});
		let b = json!({"lng": 2.0, "lat": 1.0});
		assert_eq!(
			ToolCache::key_for(CacheType::Geocode, &a),
			ToolCache::key_for(CacheType::Geocode, &b)
		);
	}

	#[test]
	fn eviction_is_fifo_at_capacity() {
		let cache = ToolCache::new(2);
		cache.put("a".into(), "1".into(), CacheType::Geocode);
		cache.put("b".into(), "2".into(), CacheType::Geocode);
		cache.put("c".into(), "3".into(), CacheType::Geocode);
		assert!(cache.get("a").is_none());
		assert!(cache.get("b").is_some());
		assert!(cache.get("c").is_some());
		assert_eq!(cache.stats().evictions, 1);
	}

	#[test]
	fn expired_entry_is_evicted_on_miss_and_frees_its_slot() {
		let cache = ToolCache::new(1);
		cache.entries.insert(
			"stale".to_string(),
			Entry { value: "old".into(), inserted_at: Instant::now() - Duration::from_secs(60), ttl: Duration::from_secs(1) },
		);
		cache.insertion_order.lock().unwrap().push_back("stale".to_string());

		assert!(cache.get("stale").is_none());
		assert!(!cache.entries.contains_key("stale"));
		assert_eq!(cache.stats().evictions, 1);

		// The slot freed up: a fresh insert at capacity 1 shouldn't evict it.
		cache.put("fresh".into(), "new".into(), CacheType::Geocode);
		assert_eq!(cache.get("fresh"), Some("new".to_string()));
		assert_eq!(cache.stats().evictions, 1);
	}

	#[test]
	fn stats_report_size_and_rounded_hit_rate() {
		let cache = ToolCache::new(10);
		cache.put("a".into(), "1".into(), CacheType::Geocode);
		cache.get("a");
		cache.get("a");
		cache.get("missing");

		let stats = cache.stats();
		assert_eq!(stats.size, 1);
		assert_eq!(stats.hit_rate, 0.67);
	}
}
