/*
 * src/agent/chat/modification.rs
 *
 * Two-phase modification protocol: `prepare` computes a `ModificationPreview`
 * and caches the post-change itinerary against it without touching the
 * saved itinerary; `confirm` looks the preview up by id, applies any
 * requested time tweaks, deletes the entry, and hands back the result for
 * the caller to persist; `cancel` deletes it without applying anything. A
 * background sweep evicts previews nobody confirmed or cancelled within
 * their TTL.
 */

use std::sync::Mutex;
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::agent::models::itinerary::FinalItinerary;
use crate::agent::models::modification::{CachedModification, ModificationImpact, ModificationPreview, ModificationStatus, TimeAdjustment};
use crate::global::MODIFICATION_TTL_SECS;

struct TimedEntry {
	modification: CachedModification,
	inserted_at: Instant,
}

#[derive(Default)]
pub struct ModificationCache {
	entries: DashMap<String, TimedEntry>,
	last_sweep: Mutex<Option<Instant>>,
}

impl ModificationCache {
	pub fn new() -> Self {
		ModificationCache::default()
	}

	pub fn insert(&self, preview: ModificationPreview, after: FinalItinerary) {
		let id = preview.id.clone();
		self.entries.insert(
			id,
			TimedEntry {
				modification: CachedModification { preview, after },
				inserted_at: Instant::now(),
			},
		);
	}

	pub fn get(&self, id: &str) -> Option<CachedModification> {
		self.entries.get(id).map(|e| e.modification.clone())
	}

	/// Marks a preview confirmed, applies any requested time tweaks, deletes
	/// the cache entry, and returns the itinerary it resolved to. `None` if
	/// it's missing, expired, or already resolved.
	pub fn confirm(&self, id: &str, user_adjustments: &[TimeAdjustment]) -> Option<FinalItinerary> {
		let mut entry = self.entries.remove(id)?.1;
		if Instant::now().duration_since(entry.inserted_at) >= Duration::from_secs(MODIFICATION_TTL_SECS) {
			return None;
		}
		entry.modification.preview.transition(ModificationStatus::Confirmed).ok()?;
		let mut itinerary = entry.modification.after;
		apply_time_adjustments(&mut itinerary, user_adjustments);
		Some(itinerary)
	}

	/// Deletes the cache entry, failing if it's missing or already resolved.
	pub fn cancel(&self, id: &str) -> bool {
		match self.entries.remove(id) {
			Some((_, mut entry)) => entry.modification.preview.transition(ModificationStatus::Cancelled).is_ok(),
			None => false,
		}
	}

	/// Drops entries older than their TTL. Intended to run off a periodic
	/// `tokio::time::interval` at `MODIFICATION_SWEEP_INTERVAL_SECS`.
	pub fn sweep(&self) -> usize {
		let now = Instant::now();
		*self.last_sweep.lock().unwrap() = Some(now);
		let expired: Vec<String> = self
			.entries
			.iter()
			.filter(|e| now.duration_since(e.inserted_at) >= Duration::from_secs(MODIFICATION_TTL_SECS))
			.map(|e| e.key().clone())
			.collect();
		let count = expired.len();
		for id in expired {
			self.entries.remove(&id);
		}
		count
	}
}

/// Moves named activities to their requested new times, matched by
/// `day_index` + activity name. Adjustments naming an activity that isn't
/// in the itinerary are silently skipped.
fn apply_time_adjustments(itinerary: &mut FinalItinerary, adjustments: &[TimeAdjustment]) {
	for adj in adjustments {
		let Some(day) = itinerary.days.iter_mut().find(|d| d.day_index == adj.day_index) else { continue };
		if let Some(activity) = day.activities.iter_mut().find(|a| a.name == adj.activity_name) {
			activity.time = adj.new_time.clone();
		}
	}
}

pub fn impact_from_costs(before_total: f64, after_total: f64, affected_days: Vec<u32>) -> ModificationImpact {
	ModificationImpact {
		affected_days,
		cost_delta: after_total - before_total,
		time_impact: "unchanged".to_string(),
		warnings: Vec::new(),
	}
}
