/*
 * src/agent/graph/checkpoint.rs
 *
 * Checkpoint persistence for the orchestration graph. A checkpoint is a
 * full `PlannerState` snapshot taken after each node runs, tagged with a
 * thread id (one per chat session/planning run) so a HITL interrupt can
 * suspend a run and a later request can resume it from exactly where it
 * left off.
 */

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use sqlx::PgPool;
use uuid::Uuid;

use crate::agent::models::state::PlannerState;

#[derive(Debug, Clone)]
pub struct Checkpoint {
	pub id: Uuid,
	pub thread_id: String,
	pub parent_id: Option<Uuid>,
	pub state: PlannerState,
	pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait Checkpointer: Send + Sync {
	async fn save(&self, thread_id: &str, parent_id: Option<Uuid>, state: &PlannerState) -> Result<Uuid, String>;
	async fn latest(&self, thread_id: &str) -> Result<Option<Checkpoint>, String>;
	async fn cleanup_old(&self, thread_id: &str, keep: usize) -> Result<u64, String>;
	/// Global sweep across every thread: drops checkpoints older than
	/// `days_to_keep` days. Intended for a periodic background task rather
	/// than the per-thread `cleanup_old` a single run calls after resuming.
	async fn cleanup_old_checkpoints(&self, days_to_keep: i64) -> Result<u64, String>;
}

/// In-process checkpoint store, keyed by thread id, newest last. Used in
/// tests and whenever `CHECKPOINTER_KIND` isn't set to `postgres`.
#[derive(Default)]
pub struct MemorySaver {
	threads: DashMap<String, Vec<Checkpoint>>,
}

impl MemorySaver {
	pub fn new() -> Self {
		MemorySaver::default()
	}
}

#[async_trait]
impl Checkpointer for MemorySaver {
	async fn save(&self, thread_id: &str, parent_id: Option<Uuid>, state: &PlannerState) -> Result<Uuid, String> {
		let id = Uuid::new_v4();
		let checkpoint = Checkpoint {
			id,
			thread_id: thread_id.to_string(),
			parent_id,
			state: state.clone(),
			created_at: Utc::now(),
		};
		self.threads.entry(thread_id.to_string()).or_default().push(checkpoint);
		Ok(id)
	}

	async fn latest(&self, thread_id: &str) -> Result<Option<Checkpoint>, String> {
		Ok(self.threads.get(thread_id).and_then(|v| v.last().cloned()))
	}

	async fn cleanup_old(&self, thread_id: &str, keep: usize) -> Result<u64, String> {
		let mut removed = 0u64;
		if let Some(mut entry) = self.threads.get_mut(thread_id) {
			let len = entry.len();
			if len > keep {
				removed = (len - keep) as u64;
				entry.drain(0..(len - keep));
			}
		}
		Ok(removed)
	}

	async fn cleanup_old_checkpoints(&self, days_to_keep: i64) -> Result<u64, String> {
		let cutoff = Utc::now() - chrono::Duration::days(days_to_keep);
		let mut removed = 0u64;
		for mut entry in self.threads.iter_mut() {
			let before = entry.len();
			entry.retain(|c| c.created_at >= cutoff);
			removed += (before - entry.len()) as u64;
		}
		Ok(removed)
	}
}

/// Backs `graph_checkpoints`. Used when `CHECKPOINTER_KIND=postgres`, so an
/// interrupted run survives a server restart.
pub struct PostgresSaver {
	pool: PgPool,
}

impl PostgresSaver {
	pub fn new(pool: PgPool) -> Self {
		PostgresSaver { pool }
	}
}

#[async_trait]
impl Checkpointer for PostgresSaver {
	async fn save(&self, thread_id: &str, parent_id: Option<Uuid>, state: &PlannerState) -> Result<Uuid, String> {
		let id = Uuid::new_v4();
		let state_json = serde_json::to_value(state).map_err(|e| e.to_string())?;
		sqlx::query!(
			"INSERT INTO graph_checkpoints (id, thread_id, parent_id, state) VALUES ($1, $2, $3, $4)",
			id,
			thread_id,
			parent_id,
			state_json,
		)
		.execute(&self.pool)
		.await
		.map_err(|e| e.to_string())?;
		Ok(id)
	}

	async fn latest(&self, thread_id: &str) -> Result<Option<Checkpoint>, String> {
		let row = sqlx::query!(
			"SELECT id, thread_id, parent_id, state, created_at FROM graph_checkpoints \
			 WHERE thread_id = $1 ORDER BY created_at DESC LIMIT 1",
			thread_id,
		)
		.fetch_optional(&self.pool)
		.await
		.map_err(|e| e.to_string())?;

		match row {
			Some(row) => {
				let state: PlannerState = serde_json::from_value(row.state).map_err(|e| e.to_string())?;
				Ok(Some(Checkpoint {
					id: row.id,
					thread_id: row.thread_id,
					parent_id: row.parent_id,
					state,
					created_at: row.created_at,
				}))
			}
			None => Ok(None),
		}
	}

	async fn cleanup_old(&self, thread_id: &str, keep: usize) -> Result<u64, String> {
		let result = sqlx::query!(
			"DELETE FROM graph_checkpoints WHERE id IN ( \
				SELECT id FROM graph_checkpoints WHERE thread_id = $1 \
				ORDER BY created_at DESC OFFSET $2 \
			)",
			thread_id,
			keep as i64,
		)
		.execute(&self.pool)
		.await
		.map_err(|e| e.to_string())?;
		Ok(result.rows_affected())
	}

	async fn cleanup_old_checkpoints(&self, days_to_keep: i64) -> Result<u64, String> {
		let result = sqlx::query!(
			"DELETE FROM graph_checkpoints WHERE created_at < NOW() - make_interval(days => $1)",
			days_to_keep as i32,
		)
		.execute(&self.pool)
		.await
		.map_err(|e| e.to_string())?;
		Ok(result.rows_affected())
	}
}
