/*
 * src/agent/runtime.rs
 *
 * Process-wide handles the chat controller needs: the map adapter, the
 * configured LLM, the checkpointer backing the orchestration graph, and
 * the in-memory modification cache. Built once at boot and shared behind
 * an `Extension<Arc<AgentRuntime>>`, mirroring how `PgPool`/cookie `Key`
 * are threaded through the rest of the app.
 */

use std::env;
use std::sync::Arc;

use langchain_rust::language_models::llm::LLM;
use sqlx::PgPool;

use crate::agent::agents::llm::build_llm;
use crate::agent::chat::modification::ModificationCache;
use crate::agent::graph::checkpoint::{Checkpointer, MemorySaver, PostgresSaver};
use crate::agent::map_adapter::MapAdapter;
use crate::agent::settings::AgentSettings;

pub struct AgentRuntime {
	pub map_adapter: MapAdapter,
	pub llm: Arc<dyn LLM>,
	pub checkpointer: Arc<dyn Checkpointer>,
	pub modification_cache: ModificationCache,
	/// Whether a fresh run should suspend for `itinerary_review` before
	/// fanning out to the resource agents.
	pub hitl_itinerary_review: bool,
}

impl AgentRuntime {
	pub fn new(pool: PgPool) -> Self {
		let settings = AgentSettings::load();
		let checkpointer: Arc<dyn Checkpointer> = match env::var("CHECKPOINTER_KIND").as_deref() {
			Ok("postgres") => Arc::new(PostgresSaver::new(pool)),
			_ => Arc::new(MemorySaver::new()),
		};

		AgentRuntime {
			map_adapter: MapAdapter::from_settings(settings),
			llm: build_llm(settings),
			checkpointer,
			modification_cache: ModificationCache::new(),
			hitl_itinerary_review: settings.hitl_itinerary_review,
		}
	}
}
