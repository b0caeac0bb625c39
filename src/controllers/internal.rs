/*
 * src/controllers/internal.rs
 *
 * Debug-only routes for poking at process-internal state during local
 * development. Compiled out of release and test builds entirely.
 */

#![cfg(all(not(test), debug_assertions))]

use axum::{Extension, Json, routing::get};
use std::sync::Arc;

use crate::agent::cache::CacheStats;
use crate::agent::runtime::AgentRuntime;
use crate::controllers::AxumRouter;

async fn api_cache_stats(Extension(runtime): Extension<Arc<AgentRuntime>>) -> Json<CacheStats> {
	Json(runtime.map_adapter.cache_stats())
}

pub fn internal_routes() -> AxumRouter {
	AxumRouter::new().route("/cache-stats", get(api_cache_stats))
}
