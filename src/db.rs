/*
 * src/db.rs
 *
 * Purpose:
 *   Own the Postgres connection pool used by account/chat-session/itinerary
 *   persistence and, when `CHECKPOINTER_KIND=postgres`, the orchestration
 *   graph's checkpoint store.
 */

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::env;

/// Build the connection pool from `DATABASE_URL` and run pending migrations.
///
/// Panics if `DATABASE_URL` is unset or the pool cannot be established; this
/// mirrors the teacher's boot-time `.expect()` style for required
/// configuration (`main.rs`'s `API_BASE_URL`/`FRONTEND_URL`/`BIND_ADDRESS`
/// reads) rather than deferring to a runtime error path no caller could act
/// on.
pub async fn create_pool() -> PgPool {
	let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

	let pool = PgPoolOptions::new()
		.max_connections(10)
		.connect(&database_url)
		.await
		.expect("failed to connect to database");

	sqlx::migrate!("./migrations")
		.run(&pool)
		.await
		.expect("failed to run database migrations");

	pool
}
