pub const LOG_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/logs");
pub const CRASH_LOG: &str = "crash.log";
pub const LATEST_LOG: &str = "latest.log";
pub const DIST_DIR: &str = "frontend/dist";
pub const MESSAGE_PAGE_LEN: i32 = 10;

pub const GOOGLE_MAPS_API_KEY: &str = "GOOGLE_MAPS_API_KEY";
pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";

/// Max tool-calling rounds in one chat turn before the loop is cut off and
/// the partial result returned with a `max_rounds_exceeded` notice.
pub const MAX_TOOL_ROUNDS: u32 = 8;

/// How long a prepared-but-unconfirmed itinerary modification stays valid.
pub const MODIFICATION_TTL_SECS: u64 = 600;

/// Sweep interval for expiring stale modification-cache entries.
pub const MODIFICATION_SWEEP_INTERVAL_SECS: u64 = 60;

/// How long a graph checkpoint is kept around before the daily sweep drops it.
pub const CHECKPOINT_RETENTION_DAYS: i64 = 30;

/// How often the checkpoint-retention sweep runs.
pub const CHECKPOINT_SWEEP_INTERVAL_SECS: u64 = 86_400;