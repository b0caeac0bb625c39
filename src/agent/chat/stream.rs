/*
 * src/agent/chat/stream.rs
 *
 * The SSE wire protocol for `ChatAgent`: the same bounded tool-calling loop
 * as `ChatAgent::handle_turn`, but emitted incrementally as `ChatStreamEvent`s
 * instead of settled into one `ChatTurnResult`. The non-streaming entry
 * point stays in `mod.rs` for callers (tests, the synchronous controller
 * handlers) that only want the final answer; this module is for the one
 * caller that needs to show its work as it happens.
 */

use langchain_rust::language_models::llm::LLM;
use tokio_stream::StreamExt;

use crate::agent::models::context::{ToolExecution, TripContextBlock};
use crate::global::MAX_TOOL_ROUNDS;

use super::tools::{ToolCall, ToolContext};
use super::{ChatAgent, ChatTurnResult, TurnResponse, parse_turn};

/// One SSE event in the chat stream. `timestamp_ms` is milliseconds since
/// the Unix epoch, set by the emitter at the moment the event is produced.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatStreamEvent {
	Start { session_id: String, message_id: String, timestamp_ms: i64 },
	Delta { content: String, timestamp_ms: i64 },
	ToolCall { id: String, name: String, arguments: serde_json::Value, timestamp_ms: i64 },
	ToolResult { id: String, result: serde_json::Value, error: Option<String>, timestamp_ms: i64 },
	End { content: String, timestamp_ms: i64 },
	Error { message: String, timestamp_ms: i64 },
}

fn now_ms() -> i64 {
	chrono::Utc::now().timestamp_millis()
}

impl<'a> ChatAgent<'a> {
	/// Runs the same tool-calling loop as `handle_turn`, streaming every
	/// token delta and tool-call/tool-result pair to `emit` as it happens.
	/// Returns the settled `ChatTurnResult` so the caller can still persist
	/// a message and detect `confirm_and_generate_trip`'s trigger sentinel,
	/// exactly as the non-streaming path does.
	pub async fn handle_turn_streaming<F>(&self, user_text: &str, context: Option<&TripContextBlock>, tool_ctx: &ToolContext<'_>, session_id: &str, message_id: &str, mut emit: F) -> ChatTurnResult
	where
		F: FnMut(ChatStreamEvent),
	{
		emit(ChatStreamEvent::Start { session_id: session_id.to_string(), message_id: message_id.to_string(), timestamp_ms: now_ms() });

		let mut transcript = self.build_system_prompt(context);
		transcript.push_str("\nUser: ");
		transcript.push_str(user_text);

		let mut executions = Vec::new();

		for round in 0..MAX_TOOL_ROUNDS {
			let raw = match self.stream_round(&transcript, &mut emit).await {
				Some(text) => text,
				None => {
					let reply = "Sorry, I couldn't reach the planning model just now.".to_string();
					emit(ChatStreamEvent::Error { message: reply.clone(), timestamp_ms: now_ms() });
					return ChatTurnResult { reply, tool_executions: executions, rounds_used: round, hit_round_cap: false };
				}
			};

			match parse_turn(&raw) {
				TurnResponse::Final(text) => {
					emit(ChatStreamEvent::End { content: text.clone(), timestamp_ms: now_ms() });
					return ChatTurnResult { reply: text, tool_executions: executions, rounds_used: round + 1, hit_round_cap: false };
				}
				TurnResponse::ToolCall(call) => {
					let call_id = uuid::Uuid::new_v4().to_string();
					emit(ChatStreamEvent::ToolCall { id: call_id.clone(), name: call.name().to_string(), arguments: call.args_value(), timestamp_ms: now_ms() });

					let execution: ToolExecution = call.dispatch(tool_ctx).await;
					emit(ChatStreamEvent::ToolResult {
						id: call_id,
						result: execution.output.clone(),
						error: if execution.success { None } else { Some("tool reported failure".to_string()) },
						timestamp_ms: now_ms(),
					});

					transcript.push_str(&format!("\nTool `{}` result: {}\n", execution.tool_name, serde_json::to_string(&execution.output).unwrap_or_default()));
					executions.push(execution);
				}
				TurnResponse::Unparsed(text) => {
					emit(ChatStreamEvent::End { content: text.clone(), timestamp_ms: now_ms() });
					return ChatTurnResult { reply: text, tool_executions: executions, rounds_used: round + 1, hit_round_cap: false };
				}
			}
		}

		let reply = "I've done as much as I can automatically for this turn; let me know how you'd like to continue.".to_string();
		emit(ChatStreamEvent::End { content: reply.clone(), timestamp_ms: now_ms() });
		ChatTurnResult { reply, tool_executions: executions, rounds_used: MAX_TOOL_ROUNDS, hit_round_cap: true }
	}

	/// Drives one round of `LLM::stream`, forwarding every text chunk as a
	/// `Delta` event and accumulating the full response for `parse_turn`.
	/// `langchain_rust`'s `StreamData` carries the model's own tool-call
	/// deltas as opaque JSON in provider-specific builds; this crate's tool
	/// protocol is a JSON envelope inside the text itself (see `parse_turn`),
	/// so only the text content needs reassembling here.
	async fn stream_round<F>(&self, transcript: &str, emit: &mut F) -> Option<String>
	where
		F: FnMut(ChatStreamEvent),
	{
		let messages = vec![langchain_rust::schemas::Message::new_human_message(transcript)];
		let mut chunks = self.llm.stream(&messages).await.ok()?;

		let mut full = String::new();
		while let Some(item) = chunks.next().await {
			let Ok(data) = item else { continue };
			let piece = data.content;
			if piece.is_empty() {
				continue;
			}
			full.push_str(&piece);
			emit(ChatStreamEvent::Delta { content: piece, timestamp_ms: now_ms() });
		}

		if full.is_empty() { None } else { Some(full) }
	}
}

impl ToolCall {
	/// The tool-call's arguments rendered as the bare JSON object the SSE
	/// `tool_call` event carries, without the `{"tool": ..., "args": ...}`
	/// envelope `to_input_value` uses for the transcript.
	pub(crate) fn args_value(&self) -> serde_json::Value {
		self.to_input_value().get("args").cloned().unwrap_or(serde_json::Value::Null)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::agent::chat::modification::ModificationCache;
	use crate::agent::configs::mock::MockLLM;
	use crate::agent::graph::checkpoint::MemorySaver;
	use crate::agent::map_adapter::MapAdapter;
	use crate::agent::settings::AgentSettings;

	#[tokio::test]
	async fn streaming_turn_emits_start_delta_and_end() {
		let llm = MockLLM;
		let map_adapter = MapAdapter::from_settings(AgentSettings::load());
		let checkpointer = MemorySaver::new();
		let modification_cache = ModificationCache::new();
		let tool_ctx = ToolContext { map_adapter: &map_adapter, llm: &llm, checkpointer: &checkpointer, modification_cache: &modification_cache };

		let agent = ChatAgent::new(&llm);
		let mut events = Vec::new();
		let result = agent.handle_turn_streaming("hello", None, &tool_ctx, "session-1", "message-1", |event| events.push(event)).await;

		assert!(!result.reply.is_empty());
		assert!(matches!(events.first(), Some(ChatStreamEvent::Start { .. })));
		assert!(events.iter().any(|e| matches!(e, ChatStreamEvent::Delta { .. })));
		assert!(matches!(events.last(), Some(ChatStreamEvent::End { .. }) | Some(ChatStreamEvent::Error { .. })));
	}
}
