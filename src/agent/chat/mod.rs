/*
 * src/agent/chat/mod.rs
 *
 * The conversational layer in front of the orchestration graph. `ChatAgent`
 * drives a bounded tool-calling loop: each round asks the model for either
 * a tool call or a final answer, dispatches the call through
 * `tools::ToolCall`, and feeds the result back in as the next turn's
 * context until the model produces a final answer or the round cap trips.
 */

pub mod modification;
pub mod modify_ops;
pub mod stream;
pub mod tools;

use langchain_rust::language_models::llm::LLM;

use crate::agent::models::context::{ToolExecution, TripContextBlock};
use crate::global::MAX_TOOL_ROUNDS;

use tools::{ToolCall, ToolContext};

pub struct ChatAgent<'a> {
	pub llm: &'a dyn LLM,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct ChatTurnResult {
	pub reply: String,
	pub tool_executions: Vec<ToolExecution>,
	pub rounds_used: u32,
	pub hit_round_cap: bool,
}

impl<'a> ChatAgent<'a> {
	pub fn new(llm: &'a dyn LLM) -> Self {
		ChatAgent { llm }
	}

	/// Runs the tool-calling loop for one user turn. `context` is the
	/// current trip's state rendered into the system prompt, if any.
	pub async fn handle_turn(&self, user_text: &str, context: Option<&TripContextBlock>, tool_ctx: &ToolContext<'_>) -> ChatTurnResult {
		let mut transcript = self.build_system_prompt(context);
		transcript.push_str("\nUser: ");
		transcript.push_str(user_text);

		let mut executions = Vec::new();

		for round in 0..MAX_TOOL_ROUNDS {
			let raw = match super::agents::llm::invoke(self.llm, &transcript).await {
				Some(text) => text,
				None => {
					return ChatTurnResult {
						reply: "Sorry, I couldn't reach the planning model just now.".to_string(),
						tool_executions: executions,
						rounds_used: round,
						hit_round_cap: false,
					};
				}
			};

			match parse_turn(&raw) {
				TurnResponse::Final(text) => {
					return ChatTurnResult {
						reply: text,
						tool_executions: executions,
						rounds_used: round + 1,
						hit_round_cap: false,
					};
				}
				TurnResponse::ToolCall(call) => {
					let execution = call.dispatch(tool_ctx).await;
					transcript.push_str(&format!(
						"\nTool `{}` result: {}\n",
						execution.tool_name,
						serde_json::to_string(&execution.output).unwrap_or_default()
					));
					executions.push(execution);
				}
				TurnResponse::Unparsed(text) => {
					return ChatTurnResult {
						reply: text,
						tool_executions: executions,
						rounds_used: round + 1,
						hit_round_cap: false,
					};
				}
			}
		}

		ChatTurnResult {
			reply: "I've done as much as I can automatically for this turn; let me know how you'd like to continue.".to_string(),
			tool_executions: executions,
			rounds_used: MAX_TOOL_ROUNDS,
			hit_round_cap: true,
		}
	}

	fn build_system_prompt(&self, context: Option<&TripContextBlock>) -> String {
		const SYSTEM_PROMPT: &str = include_str!("../prompts/chat_system.md");
		let mut prompt = String::from(SYSTEM_PROMPT);
		prompt.push('\n');
		if let Some(context) = context {
			prompt.push_str(&context.render());
		}
		prompt
	}
}

enum TurnResponse {
	Final(String),
	ToolCall(ToolCall),
	Unparsed(String),
}

fn parse_turn(raw: &str) -> TurnResponse {
	let cleaned = raw.trim().trim_start_matches("```json").trim_start_matches("```").trim_end_matches("```").trim();
	let Ok(value) = serde_json::from_str::<serde_json::Value>(cleaned) else {
		return TurnResponse::Unparsed(raw.to_string());
	};

	match value.get("type").and_then(|t| t.as_str()) {
		Some("final") => TurnResponse::Final(value.get("text").and_then(|t| t.as_str()).unwrap_or(raw).to_string()),
		Some("tool_call") => {
			let tool = value.get("tool").and_then(|t| t.as_str()).unwrap_or_default();
			let args = value.get("args").cloned().unwrap_or(serde_json::Value::Null);
			let wrapped = serde_json::json!({ "tool": tool, "args": args });
			match serde_json::from_value::<ToolCall>(wrapped) {
				Ok(call) => TurnResponse::ToolCall(call),
				Err(_) => TurnResponse::Unparsed(raw.to_string()),
			}
		}
		_ => TurnResponse::Unparsed(raw.to_string()),
	}
}
