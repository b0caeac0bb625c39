/*
 * src/agent/agents/llm.rs
 *
 * Shared LLM plumbing for the specialist agents: one place to build the
 * configured chat model and to turn its free-text output into the typed
 * JSON each agent expects. Every specialist calls through here rather than
 * touching `langchain_rust` directly.
 */

use std::sync::Arc;

use langchain_rust::language_models::llm::LLM;
use langchain_rust::llm::openai::{OpenAI, OpenAIConfig};
use langchain_rust::schemas::Message;
use serde::de::DeserializeOwned;

use crate::agent::configs::mock::MockLLM;
use crate::agent::settings::AgentSettings;

/// Builds the LLM configured for this deployment. When `DEPLOY_LLM` isn't
/// set (local dev, CI), falls back to `MockLLM` so agents exercise their
/// full code path without a live API key.
pub fn build_llm(settings: &AgentSettings) -> Arc<dyn LLM> {
	if !settings.deploy_llm {
		return Arc::new(MockLLM);
	}
	match &settings.openai_api_key {
		Some(key) => {
			let config = OpenAIConfig::new().with_api_key(key.clone());
			Arc::new(OpenAI::default().with_config(config).with_model(settings.llm_model.clone()))
		}
		None => Arc::new(MockLLM),
	}
}

/// Invokes the model with a single user prompt and returns its raw text.
pub async fn invoke(llm: &dyn LLM, prompt: &str) -> Option<String> {
	let messages = vec![Message::new_human_message(prompt)];
	llm.generate(&messages).await.ok().map(|r| r.generation)
}

/// Invokes the model and parses its response as JSON of type `T`, stripping
/// a ```json fenced block if the model wrapped its answer in one. Returns
/// `None` on any failure so callers can fall back to a rule-based path.
pub async fn invoke_json<T: DeserializeOwned>(llm: &dyn LLM, prompt: &str) -> Option<T> {
	let raw = invoke(llm, prompt).await?;
	let cleaned = strip_json_fence(&raw);
	serde_json::from_str(cleaned.trim()).ok()
}

fn strip_json_fence(text: &str) -> &str {
	let trimmed = text.trim();
	if let Some(rest) = trimmed.strip_prefix("```json") {
		rest.strip_suffix("```").unwrap_or(rest).trim()
	} else if let Some(rest) = trimmed.strip_prefix("```") {
		rest.strip_suffix("```").unwrap_or(rest).trim()
	} else {
		trimmed
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn strips_json_fence() {
		assert_eq!(strip_json_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
		assert_eq!(strip_json_fence("{\"a\":1}"), "{\"a\":1}");
	}
}
