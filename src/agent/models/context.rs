/*
 * src/agent/models/context.rs
 *
 * The optional current-trip context block ChatAgent weaves into its system
 * prompt, plus a log of tool invocations shown back to the LLM loop.
 */

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripContextBlock {
	pub trip_id: String,
	pub destination: String,
	pub start_date: String,
	pub end_date: String,
	pub budget: i64,
	pub traveler_count: u32,
	/// One bullet line per day, e.g. "Day 1: West Lake, Lingyin Temple".
	pub daily_summary: Vec<String>,
}

impl TripContextBlock {
	pub fn render(&self) -> String {
		let mut out = format!(
			"Current trip: {} ({} to {}), budget {}, {} traveler(s).\n",
			self.destination, self.start_date, self.end_date, self.budget, self.traveler_count
		);
		for line in &self.daily_summary {
			out.push_str("- ");
			out.push_str(line);
			out.push('\n');
		}
		out
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolExecution {
	pub tool_name: String,
	pub timestamp: String,
	pub input: Value,
	pub output: Value,
	pub success: bool,
}
