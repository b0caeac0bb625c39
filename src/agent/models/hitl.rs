use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum InterruptType {
	ItineraryReview,
	BudgetDecision,
	FinalConfirm,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InterruptRecord {
	pub interrupt_type: InterruptType,
	pub options: Value,
	/// Absent until the run is resumed with a decision.
	pub decision: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, ToSchema)]
pub struct HITLState {
	pub awaiting_input: bool,
	pub active_interrupt: Option<InterruptType>,
	pub options: Option<Value>,
	pub decision: Option<Value>,
	/// Bounded history of prior interrupt/decision pairs, oldest first.
	#[serde(default)]
	pub history: Vec<InterruptRecord>,
}

impl HITLState {
	pub const MAX_HISTORY: usize = 50;

	pub fn raise(&mut self, interrupt_type: InterruptType, options: Value) {
		self.awaiting_input = true;
		self.active_interrupt = Some(interrupt_type);
		self.options = Some(options);
		self.decision = None;
	}

	pub fn resume(&mut self, decision: Value) {
		if let Some(interrupt_type) = self.active_interrupt.take() {
			self.history.push(InterruptRecord {
				interrupt_type,
				options: self.options.clone().unwrap_or(Value::Null),
				decision: Some(decision.clone()),
			});
			if self.history.len() > Self::MAX_HISTORY {
				self.history.remove(0);
			}
		}
		self.awaiting_input = false;
		self.options = None;
		self.decision = Some(decision);
	}
}

/// Itinerary-review resume decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum ItineraryReviewDecision {
	Approve,
	Modify { mods: Vec<super::modification::ModificationChange> },
	Cancel,
	Retry,
}

/// Budget-decision resume decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum BudgetDecision {
	Accept,
	Option { index: usize },
	Cancel,
}
