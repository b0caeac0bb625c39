use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BudgetAction {
	DowngradeHotel,
	ReduceAttractions,
	CheaperTransport,
	AdjustMeals,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BudgetFeedback {
	pub action: BudgetAction,
	pub target_reduction: f64,
	pub suggestion: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, ToSchema)]
pub struct CategoryBreakdown {
	pub attractions: f64,
	pub accommodation: f64,
	pub transport: f64,
	pub dining: f64,
}

impl CategoryBreakdown {
	pub fn total(&self) -> f64 {
		self.attractions + self.accommodation + self.transport + self.dining
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BudgetResult {
	pub total_cost: f64,
	pub utilization: f64,
	pub is_within_budget: bool,
	pub breakdown: CategoryBreakdown,
	pub feedback: Option<BudgetFeedback>,
}

impl BudgetResult {
	/// `accept(total, budget, retry) iff total <= budget * (1.10 + 0.05 * retry)`
	pub fn accepts(total: f64, budget: f64, retry_count: u32) -> bool {
		if budget <= 0.0 {
			return true;
		}
		total <= budget * (1.10 + 0.05 * retry_count as f64)
	}
}
