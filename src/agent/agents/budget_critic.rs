/*
 * src/agent/agents/budget_critic.rs
 *
 * Budget critic: totals the draft plan's cost against the trip budget and,
 * when over, proposes a single reduction targeting whichever category is
 * both over its fair share and large enough to move the needle. Retrying
 * rotates to the next-largest reducible category so two consecutive
 * retries don't keep hammering the same line item.
 */

use crate::agent::models::budget::{BudgetAction, BudgetFeedback, BudgetResult, CategoryBreakdown};

fn action_for_category(category: &str) -> BudgetAction {
	match category {
		"accommodation" => BudgetAction::DowngradeHotel,
		"attractions" => BudgetAction::ReduceAttractions,
		"transport" => BudgetAction::CheaperTransport,
		"dining" => BudgetAction::AdjustMeals,
		_ => BudgetAction::ReduceAttractions,
	}
}

fn suggestion_for(action: BudgetAction, reduction: f64) -> String {
	match action {
		BudgetAction::DowngradeHotel => format!("Switch to a lower accommodation tier to save about {:.0}.", reduction),
		BudgetAction::ReduceAttractions => format!("Drop one or two lower-priority attractions to save about {:.0}.", reduction),
		BudgetAction::CheaperTransport => format!("Use transit or walking for more legs to save about {:.0}.", reduction),
		BudgetAction::AdjustMeals => format!("Choose more budget-friendly dining options to save about {:.0}.", reduction),
	}
}

/// Ranks categories largest-first and skips categories already visited in
/// prior retries (`exhausted`), so repeated retries rotate through budget
/// levers instead of re-targeting the same one.
pub fn critique(breakdown: CategoryBreakdown, budget: f64, retry_count: u32, exhausted: &[String]) -> BudgetResult {
	let total_cost = breakdown.total();
	let is_within_budget = BudgetResult::accepts(total_cost, budget, retry_count);
	let utilization = if budget > 0.0 { total_cost / budget } else { 0.0 };

	let feedback = if is_within_budget {
		None
	} else {
		let overage = total_cost - budget;
		let mut ranked = vec![
			("accommodation", breakdown.accommodation),
			("attractions", breakdown.attractions),
			("transport", breakdown.transport),
			("dining", breakdown.dining),
		];
		ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap());

		let target = ranked
			.into_iter()
			.find(|(name, amount)| *amount > 0.0 && !exhausted.contains(&name.to_string()));

		target.map(|(name, amount)| {
			let target_reduction = overage.min(amount * 0.3);
			let action = action_for_category(name);
			BudgetFeedback {
				action,
				target_reduction,
				suggestion: suggestion_for(action, target_reduction),
			}
		})
	};

	BudgetResult {
		total_cost,
		utilization,
		is_within_budget,
		breakdown,
		feedback,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn sample_breakdown() -> CategoryBreakdown {
		CategoryBreakdown {
			attractions: 200.0,
			accommodation: 800.0,
			transport: 100.0,
			dining: 300.0,
		}
	}

	#[test]
	fn within_budget_has_no_feedback() {
		let result = critique(sample_breakdown(), 2000.0, 0, &[]);
		assert!(result.is_within_budget);
		assert!(result.feedback.is_none());
	}

	#[test]
	fn over_budget_targets_largest_category_first() {
		let result = critique(sample_breakdown(), 1000.0, 0, &[]);
		assert!(!result.is_within_budget);
		assert_eq!(result.feedback.unwrap().action, BudgetAction::DowngradeHotel);
	}

	#[test]
	fn exhausted_category_is_skipped() {
		let result = critique(sample_breakdown(), 1000.0, 1, &["accommodation".to_string()]);
		assert_eq!(result.feedback.unwrap().action, BudgetAction::AdjustMeals);
	}
}
