//! Budgets: spending limits for a category, or for all spending, over a month.

use serde::{Deserialize, Serialize};
use time::Date;

use crate::models::{BudgetCategory, iso_date};

/// The identifier the Finance Service assigns to a budget.
pub type BudgetId = String;

/// A spending limit and how much of it has been used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    /// The ID of the budget.
    #[serde(alias = "_id")]
    pub id: BudgetId,
    /// The category the limit applies to, or the total across all categories.
    pub category: BudgetCategory,
    /// The spending limit. The Finance Service calls this `limit`.
    #[serde(alias = "limit")]
    pub amount: f64,
    /// How much has been spent against the limit so far.
    #[serde(default)]
    pub spent: f64,
}

/// The body of a request to create a budget.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewBudget {
    /// The category the budget limits.
    pub category: BudgetCategory,
    /// The spending limit in dollars.
    pub limit: f64,
    /// The month the budget applies to, formatted as `YYYY-MM`.
    pub month: String,
}

impl NewBudget {
    /// Create a budget for the month that `date` falls in.
    pub fn for_month(category: BudgetCategory, limit: f64, date: Date) -> Self {
        Self {
            category,
            limit,
            month: iso_date::format_month(date),
        }
    }
}

/// The body of a request to change a budget's limit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetUpdate {
    /// The spending limit in dollars.
    pub limit: f64,
}

/// The Finance Service's snapshot of the current month's budgets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CurrentMonthBudget {
    /// The month of the snapshot, formatted as `YYYY-MM`.
    pub month: Option<String>,
    /// This month's budgets.
    pub budgets: Vec<Budget>,
    /// The sum of all budget limits.
    pub total_budget: f64,
    /// The sum of spending against all budgets.
    pub total_spent: f64,
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use crate::models::{Budget, BudgetCategory, Category, CurrentMonthBudget, NewBudget};

    #[test]
    fn deserializes_budget_with_limit_field() {
        let json = r#"{"_id": "b1", "category": "food", "limit": 600, "spent": 520}"#;

        let budget: Budget = serde_json::from_str(json).unwrap();

        assert_eq!(
            budget,
            Budget {
                id: "b1".to_owned(),
                category: BudgetCategory::Category(Category::Food),
                amount: 600.0,
                spent: 520.0,
            }
        );
    }

    #[test]
    fn spent_defaults_to_zero() {
        let json = r#"{"id": "b2", "category": "total", "amount": 5000}"#;

        let budget: Budget = serde_json::from_str(json).unwrap();

        assert_eq!(budget.category, BudgetCategory::TOTAL);
        assert_eq!(budget.spent, 0.0);
    }

    #[test]
    fn new_budget_uses_year_month() {
        let budget = NewBudget::for_month(Category::Food.into(), 250.0, date!(2024 - 11 - 17));

        let json = serde_json::to_value(&budget).unwrap();

        assert_eq!(json["month"], "2024-11");
        assert_eq!(json["category"], "food");
        assert_eq!(json["limit"], 250.0);
    }

    #[test]
    fn current_month_budget_tolerates_missing_fields() {
        let snapshot: CurrentMonthBudget = serde_json::from_str(r#"{"totalSpent": 12.5}"#).unwrap();

        assert_eq!(snapshot.total_spent, 12.5);
        assert!(snapshot.budgets.is_empty());
        assert_eq!(snapshot.month, None);
    }
}
