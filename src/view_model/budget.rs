//! Budget status for progress bars and the budget overview.

use crate::models::{Budget, BudgetCategory, BudgetId};

/// Usage at or above this percentage of the limit is a warning.
pub const WARNING_THRESHOLD: f64 = 80.0;

/// Usage at or above this percentage of the limit is over budget.
pub const OVER_THRESHOLD: f64 = 100.0;

/// How close spending is to a budget's limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetStatus {
    /// Below [WARNING_THRESHOLD].
    Normal,
    /// At or above [WARNING_THRESHOLD] but below [OVER_THRESHOLD].
    Warning,
    /// At or above [OVER_THRESHOLD].
    Over,
}

impl BudgetStatus {
    /// The status as shown to the user.
    pub fn label(self) -> &'static str {
        match self {
            BudgetStatus::Normal => "On track",
            BudgetStatus::Warning => "Close to limit",
            BudgetStatus::Over => "Over budget",
        }
    }
}

/// The usage of a budget as shown on a progress bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BudgetUsage {
    /// `spent / limit * 100`, or `None` if the limit is not positive.
    pub raw_percentage: Option<f64>,
    /// The width of the progress bar, from 0 to 100.
    pub display_percentage: f64,
    /// How close the spending is to the limit.
    pub status: BudgetStatus,
}

/// Computes how much of a budget has been used.
///
/// A budget without a positive limit has no meaningful percentage. It is
/// shown as over budget if anything was spent against it and as empty otherwise.
pub fn budget_usage(spent: f64, limit: f64) -> BudgetUsage {
    if limit <= 0.0 {
        let over = spent > 0.0;

        return BudgetUsage {
            raw_percentage: None,
            display_percentage: if over { 100.0 } else { 0.0 },
            status: if over {
                BudgetStatus::Over
            } else {
                BudgetStatus::Normal
            },
        };
    }

    let raw_percentage = spent / limit * 100.0;

    let status = if raw_percentage >= OVER_THRESHOLD {
        BudgetStatus::Over
    } else if raw_percentage >= WARNING_THRESHOLD {
        BudgetStatus::Warning
    } else {
        BudgetStatus::Normal
    };

    BudgetUsage {
        raw_percentage: Some(raw_percentage),
        display_percentage: raw_percentage.clamp(0.0, 100.0),
        status,
    }
}

/// One budget ready for display.
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetRow {
    /// The ID of the budget, for updating or deleting it.
    pub id: BudgetId,
    /// The category the budget limits.
    pub category: BudgetCategory,
    /// The category label.
    pub label: &'static str,
    /// The category icon.
    pub icon: &'static str,
    /// The amount spent against the budget this month.
    pub spent: f64,
    /// The monthly limit.
    pub limit: f64,
    /// The limit minus what has been spent. Negative when over budget.
    pub remaining: f64,
    /// How much of the limit has been used.
    pub usage: BudgetUsage,
}

impl From<&Budget> for BudgetRow {
    fn from(budget: &Budget) -> Self {
        Self {
            id: budget.id.clone(),
            category: budget.category,
            label: budget.category.label(),
            icon: budget.category.icon(),
            spent: budget.spent,
            limit: budget.amount,
            remaining: budget.amount - budget.spent,
            usage: budget_usage(budget.spent, budget.amount),
        }
    }
}

/// The overall budget, if one is set, and the per-category budgets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BudgetOverview {
    /// The budget for all spending, if one is set.
    pub total: Option<BudgetRow>,
    /// Per-category budgets in the order the Finance Service returned them.
    pub categories: Vec<BudgetRow>,
}

impl BudgetOverview {
    /// The number of budgets at or over their limit.
    pub fn over_count(&self) -> usize {
        self.total
            .iter()
            .chain(&self.categories)
            .filter(|row| row.usage.status == BudgetStatus::Over)
            .count()
    }
}

/// Separates the overall budget from the per-category budgets.
///
/// If the Finance Service returns more than one overall budget, the first is used.
pub fn budget_overview(budgets: &[Budget]) -> BudgetOverview {
    let (totals, categories): (Vec<&Budget>, Vec<&Budget>) = budgets
        .iter()
        .partition(|budget| budget.category.is_total());

    BudgetOverview {
        total: totals.first().map(|&budget| BudgetRow::from(budget)),
        categories: categories.into_iter().map(BudgetRow::from).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::{BudgetStatus, budget_overview, budget_usage};
    use crate::models::{Budget, BudgetCategory, Category};

    fn create_test_budget(id: &str, category: BudgetCategory, amount: f64, spent: f64) -> Budget {
        Budget {
            id: id.to_owned(),
            category,
            amount,
            spent,
        }
    }

    #[test]
    fn status_follows_thresholds() {
        assert_eq!(budget_usage(50.0, 100.0).status, BudgetStatus::Normal);
        assert_eq!(budget_usage(79.99, 100.0).status, BudgetStatus::Normal);
        assert_eq!(budget_usage(80.0, 100.0).status, BudgetStatus::Warning);
        assert_eq!(budget_usage(99.999, 100.0).status, BudgetStatus::Warning);
        assert_eq!(budget_usage(100.0, 100.0).status, BudgetStatus::Over);
    }

    #[test]
    fn exactly_at_limit_is_over_and_full() {
        let usage = budget_usage(250.0, 250.0);

        assert_eq!(usage.raw_percentage, Some(100.0));
        assert_eq!(usage.display_percentage, 100.0);
        assert_eq!(usage.status, BudgetStatus::Over);

        let almost = budget_usage(99.999, 100.0);
        assert!(almost.display_percentage < 100.0);
        assert_eq!(almost.status, BudgetStatus::Warning);
    }

    #[test]
    fn display_percentage_is_capped() {
        let usage = budget_usage(150.0, 100.0);

        assert_eq!(usage.raw_percentage, Some(150.0));
        assert_eq!(usage.display_percentage, 100.0);
        assert_eq!(usage.status, BudgetStatus::Over);
    }

    #[test]
    fn zero_limit_does_not_divide() {
        let empty = budget_usage(0.0, 0.0);
        let spent = budget_usage(5.0, 0.0);

        assert_eq!(empty.raw_percentage, None);
        assert_eq!(empty.status, BudgetStatus::Normal);
        assert_eq!(empty.display_percentage, 0.0);
        assert_eq!(spent.raw_percentage, None);
        assert_eq!(spent.status, BudgetStatus::Over);
        assert_eq!(spent.display_percentage, 100.0);
    }

    #[test]
    fn overview_separates_total_budget() {
        let budgets = vec![
            create_test_budget("b1", Category::Food.into(), 200.0, 190.0),
            create_test_budget("b2", BudgetCategory::TOTAL, 1000.0, 400.0),
            create_test_budget("b3", Category::Rent.into(), 800.0, 800.0),
        ];

        let overview = budget_overview(&budgets);

        let total = overview.total.as_ref().unwrap();
        assert_eq!(total.id, "b2");
        assert_eq!(total.label, "Total Budget");
        assert_eq!(total.remaining, 600.0);
        assert_eq!(overview.categories.len(), 2);
        assert_eq!(overview.categories[0].usage.status, BudgetStatus::Warning);
        assert_eq!(overview.categories[1].remaining, 0.0);
        assert_eq!(overview.over_count(), 1);
    }

    #[test]
    fn overview_without_total_budget() {
        let overview = budget_overview(&[create_test_budget(
            "b1",
            Category::Food.into(),
            100.0,
            0.0,
        )]);

        assert_eq!(overview.total, None);
        assert_eq!(overview.categories.len(), 1);
    }
}
