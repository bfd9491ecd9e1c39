//! The dashboard: independent sections built from the transactions, budgets
//! and insight queries.
//!
//! Each section depends on one query only, so a slow or failed query leaves a
//! placeholder in its own sections and never holds up the others.

use time::Date;

use crate::{
    Error, QueryState,
    models::{Budget, SpendingInsight, Transaction},
    view_model::{
        BudgetOverview, CategoryTotal, DailySpending, MonthlyStats, RECENT_TRANSACTION_LIMIT,
        TransactionRow, budget_overview, category_totals, daily_spending, monthly_stats,
        recent_transactions,
    },
};

/// One part of the dashboard: either ready to show or a placeholder message.
#[derive(Debug, Clone, PartialEq)]
pub enum Section<T> {
    /// The section has data to show.
    Ready(T),
    /// The section has nothing to show yet. Holds the message to show instead.
    Placeholder(String),
}

impl<T> Section<T> {
    /// Whether the section has data to show.
    pub fn is_ready(&self) -> bool {
        matches!(self, Section::Ready(_))
    }

    /// The view, if the section is ready.
    pub fn ready(&self) -> Option<&T> {
        match self {
            Section::Ready(view) => Some(view),
            Section::Placeholder(_) => None,
        }
    }

    /// Build a section from a query, using `build` on success.
    ///
    /// `build` may return `None` when the data is empty, in which case
    /// `empty_message` is shown instead.
    fn from_query<D>(
        state: &QueryState<D>,
        empty_message: &str,
        build: impl FnOnce(&D) -> Option<T>,
    ) -> Self {
        match state {
            QueryState::Idle => Section::Placeholder("Log in to see this section.".to_owned()),
            QueryState::Loading => Section::Placeholder("Loading...".to_owned()),
            QueryState::Error(error) => Section::Placeholder(error.clone().into_alert().details),
            QueryState::Success(data) => match build(data) {
                Some(view) => Section::Ready(view),
                None => Section::Placeholder(empty_message.to_owned()),
            },
        }
    }
}

/// Everything shown on the dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    /// This month's income, spending and balance.
    pub stats: Section<MonthlyStats>,
    /// Spending per day for the last 30 days.
    pub spending_chart: Section<Vec<DailySpending>>,
    /// Spending per category, largest first.
    pub category_chart: Section<Vec<CategoryTotal>>,
    /// Every budget with its usage.
    pub budgets: Section<BudgetOverview>,
    /// The latest AI spending insight.
    pub insight: Section<SpendingInsight>,
    /// The newest transactions.
    pub recent_transactions: Section<Vec<TransactionRow>>,
}

impl Dashboard {
    /// Build the dashboard from the current state of its three queries.
    ///
    /// # Errors
    /// Returns [Error::Unauthorized] if any of the queries failed with it, so
    /// that it reaches the top-level error handler. Every other failure becomes
    /// a placeholder in the sections that depend on that query.
    pub fn assemble(
        transactions: QueryState<Vec<Transaction>>,
        budgets: QueryState<Vec<Budget>>,
        insight: QueryState<SpendingInsight>,
        today: Date,
    ) -> Result<Self, Error> {
        let unauthorized = [transactions.error(), budgets.error(), insight.error()]
            .into_iter()
            .flatten()
            .any(|error| *error == Error::Unauthorized);

        if unauthorized {
            return Err(Error::Unauthorized);
        }

        Ok(Self {
            stats: Section::from_query(&transactions, "", |transactions| {
                Some(monthly_stats(transactions, today))
            }),
            spending_chart: Section::from_query(&transactions, "", |transactions| {
                Some(daily_spending(transactions, today))
            }),
            category_chart: Section::from_query(&transactions, "No spending yet.", |transactions| {
                let totals = category_totals(transactions);
                (!totals.is_empty()).then_some(totals)
            }),
            budgets: Section::from_query(&budgets, "No budgets set yet.", |budgets| {
                (!budgets.is_empty()).then(|| budget_overview(budgets))
            }),
            insight: Section::from_query(
                &insight,
                "No insights yet. Generate one to get started.",
                |insight| (!insight.summary.trim().is_empty()).then(|| insight.clone()),
            ),
            recent_transactions: Section::from_query(
                &transactions,
                "No transactions yet.",
                |transactions| {
                    let rows: Vec<TransactionRow> =
                        recent_transactions(transactions, RECENT_TRANSACTION_LIMIT)
                            .iter()
                            .map(TransactionRow::from)
                            .collect();
                    (!rows.is_empty()).then_some(rows)
                },
            ),
        })
    }
}
