//! View-model derivation
//!
//! Pure functions that turn transactions and budgets into the values the
//! dashboard, budget and history views display. Nothing here performs I/O.

mod budget;
mod format;
mod spending;
mod transactions;

pub use budget::{
    BudgetOverview, BudgetRow, BudgetStatus, BudgetUsage, OVER_THRESHOLD, WARNING_THRESHOLD,
    budget_overview, budget_usage,
};
pub use format::{
    date_label, format_currency, format_currency_rounded, format_signed_currency, month_abbrev,
    month_label, short_date_label,
};
pub use spending::{
    CategoryTotal, DailySpending, MonthSummary, MonthlyStats, SPENDING_WINDOW_DAYS,
    TOP_CATEGORY_LIMIT, category_totals, daily_spending, monthly_history, monthly_stats,
};
pub use transactions::{
    RECENT_TRANSACTION_LIMIT, TransactionRow, TransactionSearch, filter_transactions,
    recent_transactions,
};
