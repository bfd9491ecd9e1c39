//! Spending aggregation for the dashboard charts, monthly stats and history.
//!
//! Every function here decides what counts as income and spending by the sign
//! of the amount alone: negative amounts are money out and positive amounts
//! are money in. Category totals additionally exclude the income category.

use std::collections::HashMap;

use time::{Date, Duration};

use crate::{
    models::{Category, Transaction},
    view_model::format::{month_label, short_date_label},
};

/// How many categories the spending-by-category chart shows.
pub const TOP_CATEGORY_LIMIT: usize = 6;

/// How many days the spending-over-time chart covers, ending today.
pub const SPENDING_WINDOW_DAYS: i64 = 30;

/// Total spending in one category.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CategoryTotal {
    /// The spending category.
    pub category: Category,
    /// The sum of the absolute amounts spent.
    pub amount: f64,
}

impl CategoryTotal {
    /// The category label.
    pub fn label(&self) -> &'static str {
        self.category.label()
    }

    /// The chart color for the category.
    pub fn color(&self) -> &'static str {
        self.category.color()
    }
}

/// Sums spending per category, largest first, limited to [TOP_CATEGORY_LIMIT].
///
/// Only transactions with a negative amount outside the income category count.
/// Categories with equal totals keep the order they first appeared in.
pub fn category_totals(transactions: &[Transaction]) -> Vec<CategoryTotal> {
    let mut totals: Vec<CategoryTotal> = Vec::new();

    for transaction in transactions.iter().filter(|t| t.is_spending()) {
        match totals
            .iter_mut()
            .find(|total| total.category == transaction.category)
        {
            Some(total) => total.amount += transaction.amount.abs(),
            None => totals.push(CategoryTotal {
                category: transaction.category,
                amount: transaction.amount.abs(),
            }),
        }
    }

    // `sort_by` is stable, so ties stay in first-seen order.
    totals.sort_by(|a, b| b.amount.total_cmp(&a.amount));
    totals.truncate(TOP_CATEGORY_LIMIT);
    totals
}

/// Spending on a single day.
#[derive(Debug, Clone, PartialEq)]
pub struct DailySpending {
    /// The day the bucket covers.
    pub date: Date,
    /// A short label for the chart axis, e.g. "Jan 5".
    pub label: String,
    /// The total spent on the day, as a positive number.
    pub amount: f64,
}

/// Sums spending per day over the [SPENDING_WINDOW_DAYS] days ending on `today`.
///
/// Returns one bucket per day in ascending order, including days with no
/// spending. Every transaction with a negative amount counts, whatever its category.
pub fn daily_spending(transactions: &[Transaction], today: Date) -> Vec<DailySpending> {
    let mut totals: HashMap<Date, f64> = HashMap::new();

    for transaction in transactions.iter().filter(|t| t.amount < 0.0) {
        *totals.entry(transaction.date).or_insert(0.0) += transaction.amount.abs();
    }

    (0..SPENDING_WINDOW_DAYS)
        .rev()
        .filter_map(|days_ago| today.checked_sub(Duration::days(days_ago)))
        .map(|date| DailySpending {
            date,
            label: short_date_label(date),
            amount: totals.get(&date).copied().unwrap_or(0.0),
        })
        .collect()
}

/// Income and spending for the current calendar month.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MonthlyStats {
    /// The sum of positive amounts.
    pub total_income: f64,
    /// The sum of the absolute values of negative amounts.
    pub total_spent: f64,
    /// `total_income - total_spent`.
    pub balance: f64,
    /// The number of transactions this month, of any kind.
    pub transaction_count: usize,
}

/// Computes [MonthlyStats] over the transactions in the same month and year as `today`.
pub fn monthly_stats(transactions: &[Transaction], today: Date) -> MonthlyStats {
    let (total_income, total_spent, transaction_count) = transactions
        .iter()
        .filter(|t| t.date.year() == today.year() && t.date.month() == today.month())
        .fold((0.0, 0.0, 0), |(income, spent, count), t| {
            if t.amount > 0.0 {
                (income + t.amount, spent, count + 1)
            } else {
                (income, spent + t.amount.abs(), count + 1)
            }
        });

    MonthlyStats {
        total_income,
        total_spent,
        balance: total_income - total_spent,
        transaction_count,
    }
}

/// A summary of one calendar month for the history view.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthSummary {
    /// The first day of the month.
    pub month: Date,
    /// A heading such as "November 2024".
    pub label: String,
    /// Spending in the month, as a positive number.
    pub total_spent: f64,
    /// Income in the month.
    pub total_income: f64,
    /// The category with the most spending, if anything was spent.
    pub top_category: Option<Category>,
    /// The percentage change in spending from the previous month that has
    /// transactions. `None` for the earliest month, or if nothing was spent
    /// in the previous month.
    pub change_percentage: Option<f64>,
}

impl MonthSummary {
    /// Income left over after spending.
    pub fn savings(&self) -> f64 {
        self.total_income - self.total_spent
    }

    /// Savings as a percentage of income, or `None` without income.
    pub fn savings_rate(&self) -> Option<f64> {
        (self.total_income > 0.0).then(|| self.savings() / self.total_income * 100.0)
    }
}

/// Summarises each calendar month that has transactions, newest first.
pub fn monthly_history(transactions: &[Transaction]) -> Vec<MonthSummary> {
    let mut by_month: HashMap<Date, Vec<Transaction>> = HashMap::new();

    for transaction in transactions {
        let month = first_of_month(transaction.date);
        by_month.entry(month).or_default().push(transaction.clone());
    }

    let mut months: Vec<Date> = by_month.keys().copied().collect();
    months.sort();

    let mut previous_spent: Option<f64> = None;
    let mut summaries: Vec<MonthSummary> = months
        .into_iter()
        .map(|month| {
            let transactions = &by_month[&month];
            let stats = monthly_stats(transactions, month);
            let change_percentage = previous_spent
                .filter(|&spent| spent > 0.0)
                .map(|spent| (stats.total_spent - spent) / spent * 100.0);
            previous_spent = Some(stats.total_spent);

            MonthSummary {
                month,
                label: month_label(month),
                total_spent: stats.total_spent,
                total_income: stats.total_income,
                top_category: category_totals(transactions)
                    .first()
                    .map(|total| total.category),
                change_percentage,
            }
        })
        .collect();

    summaries.reverse();
    summaries
}

fn first_of_month(date: Date) -> Date {
    date.saturating_sub(Duration::days(i64::from(date.day()) - 1))
}
