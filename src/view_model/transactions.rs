//! Searching and listing transactions.

use crate::{
    Error,
    models::{Category, Transaction, TransactionKind},
    view_model::format::{date_label, format_signed_currency},
};

/// How many transactions the dashboard lists.
pub const RECENT_TRANSACTION_LIMIT: usize = 6;

/// A client-side search over transactions that are already loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionSearch {
    /// Matched case-insensitively against the description. Empty matches everything.
    pub query: String,
    /// Only match this category, or any category if `None`.
    pub category: Option<Category>,
}

impl TransactionSearch {
    /// Build a search from form input, where the category "all" or an empty
    /// category means any category.
    ///
    /// # Errors
    /// Returns [Error::InvalidCategory] if `category` names no known category.
    pub fn from_inputs(query: &str, category: &str) -> Result<Self, Error> {
        let category = match category.trim() {
            "" => None,
            all if all.eq_ignore_ascii_case("all") => None,
            category => Some(category.parse()?),
        };

        Ok(Self {
            query: query.trim().to_owned(),
            category,
        })
    }

    /// Whether `transaction` matches both the text and the category.
    pub fn matches(&self, transaction: &Transaction) -> bool {
        let matches_query = self.query.is_empty()
            || transaction
                .description
                .to_lowercase()
                .contains(&self.query.to_lowercase());
        let matches_category = self
            .category
            .is_none_or(|category| transaction.category == category);

        matches_query && matches_category
    }
}

/// The transactions that match `search`, in their original order.
pub fn filter_transactions(transactions: &[Transaction], search: &TransactionSearch) -> Vec<Transaction> {
    transactions
        .iter()
        .filter(|transaction| search.matches(transaction))
        .cloned()
        .collect()
}

/// Up to `limit` transactions, newest first. Transactions on the same date
/// keep their original order.
pub fn recent_transactions(transactions: &[Transaction], limit: usize) -> Vec<Transaction> {
    let mut recent = transactions.to_vec();
    recent.sort_by(|a, b| b.date.cmp(&a.date));
    recent.truncate(limit);
    recent
}

/// A transaction ready for a list.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRow {
    /// The ID of the transaction, for editing or deleting it.
    pub id: String,
    /// e.g. "Mar 5, 2024".
    pub date: String,
    /// The description as entered.
    pub description: String,
    /// The category label.
    pub category_label: &'static str,
    /// The category icon.
    pub category_icon: &'static str,
    /// The signed amount, e.g. "+$200.00" or "-$50.00".
    pub amount: String,
    /// Whether the transaction is income or an expense.
    pub kind: TransactionKind,
}

impl From<&Transaction> for TransactionRow {
    fn from(transaction: &Transaction) -> Self {
        Self {
            id: transaction.id.clone(),
            date: date_label(transaction.date),
            description: transaction.description.clone(),
            category_label: transaction.category.label(),
            category_icon: transaction.category.icon(),
            amount: format_signed_currency(transaction.amount),
            kind: transaction.kind(),
        }
    }
}
