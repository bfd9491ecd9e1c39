//! This file defines the type `Transaction`, the core record of the dashboard,
//! and the request types used to create, update and query transactions.
//!
//! The sign of [Transaction::amount] is the single source of truth for the
//! direction of money: negative amounts are money spent, positive amounts are
//! money earned. Records that arrive with a `type` field are normalized to this
//! convention when they are deserialized.

use serde::{Deserialize, Serialize};
use time::Date;

use crate::models::{Category, iso_date};

/// The identifier the Finance Service assigns to a transaction.
pub type TransactionId = String;

/// Whether money came in or went out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Money earned.
    Income,
    /// Money spent.
    Expense,
}

impl TransactionKind {
    /// The kind implied by the sign of `amount`.
    ///
    /// Zero is treated as an expense, matching how the entry form defaults.
    pub fn from_amount(amount: f64) -> Self {
        if amount > 0.0 {
            TransactionKind::Income
        } else {
            TransactionKind::Expense
        }
    }

    /// Apply this kind's sign to the magnitude of `amount`.
    pub fn signed(self, amount: f64) -> f64 {
        match self {
            TransactionKind::Income => amount.abs(),
            TransactionKind::Expense => -amount.abs(),
        }
    }
}

/// An expense or income, i.e. an event where money was either spent or earned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "TransactionRecord")]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// When the transaction happened.
    #[serde(with = "iso_date")]
    pub date: Date,
    /// A text description of what the transaction was for.
    pub description: String,
    /// The amount of money spent (negative) or earned (positive).
    pub amount: f64,
    /// The classification of the transaction.
    pub category: Category,
}

impl Transaction {
    /// Whether the transaction is income or an expense, going by the sign of its amount.
    pub fn kind(&self) -> TransactionKind {
        TransactionKind::from_amount(self.amount)
    }

    /// Whether this transaction counts towards spending totals.
    ///
    /// Income-category transactions never count, even if they are negative
    /// (e.g. a reversed salary payment).
    pub fn is_spending(&self) -> bool {
        self.amount < 0.0 && self.category != Category::Income
    }
}

/// The shape of a transaction as sent by the Finance Service.
#[derive(Deserialize)]
struct TransactionRecord {
    #[serde(alias = "_id")]
    id: TransactionId,
    #[serde(with = "iso_date")]
    date: Date,
    #[serde(default)]
    description: String,
    amount: f64,
    category: Category,
    #[serde(default, rename = "type")]
    kind: Option<TransactionKind>,
}

impl From<TransactionRecord> for Transaction {
    fn from(record: TransactionRecord) -> Self {
        let amount = match record.kind {
            Some(kind) => kind.signed(record.amount),
            None => record.amount,
        };

        Self {
            id: record.id,
            date: record.date,
            description: record.description,
            amount,
            category: record.category,
        }
    }
}

/// The body of a request to create a transaction.
///
/// The `type` field expected by the Finance Service is derived from the sign of
/// the amount so the two can never disagree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewTransaction {
    #[serde(with = "iso_date")]
    date: Date,
    description: String,
    amount: f64,
    category: Category,
    #[serde(rename = "type")]
    kind: TransactionKind,
}

impl NewTransaction {
    /// Create a new transaction request from a signed `amount`.
    pub fn new(date: Date, description: &str, amount: f64, category: Category) -> Self {
        Self {
            date,
            description: description.trim().to_owned(),
            amount,
            category,
            kind: TransactionKind::from_amount(amount),
        }
    }

    /// The day the transaction happened.
    pub fn date(&self) -> Date {
        self.date
    }

    /// The description, with surrounding whitespace removed.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The signed amount. Negative for an expense.
    pub fn amount(&self) -> f64 {
        self.amount
    }

    /// The category the transaction belongs to.
    pub fn category(&self) -> Category {
        self.category
    }

    /// Whether the transaction is income or an expense, going by the sign of its amount.
    pub fn kind(&self) -> TransactionKind {
        self.kind
    }
}

/// A partial update to an existing transaction. Unset fields are left as they are.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TransactionUpdate {
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "iso_date::serialize_option"
    )]
    date: Option<Date>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    category: Option<Category>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    kind: Option<TransactionKind>,
}

impl TransactionUpdate {
    /// An update that changes nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Change the date.
    pub fn date(mut self, date: Date) -> Self {
        self.date = Some(date);
        self
    }

    /// Change the description.
    pub fn description(mut self, description: &str) -> Self {
        self.description = Some(description.trim().to_owned());
        self
    }

    /// Set the signed amount, which also sets the transaction type.
    pub fn amount(mut self, amount: f64) -> Self {
        self.amount = Some(amount);
        self.kind = Some(TransactionKind::from_amount(amount));
        self
    }

    /// Change the category.
    pub fn category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    /// Whether the update would change nothing.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Server-side filters for listing transactions.
///
/// Serialized as the `startDate`, `endDate` and `category` query parameters,
/// and as part of the cache key for the listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionFilter {
    /// Only include transactions on or after this date.
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "iso_date::serialize_option"
    )]
    pub start_date: Option<Date>,
    /// Only include transactions on or before this date.
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "iso_date::serialize_option"
    )]
    pub end_date: Option<Date>,
    /// Only include transactions in this category.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
}
