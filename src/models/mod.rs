//! This module defines the domain data types exchanged with the Finance Service.

pub use budget::{Budget, BudgetId, BudgetUpdate, CurrentMonthBudget, NewBudget};
pub use category::{BudgetCategory, Category, TotalMarker};
pub use insight::{GenerateInsightRequest, SpendingInsight, TopCategory};
pub use transaction::{
    NewTransaction, Transaction, TransactionFilter, TransactionId, TransactionKind,
    TransactionUpdate,
};
pub use user::{AuthResponse, LogInRequest, RegisterRequest, User, UserId};

mod budget;
mod category;
pub mod iso_date;
mod insight;
mod transaction;
mod user;
