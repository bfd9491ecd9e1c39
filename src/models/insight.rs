//! AI-generated spending insights.
//!
//! Insights are produced by the Finance Service. The client only displays them
//! and asks for new ones to be generated.

use serde::{Deserialize, Serialize};

use crate::models::Category;

/// A natural-language and structured summary of spending for a period.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SpendingInsight {
    /// A short paragraph describing the spending. Empty if nothing has been generated yet.
    pub summary: String,
    /// The largest spending categories, biggest first.
    pub top_categories: Vec<TopCategory>,
    /// Suggestions for spending less.
    pub saving_tips: Vec<String>,
    /// A monthly amount the user could aim to save, in dollars.
    pub suggested_saving_goal: f64,
    /// Warnings about unusual spending.
    pub alerts: Vec<String>,
}

/// One entry in [SpendingInsight::top_categories].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopCategory {
    /// The spending category.
    pub category: Category,
    /// The amount spent in the category, in dollars.
    pub amount: f64,
    /// The share of total spending, from 0 to 100.
    pub percentage: f64,
}

/// The body of a request to regenerate an insight.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GenerateInsightRequest {
    /// The month to analyse as `YYYY-MM`, or the current month if unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub month: Option<String>,
}
