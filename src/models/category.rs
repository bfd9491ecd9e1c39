//! This file defines the `Category` type, the fixed set of classifications a
//! transaction can have, and `BudgetCategory`, which adds the "total" budget.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::Error;

/// A spending or income classification attached to a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Groceries, restaurants and takeaways.
    Food,
    /// Rent and other housing costs.
    Rent,
    /// Fuel, public transport and ride sharing.
    Transport,
    /// General retail purchases.
    Shopping,
    /// Recurring digital or membership payments.
    Subscriptions,
    /// Power, water, internet and phone bills.
    Utilities,
    /// Movies, concerts, games and the like.
    Entertainment,
    /// Pharmacy, doctor and insurance costs.
    Healthcare,
    /// Money coming in, e.g. salary or refunds.
    Income,
    /// Anything that does not fit the other categories.
    Other,
}

impl Category {
    /// Every category, in display order.
    pub const ALL: [Category; 10] = [
        Category::Food,
        Category::Rent,
        Category::Transport,
        Category::Shopping,
        Category::Subscriptions,
        Category::Utilities,
        Category::Entertainment,
        Category::Healthcare,
        Category::Income,
        Category::Other,
    ];

    /// The value used on the wire and in query strings.
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Food => "food",
            Category::Rent => "rent",
            Category::Transport => "transport",
            Category::Shopping => "shopping",
            Category::Subscriptions => "subscriptions",
            Category::Utilities => "utilities",
            Category::Entertainment => "entertainment",
            Category::Healthcare => "healthcare",
            Category::Income => "income",
            Category::Other => "other",
        }
    }

    /// The human readable name of the category.
    pub fn label(self) -> &'static str {
        match self {
            Category::Food => "Food & Dining",
            Category::Rent => "Rent & Housing",
            Category::Transport => "Transportation",
            Category::Shopping => "Shopping",
            Category::Subscriptions => "Subscriptions",
            Category::Utilities => "Utilities",
            Category::Entertainment => "Entertainment",
            Category::Healthcare => "Healthcare",
            Category::Income => "Income",
            Category::Other => "Other",
        }
    }

    /// An emoji shown next to the label.
    pub fn icon(self) -> &'static str {
        match self {
            Category::Food => "🍔",
            Category::Rent => "🏠",
            Category::Transport => "🚗",
            Category::Shopping => "🛍️",
            Category::Subscriptions => "📱",
            Category::Utilities => "💡",
            Category::Entertainment => "🎬",
            Category::Healthcare => "🏥",
            Category::Income => "💰",
            Category::Other => "📦",
        }
    }

    /// The colour used for this category in charts, as a CSS `hsl()` string.
    pub fn color(self) -> &'static str {
        match self {
            Category::Food => "hsl(162, 72%, 45%)",
            Category::Rent => "hsl(200, 70%, 50%)",
            Category::Transport => "hsl(280, 65%, 60%)",
            Category::Shopping => "hsl(38, 92%, 50%)",
            Category::Subscriptions => "hsl(0, 72%, 51%)",
            Category::Utilities => "hsl(180, 60%, 45%)",
            Category::Entertainment => "hsl(320, 70%, 55%)",
            Category::Healthcare => "hsl(142, 76%, 36%)",
            Category::Income => "hsl(120, 60%, 45%)",
            Category::Other => "hsl(220, 30%, 50%)",
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();

        Category::ALL
            .into_iter()
            .find(|category| category.as_str() == needle)
            .ok_or_else(|| Error::InvalidCategory(s.to_owned()))
    }
}

/// What a budget applies to: one category, or all spending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BudgetCategory {
    /// The budget limits spending across every category.
    Total(TotalMarker),
    /// The budget limits spending in a single category.
    Category(Category),
}

/// Serializes as the literal string `"total"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TotalMarker {
    /// The sentinel value.
    Total,
}

impl BudgetCategory {
    /// The budget that spans all categories.
    pub const TOTAL: BudgetCategory = BudgetCategory::Total(TotalMarker::Total);

    /// Whether this is the budget for all spending.
    pub fn is_total(self) -> bool {
        matches!(self, BudgetCategory::Total(_))
    }

    /// The human readable name of the budget's category.
    pub fn label(self) -> &'static str {
        match self {
            BudgetCategory::Total(_) => "Total Budget",
            BudgetCategory::Category(category) => category.label(),
        }
    }

    /// An emoji shown next to the label.
    pub fn icon(self) -> &'static str {
        match self {
            BudgetCategory::Total(_) => "💰",
            BudgetCategory::Category(category) => category.icon(),
        }
    }
}

impl From<Category> for BudgetCategory {
    fn from(category: Category) -> Self {
        BudgetCategory::Category(category)
    }
}

impl Display for BudgetCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BudgetCategory::Total(_) => f.write_str("total"),
            BudgetCategory::Category(category) => category.fmt(f),
        }
    }
}

impl FromStr for BudgetCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("total") {
            Ok(BudgetCategory::TOTAL)
        } else {
            s.parse().map(BudgetCategory::Category)
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        Error,
        models::{BudgetCategory, Category},
    };

    #[test]
    fn category_round_trips_through_json() {
        let json = serde_json::to_string(&Category::Healthcare).unwrap();
        assert_eq!(json, "\"healthcare\"");

        let category: Category = serde_json::from_str("\"subscriptions\"").unwrap();
        assert_eq!(category, Category::Subscriptions);
    }

    #[test]
    fn budget_category_accepts_total_sentinel() {
        let total: BudgetCategory = serde_json::from_str("\"total\"").unwrap();
        let food: BudgetCategory = serde_json::from_str("\"food\"").unwrap();

        assert_eq!(total, BudgetCategory::TOTAL);
        assert_eq!(food, BudgetCategory::Category(Category::Food));
        assert_eq!(
            serde_json::to_string(&BudgetCategory::TOTAL).unwrap(),
            "\"total\""
        );
    }

    #[test]
    fn parses_category_case_insensitively() {
        assert_eq!("Food".parse::<Category>(), Ok(Category::Food));
        assert_eq!(" RENT ".parse::<Category>(), Ok(Category::Rent));
        assert_eq!(
            "groceries".parse::<Category>(),
            Err(Error::InvalidCategory("groceries".to_owned()))
        );
    }

    #[test]
    fn total_budget_label() {
        assert_eq!(BudgetCategory::TOTAL.label(), "Total Budget");
        assert_eq!(
            BudgetCategory::from(Category::Rent).label(),
            "Rent & Housing"
        );
    }
}
