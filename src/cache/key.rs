//! Cache keys: a resource kind plus the query parameters that select from it.

use std::fmt::Display;

use serde::Serialize;

use crate::Error;

/// The kinds of data the Finance Service serves. Mutations invalidate by resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Resource {
    /// Transaction listings, for any filter.
    Transactions,
    /// The list of budgets.
    Budgets,
    /// The current month's budget snapshot.
    CurrentMonthBudget,
    /// The latest spending insight.
    Analysis,
    /// Spending insights for a specific month.
    MonthlyAnalysis,
}

impl Resource {
    /// The name used for the resource in keys and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Resource::Transactions => "transactions",
            Resource::Budgets => "budgets",
            Resource::CurrentMonthBudget => "current-month-budget",
            Resource::Analysis => "analysis",
            Resource::MonthlyAnalysis => "monthly-analysis",
        }
    }
}

/// Identifies one cached query.
///
/// Two keys are equal exactly when they name the same resource and their
/// parameters serialize to the same query string, so equal parameters always
/// share a cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    resource: Resource,
    params: String,
}

impl QueryKey {
    /// A key for a query without parameters.
    pub fn new(resource: Resource) -> Self {
        Self {
            resource,
            params: String::new(),
        }
    }

    /// A key for a query with `params`, which must serialize as a flat
    /// struct or map of scalar values.
    ///
    /// # Errors
    /// Returns [Error::InvalidQueryParameters] if `params` cannot be serialized
    /// as a query string.
    pub fn with_params<P>(resource: Resource, params: &P) -> Result<Self, Error>
    where
        P: Serialize + ?Sized,
    {
        let params = serde_urlencoded::to_string(params)
            .map_err(|error| Error::InvalidQueryParameters(error.to_string()))?;

        Ok(Self { resource, params })
    }

    /// The resource the key belongs to.
    pub fn resource(&self) -> Resource {
        self.resource
    }

    /// The serialized query parameters. Empty if the query has none.
    pub fn params(&self) -> &str {
        &self.params
    }
}

impl Display for QueryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.params.is_empty() {
            f.write_str(self.resource.as_str())
        } else {
            write!(f, "{}?{}", self.resource.as_str(), self.params)
        }
    }
}

#[cfg(test)]
mod tests {
    use serde::Serialize;
    use time::macros::date;

    use crate::{
        QueryKey, Resource,
        models::{Category, TransactionFilter},
    };

    #[test]
    fn equal_params_give_equal_keys() {
        let filter = TransactionFilter {
            start_date: Some(date!(2024 - 01 - 01)),
            end_date: None,
            category: Some(Category::Food),
        };

        let first = QueryKey::with_params(Resource::Transactions, &filter).unwrap();
        let second = QueryKey::with_params(Resource::Transactions, &filter.clone()).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.to_string(), "transactions?startDate=2024-01-01&category=food");
    }

    #[test]
    fn different_resources_give_different_keys() {
        let transactions = QueryKey::new(Resource::Transactions);
        let budgets = QueryKey::new(Resource::Budgets);

        assert_ne!(transactions, budgets);
        assert_eq!(budgets.to_string(), "budgets");
    }

    #[test]
    fn empty_filter_matches_unparameterized_key() {
        let key = QueryKey::with_params(Resource::Transactions, &TransactionFilter::default()).unwrap();

        assert_eq!(key, QueryKey::new(Resource::Transactions));
    }

    #[test]
    fn nested_params_are_rejected() {
        #[derive(Serialize)]
        struct Nested {
            inner: Vec<Vec<u8>>,
        }

        let result = QueryKey::with_params(
            Resource::Budgets,
            &Nested {
                inner: vec![vec![1]],
            },
        );

        assert!(result.is_err());
    }
}
