//! Finboard is the client side of a personal-finance dashboard.
//!
//! It talks to a remote Finance Service over HTTP, keeps query results in a
//! deduplicating in-memory cache, and turns raw transactions and budgets into
//! display-ready view models such as category totals, a 30-day spending
//! series and budget status.
//!
//! The usual entry point is [FinanceService], which ties together an
//! [ApiClient], a [QueryCache] and a [Session]. Errors that mean the session
//! is no longer valid ([Error::Unauthorized]) are left for a single
//! [ErrorHandler] to deal with.

#![warn(missing_docs)]

mod alert;
mod api;
mod cache;
mod config;
mod dashboard;
mod endpoints;
mod logging;
pub mod models;
mod navigation;
mod services;
mod session;
mod timezone;
mod validation;
pub mod view_model;

#[cfg(test)]
mod test_utils;

pub use alert::{Alert, AlertKind};
pub use api::ApiClient;
pub use cache::{CacheConfig, QueryCache, QueryKey, QueryState, QueryStatus, Resource, Subscription};
pub use config::{ClientConfig, DEFAULT_API_URL, DEFAULT_CREDENTIALS_PATH};
pub use dashboard::{Dashboard, Section};
pub use logging::{LOG_BODY_LENGTH_LIMIT, setup_logging};
pub use navigation::{ErrorHandler, NavLink, Navigator, Route, nav_links};
pub use services::{FinanceService, SavedBudget};
pub use session::{CredentialStore, Credentials, Session};
pub use timezone::{get_local_offset, local_today};
pub use validation::{
    parse_amount, validate_budget_limit, validate_csv_path, validate_registration,
    validate_transaction_form,
};

/// The errors that may occur in the application.
///
/// `Error` is [Clone] so that one failed request can be handed to every caller
/// waiting on it.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum Error {
    /// The user entered an amount that is not a number.
    #[error("\"{0}\" is not a valid amount")]
    InvalidAmount(String),

    /// A budget limit must be greater than zero.
    #[error("budget limits must be greater than zero")]
    NonPositiveBudgetLimit,

    /// A required form field was left empty.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// The file given for upload is not a CSV file.
    #[error("{0} is not a CSV file")]
    NotCsv(String),

    /// The string does not name a known category.
    #[error("\"{0}\" is not a valid category")]
    InvalidCategory(String),

    /// The string is not a valid `YYYY-MM-DD` date.
    #[error("\"{0}\" is not a valid date, expected YYYY-MM-DD")]
    InvalidDate(String),

    /// The request could not be sent or the response could not be read.
    #[error("could not reach the Finance Service: {0}")]
    Transport(String),

    /// The Finance Service replied with a body that could not be decoded.
    #[error("unexpected response from the Finance Service: {0}")]
    InvalidResponse(String),

    /// The Finance Service rejected the request.
    ///
    /// `message` is the server's own message, or the first field-level
    /// validation error if the server sent a list of them.
    #[error("{message}")]
    Server {
        /// The HTTP status code of the response.
        status: u16,
        /// The message to show the user.
        message: String,
    },

    /// The Finance Service rejected the session's credentials (HTTP 401).
    ///
    /// This error is not handled where it occurs. It should be passed up to
    /// [ErrorHandler], which clears the session and sends the user to the
    /// log in screen.
    #[error("your session has expired, please log in again")]
    Unauthorized,

    /// Reading or writing the stored credentials failed.
    #[error("could not access stored credentials: {0}")]
    Io(String),

    /// The configured timezone is not a canonical timezone name.
    #[error("invalid timezone {0}")]
    InvalidTimezone(String),

    /// The configured API URL could not be parsed.
    #[error("invalid API URL \"{0}\"")]
    InvalidBaseUrl(String),

    /// Query parameters could not be turned into a query string.
    #[error("invalid query parameters: {0}")]
    InvalidQueryParameters(String),

    /// A request body could not be serialized to JSON.
    #[error("invalid request body: {0}")]
    InvalidRequestBody(String),

    /// A cache entry held a payload of a different type than the one requested.
    ///
    /// This means two queries used the same key for different resources.
    #[error("cached payload for {0} has an unexpected type")]
    PayloadTypeMismatch(String),
}

impl From<reqwest::Error> for Error {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            Error::InvalidResponse(error.to_string())
        } else {
            tracing::warn!("request to the Finance Service failed: {error}");
            Error::Transport(error.to_string())
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Error::Io(error.to_string())
    }
}

impl Error {
    /// Whether the error was caught before any request was sent.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::InvalidAmount(_)
                | Error::NonPositiveBudgetLimit
                | Error::MissingField(_)
                | Error::NotCsv(_)
                | Error::InvalidCategory(_)
                | Error::InvalidDate(_)
        )
    }

    /// Convert the error into a notification for the user.
    pub fn into_alert(self) -> Alert {
        match self {
            Error::InvalidAmount(_) => Alert::error("Invalid amount", "Please enter a valid number."),
            Error::NonPositiveBudgetLimit => Alert::error(
                "Invalid amount",
                "Please enter a valid budget amount.",
            ),
            Error::NotCsv(_) => Alert::error("Invalid file type", "Please upload a CSV file."),
            error @ (Error::MissingField(_) | Error::InvalidCategory(_) | Error::InvalidDate(_)) => {
                Alert::error("Error", &error.to_string())
            }
            Error::Server { message, .. } => Alert::error("Error", &message),
            Error::Unauthorized => Alert::error(
                "Session expired",
                "Your session has expired. Please log in again.",
            ),
            Error::Transport(_) => Alert::error(
                "Network error",
                "Could not reach the Finance Service. Check your connection and try again.",
            ),
            error @ (Error::Io(_) | Error::InvalidTimezone(_) | Error::InvalidBaseUrl(_)) => {
                Alert::error("Configuration error", &error.to_string())
            }
            // Anything else is not something the user can fix.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                Alert::error(
                    "Something went wrong",
                    "An unexpected error occurred, check the logs for more details.",
                )
            }
        }
    }
}
