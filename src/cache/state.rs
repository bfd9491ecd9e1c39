use crate::Error;

/// The status of a query without its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    /// The query has not run, e.g. because nobody is logged in.
    Idle,
    /// The first fetch is in flight.
    Loading,
    /// The last fetch succeeded.
    Success,
    /// The last fetch failed.
    Error,
}

/// The state of a query as seen by a consumer.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryState<T> {
    /// The query has not run, e.g. because nobody is logged in.
    Idle,
    /// The first fetch is in flight.
    Loading,
    /// The last fetch succeeded with this data.
    Success(T),
    /// The last fetch failed with this error.
    Error(Error),
}

impl<T> QueryState<T> {
    /// The status without the data.
    pub fn status(&self) -> QueryStatus {
        match self {
            QueryState::Idle => QueryStatus::Idle,
            QueryState::Loading => QueryStatus::Loading,
            QueryState::Success(_) => QueryStatus::Success,
            QueryState::Error(_) => QueryStatus::Error,
        }
    }

    /// Whether a first fetch is in flight.
    pub fn is_loading(&self) -> bool {
        matches!(self, QueryState::Loading)
    }

    /// The data, if the query succeeded.
    pub fn data(&self) -> Option<&T> {
        match self {
            QueryState::Success(data) => Some(data),
            _ => None,
        }
    }

    /// The error, if the query failed.
    pub fn error(&self) -> Option<&Error> {
        match self {
            QueryState::Error(error) => Some(error),
            _ => None,
        }
    }

    /// The outcome of a settled query, or `None` if it is idle or loading.
    pub fn into_result(self) -> Option<Result<T, Error>> {
        match self {
            QueryState::Success(data) => Some(Ok(data)),
            QueryState::Error(error) => Some(Err(error)),
            QueryState::Idle | QueryState::Loading => None,
        }
    }

    /// Transform the data of a successful query.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> QueryState<U> {
        match self {
            QueryState::Idle => QueryState::Idle,
            QueryState::Loading => QueryState::Loading,
            QueryState::Success(data) => QueryState::Success(f(data)),
            QueryState::Error(error) => QueryState::Error(error),
        }
    }

    /// Borrow the data instead of owning it.
    pub fn as_ref(&self) -> QueryState<&T> {
        match self {
            QueryState::Idle => QueryState::Idle,
            QueryState::Loading => QueryState::Loading,
            QueryState::Success(data) => QueryState::Success(data),
            QueryState::Error(error) => QueryState::Error(error.clone()),
        }
    }
}

impl<T> From<Result<T, Error>> for QueryState<T> {
    fn from(result: Result<T, Error>) -> Self {
        match result {
            Ok(data) => QueryState::Success(data),
            Err(error) => QueryState::Error(error),
        }
    }
}
