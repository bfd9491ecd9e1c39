//! The HTTP client for the Finance Service.
//!
//! [ApiClient] has one method per endpoint. Every method takes the [Session]
//! explicitly and sends its bearer token when there is one. A 401 response to
//! a request that carried a token becomes [Error::Unauthorized] and nothing
//! else happens here: the session is left for [crate::ErrorHandler] to clear.

mod response;

use std::path::Path;

use reqwest::{
    Method, RequestBuilder, StatusCode,
    header::CONTENT_TYPE,
    multipart::{Form, Part},
};
use serde::Serialize;

use crate::{
    ClientConfig, Error, Session,
    endpoints::{self, format_endpoint},
    logging::{log_request, log_response},
    models::{
        AuthResponse, Budget, BudgetUpdate, CurrentMonthBudget, GenerateInsightRequest,
        LogInRequest, NewBudget, NewTransaction, RegisterRequest, SpendingInsight, Transaction,
        TransactionFilter, TransactionUpdate,
    },
};

use response::{decode, imported_count, server_error};

/// A typed client for every Finance Service endpoint.
///
/// Cloning is cheap and clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    config: ClientConfig,
}

impl ApiClient {
    /// Create a client for the Finance Service described by `config`.
    ///
    /// # Errors
    /// Returns [Error::Transport] if the HTTP client cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self { client, config })
    }

    /// The configuration the client was created with.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Create an account. The caller is responsible for storing the returned credentials.
    pub async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse, Error> {
        self.send_json(&Session::anonymous(), Method::POST, endpoints::REGISTER, request)
            .await
            .and_then(|body| decode(&body))
    }

    /// Log in. The caller is responsible for storing the returned credentials.
    pub async fn login(&self, request: &LogInRequest) -> Result<AuthResponse, Error> {
        self.send_json(&Session::anonymous(), Method::POST, endpoints::LOG_IN, request)
            .await
            .and_then(|body| decode(&body))
    }

    /// List the user's transactions that match `filter`.
    pub async fn transactions(
        &self,
        session: &Session,
        filter: &TransactionFilter,
    ) -> Result<Vec<Transaction>, Error> {
        let query = serde_urlencoded::to_string(filter)
            .map_err(|error| Error::InvalidQueryParameters(error.to_string()))?;

        self.send_query(session, endpoints::TRANSACTIONS, &query)
            .await
            .and_then(|body| decode(&body))
    }

    /// Fetch one transaction by its ID.
    pub async fn transaction(&self, session: &Session, id: &str) -> Result<Transaction, Error> {
        let path = format_endpoint(endpoints::TRANSACTION, id);

        self.send_query(session, &path, "")
            .await
            .and_then(|body| decode(&body))
    }

    /// Record a new transaction and return it as stored.
    pub async fn create_transaction(
        &self,
        session: &Session,
        transaction: &NewTransaction,
    ) -> Result<Transaction, Error> {
        self.send_json(session, Method::POST, endpoints::TRANSACTIONS, transaction)
            .await
            .and_then(|body| decode(&body))
    }

    /// Change the fields set in `update` and return the updated transaction.
    pub async fn update_transaction(
        &self,
        session: &Session,
        id: &str,
        update: &TransactionUpdate,
    ) -> Result<Transaction, Error> {
        let path = format_endpoint(endpoints::TRANSACTION, id);

        self.send_json(session, Method::PUT, &path, update)
            .await
            .and_then(|body| decode(&body))
    }

    /// Delete a transaction.
    pub async fn delete_transaction(&self, session: &Session, id: &str) -> Result<(), Error> {
        let path = format_endpoint(endpoints::TRANSACTION, id);

        self.send_delete(session, &path).await
    }

    /// Upload a CSV file of transactions for the Finance Service to import.
    ///
    /// The file is sent as-is in the multipart field `file`. Returns the number
    /// of transactions imported.
    ///
    /// # Errors
    /// Returns [Error::Io] if the file cannot be read, or an error from the request.
    pub async fn upload_csv(&self, session: &Session, path: &Path) -> Result<u64, Error> {
        let contents = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "transactions.csv".to_owned());

        let part = Part::bytes(contents)
            .file_name(file_name.clone())
            .mime_str("text/csv")?;
        let form = Form::new().part("file", part);

        let url = self.config.endpoint_url(endpoints::TRANSACTIONS_UPLOAD);
        log_request(&Method::POST, &url, Some(&format!("<multipart file {file_name}>")));

        let request = self.request(session, Method::POST, &url).multipart(form);

        self.execute(session, request, &url)
            .await
            .and_then(|body| imported_count(&body))
    }

    /// List the user's budgets with how much has been spent against each.
    pub async fn budgets(&self, session: &Session) -> Result<Vec<Budget>, Error> {
        self.send_query(session, endpoints::BUDGETS, "")
            .await
            .and_then(|body| decode(&body))
    }

    /// Fetch one budget by its ID.
    pub async fn budget(&self, session: &Session, id: &str) -> Result<Budget, Error> {
        let path = format_endpoint(endpoints::BUDGET, id);

        self.send_query(session, &path, "")
            .await
            .and_then(|body| decode(&body))
    }

    /// Create a budget and return it as stored.
    pub async fn create_budget(&self, session: &Session, budget: &NewBudget) -> Result<Budget, Error> {
        self.send_json(session, Method::POST, endpoints::BUDGETS, budget)
            .await
            .and_then(|body| decode(&body))
    }

    /// Change a budget's limit.
    pub async fn update_budget(
        &self,
        session: &Session,
        id: &str,
        update: &BudgetUpdate,
    ) -> Result<Budget, Error> {
        let path = format_endpoint(endpoints::BUDGET, id);

        self.send_json(session, Method::PUT, &path, update)
            .await
            .and_then(|body| decode(&body))
    }

    /// Delete a budget.
    pub async fn delete_budget(&self, session: &Session, id: &str) -> Result<(), Error> {
        let path = format_endpoint(endpoints::BUDGET, id);

        self.send_delete(session, &path).await
    }

    /// Fetch the Finance Service's summary of this month's budgets.
    pub async fn current_month_budget(&self, session: &Session) -> Result<CurrentMonthBudget, Error> {
        self.send_query(session, endpoints::CURRENT_MONTH_BUDGET, "")
            .await
            .and_then(|body| decode(&body))
    }

    /// The latest spending insight, optionally for `month` (`YYYY-MM`).
    pub async fn analysis(
        &self,
        session: &Session,
        month: Option<&str>,
    ) -> Result<SpendingInsight, Error> {
        let query = month_query(month)?;

        self.send_query(session, endpoints::ANALYSIS, &query)
            .await
            .and_then(|body| decode(&body))
    }

    /// The spending insight for `month` (`YYYY-MM`).
    pub async fn monthly_analysis(
        &self,
        session: &Session,
        month: &str,
    ) -> Result<SpendingInsight, Error> {
        let path = format_endpoint(endpoints::MONTHLY_ANALYSIS, month);

        self.send_query(session, &path, "")
            .await
            .and_then(|body| decode(&body))
    }

    /// Ask the Finance Service to generate a new insight.
    pub async fn generate_analysis(
        &self,
        session: &Session,
        request: &GenerateInsightRequest,
    ) -> Result<SpendingInsight, Error> {
        self.send_json(session, Method::POST, endpoints::GENERATE_ANALYSIS, request)
            .await
            .and_then(|body| decode(&body))
    }

    fn request(&self, session: &Session, method: Method, url: &str) -> RequestBuilder {
        let request = self.client.request(method, url);

        match session.token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send_query(&self, session: &Session, path: &str, query: &str) -> Result<String, Error> {
        let mut url = self.config.endpoint_url(path);
        if !query.is_empty() {
            url = format!("{url}?{query}");
        }

        log_request(&Method::GET, &url, None);
        let request = self.request(session, Method::GET, &url);

        self.execute(session, request, &url).await
    }

    async fn send_json<B>(
        &self,
        session: &Session,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<String, Error>
    where
        B: Serialize + ?Sized,
    {
        let url = self.config.endpoint_url(path);
        let body = serde_json::to_string(body)
            .map_err(|error| Error::InvalidRequestBody(error.to_string()))?;

        log_request(&method, &url, Some(&body));
        let request = self
            .request(session, method, &url)
            .header(CONTENT_TYPE, "application/json")
            .body(body);

        self.execute(session, request, &url).await
    }

    async fn send_delete(&self, session: &Session, path: &str) -> Result<(), Error> {
        let url = self.config.endpoint_url(path);

        log_request(&Method::DELETE, &url, None);
        let request = self.request(session, Method::DELETE, &url);

        self.execute(session, request, &url).await.map(|_| ())
    }

    /// Send `request` and return the body of a successful response.
    ///
    /// A 401 only means the session has expired if `session` sent a token.
    /// Without one, e.g. a log in with the wrong password, it is reported as
    /// [Error::Server] with the server's message.
    async fn execute(
        &self,
        session: &Session,
        request: RequestBuilder,
        url: &str,
    ) -> Result<String, Error> {
        let sent_token = session.is_authenticated();
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        log_response(status, url, &body);

        if status == StatusCode::UNAUTHORIZED && sent_token {
            return Err(Error::Unauthorized);
        }

        if !status.is_success() {
            return Err(server_error(status, &body));
        }

        Ok(body)
    }
}

fn month_query(month: Option<&str>) -> Result<String, Error> {
    match month {
        Some(month) => serde_urlencoded::to_string([("month", month)])
            .map_err(|error| Error::InvalidQueryParameters(error.to_string())),
        None => Ok(String::new()),
    }
}
