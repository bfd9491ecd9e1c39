//! Query and mutation bindings for each Finance Service resource.
//!
//! Each query declares the cache key it is stored under and each mutation
//! declares which resources it invalidates. Consumers go through
//! [FinanceService] rather than [ApiClient] so that repeated and concurrent
//! reads are deduplicated and writes are followed by a refetch.

use std::path::Path;

use time::Date;

use crate::{
    ApiClient, CacheConfig, ClientConfig, CredentialStore, Credentials, Dashboard, Error,
    QueryCache, QueryKey, QueryState, Resource, Session,
    models::{
        AuthResponse, Budget, BudgetCategory, BudgetUpdate, CurrentMonthBudget,
        GenerateInsightRequest, LogInRequest, NewBudget, NewTransaction, RegisterRequest,
        SpendingInsight, Transaction, TransactionFilter, TransactionUpdate, User,
    },
    validation::validate_csv_path,
};

/// Creating, editing, deleting or importing transactions changes what has
/// been spent against each budget.
const TRANSACTION_MUTATION_INVALIDATES: [Resource; 3] = [
    Resource::Transactions,
    Resource::Budgets,
    Resource::CurrentMonthBudget,
];

const BUDGET_MUTATION_INVALIDATES: [Resource; 2] =
    [Resource::Budgets, Resource::CurrentMonthBudget];

const INSIGHT_MUTATION_INVALIDATES: [Resource; 2] =
    [Resource::Analysis, Resource::MonthlyAnalysis];

/// The result of [FinanceService::set_budget].
#[derive(Debug, Clone, PartialEq)]
pub enum SavedBudget {
    /// No budget existed for the category, so one was created.
    Created(Budget),
    /// The existing budget for the category was given the new limit.
    Updated(Budget),
}

impl SavedBudget {
    /// The saved budget.
    pub fn budget(&self) -> &Budget {
        match self {
            SavedBudget::Created(budget) | SavedBudget::Updated(budget) => budget,
        }
    }
}

/// Cached access to the Finance Service for one session.
///
/// Cloning is cheap and clones share the same cache and session.
#[derive(Debug, Clone)]
pub struct FinanceService {
    api: ApiClient,
    cache: QueryCache,
    session: Session,
}

impl FinanceService {
    /// Create a service from its parts.
    pub fn new(api: ApiClient, cache_config: CacheConfig, session: Session) -> Self {
        Self {
            api,
            cache: QueryCache::new(cache_config),
            session,
        }
    }

    /// Create a service from `config`, restoring the session from the
    /// configured credentials file.
    ///
    /// # Errors
    /// Returns [Error::Io] if the credentials file exists but cannot be read,
    /// or [Error::Transport] if the HTTP client cannot be built.
    pub fn from_config(config: ClientConfig) -> Result<Self, Error> {
        let session = Session::restore(CredentialStore::new(&config.credentials_path))?;
        let cache_config = config.cache;
        let api = ApiClient::new(config)?;

        Ok(Self::new(api, cache_config, session))
    }

    /// The session every request is made for.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// The cache shared by every query.
    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// The HTTP client, for calls that should not be cached.
    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Log in and start a session for the returned user.
    ///
    /// Anything cached for a previous user is dropped.
    pub async fn log_in(&self, email: &str, password: &str) -> Result<User, Error> {
        let request = LogInRequest {
            email: email.trim().to_owned(),
            password: password.to_owned(),
        };

        let response = self.api.login(&request).await?;
        self.start_session(response)
    }

    /// Create an account and start a session for it.
    pub async fn register(&self, request: &RegisterRequest) -> Result<User, Error> {
        let response = self.api.register(request).await?;
        self.start_session(response)
    }

    fn start_session(&self, response: AuthResponse) -> Result<User, Error> {
        let user = response.user.clone();

        self.cache.clear();
        self.session.log_in(Credentials {
            token: response.token,
            user: response.user,
        })?;

        Ok(user)
    }

    /// End the session and forget everything cached for it.
    pub fn log_out(&self) -> Result<(), Error> {
        self.cache.clear();
        self.session.clear()
    }

    /// The transactions matching `filter`, from the cache if fresh.
    pub async fn transactions(&self, filter: &TransactionFilter) -> QueryState<Vec<Transaction>> {
        let key = match QueryKey::with_params(Resource::Transactions, filter) {
            Ok(key) => key,
            Err(error) => return QueryState::Error(error),
        };
        let (api, session, filter) = (self.api.clone(), self.session.clone(), filter.clone());

        self.cache
            .query(&self.session, key, move || async move {
                api.transactions(&session, &filter).await
            })
            .await
    }

    /// One transaction, from the cache if fresh.
    pub async fn transaction(&self, id: &str) -> QueryState<Transaction> {
        let key = match QueryKey::with_params(Resource::Transactions, &[("id", id)]) {
            Ok(key) => key,
            Err(error) => return QueryState::Error(error),
        };
        let (api, session, id) = (self.api.clone(), self.session.clone(), id.to_owned());

        self.cache
            .query(&self.session, key, move || async move {
                api.transaction(&session, &id).await
            })
            .await
    }

    /// Record a transaction. Cached transactions and budgets are refetched on their next query.
    pub async fn create_transaction(&self, transaction: &NewTransaction) -> Result<Transaction, Error> {
        self.cache
            .mutate(
                &TRANSACTION_MUTATION_INVALIDATES,
                self.api.create_transaction(&self.session, transaction),
            )
            .await
    }

    /// Change a transaction. Cached transactions and budgets are refetched on their next query.
    pub async fn update_transaction(
        &self,
        id: &str,
        update: &TransactionUpdate,
    ) -> Result<Transaction, Error> {
        self.cache
            .mutate(
                &TRANSACTION_MUTATION_INVALIDATES,
                self.api.update_transaction(&self.session, id, update),
            )
            .await
    }

    /// Delete a transaction. Cached transactions and budgets are refetched on their next query.
    pub async fn delete_transaction(&self, id: &str) -> Result<(), Error> {
        self.cache
            .mutate(
                &TRANSACTION_MUTATION_INVALIDATES,
                self.api.delete_transaction(&self.session, id),
            )
            .await
    }

    /// Upload a CSV file of transactions. Returns how many were imported.
    ///
    /// # Errors
    /// Returns [Error::NotCsv] without sending anything if `path` does not
    /// name a `.csv` file.
    pub async fn upload_csv(&self, path: &Path) -> Result<u64, Error> {
        validate_csv_path(path)?;

        self.cache
            .mutate(
                &TRANSACTION_MUTATION_INVALIDATES,
                self.api.upload_csv(&self.session, path),
            )
            .await
    }

    /// Every budget, from the cache if fresh.
    pub async fn budgets(&self) -> QueryState<Vec<Budget>> {
        let (api, session) = (self.api.clone(), self.session.clone());

        self.cache
            .query(&self.session, QueryKey::new(Resource::Budgets), move || async move {
                api.budgets(&session).await
            })
            .await
    }

    /// One budget, from the cache if fresh.
    pub async fn budget(&self, id: &str) -> QueryState<Budget> {
        let key = match QueryKey::with_params(Resource::Budgets, &[("id", id)]) {
            Ok(key) => key,
            Err(error) => return QueryState::Error(error),
        };
        let (api, session, id) = (self.api.clone(), self.session.clone(), id.to_owned());

        self.cache
            .query(&self.session, key, move || async move {
                api.budget(&session, &id).await
            })
            .await
    }

    /// This month's budget summary, from the cache if fresh.
    pub async fn current_month_budget(&self) -> QueryState<CurrentMonthBudget> {
        let (api, session) = (self.api.clone(), self.session.clone());

        self.cache
            .query(
                &self.session,
                QueryKey::new(Resource::CurrentMonthBudget),
                move || async move { api.current_month_budget(&session).await },
            )
            .await
    }

    /// Create a budget. Cached budgets are refetched on their next query.
    pub async fn create_budget(&self, budget: &NewBudget) -> Result<Budget, Error> {
        self.cache
            .mutate(
                &BUDGET_MUTATION_INVALIDATES,
                self.api.create_budget(&self.session, budget),
            )
            .await
    }

    /// Change a budget's limit. Cached budgets are refetched on their next query.
    pub async fn update_budget(&self, id: &str, limit: f64) -> Result<Budget, Error> {
        self.cache
            .mutate(
                &BUDGET_MUTATION_INVALIDATES,
                self.api.update_budget(&self.session, id, &BudgetUpdate { limit }),
            )
            .await
    }

    /// Delete a budget. Cached budgets are refetched on their next query.
    pub async fn delete_budget(&self, id: &str) -> Result<(), Error> {
        self.cache
            .mutate(
                &BUDGET_MUTATION_INVALIDATES,
                self.api.delete_budget(&self.session, id),
            )
            .await
    }

    /// Set the limit for `category`, updating its budget if it has one and
    /// otherwise creating a budget for the month of `today`.
    pub async fn set_budget(
        &self,
        category: BudgetCategory,
        limit: f64,
        today: Date,
    ) -> Result<SavedBudget, Error> {
        let existing = match self.budgets().await {
            QueryState::Success(budgets) => budgets
                .into_iter()
                .find(|budget| budget.category == category),
            QueryState::Error(error) => return Err(error),
            QueryState::Idle | QueryState::Loading => return Err(Error::Unauthorized),
        };

        match existing {
            Some(budget) => self
                .update_budget(&budget.id, limit)
                .await
                .map(SavedBudget::Updated),
            None => self
                .create_budget(&NewBudget::for_month(category, limit, today))
                .await
                .map(SavedBudget::Created),
        }
    }

    /// The latest spending insight, or the one for `month` (`YYYY-MM`).
    pub async fn analysis(&self, month: Option<&str>) -> QueryState<SpendingInsight> {
        let key = match month {
            Some(month) => match QueryKey::with_params(Resource::Analysis, &[("month", month)]) {
                Ok(key) => key,
                Err(error) => return QueryState::Error(error),
            },
            None => QueryKey::new(Resource::Analysis),
        };
        let (api, session) = (self.api.clone(), self.session.clone());
        let month = month.map(str::to_owned);

        self.cache
            .query(&self.session, key, move || async move {
                api.analysis(&session, month.as_deref()).await
            })
            .await
    }

    /// The spending insight for `month` (`YYYY-MM`).
    ///
    /// An empty `month` leaves the query idle.
    pub async fn monthly_analysis(&self, month: &str) -> QueryState<SpendingInsight> {
        if month.is_empty() {
            return QueryState::Idle;
        }

        let key = match QueryKey::with_params(Resource::MonthlyAnalysis, &[("month", month)]) {
            Ok(key) => key,
            Err(error) => return QueryState::Error(error),
        };
        let (api, session, month) = (self.api.clone(), self.session.clone(), month.to_owned());

        self.cache
            .query(&self.session, key, move || async move {
                api.monthly_analysis(&session, &month).await
            })
            .await
    }

    /// Ask the Finance Service for a fresh insight.
    pub async fn generate_analysis(&self, month: Option<&str>) -> Result<SpendingInsight, Error> {
        let request = GenerateInsightRequest {
            month: month.map(str::to_owned),
        };

        self.cache
            .mutate(
                &INSIGHT_MUTATION_INVALIDATES,
                self.api.generate_analysis(&self.session, &request),
            )
            .await
    }

    /// Load everything the dashboard shows. The three queries run concurrently
    /// and each section is built from whatever its query returned.
    ///
    /// # Errors
    /// Returns [Error::Unauthorized] if any query was rejected for lack of a
    /// valid session. Other failures become placeholder sections.
    pub async fn load_dashboard(&self, today: Date) -> Result<Dashboard, Error> {
        let filter = TransactionFilter::default();

        let (transactions, budgets, insight) = tokio::join!(
            self.transactions(&filter),
            self.budgets(),
            self.analysis(None),
        );

        Dashboard::assemble(transactions, budgets, insight, today)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use axum::{
        Json, Router,
        extract::Path,
        http::StatusCode,
        routing::{get, post, put},
    };
    use serde_json::{Value, json};
    use time::macros::date;

    use crate::{
        Error, QueryState, Session,
        models::{BudgetCategory, Category, NewTransaction, TransactionFilter},
        services::SavedBudget,
        test_utils::{authenticated_session, mock_service, temp_path},
    };

    fn counter() -> Arc<AtomicUsize> {
        Arc::new(AtomicUsize::new(0))
    }

    fn counted_budgets(calls: Arc<AtomicUsize>) -> Router {
        Router::new().route(
            "/budgets",
            get(move || {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Json(json!({
                        "data": [{ "_id": "b1", "category": "food", "limit": 200, "spent": 50 }]
                    }))
                }
            }),
        )
    }

    #[tokio::test]
    async fn concurrent_queries_make_one_request() {
        let calls = counter();
        let service = mock_service(counted_budgets(calls.clone()), authenticated_session("t")).await;

        let (first, second) = tokio::join!(service.budgets(), service.budgets());

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(first, second);
        assert_eq!(first.data().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn anonymous_queries_send_nothing() {
        let calls = counter();
        let service = mock_service(counted_budgets(calls.clone()), Session::anonymous()).await;

        assert_eq!(service.budgets().await, QueryState::Idle);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn creating_a_transaction_refetches_transactions_and_budgets() {
        let transaction_calls = counter();
        let budget_calls = counter();
        let routes = counted_budgets(budget_calls.clone()).route(
            "/transactions",
            get({
                let calls = transaction_calls.clone();
                move || {
                    let calls = calls.clone();
                    async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Json(json!([]))
                    }
                }
            })
            .post(|Json(body): Json<Value>| async move {
                Json(json!({
                    "data": {
                        "_id": "t1",
                        "date": body["date"],
                        "description": body["description"],
                        "amount": body["amount"],
                        "category": body["category"],
                    }
                }))
            }),
        );
        let service = mock_service(routes, authenticated_session("t")).await;
        let filter = TransactionFilter::default();

        service.transactions(&filter).await;
        service.budgets().await;

        let created = service
            .create_transaction(&NewTransaction::new(
                date!(2024 - 03 - 05),
                "Lunch",
                -15.0,
                Category::Food,
            ))
            .await
            .unwrap();
        assert_eq!(created.id, "t1");

        service.transactions(&filter).await;
        service.budgets().await;

        assert_eq!(transaction_calls.load(Ordering::SeqCst), 2);
        assert_eq!(budget_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failed_mutation_does_not_refetch() {
        let calls = counter();
        let routes = counted_budgets(calls.clone()).route(
            "/budgets/{id}",
            put(|| async {
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "errors": [{ "msg": "Limit must be positive" }] })),
                )
            }),
        );
        let service = mock_service(routes, authenticated_session("t")).await;

        service.budgets().await;
        let result = service.update_budget("b1", 100.0).await;
        service.budgets().await;

        assert_eq!(
            result,
            Err(Error::Server {
                status: 400,
                message: "Limit must be positive".to_owned()
            })
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn set_budget_updates_existing_category() {
        let routes = counted_budgets(counter())
            .route(
                "/budgets/{id}",
                put(|Path(id): Path<String>, Json(body): Json<Value>| async move {
                    Json(json!({ "_id": id, "category": "food", "limit": body["limit"], "spent": 50 }))
                }),
            )
            .route(
                "/budgets",
                post(|Json(body): Json<Value>| async move {
                    Json(json!({ "_id": "b2", "category": body["category"], "limit": body["limit"] }))
                }),
            );
        let service = mock_service(routes, authenticated_session("t")).await;
        let today = date!(2024 - 03 - 05);

        let updated = service
            .set_budget(Category::Food.into(), 300.0, today)
            .await
            .unwrap();
        let created = service
            .set_budget(BudgetCategory::TOTAL, 1000.0, today)
            .await
            .unwrap();

        assert!(matches!(&updated, SavedBudget::Updated(budget) if budget.id == "b1"));
        assert_eq!(updated.budget().amount, 300.0);
        assert!(matches!(&created, SavedBudget::Created(budget) if budget.category.is_total()));
    }

    #[tokio::test]
    async fn upload_rejects_non_csv_without_request() {
        let calls = counter();
        let routes = Router::new().route(
            "/transactions/upload",
            post({
                let calls = calls.clone();
                move || {
                    let calls = calls.clone();
                    async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Json(json!({ "count": 1 }))
                    }
                }
            }),
        );
        let service = mock_service(routes, authenticated_session("t")).await;

        let result = service.upload_csv(&temp_path("statement.pdf")).await;

        assert!(matches!(result, Err(Error::NotCsv(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn generating_analysis_invalidates_insights() {
        let calls = counter();
        let routes = Router::new()
            .route(
                "/analysis",
                get({
                    let calls = calls.clone();
                    move || {
                        let calls = calls.clone();
                        async move {
                            let n = calls.fetch_add(1, Ordering::SeqCst);
                            Json(json!({ "data": { "summary": format!("insight {n}") } }))
                        }
                    }
                }),
            )
            .route(
                "/analysis/generate",
                post(|| async { Json(json!({ "data": { "summary": "generated" } })) }),
            );
        let service = mock_service(routes, authenticated_session("t")).await;

        let before = service.analysis(None).await;
        service.generate_analysis(None).await.unwrap();
        let after = service.analysis(None).await;

        assert_eq!(before.data().map(|i| i.summary.as_str()), Some("insight 0"));
        assert_eq!(after.data().map(|i| i.summary.as_str()), Some("insight 1"));
    }

    #[tokio::test]
    async fn log_in_starts_session_and_log_out_ends_it() {
        let routes = Router::new().route(
            "/auth/login",
            post(|| async {
                Json(json!({
                    "data": {
                        "token": "fresh",
                        "user": { "_id": "u1", "email": "ada@example.com", "name": "Ada" }
                    }
                }))
            }),
        );
        let service = mock_service(routes, Session::anonymous()).await;

        let user = service.log_in("ada@example.com ", "hunter2").await.unwrap();

        assert_eq!(user.name, "Ada");
        assert_eq!(service.session().token().as_deref(), Some("fresh"));

        service.log_out().unwrap();

        assert!(!service.session().is_authenticated());
        assert!(service.cache().is_empty());
    }

    #[tokio::test]
    async fn dashboard_loads_sections_independently() {
        let routes = Router::new()
            .route(
                "/transactions",
                get(|| async {
                    Json(json!([
                        { "_id": "t1", "date": "2024-03-04", "description": "Shop", "amount": -50, "category": "food" },
                        { "_id": "t2", "date": "2024-03-01", "description": "Pay", "amount": 200, "category": "income" },
                    ]))
                }),
            )
            .route(
                "/budgets",
                get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({}))) }),
            )
            .route(
                "/analysis",
                get(|| async { Json(json!({ "data": { "summary": "All good" } })) }),
            );
        let service = mock_service(routes, authenticated_session("t")).await;

        let dashboard = service.load_dashboard(date!(2024 - 03 - 05)).await.unwrap();

        assert!(dashboard.stats.is_ready());
        assert!(!dashboard.budgets.is_ready());
        assert!(dashboard.insight.is_ready());
    }

    #[tokio::test]
    async fn dashboard_reports_unauthorized() {
        let routes = Router::new()
            .route("/transactions", get(|| async { StatusCode::UNAUTHORIZED }))
            .route("/budgets", get(|| async { Json(json!([])) }))
            .route("/analysis", get(|| async { Json(json!({})) }));
        let service = mock_service(routes, authenticated_session("t")).await;

        let result = service.load_dashboard(date!(2024 - 03 - 05)).await;

        assert!(matches!(result, Err(Error::Unauthorized)));
    }
}
