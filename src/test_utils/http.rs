//! An in-process mock of the Finance Service for tests.

use axum::Router;
use tokio::net::TcpListener;

use crate::{ApiClient, CacheConfig, ClientConfig, FinanceService, Session};

/// Serve `routes` under `/api` on an ephemeral local port and return the API URL.
pub(crate) async fn spawn_mock_server(routes: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Could not bind mock server");
    let address = listener.local_addr().expect("Could not get local address");
    let app = Router::new().nest("/api", routes);

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Mock server failed");
    });

    format!("http://{address}/api")
}

/// An [ApiClient] talking to a mock server serving `routes`.
pub(crate) async fn mock_client(routes: Router) -> ApiClient {
    let api_url = spawn_mock_server(routes).await;
    let config = ClientConfig::new(&api_url, "UTC").expect("Could not create config");

    ApiClient::new(config).expect("Could not create client")
}

/// A [FinanceService] for `session` talking to a mock server serving `routes`.
pub(crate) async fn mock_service(routes: Router, session: Session) -> FinanceService {
    let client = mock_client(routes).await;

    FinanceService::new(client, CacheConfig::default(), session)
}

/// An API URL that nothing is listening on.
pub(crate) async fn unused_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Could not bind listener");
    let address = listener.local_addr().expect("Could not get local address");
    drop(listener);

    format!("http://{address}/api")
}
