//! Minimal Swift-style object store used by the osbench tests.
//!
//! Implements v1 token auth and container listings, plus a few containers with fixed
//! failure behavior.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::time::{Duration, sleep};

pub const PATH_AUTH: &str = "/auth/v1.0";
pub const PATH_CONTAINER: &str = "/v1/{account}/{container}";

pub const ACCOUNT: &str = "AUTH_test";
pub const USER: &str = "test:tester";
pub const KEY: &str = "testing";

/// Objects in every listable container, named `{prefix}{i}` when a prefix is given.
pub const LISTING_OBJECTS: usize = 100;

/// Containers with this prefix do not exist.
pub const CONTAINER_MISSING_PREFIX: &str = "missing";
/// Always answers 500.
pub const CONTAINER_BROKEN: &str = "broken";
/// Containers with this prefix answer after [`SLOW_DELAY`].
pub const CONTAINER_SLOW: &str = "slow";
pub const SLOW_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Default)]
pub struct TestServerStats {
    requests_total: Arc<AtomicU64>,
    logins: Arc<AtomicU64>,
    unauthorized: Arc<AtomicU64>,
    listings: Arc<AtomicU64>,
    token_generation: Arc<AtomicU64>,
}

impl TestServerStats {
    fn inc_requests_total(&self) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
    }

    fn inc_logins(&self) {
        self.logins.fetch_add(1, Ordering::Relaxed);
    }

    fn inc_unauthorized(&self) {
        self.unauthorized.fetch_add(1, Ordering::Relaxed);
    }

    fn inc_listings(&self) {
        self.listings.fetch_add(1, Ordering::Relaxed);
    }

    fn current_token(&self) -> String {
        format!("AUTH_tk{}", self.token_generation.load(Ordering::Acquire))
    }

    pub fn requests_total(&self) -> u64 {
        self.requests_total.load(Ordering::Relaxed)
    }

    /// Successful auth requests.
    pub fn logins(&self) -> u64 {
        self.logins.load(Ordering::Relaxed)
    }

    /// Requests rejected with 401, on either endpoint.
    pub fn unauthorized(&self) -> u64 {
        self.unauthorized.load(Ordering::Relaxed)
    }

    /// Listings served with 200.
    pub fn listings(&self) -> u64 {
        self.listings.load(Ordering::Relaxed)
    }

    /// Invalidates every token handed out so far.
    pub fn revoke_tokens(&self) {
        self.token_generation.fetch_add(1, Ordering::AcqRel);
    }
}

#[derive(Debug, Clone)]
pub struct TestServerUrls {
    pub base_url: String,
    pub auth: String,
    /// Storage URL returned by a successful login.
    pub storage: String,
}

impl TestServerUrls {
    pub fn new(base_url: String) -> Self {
        Self {
            auth: format!("{base_url}{PATH_AUTH}"),
            storage: format!("{base_url}/v1/{ACCOUNT}"),
            base_url,
        }
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

async fn handle_auth(State(stats): State<TestServerStats>, headers: HeaderMap) -> Response {
    stats.inc_requests_total();

    if header_str(&headers, "x-auth-user") != Some(USER)
        || header_str(&headers, "x-auth-key") != Some(KEY)
    {
        stats.inc_unauthorized();
        return (StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
    }

    let Some(host) = header_str(&headers, header::HOST.as_str()) else {
        return (StatusCode::BAD_REQUEST, "missing host").into_response();
    };

    stats.inc_logins();
    (
        StatusCode::OK,
        [
            ("x-auth-token", stats.current_token()),
            ("x-storage-url", format!("http://{host}/v1/{ACCOUNT}")),
        ],
    )
        .into_response()
}

#[derive(Debug, Deserialize)]
struct ListingQuery {
    prefix: Option<String>,
}

async fn handle_container(
    State(stats): State<TestServerStats>,
    Path((account, container)): Path<(String, String)>,
    Query(query): Query<ListingQuery>,
    headers: HeaderMap,
) -> Response {
    stats.inc_requests_total();

    if header_str(&headers, "x-auth-token") != Some(stats.current_token().as_str()) {
        stats.inc_unauthorized();
        return (StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
    }
    if account != ACCOUNT || container.starts_with(CONTAINER_MISSING_PREFIX) {
        return (StatusCode::NOT_FOUND, "Not Found").into_response();
    }
    if container == CONTAINER_BROKEN {
        return (StatusCode::INTERNAL_SERVER_ERROR, "broken").into_response();
    }
    if container.starts_with(CONTAINER_SLOW) {
        sleep(SLOW_DELAY).await;
    }

    stats.inc_listings();
    let prefix = query.prefix.unwrap_or_default();
    (StatusCode::OK, listing(&prefix)).into_response()
}

/// Plain-text listing body, one object name per line.
pub fn listing(prefix: &str) -> String {
    (0..LISTING_OBJECTS)
        .map(|i| format!("{prefix}{i}\n"))
        .collect()
}

pub fn router(stats: TestServerStats) -> Router {
    Router::new()
        .route(PATH_AUTH, get(handle_auth))
        .route(PATH_CONTAINER, get(handle_container))
        .with_state(stats)
}

pub struct TestServer {
    addr: SocketAddr,
    base_url: String,
    urls: TestServerUrls,
    stats: TestServerStats,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<tokio::task::JoinHandle<()>>,
}

impl TestServer {
    pub async fn start() -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let stats = TestServerStats::default();

        let app = router(stats.clone());

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let serve = axum::serve(listener, app).with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            });
            let _ = serve.await;
        });

        let base_url = format!("http://{addr}");
        let urls = TestServerUrls::new(base_url.clone());

        Ok(Self {
            addr,
            base_url,
            urls,
            stats,
            shutdown_tx: Some(shutdown_tx),
            task: Some(task),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn urls(&self) -> &TestServerUrls {
        &self.urls
    }

    pub fn stats(&self) -> &TestServerStats {
        &self.stats
    }

    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }

        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if self.shutdown_tx.is_some()
            && let Some(task) = self.task.take()
        {
            task.abort();
        }
    }
}
