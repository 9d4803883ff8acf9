use std::io::Read as _;
use std::sync::Arc;
use std::time::{Duration, Instant};

use osbench_core::runner::{RunConfig, run_operator};
use osbench_core::{
    Config, Interrupt, StorageApi, StorageError, StorageErrorKind, create_operator,
};
use osbench_http::HttpStorage;
use osbench_testserver::{KEY, TestServer, USER};
use tokio::runtime::Handle;

fn config(s: &str) -> Config {
    match s.parse() {
        Ok(v) => v,
        Err(err) => panic!("config {s:?}: {err}"),
    }
}

fn swift_config(server: &TestServer, password: &str) -> Config {
    Config::new()
        .with("auth_url", server.urls().auth.clone())
        .with("username", USER)
        .with("password", password)
}

fn storage(cfg: &Config) -> Arc<HttpStorage> {
    match HttpStorage::from_config(cfg, Handle::current()) {
        Ok(v) => Arc::new(v),
        Err(err) => panic!("http storage: {err}"),
    }
}

/// Runs a blocking storage call off the runtime, as the worker threads do.
async fn blocking<T: Send + 'static>(f: impl FnOnce() -> T + Send + 'static) -> T {
    match tokio::task::spawn_blocking(f).await {
        Ok(v) => v,
        Err(err) => panic!("blocking task failed: {err}"),
    }
}

fn read_listing(
    api: &HttpStorage,
    container: &str,
    prefix: &str,
) -> Result<String, StorageError> {
    let mut stream = api.list(container, prefix, &Config::new())?;
    let mut body = String::new();
    stream
        .read_to_string(&mut body)
        .map_err(StorageError::from_stream_error)?;
    Ok(body)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn lists_container_after_lazy_login() {
    let server = match TestServer::start().await {
        Ok(v) => v,
        Err(err) => panic!("testserver: {err}"),
    };
    let api = storage(&swift_config(&server, KEY));

    let body = {
        let api = api.clone();
        blocking(move || read_listing(&api, "mycontainers1", "myobjects1")).await
    };
    match body {
        Ok(body) => assert_eq!(body, osbench_testserver::listing("myobjects1")),
        Err(err) => panic!("listing failed: {err}"),
    }

    assert_eq!(server.stats().logins(), 1);
    assert_eq!(server.stats().listings(), 1);
    server.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn missing_and_broken_containers_are_backend_failures() {
    let server = match TestServer::start().await {
        Ok(v) => v,
        Err(err) => panic!("testserver: {err}"),
    };
    let api = storage(&swift_config(&server, KEY));

    let (missing, broken) = {
        let api = api.clone();
        blocking(move || {
            (
                read_listing(&api, "missing1", "o").map(|_| ()),
                read_listing(&api, "broken", "o").map(|_| ()),
            )
        })
        .await
    };

    match missing {
        Err(err) => {
            assert_eq!(err.kind(), StorageErrorKind::Backend);
            assert_eq!(err.failure().message(), "404 Not Found");
        }
        Ok(()) => panic!("expected 404"),
    }
    match broken {
        Err(err) => assert_eq!(err.kind(), StorageErrorKind::Backend),
        Ok(()) => panic!("expected 500"),
    }
    server.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn slow_response_times_out_as_backend_failure() {
    let server = match TestServer::start().await {
        Ok(v) => v,
        Err(err) => panic!("testserver: {err}"),
    };
    let api = storage(&swift_config(&server, KEY).with("timeout", "100"));

    let res = {
        let api = api.clone();
        blocking(move || read_listing(&api, osbench_testserver::CONTAINER_SLOW, "o")).await
    };
    match res {
        Err(err) => {
            assert_eq!(err.kind(), StorageErrorKind::Backend);
            assert!(err.failure().message().contains("timed out"));
        }
        Ok(_) => panic!("expected timeout"),
    }
    server.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn rejected_credentials_are_unclassified_401() {
    let server = match TestServer::start().await {
        Ok(v) => v,
        Err(err) => panic!("testserver: {err}"),
    };
    let api = storage(&swift_config(&server, "wrong"));

    let res = {
        let api = api.clone();
        blocking(move || api.login()).await
    };
    match res {
        Err(err) => {
            assert_eq!(err.kind(), StorageErrorKind::Other);
            assert_eq!(err.failure().message(), "401 Unauthorized");
        }
        Ok(()) => panic!("expected login failure"),
    }
    assert_eq!(server.stats().logins(), 0);
    server.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn static_token_is_sent_as_is() {
    let server = match TestServer::start().await {
        Ok(v) => v,
        Err(err) => panic!("testserver: {err}"),
    };
    let api = storage(
        &Config::new()
            .with("storage_url", server.urls().storage.clone())
            .with("token", "AUTH_tk0"),
    );
    let stale = storage(
        &Config::new()
            .with("storage_url", server.urls().storage.clone())
            .with("token", "AUTH_stale"),
    );

    let (ok, rejected) = blocking(move || {
        (
            read_listing(&api, "c1", "o").map(|_| ()),
            read_listing(&stale, "c1", "o").map(|_| ()),
        )
    })
    .await;

    if let Err(err) = ok {
        panic!("listing with static token failed: {err}");
    }
    match rejected {
        Err(err) => {
            assert_eq!(err.kind(), StorageErrorKind::Other);
            assert!(err.failure().message().contains("401"));
        }
        Ok(()) => panic!("expected 401"),
    }
    assert_eq!(server.stats().logins(), 0);
    server.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn run_recovers_from_revoked_token_by_relogging() {
    let server = match TestServer::start().await {
        Ok(v) => v,
        Err(err) => panic!("testserver: {err}"),
    };
    let api = storage(&swift_config(&server, KEY));
    {
        let api = api.clone();
        if let Err(err) = blocking(move || api.login()).await {
            panic!("login failed: {err}");
        }
    }
    server.stats().revoke_tokens();

    let operator = match create_operator(
        "list",
        "op-list",
        100,
        "none",
        config("cprefix=bucket;oprefix=obj"),
    ) {
        Ok(v) => v,
        Err(err) => panic!("create_operator: {err}"),
    };
    let cfg = RunConfig {
        workers: 1,
        ops: Some(10),
        duration: None,
        seed: Some(3),
    };

    let report = {
        let api: Arc<dyn StorageApi> = api.clone();
        blocking(move || run_operator(operator, api, &cfg, Interrupt::default())).await
    };
    let report = match report {
        Ok(v) => v,
        Err(err) => panic!("run failed: {err}"),
    };

    assert_eq!(report.summary.ops_total, 10);
    assert_eq!(report.summary.ops_failed, 1);
    assert_eq!(
        report.summary.bytes_total,
        9 * osbench_testserver::listing("obj1").len() as u64
    );
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].targets_joined(), "bucket1/obj1");
    assert!(
        report.errors[0]
            .representative()
            .message()
            .contains("401")
    );
    assert!(api.auth_flag());
    assert_eq!(server.stats().logins(), 2);
    server.shutdown().await;
}

fn static_config(server: &TestServer) -> Config {
    Config::new()
        .with("storage_url", server.urls().storage.clone())
        .with("token", "AUTH_tk0")
}

fn interrupt_after(interrupt: &Interrupt, after: Duration) {
    let interrupt = interrupt.clone();
    std::thread::spawn(move || {
        std::thread::sleep(after);
        interrupt.interrupt();
    });
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn interrupt_cuts_a_pending_listing_short() {
    let server = match TestServer::start().await {
        Ok(v) => v,
        Err(err) => panic!("testserver: {err}"),
    };
    let interrupt = Interrupt::default();
    let api = match HttpStorage::from_config(&static_config(&server), Handle::current()) {
        Ok(v) => Arc::new(v.with_interrupt(interrupt.clone())),
        Err(err) => panic!("http storage: {err}"),
    };

    let started = Instant::now();
    interrupt_after(&interrupt, Duration::from_millis(100));
    let res = {
        let api = api.clone();
        blocking(move || read_listing(&api, osbench_testserver::CONTAINER_SLOW, "o")).await
    };
    let waited = started.elapsed();

    match res {
        Err(err) => assert_eq!(err.kind(), StorageErrorKind::Interrupted),
        Ok(_) => panic!("expected interruption"),
    }
    assert!(
        waited < osbench_testserver::SLOW_DELAY,
        "listing waited {waited:?} for the slow container"
    );
    server.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn interrupted_run_aborts_the_in_flight_listing() {
    let server = match TestServer::start().await {
        Ok(v) => v,
        Err(err) => panic!("testserver: {err}"),
    };
    let interrupt = Interrupt::default();
    let api = match HttpStorage::from_config(&static_config(&server), Handle::current()) {
        Ok(v) => Arc::new(v.with_interrupt(interrupt.clone())),
        Err(err) => panic!("http storage: {err}"),
    };

    let operator = match create_operator(
        "list",
        "op-list",
        100,
        "none",
        config("cprefix=slow;oprefix=obj"),
    ) {
        Ok(v) => v,
        Err(err) => panic!("create_operator: {err}"),
    };
    let cfg = RunConfig {
        workers: 1,
        ops: Some(1),
        duration: None,
        seed: Some(3),
    };

    let started = Instant::now();
    interrupt_after(&interrupt, Duration::from_millis(100));
    let report = {
        let api: Arc<dyn StorageApi> = api.clone();
        let interrupt = interrupt.clone();
        blocking(move || run_operator(operator, api, &cfg, interrupt)).await
    };
    let waited = started.elapsed();
    let report = match report {
        Ok(v) => v,
        Err(err) => panic!("run failed: {err}"),
    };

    assert_eq!(report.aborted_total, 1);
    assert_eq!(report.summary.ops_total, 0);
    assert!(report.errors.is_empty());
    assert!(
        waited < osbench_testserver::SLOW_DELAY,
        "run waited {waited:?} for the slow container"
    );
    server.shutdown().await;
}
