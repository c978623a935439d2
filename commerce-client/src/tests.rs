use crate::cache::CacheConfig;
use crate::transport::HttpTransport;
use crate::{
    ApiClient, CancelToken, Credentials, Error, ErrorKind, Method, OptimisticUpdate,
    RequestOptions,
};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use surf::Url;

type Responder = Box<dyn Fn(Method, &Url, Option<&Value>) -> Value + Send + Sync>;

/// Scripted backend standing in for the network.
struct MockTransport {
    calls: AtomicUsize,
    delay: Duration,
    fail_first: usize,
    respond: Responder,
}

impl MockTransport {
    fn new(delay: Duration) -> Arc<Self> {
        Self::with_responder(
            delay,
            Box::new(|_method, url, _body| json!({ "path": url.path(), "query": url.query() })),
        )
    }

    fn with_responder(delay: Duration, respond: Responder) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            delay,
            fail_first: 0,
            respond,
        })
    }

    fn failing_first(fail_first: usize, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            delay,
            fail_first,
            respond: Box::new(|_method, url, _body| {
                json!({ "path": url.path(), "query": url.query() })
            }),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, method: Method, url: Url, body: Option<Value>) -> Result<Value, Error> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if call < self.fail_first {
            return Err(Error::Http {
                status: 502,
                message: "bad gateway".to_string(),
            });
        }
        Ok((self.respond)(method, &url, body.as_ref()))
    }
}

fn client(transport: Arc<MockTransport>, cached: bool) -> ApiClient {
    ApiClient::with_transport(
        transport,
        Url::parse("https://backend.test/admin").unwrap(),
        cached.then(CacheConfig::default),
    )
}

#[tokio::test]
async fn concurrent_identical_gets_share_one_network_call() {
    let transport = MockTransport::new(Duration::from_millis(100));
    let api = client(transport.clone(), true);

    let mut handles = vec![];
    for _ in 0..5 {
        let api = api.clone();
        handles.push(tokio::spawn(
            async move { api.get::<Value>("items?page=1").await },
        ));
    }

    let mut results = vec![];
    for handle in handles {
        results.push(handle.await.unwrap().unwrap().unwrap());
    }

    assert_eq!(transport.calls(), 1);
    for result in &results {
        assert_eq!(result, &results[0]);
    }
}

#[tokio::test]
async fn distinct_paths_do_not_share_calls() {
    let transport = MockTransport::new(Duration::ZERO);
    let api = client(transport.clone(), true);

    api.get::<Value>("customers").await.unwrap();
    api.get::<Value>("orders").await.unwrap();

    assert_eq!(transport.calls(), 2);
}

#[tokio::test]
async fn non_get_requests_are_never_deduplicated() {
    let transport = MockTransport::new(Duration::from_millis(50));
    let api = client(transport.clone(), true);

    let body = json!({ "name": "Widget" });
    let first = {
        let api = api.clone();
        let body = body.clone();
        tokio::spawn(async move { api.post::<Value>("products", body).await })
    };
    let second = {
        let api = api.clone();
        let body = body.clone();
        tokio::spawn(async move { api.post::<Value>("products", body).await })
    };

    first.await.unwrap().unwrap();
    second.await.unwrap().unwrap();

    assert_eq!(transport.calls(), 2);
}

#[tokio::test]
async fn repeated_get_within_ttl_is_served_from_cache() {
    let transport = MockTransport::new(Duration::ZERO);
    let api = client(transport.clone(), true);

    api.get::<Value>("items?page=1").await.unwrap();
    api.get::<Value>("items?page=1").await.unwrap();

    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn get_after_ttl_expiry_hits_the_network_again() {
    let transport = MockTransport::new(Duration::ZERO);
    let config = CacheConfig {
        request_ttl: chrono::Duration::milliseconds(30),
        ..CacheConfig::default()
    };
    let api = ApiClient::with_transport(
        transport.clone(),
        Url::parse("https://backend.test/admin").unwrap(),
        Some(config),
    );

    api.get::<Value>("items").await.unwrap();
    tokio::time::sleep(Duration::from_millis(80)).await;
    api.get::<Value>("items").await.unwrap();

    assert_eq!(transport.calls(), 2);
}

#[tokio::test]
async fn failed_get_is_retried_fresh_on_the_next_call() {
    let transport = MockTransport::failing_first(1, Duration::ZERO);
    let api = client(transport.clone(), true);

    let err = api.get::<Value>("items").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Http);
    assert_eq!(err.status(), Some(502));

    api.get::<Value>("items").await.unwrap();
    assert_eq!(transport.calls(), 2);
}

#[tokio::test]
async fn cancelled_get_returns_none_while_peer_resolves() {
    let transport = MockTransport::new(Duration::from_millis(150));
    let api = client(transport.clone(), true);
    let token = CancelToken::new();

    let cancelled = {
        let api = api.clone();
        let options = RequestOptions::new().cancel(token.clone());
        tokio::spawn(async move { api.get_with::<Value>("items", options).await })
    };

    tokio::time::sleep(Duration::from_millis(20)).await;

    let surviving = {
        let api = api.clone();
        tokio::spawn(async move { api.get::<Value>("items").await })
    };

    tokio::time::sleep(Duration::from_millis(20)).await;
    token.cancel();

    assert!(cancelled.await.unwrap().unwrap().is_none());
    assert!(surviving.await.unwrap().unwrap().is_some());
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn per_call_dedupe_opt_out_bypasses_the_cache() {
    let transport = MockTransport::new(Duration::ZERO);
    let api = client(transport.clone(), true);

    for _ in 0..2 {
        api.get_with::<Value>("items", RequestOptions::new().dedupe(false))
            .await
            .unwrap();
    }

    assert_eq!(transport.calls(), 2);
}

#[tokio::test]
async fn uncached_client_always_fetches() {
    let transport = MockTransport::new(Duration::ZERO);
    let api = client(transport.clone(), false);

    api.get::<Value>("items").await.unwrap();
    api.get::<Value>("items").await.unwrap();

    assert_eq!(transport.calls(), 2);
    assert!(api.cache_stats().is_none());
}

#[tokio::test]
async fn base_url_join_keeps_the_admin_prefix() {
    let transport = MockTransport::new(Duration::ZERO);
    let api = client(transport.clone(), false);

    let response = api.get::<Value>("customers?page=2").await.unwrap().unwrap();

    assert_eq!(response["path"], "/admin/customers");
    assert_eq!(response["query"], "page=2");
}

#[tokio::test]
async fn login_stores_the_session_token_and_logout_clears_it() {
    let transport = MockTransport::with_responder(
        Duration::ZERO,
        Box::new(|_method, url, _body| {
            if url.path().ends_with("auth/login") {
                json!({
                    "token": "tok-1",
                    "user": { "id": 7, "email": "staff@shop.test", "name": "Sam Staff", "role": "admin" }
                })
            } else {
                Value::Null
            }
        }),
    );
    let api = client(transport.clone(), false);

    let session = api
        .login(&Credentials::new("staff@shop.test", "hunter2"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(session.user().email(), "staff@shop.test");
    assert_eq!(api.auth().token(), Some("tok-1".to_string()));

    api.logout().await.unwrap();
    assert_eq!(api.auth().token(), None);
}

#[tokio::test]
async fn mutation_rolls_back_on_failure() {
    let transport = MockTransport::failing_first(usize::MAX, Duration::ZERO);
    let api = client(transport.clone(), false);

    let applied = Arc::new(AtomicUsize::new(0));
    let rolled_back = Arc::new(AtomicUsize::new(0));

    let update = OptimisticUpdate {
        apply: {
            let applied = applied.clone();
            move || {
                applied.fetch_add(1, Ordering::SeqCst);
            }
        },
        rollback: {
            let rolled_back = rolled_back.clone();
            move || {
                rolled_back.fetch_add(1, Ordering::SeqCst);
            }
        },
    };

    let result: Result<Option<Value>, Error> = api
        .mutate(
            Method::Put,
            "orders/1/status",
            Some(json!({ "status": "shipped" })),
            RequestOptions::default(),
            update,
        )
        .await;

    assert!(result.is_err());
    assert_eq!(applied.load(Ordering::SeqCst), 1);
    assert_eq!(rolled_back.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn mutation_keeps_the_applied_state_on_success() {
    let transport = MockTransport::new(Duration::ZERO);
    let api = client(transport.clone(), false);

    let rolled_back = Arc::new(AtomicUsize::new(0));
    let update = OptimisticUpdate {
        apply: || {},
        rollback: {
            let rolled_back = rolled_back.clone();
            move || {
                rolled_back.fetch_add(1, Ordering::SeqCst);
            }
        },
    };

    let result: Result<Option<Value>, Error> = api
        .mutate(
            Method::Post,
            "quotes",
            Some(json!({ "customer_id": 3 })),
            RequestOptions::default(),
            update,
        )
        .await;

    assert!(result.unwrap().is_some());
    assert_eq!(rolled_back.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn cancelled_mutation_rolls_back() {
    let transport = MockTransport::new(Duration::from_millis(100));
    let api = client(transport.clone(), false);
    let token = CancelToken::new();

    let rolled_back = Arc::new(AtomicUsize::new(0));
    let handle = {
        let api = api.clone();
        let options = RequestOptions::new().cancel(token.clone());
        let rolled_back = rolled_back.clone();
        tokio::spawn(async move {
            api.mutate::<Value, _, _>(
                Method::Post,
                "orders",
                Some(json!({ "customer_id": 1 })),
                options,
                OptimisticUpdate {
                    apply: || {},
                    rollback: move || {
                        rolled_back.fetch_add(1, Ordering::SeqCst);
                    },
                },
            )
            .await
        })
    };

    tokio::time::sleep(Duration::from_millis(20)).await;
    token.cancel();

    assert!(handle.await.unwrap().unwrap().is_none());
    assert_eq!(rolled_back.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn cache_management_passthrough() {
    let transport = MockTransport::new(Duration::ZERO);
    let api = client(transport.clone(), true);

    api.get::<Value>("items").await.unwrap();

    let stats = api.cache_stats().unwrap();
    assert_eq!(stats.total_entries, 1);
    assert_eq!(stats.fresh_entries, 1);

    api.clear_cache();
    assert_eq!(api.cache_stats().unwrap().total_entries, 0);
}
