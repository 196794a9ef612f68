//! Gateway over real sockets: a backend, a gateway and a plain HTTP client.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::get;
use axum::Router;
use corelib::{Balancer, HealthCheck};
use gateway::{GatewayConfig, GatewayServer, HttpHealthCheck, SharedBalancer};
use reqwest::redirect::Policy;
use reqwest::StatusCode;
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// Start a backend answering `/ping` and echoing the path elsewhere.
async fn spawn_backend() -> String {
    let router = Router::new()
        .route("/ping", get(|| async { "pong" }))
        .fallback(|uri: axum::http::Uri| async move { format!("backend saw {uri}") });
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

struct Gateway {
    url: String,
    balancer: SharedBalancer,
    shutdown: Option<oneshot::Sender<()>>,
    handle: tokio::task::JoinHandle<std::io::Result<()>>,
}

impl Gateway {
    async fn start(requests_per_minute: u32) -> Self {
        let health: Arc<dyn HealthCheck> =
            Arc::new(HttpHealthCheck::new(Duration::from_secs(2)).unwrap());
        let balancer: SharedBalancer = Arc::new(Balancer::new(health));
        let server = GatewayServer::new(GatewayConfig {
            balancer: Arc::clone(&balancer),
            requests_per_minute,
            metrics: None,
        });

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let (tx, rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(server.serve(listener, async move {
            let _ = rx.await;
        }));

        Self {
            url,
            balancer,
            shutdown: Some(tx),
            handle,
        }
    }

    async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        self.handle.await.unwrap().unwrap();
    }
}

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(Policy::none())
        .build()
        .unwrap()
}

async fn admit(client: &reqwest::Client, gateway: &Gateway, addr: &str) -> (StatusCode, Value) {
    let response = client
        .post(format!("{}/servers", gateway.url))
        .form(&[("addr", addr)])
        .send()
        .await
        .unwrap();
    let status = response.status();
    let body = serde_json::from_str(&response.text().await.unwrap()).unwrap();
    (status, body)
}

#[tokio::test]
async fn test_admit_route_and_follow() {
    let backend = spawn_backend().await;
    let gateway = Gateway::start(100).await;
    let client = client();

    let ping = client
        .get(format!("{}/ping", gateway.url))
        .send()
        .await
        .unwrap();
    assert_eq!(ping.text().await.unwrap(), "pong");

    let (status, body) = admit(&client, &gateway, &backend).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["server"], backend.as_str());

    let listed: Value = serde_json::from_str(
        &client
            .get(format!("{}/servers", gateway.url))
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap(),
    )
    .unwrap();
    assert_eq!(listed, serde_json::json!([backend]));

    let redirect = client
        .get(format!("{}/hello?name=x", gateway.url))
        .send()
        .await
        .unwrap();
    assert_eq!(redirect.status(), StatusCode::TEMPORARY_REDIRECT);
    let location = redirect.headers()["location"].to_str().unwrap().to_owned();
    assert_eq!(location, format!("{backend}/hello?name=x"));

    let followed = client.get(&location).send().await.unwrap();
    assert_eq!(
        followed.text().await.unwrap(),
        "backend saw /hello?name=x"
    );

    gateway.stop().await;
}

#[tokio::test]
async fn test_unreachable_candidate_rejected() {
    let gateway = Gateway::start(100).await;
    let client = client();

    let (status, body) = admit(&client, &gateway, "http://127.0.0.1:9").await;
    assert_eq!(status, StatusCode::NOT_ACCEPTABLE);
    assert_eq!(body["reason"], "unreachable");
    assert!(gateway.balancer.list().is_empty());

    let routed = client
        .get(format!("{}/anything", gateway.url))
        .send()
        .await
        .unwrap();
    assert_eq!(routed.status(), StatusCode::SERVICE_UNAVAILABLE);

    gateway.stop().await;
}

#[tokio::test]
async fn test_balancer_behind_balancer() {
    let backend = spawn_backend().await;
    let inner = Gateway::start(100).await;
    let outer = Gateway::start(100).await;
    let client = client();

    admit(&client, &inner, &backend).await;
    // the inner gateway answers /ping, so it can be admitted as a server
    let (status, _) = admit(&client, &outer, &inner.url).await;
    assert_eq!(status, StatusCode::OK);

    let redirect = client
        .get(format!("{}/page", outer.url))
        .send()
        .await
        .unwrap();
    assert_eq!(redirect.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        redirect.headers()["location"].to_str().unwrap(),
        format!("{}/page", inner.url)
    );

    outer.stop().await;
    inner.stop().await;
}
