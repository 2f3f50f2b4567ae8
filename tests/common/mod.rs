//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Bytes,
    http::{HeaderMap, Method, StatusCode, Uri},
    routing::{any, get},
    Json, Router,
};
use roundrobin_proxy::health::StaticHealth;
use roundrobin_proxy::http::{build_client, HttpServer};
use roundrobin_proxy::load_balancer::{Backend, Dispatcher};
use roundrobin_proxy::{BalancerConfig, Shutdown};
use serde_json::{json, Value};
use tokio::net::TcpListener;

/// Serve `app` on an ephemeral local port.
pub async fn spawn_app(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// Backend that answers every request with its name.
pub async fn start_named_backend(name: &'static str) -> SocketAddr {
    spawn_app(Router::new().fallback(move || async move { name })).await
}

/// Backend that answers every request with a fixed status and body.
pub async fn start_status_backend(status: StatusCode, body: &'static str) -> SocketAddr {
    spawn_app(Router::new().fallback(move || async move { (status, body) })).await
}

/// Named backend whose `/health` endpoint reports `healthy`.
pub async fn start_probed_backend(name: &'static str, healthy: bool) -> SocketAddr {
    let health_status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    let app = Router::new()
        .route("/health", get(move || async move { health_status }))
        .fallback(move || async move { name });
    spawn_app(app).await
}

/// Backend that reflects the request it received as JSON.
pub async fn start_echo_backend() -> SocketAddr {
    async fn echo(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> (StatusCode, [(&'static str, &'static str); 1], Json<Value>) {
        let headers: BTreeMap<String, String> = headers
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or_default().to_string()))
            .collect();
        let reflected = json!({
            "method": method.as_str(),
            "path": uri.path(),
            "query": uri.query(),
            "headers": headers,
            "body": String::from_utf8_lossy(&body),
        });
        (StatusCode::CREATED, [("x-backend", "echo")], Json(reflected))
    }

    spawn_app(Router::new().route("/{*path}", any(echo)).route("/", any(echo))).await
}

/// An address nothing listens on.
pub fn closed_port() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}

/// Dispatcher over local backends with fixed liveness.
pub fn dispatcher(backends: &[(SocketAddr, bool)]) -> Arc<Dispatcher> {
    let backends = backends
        .iter()
        .map(|(addr, alive)| {
            let health = if *alive {
                StaticHealth::alive()
            } else {
                StaticHealth::down()
            };
            Arc::new(Backend::new(&format!("http://{addr}"), Arc::new(health)).unwrap())
        })
        .collect();
    Arc::new(Dispatcher::new(backends, build_client()))
}

async fn serve(server: HttpServer) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });
    (addr, shutdown)
}

/// Start the balancer in front of a prebuilt dispatcher.
pub async fn start_proxy(dispatcher: Arc<Dispatcher>) -> (SocketAddr, Shutdown) {
    serve(HttpServer::from_dispatcher(dispatcher)).await
}

/// Start the balancer from configuration.
pub async fn start_proxy_from_config(config: BalancerConfig) -> (SocketAddr, Shutdown) {
    serve(HttpServer::new(config).unwrap()).await
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

/// GET `path` through the proxy and return the body text.
pub async fn get_text(client: &reqwest::Client, proxy: SocketAddr, path: &str) -> String {
    client
        .get(format!("http://{proxy}{path}"))
        .send()
        .await
        .expect("Proxy unreachable")
        .text()
        .await
        .unwrap()
}
