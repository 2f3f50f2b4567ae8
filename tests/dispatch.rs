//! End-to-end dispatch through the listener.

use std::time::Duration;

use axum::http::StatusCode;
use roundrobin_proxy::config::{BackendConfig, BalancerConfig, HealthMode};
use serde_json::Value;

mod common;

#[tokio::test]
async fn test_rotation_order() {
    let x = common::start_named_backend("x").await;
    let y = common::start_named_backend("y").await;
    let z = common::start_named_backend("z").await;

    let (proxy, shutdown) = common::start_proxy(common::dispatcher(&[(x, true), (y, true), (z, true)])).await;
    let client = common::client();

    let mut seen = Vec::new();
    for _ in 0..4 {
        seen.push(common::get_text(&client, proxy, "/").await);
    }
    assert_eq!(seen, ["x", "y", "z", "x"]);

    shutdown.trigger();
}

#[tokio::test]
async fn test_dead_backend_never_selected() {
    let x = common::start_named_backend("x").await;
    let y = common::start_named_backend("y").await;

    let (proxy, shutdown) = common::start_proxy(common::dispatcher(&[(x, true), (y, false)])).await;
    let client = common::client();

    for i in 0..6 {
        let body = common::get_text(&client, proxy, &format!("/page/{i}")).await;
        assert_eq!(body, "x", "request {i} should go to the live backend");
    }

    shutdown.trigger();
}

#[tokio::test]
async fn test_upstream_status_passthrough() {
    let x = common::start_status_backend(StatusCode::SERVICE_UNAVAILABLE, "maintenance").await;

    let (proxy, shutdown) = common::start_proxy(common::dispatcher(&[(x, true)])).await;

    let res = common::client()
        .get(format!("http://{proxy}/"))
        .send()
        .await
        .expect("Proxy unreachable");
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(res.text().await.unwrap(), "maintenance");

    shutdown.trigger();
}

#[tokio::test]
async fn test_pass_through_fidelity() {
    let echo = common::start_echo_backend().await;

    let (proxy, shutdown) = common::start_proxy(common::dispatcher(&[(echo, true)])).await;

    let res = common::client()
        .put(format!("http://{proxy}/orders/42?dry_run=1&tag=a"))
        .header("host", "lb.example:8080")
        .header("x-trace", "abc-123")
        .header("content-type", "application/json")
        .body(r#"{"qty":3}"#)
        .send()
        .await
        .expect("Proxy unreachable");

    assert_eq!(res.status(), StatusCode::CREATED);
    assert_eq!(res.headers()["x-backend"], "echo");

    let seen: Value = res.json().await.unwrap();
    assert_eq!(seen["method"], "PUT");
    assert_eq!(seen["path"], "/orders/42");
    assert_eq!(seen["query"], "dry_run=1&tag=a");
    assert_eq!(seen["body"], r#"{"qty":3}"#);
    assert_eq!(seen["headers"]["x-trace"], "abc-123");
    assert_eq!(seen["headers"]["content-type"], "application/json");
    assert_eq!(seen["headers"]["host"], "lb.example:8080");
    assert_eq!(seen["headers"]["x-forwarded-for"], "127.0.0.1");

    shutdown.trigger();
}

#[tokio::test]
async fn test_client_host_kept_by_default() {
    let echo = common::start_echo_backend().await;

    let mut config = BalancerConfig::default();
    config.backends = vec![BackendConfig::new(format!("http://{echo}"))].into();

    let (proxy, shutdown) = common::start_proxy_from_config(config).await;

    let res = common::client()
        .get(format!("http://{proxy}/"))
        .send()
        .await
        .expect("Proxy unreachable");
    let seen: Value = res.json().await.unwrap();
    assert_eq!(seen["headers"]["host"], proxy.to_string());

    shutdown.trigger();
}

#[tokio::test]
async fn test_host_rewrite_opt_in() {
    let echo = common::start_echo_backend().await;

    let mut config = BalancerConfig::default();
    config.backends = vec![BackendConfig::new(format!("http://{echo}")).with_host_rewrite(true)].into();

    let (proxy, shutdown) = common::start_proxy_from_config(config).await;

    let res = common::client()
        .get(format!("http://{proxy}/"))
        .header("host", "lb.example:8080")
        .send()
        .await
        .expect("Proxy unreachable");
    let seen: Value = res.json().await.unwrap();
    assert_eq!(seen["headers"]["host"], echo.to_string());

    shutdown.trigger();
}

#[tokio::test]
async fn test_all_backends_down() {
    let x = common::start_named_backend("x").await;

    let (proxy, shutdown) = common::start_proxy(common::dispatcher(&[(x, false)])).await;

    let res = tokio::time::timeout(
        Duration::from_secs(5),
        common::client().get(format!("http://{proxy}/")).send(),
    )
    .await
    .expect("Selection must not hang")
    .expect("Proxy unreachable");
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);

    shutdown.trigger();
}

#[tokio::test]
async fn test_unreachable_backend_is_bad_gateway() {
    let gone = common::closed_port();
    let x = common::start_named_backend("x").await;

    let (proxy, shutdown) = common::start_proxy(common::dispatcher(&[(gone, true), (x, true)])).await;
    let client = common::client();

    let first = client.get(format!("http://{proxy}/")).send().await.expect("Proxy unreachable");
    assert_eq!(first.status(), StatusCode::BAD_GATEWAY);

    // No failover: the next request simply moves on in rotation.
    assert_eq!(common::get_text(&client, proxy, "/").await, "x");

    shutdown.trigger();
}

#[tokio::test]
async fn test_config_built_pool_rotates() {
    let a = common::start_named_backend("a").await;
    let b = common::start_named_backend("b").await;

    let mut config = BalancerConfig::default();
    config.backends = vec![
        BackendConfig::new(format!("http://{a}")),
        BackendConfig::new(format!("http://{b}")),
    ]
    .into();
    config.health_check.mode = HealthMode::Passive;

    let (proxy, shutdown) = common::start_proxy_from_config(config).await;
    let client = common::client();

    let mut seen = Vec::new();
    for _ in 0..4 {
        seen.push(common::get_text(&client, proxy, "/").await);
    }
    assert_eq!(seen, ["a", "b", "a", "b"]);

    shutdown.trigger();
}

#[tokio::test]
async fn test_active_health_check_eviction() {
    let b1 = common::start_probed_backend("b1", true).await;
    let b2 = common::start_probed_backend("b2", false).await;

    let mut config = BalancerConfig::default();
    config.backends = vec![
        BackendConfig::new(format!("http://{b1}")),
        BackendConfig::new(format!("http://{b2}")),
    ]
    .into();
    config.health_check.mode = HealthMode::Active;
    config.health_check.path = "/health".into();
    config.health_check.interval_secs = 1;
    config.health_check.unhealthy_threshold = 1;
    config.health_check.healthy_threshold = 1;

    let (proxy, shutdown) = common::start_proxy_from_config(config).await;

    // The first probe round runs as soon as the monitor starts.
    tokio::time::sleep(Duration::from_millis(500)).await;

    let client = common::client();
    for _ in 0..6 {
        assert_eq!(common::get_text(&client, proxy, "/").await, "b1");
    }

    shutdown.trigger();
}
