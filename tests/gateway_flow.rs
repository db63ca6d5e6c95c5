//! End-to-end tests: real gateway, mock upstream over TCP.

use std::net::SocketAddr;
use std::time::Duration;

use reqwest::{header, Method, StatusCode};
use serde_json::{json, Value};

mod common;

fn endpoint(addr: SocketAddr) -> String {
    format!("http://{}/v1/chat/completions", addr)
}

fn assert_cors(res: &reqwest::Response) {
    let headers = res.headers();
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert_eq!(
        headers[header::ACCESS_CONTROL_ALLOW_HEADERS],
        "authorization,content-type"
    );
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], "GET,POST,OPTIONS");
}

#[tokio::test]
async fn test_forwards_and_relays_success() {
    let upstream = common::start_mock_upstream(200, Some("application/json"), r#"{"ok":true}"#).await;
    let (addr, shutdown) = common::start_gateway(common::gateway_config(upstream.url(), "tok")).await;

    let payload = json!({
        "model": "openai/gpt-4o-mini",
        "messages": [{ "role": "user", "content": "price of gold?" }],
    });
    let res = common::client()
        .post(endpoint(addr))
        .bearer_auth("tok")
        .json(&payload)
        .send()
        .await
        .expect("Gateway unreachable");

    assert_eq!(res.status(), StatusCode::OK);
    assert_cors(&res);
    assert_eq!(res.headers()[header::CONTENT_TYPE], "application/json");
    assert!(res.headers().contains_key("x-request-id"));
    assert_eq!(res.text().await.unwrap(), r#"{"ok":true}"#);

    let requests = upstream.requests();
    assert_eq!(requests.len(), 1, "Exactly one upstream call per forward");
    let forwarded = &requests[0];
    assert!(forwarded
        .request_line()
        .starts_with("post /api/v1/chat/completions "));
    assert_eq!(forwarded.header("authorization"), Some("bearer sk-test"));
    assert_eq!(forwarded.header("content-type"), Some("application/json"));
    assert_eq!(forwarded.header("x-title"), Some("metly"));
    assert_eq!(forwarded.header("http-referer"), Some("https://metly.app"));
    let body: Value = serde_json::from_str(&forwarded.body).unwrap();
    assert_eq!(body, payload);

    shutdown.trigger();
}

#[tokio::test]
async fn test_relays_upstream_error_unchanged() {
    let upstream = common::start_mock_upstream(503, None, "upstream overloaded").await;
    let (addr, shutdown) = common::start_gateway(common::gateway_config(upstream.url(), "tok")).await;

    let res = common::client()
        .post(endpoint(addr))
        .header(header::AUTHORIZATION, "tok")
        .body("{}")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_cors(&res);
    // Upstream sent no content-type, so the gateway falls back to JSON.
    assert_eq!(res.headers()[header::CONTENT_TYPE], "application/json");
    assert_eq!(res.text().await.unwrap(), "upstream overloaded");
    assert_eq!(upstream.requests().len(), 1, "Failures are never retried");

    shutdown.trigger();
}

#[tokio::test]
async fn test_rejections_never_reach_upstream() {
    let upstream = common::start_mock_upstream(200, None, "{}").await;
    let (addr, shutdown) = common::start_gateway(common::gateway_config(upstream.url(), "tok")).await;
    let client = common::client();

    let res = client
        .request(Method::OPTIONS, format!("http://{}/whatever", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_cors(&res);
    assert_eq!(res.text().await.unwrap(), "");

    let res = client
        .post(format!("http://{}/v1/completions", addr))
        .bearer_auth("tok")
        .body("{}")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_cors(&res);
    assert_eq!(res.text().await.unwrap(), r#"{"error":"Not found"}"#);

    let res = client
        .post(endpoint(addr))
        .bearer_auth("wrong")
        .body("{}")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(res.text().await.unwrap(), r#"{"error":"Unauthorized"}"#);

    let res = client.post(endpoint(addr)).body("{}").send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .post(endpoint(addr))
        .bearer_auth("tok")
        .body("not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_cors(&res);
    assert_eq!(res.text().await.unwrap(), r#"{"error":"Invalid JSON"}"#);

    let res = client.post(endpoint(addr)).bearer_auth("tok").send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST, "Empty body is invalid JSON");

    assert!(upstream.requests().is_empty());

    shutdown.trigger();
}

#[tokio::test]
async fn test_unconfigured_gateway_refuses_with_500() {
    let upstream = common::start_mock_upstream(200, None, "{}").await;
    let (addr, shutdown) = common::start_gateway(common::gateway_config(upstream.url(), "")).await;
    let client = common::client();

    for token in ["", "anything"] {
        let res = client
            .post(endpoint(addr))
            .bearer_auth(token)
            .body("{}")
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_cors(&res);
        assert_eq!(res.text().await.unwrap(), r#"{"error":"Proxy not configured"}"#);
    }

    // Unknown paths are still 404: route matching comes first.
    let res = client
        .post(format!("http://{}/", addr))
        .body("{}")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    assert!(upstream.requests().is_empty());
    shutdown.trigger();
}

#[tokio::test]
async fn test_upstream_timeout_returns_504() {
    let upstream = common::start_silent_upstream().await;
    let mut config = common::gateway_config(upstream.url(), "tok");
    config.upstream.request_timeout_secs = 1;
    let (addr, shutdown) = common::start_gateway(config).await;

    let res = common::client()
        .post(endpoint(addr))
        .bearer_auth("tok")
        .body("{}")
        .timeout(Duration::from_secs(10))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::GATEWAY_TIMEOUT);
    assert_cors(&res);
    assert_eq!(res.text().await.unwrap(), r#"{"error":"Upstream timed out"}"#);

    shutdown.trigger();
}

#[tokio::test]
async fn test_unreachable_upstream_returns_502() {
    // Reserve a port, then free it so nothing is listening there.
    let closed = {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };
    let config = common::gateway_config(
        format!("http://{}/api/v1/chat/completions", closed),
        "tok",
    );
    let (addr, shutdown) = common::start_gateway(config).await;

    let res = common::client()
        .post(endpoint(addr))
        .bearer_auth("tok")
        .body("{}")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    assert_cors(&res);
    assert_eq!(res.text().await.unwrap(), r#"{"error":"Upstream request failed"}"#);

    shutdown.trigger();
}

#[tokio::test]
async fn test_identical_requests_get_identical_responses() {
    let upstream = common::start_mock_upstream(200, Some("application/json"), r#"{"id":"cmpl-1"}"#).await;
    let (addr, shutdown) = common::start_gateway(common::gateway_config(upstream.url(), "tok")).await;
    let client = common::client();

    let mut bodies = Vec::new();
    for _ in 0..3 {
        let res = client
            .post(endpoint(addr))
            .bearer_auth("tok")
            .body(r#"{"model":"m"}"#)
            .send()
            .await
            .unwrap();
        bodies.push((res.status(), res.text().await.unwrap()));
    }

    assert!(bodies.iter().all(|b| *b == (StatusCode::OK, r#"{"id":"cmpl-1"}"#.to_string())));
    assert_eq!(upstream.requests().len(), 3);

    shutdown.trigger();
}

#[tokio::test]
async fn test_shutdown_stops_accepting() {
    let upstream = common::start_mock_upstream(200, None, "{}").await;
    let (addr, shutdown) = common::start_gateway(common::gateway_config(upstream.url(), "tok")).await;

    let res = common::client()
        .request(Method::OPTIONS, endpoint(addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    shutdown.trigger();
    tokio::time::sleep(Duration::from_millis(200)).await;

    let after = common::client()
        .request(Method::OPTIONS, endpoint(addr))
        .timeout(Duration::from_secs(2))
        .send()
        .await;
    assert!(after.is_err(), "Server should be stopped after shutdown");
}
