//! End-to-end over TCP.

mod common;

use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::mpsc;

use common::{test_config, test_routes};
use service_common::{HttpServer, Shutdown};

#[tokio::test]
async fn test_serves_and_shuts_down_gracefully() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let (_updates_tx, config_updates) = mpsc::unbounded_channel();
    let server = HttpServer::new(test_config(50), test_routes());
    let handle = tokio::spawn(server.run(listener, config_updates, shutdown.subscribe()));

    let client = reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap();

    let res = client
        .get(format!("http://{addr}/fast"))
        .header("X-Forwarded-For", "203.0.113.7")
        .send()
        .await
        .expect("server unreachable");
    assert_eq!(res.status(), 200);
    assert!(res.headers().contains_key("x-trace-id"));

    let res = client
        .get(format!("http://{addr}/slow"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 504);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["code"], 50002);

    let res = client
        .get(format!("http://{addr}/panic"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 500);

    shutdown.trigger();
    let result = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("server did not stop")
        .unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_config_update_channel_applies_new_timeout() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let (updates_tx, config_updates) = mpsc::unbounded_channel();
    let server = HttpServer::new(test_config(1_000), test_routes());
    let handle = tokio::spawn(server.run(listener, config_updates, shutdown.subscribe()));

    let client = reqwest::Client::builder().no_proxy().build().unwrap();
    let url = format!("http://{addr}/slow");

    assert_eq!(client.get(&url).send().await.unwrap().status(), 200);

    updates_tx.send(test_config(50)).unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(client.get(&url).send().await.unwrap().status(), 504);

    shutdown.trigger();
    let _ = tokio::time::timeout(Duration::from_secs(5), handle).await;
}
