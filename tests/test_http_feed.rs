//! HTTP feed against a throwaway local responder

use jitflow::analytics::{compute_report, AnalyticsConfig};
use jitflow::feed::{FetchError, HttpSwapFeed, SwapFeed};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Serve `status` + `body` to every connection; returns the feed URL
async fn spawn_responder(status: &'static str, body: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            let (mut socket, _) = match listener.accept().await {
                Ok(conn) => conn,
                Err(_) => return,
            };
            tokio::spawn(async move {
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    format!("http://{}/get_data", addr)
}

const LEGACY_BODY: &str = r#"[
    {"id": "0x01", "from_amount": "1000000000000000000", "from_token": "USDC",
     "to_amount": "500000000000000000", "to_token": "WETH",
     "from_reserve": 1000, "to_reserve": "500500000000000000000",
     "approve_fee": "10000000000000000", "liq_fee": "0",
     "timestamp": 1700000000000, "tx_prosessed_ts": "1700000000800"},
    {"id": "0x02", "to_token": "WETH", "from_reserve": "garbage"}
]"#;

#[tokio::test]
async fn test_fetch_legacy_rows() {
    let url = spawn_responder("200 OK", LEGACY_BODY).await;
    let mut feed = HttpSwapFeed::new(url.clone(), Duration::from_secs(5)).unwrap();
    assert_eq!(feed.url(), url);

    let rows = feed.fetch_all().await.unwrap();
    assert_eq!(rows.len(), 2);

    let (summary, swap_rows) = compute_report(&AnalyticsConfig::default(), &rows);
    assert_eq!(summary.total_swaps, 1);
    assert_eq!(summary.valid_swaps, 1);
    assert_eq!(swap_rows[0].tx_hash, "0x01");
    assert_eq!(swap_rows[0].latency_secs, 0.8);
    assert!((swap_rows[0].to_token_qty - 0.5).abs() < 1e-12);
}

#[tokio::test]
async fn test_server_error_is_fetch_error() {
    let url = spawn_responder("500 Internal Server Error", "{}").await;
    let mut feed = HttpSwapFeed::new(url, Duration::from_secs(5)).unwrap();

    match feed.fetch_all().await {
        Err(FetchError::Status(status)) => assert_eq!(status.as_u16(), 500),
        other => panic!("expected status error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_non_array_body_is_fetch_error() {
    let url = spawn_responder("200 OK", r#"{"error": "warming up"}"#).await;
    let mut feed = HttpSwapFeed::new(url, Duration::from_secs(5)).unwrap();

    assert!(matches!(
        feed.fetch_all().await,
        Err(FetchError::Decode(_))
    ));
}

#[tokio::test]
async fn test_unreachable_feed_is_transport_error() {
    // Bind then drop to get a port with nothing listening
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let mut feed =
        HttpSwapFeed::new(format!("http://{}/get_data", addr), Duration::from_secs(2)).unwrap();
    assert!(matches!(
        feed.fetch_all().await,
        Err(FetchError::Transport(_))
    ));
}
