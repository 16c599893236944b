use mockito::Matcher;
use smcbot::api::{ApiError, BinanceClient, CandleSource};
use smcbot::{AppConfig, Timeframe};

const KLINES: &str = r#"[
    [1700000000000, "100.0", "101.5", "99.5", "101.0", "1200.5", 1700003599999, "0", 10, "0", "0", "0"],
    [1700003600000, "101.0", "102.0", "100.5", "100.8", "900.0", 1700007199999, "0", 8, "0", "0", "0"]
]"#;

fn client_for(server: &mockito::Server) -> BinanceClient {
    let config = AppConfig {
        binance_base_url: server.url(),
        retry_backoff_ms: 1,
        ..AppConfig::default()
    };
    BinanceClient::from_config(&config).unwrap()
}

fn klines_query(symbol: &str, interval: &str, limit: &str) -> Matcher {
    Matcher::AllOf(vec![
        Matcher::UrlEncoded("symbol".into(), symbol.into()),
        Matcher::UrlEncoded("interval".into(), interval.into()),
        Matcher::UrlEncoded("limit".into(), limit.into()),
    ])
}

#[tokio::test]
async fn test_fetch_candles_normalizes_symbol() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/fapi/v1/klines")
        .match_query(klines_query("SOLUSDT", "4h", "2"))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(KLINES)
        .create_async()
        .await;

    let client = client_for(&server);
    let series = client
        .fetch_candles("sol/usdt", Timeframe::Hour4, 2)
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(series.len(), 2);
    assert_eq!(series.candles()[0].timestamp, 1700000000000);
    assert_eq!(series.candles()[0].high, 101.5);
    assert_eq!(series.current_price().unwrap(), 100.8);
}

#[tokio::test]
async fn test_server_error_is_retried() {
    let mut server = mockito::Server::new_async().await;
    let failing = server
        .mock("GET", "/fapi/v1/klines")
        .match_query(Matcher::Any)
        .with_status(500)
        .with_body("internal error")
        .expect(1)
        .create_async()
        .await;
    let succeeding = server
        .mock("GET", "/fapi/v1/klines")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(KLINES)
        .expect(1)
        .create_async()
        .await;

    let client = client_for(&server);
    let candles = client
        .get_klines("SOLUSDT", Timeframe::Hour1, 2)
        .await
        .unwrap();

    failing.assert_async().await;
    succeeding.assert_async().await;
    assert_eq!(candles.len(), 2);
}

#[tokio::test]
async fn test_retries_give_up_after_max_attempts() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/fapi/v1/klines")
        .match_query(Matcher::Any)
        .with_status(503)
        .with_body("maintenance")
        .expect(3)
        .create_async()
        .await;

    let client = client_for(&server);
    let result = client.get_klines("SOLUSDT", Timeframe::Hour1, 2).await;

    mock.assert_async().await;
    match result {
        Err(ApiError::Status { status, body }) => {
            assert_eq!(status, 503);
            assert_eq!(body, "maintenance");
        }
        other => panic!("expected a 503 status error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_client_error_is_not_retried() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/fapi/v1/klines")
        .match_query(Matcher::Any)
        .with_status(400)
        .with_body(r#"{"code":-1121,"msg":"Invalid symbol."}"#)
        .expect(1)
        .create_async()
        .await;

    let client = client_for(&server);
    let result = client.get_klines("NOPE", Timeframe::Hour1, 10).await;

    mock.assert_async().await;
    match result {
        Err(ApiError::Status { status, body }) => {
            assert_eq!(status, 400);
            assert!(body.contains("Invalid symbol"));
        }
        other => panic!("expected a 400 status error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_invalid_candles_are_rejected() {
    let mut server = mockito::Server::new_async().await;
    // high below low
    let _mock = server
        .mock("GET", "/fapi/v1/klines")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"[[1700000000000, "100", "99", "101", "100", "5"]]"#)
        .create_async()
        .await;

    let client = client_for(&server);
    let result = client.fetch_candles("SOLUSDT", Timeframe::Hour1, 1).await;

    assert!(matches!(result, Err(ApiError::Candles(_))));
}

#[tokio::test]
async fn test_unexpected_payload_shape() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/fapi/v1/klines")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"[[1700000000000, "100"]]"#)
        .create_async()
        .await;

    let client = client_for(&server);
    let result = client.get_klines("SOLUSDT", Timeframe::Hour1, 1).await;

    assert!(matches!(result, Err(ApiError::Parse(_))));
}
