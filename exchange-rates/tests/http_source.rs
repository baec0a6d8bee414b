//! HttpRateSource against a local axum server.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{Json, Router, extract::Query, http::StatusCode, routing::get};
use exchange_rates::{CurrencyCode, DEFAULT_TTL, ExchangeError, HttpRateSource, RateCache, RateSource};
use serde_json::json;

/// Spawns `app` on an ephemeral port and returns its base URL.
async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn rub() -> CurrencyCode {
    CurrencyCode::new("RUB").unwrap()
}

#[tokio::test]
async fn test_fetch_decodes_rates_and_sends_base() {
    let app = Router::new().route(
        "/latest",
        get(|Query(params): Query<HashMap<String, String>>| async move {
            assert_eq!(params.get("base").map(String::as_str), Some("RUB"));
            Json(json!({
                "base": "RUB",
                "rates": { "USD": 0.0137, "EUR": 0.0118 }
            }))
        }),
    );
    let url = serve(app).await;

    let source = HttpRateSource::new(format!("{}/latest", url));
    assert_eq!(source.url(), format!("{}/latest", url));
    let snapshot = source.fetch(&rub()).await.unwrap();

    assert_eq!(snapshot.rates.len(), 2);
    assert_eq!(snapshot.rates["USD"], 0.0137);
}

#[tokio::test]
async fn test_malformed_body_is_source_unavailable() {
    let app = Router::new().route(
        "/latest",
        get(|| async { Json(json!({ "success": false, "error": { "code": 101 } })) }),
    );
    let url = serve(app).await;

    let source = HttpRateSource::new(format!("{}/latest", url));
    let result = source.fetch(&rub()).await;

    assert!(matches!(result, Err(ExchangeError::RateSourceUnavailable(_))));
}

#[tokio::test]
async fn test_error_status_is_source_unavailable() {
    let app = Router::new().route(
        "/latest",
        get(|| async { (StatusCode::BAD_GATEWAY, "upstream down") }),
    );
    let url = serve(app).await;

    let source = HttpRateSource::new(format!("{}/latest", url));
    let result = source.fetch(&rub()).await;

    assert!(matches!(result, Err(ExchangeError::RateSourceUnavailable(_))));
}

#[tokio::test]
async fn test_cache_over_http_source() {
    let app = Router::new().route(
        "/latest",
        get(|| async { Json(json!({ "rates": { "USD": 0.0137 } })) }),
    );
    let url = serve(app).await;

    let cache = Arc::new(RateCache::new(
        HttpRateSource::new(format!("{}/latest", url)),
        rub(),
        DEFAULT_TTL,
    ));

    let usd = cache.get(&CurrencyCode::new("usd").unwrap()).await.unwrap();
    assert_eq!(usd, 0.0137);
    assert!(matches!(
        cache.get(&CurrencyCode::new("JPY").unwrap()).await,
        Err(ExchangeError::CurrencyUnavailable(_))
    ));
}

#[tokio::test]
async fn test_unreachable_source_is_unavailable() {
    // Nothing listens on the discard port.
    let source = HttpRateSource::new("http://127.0.0.1:9/latest");
    let result = source.fetch(&rub()).await;

    assert!(matches!(result, Err(ExchangeError::RateSourceUnavailable(_))));
}
