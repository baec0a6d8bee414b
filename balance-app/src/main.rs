//! # Balance Application
//!
//! Binary that wires together all the components:
//! - Load configuration from environment
//! - Initialize the repository adapter
//! - Start the exchange rate cache and its janitor
//! - Create the balance service
//! - Start the HTTP server

mod config;

use std::sync::Arc;

use opentelemetry::global;
use opentelemetry_sdk::{propagation::TraceContextPropagator, trace as sdktrace};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use balance_hex::{BalanceService, ServiceConfig, inbound::HttpServer};
use balance_repo::build_repo;
use exchange_rates::{CurrencyCode, HttpRateSource, RateCache};

fn init_tracer() -> anyhow::Result<(sdktrace::Tracer, sdktrace::SdkTracerProvider)> {
    global::set_text_map_propagator(TraceContextPropagator::new());

    // gRPC exporter with batch processing (non-blocking)
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .build()?;

    let provider = sdktrace::SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .build();

    global::set_tracer_provider(provider.clone());

    use opentelemetry::trace::TracerProvider as _;
    Ok((provider.tracer("balance-service"), provider))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let (otel_tracer, otel_provider) = init_tracer()?;
    let telemetry = tracing_opentelemetry::layer().with_tracer(otel_tracer);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,balance_app=debug,balance_hex=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(telemetry)
        .init();

    let config = config::Config::from_env()?;

    tracing::info!("Starting balance server on port {}", config.port);
    tracing::info!("Using database: {}", config.database_url);

    // Build repository (handles connection and migration)
    let repo = build_repo(&config.database_url).await?;

    let base = CurrencyCode::new(&config.base_currency)?;
    let rates = Arc::new(RateCache::new(
        HttpRateSource::new(config.rates_api_url.clone()),
        base,
        config.rates_ttl,
    ));
    let janitor = rates.spawn_janitor(config.rates_cleanup_interval);
    tracing::info!(
        base = %config.base_currency,
        url = %config.rates_api_url,
        ttl_secs = config.rates_ttl.as_secs(),
        "Exchange rate cache ready"
    );

    let service = BalanceService::with_config(
        repo,
        rates,
        ServiceConfig {
            operation_timeout: config.operation_timeout,
        },
    );

    let server = HttpServer::new(service);
    let addr = format!("0.0.0.0:{}", config.port);

    server.run(&addr).await?;

    janitor.abort();
    // Ensure traces are flushed before exit
    let _ = otel_provider.shutdown();
    Ok(())
}
