//! Logging system demonstration
//!
//! Run with:
//! ```bash
//! # Pretty format (default in debug)
//! cargo run -p core-runtime --example logging_demo
//!
//! # JSON format
//! cargo run -p core-runtime --example logging_demo -- json
//!
//! # Compact format with a custom filter
//! cargo run -p core-runtime --example logging_demo -- compact "logging_demo=trace"
//! ```

use bridge_traits::log::{ConsoleLogger, LogLevel};
use core_runtime::config::AppConfig;
use core_runtime::events::{CoreEvent, EventBus, EventStream, SubscriptionEvent};
use core_runtime::logging::{init_logging, redact_if_sensitive, LogFormat, LoggingConfig};
use std::env;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let format = match args.get(1).map(String::as_str) {
        Some("json") => LogFormat::Json,
        Some("compact") => LogFormat::Compact,
        Some("pretty") => LogFormat::Pretty,
        _ => LogFormat::default(),
    };

    let mut config = LoggingConfig::default()
        .with_format(format)
        .with_level(LogLevel::Debug)
        .with_logger_sink(Arc::new(ConsoleLogger {
            min_level: LogLevel::Warn,
        }));

    if let Some(filter) = args.get(2) {
        config = config.with_filter(filter.clone());
    }

    init_logging(config)?;
    info!(format = ?format, "Logging initialized");

    let app_config = AppConfig::from_env()?;
    info!(
        client_id_configured = app_config.has_client_id(),
        api_base_url = %app_config.api_base_url,
        "Configuration loaded"
    );

    info!(
        access_token = %redact_if_sensitive("access_token", "ya29.example"),
        "Sensitive fields are redacted before logging"
    );

    let event_bus = EventBus::default();
    let mut stream = EventStream::new(event_bus.subscribe())
        .filter(|event| matches!(event, CoreEvent::Subscription(_)));

    simulate_subscription(&event_bus, "UClE78KZQ32HSA_Ff_vo2MuQ").await;

    while let Some(Ok(event)) = stream.try_recv() {
        debug!(severity = ?event.severity(), "{}", event.description());
    }

    Ok(())
}

#[instrument(skip(event_bus))]
async fn simulate_subscription(event_bus: &EventBus, channel_id: &str) {
    let _ = event_bus.emit(CoreEvent::Subscription(SubscriptionEvent::Requested {
        channel_id: channel_id.to_string(),
    }));
    warn!("No network in this demo; reporting a failure");
    let _ = event_bus.emit(CoreEvent::Subscription(SubscriptionEvent::Failed {
        channel_id: channel_id.to_string(),
        message: "demo".to_string(),
    }));
}
