//! Sign in with Google in the browser and subscribe to one channel.
//!
//! ```text
//! GOOGLE_CLIENT_ID=... cargo run -p core-service --example subscribe -- UClE78KZQ32HSA_Ff_vo2MuQ
//! ```
//!
//! The channel argument overrides `YOYTUBE_CHANNEL_ID`.

use bridge_traits::log::LogLevel;
use core_runtime::config::AppConfig;
use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
use core_service::bootstrap_desktop;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging(
        LoggingConfig::default()
            .with_format(LogFormat::Compact)
            .with_level(LogLevel::Info),
    )?;

    let config = AppConfig::from_env()?;
    let mut core = bootstrap_desktop(config)?;

    if let Some(channel_id) = std::env::args().nth(1) {
        core.set_channel_input(channel_id);
    }

    println!("[{}]", core.sign_in_label());
    core.sign_in().await;
    report(&core);

    if !core.can_subscribe() {
        return Ok(());
    }

    println!("[{}]", core.subscribe_label());
    core.subscribe().await;
    report(&core);

    Ok(())
}

fn report(core: &core_service::CoreService) {
    if let Some(message) = core.session().message.as_deref() {
        println!("{}", message);
    }
}
