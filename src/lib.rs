pub mod clock;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod message;
pub mod notifier;
pub mod reminder;
pub mod schedule;
pub mod storage;

use clock::Clock;
use config::Config;
use dispatch::{DispatchSummary, Dispatcher};
use error::AppResult;
use log::info;
use message::{custom_message, daily_report};
use notifier::{ProviderResponse, PushPlusNotifier};

fn notifier_for(config: &Config) -> PushPlusNotifier {
    PushPlusNotifier::new(
        config.token.clone(),
        config.endpoint.clone(),
        config.template,
    )
}

/// Run one dispatch batch over the configured reminder file.
pub fn run_dispatch(config: &Config) -> AppResult<DispatchSummary> {
    let dispatcher = Dispatcher::new(config, notifier_for(config))?;
    let summary = dispatcher.run()?;
    info!("Dispatch finished: {}", summary);
    Ok(summary)
}

/// Send a single message outside the reminder file.
///
/// With both `title` and `content` set the custom message is sent, otherwise
/// the daily report.
pub fn run_notify(
    config: &Config,
    title: Option<&str>,
    content: Option<&str>,
) -> AppResult<ProviderResponse> {
    let now = Clock::new(config.utc_offset_hours)?.now();
    let message = match (title, content) {
        (Some(t), Some(c)) if !t.is_empty() && !c.is_empty() => custom_message(t, c, now),
        _ => daily_report(now),
    };

    info!("Sending '{}'", message.title);
    notifier_for(config).send_raw(&message)
}
