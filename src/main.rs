use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use log::error;
use reminder_dispatch::config::{Config, DEFAULT_STORE_PATH, DEFAULT_UTC_OFFSET_HOURS};
use reminder_dispatch::error::AppResult;
use reminder_dispatch::notifier::Template;
use reminder_dispatch::{run_dispatch, run_notify};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "reminder-dispatch", version, about = "Push due reminders through PushPlus")]
struct Cli {
    /// PushPlus user token
    #[arg(long, env = "PUSHPLUS_TOKEN", hide_env_values = true, global = true)]
    token: Option<String>,

    /// Reminder JSON file
    #[arg(long, env = "REMINDERS_FILE", default_value = DEFAULT_STORE_PATH, global = true)]
    store: PathBuf,

    /// Fixed UTC offset in hours used for startTime and timestamps
    #[arg(
        long,
        env = "TZ_OFFSET_HOURS",
        default_value_t = DEFAULT_UTC_OFFSET_HOURS,
        allow_hyphen_values = true,
        global = true
    )]
    utc_offset: i32,

    /// Message template: html, markdown, txt or json
    #[arg(long, env = "NOTIFY_TEMPLATE", default_value = "markdown", global = true)]
    template: String,

    #[arg(long, env = "RUST_LOG", default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Send every due pending reminder once (default)
    Dispatch,
    /// Send a custom message, or the daily report when title/content are unset
    Notify {
        #[arg(long, env = "NOTIFY_TITLE")]
        title: Option<String>,
        #[arg(long, env = "NOTIFY_CONTENT")]
        content: Option<String>,
    },
}

impl Cli {
    fn config(&self) -> AppResult<Config> {
        let template: Template = self.template.parse()?;
        Config::new(
            self.token.clone(),
            self.store.clone(),
            self.utc_offset,
            template,
        )
    }
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if is_informational(&e) {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            };
        }
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&cli.log_level))
        .init();

    let config = match cli.config() {
        Ok(c) => c,
        Err(e) => {
            error!("{}", e);
            eprintln!("❌ {}", e);
            return ExitCode::FAILURE;
        }
    };

    match &cli.command {
        None | Some(Command::Dispatch) => dispatch(&config),
        Some(Command::Notify { title, content }) => {
            notify(&config, title.as_deref(), content.as_deref())
        }
    }
}

/// `--help` and `--version` surface as clap errors but are not failures.
fn is_informational(err: &clap::Error) -> bool {
    matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion)
}

fn dispatch(config: &Config) -> ExitCode {
    match run_dispatch(config) {
        Ok(summary) => {
            println!("📊 {}", summary);
            if summary.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            error!("{}", e);
            eprintln!("❌ {}", e);
            ExitCode::FAILURE
        }
    }
}

fn notify(config: &Config, title: Option<&str>, content: Option<&str>) -> ExitCode {
    match run_notify(config, title, content) {
        Ok(response) => {
            let pretty = serde_json::to_string_pretty(&response.raw)
                .unwrap_or_else(|_| response.raw.to_string());
            if response.is_success() {
                println!("✅ 推送成功");
            } else {
                println!(
                    "❌ 推送失败: {}",
                    response.msg.as_deref().unwrap_or("未知错误")
                );
            }
            println!("API 响应: {}", pretty);
            if response.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            error!("{}", e);
            eprintln!("❌ {}", e);
            ExitCode::FAILURE
        }
    }
}
