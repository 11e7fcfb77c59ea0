use std::fs::{self, File, OpenOptions};
use std::path::Path;
use std::sync::{Arc, Mutex};
use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use natter_core::{Config, Conversation, HttpTransport};

mod app;
mod handler;
mod tui;
mod ui;

use app::App;
use tui::{EventHandler, Tui};

#[derive(Parser)]
#[command(name = "natter")]
#[command(version, about = "Terminal chat client with optimistic message delivery")]
struct Cli {
    /// Chat server base URL; requests go to <BASE_URL>/chat
    #[arg(short, long)]
    base_url: Option<String>,

    /// Pause before contacting the server while the typing indicator shows
    #[arg(long)]
    typing_delay_ms: Option<u64>,

    /// Request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Persist the resolved settings to the config file
    #[arg(long)]
    save: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn open_log_file(dir: &Path) -> Result<File> {
    fs::create_dir_all(dir)?;
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("natter.log"))?;
    Ok(log_file)
}

/// Log to a file in the config directory so output never lands on the TUI.
/// Without a writable config directory the session runs unlogged.
fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));

    let log_file = match Config::config_dir().and_then(|dir| open_log_file(&dir)) {
        Ok(file) => file,
        Err(err) => {
            eprintln!("natter: logging disabled: {:#}", err);
            return;
        }
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(log_file)))
        .with(filter)
        .init();
}

/// Command-line flags win over everything else
fn apply_cli(config: &mut Config, cli: &Cli) {
    if let Some(base_url) = &cli.base_url {
        config.base_url = base_url.clone();
    }
    if let Some(delay) = cli.typing_delay_ms {
        config.typing_delay_ms = delay;
    }
    if let Some(timeout) = cli.timeout {
        config.request_timeout_secs = timeout;
    }
}

fn resolve_config(cli: &Cli) -> Config {
    // Precedence: flags, then environment, then config file
    let mut config = Config::load().unwrap_or_else(|err| {
        tracing::warn!(error = %err, "could not read config file, using defaults");
        Config::new()
    });
    config.apply_env();
    apply_cli(&mut config, cli);
    config
}

async fn run(terminal: &mut Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event)?,
            None => break,
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = resolve_config(&cli);
    if cli.save {
        config.save()?;
    }

    let transport = HttpTransport::from_config(&config)?;
    let endpoint = transport.endpoint();
    tracing::info!(%endpoint, typing_delay_ms = config.typing_delay_ms, "starting chat session");

    let conversation = Conversation::from_config(Arc::new(transport), &config);
    let mut events = EventHandler::new(conversation.subscribe());
    let mut app = App::new(conversation, endpoint);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;

    let result = run(&mut terminal, &mut app, &mut events).await;

    // In-flight replies must not touch a session that has ended
    app.conversation.close();
    tui::restore()?;

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use natter_core::config::BASE_URL_ENV;

    #[test]
    fn test_flags_override_env_and_file() {
        std::env::set_var(BASE_URL_ENV, "https://from-env.example.com");
        let mut config = Config {
            base_url: "https://from-file.example.com".to_string(),
            typing_delay_ms: 250,
            request_timeout_secs: 10,
        };
        config.apply_env();

        let cli = Cli::parse_from(["natter", "--base-url", "https://from-flag.example.com"]);
        apply_cli(&mut config, &cli);
        std::env::remove_var(BASE_URL_ENV);

        assert_eq!(config.base_url, "https://from-flag.example.com");
        // Settings without a flag keep the file's values
        assert_eq!(config.typing_delay_ms, 250);
        assert_eq!(config.request_timeout_secs, 10);
    }

    #[test]
    fn test_flags_override_defaults() {
        let mut config = Config::new();
        let cli = Cli::parse_from(["natter", "--typing-delay-ms", "0", "--timeout", "5"]);
        apply_cli(&mut config, &cli);

        assert_eq!(config.base_url, natter_core::config::DEFAULT_BASE_URL);
        assert_eq!(config.typing_delay_ms, 0);
        assert_eq!(config.request_timeout_secs, 5);
    }

    #[test]
    fn test_log_file_created_in_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("natter");

        assert!(open_log_file(&nested).is_ok());
        assert!(nested.join("natter.log").exists());
    }

    #[test]
    fn test_unusable_log_dir_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let not_a_dir = dir.path().join("plain-file");
        fs::write(&not_a_dir, "x").unwrap();

        assert!(open_log_file(&not_a_dir).is_err());
    }
}
