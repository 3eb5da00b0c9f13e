use clap::{Parser, Subcommand};
use std::future::Future;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

mod domain;
mod application;
mod infrastructure;

use application::errors::{BotError, StorageError};
use application::messaging::CommandDispatcher;
use application::services::BotService;
use domain::traits::{Bot, TaskStore};
use infrastructure::adapters::{ConsoleAdapter, SlackAdapter};
use infrastructure::config::{Config, Environment, SlackCredentials, StoreBackend, StoreConfig};
use infrastructure::database::SqliteStore;
use infrastructure::storage::MemoryStore;

#[derive(Parser)]
#[command(name = "todo-bot")]
#[command(about = "A Slack TODO list bot", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.yaml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the Slack bot, reading event envelopes from stdin
    Run,
    /// Start a local console bot (no Slack credentials needed)
    Console,
    /// Show version
    Version,
    /// Generate default config
    InitConfig,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run => launch(&cli.config, true),
        Commands::Console => launch(&cli.config, false),
        Commands::Version => {
            println!("todo-bot v{}", env!("CARGO_PKG_VERSION"));
            ExitCode::SUCCESS
        }
        Commands::InitConfig => init_config(),
    }
}

fn launch(config_path: &str, slack: bool) -> ExitCode {
    // Nothing starts until the configuration is known to be complete
    let config = match Config::resolve(config_path).and_then(|config| {
        config.validate()?;
        Ok(config)
    }) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration ({}): {}", e.kind(), e);
            return ExitCode::FAILURE;
        }
    };

    let credentials = if slack {
        match config.slack_credentials() {
            Ok(credentials) => Some(credentials),
            Err(e) => {
                eprintln!("Error loading configuration ({}): {}", e.kind(), e);
                return ExitCode::FAILURE;
            }
        }
    } else {
        None
    };

    init_logging(config.environment);

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to start async runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = rt.block_on(async {
        match credentials {
            Some(credentials) => run_slack(&config, credentials).await,
            None => run_console(&config).await,
        }
    });
    // A pending stdin read would otherwise hold the runtime open
    rt.shutdown_timeout(Duration::from_secs(1));

    match result {
        Ok(()) => {
            tracing::info!("todo-bot stopped");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("todo-bot failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(environment: Environment) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::default().add_directive(environment.log_level().into())
    });

    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(filter)
        .init();
}

fn open_store(config: &StoreConfig) -> Result<Arc<dyn TaskStore>, StorageError> {
    match config.backend {
        StoreBackend::Memory => {
            tracing::info!("Using in-memory task store");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreBackend::Sqlite => {
            let store = SqliteStore::open(&config.path)?;
            tracing::info!("Using SQLite task store at {}", config.path.display());
            Ok(Arc::new(store))
        }
    }
}

async fn run_slack(config: &Config, credentials: SlackCredentials) -> Result<(), BotError> {
    tracing::info!(
        port = credentials.port,
        socket_mode = credentials.socket_mode(),
        "Starting todo-bot for Slack"
    );

    let store = open_store(&config.store)?;
    let mut bot = SlackAdapter::new(credentials, config.bot.name.clone(), &config.bot.trigger_pattern)?;
    bot.fetch_bot_info().await?;

    let info = bot.bot_info();
    tracing::info!("Bot started: @{} ({}) on {}", info.name, info.id, info.platform);

    serve(Arc::new(bot), store, config).await
}

async fn run_console(config: &Config) -> Result<(), BotError> {
    let store = open_store(&config.store)?;
    let bot = ConsoleAdapter::new(config.bot.name.clone());
    serve(Arc::new(bot), store, config).await
}

/// How long a listener gets to report its result once the loop has stopped
const LISTENER_GRACE: Duration = Duration::from_millis(500);

/// Pump events from `bot` through the dispatcher until input ends or a
/// termination signal arrives
async fn serve<B: Bot + 'static>(bot: Arc<B>, store: Arc<dyn TaskStore>, config: &Config) -> Result<(), BotError> {
    serve_until(bot, store, config, shutdown_signal()).await
}

async fn serve_until<B, F>(bot: Arc<B>, store: Arc<dyn TaskStore>, config: &Config, shutdown: F) -> Result<(), BotError>
where
    B: Bot + 'static,
    F: Future<Output = ()> + Send,
{
    let dispatcher = Arc::new(CommandDispatcher::new(store, config.bot.name.clone()));
    let service = Arc::new(BotService::new(bot.clone(), dispatcher));

    let (tx, rx) = mpsc::channel(config.bot.queue_size);
    let mut listener = tokio::spawn(async move { bot.start(tx).await });

    tracing::info!("Starting message loop...");
    let handled = service.run(rx, shutdown).await;
    tracing::info!(handled, "Message loop finished");

    // A listener still blocked on input after a shutdown signal is abandoned
    match tokio::time::timeout(LISTENER_GRACE, &mut listener).await {
        Ok(Ok(Ok(()))) => {}
        Ok(Ok(Err(e))) => return Err(e),
        Ok(Err(e)) => tracing::warn!("Event listener task failed: {}", e),
        Err(_) => listener.abort(),
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    tracing::info!("Shutting down gracefully...");
}

fn init_config() -> ExitCode {
    match serde_yaml::to_string(&Config::default()) {
        Ok(yaml) => {
            println!("{}", yaml);
            println!("\nSave this to config.yaml and adjust as needed.");
            println!("Slack credentials can also come from SLACK_BOT_TOKEN and SLACK_SIGNING_SECRET.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Failed to render default config: {}", e);
            ExitCode::FAILURE
        }
    }
}
