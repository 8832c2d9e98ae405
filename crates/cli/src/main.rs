use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use lib::agent::NutritionistFactory;
use lib::channels::{ChatTransport, InboundEvent, TelegramChannel};
use lib::router::Router;
use lib::session::SessionResolver;
use lib::storage::AttachmentStore;

#[derive(Parser)]
#[command(name = "smartnutri")]
#[command(about = "SmartNutri Telegram bot", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Create the configuration directory and a default config file
    Init {
        /// Config file path (default: SMARTNUTRI_CONFIG_PATH or ~/.smartnutri/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,
    },

    /// Run the bot: start the Telegram long-poll loop and the event router
    Run {
        /// Config file path (default: SMARTNUTRI_CONFIG_PATH or ~/.smartnutri/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) => {
            println!("smartnutri {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Init { config }) => {
            if let Err(e) = run_init(config) {
                log::error!("init failed: {}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Run { config }) => {
            if let Err(e) = run_bot(config).await {
                log::error!("bot failed: {}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("Run with --help for usage");
        }
    }
}

fn run_init(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let path = config_path.unwrap_or_else(lib::config::default_config_path);
    if path.exists() {
        println!("configuration already exists at {}", path.display());
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let config = lib::config::Config::default();
    std::fs::write(&path, serde_json::to_string_pretty(&config)?)?;
    println!("initialized configuration at {}", path.display());
    Ok(())
}

async fn run_bot(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let (config, _path) = lib::config::load_config(config_path)?;
    let token = lib::config::resolve_telegram_token(&config).ok_or_else(|| {
        anyhow::anyhow!("telegram bot token not configured (set TELEGRAM_BOT_TOKEN or telegram.botToken)")
    })?;
    let bot_name = config
        .telegram
        .bot_name
        .clone()
        .unwrap_or_else(|| "SmartNutri".to_string());
    log::info!("starting {}", bot_name);

    let channel = Arc::new(TelegramChannel::new(token, config.telegram.api_base.clone()));
    let transport: Arc<dyn ChatTransport> = channel.clone();
    let factory = Arc::new(NutritionistFactory::from_config(&config.agent));
    let sessions = Arc::new(SessionResolver::new(factory));
    let attachments = AttachmentStore::new(config.storage_dir.clone());
    let router = Arc::new(Router::new(transport, sessions, attachments));

    let (inbound_tx, inbound_rx) = tokio::sync::mpsc::channel::<InboundEvent>(64);
    let poll_handle = channel.clone().start_inbound(inbound_tx);
    router.run(inbound_rx).await;
    let _ = poll_handle.await;
    Ok(())
}
