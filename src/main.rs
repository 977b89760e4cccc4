use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use telegent_bot::application::{run, RunOptions};
use telegent_bot::infrastructure::config::Settings;

#[derive(Parser)]
#[command(name = "telegent-bot")]
#[command(about = "Telegram assistant with AI chat and plugins", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Settings file path
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Data directory (overrides settings)
    #[arg(short, long)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot
    Run,
    /// Show version
    Version,
    /// Generate default settings
    InitConfig,
}

fn main() -> ExitCode {
    // A missing .env file is fine, the environment may already be set
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run => run_bot(RunOptions {
            config_path: cli.config,
            data_dir: cli.data_dir,
        }),
        Commands::Version => {
            println!("telegent-bot v{}", env!("CARGO_PKG_VERSION"));
            ExitCode::SUCCESS
        }
        Commands::InitConfig => init_config(),
    }
}

fn run_bot(options: RunOptions) -> ExitCode {
    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to start bot: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match rt.block_on(run(&options)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Startup failed: {}", e);
            eprintln!("Failed to start bot: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_config() -> ExitCode {
    match Settings::default().to_yaml() {
        Ok(yaml) => {
            println!("{}", yaml);
            println!("\nSave this to config.yaml and adjust as needed.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Failed to render settings: {}", e);
            ExitCode::FAILURE
        }
    }
}
