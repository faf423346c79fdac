use clap::Parser;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;
use tracing_subscriber::fmt::writer::MakeWriterExt;

mod cli;
mod commands;
mod config;
mod error;
mod output;

use cli::{CliArgs, Commands};
use commands::CommandExecutor;
use config::AppConfig;
use error::AppError;

const BANNER: &str = r#"
███████╗ ██████╗██████╗ ██╗ ██████╗
██╔════╝██╔════╝██╔══██╗██║██╔═══██╗
███████╗██║     ██████╔╝██║██║   ██║
╚════██║██║     ██╔══██╗██║██║   ██║
███████║╚██████╗██║  ██║██║╚██████╔╝
╚══════╝ ╚═════╝╚═╝  ╚═╝╚═╝ ╚═════╝
"#;

fn main() {
    if let Err(e) = bootstrap() {
        eprintln!("Error: {e}");
        error!(error = ?e, "scrio exited with an error");
        std::process::exit(1);
    }
}

#[tokio::main]
async fn bootstrap() -> Result<(), AppError> {
    let args = CliArgs::parse();

    let log_level = if args.verbose {
        Level::DEBUG
    } else if args.quiet {
        Level::ERROR
    } else {
        Level::INFO
    };

    // Command output goes to stdout; logs go to stderr and the log file.
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open("scrio.log")?;
    let multi_writer = MakeWriterExt::and(std::io::stderr, log_file);
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(multi_writer)
        .with_ansi(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| AppError::Initialization(e.to_string()))?;

    info!("{BANNER}");

    let mut app_config = AppConfig::load(args.config.as_deref())?;
    if let Some(upstream) = args.upstream {
        app_config.upstream_url = upstream;
    }
    if let Some(cache_dir) = args.cache_dir {
        app_config.cache_dir = Some(cache_dir);
    }

    let engine_config = app_config.to_engine_config()?;
    info!(
        upstream = %engine_config.upstream.base_url,
        data_version = %engine_config.cache.data_version,
        "scrio starting"
    );

    let executor = CommandExecutor::new(engine_config).await?;

    let result = match &args.command {
        Commands::Fetch {
            target,
            output,
            output_file,
        } => {
            executor
                .fetch(target, output, output_file.as_deref())
                .await
        }
        Commands::Paths { target, filter } => executor.paths(target, filter.as_deref()).await,
        Commands::Stats { output } => executor.stats(output).await,
        Commands::Status { wait, output } => executor.status(*wait, output).await,
        Commands::Delete { target } => executor.delete(target).await,
        Commands::Clear => executor.clear().await,
    };

    executor.shutdown().await;
    result
}
