//! cdngate CLI - manage a public CDN container from the command line
//!
//! Binds to one container of an S3-compatible store and exposes the gateway
//! and blob operations as subcommands.

mod commands;

use clap::{Parser, Subcommand};
use commands::{BlobCommand, ContainerCommand, StoreArgs};
use tracing_subscriber::{layer::SubscriberExt, Layer};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn", env = "CDNGATE_LOG_LEVEL", global = true)]
    log_level: String,

    /// Log format: compact, full
    #[arg(
        long,
        default_value = "compact",
        env = "CDNGATE_LOG_FORMAT",
        global = true
    )]
    log_format: String,

    #[command(flatten)]
    store: StoreArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Container-level operations (info, list, delete)
    #[command(flatten)]
    Container(ContainerCommand),
    /// Blob-level operations (put, get, exists, rm)
    #[command(flatten)]
    Blob(BlobCommand),
}

fn init_tracing(log_level: &str, log_format: &str) -> anyhow::Result<()> {
    // If RUST_LOG is set, use it directly; otherwise scope the level to our crates
    let filter = match std::env::var("RUST_LOG") {
        Ok(_) => tracing_subscriber::EnvFilter::try_from_default_env()?,
        Err(_) => tracing_subscriber::EnvFilter::new(format!(
            "cdngate={level},\
             cdngate_cli={level},\
             cdngate_store={level},\
             aws_config=warn,\
             aws_smithy_runtime=warn,\
             hyper=warn",
            level = log_level
        )),
    };

    let fmt_layer = match log_format {
        "full" => tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed(),
        _ => tracing_subscriber::fmt::layer() // "compact" or any other value
            .compact()
            .with_target(false)
            .with_writer(std::io::stderr)
            .boxed(),
    };

    let subscriber = tracing_subscriber::registry().with(filter).with(fmt_layer);
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level, &cli.log_format)?;

    let mut gateway = cli.store.connect().await?;

    match cli.command {
        Commands::Container(cmd) => cmd.execute(&mut gateway).await,
        Commands::Blob(cmd) => cmd.execute(&mut gateway).await,
    }
}
