use std::path::Path;

use anyhow::Result;
use clap::Parser;
use tracing::error;

use receipt_infrastructure::{AppConfig, CONFIG_PATH_ENV};

#[derive(Parser, Debug)]
#[command(name = "receipt-hook")]
#[command(about = "Receipt extraction webhook for object storage events", long_about = None)]
struct Args {
    /// Path to config file
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    if let Some(config) = args.config {
        std::env::set_var(CONFIG_PATH_ENV, config);
    }

    // Config comes first: it decides whether logs also go to a file.
    let config = AppConfig::load().await?;
    let _log_guard = receipt_bootstrap::init_tracing(config.log_dir.as_deref().map(Path::new))?;

    if let Err(err) = receipt_bootstrap::run_standalone(config).await {
        error!("receipt hook exited: {:#}", err);
        return Err(err);
    }
    Ok(())
}
