//! Issue Scribe binary.
//!
//! Start the bot with:
//! ```bash
//! cargo run -p scribe-telegram --bin issue-scribe -- -v
//! ```

use std::path::PathBuf;

use clap::Parser;
use scribe_core::{config, ScribeConfig};
use scribe_telegram::ScribeBot;
use tracing_subscriber::EnvFilter;

/// Environment variable holding an explicit log filter.
const LOG_ENV: &str = "SCRIBE_LOG";

/// Issue Scribe - turn chat notes and screenshots into tracker issues
#[derive(Parser, Debug)]
#[command(name = "issue-scribe")]
#[command(about = "Telegram bot that files issues generated from chat input")]
struct Args {
    /// Env file to load before the defaults
    #[arg(short, long)]
    env_file: Option<PathBuf>,

    /// Verbose logging (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // dotenvy never overrides variables that are already set, so the first file wins
    if let Some(path) = &args.env_file {
        dotenvy::from_path(path)?;
    }
    let env_path = config::env_file();
    if env_path.exists() {
        let _ = dotenvy::from_path(&env_path);
    }
    let _ = dotenvy::from_filename(".env.local").or_else(|_| dotenvy::dotenv());

    let filter = match args.verbose {
        0 => "issue_scribe=info,scribe_telegram=info,teloxide=warn",
        1 => "issue_scribe=debug,scribe_telegram=debug,scribe_completion=debug,scribe_tracker=debug,teloxide=info",
        2 => "issue_scribe=trace,scribe_telegram=trace,scribe_completion=trace,scribe_tracker=trace,teloxide=debug",
        _ => "trace",
    };
    let filter = std::env::var(LOG_ENV)
        .ok()
        .and_then(|directive| EnvFilter::try_new(directive).ok())
        .unwrap_or_else(|| EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info")));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = ScribeConfig::from_env()?;
    let bot = ScribeBot::new(&config)?;

    match bot.get_me().await {
        Ok(username) => {
            tracing::info!(username = %username, "Bot initialized successfully");
            println!("\n[robot] Issue Scribe");
            println!("   Bot: @{}", username);
            println!(
                "   Filing to: {}/{} (project #{})",
                config.github.owner, config.github.repo, config.github.project_number
            );
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to get bot info");
            return Err(e.into());
        }
    }

    println!("\n[phone] Open Telegram and send /create_issue to begin");
    println!("   Press Ctrl+C to stop\n");

    bot.start_polling().await?;

    Ok(())
}
