//! RelAnn CLI - relation annotation from the terminal
//!
//! Usage:
//!   relann predict <sentence>
//!   relann review [--sentence <sentence>]
//!   relann skip <sentence>

mod command;
mod review;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use relann_client::{ExtractionService, HttpServices, ReviewWorkflow, SentenceQueue};
use relann_core::{AppConfig, LoggingConfig};

#[derive(Parser)]
#[command(name = "relann")]
#[command(about = "Review extracted relation triples and store the verdicts")]
#[command(version)]
struct Cli {
    /// TOML config file; environment variables still override it
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Drop repeated triples from confirmed lists
    #[arg(long, global = true)]
    dedup: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the extraction candidates for a sentence
    Predict {
        /// Sentence to extract from
        sentence: String,
    },
    /// Review sentences interactively
    Review {
        /// Start with this sentence instead of the queue
        #[arg(long)]
        sentence: Option<String>,
    },
    /// Mark a sentence as skipped in the queue
    Skip {
        /// Sentence to skip
        sentence: String,
    },
}

fn load_config(cli: &Cli) -> anyhow::Result<AppConfig> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::from_file(path)?.with_env_override()?,
        None => AppConfig::from_env()?,
    };
    if cli.dedup {
        config.review.dedup_on_confirm = true;
    }
    Ok(config)
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "relann={0},relann_review={0},relann_client={0}",
            logging.level
        )
        .into()
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if logging.json_format {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    init_tracing(&config.logging);

    tracing::debug!(
        extraction = %config.services.extraction_url,
        persistence = %config.services.persistence_url,
        queue = %config.services.queue_url,
        dedup = config.review.dedup_on_confirm,
        "configuration loaded"
    );

    match cli.command {
        Commands::Predict { sentence } => {
            let services = HttpServices::from_config(&config.services)?;
            let response = services.predict(&sentence).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Commands::Review { sentence } => {
            let mut workflow = ReviewWorkflow::from_config(&config)?;
            match sentence {
                Some(sentence) => {
                    workflow.submit(sentence).await?;
                }
                None => {
                    if let Err(e) = workflow.next_sentence().await {
                        tracing::warn!(error = %e, "could not fetch a sentence from the queue");
                        eprintln!("{e}; use `p <sentence>` or `n` to start");
                    }
                }
            }
            review::run(&mut workflow).await?;
        }
        Commands::Skip { sentence } => {
            let services = HttpServices::from_config(&config.services)?;
            services.skip(&sentence).await?;
            println!("Skipped: {sentence}");
        }
    }

    Ok(())
}
