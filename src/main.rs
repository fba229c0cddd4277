//! Bella - conversational thinking engine
//!
//! Main entry point for the Bella command-line application.

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use bella::agent::metrics::init_metrics_exporter;
use bella::cli::{Cli, Commands};
use bella::commands;
use bella::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse first so logging flags take effect
    let cli = Cli::parse_args();

    init_tracing(cli.verbose, cli.json_logs);
    init_metrics_exporter();

    let config = Config::load(cli.config_path(), &cli)?;
    config.validate()?;

    match cli.command.unwrap_or(Commands::Chat { resume: None }) {
        Commands::Chat { resume } => {
            if let Some(path) = &resume {
                tracing::debug!("Resuming conversation from {}", path.display());
            }
            commands::chat::run_chat(config, resume).await?;
            Ok(())
        }
        Commands::Ask { prompt } => {
            let prompt = prompt.join(" ");
            tracing::debug!("Answering one-shot prompt");
            commands::ask::run_ask(config, &prompt).await?;
            Ok(())
        }
        Commands::Report { prompts, json } => {
            tracing::info!("Generating performance report");
            commands::report::run_report(config, &prompts, json).await?;
            Ok(())
        }
    }
}

/// Initialize tracing subscriber with environment filter
///
/// `RUST_LOG` wins; otherwise `bella=info`, or `bella=debug` with
/// `--verbose`.
fn init_tracing(verbose: bool, json: bool) {
    let default_level = if verbose { "bella=debug" } else { "bella=info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
