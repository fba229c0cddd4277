//! Command-line interface definition for Bella
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for interactive chat, one-shot questions, and
//! performance reports.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Bella - conversational thinking engine
///
/// Talk to Bella through cloud providers or a local model, with graceful
/// fallback when a backend is unavailable.
#[derive(Parser, Debug, Clone)]
#[command(name = "bella")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Preferred provider (local, openai, qwen, ernie, glm)
    #[arg(short, long, global = true)]
    pub provider: Option<String>,

    /// Chat mode (casual, assistant, creative)
    #[arg(short, long, global = true)]
    pub mode: Option<String>,

    /// Command to execute; defaults to `chat`
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands for Bella
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Start an interactive chat session
    Chat {
        /// Restore a previously exported conversation before chatting
        #[arg(long)]
        resume: Option<PathBuf>,
    },

    /// Ask a single question and print the reply
    Ask {
        /// The question
        #[arg(required = true, num_args = 1..)]
        prompt: Vec<String>,
    },

    /// Print a performance report
    ///
    /// With prompts, each is answered first so the report has data.
    Report {
        /// Prompts to answer before reporting
        prompts: Vec<String>,

        /// Output the report as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    /// Parse command line arguments
    ///
    /// # Returns
    ///
    /// Returns the parsed CLI structure
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Path of the configuration file
    pub fn config_path(&self) -> &str {
        self.config.as_deref().unwrap_or("config/config.yaml")
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/config.yaml".to_string()),
            verbose: false,
            json_logs: false,
            provider: None,
            mode: None,
            command: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default() {
        let cli = Cli::default();
        assert_eq!(cli.config_path(), "config/config.yaml");
        assert!(!cli.verbose);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_cli_no_subcommand() {
        let cli = Cli::try_parse_from(["bella"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.config_path(), "config/config.yaml");
    }

    #[test]
    fn test_cli_parse_chat_with_globals() {
        let cli =
            Cli::try_parse_from(["bella", "chat", "--provider", "qwen", "--mode", "creative"])
                .unwrap();
        assert_eq!(cli.command, Some(Commands::Chat { resume: None }));
        assert_eq!(cli.provider.as_deref(), Some("qwen"));
        assert_eq!(cli.mode.as_deref(), Some("creative"));
    }

    #[test]
    fn test_cli_parse_chat_resume() {
        let cli = Cli::try_parse_from(["bella", "chat", "--resume", "session.json"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Commands::Chat {
                resume: Some(PathBuf::from("session.json"))
            })
        );
    }

    #[test]
    fn test_cli_parse_ask_joins_words() {
        let cli = Cli::try_parse_from(["bella", "ask", "how", "are", "you"]).unwrap();
        match cli.command {
            Some(Commands::Ask { prompt }) => assert_eq!(prompt.join(" "), "how are you"),
            other => panic!("Expected Ask command, got {:?}", other),
        }
    }

    #[test]
    fn test_cli_ask_requires_prompt() {
        assert!(Cli::try_parse_from(["bella", "ask"]).is_err());
    }

    #[test]
    fn test_cli_parse_report_json() {
        let cli = Cli::try_parse_from(["bella", "report", "--json", "hi"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Commands::Report {
                prompts: vec!["hi".to_string()],
                json: true
            })
        );
    }

    #[test]
    fn test_cli_global_flags() {
        let cli = Cli::try_parse_from([
            "bella",
            "--config",
            "custom.yaml",
            "--verbose",
            "--json-logs",
            "report",
        ])
        .unwrap();
        assert_eq!(cli.config_path(), "custom.yaml");
        assert!(cli.verbose);
        assert!(cli.json_logs);
    }

    #[test]
    fn test_cli_invalid_command() {
        assert!(Cli::try_parse_from(["bella", "invalid"]).is_err());
    }
}
