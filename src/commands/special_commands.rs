//! Special commands parser for interactive chat mode
//!
//! This module parses slash commands entered during an interactive chat
//! session. Special commands allow users to:
//! - Switch chat mode or provider
//! - Set provider credentials
//! - Clear history or start a new session
//! - Inspect configuration, session statistics and performance
//! - Export and import conversations
//!
//! Command words are case-insensitive; arguments keep their case.

use crate::chat_mode::ChatMode;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when parsing special commands
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Unknown command was entered
    #[error("Unknown command: {0}\n\nType '/help' to see available commands")]
    UnknownCommand(String),

    /// Command was given an unsupported argument
    #[error("Unsupported argument for {command}: {arg}\n\nType '/help' to see valid usage")]
    UnsupportedArgument { command: String, arg: String },

    /// Command requires an argument but none was provided
    #[error("Command {command} requires an argument\n\nUsage: {usage}")]
    MissingArgument { command: String, usage: String },
}

/// Special commands that can be executed during interactive chat
///
/// These commands change session settings or print information instead
/// of being sent to Bella.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialCommand {
    /// Switch the conversational mode
    SwitchMode(ChatMode),

    /// Prefer `local` or a named cloud provider
    SwitchProvider(String),

    /// Set the credential for a cloud provider
    SetApiKey { provider: String, key: String },

    /// Drop the conversation history, keeping the session
    Clear,

    /// Start a new session
    NewSession,

    /// Show provider, mode and readiness
    ShowConfig,

    /// Show session statistics
    ShowStats,

    /// Show the performance report and recommendations
    ShowReport,

    /// Show the last N exchanges
    History(usize),

    /// Write the conversation to a JSON file
    Export(PathBuf),

    /// Restore a conversation from a JSON file
    Import(PathBuf),

    /// Display help information
    Help,

    /// Exit the interactive session
    Exit,

    /// Not a special command; send the input to Bella
    None,
}

fn missing(command: &str, usage: &str) -> CommandError {
    CommandError::MissingArgument {
        command: command.to_string(),
        usage: usage.to_string(),
    }
}

/// Parse user input into a special command
///
/// # Errors
///
/// Returns `CommandError` for unknown commands, missing arguments, and
/// unsupported arguments.
///
/// # Examples
///
/// ```
/// use bella::chat_mode::ChatMode;
/// use bella::commands::special_commands::{parse_special_command, SpecialCommand};
///
/// assert_eq!(
///     parse_special_command("/mode creative").unwrap(),
///     SpecialCommand::SwitchMode(ChatMode::Creative)
/// );
/// assert_eq!(parse_special_command("hello").unwrap(), SpecialCommand::None);
/// assert!(parse_special_command("/mode sleepy").is_err());
/// ```
pub fn parse_special_command(input: &str) -> Result<SpecialCommand, CommandError> {
    let trimmed = input.trim();
    let lower = trimmed.to_lowercase();

    if lower == "exit" || lower == "quit" {
        return Ok(SpecialCommand::Exit);
    }
    if !trimmed.starts_with('/') {
        return Ok(SpecialCommand::None);
    }

    let mut parts = trimmed.split_whitespace();
    let command = parts.next().unwrap_or_default().to_lowercase();
    let args: Vec<&str> = parts.collect();

    match command.as_str() {
        "/mode" => match args.first() {
            None => Err(missing("/mode", "/mode <casual|assistant|creative>")),
            Some(arg) => ChatMode::parse_str(arg).map(SpecialCommand::SwitchMode).map_err(|_| {
                CommandError::UnsupportedArgument {
                    command: "/mode".to_string(),
                    arg: (*arg).to_string(),
                }
            }),
        },
        "/casual" => Ok(SpecialCommand::SwitchMode(ChatMode::Casual)),
        "/assistant" => Ok(SpecialCommand::SwitchMode(ChatMode::Assistant)),
        "/creative" => Ok(SpecialCommand::SwitchMode(ChatMode::Creative)),

        "/provider" => args
            .first()
            .map(|p| SpecialCommand::SwitchProvider(p.to_lowercase()))
            .ok_or_else(|| missing("/provider", "/provider <local|openai|qwen|ernie|glm>")),

        "/key" => match args.as_slice() {
            [provider, key] => Ok(SpecialCommand::SetApiKey {
                provider: provider.to_lowercase(),
                key: (*key).to_string(),
            }),
            _ => Err(missing("/key", "/key <provider> <api_key>")),
        },

        "/clear" => Ok(SpecialCommand::Clear),
        "/new" => Ok(SpecialCommand::NewSession),
        "/config" | "/status" => Ok(SpecialCommand::ShowConfig),
        "/stats" => Ok(SpecialCommand::ShowStats),
        "/report" => Ok(SpecialCommand::ShowReport),

        "/history" => match args.first() {
            None => Ok(SpecialCommand::History(5)),
            Some(arg) => arg.parse().map(SpecialCommand::History).map_err(|_| {
                CommandError::UnsupportedArgument {
                    command: "/history".to_string(),
                    arg: (*arg).to_string(),
                }
            }),
        },

        "/export" => args
            .first()
            .map(|p| SpecialCommand::Export(PathBuf::from(p)))
            .ok_or_else(|| missing("/export", "/export <file.json>")),
        "/import" => args
            .first()
            .map(|p| SpecialCommand::Import(PathBuf::from(p)))
            .ok_or_else(|| missing("/import", "/import <file.json>")),

        "/help" | "/?" => Ok(SpecialCommand::Help),
        "/exit" | "/quit" => Ok(SpecialCommand::Exit),

        _ => Err(CommandError::UnknownCommand(command)),
    }
}

/// Print help for the special commands
pub fn print_help() {
    println!(
        r#"
Special Commands for Interactive Chat Mode
===========================================

CHAT MODE:
  /mode <m>             - Switch mode (casual, assistant, creative)
  /casual, /assistant, /creative - Shorthands for /mode

PROVIDERS:
  /provider <p>         - Prefer local or a cloud provider (openai, qwen, ernie, glm)
  /key <p> <api_key>    - Set the API key for a cloud provider

SESSION:
  /clear                - Clear the conversation history
  /new                  - Start a new session
  /history [n]          - Show the last n exchanges (default 5)
  /export <file>        - Save the conversation as JSON
  /import <file>        - Restore a conversation from JSON

INFORMATION:
  /config               - Show provider, mode and readiness
  /stats                - Show session statistics
  /report               - Show the performance report

OTHER:
  /help                 - Show this help
  /quit, exit           - Leave the chat
"#
    );
}
