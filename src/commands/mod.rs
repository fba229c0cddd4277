/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

It exposes three top-level command modules:

- `chat`: Interactive chat session
- `ask`: Answer a single prompt
- `report`: Print a performance report

Each handler builds a `ThinkingOrchestrator` from the loaded configuration
and shuts it down before returning.
*/

use crate::agent::conversation::ConversationExport;
use crate::agent::monitor::{PerformanceReport, Recommendation};
use crate::agent::ThinkingOrchestrator;
use crate::config::Config;
use crate::error::{BellaError, Result};
use colored::Colorize;
use serde::Serialize;
use std::fmt::Write as _;
use std::path::Path;

// Special commands parser for the chat session
pub mod special_commands;

/// Construct the orchestrator, load the local model, start monitoring
///
/// # Errors
///
/// Returns error if a provider client cannot be created
pub async fn start_orchestrator(config: &Config) -> Result<ThinkingOrchestrator> {
    let bella = ThinkingOrchestrator::new(config)?;
    bella.init().await;
    Ok(bella)
}

/// Write the current conversation to `path` as pretty JSON
///
/// # Errors
///
/// Returns error if serialization or the write fails
pub fn export_to_file(bella: &ThinkingOrchestrator, path: &Path) -> Result<()> {
    let snapshot = bella.export_conversation();
    let json = serde_json::to_string_pretty(&snapshot)?;
    std::fs::write(path, json)?;
    tracing::info!("Exported conversation to {}", path.display());
    Ok(())
}

/// Restore a conversation previously written by [`export_to_file`]
///
/// # Errors
///
/// Returns error if the file cannot be read or parsed, or the snapshot is
/// rejected
pub fn import_from_file(bella: &ThinkingOrchestrator, path: &Path) -> Result<()> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        BellaError::InvalidConversation(format!("cannot read {}: {}", path.display(), e))
    })?;
    let snapshot: ConversationExport = serde_json::from_str(&contents)?;
    bella.import_conversation(snapshot)?;
    tracing::info!("Imported conversation from {}", path.display());
    Ok(())
}

/// Report plus recommendations, as printed by `bella report --json`
#[derive(Debug, Serialize)]
pub struct ReportOutput<'a> {
    pub report: &'a PerformanceReport,
    pub recommendations: &'a [Recommendation],
}

/// Human-readable rendering of a performance report
pub fn render_report(report: &PerformanceReport, recommendations: &[Recommendation]) -> String {
    let mut out = String::new();
    let summary = &report.summary;

    let _ = writeln!(out, "{}", "Performance Report".bold());
    let _ = writeln!(out, "Operations:        {} ({} recent)", summary.total_operations, summary.recent_operations);
    let _ = writeln!(out, "Avg response time: {:.0} ms", summary.average_response_time_ms);
    let _ = writeln!(out, "Success rate:      {:.1}%", summary.success_rate);
    let _ = writeln!(out, "Cache hit rate:    {:.0}%", summary.cache_hit_rate);
    let _ = writeln!(out, "Active alerts:     {}", summary.active_alerts);
    let _ = writeln!(out, "Response threshold: {:.0} ms", report.optimization.current_timeout_ms);

    if !report.providers.is_empty() {
        let _ = writeln!(out, "\n{}", "Providers".bold());
        for (name, stats) in &report.providers {
            let _ = writeln!(
                out,
                "  {:<17} {} calls, {:.1}% ok, {:.0} ms avg",
                name, stats.total, stats.success_rate, stats.avg_time_ms
            );
        }
    }

    if let Some(memory) = report.system_health.memory {
        let _ = writeln!(
            out,
            "\nMemory:            {:.1} MiB used",
            memory.used as f64 / (1024.0 * 1024.0)
        );
    }

    if let Some(trends) = &report.trends {
        let _ = writeln!(
            out,
            "Trends:            latency {:?} ({:+.1}%), success {:?} ({:+.1}%)",
            trends.response_time.trend,
            trends.response_time.change_percent,
            trends.success_rate.trend,
            trends.success_rate.change_percent
        );
    }

    if !report.alerts.is_empty() {
        let _ = writeln!(out, "\n{}", "Alerts".bold());
        for alert in &report.alerts {
            let _ = writeln!(
                out,
                "  [{}] {} ({:.1} vs {:.1})",
                alert.severity.as_str(),
                alert.alert_type,
                alert.current,
                alert.threshold
            );
        }
    }

    if !recommendations.is_empty() {
        let _ = writeln!(out, "\n{}", "Recommendations".bold());
        for rec in recommendations {
            let _ = writeln!(out, "  - {:?}/{:?}: {}", rec.kind, rec.priority, rec.message);
        }
    }

    out
}

// Chat command handler
pub mod chat {
    //! Interactive chat session handler.
    //!
    //! Builds the orchestrator and runs a readline loop that sends each line
    //! to `think()`, handling slash commands locally.

    use super::*;
    use crate::agent::ThinkOptions;
    use crate::commands::special_commands::{parse_special_command, print_help, SpecialCommand};
    use rustyline::error::ReadlineError;
    use rustyline::DefaultEditor;
    use std::path::PathBuf;

    /// Start the interactive chat session
    ///
    /// # Arguments
    ///
    /// * `config` - Validated configuration
    /// * `resume` - Optional conversation export to restore first
    ///
    /// # Errors
    ///
    /// Returns error if the orchestrator or the line editor cannot be created
    pub async fn run_chat(config: Config, resume: Option<PathBuf>) -> Result<()> {
        tracing::info!("Starting interactive chat mode");

        let bella = start_orchestrator(&config).await?;
        if let Some(path) = &resume {
            import_from_file(&bella, path)?;
        }

        let mut rl = DefaultEditor::new()?;
        print_welcome_banner(&bella);

        loop {
            let prompt = format!("{} {} ", bella.mode().colored_tag(), ">>".bold());
            match rl.readline(&prompt) {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }

                    match parse_special_command(trimmed) {
                        Ok(SpecialCommand::None) => {}
                        Ok(SpecialCommand::Exit) => break,
                        Ok(command) => {
                            handle_special_command(&bella, command);
                            continue;
                        }
                        Err(e) => {
                            eprintln!("{}\n", e.to_string().red());
                            continue;
                        }
                    }

                    rl.add_history_entry(trimmed)?;

                    let reply = bella.think(trimmed, ThinkOptions::default()).await;
                    println!("\n{} {}\n", "Bella:".magenta().bold(), reply);
                }
                Err(ReadlineError::Interrupted) => {
                    println!("CTRL-C");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    println!("CTRL-D");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {:?}", err);
                    break;
                }
            }
        }

        bella.shutdown();
        println!("Goodbye!");
        Ok(())
    }

    fn handle_special_command(bella: &ThinkingOrchestrator, command: SpecialCommand) {
        match command {
            SpecialCommand::SwitchMode(mode) => {
                if bella.set_chat_mode(mode.as_str()) {
                    println!("Switched to {} ({})\n", mode.colored_tag(), mode.description());
                }
            }
            SpecialCommand::SwitchProvider(name) => {
                if bella.switch_provider(&name) {
                    let current = bella.get_current_config();
                    println!("Provider: {} ({})", current.provider.name.green(), current.provider.model);
                    if !current.is_configured {
                        println!("{}", "Provider is not ready; replies will fall back.".yellow());
                    }
                    println!();
                } else {
                    eprintln!("{}\n", format!("Unknown provider: {}", name).red());
                }
            }
            SpecialCommand::SetApiKey { provider, key } => {
                if bella.set_api_key(&provider, &key) {
                    println!("{}\n", format!("API key set for {}", provider).green());
                } else {
                    eprintln!("{}\n", format!("Unknown provider: {}", provider).red());
                }
            }
            SpecialCommand::Clear => {
                bella.clear_history();
                println!("Conversation history cleared\n");
            }
            SpecialCommand::NewSession => {
                let id = bella.start_new_session();
                println!("Started new session {}\n", id.cyan());
            }
            SpecialCommand::ShowConfig => print_config(bella),
            SpecialCommand::ShowStats => print_stats(bella),
            SpecialCommand::ShowReport => {
                let report = bella.get_performance_report();
                let recommendations = bella.get_optimization_recommendations();
                println!("{}", render_report(&report, &recommendations));
            }
            SpecialCommand::History(n) => {
                for entry in bella.get_conversation_history(n) {
                    let speaker = match entry.role {
                        crate::agent::Role::User => "You".cyan(),
                        crate::agent::Role::Assistant => "Bella".magenta(),
                    };
                    println!("{}: {}", speaker, entry.content);
                }
                println!();
            }
            SpecialCommand::Export(path) => match export_to_file(bella, &path) {
                Ok(()) => println!("Saved conversation to {}\n", path.display()),
                Err(e) => eprintln!("{}\n", format!("Export failed: {:#}", e).red()),
            },
            SpecialCommand::Import(path) => match import_from_file(bella, &path) {
                Ok(()) => println!("Restored conversation from {}\n", path.display()),
                Err(e) => eprintln!("{}\n", format!("Import failed: {:#}", e).red()),
            },
            SpecialCommand::Help => print_help(),
            SpecialCommand::Exit | SpecialCommand::None => {}
        }
    }

    fn print_welcome_banner(bella: &ThinkingOrchestrator) {
        let current = bella.get_current_config();
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                 Bella - Let's talk!                          ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");
        println!("Mode:     {} ({})", current.mode.colored_tag(), current.mode.description());
        println!("Provider: {} ({})", current.provider.name, current.provider.model);
        if !current.is_configured {
            println!("{}", "Preferred provider is not ready; using fallbacks.".yellow());
        }
        println!("\nType '/help' for available commands, 'exit' to quit\n");
    }

    fn print_config(bella: &ThinkingOrchestrator) {
        let current = bella.get_current_config();
        println!("\nUse cloud:  {}", current.use_cloud);
        println!("Provider:   {} ({})", current.provider.name, current.provider.model);
        println!("Mode:       {}", current.mode.colored_tag());
        println!(
            "Ready:      {}\n",
            if current.is_configured { "yes".green() } else { "no".red() }
        );
    }

    fn print_stats(bella: &ThinkingOrchestrator) {
        let stats = bella.get_session_stats();
        println!("\nSession:           {}", stats.session_id);
        println!("Duration:          {}s", stats.duration_ms / 1000);
        println!("Messages:          {}", stats.message_count);
        println!("Avg response time: {} ms", stats.average_response_time_ms);
        println!("Keywords:          {}", stats.context_keywords);
        println!("Preferences:       {}", stats.user_preferences);
        println!("Active:            {}", stats.is_active);
        println!("Mode:              {}\n", stats.current_mode.colored_tag());
    }
}

// One-shot question handler
pub mod ask {
    //! Answers a single prompt and exits.

    use super::*;
    use crate::agent::ThinkOptions;

    /// Answer `prompt` and print the reply
    ///
    /// # Errors
    ///
    /// Returns error if the orchestrator cannot be created
    pub async fn run_ask(config: Config, prompt: &str) -> Result<()> {
        let bella = start_orchestrator(&config).await?;
        let reply = bella.think(prompt, ThinkOptions::default()).await;
        println!("{}", reply);
        bella.shutdown();
        Ok(())
    }
}

// Performance report handler
pub mod report {
    //! Answers optional prompts, then prints the performance report.

    use super::*;
    use crate::agent::ThinkOptions;

    /// Print the performance report after answering `prompts`
    ///
    /// # Errors
    ///
    /// Returns error if the orchestrator cannot be created or JSON output
    /// fails
    pub async fn run_report(config: Config, prompts: &[String], json: bool) -> Result<()> {
        let bella = start_orchestrator(&config).await?;
        for prompt in prompts {
            let reply = bella.think(prompt, ThinkOptions::default()).await;
            if !json {
                println!("{} {}", "Bella:".magenta().bold(), reply);
            }
        }

        bella.monitor().collect_system_metrics();
        let report = bella.get_performance_report();
        let recommendations = bella.get_optimization_recommendations();

        if json {
            let output = ReportOutput {
                report: &report,
                recommendations: &recommendations,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("{}", render_report(&report, &recommendations));
        }

        bella.shutdown();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::ThinkOptions;
    use crate::providers::{CloudProviderClient, LocalModelClient};
    use crate::test_utils::{fast_config, temp_dir, ScriptedGenerator};
    use std::sync::Arc;

    fn orchestrator(reply: &str) -> ThinkingOrchestrator {
        let config = fast_config();
        let cloud = CloudProviderClient::new(&config.provider).unwrap();
        let local = LocalModelClient::preloaded(Arc::new(ScriptedGenerator::always(reply)));
        ThinkingOrchestrator::with_clients(&config, cloud, local)
    }

    #[tokio::test]
    async fn test_export_then_import_file() {
        let bella = orchestrator("Lovely weather today.");
        bella.think("I enjoy travel", ThinkOptions::default()).await;
        let snapshot = bella.export_conversation();

        let dir = temp_dir();
        let path = dir.path().join("session.json");
        export_to_file(&bella, &path).unwrap();

        let other = orchestrator("unused");
        import_from_file(&other, &path).unwrap();
        let restored = other.export_conversation();
        assert_eq!(restored.session_id, snapshot.session_id);
        assert_eq!(restored.conversation_history, snapshot.conversation_history);
        assert_eq!(restored.user_preferences, snapshot.user_preferences);
    }

    #[test]
    fn test_import_missing_file() {
        let bella = orchestrator("unused");
        let err = import_from_file(&bella, Path::new("/nonexistent/session.json")).unwrap_err();
        assert!(err.to_string().contains("Invalid conversation data"));
    }

    #[test]
    fn test_import_rejects_garbage() {
        let bella = orchestrator("unused");
        let dir = temp_dir();
        let path = crate::test_utils::create_test_file(&dir, "bad.json", "{ not json");
        assert!(import_from_file(&bella, &path).is_err());
    }

    #[tokio::test]
    async fn test_render_report_lists_providers() {
        let bella = orchestrator("Happy to help you.");
        bella.think("hello", ThinkOptions::default()).await;
        let text = render_report(
            &bella.get_performance_report(),
            &bella.get_optimization_recommendations(),
        );
        assert!(text.contains("Operations:        1"));
        assert!(text.contains("local"));
        assert!(text.contains("Recommendations"));
    }

    #[tokio::test]
    async fn test_report_output_serializes() {
        let bella = orchestrator("Happy to help you.");
        bella.think("hello", ThinkOptions::default()).await;
        let report = bella.get_performance_report();
        let recommendations = bella.get_optimization_recommendations();
        let json = serde_json::to_value(ReportOutput {
            report: &report,
            recommendations: &recommendations,
        })
        .unwrap();
        assert_eq!(json["report"]["summary"]["total_operations"], 1);
        assert_eq!(json["recommendations"][0]["action"], "optimize_caching");
    }
}
