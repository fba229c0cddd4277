//! Prompt construction
//!
//! This module assembles the text sent to the generation backends: the
//! persona system message for cloud providers and the context-aware prompt
//! built from the conversation bundle.

pub mod persona_prompt;

use crate::agent::conversation::{ContextBundle, Role};
use crate::chat_mode::ChatMode;
use crate::providers::Message;

/// Turns of transcript included in a prompt (three exchanges)
const TRANSCRIPT_TURNS: usize = 6;

/// Persona system message in the given language
///
/// # Examples
///
/// ```
/// use bella::prompts::persona_prompt;
///
/// let msg = persona_prompt("en");
/// assert_eq!(msg.role, "system");
/// assert!(msg.content.contains("Bella"));
/// ```
pub fn persona_prompt(language: &str) -> Message {
    Message::system(persona_prompt::generate_persona_prompt(language))
}

/// Builds the prompt for one generation attempt
///
/// The prompt is the optional synthesized system prompt, a transcript of the
/// last three exchanges, and the current turn as `User: <prompt>\nBella:`.
/// Local models additionally get the mode instruction at the very front.
///
/// The current user turn is recorded before generation starts, so a trailing
/// transcript entry identical to `prompt` is not repeated.
///
/// # Arguments
///
/// * `prompt` - Sanitized user text
/// * `context` - Context bundle from the conversation
/// * `mode` - Active chat mode
/// * `is_local` - Whether the prompt is for the local model
///
/// # Examples
///
/// ```
/// use bella::agent::conversation::ConversationContext;
/// use bella::chat_mode::ChatMode;
/// use bella::prompts::enhance_prompt_for_mode;
///
/// let context = ConversationContext::default();
/// let bundle = context.get_context_for_thinking(false);
/// let prompt = enhance_prompt_for_mode("hi", &bundle, ChatMode::Casual, false);
/// assert_eq!(prompt, "User: hi\nBella:");
/// ```
pub fn enhance_prompt_for_mode(
    prompt: &str,
    context: &ContextBundle,
    mode: ChatMode,
    is_local: bool,
) -> String {
    let mut contextual = String::new();

    if let Some(system_prompt) = &context.system_prompt {
        contextual.push_str(system_prompt);
        contextual.push_str("\n\n");
    }

    let mut history = context.conversation_history.as_slice();
    if let Some((last, rest)) = history.split_last() {
        if last.role == Role::User && last.content == prompt {
            history = rest;
        }
    }
    let start = history.len().saturating_sub(TRANSCRIPT_TURNS);
    let recent = &history[start..];

    if !recent.is_empty() {
        contextual.push_str("Recent conversation:\n");
        for entry in recent {
            let speaker = match entry.role {
                Role::User => "User",
                Role::Assistant => "Bella",
            };
            contextual.push_str(&format!("{}: {}\n", speaker, entry.content));
        }
        contextual.push('\n');
    }

    contextual.push_str(&format!("User: {}\nBella:", prompt));

    if is_local {
        contextual = format!("{}\n\n{}", mode.local_instruction(), contextual);
    }

    contextual
}
