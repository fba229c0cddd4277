//! Chat mode types and utilities
//!
//! This module defines the conversational style selector:
//! - Casual mode: warm, chatty replies
//! - Assistant mode: clear, professional answers
//! - Creative mode: vivid, imaginative language
//!
//! The mode shapes the instruction string prepended to local-model prompts
//! and is recorded on every turn of the conversation.

use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Chat mode for conversation sessions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatMode {
    /// Warm, conversational tone
    #[default]
    Casual,

    /// Helpful, professional yet approachable tone
    Assistant,

    /// Imaginative answers with vivid language
    Creative,
}

impl fmt::Display for ChatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ChatMode {
    /// All modes, in menu order
    pub const ALL: [ChatMode; 3] = [ChatMode::Casual, ChatMode::Assistant, ChatMode::Creative];

    /// Parse a chat mode from a string
    ///
    /// # Arguments
    ///
    /// * `s` - String representation of the mode ("casual", "assistant" or "creative")
    ///
    /// # Returns
    ///
    /// Returns the parsed ChatMode or an error if the string is invalid
    ///
    /// # Examples
    ///
    /// ```
    /// use bella::chat_mode::ChatMode;
    ///
    /// let mode = ChatMode::parse_str("creative").unwrap();
    /// assert_eq!(mode, ChatMode::Creative);
    /// assert!(ChatMode::parse_str("invalid").is_err());
    /// ```
    pub fn parse_str(s: &str) -> Result<Self, String> {
        match s.trim().to_lowercase().as_str() {
            "casual" => Ok(Self::Casual),
            "assistant" => Ok(Self::Assistant),
            "creative" => Ok(Self::Creative),
            other => Err(format!("Unknown chat mode: {}", other)),
        }
    }

    /// Lowercase wire name of the mode
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Casual => "casual",
            Self::Assistant => "assistant",
            Self::Creative => "creative",
        }
    }

    /// Get a user-friendly description of this mode
    pub fn description(&self) -> &'static str {
        match self {
            Self::Casual => "Relaxed, friendly conversation",
            Self::Assistant => "Clear and helpful answers",
            Self::Creative => "Imaginative, playful responses",
        }
    }

    /// Instruction prepended to prompts sent to the local model
    ///
    /// # Examples
    ///
    /// ```
    /// use bella::chat_mode::ChatMode;
    ///
    /// assert!(ChatMode::Casual.local_instruction().contains("warm"));
    /// ```
    pub fn local_instruction(&self) -> &'static str {
        match self {
            Self::Casual => "Respond in a warm, conversational tone with natural language.",
            Self::Assistant => {
                "Provide clear, helpful information in a professional yet approachable manner."
            }
            Self::Creative => {
                "Use creative thinking and vivid language to provide unique perspectives."
            }
        }
    }

    /// Get a colored tag representation of this mode
    ///
    /// # Examples
    ///
    /// ```ignore
    /// use bella::chat_mode::ChatMode;
    ///
    /// let tag = ChatMode::Creative.colored_tag();
    /// println!("{}", tag);  // Displays "[CREATIVE]" in magenta
    /// ```
    pub fn colored_tag(&self) -> String {
        match self {
            Self::Casual => format!("[{}]", "CASUAL".cyan()),
            Self::Assistant => format!("[{}]", "ASSISTANT".green()),
            Self::Creative => format!("[{}]", "CREATIVE".magenta()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_modes() {
        assert_eq!(ChatMode::parse_str("casual").unwrap(), ChatMode::Casual);
        assert_eq!(ChatMode::parse_str("ASSISTANT").unwrap(), ChatMode::Assistant);
        assert_eq!(ChatMode::parse_str(" creative ").unwrap(), ChatMode::Creative);
    }

    #[test]
    fn test_parse_unknown_mode() {
        let err = ChatMode::parse_str("invalid").unwrap_err();
        assert!(err.contains("Unknown chat mode"));
    }

    #[test]
    fn test_default_is_casual() {
        assert_eq!(ChatMode::default(), ChatMode::Casual);
    }

    #[test]
    fn test_display_matches_wire_name() {
        for mode in ChatMode::ALL {
            assert_eq!(mode.to_string(), mode.as_str());
        }
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&ChatMode::Creative).unwrap();
        assert_eq!(json, "\"creative\"");
        let back: ChatMode = serde_json::from_str("\"assistant\"").unwrap();
        assert_eq!(back, ChatMode::Assistant);
    }

    #[test]
    fn test_local_instructions_differ() {
        let casual = ChatMode::Casual.local_instruction();
        let assistant = ChatMode::Assistant.local_instruction();
        let creative = ChatMode::Creative.local_instruction();
        assert_ne!(casual, assistant);
        assert_ne!(assistant, creative);
    }

    #[test]
    fn test_colored_tag_contains_name() {
        assert!(ChatMode::Assistant.colored_tag().contains("ASSISTANT"));
    }
}
