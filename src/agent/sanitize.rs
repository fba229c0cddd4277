//! Input sanitization and response cleaning

use crate::error::{BellaError, Result};

use once_cell::sync::Lazy;
use regex::Regex;

/// Longest prompt accepted, in characters
pub const MAX_PROMPT_CHARS: usize = 1000;

/// Longest reply returned, in characters
pub const MAX_RESPONSE_CHARS: usize = 2000;

/// Shortest reply accepted after cleaning, in characters
pub const MIN_RESPONSE_CHARS: usize = 2;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex"));

static RESPONSE_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(AI:|Assistant:|Bella:|Response:)").expect("prefix regex"));

static BRACKETED: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[.*?\]").expect("bracket regex"));

static BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.*?)\*\*").expect("bold regex"));

static UNDERSCORE_BOLD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"__(.+?)__").expect("underscore bold regex"));

static ITALIC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\*([^*\s](?:[^*\n]*?[^*\s])?)\*").expect("italic regex")
});

// `_` is a word character, so the boundaries leave snake_case alone
static UNDERSCORE_ITALIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b_([^_\n]+?)_\b").expect("underscore italic regex"));

static EXCESS_NEWLINES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n{3,}").expect("newline regex"));

/// Validate and normalize a user prompt
///
/// Strips angle brackets, collapses whitespace runs to single spaces, and
/// truncates to 1000 characters.
///
/// # Errors
///
/// Returns `BellaError::InvalidInput` if the prompt is empty or only
/// whitespace.
///
/// # Examples
///
/// ```
/// use bella::agent::sanitize::sanitize_input;
///
/// assert_eq!(sanitize_input("  <b>hi</b>\n\n there ").unwrap(), "bhi/b there");
/// assert!(sanitize_input("   ").is_err());
/// ```
pub fn sanitize_input(prompt: &str) -> Result<String> {
    let trimmed = prompt.trim();
    if trimmed.is_empty() {
        return Err(
            BellaError::InvalidInput("prompt must be a non-empty string".to_string()).into(),
        );
    }

    let stripped: String = trimmed.chars().filter(|c| *c != '<' && *c != '>').collect();
    let collapsed = WHITESPACE.replace_all(&stripped, " ");
    let sanitized: String = collapsed.trim().chars().take(MAX_PROMPT_CHARS).collect();

    if sanitized.is_empty() {
        return Err(
            BellaError::InvalidInput("prompt is empty after sanitization".to_string()).into(),
        );
    }
    Ok(sanitized)
}

/// Validate and clean a generated reply
///
/// Removes a leading speaker label and bracketed asides, unwraps markdown
/// emphasis (bold before single-marker italics), and squeezes blank-line
/// runs. A `*` or `_` that does not hug its text is left as is.
///
/// # Errors
///
/// Returns `BellaError::ResponseQuality` if fewer than two characters
/// remain after cleaning.
///
/// # Examples
///
/// ```
/// use bella::agent::sanitize::clean_response;
///
/// let cleaned = clean_response("Bella: **hi** there\n\n\n\nbye").unwrap();
/// assert_eq!(cleaned, "hi there\n\nbye");
/// ```
pub fn clean_response(response: &str) -> Result<String> {
    let trimmed = response.trim();
    if trimmed.is_empty() {
        return Err(BellaError::ResponseQuality(
            "response must be a non-empty string".to_string(),
        )
        .into());
    }

    let cleaned = RESPONSE_PREFIX.replace(trimmed, "");
    let cleaned = BRACKETED.replace_all(&cleaned, "");
    let cleaned = BOLD.replace_all(&cleaned, "$1");
    let cleaned = UNDERSCORE_BOLD.replace_all(&cleaned, "$1");
    let cleaned = ITALIC.replace_all(&cleaned, "$1");
    let cleaned = UNDERSCORE_ITALIC.replace_all(&cleaned, "$1");
    let cleaned = EXCESS_NEWLINES.replace_all(&cleaned, "\n\n");
    let cleaned = cleaned.trim();

    let length = cleaned.chars().count();
    if length < MIN_RESPONSE_CHARS {
        return Err(BellaError::ResponseQuality(
            "Response too short or empty after cleaning".to_string(),
        )
        .into());
    }

    if length > MAX_RESPONSE_CHARS {
        let mut truncated: String = cleaned.chars().take(MAX_RESPONSE_CHARS - 3).collect();
        truncated.push_str("...");
        return Ok(truncated);
    }

    Ok(cleaned.to_string())
}
