//! Local model client for Bella
//!
//! Wraps a `TextGenerator`, tracks whether the model finished loading, and
//! turns raw generations into clean reply text.

use crate::error::{BellaError, Result};
use crate::providers::{GenerationParams, TextGenerator};

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

static ROLE_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^\s*(Bella's response:|Bella's professional response:|Bella's creative response:|Bella:|Assistant:|AI:|Response:)",
    )
    .expect("role prefix regex")
});

static SPECIAL_TOKENS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(<\|[^|>]*\|>|</?s>|\[/?INST\]|<</?SYS>>|<pad>|</?unk>)")
        .expect("special token regex")
});

static LEADING_BULLETS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*(?:[-*\u{2022}]|\d+[.)])[ \t]+").expect("bullet regex"));

/// Shortest reply accepted from the local model
const MIN_LOCAL_RESPONSE_CHARS: usize = 3;

/// Trailing fragments shorter than this are dropped
const MIN_TRAILING_FRAGMENT_CHARS: usize = 10;

/// Client for the locally hosted model
///
/// The model is unavailable until `load` succeeds; unloaded models are left
/// out of the fallback chain.
#[derive(Clone)]
pub struct LocalModelClient {
    generator: Arc<dyn TextGenerator>,
    loaded: Arc<AtomicBool>,
    params: GenerationParams,
}

impl LocalModelClient {
    /// Create an unloaded client around `generator`
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator,
            loaded: Arc::new(AtomicBool::new(false)),
            params: GenerationParams::default(),
        }
    }

    /// Create a client that is already marked as loaded
    pub fn preloaded(generator: Arc<dyn TextGenerator>) -> Self {
        let client = Self::new(generator);
        client.loaded.store(true, Ordering::SeqCst);
        client
    }

    /// Load the model; failure is logged and leaves the client unloaded
    pub async fn load(&self) -> bool {
        match self.generator.load().await {
            Ok(()) => {
                self.loaded.store(true, Ordering::SeqCst);
                tracing::info!(model = %self.generator.model_name(), "Local model loaded");
                true
            }
            Err(e) => {
                self.loaded.store(false, Ordering::SeqCst);
                tracing::warn!("Local model failed to load: {}", e);
                false
            }
        }
    }

    /// Whether the model is ready for generation
    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::SeqCst)
    }

    /// Model identifier
    pub fn model_name(&self) -> String {
        self.generator.model_name()
    }

    /// Raw generation with explicit parameters
    ///
    /// # Errors
    ///
    /// Returns `BellaError::NotConfigured` when the model is not loaded and
    /// passes through generator failures.
    pub async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String> {
        if !self.is_loaded() {
            return Err(BellaError::NotConfigured("local model not loaded".to_string()).into());
        }
        self.generator.generate(prompt, params).await
    }

    /// Generate with the fixed local parameters and post-process the output
    ///
    /// # Errors
    ///
    /// Returns `BellaError::ResponseQuality` when the cleaned output is too
    /// short or repetitive.
    pub async fn complete(&self, prompt: &str) -> Result<String> {
        let raw = self.generate(prompt, &self.params).await?;
        postprocess(&raw, prompt)
    }
}

/// Clean a raw local generation
///
/// # Examples
///
/// ```
/// use bella::providers::local::postprocess;
///
/// let out = postprocess("User: hi\nBella: Bella: Hello there, friend. ok", "User: hi\nBella:").unwrap();
/// assert_eq!(out, "Hello there, friend.");
/// ```
pub fn postprocess(raw: &str, prompt: &str) -> Result<String> {
    let mut response = match raw.find(prompt) {
        Some(idx) if !prompt.is_empty() => raw[idx + prompt.len()..].trim().to_string(),
        _ => raw.trim().to_string(),
    };

    response = SPECIAL_TOKENS.replace_all(&response, "").into_owned();
    response = ROLE_PREFIX.replace(&response, "").trim().to_string();
    response = LEADING_BULLETS.replace_all(&response, "").into_owned();
    response = drop_trailing_fragment(response.trim());

    let response = response.trim().to_string();
    if response.chars().count() < MIN_LOCAL_RESPONSE_CHARS {
        return Err(BellaError::ResponseQuality(
            "Generated response too short after processing".to_string(),
        )
        .into());
    }
    if is_repetitive(&response) {
        return Err(
            BellaError::ResponseQuality("Generated response is repetitive".to_string()).into(),
        );
    }

    Ok(response)
}

fn drop_trailing_fragment(text: &str) -> String {
    let Some(last_end) = text.rfind(['.', '!', '?']) else {
        return text.to_string();
    };
    let cut = last_end + 1;
    let tail = text[cut..].trim();
    if !tail.is_empty() && tail.chars().count() < MIN_TRAILING_FRAGMENT_CHARS {
        text[..cut].to_string()
    } else {
        text.to_string()
    }
}

/// True when any three-word shingle appears more than twice
pub fn is_repetitive(text: &str) -> bool {
    let words: Vec<String> = text
        .split_whitespace()
        .map(|w| {
            w.trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .filter(|w| !w.is_empty())
        .collect();

    let mut counts: HashMap<&[String], usize> = HashMap::new();
    for shingle in words.windows(3) {
        let count = counts.entry(shingle).or_insert(0);
        *count += 1;
        if *count > 2 {
            return true;
        }
    }
    false
}
