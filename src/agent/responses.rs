//! Error classification and pre-written replies
//!
//! Every failure that reaches the top of a thinking request is mapped onto an
//! `ErrorCategory`, and each category has a fixed set of natural-language
//! replies. Selection is a pure function of the category and a seed so the
//! caller decides where randomness comes from.
//!
//! The emergency backup responder lives here too: it answers from canned
//! text matched against the shape of the prompt and never calls a model.

use crate::error::BellaError;
use serde::Serialize;
use std::fmt;

/// User-facing failure categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// A time budget was exceeded
    Timeout,
    /// The prompt was rejected
    InvalidInput,
    /// Every provider failed
    SystemFailure,
    /// The reply was empty or unusable
    EmptyResponse,
    /// Connectivity problems
    Network,
    /// Credentials were rejected
    Authentication,
    /// The provider throttled the request
    RateLimit,
    /// The model itself failed
    Model,
    /// A provider is not configured
    Configuration,
    /// Anything else
    Generic,
}

impl ErrorCategory {
    /// Classify an error, preferring the typed variant over message patterns
    ///
    /// # Examples
    ///
    /// ```
    /// use bella::agent::responses::ErrorCategory;
    /// use bella::error::BellaError;
    ///
    /// let err: anyhow::Error = BellaError::provider("openai", "rate limit exceeded (429)").into();
    /// assert_eq!(ErrorCategory::classify(&err), ErrorCategory::RateLimit);
    ///
    /// let err = anyhow::anyhow!("connection reset by peer");
    /// assert_eq!(ErrorCategory::classify(&err), ErrorCategory::Network);
    /// ```
    pub fn classify(error: &anyhow::Error) -> Self {
        match error.downcast_ref::<BellaError>() {
            Some(BellaError::InvalidInput(_)) => Self::InvalidInput,
            Some(BellaError::Timeout { .. }) => Self::Timeout,
            Some(BellaError::SystemFailure { .. }) => Self::SystemFailure,
            Some(BellaError::ResponseQuality(_)) => Self::EmptyResponse,
            Some(BellaError::NotConfigured(_)) | Some(BellaError::Config(_)) => {
                Self::Configuration
            }
            Some(BellaError::Provider { message, .. }) => Self::from_message(message),
            _ => Self::from_message(&error.to_string()),
        }
    }

    /// Classify free-form error text by substring
    pub fn from_message(message: &str) -> Self {
        let lower = message.to_lowercase();
        let has = |needles: &[&str]| needles.iter().any(|n| lower.contains(n));

        if has(&["timeout", "timed out"]) {
            Self::Timeout
        } else if has(&["invalid prompt", "malformed input"]) {
            Self::InvalidInput
        } else if has(&["all providers failed", "both providers failed"]) {
            Self::SystemFailure
        } else if has(&["response too short", "empty response", "invalid response"]) {
            Self::EmptyResponse
        } else if has(&["authentication", "unauthorized", "forbidden", "api key", "401", "403"]) {
            Self::Authentication
        } else if has(&["rate limit", "too many requests", "429", "quota"]) {
            Self::RateLimit
        } else if has(&["network", "connection", "dns", "unreachable"]) {
            Self::Network
        } else if has(&["model"]) {
            Self::Model
        } else if has(&["not configured", "configuration"]) {
            Self::Configuration
        } else {
            Self::Generic
        }
    }

    /// Snake-case category name, used as the metric error type
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::InvalidInput => "invalid_input",
            Self::SystemFailure => "system_failure",
            Self::EmptyResponse => "empty_response",
            Self::Network => "network",
            Self::Authentication => "authentication",
            Self::RateLimit => "rate_limit",
            Self::Model => "model",
            Self::Configuration => "configuration",
            Self::Generic => "generic",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const TIMEOUT_RESPONSES: &[&str] = &[
    "I'm taking a bit longer to process that than usual. Let me try a simpler approach...",
    "My thoughts are moving slowly right now. Could you try rephrasing your question?",
    "I need more time to think about that properly. Can we try something else for now?",
    "Processing is taking longer than expected. Let me give you a quick response instead.",
];

const INVALID_INPUT_RESPONSES: &[&str] = &[
    "I didn't quite understand that. Could you try asking in a different way?",
    "That doesn't seem like something I can help with. What else would you like to know?",
    "I'm having trouble processing that input. Could you rephrase your question?",
    "Let's try that again with a clearer question. What would you like to talk about?",
];

const SYSTEM_FAILURE_RESPONSES: &[&str] = &[
    "I'm experiencing some technical difficulties right now. Please bear with me while I sort things out.",
    "Both my thinking systems are having issues. I'll try to get back to normal soon.",
    "I'm having trouble accessing my knowledge right now. Let me try to help in a simpler way.",
    "My AI systems are temporarily unavailable. I apologize for the inconvenience.",
];

const NETWORK_RESPONSES: &[&str] = &[
    "I can't seem to reach my thinking services right now. Could we try again in a moment?",
    "My connection is a little shaky at the moment. Please give me another try shortly.",
    "I'm having trouble connecting right now. Let's try that again in a bit.",
];

const AUTHENTICATION_RESPONSES: &[&str] = &[
    "I couldn't sign in to my cloud service. Could you check the API key in settings?",
    "My cloud access was refused. Please double-check the configured API key.",
    "It looks like my credentials aren't working. Updating the API key should fix it.",
];

const RATE_LIMIT_RESPONSES: &[&str] = &[
    "I've been chatting a lot and need a short breather. Let's try again in a minute.",
    "My cloud service asked me to slow down. Please try again shortly.",
    "Too many thoughts at once! Give me a moment and ask me again.",
];

const MODEL_RESPONSES: &[&str] = &[
    "My language model stumbled on that one. Could you try asking another way?",
    "Something went wrong inside my model. Let's try that again.",
    "My model isn't cooperating right now. Could you rephrase that for me?",
];

const CONFIGURATION_RESPONSES: &[&str] = &[
    "I'm not fully set up yet. Please check my provider settings.",
    "None of my thinking services are configured right now. Adding an API key would help.",
    "My settings need a little attention before I can answer properly.",
];

const GENERIC_RESPONSES: &[&str] = &[
    "I'm sorry, I'm having trouble processing that right now. Let me try to reorganize my thoughts...",
    "Hmm... I need to think about this a bit more. Please wait a moment.",
    "I seem to be having a bit of trouble with that. Give me a second to sort things out.",
    "Let me rephrase my thoughts. Just a moment please.",
    "I didn't quite catch that. Could you try asking in a different way?",
];

const GREETING_RESPONSES: &[&str] = &[
    "Hello! I'm here and ready to chat. What would you like to talk about?",
    "Hi there! It's lovely to hear from you. How are you today?",
    "Hey! I'm so glad you stopped by. What's on your mind?",
];

const QUESTION_RESPONSES: &[&str] = &[
    "That's an interesting question. Let me think about it and get back to you with a better answer.",
    "Good question! I can't look into it properly right now, but I'd love to revisit it soon.",
    "I'm curious about that too. Could you ask me again in a little while?",
];

const HELP_RESPONSES: &[&str] = &[
    "I'd be happy to help! Could you be more specific about what you need assistance with?",
    "Of course I'll help. Tell me a little more about what you need.",
    "I'm here for you. What exactly can I help you with?",
];

const EMOTIONAL_RESPONSES: &[&str] = &[
    "Thank you for sharing how you feel. I'm here and I'm listening.",
    "That sounds like a lot to carry. Do you want to tell me more about it?",
    "Your feelings matter to me. Take your time, I'm right here with you.",
];

const DEFAULT_BACKUP_RESPONSES: &[&str] = &[
    "I'm listening. Tell me more about that.",
    "That's interesting! What made you think of it?",
    "I'd love to hear more. Please go on.",
];

const GREETING_WORDS: &[&str] = &["hello", "hi", "hey", "greetings", "hiya", "howdy"];
const GREETING_PHRASES: &[&str] = &["good morning", "good afternoon", "good evening", "你好", "안녕"];
const HELP_WORDS: &[&str] = &["help", "assist", "assistance", "support", "帮助", "도와"];
const EMOTIONAL_WORDS: &[&str] = &[
    "sad", "happy", "lonely", "tired", "angry", "upset", "anxious", "worried", "stressed",
    "depressed", "scared", "afraid", "excited", "love", "miss", "feel", "feeling", "hurt",
];
const QUESTION_WORDS: &[&str] = &[
    "what", "why", "how", "when", "where", "who", "which", "can", "could", "would", "should",
    "do", "does", "is", "are",
];

fn pick(variants: &'static [&'static str], seed: usize) -> &'static str {
    variants[seed % variants.len()]
}

fn words(prompt: &str) -> Vec<String> {
    prompt
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

fn mentions(words: &[String], lower: &str, vocabulary: &[&str]) -> bool {
    vocabulary
        .iter()
        .any(|v| words.iter().any(|w| w == v) || (!v.is_ascii() && lower.contains(v)))
}

/// Shape of a prompt, as seen by the emergency backup responder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptShape {
    /// Hello and friends
    Greeting,
    /// Asking for help
    HelpRequest,
    /// Sharing feelings
    Emotional,
    /// Any other question
    Question,
    /// Everything else
    Other,
}

impl PromptShape {
    /// Detect the shape of `prompt`
    ///
    /// Checks run in order: greeting, help request, emotional content,
    /// question.
    pub fn detect(prompt: &str) -> Self {
        let lower = prompt.to_lowercase();
        let tokens = words(prompt);

        if mentions(&tokens, &lower, GREETING_WORDS)
            || GREETING_PHRASES.iter().any(|p| lower.contains(p))
        {
            Self::Greeting
        } else if mentions(&tokens, &lower, HELP_WORDS) {
            Self::HelpRequest
        } else if mentions(&tokens, &lower, EMOTIONAL_WORDS) {
            Self::Emotional
        } else if lower.contains('?')
            || lower.contains('？')
            || tokens
                .first()
                .map(|w| QUESTION_WORDS.contains(&w.as_str()))
                .unwrap_or(false)
        {
            Self::Question
        } else {
            Self::Other
        }
    }
}

/// Canned reply for a failure category
///
/// `EmptyResponse` looks at the prompt to pick a contextual reply and falls
/// back to the generic set.
///
/// # Examples
///
/// ```
/// use bella::agent::responses::{canned_response, ErrorCategory};
///
/// let first = canned_response(ErrorCategory::Timeout, "anything", 0);
/// assert!(first.starts_with("I'm taking a bit longer"));
/// assert_eq!(first, canned_response(ErrorCategory::Timeout, "other", 4));
/// ```
pub fn canned_response(category: ErrorCategory, prompt: &str, seed: usize) -> &'static str {
    match category {
        ErrorCategory::Timeout => pick(TIMEOUT_RESPONSES, seed),
        ErrorCategory::InvalidInput => pick(INVALID_INPUT_RESPONSES, seed),
        ErrorCategory::SystemFailure => pick(SYSTEM_FAILURE_RESPONSES, seed),
        ErrorCategory::Network => pick(NETWORK_RESPONSES, seed),
        ErrorCategory::Authentication => pick(AUTHENTICATION_RESPONSES, seed),
        ErrorCategory::RateLimit => pick(RATE_LIMIT_RESPONSES, seed),
        ErrorCategory::Model => pick(MODEL_RESPONSES, seed),
        ErrorCategory::Configuration => pick(CONFIGURATION_RESPONSES, seed),
        ErrorCategory::Generic => pick(GENERIC_RESPONSES, seed),
        ErrorCategory::EmptyResponse => match PromptShape::detect(prompt) {
            PromptShape::Greeting => GREETING_RESPONSES[0],
            PromptShape::Question => QUESTION_RESPONSES[0],
            PromptShape::HelpRequest => HELP_RESPONSES[0],
            _ => pick(GENERIC_RESPONSES, seed),
        },
    }
}

/// Reply from the emergency backup responder
///
/// Always succeeds and never queries a model.
///
/// # Examples
///
/// ```
/// use bella::agent::responses::emergency_response;
///
/// assert!(emergency_response("hello bella", 0).starts_with("Hello!"));
/// assert!(emergency_response("can you help me", 0).contains("help"));
/// ```
pub fn emergency_response(prompt: &str, seed: usize) -> &'static str {
    match PromptShape::detect(prompt) {
        PromptShape::Greeting => pick(GREETING_RESPONSES, seed),
        PromptShape::HelpRequest => pick(HELP_RESPONSES, seed),
        PromptShape::Emotional => pick(EMOTIONAL_RESPONSES, seed),
        PromptShape::Question => pick(QUESTION_RESPONSES, seed),
        PromptShape::Other => pick(DEFAULT_BACKUP_RESPONSES, seed),
    }
}
