//! Conversation context management
//!
//! This module keeps the per-session message history for Bella, extracts
//! topic keywords and user preferences from what the user says, and builds
//! the context bundle (recent turns plus a synthesized system prompt) that
//! prompt construction consumes.

use crate::chat_mode::ChatMode;
use crate::config::ConversationConfig;
use crate::error::{BellaError, Result};

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;
use uuid::Uuid;

static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w{3,}\b").expect("word regex"));

const STOP_WORDS: &[&str] = &[
    "the", "and", "but", "for", "are", "with", "his", "they", "this", "have", "from", "not",
    "been", "more", "her", "were", "said", "each", "which", "their", "time", "will", "about",
    "would", "there", "could", "other",
];

const TOPICS: &[&str] = &[
    "technology",
    "science",
    "art",
    "music",
    "sports",
    "cooking",
    "travel",
];

/// Keywords retained before the set is rebuilt
const MAX_KEYWORDS: usize = 50;

/// Turns scanned when the keyword set is rebuilt
const KEYWORD_REBUILD_WINDOW: usize = 10;

/// Keywords quoted in summaries and system prompts
const PROMPT_KEYWORDS: usize = 5;

/// Who authored a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person chatting with Bella
    User,
    /// Bella
    Assistant,
}

impl Role {
    /// Lowercase role name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// Metadata attached to a turn
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnMetadata {
    /// Wall-clock time spent producing the turn
    #[serde(default)]
    pub processing_time_ms: Option<u64>,
    /// Provider label that produced the turn
    #[serde(default)]
    pub provider: Option<String>,
    /// Mode in effect; filled with the session mode when absent
    #[serde(default)]
    pub mode: Option<ChatMode>,
    /// Set on canned replies produced after a failure
    #[serde(default)]
    pub is_error: bool,
}

/// One recorded message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    /// Unique message identifier
    pub id: String,
    /// Author
    pub role: Role,
    /// Text content
    pub content: String,
    /// Creation time
    pub timestamp: DateTime<Utc>,
    /// Processing metadata
    pub metadata: TurnMetadata,
}

/// Session bookkeeping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionMetadata {
    /// When the session started
    pub start_time: DateTime<Utc>,
    /// Most recent activity, never moves backwards
    pub last_activity: DateTime<Utc>,
    /// Messages added since the session started or was cleared
    pub message_count: u64,
    /// Active conversational mode
    pub current_mode: ChatMode,
}

impl SessionMetadata {
    fn fresh(mode: ChatMode) -> Self {
        let now = Utc::now();
        Self {
            start_time: now,
            last_activity: now,
            message_count: 0,
            current_mode: mode,
        }
    }

    fn touch(&mut self) {
        self.last_activity = self.last_activity.max(Utc::now());
    }
}

/// Preferences discovered while chatting
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPreferences {
    /// Preferred language ("chinese" or "english")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Preferred style ("formal" or "casual")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    /// Topics the user mentioned
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub interests: BTreeSet<String>,
}

impl UserPreferences {
    /// Number of preference keys that carry a value
    pub fn len(&self) -> usize {
        usize::from(self.language.is_some())
            + usize::from(self.style.is_some())
            + usize::from(!self.interests.is_empty())
    }

    /// True when nothing has been detected
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn describe(&self) -> String {
        let mut parts = Vec::new();
        if let Some(language) = &self.language {
            parts.push(format!("language: {}", language));
        }
        if let Some(style) = &self.style {
            parts.push(format!("style: {}", style));
        }
        if !self.interests.is_empty() {
            let interests: Vec<&str> = self.interests.iter().map(String::as_str).collect();
            parts.push(format!("interests: {}", interests.join(", ")));
        }
        parts.join(", ")
    }
}

/// A turn as presented to prompt construction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    /// Author
    pub role: Role,
    /// Text content
    pub content: String,
    /// Creation time
    pub timestamp: DateTime<Utc>,
    /// Mode the turn was produced in
    pub mode: ChatMode,
}

/// Everything prompt construction needs from the session
#[derive(Debug, Clone, Serialize)]
pub struct ContextBundle {
    /// Session identifier
    pub session_id: String,
    /// Most recent turns, oldest first
    pub conversation_history: Vec<HistoryEntry>,
    /// Extracted keywords, oldest first
    pub context_keywords: Vec<String>,
    /// Detected preferences
    pub user_preferences: UserPreferences,
    /// Session bookkeeping snapshot
    pub session_metadata: SessionMetadata,
    /// Human-readable summary
    pub context_summary: String,
    /// Synthesized system prompt, when requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

/// Session statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    /// Session identifier
    pub session_id: String,
    /// Milliseconds since the session started
    pub duration_ms: u64,
    /// Messages added
    pub message_count: u64,
    /// Mean processing time over turns that report one
    pub average_response_time_ms: u64,
    /// Keyword count
    pub context_keywords: usize,
    /// Preference count
    pub user_preferences: usize,
    /// Whether the context is still fresh
    pub is_active: bool,
    /// Active mode
    pub current_mode: ChatMode,
}

/// Serialized session snapshot
///
/// Produced by `ConversationContext::export_conversation` and accepted by
/// `ConversationContext::import_conversation`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationExport {
    /// Session identifier; imports without one are rejected
    #[serde(default)]
    pub session_id: String,
    /// Session bookkeeping; the current metadata is kept when absent
    #[serde(default)]
    pub session_metadata: Option<SessionMetadata>,
    /// Recorded turns
    #[serde(default)]
    pub conversation_history: Vec<Turn>,
    /// Extracted keywords
    #[serde(default)]
    pub context_keywords: Vec<String>,
    /// Detected preferences
    #[serde(default)]
    pub user_preferences: UserPreferences,
    /// When the snapshot was taken
    #[serde(default = "Utc::now")]
    pub export_timestamp: DateTime<Utc>,
}

/// Per-session conversation state
///
/// History holds at most `2 x max_history_length` turns; the oldest turns are
/// evicted first.
///
/// # Examples
///
/// ```
/// use bella::agent::conversation::{ConversationContext, Role, TurnMetadata};
/// use bella::config::ConversationConfig;
///
/// let mut context = ConversationContext::new(&ConversationConfig::default());
/// context.add_message(Role::User, "I love music and travel", TurnMetadata::default());
/// assert_eq!(context.len(), 1);
/// assert!(context.keywords().contains(&"music".to_string()));
/// ```
#[derive(Debug, Clone)]
pub struct ConversationContext {
    max_history_length: usize,
    max_context_age: Duration,
    default_mode: ChatMode,
    session_id: String,
    history: Vec<Turn>,
    metadata: SessionMetadata,
    keywords: Vec<String>,
    preferences: UserPreferences,
}

fn new_session_id() -> String {
    format!("session_{}", Uuid::new_v4().simple())
}

fn new_message_id() -> String {
    format!("msg_{}", Uuid::new_v4().simple())
}

fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.contains(&word)
}

impl ConversationContext {
    /// Create a fresh session
    pub fn new(config: &ConversationConfig) -> Self {
        Self {
            max_history_length: config.max_history_length.max(1),
            max_context_age: Duration::from_secs(config.max_context_age_secs),
            default_mode: config.default_mode,
            session_id: new_session_id(),
            history: Vec::new(),
            metadata: SessionMetadata::fresh(config.default_mode),
            keywords: Vec::new(),
            preferences: UserPreferences::default(),
        }
    }

    /// Session identifier
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Number of stored turns
    pub fn len(&self) -> usize {
        self.history.len()
    }

    /// True when no turns are stored
    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Stored turns, oldest first
    pub fn turns(&self) -> &[Turn] {
        &self.history
    }

    /// Extracted keywords, oldest first
    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// Detected preferences
    pub fn preferences(&self) -> &UserPreferences {
        &self.preferences
    }

    /// Session bookkeeping
    pub fn metadata(&self) -> &SessionMetadata {
        &self.metadata
    }

    /// Append a turn and return its identifier
    ///
    /// User turns feed keyword and preference extraction. The history cap
    /// is enforced after every append.
    pub fn add_message(
        &mut self,
        role: Role,
        content: impl Into<String>,
        mut metadata: TurnMetadata,
    ) -> String {
        let content = content.into();
        metadata.mode.get_or_insert(self.metadata.current_mode);

        let turn = Turn {
            id: new_message_id(),
            role,
            content,
            timestamp: Utc::now(),
            metadata,
        };
        let id = turn.id.clone();

        if role == Role::User {
            self.extract_keywords(&turn.content);
            self.detect_preferences(&turn.content);
        }

        self.history.push(turn);
        self.metadata.touch();
        self.metadata.message_count += 1;
        self.trim_history();

        id
    }

    fn extract_keywords(&mut self, content: &str) {
        let lower = content.to_lowercase();
        for word in WORD.find_iter(&lower).map(|m| m.as_str()) {
            if !is_stop_word(word) && !self.keywords.iter().any(|k| k == word) {
                self.keywords.push(word.to_string());
            }
        }
    }

    fn detect_preferences(&mut self, content: &str) {
        let lower = content.to_lowercase();

        if lower.contains("中文") || lower.contains("chinese") {
            self.preferences.language = Some("chinese".to_string());
        } else if lower.contains("english") {
            self.preferences.language = Some("english".to_string());
        }

        if lower.contains("formal") || lower.contains("professional") {
            self.preferences.style = Some("formal".to_string());
        } else if lower.contains("casual") || lower.contains("friendly") {
            self.preferences.style = Some("casual".to_string());
        }

        for topic in TOPICS {
            if lower.contains(topic) {
                self.preferences.interests.insert((*topic).to_string());
            }
        }
    }

    fn trim_history(&mut self) {
        let cap = self.max_history_length * 2;
        if self.history.len() > cap {
            let excess = self.history.len() - cap;
            self.history.drain(..excess);
        }

        if self.keywords.len() > MAX_KEYWORDS {
            self.keywords.clear();
            let start = self.history.len().saturating_sub(KEYWORD_REBUILD_WINDOW);
            let recent: Vec<String> = self.history[start..]
                .iter()
                .filter(|t| t.role == Role::User)
                .map(|t| t.content.clone())
                .collect();
            for content in recent {
                self.extract_keywords(&content);
            }
            if self.keywords.len() > MAX_KEYWORDS {
                let excess = self.keywords.len() - MAX_KEYWORDS;
                self.keywords.drain(..excess);
            }
            tracing::debug!(keywords = self.keywords.len(), "Rebuilt context keywords");
        }
    }

    /// The last `exchanges` user/assistant pairs, oldest first
    pub fn get_recent_history(&self, exchanges: usize) -> Vec<HistoryEntry> {
        let start = self.history.len().saturating_sub(exchanges * 2);
        self.history[start..]
            .iter()
            .map(|t| HistoryEntry {
                role: t.role,
                content: t.content.clone(),
                timestamp: t.timestamp,
                mode: t.metadata.mode.unwrap_or(self.metadata.current_mode),
            })
            .collect()
    }

    fn recent_keywords(&self) -> &[String] {
        let start = self.keywords.len().saturating_sub(PROMPT_KEYWORDS);
        &self.keywords[start..]
    }

    /// Build the context bundle for prompt construction
    pub fn get_context_for_thinking(&self, include_system_prompt: bool) -> ContextBundle {
        ContextBundle {
            session_id: self.session_id.clone(),
            conversation_history: self.get_recent_history(self.max_history_length),
            context_keywords: self.keywords.clone(),
            user_preferences: self.preferences.clone(),
            session_metadata: self.metadata.clone(),
            context_summary: self.context_summary(),
            system_prompt: include_system_prompt.then(|| self.system_prompt()),
        }
    }

    /// Human-readable summary of the session
    pub fn context_summary(&self) -> String {
        if self.history.is_empty() {
            return "New conversation session started.".to_string();
        }

        let start = self.history.len().saturating_sub(6);
        let user_messages = self.history[start..]
            .iter()
            .filter(|t| t.role == Role::User)
            .count();

        let mut summary = format!(
            "Ongoing conversation with {} recent user messages.",
            user_messages
        );

        let topics = self.recent_keywords();
        if !topics.is_empty() {
            summary.push_str(&format!(
                " Discussion topics include: {}.",
                topics.join(", ")
            ));
        }

        if !self.preferences.is_empty() {
            summary.push_str(&format!(
                " User preferences: {}.",
                self.preferences.describe()
            ));
        }

        summary
    }

    /// Synthesized system prompt reflecting the session so far
    pub fn system_prompt(&self) -> String {
        let mut prompt = String::from(
            "You are Bella, a warm and intelligent AI assistant. This is an ongoing conversation.",
        );

        if !self.history.is_empty() {
            prompt.push_str(&format!(
                " You have been chatting with this user for {} messages.",
                self.metadata.message_count
            ));
        }

        if let Some(style) = &self.preferences.style {
            prompt.push_str(&format!(
                " The user prefers a {} communication style.",
                style
            ));
        }

        if let Some(language) = &self.preferences.language {
            prompt.push_str(&format!(
                " The user has shown preference for {} language.",
                language
            ));
        }

        let topics = self.recent_keywords();
        if !topics.is_empty() {
            prompt.push_str(&format!(
                " Recent conversation topics: {}.",
                topics.join(", ")
            ));
        }

        prompt.push_str(
            " Maintain conversation continuity and refer to previous exchanges when relevant.",
        );
        prompt
    }

    /// Whether the session saw activity within the maximum context age
    pub fn is_context_valid(&self) -> bool {
        self.is_context_valid_at(Utc::now())
    }

    /// `is_context_valid` evaluated at an explicit instant
    pub fn is_context_valid_at(&self, now: DateTime<Utc>) -> bool {
        let age = (now - self.metadata.last_activity)
            .to_std()
            .unwrap_or_default();
        age < self.max_context_age
    }

    /// Change the conversational mode
    ///
    /// Returns false, leaving the mode unchanged, for unknown names.
    pub fn set_mode(&mut self, mode: &str) -> bool {
        match ChatMode::parse_str(mode) {
            Ok(mode) => {
                self.metadata.current_mode = mode;
                self.metadata.touch();
                true
            }
            Err(e) => {
                tracing::debug!("Rejected mode change: {}", e);
                false
            }
        }
    }

    /// Active conversational mode
    pub fn mode(&self) -> ChatMode {
        self.metadata.current_mode
    }

    /// Drop turns, keywords and preferences but keep the session identity
    pub fn clear_history(&mut self) {
        self.history.clear();
        self.keywords.clear();
        self.preferences = UserPreferences::default();
        self.metadata.message_count = 0;
        self.metadata.touch();
        tracing::info!(session_id = %self.session_id, "Conversation history cleared");
    }

    /// Reset everything, including the session identifier
    pub fn start_new_session(&mut self) -> String {
        let previous = std::mem::replace(&mut self.session_id, new_session_id());
        self.history.clear();
        self.keywords.clear();
        self.preferences = UserPreferences::default();
        self.metadata = SessionMetadata::fresh(self.default_mode);
        tracing::info!(
            session_id = %self.session_id,
            previous = %previous,
            "New session started"
        );
        self.session_id.clone()
    }

    /// Session statistics
    pub fn get_session_stats(&self) -> SessionStats {
        let times: Vec<u64> = self
            .history
            .iter()
            .filter_map(|t| t.metadata.processing_time_ms)
            .filter(|ms| *ms > 0)
            .collect();
        let average = if times.is_empty() {
            0
        } else {
            (times.iter().sum::<u64>() as f64 / times.len() as f64).round() as u64
        };

        let duration = (Utc::now() - self.metadata.start_time)
            .to_std()
            .unwrap_or_default();

        SessionStats {
            session_id: self.session_id.clone(),
            duration_ms: u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
            message_count: self.metadata.message_count,
            average_response_time_ms: average,
            context_keywords: self.keywords.len(),
            user_preferences: self.preferences.len(),
            is_active: self.is_context_valid(),
            current_mode: self.metadata.current_mode,
        }
    }

    /// Snapshot the full session
    pub fn export_conversation(&self) -> ConversationExport {
        ConversationExport {
            session_id: self.session_id.clone(),
            session_metadata: Some(self.metadata.clone()),
            conversation_history: self.history.clone(),
            context_keywords: self.keywords.clone(),
            user_preferences: self.preferences.clone(),
            export_timestamp: Utc::now(),
        }
    }

    /// Replace the session with a snapshot
    ///
    /// # Errors
    ///
    /// Returns `BellaError::InvalidConversation` if the snapshot has no
    /// session identifier; the current session is left untouched.
    pub fn import_conversation(&mut self, data: ConversationExport) -> Result<()> {
        if data.session_id.trim().is_empty() {
            return Err(BellaError::InvalidConversation("missing session id".to_string()).into());
        }

        self.session_id = data.session_id;
        if let Some(metadata) = data.session_metadata {
            self.metadata = metadata;
        }
        self.history = data.conversation_history;
        self.keywords.clear();
        for keyword in data.context_keywords {
            if !self.keywords.contains(&keyword) {
                self.keywords.push(keyword);
            }
        }
        self.preferences = data.user_preferences;
        self.trim_history();

        tracing::info!(session_id = %self.session_id, "Conversation imported");
        Ok(())
    }
}

impl Default for ConversationContext {
    fn default() -> Self {
        Self::new(&ConversationConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context_with_history(max_history_length: usize) -> ConversationContext {
        ConversationContext::new(&ConversationConfig {
            max_history_length,
            ..ConversationConfig::default()
        })
    }

    #[test]
    fn test_add_message_returns_unique_ids() {
        let mut context = ConversationContext::default();
        let a = context.add_message(Role::User, "hello", TurnMetadata::default());
        let b = context.add_message(Role::Assistant, "hi", TurnMetadata::default());
        assert_ne!(a, b);
        assert_eq!(context.metadata().message_count, 2);
    }

    #[test]
    fn test_history_cap_evicts_oldest() {
        let mut context = context_with_history(2);
        for i in 0..7 {
            context.add_message(Role::User, format!("message {}", i), TurnMetadata::default());
        }
        assert_eq!(context.len(), 4);
        assert_eq!(context.turns()[0].content, "message 3");
        assert_eq!(context.turns()[3].content, "message 6");
        assert_eq!(context.metadata().message_count, 7);
    }

    #[test]
    fn test_import_applies_history_and_keyword_caps() {
        let mut large = context_with_history(50);
        for i in 0..60 {
            large.add_message(Role::User, format!("message {}", i), TurnMetadata::default());
        }
        let mut snapshot = large.export_conversation();
        snapshot.context_keywords = (0..80).map(|i| format!("topic{}", i)).collect();

        let mut context = ConversationContext::default();
        context.import_conversation(snapshot).unwrap();

        assert_eq!(context.len(), 20);
        assert_eq!(context.turns()[0].content, "message 40");
        assert_eq!(context.turns()[19].content, "message 59");
        assert!(context.keywords().len() <= MAX_KEYWORDS);
    }

    #[test]
    fn test_history_len_is_min_of_n_and_cap() {
        for n in [0usize, 5, 20, 21, 45] {
            let mut context = context_with_history(10);
            for i in 0..n {
                context.add_message(Role::Assistant, format!("t{}", i), TurnMetadata::default());
            }
            assert_eq!(context.len(), n.min(20));
        }
    }

    #[test]
    fn test_keywords_skip_stop_words_and_short_words() {
        let mut context = ConversationContext::default();
        context.add_message(
            Role::User,
            "The weather and my garden are lovely",
            TurnMetadata::default(),
        );
        let keywords = context.keywords();
        assert!(keywords.contains(&"weather".to_string()));
        assert!(keywords.contains(&"garden".to_string()));
        assert!(keywords.contains(&"lovely".to_string()));
        assert!(!keywords.contains(&"the".to_string()));
        assert!(!keywords.contains(&"and".to_string()));
        assert!(!keywords.contains(&"my".to_string()));
    }

    #[test]
    fn test_assistant_turns_do_not_add_keywords() {
        let mut context = ConversationContext::default();
        context.add_message(Role::Assistant, "Wonderful sunshine", TurnMetadata::default());
        assert!(context.keywords().is_empty());
    }

    #[test]
    fn test_keyword_set_is_capped() {
        let mut context = ConversationContext::default();
        for i in 0..30 {
            context.add_message(
                Role::User,
                format!("alpha{i} bravo{i} charlie{i}"),
                TurnMetadata::default(),
            );
        }
        assert!(context.keywords().len() <= MAX_KEYWORDS);
        assert!(context.keywords().contains(&"charlie29".to_string()));
    }

    #[test]
    fn test_preference_detection() {
        let mut context = ConversationContext::default();
        context.add_message(
            Role::User,
            "Please be formal, I like music and science. Reply in English.",
            TurnMetadata::default(),
        );
        let prefs = context.preferences();
        assert_eq!(prefs.style.as_deref(), Some("formal"));
        assert_eq!(prefs.language.as_deref(), Some("english"));
        assert!(prefs.interests.contains("music"));
        assert!(prefs.interests.contains("science"));
        assert_eq!(prefs.len(), 3);

        context.add_message(Role::User, "let's keep it casual, 中文", TurnMetadata::default());
        let prefs = context.preferences();
        assert_eq!(prefs.style.as_deref(), Some("casual"));
        assert_eq!(prefs.language.as_deref(), Some("chinese"));
        assert!(prefs.interests.contains("music"));
    }

    #[test]
    fn test_context_bundle_contents() {
        let mut context = ConversationContext::default();
        context.add_message(Role::User, "tell me about cooking pasta", TurnMetadata::default());
        context.add_message(
            Role::Assistant,
            "Boil water first!",
            TurnMetadata {
                processing_time_ms: Some(120),
                provider: Some("local".to_string()),
                ..TurnMetadata::default()
            },
        );

        let bundle = context.get_context_for_thinking(true);
        assert_eq!(bundle.session_id, context.session_id());
        assert_eq!(bundle.conversation_history.len(), 2);
        assert_eq!(bundle.conversation_history[1].mode, ChatMode::Casual);
        let prompt = bundle.system_prompt.unwrap();
        assert!(prompt.contains("2 messages"));
        assert!(prompt.contains("cooking"));
        assert!(bundle.context_summary.contains("1 recent user messages"));
        assert!(bundle.context_summary.contains("interests: cooking"));

        assert!(context.get_context_for_thinking(false).system_prompt.is_none());
    }

    #[test]
    fn test_system_prompt_uses_last_five_keywords() {
        let mut context = ConversationContext::default();
        context.add_message(
            Role::User,
            "apple banana cherry damson elder fig grape",
            TurnMetadata::default(),
        );
        let prompt = context.system_prompt();
        assert!(prompt.contains("cherry, damson, elder, fig, grape"));
        assert!(!prompt.contains("apple"));
    }

    #[test]
    fn test_empty_summary() {
        let context = ConversationContext::default();
        assert_eq!(context.context_summary(), "New conversation session started.");
    }

    #[test]
    fn test_context_validity_window() {
        let context = ConversationContext::default();
        assert!(context.is_context_valid());
        let later = Utc::now() + chrono::Duration::minutes(31);
        assert!(!context.is_context_valid_at(later));
    }

    #[test]
    fn test_set_mode() {
        let mut context = ConversationContext::default();
        assert!(!context.set_mode("invalid"));
        assert_eq!(context.mode(), ChatMode::Casual);
        assert!(context.set_mode("creative"));
        assert_eq!(context.mode(), ChatMode::Creative);
    }

    #[test]
    fn test_turn_mode_defaults_to_session_mode() {
        let mut context = ConversationContext::default();
        context.set_mode("assistant");
        context.add_message(Role::User, "hi", TurnMetadata::default());
        assert_eq!(context.turns()[0].metadata.mode, Some(ChatMode::Assistant));
    }

    #[test]
    fn test_clear_history_keeps_session() {
        let mut context = ConversationContext::default();
        let id = context.session_id().to_string();
        let start = context.metadata().start_time;
        context.add_message(Role::User, "I enjoy travel", TurnMetadata::default());
        context.clear_history();
        assert_eq!(context.session_id(), id);
        assert_eq!(context.metadata().start_time, start);
        assert!(context.is_empty());
        assert!(context.keywords().is_empty());
        assert!(context.preferences().is_empty());
        assert_eq!(context.metadata().message_count, 0);
    }

    #[test]
    fn test_start_new_session_resets_identity() {
        let mut context = ConversationContext::default();
        let old = context.session_id().to_string();
        context.set_mode("creative");
        context.add_message(Role::User, "hello there", TurnMetadata::default());
        let new = context.start_new_session();
        assert_ne!(old, new);
        assert_eq!(context.session_id(), new);
        assert!(context.is_empty());
        assert_eq!(context.mode(), ChatMode::Casual);
    }

    #[test]
    fn test_session_stats_average() {
        let mut context = ConversationContext::default();
        context.add_message(Role::User, "one", TurnMetadata::default());
        for ms in [100, 300] {
            context.add_message(
                Role::Assistant,
                "reply",
                TurnMetadata {
                    processing_time_ms: Some(ms),
                    ..TurnMetadata::default()
                },
            );
        }
        let stats = context.get_session_stats();
        assert_eq!(stats.average_response_time_ms, 200);
        assert_eq!(stats.message_count, 3);
        assert!(stats.is_active);
        assert_eq!(stats.current_mode, ChatMode::Casual);
    }

    #[test]
    fn test_export_import_round_trip() {
        let mut source = ConversationContext::default();
        source.set_mode("assistant");
        source.add_message(Role::User, "I like art and formal talk", TurnMetadata::default());
        source.add_message(Role::Assistant, "Certainly.", TurnMetadata::default());

        let json = serde_json::to_string(&source.export_conversation()).unwrap();
        let snapshot: ConversationExport = serde_json::from_str(&json).unwrap();

        let mut target = ConversationContext::default();
        target.import_conversation(snapshot).unwrap();

        assert_eq!(target.session_id(), source.session_id());
        assert_eq!(target.turns(), source.turns());
        assert_eq!(target.keywords(), source.keywords());
        assert_eq!(target.preferences(), source.preferences());
        assert_eq!(target.metadata(), source.metadata());
        assert_eq!(target.mode(), ChatMode::Assistant);
    }

    #[test]
    fn test_import_without_session_id_fails() {
        let mut context = ConversationContext::default();
        let id = context.session_id().to_string();
        let snapshot: ConversationExport =
            serde_json::from_str(r#"{"conversation_history": []}"#).unwrap();
        let err = context.import_conversation(snapshot).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BellaError>(),
            Some(BellaError::InvalidConversation(_))
        ));
        assert_eq!(context.session_id(), id);
    }
}
