//! ============================================================================
//! Memory Types - Data structures for short- and long-term user memory
//! ============================================================================
//! Defines user profiles, memory fragments, chat messages, and archived
//! conversation records.
//! ============================================================================

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::tone::{DetectedTone, TonePreference};

/// Placeholder display name until a name fact sets one.
pub const DEFAULT_NAME: &str = "Friend";

/// Sentinel location until a location fact sets one.
pub const DEFAULT_LOCATION: &str = "Unknown";

/// Sentinel summary meaning "no conversation history yet".
pub const NEW_USER_SUMMARY: &str = "New user. No previous conversations.";

/// A single (key, value, confidence) fact about a user.
///
/// Keys are not required to be unique within a profile; merge logic treats
/// the first fragment with a matching key as canonical.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryFragment {
    pub key: String,
    pub value: String,
    /// Monotonically non-decreasing; +0.1 per re-observation, uncapped.
    pub confidence: f64,
    /// Unix timestamp of the last time this fact was re-observed.
    pub last_accessed: i64,
}

/// Durable per-user profile: identity, preferences, fact fragments, and a
/// rolling conversation summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    pub name: String,
    /// Topic tags, set semantics (no duplicates), insertion order kept.
    pub preferences: Vec<String>,
    pub location: String,
    pub tone_preference: TonePreference,
    pub conversation_summary: String,
    pub personality_traits: Vec<String>,
    pub memory_fragments: Vec<MemoryFragment>,
    pub session_count: u32,
    pub last_session: i64,
    pub created_at: i64,
}

impl UserProfile {
    /// Create a fresh profile with placeholder defaults.
    pub fn new(user_id: impl Into<String>) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            user_id: user_id.into(),
            name: DEFAULT_NAME.to_string(),
            preferences: Vec::new(),
            location: DEFAULT_LOCATION.to_string(),
            tone_preference: TonePreference::default(),
            conversation_summary: NEW_USER_SUMMARY.to_string(),
            personality_traits: vec!["curious".to_string(), "helpful".to_string()],
            memory_fragments: Vec::new(),
            session_count: 0,
            last_session: now,
            created_at: now,
        }
    }

    /// Condensed view handed back to the response-composition layer.
    pub fn snapshot(&self) -> ProfileSnapshot {
        ProfileSnapshot {
            name: self.name.clone(),
            preferences: self.preferences.clone(),
            tone_preference: self.tone_preference,
        }
    }
}

/// The profile fields exposed on every turn output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileSnapshot {
    pub name: String,
    pub preferences: Vec<String>,
    pub tone_preference: TonePreference,
}

/// Message author within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

/// A single exchanged message held in short-term memory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
    pub tone: DetectedTone,
    pub timestamp: i64,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>, tone: DetectedTone) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
            tone,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }

    pub fn assistant(content: impl Into<String>, tone: DetectedTone) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
            tone,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

/// Closed set of fact keys the extractor can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactKey {
    Name,
    Location,
    Preference,
}

impl FactKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            FactKey::Name => "name",
            FactKey::Location => "location",
            FactKey::Preference => "preference",
        }
    }
}

impl std::fmt::Display for FactKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A candidate fact derived from an utterance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fact {
    pub key: FactKey,
    pub value: String,
}

impl Fact {
    pub fn new(key: FactKey, value: impl Into<String>) -> Self {
        Self {
            key,
            value: value.into(),
        }
    }
}

/// What happens to an existing fragment's value when the same key is
/// re-observed with a different value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactValuePolicy {
    /// The original value is kept forever (anti-drift default).
    FirstWins,
    /// The most recent observation replaces the stored value.
    LatestWins,
}

impl Default for FactValuePolicy {
    fn default() -> Self {
        FactValuePolicy::FirstWins
    }
}

impl std::str::FromStr for FactValuePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "first_wins" | "first-wins" => Ok(FactValuePolicy::FirstWins),
            "latest_wins" | "latest-wins" => Ok(FactValuePolicy::LatestWins),
            _ => Err(format!("Unknown fact value policy: {}", s)),
        }
    }
}

/// Immutable archival snapshot of a session's buffer, created when
/// summarization fires.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationRecord {
    pub id: Uuid,
    pub session_id: String,
    pub user_id: String,
    pub messages: Vec<ChatMessage>,
    pub start_time: i64,
    pub end_time: i64,
    pub summary: String,
    pub token_count: usize,
}

impl ConversationRecord {
    pub fn new(
        session_id: impl Into<String>,
        user_id: impl Into<String>,
        messages: Vec<ChatMessage>,
        summary: impl Into<String>,
    ) -> Self {
        let now = chrono::Utc::now().timestamp();
        let start_time = messages.first().map(|m| m.timestamp).unwrap_or(now);
        let token_count = messages.iter().map(|m| estimate_tokens(&m.content)).sum();
        Self {
            id: Uuid::new_v4(),
            session_id: session_id.into(),
            user_id: user_id.into(),
            messages,
            start_time,
            end_time: now,
            summary: summary.into(),
            token_count,
        }
    }
}

/// Rough token estimate (1 token ≈ 4 chars).
pub fn estimate_tokens(content: &str) -> usize {
    content.chars().count() / 4
}

/// Memory-derived output for one turn, consumed by the external
/// response-composition step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnMemory {
    pub session_id: String,
    /// Rendered natural-language context block for prompting.
    pub rendered_context: String,
    /// Last three messages of the session buffer, oldest first.
    pub short_term_tail: Vec<ChatMessage>,
    pub profile: ProfileSnapshot,
    pub detected_tone: DetectedTone,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_profile_defaults() {
        let profile = UserProfile::new("user-1");
        assert_eq!(profile.name, DEFAULT_NAME);
        assert_eq!(profile.location, DEFAULT_LOCATION);
        assert_eq!(profile.conversation_summary, NEW_USER_SUMMARY);
        assert_eq!(profile.tone_preference, TonePreference::Friendly);
        assert!(profile.preferences.is_empty());
        assert!(profile.memory_fragments.is_empty());
        assert_eq!(profile.session_count, 0);
    }

    #[test]
    fn test_chat_message_constructors() {
        let msg = ChatMessage::user("hello", DetectedTone::Casual);
        assert_eq!(msg.role, MessageRole::User);
        assert_eq!(msg.role.as_str(), "user");
        assert_eq!(msg.tone, DetectedTone::Casual);

        let reply = ChatMessage::assistant("hi there", DetectedTone::Neutral);
        assert_eq!(reply.role, MessageRole::Assistant);
    }

    #[test]
    fn test_conversation_record_token_count() {
        let messages = vec![
            ChatMessage::user("12345678", DetectedTone::Neutral),
            ChatMessage::assistant("1234", DetectedTone::Neutral),
        ];
        let record = ConversationRecord::new("s1", "u1", messages, "summary");
        assert_eq!(record.token_count, 3);
        assert_eq!(record.session_id, "s1");
        assert!(record.end_time >= record.start_time);
    }

    #[test]
    fn test_fact_value_policy_parsing() {
        assert_eq!(
            "latest_wins".parse::<FactValuePolicy>().unwrap(),
            FactValuePolicy::LatestWins
        );
        assert_eq!(FactValuePolicy::default(), FactValuePolicy::FirstWins);
        assert!("newest".parse::<FactValuePolicy>().is_err());
    }
}
