//! ============================================================================
//! Short-Term Memory - Bounded per-session message buffers
//! ============================================================================
//! Process-local sliding window of recent messages, keyed by session id.
//! Oldest messages are evicted once a buffer exceeds the configured cap.
//! Not durable: contents are lost on process restart, and buffers are not
//! shared between processes. Buffers have no expiry beyond the cap and the
//! process lifetime, so a deployment with many distinct sessions should
//! recycle session ids or call `clear`.
//! ============================================================================

use std::collections::{HashMap, VecDeque};
use tokio::sync::RwLock;
use tracing::debug;

use super::types::ChatMessage;

/// Default maximum number of messages kept per session.
pub const DEFAULT_MAX_MESSAGES: usize = 10;

#[derive(Debug, Default)]
struct SessionBuffer {
    /// Messages in insertion order, oldest first.
    messages: VecDeque<ChatMessage>,
    /// Monotone count of every message ever appended to this session.
    /// Keeps batch-multiple checks meaningful once the buffer is pinned
    /// at the cap.
    total_appended: u64,
}

/// Bounded per-session message buffers behind a single handle.
///
/// Constructed once and owned by the pipeline; request-handling code reaches
/// it by reference rather than through a process-wide global.
pub struct ShortTermMemory {
    sessions: RwLock<HashMap<String, SessionBuffer>>,
    cap: usize,
}

impl ShortTermMemory {
    pub fn new(cap: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            cap,
        }
    }

    /// Append a message to a session's buffer, creating the buffer if absent.
    /// Evicts oldest-first once the buffer exceeds the cap. Always succeeds;
    /// returns the session's running total of appended messages.
    pub async fn append(&self, session_id: &str, message: ChatMessage) -> u64 {
        let mut sessions = self.sessions.write().await;
        let buffer = sessions.entry(session_id.to_string()).or_default();

        buffer.messages.push_back(message);
        buffer.total_appended += 1;

        while buffer.messages.len() > self.cap {
            buffer.messages.pop_front();
        }

        debug!(
            "Session {} buffer at {}/{} messages ({} total)",
            session_id,
            buffer.messages.len(),
            self.cap,
            buffer.total_appended
        );

        buffer.total_appended
    }

    /// Snapshot of a session's buffer, oldest first. Unknown sessions yield
    /// an empty vector.
    pub async fn get(&self, session_id: &str) -> Vec<ChatMessage> {
        let sessions = self.sessions.read().await;
        sessions
            .get(session_id)
            .map(|b| b.messages.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Last `n` messages of a session's buffer, oldest first.
    pub async fn tail(&self, session_id: &str, n: usize) -> Vec<ChatMessage> {
        let sessions = self.sessions.read().await;
        sessions
            .get(session_id)
            .map(|b| {
                let skip = b.messages.len().saturating_sub(n);
                b.messages.iter().skip(skip).cloned().collect()
            })
            .unwrap_or_default()
    }

    /// Remove a session's buffer entirely. Idempotent.
    pub async fn clear(&self, session_id: &str) {
        let mut sessions = self.sessions.write().await;
        if sessions.remove(session_id).is_some() {
            debug!("Cleared short-term memory for session {}", session_id);
        }
    }

    /// Number of sessions currently held.
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Configured per-session cap.
    pub fn cap(&self) -> usize {
        self.cap
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tone::DetectedTone;

    fn msg(content: &str) -> ChatMessage {
        ChatMessage::user(content, DetectedTone::Neutral)
    }

    #[tokio::test]
    async fn test_append_and_get() {
        let memory = ShortTermMemory::new(10);
        memory.append("s1", msg("one")).await;
        memory.append("s1", msg("two")).await;

        let messages = memory.get("s1").await;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, "one");
        assert_eq!(messages[1].content, "two");
    }

    #[tokio::test]
    async fn test_unknown_session_is_empty() {
        let memory = ShortTermMemory::new(10);
        assert!(memory.get("nope").await.is_empty());
        assert!(memory.tail("nope", 3).await.is_empty());
    }

    #[tokio::test]
    async fn test_fifo_eviction_at_cap() {
        let memory = ShortTermMemory::new(3);
        for i in 0..5 {
            memory.append("s1", msg(&format!("m{}", i))).await;
        }

        let messages = memory.get("s1").await;
        assert_eq!(messages.len(), 3);
        // Oldest two evicted first
        assert_eq!(messages[0].content, "m2");
        assert_eq!(messages[2].content, "m4");
    }

    #[tokio::test]
    async fn test_never_exceeds_cap() {
        let memory = ShortTermMemory::new(10);
        for i in 0..50 {
            memory.append("s1", msg(&format!("m{}", i))).await;
        }
        assert_eq!(memory.get("s1").await.len(), 10);
    }

    #[tokio::test]
    async fn test_total_appended_is_monotone_past_cap() {
        let memory = ShortTermMemory::new(3);
        let mut last = 0;
        for i in 0..7 {
            let total = memory.append("s1", msg(&format!("m{}", i))).await;
            assert_eq!(total, last + 1);
            last = total;
        }
        assert_eq!(last, 7);
    }

    #[tokio::test]
    async fn test_tail() {
        let memory = ShortTermMemory::new(10);
        for i in 0..5 {
            memory.append("s1", msg(&format!("m{}", i))).await;
        }

        let tail = memory.tail("s1", 3).await;
        assert_eq!(tail.len(), 3);
        assert_eq!(tail[0].content, "m2");
        assert_eq!(tail[2].content, "m4");

        // Shorter buffers return everything
        assert_eq!(memory.tail("s1", 100).await.len(), 5);
    }

    #[tokio::test]
    async fn test_clear_is_idempotent() {
        let memory = ShortTermMemory::new(10);
        memory.append("s1", msg("one")).await;
        memory.clear("s1").await;
        assert!(memory.get("s1").await.is_empty());
        memory.clear("s1").await;
        assert_eq!(memory.session_count().await, 0);
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let memory = ShortTermMemory::new(10);
        memory.append("s1", msg("one")).await;
        memory.append("s2", msg("two")).await;

        assert_eq!(memory.get("s1").await.len(), 1);
        assert_eq!(memory.get("s2").await.len(), 1);
        assert_eq!(memory.session_count().await, 2);
    }
}
