//! ============================================================================
//! Memory Pipeline - Per-turn orchestration
//! ============================================================================
//! Sequences the memory layer for each incoming message: profile lookup or
//! creation, short-term buffer update, fact extraction and merge, context
//! assembly, and the summarization trigger. Summarization runs detached:
//! its outcome never gates the turn, and whether the very next turn sees the
//! updated summary is unspecified.
//!
//! Only the synchronous profile lookup may abort a turn; every later store
//! failure degrades to defaults so the conversational response can proceed.
//! ============================================================================

use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::context::NO_MEMORIES_SENTINEL;
use super::extract;
use super::profiles::ProfileStore;
use super::short_term::ShortTermMemory;
use super::summarize::{create_summary_strategy, ConversationSummarizer, SummaryStrategy};
use super::types::{ChatMessage, TurnMemory};
use crate::config::MemoryConfig;
use crate::db::NovaDb;
use crate::error::MemoryError;
use crate::tone::{detect_tone, DetectedTone};

/// Orchestrates short-term and long-term memory for each turn.
pub struct MemoryPipeline {
    config: MemoryConfig,
    profiles: ProfileStore,
    short_term: Arc<ShortTermMemory>,
    summarizer: Arc<ConversationSummarizer>,
}

impl MemoryPipeline {
    /// Open the database per config and wire up the pipeline. The LLM
    /// summarization strategy is enabled when an API key is configured.
    pub fn new(config: MemoryConfig) -> Result<Self, MemoryError> {
        let db = Arc::new(NovaDb::open(config.db_path.as_deref())?);
        let strategy =
            create_summary_strategy(config.llm_api_key.clone(), config.llm_base_url.clone());
        Ok(Self::with_db(config, db, strategy))
    }

    /// Wire up the pipeline against an existing database handle.
    pub fn with_db(
        config: MemoryConfig,
        db: Arc<NovaDb>,
        strategy: Option<Arc<dyn SummaryStrategy>>,
    ) -> Self {
        let profiles = ProfileStore::new(db.clone(), config.fact_value_policy);
        let short_term = Arc::new(ShortTermMemory::new(config.max_short_term));
        let summarizer = Arc::new(ConversationSummarizer::new(
            profiles.clone(),
            db,
            strategy,
        ));

        Self {
            config,
            profiles,
            short_term,
            summarizer,
        }
    }

    /// Process one inbound user message.
    ///
    /// Returns the memory-derived inputs for response composition: the
    /// rendered context block, the last three buffered messages, and a
    /// profile snapshot. A missing `session_id` starts a new session.
    pub async fn process_message(
        &self,
        user_id: &str,
        session_id: Option<String>,
        message: &str,
    ) -> Result<TurnMemory, MemoryError> {
        let session_id =
            session_id.unwrap_or_else(|| format!("session_{}", Uuid::new_v4()));

        // The one lookup a turn cannot proceed without: tone preference and
        // history come from the profile.
        let profile = self.profiles.get_or_create(user_id)?;

        let tone = detect_tone(message);
        let total = self
            .short_term
            .append(&session_id, ChatMessage::user(message, tone))
            .await;

        let facts = extract::extract(message);
        if !facts.is_empty() {
            debug!("Extracted {} facts from user {}", facts.len(), user_id);
            if let Err(e) = self.profiles.merge_facts(user_id, &facts) {
                warn!("Fact merge failed for user {}: {}", user_id, e);
            }
        }

        // Render from the post-merge profile; on store failure fall back to
        // the sentinel rather than aborting the turn.
        let (rendered_context, snapshot) = match self.profiles.get(user_id) {
            Ok(Some(merged)) => (merged.render_context(), merged.snapshot()),
            Ok(None) => (NO_MEMORIES_SENTINEL.to_string(), profile.snapshot()),
            Err(e) => {
                warn!("Context assembly degraded for user {}: {}", user_id, e);
                (NO_MEMORIES_SENTINEL.to_string(), profile.snapshot())
            }
        };

        self.maybe_summarize(total, &session_id, user_id).await;

        let short_term_tail = self.short_term.tail(&session_id, 3).await;

        Ok(TurnMemory {
            session_id,
            rendered_context,
            short_term_tail,
            profile: snapshot,
            detected_tone: tone,
        })
    }

    /// Append the assistant's reply to the session buffer. Infallible; the
    /// reply has already been delivered by the time this runs.
    pub async fn record_reply(
        &self,
        session_id: &str,
        user_id: &str,
        content: &str,
        tone: DetectedTone,
    ) -> u64 {
        let total = self
            .short_term
            .append(session_id, ChatMessage::assistant(content, tone))
            .await;
        self.maybe_summarize(total, session_id, user_id).await;
        total
    }

    /// Render-only lookup for the memory-inspection endpoint.
    pub fn memory_context(&self, user_id: &str) -> Result<String, MemoryError> {
        match self.profiles.get(user_id)? {
            Some(profile) => Ok(profile.render_context()),
            None => Ok("New user. No memories yet.".to_string()),
        }
    }

    /// Drop a session's short-term buffer. Idempotent.
    pub async fn clear_session(&self, session_id: &str) {
        self.short_term.clear(session_id).await;
    }

    /// Short-term memory handle (read access for callers that need more
    /// than the last-3 tail).
    pub fn short_term(&self) -> &ShortTermMemory {
        &self.short_term
    }

    // Fire-and-forget: snapshot the buffer at the crossing and detach. The
    // task's completion order relative to later turns is unspecified.
    async fn maybe_summarize(&self, total_appended: u64, session_id: &str, user_id: &str) {
        if !summarization_due(total_appended, self.config.summary_batch) {
            return;
        }

        let messages = self.short_term.get(session_id).await;
        if messages.is_empty() {
            return;
        }

        info!(
            "Summarization due for session {} ({} messages appended)",
            session_id, total_appended
        );

        let summarizer = self.summarizer.clone();
        let session_id = session_id.to_string();
        let user_id = user_id.to_string();
        tokio::spawn(async move {
            summarizer.run(&session_id, &user_id, messages).await;
        });
    }
}

/// True exactly when the appended-message total crosses a batch boundary.
fn summarization_due(total_appended: u64, batch: u64) -> bool {
    batch > 0 && total_appended % batch == 0
}
