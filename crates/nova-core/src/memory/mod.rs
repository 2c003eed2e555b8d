//! ============================================================================
//! Memory Module - Short- and long-term user memory for Nova
//! ============================================================================
//! Heuristic memory layer for the chat companion: bounded per-session
//! buffers, durable per-user fact profiles, and prompt context assembly.
//!
//! ## Architecture
//! ```text
//! User Message → ShortTermMemory.append → FactExtractor.extract
//!                                              ↓
//!                                   ProfileStore.merge_facts
//!                                              ↓
//!                          render_context → [prompt block for the LLM]
//!                                              ↓
//!                     every Nth message: ConversationSummarizer (detached)
//! ```
//!
//! ## Usage
//! ```rust,ignore
//! use nova_core::{MemoryConfig, MemoryPipeline};
//!
//! let pipeline = MemoryPipeline::new(MemoryConfig::default())?;
//!
//! let turn = pipeline.process_message("user-1", None, "my name is Alice").await?;
//! // turn.rendered_context feeds the external prompt builder
//! pipeline.record_reply(&turn.session_id, "user-1", "Hi Alice!", turn.detected_tone).await;
//! ```
//! ============================================================================

pub mod context;
pub mod extract;
pub mod pipeline;
pub mod profiles;
pub mod short_term;
pub mod summarize;
pub mod types;

// Re-export public types
pub use context::NO_MEMORIES_SENTINEL;
pub use extract::extract;
pub use pipeline::MemoryPipeline;
pub use profiles::{ProfileStore, CONFIDENCE_STEP, INITIAL_CONFIDENCE};
pub use short_term::{ShortTermMemory, DEFAULT_MAX_MESSAGES};
pub use summarize::{
    create_summary_strategy, template_summary, ConversationSummarizer, LlmSummarizer,
    SummaryStrategy, TemplateSummarizer, DEFAULT_SUMMARY_BATCH, FALLBACK_SUMMARY,
};
pub use types::{
    ChatMessage, ConversationRecord, Fact, FactKey, FactValuePolicy, MemoryFragment, MessageRole,
    ProfileSnapshot, TurnMemory, UserProfile,
};
