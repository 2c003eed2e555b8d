//! ============================================================================
//! NOVA-CORE: Conversational Memory Engine
//! ============================================================================
//! This crate handles the memory layer for the Nova chat companion:
//! - Bounded per-session short-term message buffers
//! - Durable per-user profiles with confidence-scored fact fragments (redb)
//! - Keyword fact extraction and tone detection
//! - Prompt context assembly and detached conversation summarization
//! ============================================================================

pub mod config;
pub mod db;
pub mod error;
pub mod memory;
pub mod tone;

// Re-export main types for convenience
pub use config::MemoryConfig;
pub use db::{DbStats, NovaDb};
pub use error::MemoryError;
pub use memory::{
    ChatMessage, ConversationRecord, Fact, FactKey, FactValuePolicy, MemoryFragment,
    MemoryPipeline, MessageRole, ProfileSnapshot, ShortTermMemory, SummaryStrategy, TurnMemory,
    UserProfile,
};
pub use tone::{detect_tone, DetectedTone, TonePreference};
