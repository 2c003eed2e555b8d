//! ============================================================================
//! Error Types - Memory engine error taxonomy
//! ============================================================================

use serde::{Deserialize, Serialize};

/// Errors surfaced by the memory engine.
///
/// `ProfileNotFound` is only returned by lookups that require an existing
/// profile; the fact-merge path treats a missing profile as a silent no-op.
/// `Store` failures abort the turn only on the synchronous profile lookup;
/// everywhere else the pipeline degrades to defaults.
#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
pub enum MemoryError {
    #[error("Profile not found: {0}")]
    ProfileNotFound(String),

    #[error("Storage unavailable: {0}")]
    Store(String),

    #[error("Serialization failed: {0}")]
    Serialization(String),

    #[error("Summarization failed: {0}")]
    Summarization(String),
}
