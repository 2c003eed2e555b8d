//! ============================================================================
//! Database Types - Aggregate views over the stored records
//! ============================================================================

use serde::{Deserialize, Serialize};

/// Database statistics for the inspection CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbStats {
    pub total_profiles: usize,
    pub total_conversations: usize,
    /// Sum of fragment counts across all profiles.
    pub total_fragments: usize,
    /// Sum of estimated token counts across archived conversations.
    pub archived_tokens: usize,
}
