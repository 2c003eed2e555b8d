//! ============================================================================
//! Configuration - Env-var backed runtime settings
//! ============================================================================

use serde::{Deserialize, Serialize};

use crate::memory::short_term::DEFAULT_MAX_MESSAGES;
use crate::memory::summarize::DEFAULT_SUMMARY_BATCH;
use crate::memory::types::FactValuePolicy;

/// Runtime configuration for the memory engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Database file path override (NOVA_DB_PATH)
    pub db_path: Option<String>,
    /// Per-session short-term buffer cap (NOVA_MAX_SHORT_TERM)
    pub max_short_term: usize,
    /// Summarization batch size (NOVA_SUMMARY_BATCH)
    pub summary_batch: u64,
    /// Fragment value override policy (NOVA_FACT_POLICY)
    pub fact_value_policy: FactValuePolicy,
    /// API key enabling the LLM summarization strategy (NOVA_LLM_API_KEY)
    pub llm_api_key: Option<String>,
    /// OpenAI-compatible base URL override (NOVA_LLM_BASE_URL)
    pub llm_base_url: Option<String>,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            db_path: std::env::var("NOVA_DB_PATH").ok(),
            max_short_term: std::env::var("NOVA_MAX_SHORT_TERM")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_MESSAGES),
            summary_batch: std::env::var("NOVA_SUMMARY_BATCH")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_SUMMARY_BATCH),
            fact_value_policy: std::env::var("NOVA_FACT_POLICY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_default(),
            llm_api_key: std::env::var("NOVA_LLM_API_KEY").ok(),
            llm_base_url: std::env::var("NOVA_LLM_BASE_URL").ok(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        // Construct directly rather than via env to keep the test hermetic
        let config = MemoryConfig {
            db_path: None,
            max_short_term: DEFAULT_MAX_MESSAGES,
            summary_batch: DEFAULT_SUMMARY_BATCH,
            fact_value_policy: FactValuePolicy::default(),
            llm_api_key: None,
            llm_base_url: None,
        };
        assert_eq!(config.max_short_term, 10);
        assert_eq!(config.summary_batch, 10);
        assert_eq!(config.fact_value_policy, FactValuePolicy::FirstWins);
    }
}
