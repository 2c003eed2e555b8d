//! ============================================================================
//! Context Assembly - Render a profile into one prompt-ready memory block
//! ============================================================================
//! Deterministic concatenation of the non-default profile attributes, in a
//! fixed clause order. The assembler owns no prompt formatting beyond this
//! single semantic block.
//! ============================================================================

use super::types::{UserProfile, DEFAULT_LOCATION, DEFAULT_NAME, NEW_USER_SUMMARY};

/// Returned when no clause qualifies.
pub const NO_MEMORIES_SENTINEL: &str = "No significant memories yet.";

// At most this many fragments are rendered, in stored order.
const FRAGMENT_LIMIT: usize = 5;

// Fragments must exceed this confidence to be rendered.
const CONFIDENCE_THRESHOLD: f64 = 0.8;

impl UserProfile {
    /// Render the profile's non-default attributes as a natural-language
    /// context block: name, location, preferences, up to five
    /// high-confidence fragments, then the prior conversation summary.
    pub fn render_context(&self) -> String {
        let mut parts: Vec<String> = Vec::new();

        if self.name != DEFAULT_NAME {
            parts.push(format!("User's name is {}.", self.name));
        }

        if self.location != DEFAULT_LOCATION {
            parts.push(format!("User is from {}.", self.location));
        }

        if !self.preferences.is_empty() {
            parts.push(format!("User likes: {}.", self.preferences.join(", ")));
        }

        let memories: Vec<String> = self
            .memory_fragments
            .iter()
            .filter(|f| f.confidence > CONFIDENCE_THRESHOLD)
            .take(FRAGMENT_LIMIT)
            .map(|f| format!("{}: {}", f.key, f.value))
            .collect();
        if !memories.is_empty() {
            parts.push(format!("Remember: {}", memories.join("; ")));
        }

        if self.conversation_summary != NEW_USER_SUMMARY {
            parts.push(format!(
                "Previous conversation summary: {}",
                self.conversation_summary
            ));
        }

        if parts.is_empty() {
            NO_MEMORIES_SENTINEL.to_string()
        } else {
            parts.join(" ")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::types::MemoryFragment;

    fn fragment(key: &str, value: &str, confidence: f64) -> MemoryFragment {
        MemoryFragment {
            key: key.to_string(),
            value: value.to_string(),
            confidence,
            last_accessed: 0,
        }
    }

    #[test]
    fn test_all_defaults_renders_sentinel() {
        let profile = UserProfile::new("u1");
        assert_eq!(profile.render_context(), NO_MEMORIES_SENTINEL);
    }

    #[test]
    fn test_name_and_preference_without_location() {
        let mut profile = UserProfile::new("u1");
        profile.name = "Sam".to_string();
        profile.preferences.push("anime".to_string());

        let context = profile.render_context();
        assert!(context.contains("User's name is Sam."));
        assert!(context.contains("User likes: anime."));
        assert!(!context.contains("User is from"));
    }

    #[test]
    fn test_clause_order_is_fixed() {
        let mut profile = UserProfile::new("u1");
        profile.name = "Sam".to_string();
        profile.location = "london".to_string();
        profile.conversation_summary = "Talked about music.".to_string();

        let context = profile.render_context();
        let name_pos = context.find("User's name").unwrap();
        let location_pos = context.find("User is from").unwrap();
        let summary_pos = context.find("Previous conversation summary").unwrap();
        assert!(name_pos < location_pos);
        assert!(location_pos < summary_pos);
    }

    #[test]
    fn test_fragment_threshold_and_limit() {
        let mut profile = UserProfile::new("u1");
        // Exactly at the threshold is excluded (strictly greater required)
        profile.memory_fragments.push(fragment("a", "1", 0.8));
        for i in 0..7 {
            profile
                .memory_fragments
                .push(fragment(&format!("k{}", i), "v", 0.9));
        }

        let context = profile.render_context();
        assert!(!context.contains("a: 1"));
        // First five qualifying fragments in stored order, not sorted
        assert!(context.contains("k0: v"));
        assert!(context.contains("k4: v"));
        assert!(!context.contains("k5: v"));
    }

    #[test]
    fn test_summary_clause_only_when_not_sentinel() {
        let mut profile = UserProfile::new("u1");
        profile.conversation_summary = "Covered football news.".to_string();

        let context = profile.render_context();
        assert!(context.contains("Previous conversation summary: Covered football news."));
    }
}
