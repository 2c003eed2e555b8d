//! ============================================================================
//! Profile Store - Long-term per-user memory with confidence accumulation
//! ============================================================================
//! Get-or-create lifecycle plus the fact-merge semantics: re-observed keys
//! gain confidence, new keys append as fresh fragments, and placeholder
//! profile fields are promoted the first time a matching fact arrives.
//!
//! Merges are read-modify-write over the whole profile document. One batch
//! of facts is persisted in a single write, but two concurrent turns for the
//! same user can interleave their load/save cycles and lose an update; the
//! deployment assumption is a single writer per user.
//! ============================================================================

use std::sync::Arc;
use tracing::{debug, info};

use super::types::{Fact, FactKey, FactValuePolicy, MemoryFragment, UserProfile};
use super::types::{DEFAULT_LOCATION, DEFAULT_NAME};
use crate::db::NovaDb;
use crate::error::MemoryError;

/// Confidence assigned to a fragment on first observation.
pub const INITIAL_CONFIDENCE: f64 = 0.7;

/// Confidence added on each re-observation of the same key. Uncapped.
pub const CONFIDENCE_STEP: f64 = 0.1;

/// Durable profile access with merge semantics.
#[derive(Clone)]
pub struct ProfileStore {
    db: Arc<NovaDb>,
    policy: FactValuePolicy,
}

impl ProfileStore {
    pub fn new(db: Arc<NovaDb>, policy: FactValuePolicy) -> Self {
        Self { db, policy }
    }

    /// Load a profile, creating it on first contact. Existing profiles get
    /// their session bookkeeping bumped. Store failures propagate; this is
    /// the one synchronous lookup a turn cannot proceed without.
    pub fn get_or_create(&self, user_id: &str) -> Result<UserProfile, MemoryError> {
        let profile = match self.db.get_profile(user_id)? {
            Some(mut profile) => {
                profile.session_count += 1;
                profile.last_session = chrono::Utc::now().timestamp();
                profile
            }
            None => {
                info!("Creating profile for new user {}", user_id);
                let mut profile = UserProfile::new(user_id);
                profile.session_count = 1;
                profile
            }
        };

        self.db.store_profile(&profile)?;
        Ok(profile)
    }

    pub fn get(&self, user_id: &str) -> Result<Option<UserProfile>, MemoryError> {
        self.db.get_profile(user_id)
    }

    /// Merge a batch of extracted facts into a user's profile.
    ///
    /// A missing profile is a silent no-op (idempotent-safety fallback, not
    /// an error). The whole profile is persisted once, after the batch.
    pub fn merge_facts(&self, user_id: &str, facts: &[Fact]) -> Result<(), MemoryError> {
        if facts.is_empty() {
            return Ok(());
        }

        let Some(mut profile) = self.db.get_profile(user_id)? else {
            debug!("No profile for {}, skipping fact merge", user_id);
            return Ok(());
        };

        let now = chrono::Utc::now().timestamp();
        for fact in facts {
            merge_fact(&mut profile, fact, now, self.policy);
        }

        self.db.store_profile(&profile)?;
        debug!("Merged {} facts for user {}", facts.len(), user_id);
        Ok(())
    }

    /// Overwrite the rolling conversation summary. Missing profile → no-op.
    pub fn update_summary(&self, user_id: &str, summary: &str) -> Result<(), MemoryError> {
        let Some(mut profile) = self.db.get_profile(user_id)? else {
            debug!("No profile for {}, skipping summary update", user_id);
            return Ok(());
        };

        profile.conversation_summary = summary.to_string();
        self.db.store_profile(&profile)
    }
}

/// Apply a single fact to an in-memory profile.
///
/// First fragment with a matching key is canonical: its confidence climbs by
/// `CONFIDENCE_STEP` and `last_accessed` refreshes. Under `FirstWins` the
/// stored value is never altered, even by a contradicting observation.
fn merge_fact(profile: &mut UserProfile, fact: &Fact, now: i64, policy: FactValuePolicy) {
    let key = fact.key.as_str();

    match profile.memory_fragments.iter_mut().find(|f| f.key == key) {
        Some(fragment) => {
            fragment.confidence += CONFIDENCE_STEP;
            fragment.last_accessed = now;
            if policy == FactValuePolicy::LatestWins {
                fragment.value = fact.value.clone();
            }
        }
        None => {
            profile.memory_fragments.push(MemoryFragment {
                key: key.to_string(),
                value: fact.value.clone(),
                confidence: INITIAL_CONFIDENCE,
                last_accessed: now,
            });
        }
    }

    promote_fact(profile, fact, policy);
}

// Replace placeholder profile fields the first time a matching fact merges.
fn promote_fact(profile: &mut UserProfile, fact: &Fact, policy: FactValuePolicy) {
    match fact.key {
        FactKey::Name => {
            if profile.name == DEFAULT_NAME || policy == FactValuePolicy::LatestWins {
                profile.name = fact.value.clone();
            }
        }
        FactKey::Location => {
            if profile.location == DEFAULT_LOCATION || policy == FactValuePolicy::LatestWins {
                profile.location = fact.value.clone();
            }
        }
        FactKey::Preference => {
            if !profile.preferences.contains(&fact.value) {
                profile.preferences.push(fact.value.clone());
            }
        }
    }
}
