// ============================================================================
// NovaDb — Embedded Database (redb)
// ============================================================================
// Persistent local storage for user profiles and archived conversations.
// Default path: ~/.nova/memory.redb (override via NOVA_DB_PATH env var)
//
// Semantics are read-by-key / write-whole-document: callers load a record,
// mutate it in memory, and store it back. There is no compare-and-set, so
// concurrent read-modify-write cycles on the same key can lose updates.
// ============================================================================

pub mod types;

pub use types::DbStats;

use redb::{Database, TableDefinition};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::MemoryError;
use crate::memory::types::{ConversationRecord, UserProfile};

// Table definitions
const PROFILES: TableDefinition<&str, &[u8]> = TableDefinition::new("profiles");
const CONVERSATIONS: TableDefinition<&str, &[u8]> = TableDefinition::new("conversations");

/// Embedded document store for the memory engine
pub struct NovaDb {
    db: Database,
    path: PathBuf,
}

impl NovaDb {
    /// Open (or create) the database at the given path.
    /// If `path` is None, uses NOVA_DB_PATH env var or ~/.nova/memory.redb
    pub fn open(path: Option<&str>) -> Result<Self, MemoryError> {
        let db_path = if let Some(p) = path {
            PathBuf::from(p)
        } else if let Ok(env_path) = std::env::var("NOVA_DB_PATH") {
            PathBuf::from(env_path)
        } else {
            let home = dirs::home_dir()
                .ok_or_else(|| MemoryError::Store("Cannot determine home directory".into()))?;
            let nova_dir = home.join(".nova");
            std::fs::create_dir_all(&nova_dir).map_err(|e| {
                MemoryError::Store(format!("Failed to create .nova directory: {}", e))
            })?;
            nova_dir.join("memory.redb")
        };

        info!("Opening database at: {}", db_path.display());

        let db = Database::create(&db_path)
            .map_err(|e| MemoryError::Store(format!("Failed to open database: {}", e)))?;

        // Ensure tables exist by doing a write transaction
        let write_txn = db
            .begin_write()
            .map_err(|e| MemoryError::Store(format!("Failed to begin write: {}", e)))?;
        {
            let _ = write_txn.open_table(PROFILES).map_err(|e| {
                MemoryError::Store(format!("Failed to create profiles table: {}", e))
            })?;
            let _ = write_txn.open_table(CONVERSATIONS).map_err(|e| {
                MemoryError::Store(format!("Failed to create conversations table: {}", e))
            })?;
        }
        write_txn
            .commit()
            .map_err(|e| MemoryError::Store(format!("Failed to commit init: {}", e)))?;

        info!("Database ready");

        Ok(Self { db, path: db_path })
    }

    /// Get the database file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    // ========================================================================
    // Profile Operations
    // ========================================================================

    pub fn store_profile(&self, profile: &UserProfile) -> Result<(), MemoryError> {
        let key = format!("profiles:{}", profile.user_id);
        let value = bincode::serialize(profile)
            .map_err(|e| MemoryError::Serialization(format!("Failed to serialize profile: {}", e)))?;

        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| MemoryError::Store(format!("Failed to begin write: {}", e)))?;
        {
            let mut table = write_txn
                .open_table(PROFILES)
                .map_err(|e| MemoryError::Store(format!("Failed to open profiles table: {}", e)))?;
            table
                .insert(key.as_str(), value.as_slice())
                .map_err(|e| MemoryError::Store(format!("Failed to insert profile: {}", e)))?;
        }
        write_txn
            .commit()
            .map_err(|e| MemoryError::Store(format!("Failed to commit: {}", e)))?;

        debug!("Stored profile: {}", profile.user_id);
        Ok(())
    }

    pub fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>, MemoryError> {
        let key = format!("profiles:{}", user_id);

        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| MemoryError::Store(format!("Failed to begin read: {}", e)))?;
        let table = read_txn
            .open_table(PROFILES)
            .map_err(|e| MemoryError::Store(format!("Failed to open profiles table: {}", e)))?;

        match table
            .get(key.as_str())
            .map_err(|e| MemoryError::Store(format!("Failed to get profile: {}", e)))?
        {
            Some(value) => {
                let profile: UserProfile = bincode::deserialize(value.value()).map_err(|e| {
                    MemoryError::Serialization(format!("Failed to deserialize profile: {}", e))
                })?;
                Ok(Some(profile))
            }
            None => Ok(None),
        }
    }

    pub fn list_profiles(&self) -> Result<Vec<UserProfile>, MemoryError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| MemoryError::Store(format!("Failed to begin read: {}", e)))?;
        let table = read_txn
            .open_table(PROFILES)
            .map_err(|e| MemoryError::Store(format!("Failed to open profiles table: {}", e)))?;

        let mut results = Vec::new();
        let iter = table
            .range::<&str>(..)
            .map_err(|e| MemoryError::Store(format!("Failed to iterate profiles: {}", e)))?;
        for entry in iter {
            let (_key, value) =
                entry.map_err(|e| MemoryError::Store(format!("Failed to read entry: {}", e)))?;
            let profile: UserProfile = bincode::deserialize(value.value()).map_err(|e| {
                MemoryError::Serialization(format!("Failed to deserialize profile: {}", e))
            })?;
            results.push(profile);
        }
        Ok(results)
    }

    pub fn delete_profile(&self, user_id: &str) -> Result<bool, MemoryError> {
        let key = format!("profiles:{}", user_id);

        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| MemoryError::Store(format!("Failed to begin write: {}", e)))?;
        let removed;
        {
            let mut table = write_txn
                .open_table(PROFILES)
                .map_err(|e| MemoryError::Store(format!("Failed to open profiles table: {}", e)))?;
            removed = table
                .remove(key.as_str())
                .map_err(|e| MemoryError::Store(format!("Failed to remove profile: {}", e)))?
                .is_some();
        }
        write_txn
            .commit()
            .map_err(|e| MemoryError::Store(format!("Failed to commit delete: {}", e)))?;

        if removed {
            debug!("Deleted profile: {}", user_id);
        }
        Ok(removed)
    }

    // ========================================================================
    // Conversation Operations
    // ========================================================================

    pub fn store_conversation(&self, record: &ConversationRecord) -> Result<(), MemoryError> {
        let key = format!("conversations:{}", record.id);
        let value = bincode::serialize(record).map_err(|e| {
            MemoryError::Serialization(format!("Failed to serialize conversation: {}", e))
        })?;

        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| MemoryError::Store(format!("Failed to begin write: {}", e)))?;
        {
            let mut table = write_txn.open_table(CONVERSATIONS).map_err(|e| {
                MemoryError::Store(format!("Failed to open conversations table: {}", e))
            })?;
            table
                .insert(key.as_str(), value.as_slice())
                .map_err(|e| MemoryError::Store(format!("Failed to insert conversation: {}", e)))?;
        }
        write_txn
            .commit()
            .map_err(|e| MemoryError::Store(format!("Failed to commit: {}", e)))?;

        debug!("Archived conversation {} ({})", record.id, record.session_id);
        Ok(())
    }

    pub fn get_conversation(&self, id: &Uuid) -> Result<Option<ConversationRecord>, MemoryError> {
        let key = format!("conversations:{}", id);

        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| MemoryError::Store(format!("Failed to begin read: {}", e)))?;
        let table = read_txn.open_table(CONVERSATIONS).map_err(|e| {
            MemoryError::Store(format!("Failed to open conversations table: {}", e))
        })?;

        match table
            .get(key.as_str())
            .map_err(|e| MemoryError::Store(format!("Failed to get conversation: {}", e)))?
        {
            Some(value) => {
                let record: ConversationRecord =
                    bincode::deserialize(value.value()).map_err(|e| {
                        MemoryError::Serialization(format!(
                            "Failed to deserialize conversation: {}",
                            e
                        ))
                    })?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    /// List archived conversations, optionally filtered by user.
    pub fn list_conversations(
        &self,
        user_filter: Option<&str>,
    ) -> Result<Vec<ConversationRecord>, MemoryError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| MemoryError::Store(format!("Failed to begin read: {}", e)))?;
        let table = read_txn.open_table(CONVERSATIONS).map_err(|e| {
            MemoryError::Store(format!("Failed to open conversations table: {}", e))
        })?;

        let mut results = Vec::new();
        let iter = table
            .range::<&str>(..)
            .map_err(|e| MemoryError::Store(format!("Failed to iterate conversations: {}", e)))?;
        for entry in iter {
            let (_key, value) =
                entry.map_err(|e| MemoryError::Store(format!("Failed to read entry: {}", e)))?;
            let record: ConversationRecord = bincode::deserialize(value.value()).map_err(|e| {
                MemoryError::Serialization(format!("Failed to deserialize conversation: {}", e))
            })?;

            if let Some(filter) = user_filter {
                if record.user_id == filter {
                    results.push(record);
                }
            } else {
                results.push(record);
            }
        }
        Ok(results)
    }

    pub fn delete_conversation(&self, id: &Uuid) -> Result<bool, MemoryError> {
        let key = format!("conversations:{}", id);

        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| MemoryError::Store(format!("Failed to begin write: {}", e)))?;
        let removed;
        {
            let mut table = write_txn.open_table(CONVERSATIONS).map_err(|e| {
                MemoryError::Store(format!("Failed to open conversations table: {}", e))
            })?;
            removed = table
                .remove(key.as_str())
                .map_err(|e| MemoryError::Store(format!("Failed to remove conversation: {}", e)))?
                .is_some();
        }
        write_txn
            .commit()
            .map_err(|e| MemoryError::Store(format!("Failed to commit delete: {}", e)))?;

        if removed {
            debug!("Deleted conversation: {}", id);
        }
        Ok(removed)
    }

    // ========================================================================
    // Pruning Operations
    // ========================================================================

    /// Prune archived conversations older than the given number of days
    /// (based on end_time). Returns the number of records deleted.
    pub fn prune_conversations(&self, older_than_days: i64) -> Result<usize, MemoryError> {
        let cutoff = chrono::Utc::now().timestamp() - (older_than_days * 86400);
        let records = self.list_conversations(None)?;

        let mut deleted = 0;
        for record in &records {
            if record.end_time < cutoff && self.delete_conversation(&record.id)? {
                deleted += 1;
            }
        }

        if deleted > 0 {
            info!(
                "Pruned {} conversations older than {} days",
                deleted, older_than_days
            );
        }
        Ok(deleted)
    }

    // ========================================================================
    // Statistics
    // ========================================================================

    pub fn stats(&self) -> Result<DbStats, MemoryError> {
        let profiles = self.list_profiles()?;
        let conversations = self.list_conversations(None)?;

        let total_fragments = profiles.iter().map(|p| p.memory_fragments.len()).sum();
        let archived_tokens = conversations.iter().map(|c| c.token_count).sum();

        Ok(DbStats {
            total_profiles: profiles.len(),
            total_conversations: conversations.len(),
            total_fragments,
            archived_tokens,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::types::ChatMessage;
    use crate::tone::DetectedTone;

    fn temp_db() -> NovaDb {
        let path = std::env::temp_dir().join(format!("nova-db-test-{}.redb", Uuid::new_v4()));
        NovaDb::open(Some(path.to_str().unwrap())).unwrap()
    }

    #[test]
    fn test_profile_roundtrip() {
        let db = temp_db();

        assert!(db.get_profile("u1").unwrap().is_none());

        let mut profile = UserProfile::new("u1");
        profile.name = "Sam".to_string();
        db.store_profile(&profile).unwrap();

        let loaded = db.get_profile("u1").unwrap().unwrap();
        assert_eq!(loaded.user_id, "u1");
        assert_eq!(loaded.name, "Sam");

        assert!(db.delete_profile("u1").unwrap());
        assert!(!db.delete_profile("u1").unwrap());
    }

    #[test]
    fn test_store_overwrites_whole_profile() {
        let db = temp_db();

        let mut profile = UserProfile::new("u1");
        profile.preferences.push("anime".to_string());
        db.store_profile(&profile).unwrap();

        profile.preferences.clear();
        db.store_profile(&profile).unwrap();

        let loaded = db.get_profile("u1").unwrap().unwrap();
        assert!(loaded.preferences.is_empty());
    }

    #[test]
    fn test_conversation_archive_and_filter() {
        let db = temp_db();

        let messages = vec![ChatMessage::user("hello", DetectedTone::Neutral)];
        let r1 = ConversationRecord::new("s1", "u1", messages.clone(), "first");
        let r2 = ConversationRecord::new("s2", "u2", messages, "second");
        db.store_conversation(&r1).unwrap();
        db.store_conversation(&r2).unwrap();

        assert_eq!(db.list_conversations(None).unwrap().len(), 2);
        let for_u1 = db.list_conversations(Some("u1")).unwrap();
        assert_eq!(for_u1.len(), 1);
        assert_eq!(for_u1[0].summary, "first");

        let loaded = db.get_conversation(&r1.id).unwrap().unwrap();
        assert_eq!(loaded.session_id, "s1");
    }

    #[test]
    fn test_prune_conversations() {
        let db = temp_db();

        let mut old = ConversationRecord::new(
            "s1",
            "u1",
            vec![ChatMessage::user("hi", DetectedTone::Neutral)],
            "old",
        );
        old.end_time = chrono::Utc::now().timestamp() - 100 * 86400;
        let fresh = ConversationRecord::new(
            "s2",
            "u1",
            vec![ChatMessage::user("hi", DetectedTone::Neutral)],
            "fresh",
        );
        db.store_conversation(&old).unwrap();
        db.store_conversation(&fresh).unwrap();

        let deleted = db.prune_conversations(30).unwrap();
        assert_eq!(deleted, 1);

        let remaining = db.list_conversations(None).unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].summary, "fresh");
    }

    #[test]
    fn test_stats() {
        let db = temp_db();

        let mut profile = UserProfile::new("u1");
        profile.memory_fragments.push(crate::memory::types::MemoryFragment {
            key: "name".to_string(),
            value: "Sam".to_string(),
            confidence: 0.7,
            last_accessed: 0,
        });
        db.store_profile(&profile).unwrap();

        let stats = db.stats().unwrap();
        assert_eq!(stats.total_profiles, 1);
        assert_eq!(stats.total_fragments, 1);
        assert_eq!(stats.total_conversations, 0);
    }
}
