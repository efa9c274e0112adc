// Core store struct with connection management and schema setup. Domain
// operations live in the per-area trait modules.

pub mod configurations;
pub mod groups;
pub mod templates;

use std::path::Path;
use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use sha2::{Digest, Sha256};

use crate::error::Result;

pub use configurations::{ConfigurationRecord, ConfigurationStore, NewConfiguration};
pub use groups::{GroupRecord, GroupStore};
pub use templates::{
    Author, CategoryCount, LikeStatus, NewTemplate, StatsOverview, TemplateFilter, TemplatePage,
    TemplateRecord, TemplateSort, TemplateStore, TemplateSummary,
};

#[derive(Clone)]
pub struct Store {
    pub(crate) conn: Arc<Mutex<Connection>>,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("conn", &"Arc<Mutex<Connection>>")
            .finish()
    }
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let store = Store {
            conn: Arc::new(Mutex::new(Connection::open(path)?)),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// In-memory store, used by tests.
    pub fn open_in_memory() -> Result<Self> {
        let store = Store {
            conn: Arc::new(Mutex::new(Connection::open_in_memory()?)),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "CREATE TABLE IF NOT EXISTS groups (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS configurations (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                group_id TEXT NOT NULL DEFAULT 'default',
                yaml_content TEXT NOT NULL,
                description TEXT,
                is_template_copy INTEGER NOT NULL DEFAULT 0,
                source_template_id TEXT,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (group_id) REFERENCES groups(id)
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS community_templates (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                description TEXT,
                emoji TEXT NOT NULL DEFAULT '📝',
                category TEXT,
                yaml_content TEXT NOT NULL,
                filename TEXT NOT NULL DEFAULT 'dstack.yml',
                author_id TEXT NOT NULL,
                author_name TEXT,
                author_username TEXT,
                author_avatar_url TEXT,
                author_profile_url TEXT,
                like_count INTEGER NOT NULL DEFAULT 0,
                view_count INTEGER NOT NULL DEFAULT 0,
                is_public INTEGER NOT NULL DEFAULT 1,
                is_featured INTEGER NOT NULL DEFAULT 0,
                content_hash TEXT NOT NULL UNIQUE,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS template_likes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                template_id INTEGER NOT NULL,
                user_id TEXT NOT NULL,
                user_name TEXT,
                user_username TEXT,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                UNIQUE (template_id, user_id),
                FOREIGN KEY (template_id) REFERENCES community_templates(id) ON DELETE CASCADE
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS config_analytics (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                template_id INTEGER,
                action TEXT NOT NULL,
                user_id TEXT,
                ip_address TEXT,
                user_agent TEXT,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_configurations_group
             ON configurations(group_id)",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_templates_category
             ON community_templates(category)",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_likes_template
             ON template_likes(template_id)",
            [],
        )?;

        // The default group always exists and cannot be deleted.
        conn.execute(
            "INSERT OR IGNORE INTO groups (id, name, description)
             VALUES ('default', 'Default', 'Default group for configurations')",
            [],
        )?;

        Ok(())
    }
}

/// Duplicate-detection hash: case-folded title and whitespace-collapsed
/// content, joined with a colon.
pub fn content_hash(title: &str, yaml_content: &str) -> String {
    let normalized_title = title.trim().to_lowercase();
    let normalized_content = yaml_content
        .trim()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let combined = format!("{normalized_title}:{normalized_content}");

    let mut hasher = Sha256::new();
    hasher.update(combined.as_bytes());
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_initializes_and_seeds_default_group() {
        let store = Store::open_in_memory().unwrap();
        let conn = store.conn.lock().unwrap();
        let name: String = conn
            .query_row("SELECT name FROM groups WHERE id = 'default'", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(name, "Default");
    }

    #[test]
    fn test_content_hash_ignores_whitespace_and_title_case() {
        let a = content_hash("My Task", "type: task\nname: demo\n");
        let b = content_hash("  my task ", "type:   task\n\nname: demo");
        assert_eq!(a, b);
    }

    #[test]
    fn test_content_hash_differs_on_content() {
        let a = content_hash("My Task", "type: task");
        let b = content_hash("My Task", "type: service");
        assert_ne!(a, b);
    }
}
