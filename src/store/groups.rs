// Group operations. Group ids are slugs derived from the name; the
// 'default' group is seeded at startup and protected from deletion.

use rusqlite::params;
use serde::{Deserialize, Serialize};

use crate::error::Result;

use super::Store;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupRecord {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Turns a display name into a group id: lowercase, whitespace runs
/// become single hyphens.
pub fn slugify(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

pub trait GroupStore {
    fn create_group(&self, id: &str, name: &str, description: Option<&str>) -> Result<()>;
    fn get_groups(&self) -> Result<Vec<GroupRecord>>;
    fn get_group(&self, id: &str) -> Result<Option<GroupRecord>>;
    fn update_group(&self, id: &str, name: &str, description: Option<&str>) -> Result<()>;

    /// Deletes a group after reassigning its configurations to 'default'.
    /// The default group itself is never deleted.
    fn delete_group(&self, id: &str) -> Result<()>;
}

fn row_to_group(row: &rusqlite::Row<'_>) -> rusqlite::Result<GroupRecord> {
    Ok(GroupRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

impl GroupStore for Store {
    fn create_group(&self, id: &str, name: &str, description: Option<&str>) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO groups (id, name, description) VALUES (?1, ?2, ?3)",
            params![id, name, description],
        )?;
        Ok(())
    }

    fn get_groups(&self) -> Result<Vec<GroupRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, name, description, created_at, updated_at
             FROM groups ORDER BY name",
        )?;
        let groups = stmt
            .query_map([], row_to_group)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(groups)
    }

    fn get_group(&self, id: &str) -> Result<Option<GroupRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, name, description, created_at, updated_at
             FROM groups WHERE id = ?1",
        )?;
        let mut rows = stmt.query_map(params![id], row_to_group)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    fn update_group(&self, id: &str, name: &str, description: Option<&str>) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE groups
             SET name = ?1, description = ?2, updated_at = CURRENT_TIMESTAMP
             WHERE id = ?3",
            params![name, description, id],
        )?;
        Ok(())
    }

    fn delete_group(&self, id: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE configurations SET group_id = 'default' WHERE group_id = ?1",
            params![id],
        )?;
        conn.execute(
            "DELETE FROM groups WHERE id = ?1 AND id != 'default'",
            params![id],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("My ML Jobs"), "my-ml-jobs");
        assert_eq!(slugify("  padded   name "), "padded-name");
    }

    #[test]
    fn test_group_crud_round_trip() {
        let store = Store::open_in_memory().unwrap();
        store
            .create_group("training", "Training", Some("GPU jobs"))
            .unwrap();

        let group = store.get_group("training").unwrap().unwrap();
        assert_eq!(group.name, "Training");
        assert_eq!(group.description.as_deref(), Some("GPU jobs"));

        store.update_group("training", "Training Jobs", None).unwrap();
        let group = store.get_group("training").unwrap().unwrap();
        assert_eq!(group.name, "Training Jobs");
        assert!(group.description.is_none());

        store.delete_group("training").unwrap();
        assert!(store.get_group("training").unwrap().is_none());
    }

    #[test]
    fn test_default_group_survives_delete() {
        let store = Store::open_in_memory().unwrap();
        store.delete_group("default").unwrap();
        assert!(store.get_group("default").unwrap().is_some());
    }

    #[test]
    fn test_groups_sorted_by_name() {
        let store = Store::open_in_memory().unwrap();
        store.create_group("zeta", "Zeta", None).unwrap();
        store.create_group("alpha", "Alpha", None).unwrap();

        let names: Vec<String> = store.get_groups().unwrap().into_iter().map(|g| g.name).collect();
        assert_eq!(names, vec!["Alpha", "Default", "Zeta"]);
    }
}
