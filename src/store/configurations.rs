// Configuration operations. Ids are v4 UUIDs; names are unique per group,
// case-insensitively.

use rusqlite::params;
use serde::{Deserialize, Serialize};

use crate::error::Result;

use super::Store;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigurationRecord {
    pub id: String,
    pub name: String,
    pub group_id: String,
    pub yaml_content: String,
    pub description: Option<String>,
    pub is_template_copy: bool,
    pub source_template_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    /// Populated only by the with-groups listing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewConfiguration<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub group_id: &'a str,
    pub yaml_content: &'a str,
    pub description: Option<&'a str>,
    pub is_template_copy: bool,
    pub source_template_id: Option<&'a str>,
}

pub trait ConfigurationStore {
    fn create_configuration(&self, config: &NewConfiguration<'_>) -> Result<()>;
    fn get_configurations(&self, group_id: Option<&str>) -> Result<Vec<ConfigurationRecord>>;
    fn get_configurations_with_groups(&self) -> Result<Vec<ConfigurationRecord>>;
    fn get_configuration(&self, id: &str) -> Result<Option<ConfigurationRecord>>;
    fn update_configuration(
        &self,
        id: &str,
        name: &str,
        yaml_content: &str,
        description: Option<&str>,
    ) -> Result<()>;
    fn delete_configuration(&self, id: &str) -> Result<()>;

    /// Case-insensitive name check within a group.
    fn configuration_name_exists(&self, group_id: &str, name: &str) -> Result<bool>;
}

fn row_to_configuration(row: &rusqlite::Row<'_>) -> rusqlite::Result<ConfigurationRecord> {
    Ok(ConfigurationRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        group_id: row.get(2)?,
        yaml_content: row.get(3)?,
        description: row.get(4)?,
        is_template_copy: row.get::<_, i64>(5)? == 1,
        source_template_id: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
        group_name: None,
    })
}

const CONFIG_COLUMNS: &str = "id, name, group_id, yaml_content, description, \
     is_template_copy, source_template_id, created_at, updated_at";

impl ConfigurationStore for Store {
    fn create_configuration(&self, config: &NewConfiguration<'_>) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO configurations
             (id, name, group_id, yaml_content, description, is_template_copy, source_template_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                config.id,
                config.name,
                config.group_id,
                config.yaml_content,
                config.description,
                config.is_template_copy as i64,
                config.source_template_id,
            ],
        )?;
        Ok(())
    }

    fn get_configurations(&self, group_id: Option<&str>) -> Result<Vec<ConfigurationRecord>> {
        let conn = self.conn.lock().unwrap();
        let configs = match group_id {
            Some(group_id) => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {CONFIG_COLUMNS} FROM configurations
                     WHERE group_id = ?1 ORDER BY name"
                ))?;
                let rows = stmt
                    .query_map(params![group_id], row_to_configuration)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                rows
            }
            None => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {CONFIG_COLUMNS} FROM configurations ORDER BY name"
                ))?;
                let rows = stmt
                    .query_map([], row_to_configuration)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                rows
            }
        };
        Ok(configs)
    }

    fn get_configurations_with_groups(&self) -> Result<Vec<ConfigurationRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT c.id, c.name, c.group_id, c.yaml_content, c.description,
                    c.is_template_copy, c.source_template_id, c.created_at, c.updated_at,
                    g.name AS group_name
             FROM configurations c
             LEFT JOIN groups g ON c.group_id = g.id
             ORDER BY g.name, c.name",
        )?;
        let configs = stmt
            .query_map([], |row| {
                let mut config = row_to_configuration(row)?;
                config.group_name = row.get(9)?;
                Ok(config)
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(configs)
    }

    fn get_configuration(&self, id: &str) -> Result<Option<ConfigurationRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {CONFIG_COLUMNS} FROM configurations WHERE id = ?1"
        ))?;
        let mut rows = stmt.query_map(params![id], row_to_configuration)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    fn update_configuration(
        &self,
        id: &str,
        name: &str,
        yaml_content: &str,
        description: Option<&str>,
    ) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE configurations
             SET name = ?1, yaml_content = ?2, description = ?3, updated_at = CURRENT_TIMESTAMP
             WHERE id = ?4",
            params![name, yaml_content, description, id],
        )?;
        Ok(())
    }

    fn delete_configuration(&self, id: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM configurations WHERE id = ?1", params![id])?;
        Ok(())
    }

    fn configuration_name_exists(&self, group_id: &str, name: &str) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM configurations
             WHERE group_id = ?1 AND LOWER(name) = LOWER(?2)",
            params![group_id, name],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::groups::GroupStore;

    fn sample<'a>(id: &'a str, name: &'a str, group_id: &'a str) -> NewConfiguration<'a> {
        NewConfiguration {
            id,
            name,
            group_id,
            yaml_content: "type: task\nname: demo\n",
            description: None,
            is_template_copy: false,
            source_template_id: None,
        }
    }

    #[test]
    fn test_configuration_crud_round_trip() {
        let store = Store::open_in_memory().unwrap();
        store.create_configuration(&sample("c1", "demo", "default")).unwrap();

        let config = store.get_configuration("c1").unwrap().unwrap();
        assert_eq!(config.name, "demo");
        assert!(!config.is_template_copy);

        store
            .update_configuration("c1", "demo2", "type: service\n", Some("updated"))
            .unwrap();
        let config = store.get_configuration("c1").unwrap().unwrap();
        assert_eq!(config.name, "demo2");
        assert_eq!(config.yaml_content, "type: service\n");

        store.delete_configuration("c1").unwrap();
        assert!(store.get_configuration("c1").unwrap().is_none());
    }

    #[test]
    fn test_name_uniqueness_is_case_insensitive() {
        let store = Store::open_in_memory().unwrap();
        store.create_configuration(&sample("c1", "Demo", "default")).unwrap();
        assert!(store.configuration_name_exists("default", "demo").unwrap());
        assert!(!store.configuration_name_exists("other", "demo").unwrap());
    }

    #[test]
    fn test_listing_filters_by_group() {
        let store = Store::open_in_memory().unwrap();
        store.create_group("training", "Training", None).unwrap();
        store.create_configuration(&sample("c1", "a", "default")).unwrap();
        store.create_configuration(&sample("c2", "b", "training")).unwrap();

        assert_eq!(store.get_configurations(None).unwrap().len(), 2);
        let filtered = store.get_configurations(Some("training")).unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, "c2");
    }

    #[test]
    fn test_with_groups_carries_group_name() {
        let store = Store::open_in_memory().unwrap();
        store.create_configuration(&sample("c1", "a", "default")).unwrap();

        let configs = store.get_configurations_with_groups().unwrap();
        assert_eq!(configs[0].group_name.as_deref(), Some("Default"));
    }

    #[test]
    fn test_group_delete_reassigns_configurations() {
        let store = Store::open_in_memory().unwrap();
        store.create_group("training", "Training", None).unwrap();
        store.create_configuration(&sample("c1", "a", "training")).unwrap();

        store.delete_group("training").unwrap();
        let config = store.get_configuration("c1").unwrap().unwrap();
        assert_eq!(config.group_id, "default");
    }
}
