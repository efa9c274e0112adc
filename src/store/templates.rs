// Community template operations: shared templates, likes, analytics
// events and aggregate stats.

use rusqlite::params;
use serde::{Deserialize, Serialize};

use crate::error::Result;

use super::Store;

/// Listing row. The full YAML body is only returned by the single-template
/// fetch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateSummary {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub emoji: String,
    pub category: Option<String>,
    pub filename: String,
    pub author_name: Option<String>,
    pub author_username: Option<String>,
    pub author_avatar_url: Option<String>,
    pub author_profile_url: Option<String>,
    pub like_count: i64,
    pub view_count: i64,
    pub created_at: String,
    pub updated_at: String,
    pub is_featured: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateRecord {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub emoji: String,
    pub category: Option<String>,
    pub yaml_content: String,
    pub filename: String,
    pub author_id: String,
    pub author_name: Option<String>,
    pub author_username: Option<String>,
    pub author_avatar_url: Option<String>,
    pub author_profile_url: Option<String>,
    pub like_count: i64,
    pub view_count: i64,
    pub is_public: bool,
    pub is_featured: bool,
    pub content_hash: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Author {
    pub id: String,
    pub name: Option<String>,
    pub username: Option<String>,
    pub avatar_url: Option<String>,
    pub profile_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewTemplate<'a> {
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub emoji: &'a str,
    pub category: Option<&'a str>,
    pub yaml_content: &'a str,
    pub filename: &'a str,
    pub author: &'a Author,
    pub content_hash: &'a str,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateSort {
    #[default]
    Recent,
    Popular,
    Likes,
}

impl TemplateSort {
    fn order_clause(self) -> &'static str {
        match self {
            TemplateSort::Recent => "ORDER BY created_at DESC",
            TemplateSort::Popular => "ORDER BY view_count DESC, created_at DESC",
            TemplateSort::Likes => "ORDER BY like_count DESC, created_at DESC",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TemplateFilter {
    pub page: u32,
    pub limit: u32,
    pub category: Option<String>,
    pub author: Option<String>,
    pub featured: bool,
    pub sort: TemplateSort,
}

#[derive(Debug, Clone, Serialize)]
pub struct Pagination {
    pub current_page: u32,
    pub per_page: u32,
    pub total: i64,
    pub total_pages: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TemplatePage {
    pub templates: Vec<TemplateSummary>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Serialize)]
pub struct LikeStatus {
    pub like_count: i64,
    pub is_liked: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatsOverview {
    pub total_templates: i64,
    pub total_likes: i64,
    pub total_views: i64,
    pub by_category: Vec<CategoryCount>,
    pub recent_activity: i64,
}

pub trait TemplateStore {
    fn list_templates(&self, filter: &TemplateFilter) -> Result<TemplatePage>;
    fn get_template(&self, id: i64) -> Result<Option<TemplateRecord>>;
    fn increment_view_count(&self, id: i64) -> Result<()>;
    fn find_template_by_hash(&self, content_hash: &str) -> Result<Option<(i64, String)>>;

    /// Inserts and returns the new row id.
    fn create_template(&self, template: &NewTemplate<'_>) -> Result<i64>;

    /// Flips the user's like. Returns true when the template is now liked.
    fn toggle_like(&self, template_id: i64, author: &Author) -> Result<bool>;
    fn like_status(&self, template_id: i64, user_id: Option<&str>) -> Result<Option<LikeStatus>>;

    fn template_author(&self, id: i64) -> Result<Option<String>>;
    fn delete_template(&self, id: i64) -> Result<()>;

    fn stats_overview(&self) -> Result<StatsOverview>;
    fn record_event(
        &self,
        template_id: i64,
        action: &str,
        user_id: Option<&str>,
        ip_address: Option<&str>,
        user_agent: Option<&str>,
    ) -> Result<()>;
}

fn row_to_summary(row: &rusqlite::Row<'_>) -> rusqlite::Result<TemplateSummary> {
    Ok(TemplateSummary {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        emoji: row.get(3)?,
        category: row.get(4)?,
        filename: row.get(5)?,
        author_name: row.get(6)?,
        author_username: row.get(7)?,
        author_avatar_url: row.get(8)?,
        author_profile_url: row.get(9)?,
        like_count: row.get(10)?,
        view_count: row.get(11)?,
        created_at: row.get(12)?,
        updated_at: row.get(13)?,
        is_featured: row.get::<_, i64>(14)? == 1,
    })
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<TemplateRecord> {
    Ok(TemplateRecord {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        emoji: row.get(3)?,
        category: row.get(4)?,
        yaml_content: row.get(5)?,
        filename: row.get(6)?,
        author_id: row.get(7)?,
        author_name: row.get(8)?,
        author_username: row.get(9)?,
        author_avatar_url: row.get(10)?,
        author_profile_url: row.get(11)?,
        like_count: row.get(12)?,
        view_count: row.get(13)?,
        is_public: row.get::<_, i64>(14)? == 1,
        is_featured: row.get::<_, i64>(15)? == 1,
        content_hash: row.get(16)?,
        created_at: row.get(17)?,
        updated_at: row.get(18)?,
    })
}

impl TemplateStore for Store {
    fn list_templates(&self, filter: &TemplateFilter) -> Result<TemplatePage> {
        let conn = self.conn.lock().unwrap();

        let mut where_clause = String::from("WHERE is_public = 1");
        let mut args: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
        if let Some(category) = &filter.category {
            where_clause.push_str(" AND category = ?");
            args.push(Box::new(category.clone()));
        }
        if let Some(author) = &filter.author {
            where_clause.push_str(" AND author_username = ?");
            args.push(Box::new(author.clone()));
        }
        if filter.featured {
            where_clause.push_str(" AND is_featured = 1");
        }

        let limit = filter.limit.max(1);
        let page = filter.page.max(1);
        let offset = (page as i64 - 1) * limit as i64;

        let count_sql = format!("SELECT COUNT(*) FROM community_templates {where_clause}");
        let total: i64 = conn.query_row(
            &count_sql,
            rusqlite::params_from_iter(args.iter().map(|a| a.as_ref())),
            |row| row.get(0),
        )?;

        let sql = format!(
            "SELECT id, title, description, emoji, category, filename,
                    author_name, author_username, author_avatar_url, author_profile_url,
                    like_count, view_count, created_at, updated_at, is_featured
             FROM community_templates
             {where_clause}
             {}
             LIMIT ? OFFSET ?",
            filter.sort.order_clause()
        );
        args.push(Box::new(limit as i64));
        args.push(Box::new(offset));

        let mut stmt = conn.prepare(&sql)?;
        let templates = stmt
            .query_map(
                rusqlite::params_from_iter(args.iter().map(|a| a.as_ref())),
                row_to_summary,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(TemplatePage {
            templates,
            pagination: Pagination {
                current_page: page,
                per_page: limit,
                total,
                total_pages: (total + limit as i64 - 1) / limit as i64,
            },
        })
    }

    fn get_template(&self, id: i64) -> Result<Option<TemplateRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, title, description, emoji, category, yaml_content, filename,
                    author_id, author_name, author_username, author_avatar_url,
                    author_profile_url, like_count, view_count, is_public, is_featured,
                    content_hash, created_at, updated_at
             FROM community_templates
             WHERE id = ?1 AND is_public = 1",
        )?;
        let mut rows = stmt.query_map(params![id], row_to_record)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    fn increment_view_count(&self, id: i64) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE community_templates SET view_count = view_count + 1 WHERE id = ?1",
            params![id],
        )?;
        Ok(())
    }

    fn find_template_by_hash(&self, content_hash: &str) -> Result<Option<(i64, String)>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, title FROM community_templates WHERE content_hash = ?1",
        )?;
        let mut rows = stmt.query_map(params![content_hash], |row| {
            Ok((row.get(0)?, row.get(1)?))
        })?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    fn create_template(&self, template: &NewTemplate<'_>) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO community_templates (
                title, description, emoji, category, yaml_content, filename,
                author_id, author_name, author_username, author_avatar_url,
                author_profile_url, content_hash
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                template.title,
                template.description,
                template.emoji,
                template.category,
                template.yaml_content,
                template.filename,
                template.author.id,
                template.author.name,
                template.author.username,
                template.author.avatar_url,
                template.author.profile_url,
                template.content_hash,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn toggle_like(&self, template_id: i64, author: &Author) -> Result<bool> {
        let conn = self.conn.lock().unwrap();

        let already_liked: i64 = conn.query_row(
            "SELECT COUNT(*) FROM template_likes WHERE template_id = ?1 AND user_id = ?2",
            params![template_id, author.id],
            |row| row.get(0),
        )?;

        if already_liked > 0 {
            conn.execute(
                "DELETE FROM template_likes WHERE template_id = ?1 AND user_id = ?2",
                params![template_id, author.id],
            )?;
            conn.execute(
                "UPDATE community_templates
                 SET like_count = MAX(like_count - 1, 0) WHERE id = ?1",
                params![template_id],
            )?;
            Ok(false)
        } else {
            conn.execute(
                "INSERT INTO template_likes (template_id, user_id, user_name, user_username)
                 VALUES (?1, ?2, ?3, ?4)",
                params![template_id, author.id, author.name, author.username],
            )?;
            conn.execute(
                "UPDATE community_templates SET like_count = like_count + 1 WHERE id = ?1",
                params![template_id],
            )?;
            Ok(true)
        }
    }

    fn like_status(&self, template_id: i64, user_id: Option<&str>) -> Result<Option<LikeStatus>> {
        let conn = self.conn.lock().unwrap();

        let like_count: Option<i64> = conn
            .query_row(
                "SELECT like_count FROM community_templates WHERE id = ?1",
                params![template_id],
                |row| row.get(0),
            )
            .map(Some)
            .or_else(|err| match err {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(other),
            })?;
        let like_count = match like_count {
            Some(count) => count,
            None => return Ok(None),
        };

        let is_liked = match user_id {
            Some(user_id) => {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM template_likes
                     WHERE template_id = ?1 AND user_id = ?2",
                    params![template_id, user_id],
                    |row| row.get(0),
                )?;
                count > 0
            }
            None => false,
        };

        Ok(Some(LikeStatus {
            like_count,
            is_liked,
        }))
    }

    fn template_author(&self, id: i64) -> Result<Option<String>> {
        let conn = self.conn.lock().unwrap();
        let author: Option<String> = conn
            .query_row(
                "SELECT author_id FROM community_templates WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .map(Some)
            .or_else(|err| match err {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(other),
            })?;
        Ok(author)
    }

    fn delete_template(&self, id: i64) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM template_likes WHERE template_id = ?1", params![id])?;
        conn.execute("DELETE FROM community_templates WHERE id = ?1", params![id])?;
        Ok(())
    }

    fn stats_overview(&self) -> Result<StatsOverview> {
        let conn = self.conn.lock().unwrap();

        let total_templates: i64 = conn.query_row(
            "SELECT COUNT(*) FROM community_templates WHERE is_public = 1",
            [],
            |row| row.get(0),
        )?;
        let total_likes: i64 = conn.query_row(
            "SELECT COALESCE(SUM(like_count), 0) FROM community_templates WHERE is_public = 1",
            [],
            |row| row.get(0),
        )?;
        let total_views: i64 = conn.query_row(
            "SELECT COALESCE(SUM(view_count), 0) FROM community_templates WHERE is_public = 1",
            [],
            |row| row.get(0),
        )?;

        let mut stmt = conn.prepare(
            "SELECT category, COUNT(*) as count
             FROM community_templates
             WHERE is_public = 1 AND category IS NOT NULL
             GROUP BY category
             ORDER BY count DESC",
        )?;
        let by_category = stmt
            .query_map([], |row| {
                Ok(CategoryCount {
                    category: row.get(0)?,
                    count: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let recent_activity: i64 = conn.query_row(
            "SELECT COUNT(*) FROM community_templates
             WHERE is_public = 1 AND created_at >= datetime('now', '-7 days')",
            [],
            |row| row.get(0),
        )?;

        Ok(StatsOverview {
            total_templates,
            total_likes,
            total_views,
            by_category,
            recent_activity,
        })
    }

    fn record_event(
        &self,
        template_id: i64,
        action: &str,
        user_id: Option<&str>,
        ip_address: Option<&str>,
        user_agent: Option<&str>,
    ) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO config_analytics (template_id, action, user_id, ip_address, user_agent)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![template_id, action, user_id, ip_address, user_agent],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::content_hash;

    fn author(id: &str) -> Author {
        Author {
            id: id.to_string(),
            name: Some("Test User".to_string()),
            username: Some("testuser".to_string()),
            avatar_url: None,
            profile_url: None,
        }
    }

    fn share(store: &Store, title: &str, yaml: &str, author: &Author) -> i64 {
        let hash = content_hash(title, yaml);
        store
            .create_template(&NewTemplate {
                title,
                description: None,
                emoji: "📝",
                category: Some("training"),
                yaml_content: yaml,
                filename: "dstack.yml",
                author,
                content_hash: &hash,
            })
            .unwrap()
    }

    #[test]
    fn test_create_and_fetch_template() {
        let store = Store::open_in_memory().unwrap();
        let id = share(&store, "My Task", "type: task\n", &author("u1"));

        let template = store.get_template(id).unwrap().unwrap();
        assert_eq!(template.title, "My Task");
        assert_eq!(template.like_count, 0);
        assert!(template.is_public);
    }

    #[test]
    fn test_duplicate_hash_is_found() {
        let store = Store::open_in_memory().unwrap();
        let id = share(&store, "My Task", "type: task\n", &author("u1"));

        let hash = content_hash("my task", "type:  task");
        let existing = store.find_template_by_hash(&hash).unwrap().unwrap();
        assert_eq!(existing.0, id);
        assert_eq!(existing.1, "My Task");
    }

    #[test]
    fn test_like_toggle_updates_count() {
        let store = Store::open_in_memory().unwrap();
        let id = share(&store, "T", "type: task\n", &author("u1"));
        let liker = author("u2");

        assert!(store.toggle_like(id, &liker).unwrap());
        let status = store.like_status(id, Some("u2")).unwrap().unwrap();
        assert_eq!(status.like_count, 1);
        assert!(status.is_liked);

        assert!(!store.toggle_like(id, &liker).unwrap());
        let status = store.like_status(id, Some("u2")).unwrap().unwrap();
        assert_eq!(status.like_count, 0);
        assert!(!status.is_liked);
    }

    #[test]
    fn test_like_status_for_missing_template() {
        let store = Store::open_in_memory().unwrap();
        assert!(store.like_status(99, None).unwrap().is_none());
    }

    #[test]
    fn test_list_pagination_and_sort() {
        let store = Store::open_in_memory().unwrap();
        let a = author("u1");
        for i in 0..5 {
            share(&store, &format!("T{i}"), &format!("type: task\nname: t{i}\n"), &a);
        }
        store.increment_view_count(2).unwrap();
        store.increment_view_count(2).unwrap();

        let page = store
            .list_templates(&TemplateFilter {
                page: 1,
                limit: 2,
                sort: TemplateSort::Popular,
                ..Default::default()
            })
            .unwrap();
        assert_eq!(page.templates.len(), 2);
        assert_eq!(page.templates[0].id, 2);
        assert_eq!(page.pagination.total, 5);
        assert_eq!(page.pagination.total_pages, 3);
    }

    #[test]
    fn test_list_tolerates_huge_page_number() {
        let store = Store::open_in_memory().unwrap();
        share(&store, "T", "type: task\n", &author("u1"));

        let page = store
            .list_templates(&TemplateFilter {
                page: u32::MAX,
                limit: 20,
                ..Default::default()
            })
            .unwrap();
        assert!(page.templates.is_empty());
        assert_eq!(page.pagination.total, 1);
        assert_eq!(page.pagination.current_page, u32::MAX);
    }

    #[test]
    fn test_list_filters_by_author() {
        let store = Store::open_in_memory().unwrap();
        share(&store, "A", "type: task\nname: a\n", &author("u1"));
        let mut other = author("u2");
        other.username = Some("otheruser".to_string());
        share(&store, "B", "type: task\nname: b\n", &other);

        let page = store
            .list_templates(&TemplateFilter {
                page: 1,
                limit: 20,
                author: Some("otheruser".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(page.templates.len(), 1);
        assert_eq!(page.templates[0].title, "B");
    }

    #[test]
    fn test_delete_template_removes_likes() {
        let store = Store::open_in_memory().unwrap();
        let id = share(&store, "T", "type: task\n", &author("u1"));
        store.toggle_like(id, &author("u2")).unwrap();

        store.delete_template(id).unwrap();
        assert!(store.get_template(id).unwrap().is_none());
        assert!(store.like_status(id, Some("u2")).unwrap().is_none());
    }

    #[test]
    fn test_stats_overview() {
        let store = Store::open_in_memory().unwrap();
        let a = author("u1");
        let id = share(&store, "A", "type: task\nname: a\n", &a);
        share(&store, "B", "type: task\nname: b\n", &a);
        store.toggle_like(id, &author("u2")).unwrap();
        store.increment_view_count(id).unwrap();

        let stats = store.stats_overview().unwrap();
        assert_eq!(stats.total_templates, 2);
        assert_eq!(stats.total_likes, 1);
        assert_eq!(stats.total_views, 1);
        assert_eq!(stats.by_category.len(), 1);
        assert_eq!(stats.by_category[0].count, 2);
        assert_eq!(stats.recent_activity, 2);
    }
}
