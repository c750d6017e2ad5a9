//! SQLite persistence for ingested records. Two append-only tables keyed by
//! source URL; collisions on insert are a normal outcome, not an error.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};

use threatwire_common::{NewAttack, NewVictim, NewsItem, RecordKind, Result, ThreatwireError};

#[derive(Clone)]
pub struct RecordStore {
    pool: SqlitePool,
}

impl RecordStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .map_err(|e| ThreatwireError::Database(e.to_string()))?;
        Ok(Self { pool })
    }

    /// In-memory store for tests and dry runs. Single connection, since each
    /// `:memory:` connection is otherwise its own database.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| ThreatwireError::Database(e.to_string()))?;
        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Run the embedded SQL migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| ThreatwireError::Database(e.to_string()))?;
        Ok(())
    }

    /// Insert a victim record unless its URL is already stored.
    /// Returns whether a new row was actually created.
    pub async fn insert_victim_if_absent(&self, v: &NewVictim) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO victims
                (url, title, country, activity, group_name, discovered,
                 published, description, summary, generated_title, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&v.url)
        .bind(&v.title)
        .bind(&v.country)
        .bind(&v.activity)
        .bind(&v.group_name)
        .bind(&v.discovered)
        .bind(&v.published)
        .bind(&v.description)
        .bind(&v.summary)
        .bind(&v.generated_title)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| ThreatwireError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    /// Insert a cyberattack record unless its URL is already stored.
    pub async fn insert_attack_if_absent(&self, a: &NewAttack) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO cyberattacks
                (url, title, date, description, summary, generated_title, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&a.url)
        .bind(&a.title)
        .bind(&a.date)
        .bind(&a.description)
        .bind(&a.summary)
        .bind(&a.generated_title)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| ThreatwireError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    /// Every stored URL for a kind. Recomputed at the start of each ingest
    /// cycle as a pre-filter; the UNIQUE constraint stays authoritative.
    pub async fn existing_urls(&self, kind: RecordKind) -> Result<HashSet<String>> {
        let sql = match kind {
            RecordKind::Victim => "SELECT url FROM victims",
            RecordKind::Cyberattack => "SELECT url FROM cyberattacks",
        };

        let urls: Vec<String> = sqlx::query_scalar(sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| ThreatwireError::Database(e.to_string()))?;

        Ok(urls.into_iter().collect())
    }

    /// Merge both kinds, newest first, truncated to `limit`. Victims carry
    /// country and group; attacks leave them empty. A generated title wins
    /// over the raw one when present.
    pub async fn recent_items(&self, limit: u32) -> Result<Vec<NewsItem>> {
        let rows = sqlx::query(
            r#"
            SELECT 'victim' AS kind, url, COALESCE(generated_title, title) AS title,
                   summary, created_at, country, group_name
            FROM victims
            UNION ALL
            SELECT 'cyberattack' AS kind, url, COALESCE(generated_title, title) AS title,
                   summary, created_at, NULL, NULL
            FROM cyberattacks
            ORDER BY created_at DESC
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| ThreatwireError::Database(e.to_string()))?;

        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            items.push(NewsItem {
                kind: row
                    .try_get("kind")
                    .map_err(|e| ThreatwireError::Database(e.to_string()))?,
                url: row
                    .try_get("url")
                    .map_err(|e| ThreatwireError::Database(e.to_string()))?,
                title: row
                    .try_get("title")
                    .map_err(|e| ThreatwireError::Database(e.to_string()))?,
                summary: row
                    .try_get("summary")
                    .map_err(|e| ThreatwireError::Database(e.to_string()))?,
                created_at: row
                    .try_get("created_at")
                    .map_err(|e| ThreatwireError::Database(e.to_string()))?,
                country: row
                    .try_get("country")
                    .map_err(|e| ThreatwireError::Database(e.to_string()))?,
                group_name: row
                    .try_get("group_name")
                    .map_err(|e| ThreatwireError::Database(e.to_string()))?,
            });
        }
        Ok(items)
    }

    /// Row count and latest created_at watermark for a kind.
    pub async fn stats(&self, kind: RecordKind) -> Result<(i64, Option<DateTime<Utc>>)> {
        let sql = match kind {
            RecordKind::Victim => "SELECT COUNT(*), MAX(created_at) FROM victims",
            RecordKind::Cyberattack => "SELECT COUNT(*), MAX(created_at) FROM cyberattacks",
        };

        let row: (i64, Option<DateTime<Utc>>) = sqlx::query_as(sql)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| ThreatwireError::Database(e.to_string()))?;

        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn victim(url: &str, title: &str) -> NewVictim {
        NewVictim {
            url: url.to_string(),
            title: title.to_string(),
            country: "CN".to_string(),
            activity: "Financial Services".to_string(),
            group_name: "blackcat".to_string(),
            discovered: "2025-01-01".to_string(),
            published: "2025-01-02".to_string(),
            description: "test".to_string(),
            summary: "summary text".to_string(),
            generated_title: None,
        }
    }

    fn attack(url: &str, title: &str) -> NewAttack {
        NewAttack {
            url: url.to_string(),
            title: title.to_string(),
            date: "2025-01-01".to_string(),
            description: "test".to_string(),
            summary: "summary text".to_string(),
            generated_title: None,
        }
    }

    #[tokio::test]
    async fn insert_is_idempotent_per_url() {
        let store = RecordStore::in_memory().await.unwrap();

        assert!(store
            .insert_victim_if_absent(&victim("https://example.com/v/1", "Acme"))
            .await
            .unwrap());
        assert!(!store
            .insert_victim_if_absent(&victim("https://example.com/v/1", "Acme"))
            .await
            .unwrap());

        let (count, _) = store.stats(RecordKind::Victim).await.unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn existing_urls_projects_identity_column() {
        let store = RecordStore::in_memory().await.unwrap();
        store
            .insert_victim_if_absent(&victim("https://example.com/v/1", "Acme"))
            .await
            .unwrap();
        store
            .insert_attack_if_absent(&attack("https://example.com/a/1", "Breach"))
            .await
            .unwrap();

        let victims = store.existing_urls(RecordKind::Victim).await.unwrap();
        assert!(victims.contains("https://example.com/v/1"));
        assert!(!victims.contains("https://example.com/a/1"));

        let attacks = store.existing_urls(RecordKind::Cyberattack).await.unwrap();
        assert!(attacks.contains("https://example.com/a/1"));
    }

    #[tokio::test]
    async fn recent_items_merges_kinds_newest_first() {
        let store = RecordStore::in_memory().await.unwrap();

        store
            .insert_victim_if_absent(&victim("https://example.com/v/1", "First"))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        store
            .insert_attack_if_absent(&attack("https://example.com/a/1", "Second"))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        store
            .insert_victim_if_absent(&victim("https://example.com/v/2", "Third"))
            .await
            .unwrap();

        let items = store.recent_items(2).await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "Third");
        assert_eq!(items[1].title, "Second");
        assert_eq!(items[0].kind, "victim");
        assert_eq!(items[1].kind, "cyberattack");
        assert!(items[0].created_at > items[1].created_at);

        // Attacks carry no country/group
        assert_eq!(items[1].country, None);
        assert_eq!(items[1].group_name, None);
    }

    #[tokio::test]
    async fn generated_title_wins_over_raw_title() {
        let store = RecordStore::in_memory().await.unwrap();

        let mut v = victim("https://example.com/v/1", "Raw Name");
        v.generated_title = Some("Punchy Headline".to_string());
        store.insert_victim_if_absent(&v).await.unwrap();

        let items = store.recent_items(10).await.unwrap();
        assert_eq!(items[0].title, "Punchy Headline");
    }

    #[tokio::test]
    async fn stats_reports_count_and_watermark() {
        let store = RecordStore::in_memory().await.unwrap();

        let (count, latest) = store.stats(RecordKind::Victim).await.unwrap();
        assert_eq!(count, 0);
        assert!(latest.is_none());

        store
            .insert_victim_if_absent(&victim("https://example.com/v/1", "Acme"))
            .await
            .unwrap();

        let (count, latest) = store.stats(RecordKind::Victim).await.unwrap();
        assert_eq!(count, 1);
        assert!(latest.is_some());
    }
}
