use anyhow::{Context, Result};
use sqlx::{migrate::MigrateDatabase, sqlite::SqliteRow, Row, Sqlite, SqlitePool};
use std::sync::Arc;

use shared::{Bookmark, BookmarkFields};

// The database URL for the production database
const DATABASE_URL: &str = "sqlite:bookmarks.db";

/// DbConnection manages bookmark storage operations
#[derive(Clone)]
pub struct DbConnection {
    pool: Arc<SqlitePool>,
}

impl DbConnection {
    /// Create a new database connection
    pub async fn new(url: &str) -> Result<Self> {
        // Create database if it doesn't exist
        if !Sqlite::database_exists(url).await.unwrap_or(false) {
            Sqlite::create_database(url).await?
        }

        // Connect to the database
        let pool = SqlitePool::connect(url).await?;

        // Setup database schema
        Self::setup_schema(&pool).await?;

        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    /// Initialize the standard database
    pub async fn init() -> Result<Self> {
        Self::new(DATABASE_URL).await
    }

    /// Initialize a test database with a unique name
    #[cfg(test)]
    pub async fn init_test() -> Result<Self> {
        // Generate a unique database name for tests
        let test_id = uuid::Uuid::new_v4().simple().to_string();
        let db_url = format!("sqlite:file:memdb_{}?mode=memory&cache=shared", test_id);

        Self::new(&db_url).await
    }

    /// Set up the required database schema
    async fn setup_schema(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS bookmarks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                url TEXT NOT NULL,
                rating INTEGER NOT NULL,
                description TEXT
            );
            "#,
        )
        .execute(pool)
        .await
        .context("failed to create bookmarks table")?;

        Ok(())
    }

    fn bookmark_from_row(row: &SqliteRow) -> Bookmark {
        Bookmark {
            id: row.get("id"),
            title: row.get("title"),
            url: row.get("url"),
            rating: row.get("rating"),
            description: row.get("description"),
        }
    }

    /// List all bookmarks in storage order
    pub async fn list_bookmarks(&self) -> Result<Vec<Bookmark>> {
        let rows = sqlx::query("SELECT id, title, url, rating, description FROM bookmarks")
            .fetch_all(&*self.pool)
            .await?;

        Ok(rows.iter().map(Self::bookmark_from_row).collect())
    }

    /// Retrieve a single bookmark by its id
    pub async fn get_bookmark(&self, id: i64) -> Result<Option<Bookmark>> {
        let row =
            sqlx::query("SELECT id, title, url, rating, description FROM bookmarks WHERE id = ?")
                .bind(id)
                .fetch_optional(&*self.pool)
                .await?;

        Ok(row.as_ref().map(Self::bookmark_from_row))
    }

    /// Insert a bookmark and return the stored row with its assigned id.
    /// Validation guarantees title, url and rating are present; the NOT NULL
    /// constraints backstop that contract.
    pub async fn create_bookmark(&self, fields: &BookmarkFields) -> Result<Bookmark> {
        let row = sqlx::query(
            r#"
            INSERT INTO bookmarks (title, url, rating, description)
            VALUES (?, ?, ?, ?)
            RETURNING id, title, url, rating, description
            "#,
        )
        .bind(fields.title.as_deref())
        .bind(fields.url.as_deref())
        .bind(fields.rating)
        .bind(fields.description.as_deref())
        .fetch_one(&*self.pool)
        .await
        .context("failed to insert bookmark")?;

        Ok(Self::bookmark_from_row(&row))
    }

    /// Overwrite only the provided columns of an existing bookmark.
    /// Updating an id that does not exist is a no-op; callers check
    /// existence first.
    pub async fn update_bookmark(&self, id: i64, fields: &BookmarkFields) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE bookmarks
            SET title = COALESCE(?, title),
                url = COALESCE(?, url),
                rating = COALESCE(?, rating),
                description = COALESCE(?, description)
            WHERE id = ?
            "#,
        )
        .bind(fields.title.as_deref())
        .bind(fields.url.as_deref())
        .bind(fields.rating)
        .bind(fields.description.as_deref())
        .bind(id)
        .execute(&*self.pool)
        .await?;

        Ok(())
    }

    /// Delete a bookmark by id
    pub async fn delete_bookmark(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM bookmarks WHERE id = ?")
            .bind(id)
            .execute(&*self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Setup a new test database for each test
    async fn setup_test() -> DbConnection {
        DbConnection::init_test()
            .await
            .expect("Failed to create test database")
    }

    fn google_fields() -> BookmarkFields {
        BookmarkFields {
            title: Some("Google".to_string()),
            url: Some("https://google.com".to_string()),
            rating: Some(5),
            description: Some("Search for stuff".to_string()),
        }
    }

    #[tokio::test]
    async fn test_create_and_get_bookmark() {
        let db = setup_test().await;

        let created = db
            .create_bookmark(&google_fields())
            .await
            .expect("Failed to create bookmark");

        assert_eq!(created.title, "Google");
        assert_eq!(created.url, "https://google.com");
        assert_eq!(created.rating, 5);
        assert_eq!(created.description.as_deref(), Some("Search for stuff"));

        let fetched = db
            .get_bookmark(created.id)
            .await
            .expect("Failed to get bookmark");
        assert_eq!(fetched, Some(created));
    }

    #[tokio::test]
    async fn test_get_nonexistent_bookmark() {
        let db = setup_test().await;

        let result = db.get_bookmark(42).await.expect("Query failed");
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_create_without_description() {
        let db = setup_test().await;

        let fields = BookmarkFields {
            description: None,
            ..google_fields()
        };
        let created = db
            .create_bookmark(&fields)
            .await
            .expect("Failed to create bookmark");

        assert!(created.description.is_none());
    }

    #[tokio::test]
    async fn test_ids_are_assigned_in_insertion_order() {
        let db = setup_test().await;

        let first = db.create_bookmark(&google_fields()).await.unwrap();
        let second = db.create_bookmark(&google_fields()).await.unwrap();

        assert!(second.id > first.id);
    }

    #[tokio::test]
    async fn test_list_bookmarks() {
        let db = setup_test().await;

        // Initially empty
        let empty = db.list_bookmarks().await.expect("Failed to list");
        assert!(empty.is_empty());

        db.create_bookmark(&google_fields()).await.unwrap();
        db.create_bookmark(&BookmarkFields {
            title: Some("Facebook".to_string()),
            url: Some("https://facebook.com".to_string()),
            rating: Some(4),
            description: Some("Poke people".to_string()),
        })
        .await
        .unwrap();

        let all = db.list_bookmarks().await.expect("Failed to list");
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].title, "Google");
        assert_eq!(all[1].title, "Facebook");
    }

    #[tokio::test]
    async fn test_update_overwrites_only_provided_columns() {
        let db = setup_test().await;
        let created = db.create_bookmark(&google_fields()).await.unwrap();

        let patch = BookmarkFields {
            rating: Some(1),
            ..Default::default()
        };
        db.update_bookmark(created.id, &patch)
            .await
            .expect("Failed to update bookmark");

        let updated = db.get_bookmark(created.id).await.unwrap().unwrap();
        assert_eq!(updated.rating, 1);
        assert_eq!(updated.title, created.title);
        assert_eq!(updated.url, created.url);
        assert_eq!(updated.description, created.description);
    }

    #[tokio::test]
    async fn test_update_nonexistent_is_noop() {
        let db = setup_test().await;

        let patch = BookmarkFields {
            title: Some("Nothing".to_string()),
            ..Default::default()
        };
        db.update_bookmark(999, &patch)
            .await
            .expect("Update of missing row should not error");

        assert!(db.list_bookmarks().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_bookmark() {
        let db = setup_test().await;
        let created = db.create_bookmark(&google_fields()).await.unwrap();

        let deleted = db
            .delete_bookmark(created.id)
            .await
            .expect("Failed to delete bookmark");
        assert!(deleted, "Bookmark should have been deleted");

        let gone = db.get_bookmark(created.id).await.unwrap();
        assert!(gone.is_none());

        // Deleting again reports nothing removed
        let deleted_again = db.delete_bookmark(created.id).await.unwrap();
        assert!(!deleted_again);
    }
}
