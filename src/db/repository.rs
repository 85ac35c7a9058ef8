use rusqlite::{params, Row};
use tokio_rusqlite::Connection;

use crate::error::Result;
use crate::models::{App, Review};

use super::schema::SCHEMA;

/// Persistent entry store. `has_reviews` is never stored as a column; it is
/// derived from whether any review rows are attached to the app, so the flag
/// can never drift out of sync with the review set.
pub struct Repository {
    conn: Connection,
}

impl Repository {
    pub async fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path).await?;

        conn.call(|conn| {
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await?;

        Ok(Self { conn })
    }

    // App operations

    pub async fn insert_app(&self, application_url: String) -> Result<i64> {
        let id = self
            .conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO apps (application_url) VALUES (?1)",
                    params![application_url],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await?;
        Ok(id)
    }

    /// All apps with no harvested reviews, in stable insertion order.
    /// A single ordered scan: no app is skipped or returned twice however
    /// large the table is.
    pub async fn apps_without_reviews(&self) -> Result<Vec<App>> {
        let apps = self
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare(
                    r#"SELECT a.id, a.app_id, a.application_url,
                              EXISTS(SELECT 1 FROM reviews r WHERE r.app_id = a.app_id)
                       FROM apps a
                       WHERE NOT EXISTS(SELECT 1 FROM reviews r WHERE r.app_id = a.app_id)
                       ORDER BY a.id"#,
                )?;
                let apps = stmt
                    .query_map([], |row| Ok(app_from_row(row)))?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(apps)
            })
            .await?;
        Ok(apps)
    }

    /// Write-through of a derived app id, so a crash after derivation does
    /// not lose it.
    pub async fn set_app_id(&self, id: i64, app_id: i64) -> Result<()> {
        self.conn
            .call(move |conn| {
                conn.execute(
                    "UPDATE apps SET app_id = ?1, updated_at = datetime('now') WHERE id = ?2",
                    params![app_id, id],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    // Review operations

    /// Replace the app's entire review set in one transaction. Running this
    /// twice with the same input leaves the store unchanged; duplicate
    /// review ids within the input collapse to one row.
    pub async fn replace_reviews(&self, app_id: i64, reviews: Vec<Review>) -> Result<()> {
        self.conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                tx.execute("DELETE FROM reviews WHERE app_id = ?1", params![app_id])?;
                {
                    let mut stmt = tx.prepare(
                        r#"INSERT OR REPLACE INTO reviews
                           (review_id, app_id, app_version, author_id, author_name, rating, title, content)
                           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"#,
                    )?;
                    for review in &reviews {
                        stmt.execute(params![
                            review.review_id,
                            review.app_id,
                            review.app_version,
                            review.author_id,
                            review.author_name,
                            review.rating,
                            review.title,
                            review.content,
                        ])?;
                    }
                }
                tx.commit()?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    pub async fn has_reviews(&self, app_id: i64) -> Result<bool> {
        let exists = self
            .conn
            .call(move |conn| {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM reviews WHERE app_id = ?1",
                    params![app_id],
                    |row| row.get(0),
                )?;
                Ok(count > 0)
            })
            .await?;
        Ok(exists)
    }

    pub async fn reviews_for_app(&self, app_id: i64) -> Result<Vec<Review>> {
        let reviews = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    r#"SELECT review_id, app_id, app_version, author_id, author_name,
                              rating, title, content
                       FROM reviews WHERE app_id = ?1 ORDER BY review_id"#,
                )?;
                let reviews = stmt
                    .query_map(params![app_id], |row| Ok(review_from_row(row)))?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(reviews)
            })
            .await?;
        Ok(reviews)
    }
}

fn app_from_row(row: &Row) -> App {
    App {
        id: row.get(0).unwrap(),
        app_id: row.get(1).unwrap(),
        application_url: row.get(2).unwrap(),
        has_reviews: row.get::<_, i64>(3).unwrap() != 0,
    }
}

fn review_from_row(row: &Row) -> Review {
    Review {
        review_id: row.get(0).unwrap(),
        app_id: row.get(1).unwrap(),
        app_version: row.get(2).unwrap(),
        author_id: row.get(3).unwrap(),
        author_name: row.get(4).unwrap(),
        rating: row.get(5).unwrap(),
        title: row.get(6).unwrap(),
        content: row.get(7).unwrap(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn repo() -> (tempfile::TempDir, Repository) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");
        let repo = Repository::new(path.to_str().unwrap()).await.unwrap();
        (dir, repo)
    }

    fn review(review_id: i64, app_id: i64) -> Review {
        Review {
            review_id,
            app_id,
            app_version: "1.0".to_string(),
            author_id: 7,
            author_name: "someone".to_string(),
            rating: 5,
            title: "title".to_string(),
            content: "content".to_string(),
        }
    }

    #[tokio::test]
    async fn apps_without_reviews_excludes_harvested() {
        let (_dir, repo) = repo().await;
        let a = repo.insert_app("https://store/app/id=1/x".to_string()).await.unwrap();
        let b = repo.insert_app("https://store/app/id=2/x".to_string()).await.unwrap();
        repo.set_app_id(a, 1).await.unwrap();
        repo.set_app_id(b, 2).await.unwrap();

        repo.replace_reviews(1, vec![review(100, 1)]).await.unwrap();

        let pending = repo.apps_without_reviews().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].app_id, Some(2));
        assert!(!pending[0].has_reviews);
    }

    #[tokio::test]
    async fn replace_reviews_is_idempotent() {
        let (_dir, repo) = repo().await;
        let id = repo.insert_app("https://store/app/id=42/x".to_string()).await.unwrap();
        repo.set_app_id(id, 42).await.unwrap();

        let set = vec![review(1, 42), review(2, 42), review(3, 42)];
        repo.replace_reviews(42, set.clone()).await.unwrap();
        let first = repo.reviews_for_app(42).await.unwrap();
        repo.replace_reviews(42, set).await.unwrap();
        let second = repo.reviews_for_app(42).await.unwrap();

        assert_eq!(first.len(), 3);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn replace_reviews_overwrites_prior_set() {
        let (_dir, repo) = repo().await;
        let id = repo.insert_app("https://store/app/id=42/x".to_string()).await.unwrap();
        repo.set_app_id(id, 42).await.unwrap();

        repo.replace_reviews(42, vec![review(1, 42), review(2, 42)]).await.unwrap();
        repo.replace_reviews(42, vec![review(3, 42)]).await.unwrap();

        let stored = repo.reviews_for_app(42).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].review_id, 3);
    }

    #[tokio::test]
    async fn has_reviews_derives_from_review_rows() {
        let (_dir, repo) = repo().await;
        let id = repo.insert_app("https://store/app/id=42/x".to_string()).await.unwrap();
        repo.set_app_id(id, 42).await.unwrap();

        assert!(!repo.has_reviews(42).await.unwrap());
        repo.replace_reviews(42, vec![review(1, 42)]).await.unwrap();
        assert!(repo.has_reviews(42).await.unwrap());
    }
}
