/// Comment model and database operations
///
/// Comments form a forest per issue: roots have no parent and depth 0, a
/// reply sits one level below its parent. Deleting a comment removes its
/// whole subtree through the `parent_id` cascade.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE comments (
///     id INTEGER PRIMARY KEY AUTOINCREMENT,
///     user_name TEXT NOT NULL REFERENCES users(name) ON DELETE CASCADE,
///     text TEXT NOT NULL,
///     issue_id INTEGER NOT NULL REFERENCES issues(id) ON DELETE CASCADE,
///     parent_id INTEGER REFERENCES comments(id) ON DELETE CASCADE,
///     depth INTEGER NOT NULL DEFAULT 0 CHECK (depth >= 0),
///     created_at TEXT NOT NULL,
///     updated_at TEXT NOT NULL
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

/// Comment record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: i64,
    /// Author
    pub user_name: String,
    pub text: String,
    pub issue_id: i64,
    pub parent_id: Option<i64>,
    pub depth: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for writing a comment
///
/// `depth` is computed by the caller from the parent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateComment {
    pub user_name: String,
    pub text: String,
    pub issue_id: i64,
    pub parent_id: Option<i64>,
    pub depth: i64,
}

const COMMENT_COLUMNS: &str =
    "id, user_name, text, issue_id, parent_id, depth, created_at, updated_at";

impl Comment {
    pub async fn create(pool: &SqlitePool, data: CreateComment) -> Result<Self, sqlx::Error> {
        let comment = sqlx::query_as::<_, Comment>(&format!(
            r#"
            INSERT INTO comments (user_name, text, issue_id, parent_id, depth, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
            RETURNING {COMMENT_COLUMNS}
            "#
        ))
        .bind(data.user_name)
        .bind(data.text)
        .bind(data.issue_id)
        .bind(data.parent_id)
        .bind(data.depth)
        .bind(Utc::now())
        .fetch_one(pool)
        .await?;

        Ok(comment)
    }

    pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        let comment = sqlx::query_as::<_, Comment>(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(comment)
    }

    /// Replaces the body and refreshes `updated_at`
    pub async fn update_text(
        pool: &SqlitePool,
        id: i64,
        text: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let comment = sqlx::query_as::<_, Comment>(&format!(
            "UPDATE comments SET text = ?, updated_at = ? WHERE id = ? RETURNING {COMMENT_COLUMNS}"
        ))
        .bind(text)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(comment)
    }

    /// Deletes the comment and every reply below it
    pub async fn delete(pool: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// All comments on an issue in creation order
    pub async fn list_for_issue(pool: &SqlitePool, issue_id: i64) -> Result<Vec<Self>, sqlx::Error> {
        let comments = sqlx::query_as::<_, Comment>(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE issue_id = ? ORDER BY created_at, id"
        ))
        .bind(issue_id)
        .fetch_all(pool)
        .await?;

        Ok(comments)
    }

    pub async fn count(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments")
            .fetch_one(pool)
            .await?;

        Ok(count)
    }
}
