/// Project model and database operations
///
/// A project groups issues. Its creator is recorded once and never changes;
/// the membership set (see [`crate::models::membership`]) is seeded with the
/// creator and may change afterwards.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE projects (
///     id INTEGER PRIMARY KEY AUTOINCREMENT,
///     title TEXT NOT NULL CHECK (length(title) <= 64),
///     summary TEXT NOT NULL CHECK (length(summary) <= 1024),
///     created_on TEXT NOT NULL,
///     created_by TEXT NOT NULL REFERENCES users(name) ON DELETE CASCADE,
///     modified_on TEXT NOT NULL,
///     modified_by TEXT NOT NULL REFERENCES users(name) ON DELETE CASCADE,
///     visits INTEGER NOT NULL DEFAULT 0
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::models::membership::{Assignable, Membership};

/// Maximum title length in characters
pub const TITLE_MAX_CHARS: usize = 64;

/// Maximum summary length in characters
pub const SUMMARY_MAX_CHARS: usize = 1024;

/// Project record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Project {
    pub id: i64,
    pub title: String,
    pub summary: String,
    pub created_on: DateTime<Utc>,
    pub created_by: String,
    pub modified_on: DateTime<Utc>,
    pub modified_by: String,
    pub visits: i64,
}

/// Input for creating a project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProject {
    pub title: String,
    pub summary: String,
    /// Creator, also recorded as first modifier and first member
    pub created_by: String,
}

/// Input for updating a project's editable fields
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateProject {
    pub title: String,
    pub summary: String,
    pub modified_by: String,
}

pub(crate) const PROJECT_COLUMNS: &str =
    "id, title, summary, created_on, created_by, modified_on, modified_by, visits";

impl Project {
    /// Inserts a project and adds its creator to the membership set
    ///
    /// Both writes commit together or not at all.
    pub async fn create(pool: &SqlitePool, data: CreateProject) -> Result<Self, sqlx::Error> {
        let now = Utc::now();
        let mut tx = pool.begin().await?;

        let project = sqlx::query_as::<_, Project>(&format!(
            r#"
            INSERT INTO projects (title, summary, created_on, created_by, modified_on, modified_by)
            VALUES (?1, ?2, ?3, ?4, ?3, ?4)
            RETURNING {PROJECT_COLUMNS}
            "#
        ))
        .bind(&data.title)
        .bind(&data.summary)
        .bind(now)
        .bind(&data.created_by)
        .fetch_one(&mut *tx)
        .await?;

        Membership::add_with(&mut *tx, Assignable::Project(project.id), &data.created_by).await?;

        tx.commit().await?;
        Ok(project)
    }

    /// Finds a project by id
    pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        let project = sqlx::query_as::<_, Project>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(project)
    }

    /// Replaces title and summary, stamping the modifier
    pub async fn update(
        pool: &SqlitePool,
        id: i64,
        data: UpdateProject,
    ) -> Result<Option<Self>, sqlx::Error> {
        let project = sqlx::query_as::<_, Project>(&format!(
            r#"
            UPDATE projects
            SET title = ?, summary = ?, modified_by = ?, modified_on = ?
            WHERE id = ?
            RETURNING {PROJECT_COLUMNS}
            "#
        ))
        .bind(data.title)
        .bind(data.summary)
        .bind(data.modified_by)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(project)
    }

    /// Stamps the modifier without touching other fields
    pub async fn touch(pool: &SqlitePool, id: i64, modified_by: &str) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE projects SET modified_by = ?, modified_on = ? WHERE id = ?")
                .bind(modified_by)
                .bind(Utc::now())
                .bind(id)
                .execute(pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes a project with its issues, comments and memberships
    pub async fn delete(pool: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM projects WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Increments the visit counter and returns the updated row
    pub async fn record_visit(pool: &SqlitePool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        let project = sqlx::query_as::<_, Project>(&format!(
            "UPDATE projects SET visits = visits + 1 WHERE id = ? RETURNING {PROJECT_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(project)
    }

    /// Number of issues filed against the project
    pub async fn issue_count(pool: &SqlitePool, id: i64) -> Result<i64, sqlx::Error> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM issues WHERE project_id = ?")
            .bind(id)
            .fetch_one(pool)
            .await?;

        Ok(count)
    }

    /// Counts all projects
    pub async fn count(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM projects")
            .fetch_one(pool)
            .await?;

        Ok(count)
    }
}
