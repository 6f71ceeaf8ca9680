/// Issue model and database operations
///
/// An issue belongs to exactly one project for its whole life. It has a
/// status (Open/Closed), a priority, a visit counter with the time of the
/// last visit, and its own membership set seeded with the creator.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE issues (
///     id INTEGER PRIMARY KEY AUTOINCREMENT,
///     title TEXT NOT NULL CHECK (length(title) <= 64),
///     project_id INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     summary TEXT NOT NULL,
///     status TEXT NOT NULL DEFAULT 'Open' CHECK (status IN ('Open', 'Closed')),
///     priority INTEGER NOT NULL DEFAULT 1 CHECK (priority IN (1, 2, 3)),
///     created_on TEXT NOT NULL,
///     created_by TEXT NOT NULL REFERENCES users(name) ON DELETE CASCADE,
///     modified_on TEXT NOT NULL,
///     modified_by TEXT NOT NULL REFERENCES users(name) ON DELETE CASCADE,
///     visits INTEGER NOT NULL DEFAULT 0,
///     last_visit TEXT NOT NULL,
///     closed_by TEXT REFERENCES users(name) ON DELETE SET NULL
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::models::membership::{Assignable, Membership};

/// Maximum title length in characters
pub const TITLE_MAX_CHARS: usize = 64;

/// Issue status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum IssueStatus {
    Open,
    Closed,
}

impl IssueStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueStatus::Open => "Open",
            IssueStatus::Closed => "Closed",
        }
    }
}

impl Default for IssueStatus {
    fn default() -> Self {
        IssueStatus::Open
    }
}

/// Issue priority, stored as its numeric level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[repr(i32)]
pub enum Priority {
    Low = 1,
    Medium = 2,
    High = 3,
}

impl Priority {
    pub fn level(&self) -> i32 {
        *self as i32
    }

    /// Parses the numeric level (1..=3)
    pub fn from_level(level: i32) -> Option<Self> {
        match level {
            1 => Some(Priority::Low),
            2 => Some(Priority::Medium),
            3 => Some(Priority::High),
            _ => None,
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Low
    }
}

/// Issue record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Issue {
    pub id: i64,
    pub title: String,
    pub project_id: i64,
    pub summary: String,
    pub status: IssueStatus,
    pub priority: Priority,
    pub created_on: DateTime<Utc>,
    pub created_by: String,
    pub modified_on: DateTime<Utc>,
    pub modified_by: String,
    pub visits: i64,
    pub last_visit: DateTime<Utc>,
    pub closed_by: Option<String>,
}

/// Input for filing an issue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateIssue {
    pub project_id: i64,
    pub title: String,
    pub summary: String,
    pub priority: Priority,
    pub created_by: String,
}

/// Input for updating an issue's editable fields
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateIssue {
    pub title: String,
    pub summary: String,
    pub priority: Priority,
    pub modified_by: String,
}

pub(crate) const ISSUE_COLUMNS: &str = "id, title, project_id, summary, status, priority, \
                                        created_on, created_by, modified_on, modified_by, \
                                        visits, last_visit, closed_by";

impl Issue {
    /// Inserts an Open issue and adds its creator to the membership set
    pub async fn create(pool: &SqlitePool, data: CreateIssue) -> Result<Self, sqlx::Error> {
        let now = Utc::now();
        let mut tx = pool.begin().await?;

        let issue = sqlx::query_as::<_, Issue>(&format!(
            r#"
            INSERT INTO issues (title, project_id, summary, status, priority,
                                created_on, created_by, modified_on, modified_by, last_visit)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?6, ?7, ?6)
            RETURNING {ISSUE_COLUMNS}
            "#
        ))
        .bind(&data.title)
        .bind(data.project_id)
        .bind(&data.summary)
        .bind(IssueStatus::Open)
        .bind(data.priority)
        .bind(now)
        .bind(&data.created_by)
        .fetch_one(&mut *tx)
        .await?;

        Membership::add_with(&mut *tx, Assignable::Issue(issue.id), &data.created_by).await?;

        tx.commit().await?;
        Ok(issue)
    }

    /// Finds an issue by id
    pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        let issue = sqlx::query_as::<_, Issue>(&format!(
            "SELECT {ISSUE_COLUMNS} FROM issues WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(issue)
    }

    /// Replaces title, summary and priority, stamping the modifier
    pub async fn update(
        pool: &SqlitePool,
        id: i64,
        data: UpdateIssue,
    ) -> Result<Option<Self>, sqlx::Error> {
        let issue = sqlx::query_as::<_, Issue>(&format!(
            r#"
            UPDATE issues
            SET title = ?, summary = ?, priority = ?, modified_by = ?, modified_on = ?
            WHERE id = ?
            RETURNING {ISSUE_COLUMNS}
            "#
        ))
        .bind(data.title)
        .bind(data.summary)
        .bind(data.priority)
        .bind(data.modified_by)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(issue)
    }

    /// Stamps the modifier without touching other fields
    pub async fn touch(pool: &SqlitePool, id: i64, modified_by: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE issues SET modified_by = ?, modified_on = ? WHERE id = ?")
            .bind(modified_by)
            .bind(Utc::now())
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Moves the issue to `status` if it is not already there
    ///
    /// Closing records `actor` as the closer, opening clears it. Returns None
    /// when the issue is missing or already has the requested status; in that
    /// case nothing is written.
    pub async fn set_status(
        pool: &SqlitePool,
        id: i64,
        status: IssueStatus,
        actor: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let issue = sqlx::query_as::<_, Issue>(&format!(
            r#"
            UPDATE issues
            SET status = ?1,
                closed_by = CASE WHEN ?1 = 'Closed' THEN ?2 ELSE NULL END,
                modified_by = ?2,
                modified_on = ?3
            WHERE id = ?4 AND status <> ?1
            RETURNING {ISSUE_COLUMNS}
            "#
        ))
        .bind(status)
        .bind(actor)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(issue)
    }

    /// Deletes an issue with its comments and memberships
    pub async fn delete(pool: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM issues WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Increments the visit counter, sets `last_visit` and returns the updated row
    pub async fn record_visit(pool: &SqlitePool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        let issue = sqlx::query_as::<_, Issue>(&format!(
            r#"
            UPDATE issues SET visits = visits + 1, last_visit = ?
            WHERE id = ?
            RETURNING {ISSUE_COLUMNS}
            "#
        ))
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(issue)
    }

    /// Number of comments on the issue, replies included
    pub async fn comment_count(pool: &SqlitePool, id: i64) -> Result<i64, sqlx::Error> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE issue_id = ?")
            .bind(id)
            .fetch_one(pool)
            .await?;

        Ok(count)
    }

    /// Counts all issues
    pub async fn count(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM issues")
            .fetch_one(pool)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_pool;
    use crate::models::project::{CreateProject, Project};
    use crate::models::user::{CreateUser, User};

    async fn seed() -> (SqlitePool, i64) {
        let pool = memory_pool().await.unwrap();
        for name in ["alice", "bob"] {
            User::create(&pool, CreateUser::regular(name, format!("{name}@example.org"), "h"))
                .await
                .unwrap();
        }
        let project = Project::create(
            &pool,
            CreateProject {
                title: "Tracker".into(),
                summary: "Bugs".into(),
                created_by: "alice".into(),
            },
        )
        .await
        .unwrap();
        (pool, project.id)
    }

    fn new_issue(project_id: i64, creator: &str) -> CreateIssue {
        CreateIssue {
            project_id,
            title: "Crash".into(),
            summary: "It crashes".into(),
            priority: Priority::High,
            created_by: creator.into(),
        }
    }

    #[test]
    fn test_priority_levels() {
        assert_eq!(Priority::Low.level(), 1);
        assert_eq!(Priority::High.level(), 3);
        assert_eq!(Priority::from_level(2), Some(Priority::Medium));
        assert_eq!(Priority::from_level(4), None);
        assert_eq!(Priority::default(), Priority::Low);
        assert!(Priority::High > Priority::Medium);
    }

    #[test]
    fn test_status_default_is_open() {
        assert_eq!(IssueStatus::default(), IssueStatus::Open);
        assert_eq!(IssueStatus::Closed.as_str(), "Closed");
    }

    #[tokio::test]
    async fn test_create_defaults() {
        let (pool, project_id) = seed().await;
        let issue = Issue::create(&pool, new_issue(project_id, "bob")).await.unwrap();

        assert_eq!(issue.status, IssueStatus::Open);
        assert_eq!(issue.priority, Priority::High);
        assert_eq!(issue.modified_by, "bob");
        assert!(issue.closed_by.is_none());
        assert!(Membership::is_member(&pool, Assignable::Issue(issue.id), "bob")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_set_status_round_trip_and_no_op() {
        let (pool, project_id) = seed().await;
        let issue = Issue::create(&pool, new_issue(project_id, "alice")).await.unwrap();

        let closed = Issue::set_status(&pool, issue.id, IssueStatus::Closed, "bob")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(closed.status, IssueStatus::Closed);
        assert_eq!(closed.closed_by.as_deref(), Some("bob"));
        assert_eq!(closed.modified_by, "bob");

        // same-status transition writes nothing
        assert!(Issue::set_status(&pool, issue.id, IssueStatus::Closed, "alice")
            .await
            .unwrap()
            .is_none());
        let unchanged = Issue::find_by_id(&pool, issue.id).await.unwrap().unwrap();
        assert_eq!(unchanged.modified_on, closed.modified_on);
        assert_eq!(unchanged.closed_by.as_deref(), Some("bob"));

        let reopened = Issue::set_status(&pool, issue.id, IssueStatus::Open, "alice")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reopened.status, IssueStatus::Open);
        assert!(reopened.closed_by.is_none());
    }

    #[tokio::test]
    async fn test_closer_deletion_clears_closed_by() {
        let (pool, project_id) = seed().await;
        let issue = Issue::create(&pool, new_issue(project_id, "alice")).await.unwrap();
        Issue::set_status(&pool, issue.id, IssueStatus::Closed, "bob").await.unwrap();

        // modified_by cascades on user deletion, so alice modifies last
        assert!(Issue::touch(&pool, issue.id, "alice").await.unwrap());
        User::delete(&pool, "bob").await.unwrap();

        let issue = Issue::find_by_id(&pool, issue.id).await.unwrap().unwrap();
        assert_eq!(issue.status, IssueStatus::Closed);
        assert!(issue.closed_by.is_none());
    }

    #[tokio::test]
    async fn test_record_visit_sets_last_visit() {
        let (pool, project_id) = seed().await;
        let issue = Issue::create(&pool, new_issue(project_id, "alice")).await.unwrap();

        let before = Utc::now();
        let visited = Issue::record_visit(&pool, issue.id).await.unwrap().unwrap();
        assert_eq!(visited.visits, 1);
        assert!(visited.last_visit >= before);
        assert!((Utc::now() - visited.last_visit).num_seconds() < 1);
    }

    #[tokio::test]
    async fn test_project_deletion_cascades() {
        let (pool, project_id) = seed().await;
        Issue::create(&pool, new_issue(project_id, "alice")).await.unwrap();
        assert_eq!(Project::issue_count(&pool, project_id).await.unwrap(), 1);

        Project::delete(&pool, project_id).await.unwrap();
        assert_eq!(Issue::count(&pool).await.unwrap(), 0);
    }
}
