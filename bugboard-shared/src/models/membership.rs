/// Membership model and database operations
///
/// Projects and issues each carry a set of assigned users. The two sets live
/// in separate tables with the same shape, so every operation here takes an
/// [`Assignable`] naming which set it works on.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE project_members (
///     project_id INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     user_name TEXT NOT NULL REFERENCES users(name) ON DELETE CASCADE,
///     added_on TEXT NOT NULL,
///     PRIMARY KEY (project_id, user_name)
/// );
/// -- issue_members: same columns, keyed by issue_id
/// ```
///
/// # Invariant
///
/// A set is never emptied through [`Membership::remove_unless_last`]: the
/// count check and the delete run as one statement, so two concurrent
/// removals cannot both succeed on a two-member set.
///
/// # Example
///
/// ```no_run
/// use bugboard_shared::models::membership::{Assignable, Membership};
///
/// # async fn example(pool: sqlx::SqlitePool) -> Result<(), sqlx::Error> {
/// let project = Assignable::Project(1);
/// Membership::add(&pool, project, "chondosha").await?;
/// let is_member = Membership::is_member(&pool, project, "chondosha").await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Sqlite, SqlitePool};

/// Entity that owns a membership set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum Assignable {
    Project(i64),
    Issue(i64),
}

impl Assignable {
    pub fn id(&self) -> i64 {
        match self {
            Assignable::Project(id) | Assignable::Issue(id) => *id,
        }
    }

    fn table(&self) -> &'static str {
        match self {
            Assignable::Project(_) => "project_members",
            Assignable::Issue(_) => "issue_members",
        }
    }

    fn key_column(&self) -> &'static str {
        match self {
            Assignable::Project(_) => "project_id",
            Assignable::Issue(_) => "issue_id",
        }
    }
}

/// One row of a membership set
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Membership {
    pub user_name: String,
    pub added_on: DateTime<Utc>,
}

/// Outcome of a removal attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    /// The user was removed
    Removed,
    /// The user was the only member and stays
    LastMember,
    /// The user was not a member
    NotMember,
}

impl Membership {
    /// Adds a user to the set
    ///
    /// Adding an existing member is a no-op. Returns true if a row was inserted.
    pub async fn add(
        pool: &SqlitePool,
        target: Assignable,
        user_name: &str,
    ) -> Result<bool, sqlx::Error> {
        Self::add_with(pool, target, user_name).await
    }

    /// Same as [`Membership::add`] but on any executor, so creation flows can
    /// seed the creator inside their transaction
    pub async fn add_with<'e, E>(
        executor: E,
        target: Assignable,
        user_name: &str,
    ) -> Result<bool, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = Sqlite>,
    {
        let query = format!(
            "INSERT OR IGNORE INTO {} ({}, user_name, added_on) VALUES (?, ?, ?)",
            target.table(),
            target.key_column()
        );

        let result = sqlx::query(&query)
            .bind(target.id())
            .bind(user_name)
            .bind(Utc::now())
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Removes a user unless they are the last member
    pub async fn remove_unless_last(
        pool: &SqlitePool,
        target: Assignable,
        user_name: &str,
    ) -> Result<Removal, sqlx::Error> {
        let (table, key) = (target.table(), target.key_column());
        let query = format!(
            "DELETE FROM {table} WHERE {key} = ?1 AND user_name = ?2 \
             AND (SELECT COUNT(*) FROM {table} WHERE {key} = ?1) > 1"
        );

        let result = sqlx::query(&query)
            .bind(target.id())
            .bind(user_name)
            .execute(pool)
            .await?;

        if result.rows_affected() > 0 {
            return Ok(Removal::Removed);
        }

        if Self::is_member(pool, target, user_name).await? {
            Ok(Removal::LastMember)
        } else {
            Ok(Removal::NotMember)
        }
    }

    /// Checks whether a user belongs to the set
    pub async fn is_member(
        pool: &SqlitePool,
        target: Assignable,
        user_name: &str,
    ) -> Result<bool, sqlx::Error> {
        let query = format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE {} = ? AND user_name = ?)",
            target.table(),
            target.key_column()
        );

        let exists: bool = sqlx::query_scalar(&query)
            .bind(target.id())
            .bind(user_name)
            .fetch_one(pool)
            .await?;

        Ok(exists)
    }

    /// Lists the set in the order users were added
    pub async fn list(pool: &SqlitePool, target: Assignable) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT user_name, added_on FROM {} WHERE {} = ? ORDER BY added_on, user_name",
            target.table(),
            target.key_column()
        );

        let members = sqlx::query_as::<_, Membership>(&query)
            .bind(target.id())
            .fetch_all(pool)
            .await?;

        Ok(members)
    }

    /// Names of the set's members, in the order they were added
    pub async fn names(pool: &SqlitePool, target: Assignable) -> Result<Vec<String>, sqlx::Error> {
        Ok(Self::list(pool, target)
            .await?
            .into_iter()
            .map(|m| m.user_name)
            .collect())
    }

    /// Counts members in the set
    pub async fn count(pool: &SqlitePool, target: Assignable) -> Result<i64, sqlx::Error> {
        let query = format!(
            "SELECT COUNT(*) FROM {} WHERE {} = ?",
            target.table(),
            target.key_column()
        );

        let count: i64 = sqlx::query_scalar(&query)
            .bind(target.id())
            .fetch_one(pool)
            .await?;

        Ok(count)
    }
}
