/// User model and database operations
///
/// Users are identified by their unique name. A user can create projects,
/// issues and comments, and be assigned to any number of projects and issues
/// through the membership tables.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     name TEXT PRIMARY KEY NOT NULL,
///     email TEXT NOT NULL UNIQUE COLLATE NOCASE,
///     password_hash TEXT NOT NULL,
///     is_staff BOOLEAN NOT NULL DEFAULT 0,
///     is_superuser BOOLEAN NOT NULL DEFAULT 0,
///     is_active BOOLEAN NOT NULL DEFAULT 1,
///     date_joined TEXT NOT NULL,
///     last_updated TEXT NOT NULL,
///     last_login TEXT
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use bugboard_shared::models::user::{User, CreateUser};
///
/// # async fn example(pool: sqlx::SqlitePool) -> Result<(), sqlx::Error> {
/// let user = User::create(&pool, CreateUser::regular("chondosha", "user@example.org", "$argon2id$...")).await?;
/// let found = User::find_by_name(&pool, "chondosha").await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::search::contains_folded;

/// User account
///
/// The password hash never leaves the server: it is skipped on serialization.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user name (primary identifier)
    pub name: String,

    /// Email address, unique case-insensitively
    pub email: String,

    /// Argon2id password hash
    #[serde(skip_serializing, default)]
    pub password_hash: String,

    /// Staff accounts may use administrative tooling
    pub is_staff: bool,

    /// Superusers bypass nothing in the tracker core; kept for account management
    pub is_superuser: bool,

    /// Inactive accounts cannot log in
    pub is_active: bool,

    /// When the account was created
    pub date_joined: DateTime<Utc>,

    /// When the account was last changed
    pub last_updated: DateTime<Utc>,

    /// Last successful login
    pub last_login: Option<DateTime<Utc>>,
}

/// Input for creating a new user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
    /// Argon2id password hash (NOT plaintext password!)
    pub password_hash: String,
    pub is_staff: bool,
    pub is_superuser: bool,
}

impl CreateUser {
    /// Plain account without staff or superuser flags
    pub fn regular(
        name: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            password_hash: password_hash.into(),
            is_staff: false,
            is_superuser: false,
        }
    }

    /// Staff account
    pub fn staff(
        name: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        Self {
            is_staff: true,
            ..Self::regular(name, email, password_hash)
        }
    }

    /// Staff account with superuser rights
    pub fn superuser(
        name: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        Self {
            is_staff: true,
            is_superuser: true,
            ..Self::regular(name, email, password_hash)
        }
    }
}

/// Input for updating an existing user
///
/// All fields are optional. Only non-None fields will be updated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUser {
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub is_active: Option<bool>,
}

const USER_COLUMNS: &str = "name, email, password_hash, is_staff, is_superuser, is_active, \
                            date_joined, last_updated, last_login";

/// Lowercases the domain part of an address, leaving the local part alone
pub fn normalize_email(email: &str) -> String {
    let email = email.trim();
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{}@{}", local, domain.to_lowercase()),
        None => email.to_string(),
    }
}

impl User {
    /// Creates a new user
    ///
    /// # Errors
    ///
    /// Returns an error if the name or email is already taken (unique
    /// constraint violation) or the database fails.
    pub async fn create(pool: &SqlitePool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let now = Utc::now();
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (name, email, password_hash, is_staff, is_superuser, is_active,
                               date_joined, last_updated)
            VALUES (?, ?, ?, ?, ?, 1, ?, ?)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(data.name.trim())
        .bind(normalize_email(&data.email))
        .bind(data.password_hash)
        .bind(data.is_staff)
        .bind(data.is_superuser)
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by name
    pub async fn find_by_name(pool: &SqlitePool, name: &str) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE name = ?"
        ))
        .bind(name)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by email address (case-insensitive)
    pub async fn find_by_email(pool: &SqlitePool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = ?"
        ))
        .bind(email.trim())
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Checks whether an account with this name exists
    pub async fn exists(pool: &SqlitePool, name: &str) -> Result<bool, sqlx::Error> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE name = ?)")
                .bind(name)
                .fetch_one(pool)
                .await?;

        Ok(exists)
    }

    /// Updates an existing user
    ///
    /// Only non-None fields in `data` are written; `last_updated` is always
    /// refreshed. Returns None if the user doesn't exist.
    pub async fn update(
        pool: &SqlitePool,
        name: &str,
        data: UpdateUser,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE users SET last_updated = ?");

        if data.email.is_some() {
            query.push_str(", email = ?");
        }
        if data.password_hash.is_some() {
            query.push_str(", password_hash = ?");
        }
        if data.is_active.is_some() {
            query.push_str(", is_active = ?");
        }

        query.push_str(&format!(" WHERE name = ? RETURNING {USER_COLUMNS}"));

        let mut q = sqlx::query_as::<_, User>(&query).bind(Utc::now());

        if let Some(email) = data.email {
            q = q.bind(normalize_email(&email));
        }
        if let Some(password_hash) = data.password_hash {
            q = q.bind(password_hash);
        }
        if let Some(is_active) = data.is_active {
            q = q.bind(is_active);
        }

        let user = q.bind(name).fetch_optional(pool).await?;

        Ok(user)
    }

    /// Deletes a user and, through the schema's cascades, everything they created
    ///
    /// Returns true if the user existed.
    pub async fn delete(pool: &SqlitePool, name: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE name = ?")
            .bind(name)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Records a successful login
    pub async fn update_last_login(pool: &SqlitePool, name: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET last_login = ? WHERE name = ?")
            .bind(Utc::now())
            .bind(name)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists users by name with pagination
    pub async fn list(pool: &SqlitePool, limit: i64, offset: i64) -> Result<Vec<Self>, sqlx::Error> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY name LIMIT ? OFFSET ?"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(users)
    }

    /// Users whose name or email contains `needle`, case-insensitively
    pub async fn search(pool: &SqlitePool, needle: &str) -> Result<Vec<Self>, sqlx::Error> {
        let needle = needle.to_lowercase();
        let users = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY name"))
            .fetch_all(pool)
            .await?;

        Ok(users
            .into_iter()
            .filter(|u| contains_folded(&u.name, &needle) || contains_folded(&u.email, &needle))
            .collect())
    }

    /// Counts total number of users
    pub async fn count(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(pool)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_pool;

    #[test]
    fn test_normalize_email_lowercases_domain_only() {
        assert_eq!(normalize_email(" Bob@Example.ORG "), "Bob@example.org");
        assert_eq!(normalize_email("no-at-sign"), "no-at-sign");
    }

    #[test]
    fn test_create_user_constructors() {
        let regular = CreateUser::regular("a", "a@example.org", "hash");
        assert!(!regular.is_staff && !regular.is_superuser);

        let staff = CreateUser::staff("b", "b@example.org", "hash");
        assert!(staff.is_staff && !staff.is_superuser);

        let root = CreateUser::superuser("c", "c@example.org", "hash");
        assert!(root.is_staff && root.is_superuser);
    }

    #[test]
    fn test_update_user_default() {
        let update = UpdateUser::default();
        assert!(update.email.is_none());
        assert!(update.password_hash.is_none());
        assert!(update.is_active.is_none());
    }

    #[tokio::test]
    async fn test_create_find_update_delete() {
        let pool = memory_pool().await.unwrap();

        let user = User::create(&pool, CreateUser::regular("chondosha", "User1234@Example.org", "hash"))
            .await
            .unwrap();
        assert_eq!(user.email, "User1234@example.org");
        assert!(user.is_active);
        assert!(user.last_login.is_none());

        assert!(User::exists(&pool, "chondosha").await.unwrap());
        assert!(!User::exists(&pool, "nobody").await.unwrap());

        // email lookup ignores case
        let found = User::find_by_email(&pool, "user1234@EXAMPLE.org").await.unwrap();
        assert_eq!(found.map(|u| u.name), Some("chondosha".to_string()));

        let updated = User::update(
            &pool,
            "chondosha",
            UpdateUser {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
        assert!(!updated.is_active);
        assert!(updated.last_updated >= user.last_updated);

        assert!(User::update_last_login(&pool, "chondosha").await.unwrap());
        let reloaded = User::find_by_name(&pool, "chondosha").await.unwrap().unwrap();
        assert!(reloaded.last_login.is_some());

        assert!(User::delete(&pool, "chondosha").await.unwrap());
        assert_eq!(User::count(&pool).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_name_or_email_rejected() {
        let pool = memory_pool().await.unwrap();
        User::create(&pool, CreateUser::regular("alice", "alice@example.org", "h"))
            .await
            .unwrap();

        assert!(User::create(&pool, CreateUser::regular("alice", "other@example.org", "h"))
            .await
            .is_err());
        assert!(User::create(&pool, CreateUser::regular("alice2", "ALICE@example.org", "h"))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_search_matches_name_or_email() {
        let pool = memory_pool().await.unwrap();
        User::create(&pool, CreateUser::regular("alice", "alice@example.org", "h"))
            .await
            .unwrap();
        User::create(&pool, CreateUser::regular("bob", "bob@tracker.io", "h"))
            .await
            .unwrap();

        let hits = User::search(&pool, "TRACKER").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "bob");

        let hits = User::search(&pool, "o").await.unwrap();
        let names: Vec<_> = hits.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["alice", "bob"]);
    }

    #[tokio::test]
    async fn test_search_folds_non_ascii_names() {
        let pool = memory_pool().await.unwrap();
        User::create(&pool, CreateUser::regular("Ørjan", "orjan@example.org", "h"))
            .await
            .unwrap();

        let hits = User::search(&pool, "øRJ").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Ørjan");
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let user = User {
            name: "a".into(),
            email: "a@example.org".into(),
            password_hash: "secret".into(),
            is_staff: false,
            is_superuser: false,
            is_active: true,
            date_joined: Utc::now(),
            last_updated: Utc::now(),
            last_login: None,
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
    }
}
