/// Database models for Bugboard
///
/// This module contains the entity store: every table's row type and its
/// single-statement CRUD operations. Permission checks live one layer up, in
/// the operation modules at the crate root.
///
/// # Models
///
/// - `user`: User accounts, keyed by name
/// - `project`: Projects and their visit counters
/// - `issue`: Issues filed against projects
/// - `comment`: Threaded issue comments
/// - `membership`: Assigned-user sets of projects and issues
///
/// # Example
///
/// ```no_run
/// use bugboard_shared::models::user::{User, CreateUser};
/// use bugboard_shared::models::project::{Project, CreateProject};
///
/// # async fn example(pool: sqlx::SqlitePool) -> Result<(), sqlx::Error> {
/// User::create(&pool, CreateUser::regular("chondosha", "user@example.org", "$argon2id$...")).await?;
///
/// let project = Project::create(&pool, CreateProject {
///     title: "Tracker".to_string(),
///     summary: "Where bugs go".to_string(),
///     created_by: "chondosha".to_string(),
/// }).await?;
/// # Ok(())
/// # }
/// ```

pub mod comment;
pub mod issue;
pub mod membership;
pub mod project;
pub mod user;
