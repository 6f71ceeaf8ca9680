/// Authorization helpers and permission checks
///
/// # Permission Model
///
/// 1. **Authentication**: every mutation needs a named actor; anonymous
///    actors may only read.
/// 2. **Membership**: any user in a project's or issue's membership set may
///    manage its members and (for issues) open or close it.
/// 3. **Updates**: the creator or any member may update fields.
/// 4. **Creation**: only the creator of a project or issue may delete it,
///    whether or not they are still a member.
/// 5. **Authorship**: only the author of a comment may edit or delete it.
///
/// Each `can_*` check has a `require_*` twin that turns a refusal into a
/// typed [`CoreError`] and hands back the actor's name on success.
///
/// # Example
///
/// ```no_run
/// use bugboard_shared::auth::authorization::{require_modify, Actor};
/// use bugboard_shared::models::project::Project;
///
/// # async fn example(pool: sqlx::SqlitePool, project: Project) -> Result<(), Box<dyn std::error::Error>> {
/// let actor = Actor::user("chondosha");
/// let name = require_modify(&pool, &actor, &project).await?;
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::error::{CoreError, CoreResult, PermissionDenied};
use crate::models::comment::Comment;
use crate::models::issue::Issue;
use crate::models::membership::{Assignable, Membership};
use crate::models::project::Project;

/// Who is making the request
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "lowercase")]
pub enum Actor {
    #[default]
    Anonymous,
    User(String),
}

impl Actor {
    pub fn user(name: impl Into<String>) -> Self {
        Actor::User(name.into())
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Actor::Anonymous => None,
            Actor::User(name) => Some(name),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Actor::User(_))
    }

    /// The actor's name, or `Unauthenticated` for anonymous requests
    pub fn require(&self) -> CoreResult<&str> {
        self.name().ok_or(CoreError::Unauthenticated)
    }
}

/// Entity with a creator and a membership set
pub trait Guarded {
    fn creator(&self) -> &str;
    fn membership(&self) -> Assignable;
}

impl Guarded for Project {
    fn creator(&self) -> &str {
        &self.created_by
    }

    fn membership(&self) -> Assignable {
        Assignable::Project(self.id)
    }
}

impl Guarded for Issue {
    fn creator(&self) -> &str {
        &self.created_by
    }

    fn membership(&self) -> Assignable {
        Assignable::Issue(self.id)
    }
}

/// Whether the actor is in the entity's membership set
pub async fn is_assigned<G: Guarded>(
    pool: &SqlitePool,
    actor: &Actor,
    entity: &G,
) -> Result<bool, sqlx::Error> {
    match actor.name() {
        Some(name) => Membership::is_member(pool, entity.membership(), name).await,
        None => Ok(false),
    }
}

/// Whether the actor may update fields
///
/// The creator keeps this right after leaving the membership set.
pub async fn can_modify<G: Guarded>(
    pool: &SqlitePool,
    actor: &Actor,
    entity: &G,
) -> Result<bool, sqlx::Error> {
    if actor.name() == Some(entity.creator()) {
        return Ok(true);
    }
    is_assigned(pool, actor, entity).await
}

/// Whether the actor may delete the entity
pub fn can_delete<G: Guarded>(actor: &Actor, entity: &G) -> bool {
    actor.name() == Some(entity.creator())
}

/// Whether the actor may open or close the issue
pub async fn can_toggle_status(
    pool: &SqlitePool,
    actor: &Actor,
    issue: &Issue,
) -> Result<bool, sqlx::Error> {
    is_assigned(pool, actor, issue).await
}

/// Whether the actor wrote the comment
pub fn can_edit_comment(actor: &Actor, comment: &Comment) -> bool {
    actor.name() == Some(comment.user_name.as_str())
}

/// Requires membership, returning the actor's name
pub async fn require_assigned<'a, G: Guarded>(
    pool: &SqlitePool,
    actor: &'a Actor,
    entity: &G,
) -> CoreResult<&'a str> {
    let name = actor.require()?;
    if !Membership::is_member(pool, entity.membership(), name).await? {
        return Err(CoreError::PermissionDenied(PermissionDenied::NotMember));
    }
    Ok(name)
}

/// Requires the creator or a member, returning the actor's name
pub async fn require_modify<'a, G: Guarded>(
    pool: &SqlitePool,
    actor: &'a Actor,
    entity: &G,
) -> CoreResult<&'a str> {
    let name = actor.require()?;
    if name == entity.creator() {
        return Ok(name);
    }
    require_assigned(pool, actor, entity).await
}

/// Requires the actor to be the creator
pub fn require_delete<'a, G: Guarded>(actor: &'a Actor, entity: &G) -> CoreResult<&'a str> {
    let name = actor.require()?;
    if name != entity.creator() {
        return Err(CoreError::PermissionDenied(PermissionDenied::NotCreator));
    }
    Ok(name)
}

/// Requires the actor to be an assigned member of the issue
pub async fn require_toggle_status<'a>(
    pool: &SqlitePool,
    actor: &'a Actor,
    issue: &Issue,
) -> CoreResult<&'a str> {
    require_assigned(pool, actor, issue).await
}

/// Requires the actor to be the comment's author
pub fn require_author<'a>(actor: &'a Actor, comment: &Comment) -> CoreResult<&'a str> {
    let name = actor.require()?;
    if name != comment.user_name {
        return Err(CoreError::PermissionDenied(PermissionDenied::NotAuthor));
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_pool;
    use crate::models::project::CreateProject;
    use crate::models::user::{CreateUser, User};

    async fn seed() -> (SqlitePool, Project) {
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
        (pool, project)
    }

    #[test]
    fn test_actor() {
        assert_eq!(Actor::default(), Actor::Anonymous);
        assert!(matches!(Actor::Anonymous.require(), Err(CoreError::Unauthenticated)));
        assert_eq!(Actor::user("alice").require().unwrap(), "alice");
        assert!(Actor::user("alice").is_authenticated());
    }

    #[tokio::test]
    async fn test_member_may_modify() {
        let (pool, project) = seed().await;

        assert!(can_modify(&pool, &Actor::user("alice"), &project).await.unwrap());
        assert!(!can_modify(&pool, &Actor::user("bob"), &project).await.unwrap());
        assert!(!can_modify(&pool, &Actor::Anonymous, &project).await.unwrap());

        assert!(matches!(
            require_modify(&pool, &Actor::user("bob"), &project).await,
            Err(CoreError::PermissionDenied(PermissionDenied::NotMember))
        ));
        assert!(matches!(
            require_modify(&pool, &Actor::Anonymous, &project).await,
            Err(CoreError::Unauthenticated)
        ));
    }

    #[tokio::test]
    async fn test_only_creator_may_delete() {
        let (pool, project) = seed().await;
        Membership::add(&pool, project.membership(), "bob").await.unwrap();

        assert!(can_delete(&Actor::user("alice"), &project));
        assert!(!can_delete(&Actor::user("bob"), &project));
        assert!(matches!(
            require_delete(&Actor::user("bob"), &project),
            Err(CoreError::PermissionDenied(PermissionDenied::NotCreator))
        ));

        // creator keeps delete rights after leaving the membership set
        Membership::remove_unless_last(&pool, project.membership(), "alice")
            .await
            .unwrap();
        assert!(require_delete(&Actor::user("alice"), &project).is_ok());
    }

    #[tokio::test]
    async fn test_creator_keeps_update_rights_after_leaving() {
        let (pool, project) = seed().await;
        Membership::add(&pool, project.membership(), "bob").await.unwrap();
        Membership::remove_unless_last(&pool, project.membership(), "alice")
            .await
            .unwrap();

        let alice = Actor::user("alice");
        assert!(!is_assigned(&pool, &alice, &project).await.unwrap());
        assert!(can_modify(&pool, &alice, &project).await.unwrap());
        assert_eq!(require_modify(&pool, &alice, &project).await.unwrap(), "alice");

        // member management stays with the membership set
        assert!(matches!(
            require_assigned(&pool, &alice, &project).await,
            Err(CoreError::PermissionDenied(PermissionDenied::NotMember))
        ));
        assert!(require_assigned(&pool, &Actor::user("bob"), &project).await.is_ok());
    }
}
