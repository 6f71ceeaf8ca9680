/// Assigning users to projects and issues
///
/// Only existing members may change a membership set. Adding is idempotent;
/// removing refuses to empty the set. A change that actually alters the set
/// stamps the owning entity's modifier.

use sqlx::SqlitePool;
use tracing::info;

use crate::auth::authorization::{require_assigned, Actor};
use crate::error::{require_text, CoreError, CoreResult};
use crate::lifecycle::{load_issue, load_project, log_rejection};
use crate::models::issue::Issue;
use crate::models::membership::{Assignable, Membership, Removal};
use crate::models::project::Project;
use crate::models::user::User;

/// Longest accepted user name in member forms
pub const USERNAME_MAX_CHARS: usize = 64;

/// Loads the owner of the set and checks the actor belongs to it
async fn require_member<'a>(
    pool: &SqlitePool,
    actor: &'a Actor,
    target: Assignable,
    action: &str,
) -> CoreResult<&'a str> {
    let result = match target {
        Assignable::Project(id) => {
            let project = load_project(pool, id).await?;
            require_assigned(pool, actor, &project).await
        }
        Assignable::Issue(id) => {
            let issue = load_issue(pool, id).await?;
            require_assigned(pool, actor, &issue).await
        }
    };
    log_rejection(result, action, target.id())
}

async fn touch(pool: &SqlitePool, target: Assignable, actor: &str) -> Result<(), sqlx::Error> {
    match target {
        Assignable::Project(id) => Project::touch(pool, id, actor).await?,
        Assignable::Issue(id) => Issue::touch(pool, id, actor).await?,
    };
    Ok(())
}

/// Adds `username` to the set
///
/// # Errors
///
/// `Validation` with "This username does not exist" when no such user exists.
pub async fn add_member(
    pool: &SqlitePool,
    actor: &Actor,
    target: Assignable,
    username: &str,
) -> CoreResult<()> {
    let name = require_member(pool, actor, target, "add_member").await?;
    let username = require_text("username", username, Some(USERNAME_MAX_CHARS))?;

    if !User::exists(pool, &username).await? {
        return Err(CoreError::validation("username", "This username does not exist"));
    }

    if Membership::add(pool, target, &username).await? {
        touch(pool, target, name).await?;
        info!(entity = ?target, member = %username, user = name, "Member added");
    }

    Ok(())
}

/// Removes `username` from the set unless they are its last member
///
/// Removing someone who is not a member changes nothing.
pub async fn remove_member(
    pool: &SqlitePool,
    actor: &Actor,
    target: Assignable,
    username: &str,
) -> CoreResult<()> {
    let name = require_member(pool, actor, target, "remove_member").await?;
    let username = require_text("username", username, Some(USERNAME_MAX_CHARS))?;

    match Membership::remove_unless_last(pool, target, &username).await? {
        Removal::Removed => {
            touch(pool, target, name).await?;
            info!(entity = ?target, member = %username, user = name, "Member removed");
            Ok(())
        }
        Removal::LastMember => log_rejection(Err(CoreError::LastMember), "remove_member", target.id()),
        Removal::NotMember => Ok(()),
    }
}
