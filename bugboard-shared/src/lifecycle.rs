/// Create, update, delete and status operations for projects and issues
///
/// Every operation takes the acting [`Actor`] and runs the guard before
/// writing:
///
/// - create: any authenticated actor; they become creator, first modifier
///   and first member
/// - update: the creator or a member; the actor becomes the modifier
/// - delete: the creator only; cascades to issues, comments and memberships
/// - open/close: issue members only; a same-status request writes nothing
///
/// Guard refusals come back as `CoreError::PermissionDenied` with the store
/// untouched.

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::auth::authorization::{require_delete, require_modify, require_toggle_status, Actor};
use crate::error::{require_text, CoreError, CoreResult, EntityKind};
use crate::models::issue::{self, CreateIssue, Issue, IssueStatus, Priority, UpdateIssue};
use crate::models::project::{self, CreateProject, Project, UpdateProject};

/// Editable project fields
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectForm {
    pub title: String,
    pub summary: String,
}

impl ProjectForm {
    fn clean(&self) -> CoreResult<(String, String)> {
        Ok((
            require_text("title", &self.title, Some(project::TITLE_MAX_CHARS))?,
            require_text("summary", &self.summary, Some(project::SUMMARY_MAX_CHARS))?,
        ))
    }
}

/// Editable issue fields
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueForm {
    pub title: String,
    pub summary: String,
    #[serde(default)]
    pub priority: Priority,
}

impl IssueForm {
    fn clean(&self) -> CoreResult<(String, String)> {
        Ok((
            require_text("title", &self.title, Some(issue::TITLE_MAX_CHARS))?,
            require_text("summary", &self.summary, None)?,
        ))
    }
}

/// Logs guard refusals before handing the result back
pub(crate) fn log_rejection<T>(result: CoreResult<T>, action: &str, id: i64) -> CoreResult<T> {
    if let Err(e) = &result {
        if e.is_silent_rejection() {
            warn!(action, id, reason = %e, "Rejected mutation");
        }
    }
    result
}

pub(crate) async fn load_project(pool: &SqlitePool, id: i64) -> CoreResult<Project> {
    Project::find_by_id(pool, id)
        .await?
        .ok_or_else(|| CoreError::not_found(EntityKind::Project, id))
}

pub(crate) async fn load_issue(pool: &SqlitePool, id: i64) -> CoreResult<Issue> {
    Issue::find_by_id(pool, id)
        .await?
        .ok_or_else(|| CoreError::not_found(EntityKind::Issue, id))
}

/// Creates a project owned by the actor
pub async fn create_project(
    pool: &SqlitePool,
    actor: &Actor,
    form: &ProjectForm,
) -> CoreResult<Project> {
    let name = actor.require()?;
    let (title, summary) = form.clean()?;

    let project = Project::create(
        pool,
        CreateProject {
            title,
            summary,
            created_by: name.to_string(),
        },
    )
    .await?;

    info!(project_id = project.id, user = name, "Project created");
    Ok(project)
}

/// Updates title and summary
pub async fn update_project(
    pool: &SqlitePool,
    actor: &Actor,
    id: i64,
    form: &ProjectForm,
) -> CoreResult<Project> {
    let project = load_project(pool, id).await?;
    let name = log_rejection(require_modify(pool, actor, &project).await, "update_project", id)?;
    let (title, summary) = form.clean()?;

    let project = Project::update(
        pool,
        id,
        UpdateProject {
            title,
            summary,
            modified_by: name.to_string(),
        },
    )
    .await?
    .ok_or_else(|| CoreError::not_found(EntityKind::Project, id))?;

    info!(project_id = id, user = name, "Project updated");
    Ok(project)
}

/// Deletes a project with everything below it, returning the removed row
pub async fn delete_project(pool: &SqlitePool, actor: &Actor, id: i64) -> CoreResult<Project> {
    let project = load_project(pool, id).await?;
    let name = log_rejection(require_delete(actor, &project), "delete_project", id)?;

    Project::delete(pool, id).await?;

    info!(project_id = id, user = name, "Project deleted");
    Ok(project)
}

/// Files an issue against a project
pub async fn create_issue(
    pool: &SqlitePool,
    actor: &Actor,
    project_id: i64,
    form: &IssueForm,
) -> CoreResult<Issue> {
    let name = actor.require()?;
    load_project(pool, project_id).await?;
    let (title, summary) = form.clean()?;

    let issue = Issue::create(
        pool,
        CreateIssue {
            project_id,
            title,
            summary,
            priority: form.priority,
            created_by: name.to_string(),
        },
    )
    .await?;

    info!(issue_id = issue.id, project_id, user = name, "Issue created");
    Ok(issue)
}

/// Updates title, summary and priority; the parent project never changes
pub async fn update_issue(
    pool: &SqlitePool,
    actor: &Actor,
    id: i64,
    form: &IssueForm,
) -> CoreResult<Issue> {
    let issue = load_issue(pool, id).await?;
    let name = log_rejection(require_modify(pool, actor, &issue).await, "update_issue", id)?;
    let (title, summary) = form.clean()?;

    let issue = Issue::update(
        pool,
        id,
        UpdateIssue {
            title,
            summary,
            priority: form.priority,
            modified_by: name.to_string(),
        },
    )
    .await?
    .ok_or_else(|| CoreError::not_found(EntityKind::Issue, id))?;

    info!(issue_id = id, user = name, "Issue updated");
    Ok(issue)
}

/// Deletes an issue with its comments, returning the removed row
pub async fn delete_issue(pool: &SqlitePool, actor: &Actor, id: i64) -> CoreResult<Issue> {
    let issue = load_issue(pool, id).await?;
    let name = log_rejection(require_delete(actor, &issue), "delete_issue", id)?;

    Issue::delete(pool, id).await?;

    info!(issue_id = id, project_id = issue.project_id, user = name, "Issue deleted");
    Ok(issue)
}

/// Moves an issue to `status`
///
/// Closing records the actor as closer; opening clears the closer. Asking for
/// the status the issue already has returns it unchanged.
pub async fn set_issue_status(
    pool: &SqlitePool,
    actor: &Actor,
    id: i64,
    status: IssueStatus,
) -> CoreResult<Issue> {
    let issue = load_issue(pool, id).await?;
    let name = log_rejection(
        require_toggle_status(pool, actor, &issue).await,
        "set_issue_status",
        id,
    )?;

    match Issue::set_status(pool, id, status, name).await? {
        Some(updated) => {
            info!(issue_id = id, user = name, status = status.as_str(), "Issue status changed");
            Ok(updated)
        }
        None => Ok(issue),
    }
}

pub async fn open_issue(pool: &SqlitePool, actor: &Actor, id: i64) -> CoreResult<Issue> {
    set_issue_status(pool, actor, id, IssueStatus::Open).await
}

pub async fn close_issue(pool: &SqlitePool, actor: &Actor, id: i64) -> CoreResult<Issue> {
    set_issue_status(pool, actor, id, IssueStatus::Closed).await
}
