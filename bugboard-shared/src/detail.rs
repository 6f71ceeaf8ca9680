/// Project and issue detail views
///
/// Opening a detail view counts as one visit: the counter is incremented in
/// the same statement that reads the row back, and issues also record the
/// visit time. List views never do this.

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::debug;

use crate::auth::authorization::{can_delete, can_modify, Actor};
use crate::error::{CoreError, CoreResult, EntityKind};
use crate::listing::{list_project_issues, FilterTerm, ListParams, Page};
use crate::models::issue::Issue;
use crate::models::membership::{Assignable, Membership};
use crate::models::project::Project;
use crate::threads::{issue_threads, CommentNode};

/// What the actor may do on a detail page
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permissions {
    pub can_modify: bool,
    pub can_delete: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectDetail {
    pub project: Project,
    pub issue_count: i64,
    pub members: Vec<String>,
    pub filter: Option<FilterTerm>,
    pub issues: Page<Issue>,
    pub permissions: Permissions,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueDetail {
    pub issue: Issue,
    pub project_title: String,
    pub members: Vec<String>,
    pub comment_count: i64,
    pub comments: Vec<CommentNode>,
    pub permissions: Permissions,
}

/// Records a visit and returns the project with its scoped issue list
pub async fn project_detail(
    pool: &SqlitePool,
    actor: &Actor,
    id: i64,
    params: &ListParams,
) -> CoreResult<ProjectDetail> {
    let project = Project::record_visit(pool, id)
        .await?
        .ok_or_else(|| CoreError::not_found(EntityKind::Project, id))?;

    debug!(project_id = id, visits = project.visits, "Project visited");

    let permissions = Permissions {
        can_modify: can_modify(pool, actor, &project).await?,
        can_delete: can_delete(actor, &project),
    };

    Ok(ProjectDetail {
        issue_count: Project::issue_count(pool, id).await?,
        members: Membership::names(pool, Assignable::Project(id)).await?,
        filter: params.term,
        issues: list_project_issues(pool, id, params).await?,
        permissions,
        project,
    })
}

/// Records a visit and returns the issue with its comment forest
pub async fn issue_detail(pool: &SqlitePool, actor: &Actor, id: i64) -> CoreResult<IssueDetail> {
    let issue = Issue::record_visit(pool, id)
        .await?
        .ok_or_else(|| CoreError::not_found(EntityKind::Issue, id))?;

    debug!(issue_id = id, visits = issue.visits, "Issue visited");

    let project = Project::find_by_id(pool, issue.project_id)
        .await?
        .ok_or_else(|| CoreError::not_found(EntityKind::Project, issue.project_id))?;

    let permissions = Permissions {
        can_modify: can_modify(pool, actor, &issue).await?,
        can_delete: can_delete(actor, &issue),
    };

    Ok(IssueDetail {
        project_title: project.title,
        members: Membership::names(pool, Assignable::Issue(id)).await?,
        comment_count: Issue::comment_count(pool, id).await?,
        comments: issue_threads(pool, id).await?,
        permissions,
        issue,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_pool;
    use crate::lifecycle::{create_issue, create_project, IssueForm, ProjectForm};
    use crate::models::issue::Priority;
    use crate::models::user::{CreateUser, User};
    use crate::threads::add_comment;

    #[tokio::test]
    async fn test_detail_views_count_visits() {
        let pool = memory_pool().await.unwrap();
        User::create(&pool, CreateUser::regular("alice", "alice@example.org", "h"))
            .await
            .unwrap();
        let alice = Actor::user("alice");
        let project = create_project(
            &pool,
            &alice,
            &ProjectForm {
                title: "Tracker".into(),
                summary: "Bugs".into(),
            },
        )
        .await
        .unwrap();
        let issue = create_issue(
            &pool,
            &alice,
            project.id,
            &IssueForm {
                title: "Crash".into(),
                summary: "It crashes".into(),
                priority: Priority::High,
            },
        )
        .await
        .unwrap();
        add_comment(&pool, &alice, issue.id, "me too", None).await.unwrap();

        let detail = project_detail(&pool, &Actor::Anonymous, project.id, &ListParams::default())
            .await
            .unwrap();
        assert_eq!(detail.project.visits, 1);
        assert_eq!(detail.issue_count, 1);
        assert_eq!(detail.issues.items.len(), 1);
        assert_eq!(detail.permissions, Permissions::default());

        let detail = issue_detail(&pool, &alice, issue.id).await.unwrap();
        assert_eq!(detail.issue.visits, 1);
        assert_eq!(detail.project_title, "Tracker");
        assert_eq!(detail.members, vec!["alice".to_string()]);
        assert_eq!(detail.comment_count, 1);
        assert_eq!(detail.comments.len(), 1);
        assert!(detail.permissions.can_modify && detail.permissions.can_delete);

        // listing the project's issues does not count as a visit
        let issue = Issue::find_by_id(&pool, issue.id).await.unwrap().unwrap();
        assert_eq!(issue.visits, 1);

        assert!(matches!(
            issue_detail(&pool, &alice, 999).await,
            Err(CoreError::NotFound { kind: EntityKind::Issue, .. })
        ));
    }
}
