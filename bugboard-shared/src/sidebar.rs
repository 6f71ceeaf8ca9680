/// Sidebar context shown next to every list and detail view
///
/// Signed-in users see the projects and issues they are assigned to, most
/// recently modified first. Anonymous visitors see the most visited projects
/// and issues on the site.

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::auth::authorization::Actor;
use crate::listing::{assigned_issues, assigned_projects, Ordering};
use crate::models::issue::{Issue, ISSUE_COLUMNS};
use crate::models::project::{Project, PROJECT_COLUMNS};

/// Entries per sidebar list
pub const SIDEBAR_LIMIT: i64 = 5;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SidebarContext {
    pub project_sidebar: Vec<Project>,
    pub issue_sidebar: Vec<Issue>,
}

/// Builds the sidebar for the actor
pub async fn sidebar_context(pool: &SqlitePool, actor: &Actor) -> Result<SidebarContext, sqlx::Error> {
    match actor.name() {
        Some(name) => Ok(SidebarContext {
            project_sidebar: assigned_projects(pool, name, Some(SIDEBAR_LIMIT)).await?,
            issue_sidebar: assigned_issues(pool, name, Some(SIDEBAR_LIMIT)).await?,
        }),
        None => {
            let top = Ordering::popular().to_sql();

            let project_sidebar = sqlx::query_as::<_, Project>(&format!(
                "SELECT {PROJECT_COLUMNS} FROM projects ORDER BY {top} LIMIT ?"
            ))
            .bind(SIDEBAR_LIMIT)
            .fetch_all(pool)
            .await?;

            let issue_sidebar = sqlx::query_as::<_, Issue>(&format!(
                "SELECT {ISSUE_COLUMNS} FROM issues ORDER BY {top} LIMIT ?"
            ))
            .bind(SIDEBAR_LIMIT)
            .fetch_all(pool)
            .await?;

            Ok(SidebarContext {
                project_sidebar,
                issue_sidebar,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_pool;
    use crate::models::membership::{Assignable, Membership};
    use crate::models::project::CreateProject;
    use crate::models::user::{CreateUser, User};

    async fn seed(pool: &SqlitePool, n: usize) -> Vec<Project> {
        for name in ["alice", "bob"] {
            User::create(pool, CreateUser::regular(name, format!("{name}@example.org"), "h"))
                .await
                .unwrap();
        }
        let mut out = Vec::new();
        for i in 1..=n {
            out.push(
                Project::create(
                    pool,
                    CreateProject {
                        title: format!("Project {i}"),
                        summary: "summary".into(),
                        created_by: "alice".into(),
                    },
                )
                .await
                .unwrap(),
            );
        }
        out
    }

    #[tokio::test]
    async fn test_anonymous_sidebar_is_top_five_by_visits() {
        let pool = memory_pool().await.unwrap();
        let projects = seed(&pool, 7).await;
        Project::record_visit(&pool, projects[1].id).await.unwrap();
        Project::record_visit(&pool, projects[1].id).await.unwrap();
        Project::record_visit(&pool, projects[3].id).await.unwrap();

        let sidebar = sidebar_context(&pool, &Actor::Anonymous).await.unwrap();
        let titles: Vec<_> = sidebar.project_sidebar.iter().map(|p| p.title.as_str()).collect();

        // ties fall back to newest first
        assert_eq!(
            titles,
            vec!["Project 2", "Project 4", "Project 7", "Project 6", "Project 5"]
        );
        assert!(sidebar.issue_sidebar.is_empty());
    }

    #[tokio::test]
    async fn test_user_sidebar_lists_assignments() {
        let pool = memory_pool().await.unwrap();
        let projects = seed(&pool, 3).await;
        Membership::add(&pool, Assignable::Project(projects[0].id), "bob").await.unwrap();

        let sidebar = sidebar_context(&pool, &Actor::user("bob")).await.unwrap();
        assert_eq!(sidebar.project_sidebar.len(), 1);
        assert_eq!(sidebar.project_sidebar[0].id, projects[0].id);

        let sidebar = sidebar_context(&pool, &Actor::user("alice")).await.unwrap();
        assert_eq!(sidebar.project_sidebar.len(), 3);
        assert_eq!(sidebar.project_sidebar[0].title, "Project 3");
    }
}
