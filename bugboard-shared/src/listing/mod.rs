/// List & filter engine
///
/// Produces ordered, paginated views of projects and issues. A view is built
/// from [`ListParams`] (optional filter term, requested page, page size); the
/// term resolves to an explicit [`filter::Ordering`] and optional status
/// filter, the total is counted under the same filter, and the page number is
/// clamped before the rows are fetched. List views never touch visit counters.
///
/// # Example
///
/// ```no_run
/// use bugboard_shared::listing::{list_issues, ListParams, FilterTerm};
///
/// # async fn example(pool: sqlx::SqlitePool) -> Result<(), sqlx::Error> {
/// let params = ListParams::new(Some(FilterTerm::Popular));
/// let page = list_issues(&pool, &params).await?;
/// println!("page {} of {}", page.meta.page, page.meta.total_pages);
/// # Ok(())
/// # }
/// ```

pub mod filter;
pub mod pagination;

use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::auth::authorization::Actor;
use crate::error::{CoreError, CoreResult, EntityKind};
use crate::models::issue::{Issue, ISSUE_COLUMNS};
use crate::models::project::{Project, PROJECT_COLUMNS};
use crate::models::user::User;

pub use filter::{FilterTerm, IssueFilter, Ordering, ProjectFilter};
pub use pagination::{Page, PageMeta, PageNumber, DEFAULT_PAGE_SIZE};

/// Inputs shared by every list view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListParams {
    pub term: Option<FilterTerm>,
    pub page: PageNumber,
    pub per_page: i64,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            term: None,
            page: PageNumber::default(),
            per_page: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ListParams {
    pub fn new(term: Option<FilterTerm>) -> Self {
        Self {
            term,
            ..Default::default()
        }
    }

    pub fn page(mut self, page: PageNumber) -> Self {
        self.page = page;
        self
    }

    pub fn per_page(mut self, per_page: i64) -> Self {
        self.per_page = per_page;
        self
    }
}

fn push_issue_where(builder: &mut QueryBuilder<'_, Sqlite>, filter: &IssueFilter) {
    builder.push(" WHERE 1 = 1");

    if let Some(project_id) = filter.project_id {
        builder.push(" AND project_id = ").push_bind(project_id);
    }
    if let Some(status) = filter.status {
        builder.push(" AND status = ").push_bind(status);
    }
}

/// Runs an issue filter and returns the requested page
pub async fn fetch_issue_page(
    pool: &SqlitePool,
    filter: &IssueFilter,
    page: PageNumber,
    per_page: i64,
) -> Result<Page<Issue>, sqlx::Error> {
    let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM issues");
    push_issue_where(&mut count, filter);
    let total: i64 = count.build_query_scalar().fetch_one(pool).await?;

    let meta = PageMeta::new(page, per_page, total);

    let mut select = QueryBuilder::<Sqlite>::new(format!("SELECT {ISSUE_COLUMNS} FROM issues"));
    push_issue_where(&mut select, filter);
    select
        .push(" ORDER BY ")
        .push(filter.ordering.to_sql())
        .push(" LIMIT ")
        .push_bind(meta.per_page)
        .push(" OFFSET ")
        .push_bind(meta.offset());

    let items = select.build_query_as::<Issue>().fetch_all(pool).await?;

    debug!(
        total_items = meta.total_items,
        page = meta.page,
        returned = items.len(),
        "Listed issues"
    );

    Ok(Page { items, meta })
}

/// Runs a project filter and returns the requested page
pub async fn fetch_project_page(
    pool: &SqlitePool,
    filter: &ProjectFilter,
    page: PageNumber,
    per_page: i64,
) -> Result<Page<Project>, sqlx::Error> {
    let total = Project::count(pool).await?;
    let meta = PageMeta::new(page, per_page, total);

    let items = sqlx::query_as::<_, Project>(&format!(
        "SELECT {PROJECT_COLUMNS} FROM projects ORDER BY {} LIMIT ? OFFSET ?",
        filter.ordering.to_sql()
    ))
    .bind(meta.per_page)
    .bind(meta.offset())
    .fetch_all(pool)
    .await?;

    debug!(
        total_items = meta.total_items,
        page = meta.page,
        returned = items.len(),
        "Listed projects"
    );

    Ok(Page { items, meta })
}

/// Site-wide issue list
pub async fn list_issues(pool: &SqlitePool, params: &ListParams) -> Result<Page<Issue>, sqlx::Error> {
    fetch_issue_page(pool, &IssueFilter::for_term(params.term), params.page, params.per_page).await
}

/// Site-wide project list
pub async fn list_projects(
    pool: &SqlitePool,
    params: &ListParams,
) -> Result<Page<Project>, sqlx::Error> {
    fetch_project_page(pool, &ProjectFilter::for_term(params.term), params.page, params.per_page)
        .await
}

/// Issues of one project, newest first, optionally narrowed to a status
pub async fn list_project_issues(
    pool: &SqlitePool,
    project_id: i64,
    params: &ListParams,
) -> Result<Page<Issue>, sqlx::Error> {
    fetch_issue_page(
        pool,
        &IssueFilter::for_project(project_id, params.term),
        params.page,
        params.per_page,
    )
    .await
}

/// Projects the user is assigned to, most recently modified first
pub async fn assigned_projects(
    pool: &SqlitePool,
    user_name: &str,
    limit: Option<i64>,
) -> Result<Vec<Project>, sqlx::Error> {
    sqlx::query_as::<_, Project>(&format!(
        r#"
        SELECT {PROJECT_COLUMNS} FROM projects
        WHERE id IN (SELECT project_id FROM project_members WHERE user_name = ?)
        ORDER BY {}
        LIMIT ?
        "#,
        Ordering::recently_modified().to_sql()
    ))
    .bind(user_name)
    .bind(limit.unwrap_or(-1))
    .fetch_all(pool)
    .await
}

/// Issues the user is assigned to, most recently modified first
pub async fn assigned_issues(
    pool: &SqlitePool,
    user_name: &str,
    limit: Option<i64>,
) -> Result<Vec<Issue>, sqlx::Error> {
    sqlx::query_as::<_, Issue>(&format!(
        r#"
        SELECT {ISSUE_COLUMNS} FROM issues
        WHERE id IN (SELECT issue_id FROM issue_members WHERE user_name = ?)
        ORDER BY {}
        LIMIT ?
        "#,
        Ordering::recently_modified().to_sql()
    ))
    .bind(user_name)
    .bind(limit.unwrap_or(-1))
    .fetch_all(pool)
    .await
}

/// Paginated projects the user is assigned to
async fn assigned_project_page(
    pool: &SqlitePool,
    user_name: &str,
    params: &ListParams,
) -> Result<Page<Project>, sqlx::Error> {
    let total: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM project_members WHERE user_name = ?")
            .bind(user_name)
            .fetch_one(pool)
            .await?;
    let meta = PageMeta::new(params.page, params.per_page, total);

    let items = sqlx::query_as::<_, Project>(&format!(
        r#"
        SELECT {PROJECT_COLUMNS} FROM projects
        WHERE id IN (SELECT project_id FROM project_members WHERE user_name = ?)
        ORDER BY {}
        LIMIT ? OFFSET ?
        "#,
        Ordering::recently_modified().to_sql()
    ))
    .bind(user_name)
    .bind(meta.per_page)
    .bind(meta.offset())
    .fetch_all(pool)
    .await?;

    Ok(Page { items, meta })
}

/// Landing page content
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "page", rename_all = "snake_case")]
pub enum HomeListing {
    /// Projects the signed-in actor is assigned to
    AssignedProjects(Page<Project>),
    /// Most visited issues, for anonymous visitors
    PopularIssues(Page<Issue>),
}

/// Landing page: assigned projects for users, popular issues for visitors
pub async fn home(
    pool: &SqlitePool,
    actor: &Actor,
    page: PageNumber,
    per_page: i64,
) -> Result<HomeListing, sqlx::Error> {
    let params = ListParams::default().page(page).per_page(per_page);

    match actor.name() {
        Some(name) => Ok(HomeListing::AssignedProjects(
            assigned_project_page(pool, name, &params).await?,
        )),
        None => Ok(HomeListing::PopularIssues(
            list_issues(pool, &ListParams {
                term: Some(FilterTerm::Popular),
                ..params
            })
            .await?,
        )),
    }
}

/// A user's public page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfileView {
    pub user: User,
    pub projects: Vec<Project>,
    pub issues: Vec<Issue>,
}

/// Looks up a user with everything they are assigned to
pub async fn user_profile(pool: &SqlitePool, name: &str) -> CoreResult<UserProfileView> {
    let user = User::find_by_name(pool, name)
        .await?
        .ok_or_else(|| CoreError::not_found(EntityKind::User, name))?;

    let projects = assigned_projects(pool, name, None).await?;
    let issues = assigned_issues(pool, name, None).await?;

    Ok(UserProfileView {
        user,
        projects,
        issues,
    })
}
