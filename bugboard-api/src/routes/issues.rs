/// Issue endpoints
///
/// # Endpoints
///
/// - `GET  /v1/issues[?filter=&page=]` - List issues
/// - `GET  /v1/issues/filter/:term` - List issues with a path filter
/// - `POST /v1/projects/:id/issues` - Create issue in a project
/// - `GET  /v1/issues/:id` - Detail with comment threads
/// - `POST /v1/issues/:id/update` - Update title, summary and priority
/// - `POST /v1/issues/:id/delete` - Delete issue
/// - `POST /v1/issues/:id/open` | `/close` - Change status
/// - `POST /v1/issues/:id/members/add` | `/remove` - Assignments

use axum::{
    extract::{Path, Query, State},
    response::Redirect,
    Json,
};
use bugboard_shared::{
    auth::{authorization::Actor, middleware::AuthContext},
    detail::{self, IssueDetail},
    lifecycle::{self, IssueForm},
    listing::{self, ListParams},
    members,
    models::{issue::Issue, membership::Assignable},
};
use validator::Validate;

use super::{issue_path, project_path, with_sidebar, ListQuery, ListResponse, MemberRequest, WithSidebar};
use crate::{
    app::AppState,
    error::{or_redirect, ApiResult},
};

type IssueList = Json<WithSidebar<ListResponse<Issue>>>;

async fn render_list(state: &AppState, actor: &Actor, params: ListParams) -> ApiResult<IssueList> {
    let page = listing::list_issues(&state.db, &params).await?;
    with_sidebar(
        &state.db,
        actor,
        ListResponse {
            filter: params.term,
            page,
        },
    )
    .await
}

pub async fn list_issues(
    State(state): State<AppState>,
    actor: Actor,
    Query(query): Query<ListQuery>,
) -> ApiResult<IssueList> {
    let params = query.params(state.per_page());
    render_list(&state, &actor, params).await
}

pub async fn list_issues_by_term(
    State(state): State<AppState>,
    actor: Actor,
    Path(term): Path<String>,
    Query(query): Query<ListQuery>,
) -> ApiResult<IssueList> {
    let params = query.params_with_term(&term, state.per_page())?;
    render_list(&state, &actor, params).await
}

/// Creates an issue and redirects to its project
pub async fn create_issue(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(project_id): Path<i64>,
    Json(form): Json<IssueForm>,
) -> ApiResult<Redirect> {
    lifecycle::create_issue(&state.db, &auth.actor(), project_id, &form).await?;
    Ok(Redirect::to(&project_path(project_id)))
}

/// Issue detail; counts as a visit
pub async fn issue_detail(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> ApiResult<Json<WithSidebar<IssueDetail>>> {
    let detail = detail::issue_detail(&state.db, &actor, id).await?;
    with_sidebar(&state.db, &actor, detail).await
}

pub async fn update_issue(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<i64>,
    Json(form): Json<IssueForm>,
) -> ApiResult<Redirect> {
    let location = issue_path(id);
    or_redirect(
        lifecycle::update_issue(&state.db, &auth.actor(), id, &form).await,
        &location,
    )?;
    Ok(Redirect::to(&location))
}

/// Deletes the issue and redirects to its project; creator only
pub async fn delete_issue(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<i64>,
) -> ApiResult<Redirect> {
    let issue = or_redirect(
        lifecycle::delete_issue(&state.db, &auth.actor(), id).await,
        &issue_path(id),
    )?;
    Ok(Redirect::to(&project_path(issue.project_id)))
}

pub async fn open_issue(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<i64>,
) -> ApiResult<Redirect> {
    let location = issue_path(id);
    or_redirect(lifecycle::open_issue(&state.db, &auth.actor(), id).await, &location)?;
    Ok(Redirect::to(&location))
}

pub async fn close_issue(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<i64>,
) -> ApiResult<Redirect> {
    let location = issue_path(id);
    or_redirect(lifecycle::close_issue(&state.db, &auth.actor(), id).await, &location)?;
    Ok(Redirect::to(&location))
}

pub async fn add_member(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<i64>,
    Json(req): Json<MemberRequest>,
) -> ApiResult<Redirect> {
    req.validate()?;

    let location = issue_path(id);
    or_redirect(
        members::add_member(&state.db, &auth.actor(), Assignable::Issue(id), &req.username).await,
        &location,
    )?;
    Ok(Redirect::to(&location))
}

pub async fn remove_member(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<i64>,
    Json(req): Json<MemberRequest>,
) -> ApiResult<Redirect> {
    req.validate()?;

    let location = issue_path(id);
    or_redirect(
        members::remove_member(&state.db, &auth.actor(), Assignable::Issue(id), &req.username)
            .await,
        &location,
    )?;
    Ok(Redirect::to(&location))
}
