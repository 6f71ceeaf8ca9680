/// Project endpoints
///
/// # Endpoints
///
/// - `GET  /v1/projects[?filter=&page=]` - List projects
/// - `GET  /v1/projects/filter/:term` - List projects with a path filter
/// - `POST /v1/projects` - Create project
/// - `GET  /v1/projects/:id[?filter=&page=]` - Detail with scoped issues
/// - `GET  /v1/projects/:id/filter/:term` - Detail with a path filter
/// - `POST /v1/projects/:id/update` - Update title and summary
/// - `POST /v1/projects/:id/delete` - Delete project
/// - `POST /v1/projects/:id/members/add` - Assign a user
/// - `POST /v1/projects/:id/members/remove` - Unassign a user

use axum::{
    extract::{Path, Query, State},
    response::Redirect,
    Json,
};
use bugboard_shared::{
    auth::{authorization::Actor, middleware::AuthContext},
    detail::{self, ProjectDetail},
    lifecycle::{self, ProjectForm},
    listing::{self, ListParams},
    members,
    models::{membership::Assignable, project::Project},
};
use validator::Validate;

use super::{project_path, with_sidebar, ListQuery, ListResponse, MemberRequest, WithSidebar, HOME_PATH};
use crate::{
    app::AppState,
    error::{or_redirect, ApiResult},
};

type ProjectList = Json<WithSidebar<ListResponse<Project>>>;

async fn render_list(state: &AppState, actor: &Actor, params: ListParams) -> ApiResult<ProjectList> {
    let page = listing::list_projects(&state.db, &params).await?;
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

pub async fn list_projects(
    State(state): State<AppState>,
    actor: Actor,
    Query(query): Query<ListQuery>,
) -> ApiResult<ProjectList> {
    let params = query.params(state.per_page());
    render_list(&state, &actor, params).await
}

pub async fn list_projects_by_term(
    State(state): State<AppState>,
    actor: Actor,
    Path(term): Path<String>,
    Query(query): Query<ListQuery>,
) -> ApiResult<ProjectList> {
    let params = query.params_with_term(&term, state.per_page())?;
    render_list(&state, &actor, params).await
}

/// Creates a project and redirects to it
pub async fn create_project(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(form): Json<ProjectForm>,
) -> ApiResult<Redirect> {
    let project = lifecycle::create_project(&state.db, &auth.actor(), &form).await?;
    Ok(Redirect::to(&project_path(project.id)))
}

async fn render_detail(
    state: &AppState,
    actor: &Actor,
    id: i64,
    params: ListParams,
) -> ApiResult<Json<WithSidebar<ProjectDetail>>> {
    let detail = detail::project_detail(&state.db, actor, id, &params).await?;
    with_sidebar(&state.db, actor, detail).await
}

/// Project detail; counts as a visit
pub async fn project_detail(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<WithSidebar<ProjectDetail>>> {
    let params = query.params(state.per_page());
    render_detail(&state, &actor, id, params).await
}

pub async fn project_detail_by_term(
    State(state): State<AppState>,
    actor: Actor,
    Path((id, term)): Path<(i64, String)>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<WithSidebar<ProjectDetail>>> {
    let params = query.params_with_term(&term, state.per_page())?;
    render_detail(&state, &actor, id, params).await
}

/// Updates title and summary; creator or members
pub async fn update_project(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<i64>,
    Json(form): Json<ProjectForm>,
) -> ApiResult<Redirect> {
    let location = project_path(id);
    or_redirect(
        lifecycle::update_project(&state.db, &auth.actor(), id, &form).await,
        &location,
    )?;
    Ok(Redirect::to(&location))
}

/// Deletes the project with its issues and comments; creator only
pub async fn delete_project(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<i64>,
) -> ApiResult<Redirect> {
    or_redirect(
        lifecycle::delete_project(&state.db, &auth.actor(), id).await,
        &project_path(id),
    )?;
    Ok(Redirect::to(HOME_PATH))
}

pub async fn add_member(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<i64>,
    Json(req): Json<MemberRequest>,
) -> ApiResult<Redirect> {
    req.validate()?;

    let location = project_path(id);
    or_redirect(
        members::add_member(&state.db, &auth.actor(), Assignable::Project(id), &req.username).await,
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

    let location = project_path(id);
    or_redirect(
        members::remove_member(&state.db, &auth.actor(), Assignable::Project(id), &req.username)
            .await,
        &location,
    )?;
    Ok(Redirect::to(&location))
}
