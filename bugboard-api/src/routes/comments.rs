/// Comment endpoints
///
/// Every comment mutation redirects back to the issue the comment is on.
///
/// - `POST /v1/issues/:id/comments` - Add a comment or a reply
/// - `POST /v1/comments/:id/edit` - Replace the text; author only
/// - `POST /v1/comments/:id/delete` - Delete with all replies; author only

use axum::{
    extract::{Path, State},
    response::Redirect,
    Json,
};
use bugboard_shared::{auth::middleware::AuthContext, models::comment::Comment, threads};
use serde::Deserialize;

use super::issue_path;
use crate::{
    app::AppState,
    error::{or_redirect, ApiError, ApiResult},
};

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub text: String,

    /// Comment being replied to; omitted for a new thread
    #[serde(default)]
    pub parent_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct EditCommentRequest {
    pub text: String,
}

async fn issue_of(state: &AppState, comment_id: i64) -> ApiResult<String> {
    let comment = Comment::find_by_id(&state.db, comment_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("comment {} not found", comment_id)))?;
    Ok(issue_path(comment.issue_id))
}

pub async fn add_comment(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(issue_id): Path<i64>,
    Json(req): Json<CommentRequest>,
) -> ApiResult<Redirect> {
    threads::add_comment(&state.db, &auth.actor(), issue_id, &req.text, req.parent_id).await?;
    Ok(Redirect::to(&issue_path(issue_id)))
}

pub async fn edit_comment(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<i64>,
    Json(req): Json<EditCommentRequest>,
) -> ApiResult<Redirect> {
    let location = issue_of(&state, id).await?;
    or_redirect(
        threads::edit_comment(&state.db, &auth.actor(), id, &req.text).await,
        &location,
    )?;
    Ok(Redirect::to(&location))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<i64>,
) -> ApiResult<Redirect> {
    let location = issue_of(&state, id).await?;
    or_redirect(threads::delete_comment(&state.db, &auth.actor(), id).await, &location)?;
    Ok(Redirect::to(&location))
}
