/// Comment thread manager
///
/// Writes comments and replies, and arranges an issue's comments into a
/// forest for display. Reply counts are computed by walking the forest in
/// memory, so one query serves a whole thread.
///
/// # Example
///
/// ```no_run
/// use bugboard_shared::auth::authorization::Actor;
/// use bugboard_shared::threads::{add_comment, ThreadForest};
/// use bugboard_shared::models::comment::Comment;
///
/// # async fn example(pool: sqlx::SqlitePool) -> Result<(), Box<dyn std::error::Error>> {
/// let actor = Actor::user("chondosha");
/// let root = add_comment(&pool, &actor, 1, "Seeing this too", None).await?;
/// add_comment(&pool, &actor, 1, "Fixed on main", Some(root.id)).await?;
///
/// let forest = ThreadForest::new(Comment::list_for_issue(&pool, 1).await?);
/// assert_eq!(forest.reply_count(root.id), 1);
/// # Ok(())
/// # }
/// ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::info;

use crate::auth::authorization::{require_author, Actor};
use crate::error::{require_text, CoreError, CoreResult, EntityKind};
use crate::lifecycle::{load_issue, log_rejection};
use crate::models::comment::{Comment, CreateComment};

/// Comment with its nested replies
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentNode {
    #[serde(flatten)]
    pub comment: Comment,
    /// All descendants, not just direct replies
    pub reply_count: usize,
    pub replies: Vec<CommentNode>,
}

/// The comments of one issue arranged by parent
#[derive(Debug, Clone, Default)]
pub struct ThreadForest {
    comments: HashMap<i64, Comment>,
    roots: Vec<i64>,
    children: HashMap<i64, Vec<i64>>,
}

impl ThreadForest {
    /// Builds the forest from comments in creation order
    ///
    /// A comment whose parent is not in the list is treated as a root.
    pub fn new(comments: Vec<Comment>) -> Self {
        let mut forest = ThreadForest::default();
        let ids: Vec<i64> = comments.iter().map(|c| c.id).collect();
        forest.comments = comments.into_iter().map(|c| (c.id, c)).collect();

        for id in ids {
            let parent = forest.comments[&id]
                .parent_id
                .filter(|p| forest.comments.contains_key(p));
            match parent {
                Some(parent) => forest.children.entry(parent).or_default().push(id),
                None => forest.roots.push(id),
            }
        }

        forest
    }

    pub fn len(&self) -> usize {
        self.comments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.comments.is_empty()
    }

    pub fn get(&self, id: i64) -> Option<&Comment> {
        self.comments.get(&id)
    }

    /// Direct replies of a comment, oldest first
    pub fn replies(&self, id: i64) -> &[i64] {
        self.children.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of direct replies plus, recursively, their reply counts
    pub fn reply_count(&self, id: i64) -> usize {
        let replies = self.replies(id);
        replies.len() + replies.iter().map(|r| self.reply_count(*r)).sum::<usize>()
    }

    fn node(&self, id: i64) -> Option<CommentNode> {
        let comment = self.comments.get(&id)?.clone();
        let replies = self.replies(id).iter().filter_map(|r| self.node(*r)).collect();

        Some(CommentNode {
            comment,
            reply_count: self.reply_count(id),
            replies,
        })
    }

    /// Root threads in creation order, each with its replies nested
    pub fn into_nodes(self) -> Vec<CommentNode> {
        self.roots.iter().filter_map(|id| self.node(*id)).collect()
    }
}

async fn load_comment(pool: &SqlitePool, id: i64) -> CoreResult<Comment> {
    Comment::find_by_id(pool, id)
        .await?
        .ok_or_else(|| CoreError::not_found(EntityKind::Comment, id))
}

/// Writes a comment on an issue, optionally as a reply
///
/// # Errors
///
/// `Validation` for blank text, or for a parent that does not exist or
/// belongs to another issue.
pub async fn add_comment(
    pool: &SqlitePool,
    actor: &Actor,
    issue_id: i64,
    text: &str,
    parent_id: Option<i64>,
) -> CoreResult<Comment> {
    let name = actor.require()?;
    load_issue(pool, issue_id).await?;
    let text = require_text("text", text, None)?;

    let depth = match parent_id {
        None => 0,
        Some(parent_id) => {
            let parent = Comment::find_by_id(pool, parent_id)
                .await?
                .filter(|p| p.issue_id == issue_id)
                .ok_or_else(|| {
                    CoreError::validation("parent_id", "Parent comment is not part of this issue")
                })?;
            parent.depth + 1
        }
    };

    let comment = Comment::create(
        pool,
        CreateComment {
            user_name: name.to_string(),
            text,
            issue_id,
            parent_id,
            depth,
        },
    )
    .await?;

    info!(comment_id = comment.id, issue_id, depth, user = name, "Comment added");
    Ok(comment)
}

/// Replaces a comment's text; author only
pub async fn edit_comment(
    pool: &SqlitePool,
    actor: &Actor,
    comment_id: i64,
    text: &str,
) -> CoreResult<Comment> {
    let comment = load_comment(pool, comment_id).await?;
    let name = log_rejection(require_author(actor, &comment), "edit_comment", comment_id)?;
    let text = require_text("text", text, None)?;

    let comment = Comment::update_text(pool, comment_id, &text)
        .await?
        .ok_or_else(|| CoreError::not_found(EntityKind::Comment, comment_id))?;

    info!(comment_id, user = name, "Comment edited");
    Ok(comment)
}

/// Deletes a comment and all replies below it; author only
///
/// Returns the removed comment so callers can find its issue.
pub async fn delete_comment(pool: &SqlitePool, actor: &Actor, comment_id: i64) -> CoreResult<Comment> {
    let comment = load_comment(pool, comment_id).await?;
    let name = log_rejection(require_author(actor, &comment), "delete_comment", comment_id)?;

    Comment::delete(pool, comment_id).await?;

    info!(comment_id, issue_id = comment.issue_id, user = name, "Comment deleted");
    Ok(comment)
}

/// Full comment forest of an issue
pub async fn issue_threads(pool: &SqlitePool, issue_id: i64) -> Result<Vec<CommentNode>, sqlx::Error> {
    let comments = Comment::list_for_issue(pool, issue_id).await?;
    Ok(ThreadForest::new(comments).into_nodes())
}
