/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Authentication endpoints (register, login, refresh)
/// - `home`: Landing page
/// - `projects`, `issues`, `comments`: Tracker views and mutations
/// - `search`: Cross-entity search
/// - `users`: Public user pages
///
/// Read handlers answer with JSON that carries the sidebar next to the
/// view's own fields. Mutating handlers answer `303 See Other` pointing at
/// the view to show next.

pub mod auth;
pub mod comments;
pub mod health;
pub mod home;
pub mod issues;
pub mod projects;
pub mod search;
pub mod users;

use axum::Json;
use bugboard_shared::auth::authorization::Actor;
use bugboard_shared::listing::{FilterTerm, ListParams, Page, PageNumber};
use bugboard_shared::sidebar::{sidebar_context, SidebarContext};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use validator::Validate;

use crate::error::{ApiError, ApiResult};

/// `?filter=&page=` query of list views
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub filter: Option<String>,
    pub page: Option<String>,
}

impl ListQuery {
    /// List parameters; an unknown `filter` is ignored
    pub fn params(&self, per_page: i64) -> ListParams {
        self.params_for(FilterTerm::parse_lenient(self.filter.as_deref()), per_page)
    }

    /// List parameters for a term given as a path segment; unknown terms are 404
    pub fn params_with_term(&self, term: &str, per_page: i64) -> ApiResult<ListParams> {
        let term: FilterTerm = term
            .parse()
            .map_err(|e: bugboard_shared::listing::filter::UnknownFilterTerm| {
                ApiError::NotFound(e.to_string())
            })?;
        Ok(self.params_for(Some(term), per_page))
    }

    fn params_for(&self, term: Option<FilterTerm>, per_page: i64) -> ListParams {
        ListParams::new(term)
            .page(PageNumber::parse(self.page.as_deref()))
            .per_page(per_page)
    }
}

/// A list page together with the term that produced it
#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub filter: Option<FilterTerm>,
    #[serde(flatten)]
    pub page: Page<T>,
}

/// View body with the sidebar fields merged in
#[derive(Debug, Serialize)]
pub struct WithSidebar<T> {
    #[serde(flatten)]
    pub body: T,
    #[serde(flatten)]
    pub sidebar: SidebarContext,
}

/// Wraps a view body with the actor's sidebar
pub async fn with_sidebar<T: Serialize>(
    pool: &SqlitePool,
    actor: &Actor,
    body: T,
) -> ApiResult<Json<WithSidebar<T>>> {
    let sidebar = sidebar_context(pool, actor).await?;
    Ok(Json(WithSidebar { body, sidebar }))
}

/// `{ "username": ... }` body of the member routes
#[derive(Debug, Deserialize, Validate)]
pub struct MemberRequest {
    #[validate(length(max = 64, message = "Ensure this value has at most 64 characters"))]
    pub username: String,
}

pub(crate) fn project_path(id: i64) -> String {
    format!("/v1/projects/{}", id)
}

pub(crate) fn issue_path(id: i64) -> String {
    format!("/v1/issues/{}", id)
}

pub(crate) const HOME_PATH: &str = "/v1/home";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_query_params() {
        let query = ListQuery {
            filter: Some("Popular".to_string()),
            page: Some("last".to_string()),
        };
        let params = query.params(10);
        assert_eq!(params.term, Some(FilterTerm::Popular));
        assert_eq!(params.page, PageNumber::Last);

        let query = ListQuery {
            filter: Some("bogus".to_string()),
            page: Some("x".to_string()),
        };
        let params = query.params(5);
        assert_eq!(params.term, None);
        assert_eq!(params.page, PageNumber::Number(1));
        assert_eq!(params.per_page, 5);
    }

    #[test]
    fn test_path_term_must_be_known() {
        let query = ListQuery::default();
        assert_eq!(
            query.params_with_term("closed", 10).unwrap().term,
            Some(FilterTerm::Closed)
        );
        assert!(matches!(
            query.params_with_term("bogus", 10),
            Err(ApiError::NotFound(_))
        ));
    }
}
