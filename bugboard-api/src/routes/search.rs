/// Search endpoint
///
/// `GET /v1/search?q=` returns matching projects, then issues, then users.
/// A missing or blank query returns an empty result list.

use axum::{
    extract::{Query, State},
    Json,
};
use bugboard_shared::{
    auth::authorization::Actor,
    search::{self, SearchHit},
};
use serde::{Deserialize, Serialize};

use super::{with_sidebar, WithSidebar};
use crate::{app::AppState, error::ApiResult};

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    /// Query as it was matched, after trimming
    pub query: String,
    pub results: Vec<SearchHit>,
}

pub async fn search(
    State(state): State<AppState>,
    actor: Actor,
    Query(params): Query<SearchQuery>,
) -> ApiResult<Json<WithSidebar<SearchResponse>>> {
    let results = search::search(&state.db, &params.q).await?;
    let response = SearchResponse {
        query: search::normalize_query(&params.q).unwrap_or_default(),
        results,
    };
    with_sidebar(&state.db, &actor, response).await
}
