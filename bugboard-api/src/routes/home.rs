/// Landing page
///
/// `GET /v1/home[?page=]`: signed-in users get the projects they are
/// assigned to, anonymous visitors the most visited issues.

use axum::{
    extract::{Query, State},
    Json,
};
use bugboard_shared::{
    auth::authorization::Actor,
    listing::{self, HomeListing, PageNumber},
};

use super::{with_sidebar, ListQuery, WithSidebar};
use crate::{app::AppState, error::ApiResult};

pub async fn home(
    State(state): State<AppState>,
    actor: Actor,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<WithSidebar<HomeListing>>> {
    let page = PageNumber::parse(query.page.as_deref());
    let listing = listing::home(&state.db, &actor, page, state.per_page()).await?;
    with_sidebar(&state.db, &actor, listing).await
}
