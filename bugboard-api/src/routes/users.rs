/// Public user page
///
/// `GET /v1/users/:name` shows the user with every project and issue they
/// are assigned to.

use axum::{
    extract::{Path, State},
    Json,
};
use bugboard_shared::{
    auth::authorization::Actor,
    listing::{self, UserProfileView},
};

use super::{with_sidebar, WithSidebar};
use crate::{app::AppState, error::ApiResult};

pub async fn user_profile(
    State(state): State<AppState>,
    actor: Actor,
    Path(name): Path<String>,
) -> ApiResult<Json<WithSidebar<UserProfileView>>> {
    let profile = listing::user_profile(&state.db, &name).await?;
    with_sidebar(&state.db, &actor, profile).await
}
