//! Provider API Handler

use axum::{Json, extract::State};
use promptlab_core::dto::provider::ProviderList;

use crate::state::AppState;

/// GET /api/providers
/// Providers and models steps may use
pub async fn list_providers(State(state): State<AppState>) -> Json<ProviderList> {
    tracing::debug!("Listing providers");

    Json(ProviderList {
        providers: state.engine.providers(),
    })
}
