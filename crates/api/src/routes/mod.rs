//! API route definitions.

use axum::{Router, middleware};

use crate::{AppState, middleware::auth_middleware};
use parkdesk_core::till::MovementStore;

pub mod health;
pub mod till;

/// Creates the API router: public health check plus the authenticated till routes.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state<S: MovementStore + 'static>(
    state: AppState<S>,
) -> Router<AppState<S>> {
    let protected_routes = Router::new()
        .merge(till::routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware::<S>,
        ));

    Router::new()
        .merge(health::routes())
        .merge(protected_routes)
}
