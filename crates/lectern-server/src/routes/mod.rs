// Export route modules
pub mod courses;
pub mod query;

use crate::state::AppState;
use axum::Router;

// Function to configure all routes
pub fn configure(state: AppState) -> Router {
    Router::new()
        .merge(query::routes(state.clone()))
        .merge(courses::routes(state))
}
