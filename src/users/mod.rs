mod dto;
pub mod handlers;
pub mod repo;
pub mod repo_types;
mod services;


use axum::Router;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::read_routes())
        .merge(handlers::write_routes())
}
