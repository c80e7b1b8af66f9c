use axum::Router;

pub mod items;
pub mod system;
pub mod transactions;

/// Router for all application endpoints.
pub fn router() -> Router {
    Router::new()
        .nest("/items", items::router())
        .nest("/transactions", transactions::router())
}
