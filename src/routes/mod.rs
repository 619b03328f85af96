use axum::Router;

use crate::state::AppState;

pub mod admissions;
pub mod auth;
pub mod cart;
pub mod community;
pub mod doc;
pub mod health;
pub mod orders;
pub mod params;
pub mod products;
pub mod settings;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/products", products::router())
        .nest("/cart", cart::router())
        .nest("/orders", orders::router())
        .nest("/admissions", admissions::router())
        .nest("/admin/settings", settings::router())
        .nest("/community", community::router())
}
