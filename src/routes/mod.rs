use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};

use crate::handlers::{admin, auth, purchase, trips};
use crate::middleware::auth::{auth_middleware, require_admin};
use crate::middleware::rate_limit::create_public_governor;
use crate::AppState;

pub fn create_router(state: AppState) -> Router {
    // IP-based governor for unauthenticated routes
    let public_governor = create_public_governor();

    // Public routes
    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", get(auth::logout))
        .layer(public_governor.clone());

    let public_routes = Router::new()
        .route("/trips", get(trips::search_trips))
        .layer(public_governor);

    // Admin routes (requires auth + admin role)
    let admin_routes = Router::new()
        .route("/trips", post(admin::create_trip))
        .route("/trips/{id}", delete(admin::cancel_trip))
        .route("/trips/{id}/sold", get(admin::sold_tickets))
        .route("/trips/{id}/revenue", get(admin::trip_revenue))
        .layer(middleware::from_fn(require_admin))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Purchase routes (any authenticated user)
    let purchase_routes = Router::new()
        .route("/purchase/{id}", post(purchase::purchase))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(auth_routes)
        .merge(public_routes)
        .merge(purchase_routes)
        .nest("/admin", admin_routes)
        .with_state(state)
}
