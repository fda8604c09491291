use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use crate::handlers::{admin, auth, booking, route, schedule, ws};
use crate::middleware::auth::{auth_middleware, require_admin, require_passenger};
use crate::middleware::rate_limit::{create_passenger_governor, create_public_governor};
use crate::AppState;

pub fn create_router(state: AppState) -> Router {
    // IP-based governor for unauthenticated routes, per-user governor for
    // passenger booking routes
    let public_governor = create_public_governor();
    let passenger_governor = create_passenger_governor();

    // Public routes
    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .layer(public_governor.clone());

    let catalog_routes = Router::new()
        .route("/routes", get(route::list_routes))
        .route("/routes/{id}", get(route::get_route))
        .route("/schedules", get(schedule::list_schedules))
        .route("/schedules/{id}", get(schedule::get_schedule))
        .route("/schedules/route/{route_id}", get(schedule::list_by_route))
        .route("/schedules/{id}/available-seats", get(schedule::available_seats))
        .layer(public_governor);

    // Passenger routes (requires auth + passenger role)
    let booking_routes = Router::new()
        .route("/", post(booking::create_booking))
        .route("/round-trip", post(booking::create_round_trip))
        .route("/multi-city", post(booking::create_multi_city))
        .route("/my-bookings", get(booking::my_bookings))
        .route("/code/{code}", get(booking::get_by_code))
        .route("/{code}", delete(booking::cancel_booking))
        .route("/complex/{code}", delete(booking::cancel_complex_booking))
        .layer(passenger_governor)
        .layer(middleware::from_fn(require_passenger))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Admin routes (requires auth + admin role)
    let admin_routes = Router::new()
        .route("/routes", post(admin::create_route))
        .route("/routes/{id}", put(admin::update_route))
        .route("/routes/{id}", delete(admin::delete_route))
        .route("/buses", post(admin::create_bus))
        .route("/schedules", post(admin::create_schedule))
        .route("/schedules/{id}", put(admin::update_schedule))
        .route("/schedules/{id}", delete(admin::delete_schedule))
        .route("/bookings", get(admin::list_all_bookings))
        .route("/bookings/{id}/status", put(admin::update_booking_status))
        .route("/announce", post(admin::announce))
        .layer(middleware::from_fn(require_admin))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Combine all routes
    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api", catalog_routes)
        .route("/api/ws", get(ws::ws_handler))
        .nest("/api/bookings", booking_routes)
        .nest("/api/admin", admin_routes)
        .with_state(state)
}
