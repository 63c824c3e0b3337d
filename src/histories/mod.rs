use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub mod dto;
pub mod handlers;
pub mod repo;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/histories",
            get(handlers::list_histories).post(handlers::create_historic),
        )
        .route("/histories/check-out", post(handlers::check_out))
        .route("/histories/get-car-in-use", get(handlers::get_car_in_use))
        .route(
            "/histories/:id",
            get(handlers::get_historic)
                .put(handlers::update_historic)
                .delete(handlers::delete_historic),
        )
}
