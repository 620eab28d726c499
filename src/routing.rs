//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router,
    http::{
        HeaderValue, Method,
        header::{ACCEPT, CONTENT_TYPE},
    },
    middleware,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;

use crate::{
    AppState, Error,
    auth::{auth_guard, get_current_user, post_log_in, post_log_out, register_user},
    dashboard::{get_dashboard_chart, get_dashboard_summary},
    endpoints,
    transaction::{get_export_preview, get_transactions, get_unique_users, post_export},
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::REGISTER, post(register_user))
        .route(endpoints::LOG_IN, post(post_log_in))
        .route(endpoints::LOG_OUT, post(post_log_out));

    let protected_routes = Router::new()
        .route(endpoints::CURRENT_USER, get(get_current_user))
        .route(endpoints::DASHBOARD_SUMMARY, get(get_dashboard_summary))
        .route(endpoints::DASHBOARD_CHART, get(get_dashboard_chart))
        .route(endpoints::TRANSACTIONS, get(get_transactions))
        .route(endpoints::TRANSACTION_USERS, get(get_unique_users))
        .route(endpoints::EXPORT_PREVIEW, get(get_export_preview))
        .route(endpoints::EXPORT, post(post_export))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    protected_routes
        .merge(unprotected_routes)
        .fallback(get_404_not_found)
        .with_state(state)
}

/// Allow the single page app hosted at `frontend_url` to call the API with its session cookie.
///
/// # Errors
/// Returns a [Error::ValidationError] if `frontend_url` is not a valid header value.
pub fn cors_layer(frontend_url: &str) -> Result<CorsLayer, Error> {
    let origin = frontend_url
        .trim_end_matches('/')
        .parse::<HeaderValue>()
        .map_err(|error| {
            Error::ValidationError(format!("invalid frontend URL \"{frontend_url}\": {error}"))
        })?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([ACCEPT, CONTENT_TYPE])
        .allow_credentials(true))
}

async fn get_404_not_found() -> Error {
    Error::NotFound
}
