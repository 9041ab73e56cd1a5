use axum::{
    http::{HeaderValue, Method},
    middleware,
    routing::{get, patch, MethodRouter},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    config::Config,
    middleware::{auth, logging},
    openapi::ApiDoc,
    routes::{health, messages, threads},
    state::AppState,
};

type StateRouter = Router<Arc<AppState>>;

/// Build the full application router with middleware applied
pub fn build_router(state: Arc<AppState>) -> Router {
    let api_routes = [
        // Threads
        ("/threads", get(threads::list_threads).post(threads::create_thread)),
        ("/threads/list_for_user", get(threads::list_for_user)),
        (
            "/threads/:thread_id",
            get(threads::get_thread)
                .put(threads::replace_thread)
                .patch(threads::update_thread)
                .delete(threads::delete_thread),
        ),
        // Messages
        ("/messages", get(messages::list_messages).post(messages::create_message)),
        ("/messages/unread-count", get(messages::unread_count)),
        ("/messages/:message_id", get(messages::get_message)),
        ("/messages/:message_id/mark-as-read", patch(messages::mark_as_read)),
        ("/messages/thread/:thread_id/messages", get(messages::list_for_thread)),
    ]
    .into_iter()
    .fold(Router::new(), |router, (path, handler)| {
        route_with_slash(router, path, handler)
    })
    .route_layer(middleware::from_fn_with_state(
        state.clone(),
        auth::require_principal,
    ));

    Router::new()
        .route("/health", get(health::health_check))
        .merge(api_routes)
        .merge(SwaggerUi::new("/api/docs").url("/api/openapi.json", ApiDoc::openapi()))
        .layer(middleware::from_fn(logging::log_request))
        .layer(TimeoutLayer::new(Duration::from_secs(
            state.config.server.request_timeout_secs,
        )))
        .layer(build_cors_layer(&state.config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Trailing slashes are optional on every API path
fn route_with_slash(
    router: StateRouter,
    path: &str,
    handler: MethodRouter<Arc<AppState>>,
) -> StateRouter {
    router
        .route(path, handler.clone())
        .route(&format!("{}/", path), handler)
}

fn build_cors_layer(config: &Config) -> CorsLayer {
    if !config.cors.enabled {
        return CorsLayer::permissive();
    }

    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    if config.cors.origins.iter().any(|o| o == "*") {
        cors.allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .cors
            .origins
            .iter()
            .filter_map(|o| o.parse::<HeaderValue>().ok())
            .collect();
        cors.allow_origin(origins)
    }
}
