use axum::{extract::Request, middleware, routing::post, Router};
use log::{info, warn};
use std::sync::Arc;

use rsvper_shared::error::Result;
use rsvper_shared::store::{sheets::SheetsRowStore, RowStore};

use crate::handlers::webhook_handlers::handle_webhook;

/// Creates a router backed by the live Sheets store.
pub fn create_router() -> Result<Router> {
    info!("Creating router with Google Sheets store");

    let store = Arc::new(SheetsRowStore::new()?);

    // API Gateway prefixes the stage name; local runs don't want it.
    let remove_base_path = std::env::var("REMOVE_BASE_PATH")
        .map(|v| v.to_lowercase() == "true")
        .unwrap_or(false);
    let prefix = if remove_base_path { "" } else { "/Prod" };
    info!("Using API route prefix: {:?}", prefix);

    Ok(create_router_with_store(store, prefix))
}

/// Creates a router with a given store implementation
pub fn create_router_with_store<S>(store: Arc<S>, prefix: &str) -> Router
where
    S: RowStore + 'static,
{
    // Logging middleware to trace all requests
    async fn logging_middleware(
        req: Request,
        next: axum::middleware::Next,
    ) -> impl axum::response::IntoResponse {
        info!(
            "Router received request: method={}, uri={}",
            req.method(),
            req.uri()
        );
        next.run(req).await
    }

    let api_routes = Router::new()
        .route("/webhook", post(handle_webhook::<S>))
        .with_state(store);

    let router = if prefix.is_empty() {
        Router::new().merge(api_routes)
    } else {
        Router::new().nest(prefix, api_routes)
    };

    router
        .layer(middleware::from_fn(logging_middleware))
        .fallback(|req: Request| async move {
            warn!("No route matched for: {} {}", req.method(), req.uri());
            (
                axum::http::StatusCode::NOT_FOUND,
                "The requested resource was not found".to_string(),
            )
        })
}
