pub mod adapters;
pub mod domain;
pub mod infra;
pub mod normalizer;
pub mod services;

use {
    crate::{domain::store::Store, normalizer::NormalizerRegistry},
    axum::{
        Router,
        extract::DefaultBodyLimit,
        routing::{get, post},
    },
    std::{sync::Arc, time::Duration},
    tower_http::timeout::TimeoutLayer,
};

pub struct AppState<S> {
    pub store: Arc<S>,
    pub normalizers: Arc<NormalizerRegistry>,
}

// Manual impl: `S` itself does not need to be `Clone` behind the `Arc`s.
impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            normalizers: Arc::clone(&self.normalizers),
        }
    }
}

impl<S: Store> AppState<S> {
    pub fn new(store: S) -> Self {
        Self {
            store: Arc::new(store),
            normalizers: Arc::new(NormalizerRegistry::with_defaults()),
        }
    }
}

pub fn router<S: Store>(state: AppState<S>) -> Router {
    // Reads get a timeout; the webhook route does not — an accepted
    // delivery runs the chain to completion before responding.
    let reads: Router<AppState<S>> = Router::new()
        .route("/sales", get(adapters::reads::list_sales::<S>))
        .route("/abandons", get(adapters::reads::list_abandons::<S>))
        .route("/products", get(adapters::reads::list_products::<S>))
        .layer(TimeoutLayer::new(Duration::from_secs(10)));

    Router::new()
        .route("/", get(|| async { "ok" }))
        .route(
            "/webhooks/{gateway}/{token}",
            post(adapters::webhook::gateway_webhook_handler::<S>),
        )
        .merge(reads)
        .layer(DefaultBodyLimit::max(256 * 1024)) // item-heavy sale payloads stay well under this
        .with_state(state)
}
