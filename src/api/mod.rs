use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::config::Config;
use crate::services::{AuthService, CatalogService, EntryService, FavoriteService};
use crate::state::SharedState;

pub mod auth;
mod catalog;
mod entries;
mod error;
mod extract;
mod favorites;
mod observability;
mod profile;
mod system;
mod types;
mod validation;

pub use auth::CurrentUser;
pub use error::ApiError;
pub use types::*;

use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }

    #[must_use]
    pub fn catalog(&self) -> &Arc<CatalogService> {
        &self.shared.catalog
    }

    #[must_use]
    pub fn entry_service(&self) -> &Arc<dyn EntryService> {
        &self.shared.entry_service
    }

    #[must_use]
    pub fn favorite_service(&self) -> &Arc<dyn FavoriteService> {
        &self.shared.favorite_service
    }

    #[must_use]
    pub fn auth_service(&self) -> &Arc<dyn AuthService> {
        &self.shared.auth_service
    }
}

#[must_use]
pub fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    Arc::new(AppState {
        shared,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    })
}

pub fn router(state: Arc<AppState>) -> Router {
    let server = &state.config().server;

    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(server.secure_cookies)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(
            server.session_inactivity_minutes,
        )));

    let cors_layer = if server.cors_allowed_origins.iter().any(|o| o == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = server
            .cors_allowed_origins
            .iter()
            .filter_map(|s| s.parse().ok())
            .collect();
        CorsLayer::new().allow_origin(origins)
    };

    let api_router = Router::new()
        .merge(create_protected_router(state.clone()))
        .route("/auth/signup", post(auth::signup))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/verify-email", post(auth::verify_email))
        .route("/auth/forgot-password", post(auth::forgot_password))
        .route("/auth/reset-password", post(auth::reset_password))
        .route("/catalog/{kind}", get(catalog::search))
        .route("/catalog/{kind}/{mal_id}", get(catalog::get_title))
        .route("/catalog/{kind}/top", get(catalog::top))
        .route("/catalog/{kind}/home", get(catalog::home))
        .route("/catalog/{kind}/genres", get(catalog::genres))
        .route("/catalog/seasons/now", get(catalog::season_now))
        .route(
            "/catalog/seasons/{year}/{season}",
            get(catalog::season),
        )
        .route("/system/health/live", get(system::health_live))
        .route("/system/health/ready", get(system::health_ready))
        .route("/metrics", get(observability::get_metrics))
        .layer(session_layer)
        .layer(middleware::from_fn(observability::logging_middleware))
        .with_state(state);

    Router::new()
        .nest("/api", api_router)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}

fn create_protected_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/me", get(auth::get_current_user))
        .route("/auth/api-key", get(auth::get_api_key))
        .route("/auth/api-key/regenerate", post(auth::regenerate_api_key))
        .route(
            "/profile",
            get(profile::get_profile).put(profile::update_profile),
        )
        .route("/entries", get(entries::list_entries))
        .route(
            "/entries/{kind}/{mal_id}",
            get(entries::get_entry)
                .put(entries::upsert_entry)
                .delete(entries::remove_entry),
        )
        .route(
            "/entries/{kind}/{mal_id}/progress",
            post(entries::step_progress),
        )
        .route("/favorites", get(favorites::list_favorites))
        .route(
            "/favorites/{kind}/{mal_id}/toggle",
            post(favorites::toggle_favorite),
        )
        .route_layer(middleware::from_fn_with_state(state, auth::auth_middleware))
}
