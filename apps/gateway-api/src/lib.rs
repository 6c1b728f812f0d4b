pub mod auth;
pub mod config;
pub mod correlation;
pub mod error;
pub mod notify;
pub mod proxy;
pub mod realtime;
pub mod routes;

use std::sync::Arc;

use auth::verify::IdentityVerifier;
use config::Config;
use notify::dispatch::NotificationDispatcher;
use proxy::table::RouteTable;
use realtime::hub::RealtimeHub;

/// Shared application state available to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub routes: Arc<RouteTable>,
    pub verifier: IdentityVerifier,
    pub hub: Arc<RealtimeHub>,
    pub dispatcher: Arc<NotificationDispatcher>,
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(config: Config, routes: RouteTable) -> Self {
        let verifier = IdentityVerifier::new(
            &config.auth_verify_url,
            config.auth_timeout,
            config.public_routes.clone(),
        );
        let hub = Arc::new(RealtimeHub::new());
        let dispatcher = Arc::new(NotificationDispatcher::new(hub.clone()));

        Self {
            config: Arc::new(config),
            routes: Arc::new(routes),
            verifier,
            hub,
            dispatcher,
            http: reqwest::Client::new(),
        }
    }
}
