use std::sync::Arc;
use std::time::Duration;

use store::{PlacementDefaults, Projects, Store};
use tracing::warn;

use crate::auth::{TokenError, TokenKey, Tokens};
use crate::settings::{Auth, Server, Settings};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState<S> {
    pub store: S,
    pub projects: Projects<S>,
    pub tokens: Arc<Tokens>,
    pub auth: Arc<Auth>,
    pub server: Arc<Server>,
    pub placement: Arc<PlacementDefaults>,
}

impl<S: Store> AppState<S> {
    pub fn new(store: S, settings: &Settings) -> Result<Self, TokenError> {
        let key = if settings.auth.token_key.trim().is_empty() {
            warn!("auth.token_key is not set; tokens will not survive a restart");
            TokenKey::generate()
        } else {
            TokenKey::from_hex(&settings.auth.token_key)?
        };
        let tokens = Tokens::new(key, Duration::from_secs(settings.auth.token_ttl_secs));
        let projects = Projects::new(store.clone()).with_limits(settings.placement.limits.clone());

        Ok(Self {
            store,
            projects,
            tokens: Arc::new(tokens),
            auth: Arc::new(settings.auth.clone()),
            server: Arc::new(settings.server.clone()),
            placement: Arc::new(settings.placement.clone()),
        })
    }
}
