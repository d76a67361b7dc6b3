// src/state.rs

use crate::config::Config;
use crate::db::DynStore;
use axum::extract::FromRef;

/// Shared application state. The store handle is created once at startup.
#[derive(Clone)]
pub struct AppState {
    pub store: DynStore,
    pub config: Config,
}

impl FromRef<AppState> for DynStore {
    fn from_ref(state: &AppState) -> Self {
        state.store.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
