//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use mind_mapper_core::ports::{AccountService, CompletionService, IdentityService, MapStore};
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub maps: Arc<dyn MapStore>,
    pub accounts: Arc<dyn AccountService>,
    pub identity: Arc<dyn IdentityService>,
    pub completion: Arc<dyn CompletionService>,
    /// Lifetime of bearer tokens issued at signup/login, in days.
    pub auth_session_days: i64,
}
