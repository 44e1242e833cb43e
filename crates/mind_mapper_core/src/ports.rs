//! crates/mind_mapper_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or APIs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::Stream;
use std::pin::Pin;
use uuid::Uuid;

use crate::domain::{MapFields, StoredMap, User, UserCredentials};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

/// A stream of one user's stored maps.
pub type MapStream<'a> = Pin<Box<dyn Stream<Item = PortResult<StoredMap>> + Send + 'a>>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Per-user document storage for mind maps.
///
/// Documents are scoped to `user_id` in every call; a document owned by
/// another user is reported as `NotFound`.
#[async_trait]
pub trait MapStore: Send + Sync {
    /// Stores a new document under a freshly generated id.
    async fn create_map(&self, user_id: Uuid, fields: MapFields) -> PortResult<StoredMap>;

    async fn get_map(&self, user_id: Uuid, map_id: Uuid) -> PortResult<StoredMap>;

    /// Merges `updates` into the stored field set; keys not named are left untouched.
    async fn update_map(&self, user_id: Uuid, map_id: Uuid, updates: MapFields) -> PortResult<()>;

    fn stream_maps(&self, user_id: Uuid) -> MapStream<'_>;
}

/// Chat-completion access to the hosted language model.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Sends a system instruction in JSON-object mode and returns the raw completion text.
    async fn complete_json(&self, system_prompt: &str) -> PortResult<String>;

    /// Sends a free-form prompt and returns the completion text.
    async fn complete_text(&self, prompt: &str) -> PortResult<String>;
}

/// Resolves a bearer token to the user it was issued to.
#[async_trait]
pub trait IdentityService: Send + Sync {
    async fn verify_token(&self, token: &str) -> PortResult<Uuid>;
}

#[async_trait]
pub trait AccountService: Send + Sync {
    async fn create_user_with_email(&self, email: &str, hashed_password: &str) -> PortResult<User>;

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    async fn create_auth_session(
        &self,
        token: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    async fn delete_auth_session(&self, token: &str) -> PortResult<()>;
}
