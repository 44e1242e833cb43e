//! services/api/src/adapters/memory.rs
//!
//! A process-local implementation of the storage and identity ports.
//!
//! Used by the integration tests and for running the API without PostgreSQL.
//! Everything lives behind one lock and is lost on restart.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mind_mapper_core::domain::{MapFields, StoredMap, User, UserCredentials};
use mind_mapper_core::ports::{
    AccountService, IdentityService, MapStore, MapStream, PortError, PortResult,
};
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    // Kept in insertion order so listings come back oldest first.
    maps: Vec<StoredMap>,
    users: HashMap<String, UserCredentials>,
    sessions: HashMap<String, (Uuid, DateTime<Utc>)>,
}

#[derive(Default)]
pub struct InMemoryAdapter {
    tables: RwLock<Tables>,
}

impl InMemoryAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a document as is, bypassing the write-side rules.
    ///
    /// Lets callers seed legacy field sets that this service would never write.
    pub fn insert_raw(&self, user_id: Uuid, fields: MapFields) -> PortResult<Uuid> {
        let id = Uuid::new_v4();
        self.write()?.maps.push(StoredMap { id, user_id, fields });
        Ok(id)
    }

    fn read(&self) -> PortResult<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| PortError::Unexpected("in-memory store lock poisoned".to_string()))
    }

    fn write(&self) -> PortResult<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| PortError::Unexpected("in-memory store lock poisoned".to_string()))
    }
}

fn map_not_found(map_id: Uuid) -> PortError {
    PortError::NotFound(format!("Map {} not found", map_id))
}

#[async_trait]
impl MapStore for InMemoryAdapter {
    async fn create_map(&self, user_id: Uuid, fields: MapFields) -> PortResult<StoredMap> {
        let map = StoredMap {
            id: Uuid::new_v4(),
            user_id,
            fields,
        };
        self.write()?.maps.push(map.clone());
        Ok(map)
    }

    async fn get_map(&self, user_id: Uuid, map_id: Uuid) -> PortResult<StoredMap> {
        self.read()?
            .maps
            .iter()
            .find(|m| m.id == map_id && m.user_id == user_id)
            .cloned()
            .ok_or_else(|| map_not_found(map_id))
    }

    async fn update_map(&self, user_id: Uuid, map_id: Uuid, updates: MapFields) -> PortResult<()> {
        let mut tables = self.write()?;
        let map = tables
            .maps
            .iter_mut()
            .find(|m| m.id == map_id && m.user_id == user_id)
            .ok_or_else(|| map_not_found(map_id))?;
        map.fields.extend(updates);
        Ok(())
    }

    fn stream_maps(&self, user_id: Uuid) -> MapStream<'_> {
        let snapshot: Vec<PortResult<StoredMap>> = match self.read() {
            Ok(tables) => tables
                .maps
                .iter()
                .filter(|m| m.user_id == user_id)
                .cloned()
                .map(Ok)
                .collect(),
            Err(e) => vec![Err(e)],
        };
        Box::pin(futures::stream::iter(snapshot))
    }
}

#[async_trait]
impl AccountService for InMemoryAdapter {
    async fn create_user_with_email(&self, email: &str, hashed_password: &str) -> PortResult<User> {
        let mut tables = self.write()?;
        if tables.users.contains_key(email) {
            return Err(PortError::Conflict(format!("User {} already exists", email)));
        }
        let user_id = Uuid::new_v4();
        tables.users.insert(
            email.to_string(),
            UserCredentials {
                user_id,
                email: email.to_string(),
                hashed_password: hashed_password.to_string(),
            },
        );
        Ok(User {
            user_id,
            email: email.to_string(),
        })
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        self.read()?
            .users
            .get(email)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", email)))
    }

    async fn create_auth_session(
        &self,
        token: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        self.write()?
            .sessions
            .insert(token.to_string(), (user_id, expires_at));
        Ok(())
    }

    async fn delete_auth_session(&self, token: &str) -> PortResult<()> {
        self.write()?.sessions.remove(token);
        Ok(())
    }
}

#[async_trait]
impl IdentityService for InMemoryAdapter {
    async fn verify_token(&self, token: &str) -> PortResult<Uuid> {
        match self.read()?.sessions.get(token) {
            Some((user_id, expires_at)) if *expires_at > Utc::now() => Ok(*user_id),
            _ => Err(PortError::Unauthorized),
        }
    }
}
