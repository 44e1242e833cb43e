pub mod domain;
pub mod migration;
pub mod normalize;
pub mod ports;
pub mod prompts;
pub mod repair;

pub use domain::{MapFields, MindMapNode, StoredMap, User, UserCredentials};
pub use migration::{migrate_user_maps, MigrationReport};
pub use normalize::{normalize_expansion, normalize_generated_map, NormalizeError};
pub use ports::{
    AccountService, CompletionService, IdentityService, MapStore, MapStream, PortError, PortResult,
};
pub use repair::{repair, RepairOutcome};
