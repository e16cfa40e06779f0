//! API key infrastructure implementations
//!
//! Key minting, the registry contract, the service facade and the
//! in-memory and PostgreSQL stores.

mod minter;
mod postgres_repository;
mod registry;
mod repository;
mod service;

pub use minter::{EntropySource, KeyMinter, OsEntropy, KEY_BODY_LEN};
pub use postgres_repository::PostgresApiKeyRepository;
pub use registry::KeyRegistry;
pub use repository::InMemoryApiKeyRepository;
pub use service::ApiKeyService;
