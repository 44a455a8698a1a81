//! Secret lookup for the model gateway
//!
//! - `SecretStore` trait for custom stores
//! - `EnvSecretStore`: process environment, with provider-name mapping
//! - `MemorySecretStore`: in-memory, for tests and explicit keys

mod traits;
mod env_store;
mod memory_store;

pub use traits::SecretStore;
pub use env_store::EnvSecretStore;
pub use memory_store::MemorySecretStore;
