// Adapters layer: concrete implementations of the domain ports (storage, datastore, identity, agent platform)

pub mod agent;
pub mod file_store;
pub mod hosted_store;
pub mod identity;
pub mod records;
pub mod storage;

pub use agent::{AgentClient, AgentEndpoint};
pub use file_store::JsonFileStore;
pub use hosted_store::HostedStore;
pub use identity::{HostedIdentity, StaticIdentity};
pub use storage::LocalStorage;
