pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{AgentClient, HostedStore, JsonFileStore, LocalStorage};
pub use app::{build_app, AppState};
pub use config::AppConfig;
pub use utils::error::{FoodError, Result};
