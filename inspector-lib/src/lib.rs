//! # Inspector Library
//!
//! A fast library for checking whether a username exists on a set of web
//! platforms.
//!
//! The library builds a list of probe targets from a platform catalogue and
//! runs them through a bounded-concurrency engine that reports which
//! platforms know the username.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use inspector_lib::{Catalogue, ProbeConfig, ProbeEngine};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let targets = Catalogue::builtin().build_targets("alice", &["social", "tech"])?;
//!     let engine = ProbeEngine::new(ProbeConfig::default())?;
//!
//!     for found in engine.probe(targets).await {
//!         println!("{} : {}", found.name, found.url);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Platform Catalogue**: built-in social and tech groups, extensible from config files
//! - **Bounded Concurrency**: a hard cap on requests in flight, owned by each engine
//! - **Streaming**: per-target reports as they complete
//! - **Pluggable Transport**: swap the HTTP layer for tests or embedding

// Re-export main public API types and functions
// This makes them available as inspector_lib::TypeName
pub use catalogue::{
    Catalogue, PlatformGroup, PlatformTemplate, DEFAULT_GROUP, USERNAME_PLACEHOLDER,
};
pub use config::{
    env_config_from, load_env_config, ConfigManager, DefaultsConfig, EnvConfig, FileConfig,
};
pub use engine::ProbeEngine;
pub use error::ProbeError;
pub use transport::{HttpTransport, Transport};
pub use types::{
    default_concurrency, MatchRule, ProbeConfig, ProbeOutcome, ProbeReport, ProbeResponse,
    ProbeResult, ProbeTarget, DEFAULT_TIMEOUT, MAX_CONCURRENCY,
};
pub use utils::{parse_duration, validate_username};

// Internal modules - these are not part of the public API
mod catalogue;
mod config;
mod engine;
mod error;
mod transport;
mod types;
mod utils;

// Type alias for convenience
pub type Result<T> = std::result::Result<T, ProbeError>;

// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
