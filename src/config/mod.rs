//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! presets file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ConnectorConfig (validated, immutable)
//!     → store.rs (ArcSwap, one snapshot per lookup)
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → atomic swap in PresetStore
//!     → next session request carries the new endpoints
//! ```
//!
//! # Design Decisions
//! - The session core never reads files; it only receives EndpointConfig values
//! - All fields have defaults to allow minimal configs
//! - A failed reload keeps the previous configuration

pub mod loader;
pub mod schema;
pub mod store;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{ClientSettings, ConnectorConfig, EndpointConfig, ObservabilityConfig};
pub use store::PresetStore;
