// gamedeck - game library model for an emulation front-end
//
// This is the library crate: metadata schemas and records, the per-system
// entry tree, game list projection and navigation, and gamelist persistence.
// The binary crate (main.rs) provides a command-line front-end over it.

pub mod config;
pub mod gamelist;
pub mod logging;
pub mod models;
pub mod paths;
pub mod xml;

// Re-export commonly used types for convenience
pub use config::ConfigManager;
pub use gamelist::{GameListView, ListProjector, ProjectedRow};
pub use models::{Entry, EntryId, GameTree, MetadataRecord, SchemaRegistry, Settings};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
