//! Data models for the gamedeck front-end.
//!
//! - [`SchemaRegistry`] / [`MetadataSchema`]: declared metadata fields per entity kind
//! - [`MetadataRecord`]: schema-shaped key/value metadata with XML (de)serialization
//!   and change tracking
//! - [`GameTree`] / [`Entry`]: the games and folders of one system, with parent links
//! - [`Settings`]: front-end settings loaded from `settings.yaml`
//!
//! # Ownership
//!
//! Entries live in a [`GameTree`] arena and are addressed by [`EntryId`]. Views
//! and cursor stacks hold ids, never entries, so removing an entry from the tree
//! is the only way it goes away.

pub mod entry;
pub mod record;
pub mod schema;
pub mod settings;

pub use entry::{DisplayFilter, Entry, EntryId, EntryType, GameTree, TreeError};
pub use record::MetadataRecord;
pub use schema::{
    EntityKind, FieldDeclaration, MetadataError, MetadataSchema, SchemaRegistry, ValueKind,
};
pub use settings::{
    GameInfoMode, LoggingSettings, ScreensaverSettings, Settings, SubtitleAlignment, UiMode,
};
