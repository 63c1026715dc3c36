//! Game list behaviour: turning a folder's entries into displayed rows, moving
//! a cursor through them, and persisting the list as `gamelist.xml`.
//!
//! # Components
//!
//! - [`ListProjector`]: groups entries into folders, favorites and the rest,
//!   tagging each row with a [`Category`]; an empty folder yields a single
//!   placeholder row
//! - [`GameListView`]: cursor, folder navigation and the cursor stack, plus
//!   entry removal with cursor replacement
//! - [`file`]: `gamelist.xml` load/save on top of [`crate::models::MetadataRecord`]
//!
//! Nothing here draws anything. A UI reads [`ProjectedRow`]s and feeds cursor
//! movements back in.

pub mod file;
pub mod projector;
pub mod view;

pub use file::{
    GamelistError, gamelist_to_xml, has_unsaved_changes, load_gamelist, parse_gamelist,
    save_gamelist,
};
pub use projector::{Category, ListProjector, LocaleMarkers, ProjectedRow, ProjectionOptions};
pub use view::GameListView;
