use indexmap::IndexMap;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

/// Errors from schema lookup and metadata access
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MetadataError {
    #[error("Unknown entity kind: {0}")]
    UnknownEntityKind(String),

    #[error("Metadata key '{0}' is not declared")]
    UnknownKey(String),

    #[error("Duplicate metadata key '{key}' in {kind} schema")]
    DuplicateKey { kind: EntityKind, key: String },
}

/// The kinds of entity that carry metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Game,
    Folder,
}

impl EntityKind {
    /// Element name used for this kind in gamelist documents
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Game => "game",
            EntityKind::Folder => "folder",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = MetadataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "game" => Ok(EntityKind::Game),
            "folder" => Ok(EntityKind::Folder),
            other => Err(MetadataError::UnknownEntityKind(other.to_string())),
        }
    }
}

/// How a metadata value is meant to be read and edited.
///
/// Values are always stored as strings; the kind only drives path
/// resolution on load/save and the editor widget a UI picks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    String,
    MultilineString,
    Path,
    Rating,
    Date,
    Int,
    Bool,
    Time,
}

/// Static description of one metadata key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDeclaration {
    pub key: &'static str,
    pub kind: ValueKind,
    pub default_value: &'static str,
    /// Statistics are persisted but kept out of bulk metadata editing
    pub is_statistic: bool,
    pub display_label: &'static str,
    pub prompt_label: &'static str,
}

const fn field(
    key: &'static str,
    kind: ValueKind,
    default_value: &'static str,
    is_statistic: bool,
    display_label: &'static str,
    prompt_label: &'static str,
) -> FieldDeclaration {
    FieldDeclaration {
        key,
        kind,
        default_value,
        is_statistic,
        display_label,
        prompt_label,
    }
}

/// Default of unset release dates, as written by existing gamelists
pub const UNKNOWN_DATE: &str = "날짜없음";

/// Default of unset developer, publisher and genre
pub const UNKNOWN_TEXT: &str = "알수없음";

pub const GAME_FIELDS: &[FieldDeclaration] = &[
    field("name", ValueKind::String, "", false, "name", "enter game name"),
    field("sortname", ValueKind::String, "", false, "sortname", "enter game sort name"),
    field("desc", ValueKind::MultilineString, "", false, "description", "enter description"),
    field("image", ValueKind::Path, "", false, "image", "enter path to image"),
    field("video", ValueKind::Path, "", false, "video", "enter path to video"),
    field("marquee", ValueKind::Path, "", false, "marquee", "enter path to marquee"),
    field("thumbnail", ValueKind::Path, "", false, "thumbnail", "enter path to thumbnail"),
    field("rating", ValueKind::Rating, "0.000000", false, "rating", "enter rating"),
    field("releasedate", ValueKind::Date, UNKNOWN_DATE, false, "release date", "enter release date"),
    field("developer", ValueKind::String, UNKNOWN_TEXT, false, "developer", "enter game developer"),
    field("publisher", ValueKind::String, UNKNOWN_TEXT, false, "publisher", "enter game publisher"),
    field("genre", ValueKind::String, UNKNOWN_TEXT, false, "genre", "enter game genre"),
    field("players", ValueKind::Int, "1", false, "players", "enter number of players"),
    field("favorite", ValueKind::Bool, "false", false, "favorite", "enter favorite off/on"),
    field("hidden", ValueKind::Bool, "false", false, "hidden", "enter hidden off/on"),
    field("kidgame", ValueKind::Bool, "false", false, "kidgame", "enter kidgame off/on"),
    field("playcount", ValueKind::Int, "0", true, "play count", "enter number of times played"),
    field("lastplayed", ValueKind::Time, "0", true, "last played", "enter last played date"),
];

pub const FOLDER_FIELDS: &[FieldDeclaration] = &[
    field("name", ValueKind::String, "", false, "name", "enter game name"),
    field("sortname", ValueKind::String, "", false, "sortname", "enter game sort name"),
    field("desc", ValueKind::MultilineString, "", false, "description", "enter description"),
    field("image", ValueKind::Path, "", false, "image", "enter path to image"),
    field("thumbnail", ValueKind::Path, "", false, "thumbnail", "enter path to thumbnail"),
    field("video", ValueKind::Path, "", false, "video", "enter path to video"),
    field("marquee", ValueKind::Path, "", false, "marquee", "enter path to marquee"),
    field("rating", ValueKind::Rating, "0.000000", false, "rating", "enter rating"),
    field("releasedate", ValueKind::Date, UNKNOWN_DATE, false, "release date", "enter release date"),
    field("developer", ValueKind::String, UNKNOWN_TEXT, false, "developer", "enter game developer"),
    field("publisher", ValueKind::String, UNKNOWN_TEXT, false, "publisher", "enter game publisher"),
    field("genre", ValueKind::String, UNKNOWN_TEXT, false, "genre", "enter game genre"),
    field("players", ValueKind::Int, "1", false, "players", "enter number of players"),
];

/// Ordered field declarations for one entity kind.
///
/// Declaration order is serialization order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataSchema {
    kind: EntityKind,
    fields: Vec<FieldDeclaration>,
}

impl MetadataSchema {
    /// Build a schema, rejecting duplicate keys
    pub fn new(kind: EntityKind, fields: Vec<FieldDeclaration>) -> Result<Self, MetadataError> {
        let mut seen = HashSet::new();
        for decl in &fields {
            if !seen.insert(decl.key) {
                return Err(MetadataError::DuplicateKey {
                    kind,
                    key: decl.key.to_string(),
                });
            }
        }
        Ok(Self { kind, fields })
    }

    pub fn game() -> Self {
        Self {
            kind: EntityKind::Game,
            fields: GAME_FIELDS.to_vec(),
        }
    }

    pub fn folder() -> Self {
        Self {
            kind: EntityKind::Folder,
            fields: FOLDER_FIELDS.to_vec(),
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn fields(&self) -> &[FieldDeclaration] {
        &self.fields
    }

    pub fn field(&self, key: &str) -> Option<&FieldDeclaration> {
        self.fields.iter().find(|f| f.key == key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.field(key).is_some()
    }

    /// Fields offered for bulk editing (statistics excluded)
    pub fn editable_fields(&self) -> impl Iterator<Item = &FieldDeclaration> {
        self.fields.iter().filter(|f| !f.is_statistic)
    }
}

/// Schemas by entity kind, built once at startup and shared by reference.
///
/// The GAME schema is always present; it is the fallback for lookups that
/// name a kind the registry does not know.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    schemas: IndexMap<EntityKind, Arc<MetadataSchema>>,
}

impl SchemaRegistry {
    /// Registry holding only the given GAME schema
    pub fn new(game: MetadataSchema) -> Self {
        let mut schemas = IndexMap::new();
        schemas.insert(EntityKind::Game, Arc::new(game));
        Self { schemas }
    }

    /// Registry with the built-in GAME and FOLDER schemas
    pub fn builtin() -> Self {
        Self::new(MetadataSchema::game()).with_schema(MetadataSchema::folder())
    }

    /// Add or replace the schema for its kind
    pub fn with_schema(mut self, schema: MetadataSchema) -> Self {
        self.schemas.insert(schema.kind(), Arc::new(schema));
        self
    }

    /// Strict lookup for callers that treat a missing schema as a bug
    pub fn try_lookup(&self, kind: EntityKind) -> Result<Arc<MetadataSchema>, MetadataError> {
        self.schemas
            .get(&kind)
            .cloned()
            .ok_or_else(|| MetadataError::UnknownEntityKind(kind.to_string()))
    }

    /// Lookup that degrades to the GAME schema, logging the misconfiguration
    pub fn lookup(&self, kind: EntityKind) -> Arc<MetadataSchema> {
        match self.try_lookup(kind) {
            Ok(schema) => schema,
            Err(e) => {
                tracing::error!("{}, falling back to game schema", e);
                self.game_schema()
            }
        }
    }

    /// Lookup by kind name, as found in serialized documents
    pub fn lookup_name(&self, name: &str) -> Arc<MetadataSchema> {
        match name.parse::<EntityKind>() {
            Ok(kind) => self.lookup(kind),
            Err(e) => {
                tracing::error!("{}, falling back to game schema", e);
                self.game_schema()
            }
        }
    }

    fn game_schema(&self) -> Arc<MetadataSchema> {
        self.schemas
            .get(&EntityKind::Game)
            .cloned()
            .unwrap_or_else(|| Arc::new(MetadataSchema::game()))
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
