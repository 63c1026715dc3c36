use crate::models::record::MetadataRecord;
use crate::models::schema::{EntityKind, SchemaRegistry};
use camino::{Utf8Path, Utf8PathBuf};
use std::cmp::Ordering;
use thiserror::Error;

/// Errors from entry tree mutations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    #[error("Entry {0:?} does not exist")]
    MissingEntry(EntryId),

    #[error("Entry {0:?} is not a folder")]
    NotAFolder(EntryId),

    #[error("The root folder cannot be removed")]
    RemoveRoot,
}

/// What an entry in a list is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryType {
    Game,
    Folder,
    /// Stand-in row for an empty list; never stored in a [`GameTree`]
    Placeholder,
}

impl From<EntityKind> for EntryType {
    fn from(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Game => EntryType::Game,
            EntityKind::Folder => EntryType::Folder,
        }
    }
}

/// Handle to an entry inside a [`GameTree`].
///
/// Ids are never reused, so a handle to a removed entry stays dead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(usize);

/// A game or folder with its metadata
#[derive(Debug, Clone)]
pub struct Entry {
    entry_type: EntryType,
    path: Utf8PathBuf,
    metadata: MetadataRecord,
    parent: Option<EntryId>,
    children: Vec<EntryId>,
}

impl Entry {
    /// Build an entry; an empty `name` is filled in from the file stem.
    pub fn new(path: impl Into<Utf8PathBuf>, mut metadata: MetadataRecord) -> Self {
        let path = path.into();

        if metadata.get("name").map(str::is_empty).unwrap_or(false) {
            let was_changed = metadata.was_changed();
            let stem = path.file_stem().unwrap_or(path.as_str()).to_string();
            metadata.set("name", stem);
            // A derived display name is not an edit
            if !was_changed {
                metadata.reset_changed_flag();
            }
        }

        Self {
            entry_type: metadata.kind().into(),
            path,
            metadata,
            parent: None,
            children: Vec::new(),
        }
    }

    /// Game entry with default metadata
    pub fn game(registry: &SchemaRegistry, path: impl Into<Utf8PathBuf>) -> Self {
        Self::new(path, MetadataRecord::new(registry.lookup(EntityKind::Game)))
    }

    /// Folder entry with default metadata
    pub fn folder(registry: &SchemaRegistry, path: impl Into<Utf8PathBuf>) -> Self {
        Self::new(path, MetadataRecord::new(registry.lookup(EntityKind::Folder)))
    }

    pub fn entry_type(&self) -> EntryType {
        self.entry_type
    }

    pub fn is_folder(&self) -> bool {
        self.entry_type == EntryType::Folder
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    pub fn name(&self) -> &str {
        self.metadata.get("name").unwrap_or_default()
    }

    /// Name used for ordering: `sortname` when set, else `name`
    pub fn sort_name(&self) -> &str {
        match self.metadata.get("sortname") {
            Ok(sort) if !sort.is_empty() => sort,
            _ => self.name(),
        }
    }

    /// Folders carry no favorite flag and are never favorites
    pub fn is_favorite(&self) -> bool {
        self.metadata.get_bool("favorite").unwrap_or(false)
    }

    pub fn is_hidden(&self) -> bool {
        self.metadata.get_bool("hidden").unwrap_or(false)
    }

    pub fn is_kid_game(&self) -> bool {
        self.metadata.get_bool("kidgame").unwrap_or(false)
    }

    pub fn metadata(&self) -> &MetadataRecord {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut MetadataRecord {
        &mut self.metadata
    }

    pub fn set_metadata(&mut self, metadata: MetadataRecord) {
        self.metadata = metadata;
    }

    pub fn parent(&self) -> Option<EntryId> {
        self.parent
    }

    pub fn children(&self) -> &[EntryId] {
        &self.children
    }
}

/// Which entries a list shows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DisplayFilter {
    pub show_hidden: bool,
    /// Only kid-friendly games (folders stay visible)
    pub kid_mode: bool,
}

impl DisplayFilter {
    pub fn accepts(&self, entry: &Entry) -> bool {
        if entry.is_folder() {
            return self.show_hidden || !entry.is_hidden();
        }
        if !self.show_hidden && entry.is_hidden() {
            return false;
        }
        !self.kid_mode || entry.is_kid_game()
    }
}

/// Entries of one system, owned in an arena.
///
/// Parents own their children through [`EntryId`] lists; the parent link on
/// each entry is a plain back-reference.
#[derive(Debug, Clone)]
pub struct GameTree {
    system_name: String,
    slots: Vec<Option<Entry>>,
    root: EntryId,
}

impl GameTree {
    /// Tree with a root folder for the system's ROM directory
    pub fn new(system_name: impl Into<String>, registry: &SchemaRegistry, root_path: impl Into<Utf8PathBuf>) -> Self {
        let system_name = system_name.into();
        let mut root = Entry::folder(registry, root_path);
        root.metadata_mut().set("name", system_name.clone());
        root.metadata_mut().reset_changed_flag();

        Self {
            system_name,
            slots: vec![Some(root)],
            root: EntryId(0),
        }
    }

    pub fn system_name(&self) -> &str {
        &self.system_name
    }

    pub fn root(&self) -> EntryId {
        self.root
    }

    pub fn get(&self, id: EntryId) -> Option<&Entry> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: EntryId) -> Option<&mut Entry> {
        self.slots.get_mut(id.0).and_then(Option::as_mut)
    }

    pub fn contains(&self, id: EntryId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Attach `entry` as the last child of folder `parent`
    pub fn add(&mut self, parent: EntryId, mut entry: Entry) -> Result<EntryId, TreeError> {
        let parent_entry = self.get(parent).ok_or(TreeError::MissingEntry(parent))?;
        if !parent_entry.is_folder() {
            return Err(TreeError::NotAFolder(parent));
        }

        let id = EntryId(self.slots.len());
        entry.parent = Some(parent);
        entry.children.clear();
        self.slots.push(Some(entry));

        if let Some(p) = self.get_mut(parent) {
            p.children.push(id);
        }
        Ok(id)
    }

    pub fn parent(&self, id: EntryId) -> Option<EntryId> {
        self.get(id).and_then(Entry::parent)
    }

    pub fn children(&self, id: EntryId) -> &[EntryId] {
        self.get(id).map(Entry::children).unwrap_or_default()
    }

    /// Children of `id` that pass `filter`, in tree order
    pub fn children_to_display(&self, id: EntryId, filter: &DisplayFilter) -> Vec<EntryId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|child| self.get(*child).is_some_and(|e| filter.accepts(e)))
            .collect()
    }

    /// Parent, grandparent, ... up to and including the root
    pub fn ancestors(&self, id: EntryId) -> impl Iterator<Item = EntryId> + '_ {
        std::iter::successors(self.parent(id), move |current| self.parent(*current))
    }

    /// Entry whose path equals `path`
    pub fn find_by_path(&self, path: &Utf8Path) -> Option<EntryId> {
        self.slots
            .iter()
            .enumerate()
            .find(|(_, slot)| slot.as_ref().is_some_and(|e| e.path == path))
            .map(|(index, _)| EntryId(index))
    }

    /// Direct child of `parent` whose path equals `path`
    pub fn find_child_by_path(&self, parent: EntryId, path: &Utf8Path) -> Option<EntryId> {
        self.children(parent)
            .iter()
            .copied()
            .find(|child| self.get(*child).is_some_and(|e| e.path == path))
    }

    /// Detach `id` from its parent and discard it with its whole subtree.
    pub fn remove(&mut self, id: EntryId) -> Result<Entry, TreeError> {
        if id == self.root {
            return Err(TreeError::RemoveRoot);
        }
        let parent = self.parent(id).ok_or(TreeError::MissingEntry(id))?;

        if let Some(p) = self.get_mut(parent) {
            p.children.retain(|child| *child != id);
        }

        let mut pending = self.children(id).to_vec();
        while let Some(descendant) = pending.pop() {
            pending.extend_from_slice(self.children(descendant));
            self.slots[descendant.0] = None;
        }

        let mut removed = self.slots[id.0].take().ok_or(TreeError::MissingEntry(id))?;
        removed.parent = None;
        removed.children.clear();
        Ok(removed)
    }

    /// Sort the children of `id`, recursively, by case-insensitive sort name
    pub fn sort_children(&mut self, id: EntryId) {
        let mut children = self.children(id).to_vec();
        children.sort_by(|a, b| self.compare_by_sort_name(*a, *b));

        for child in &children {
            if self.get(*child).is_some_and(Entry::is_folder) {
                self.sort_children(*child);
            }
        }

        if let Some(entry) = self.get_mut(id) {
            entry.children = children;
        }
    }

    fn compare_by_sort_name(&self, a: EntryId, b: EntryId) -> Ordering {
        match (self.get(a), self.get(b)) {
            (Some(a), Some(b)) => a
                .sort_name()
                .to_lowercase()
                .cmp(&b.sort_name().to_lowercase()),
            _ => Ordering::Equal,
        }
    }

    /// All live entries below `id`, depth-first in tree order
    pub fn descendants(&self, id: EntryId) -> Vec<EntryId> {
        let mut out = Vec::new();
        let mut pending: Vec<EntryId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = pending.pop() {
            out.push(next);
            pending.extend(self.children(next).iter().rev().copied());
        }
        out
    }
}
