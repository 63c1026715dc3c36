//! Reading and writing `gamelist.xml` documents.
//!
//! ```xml
//! <gameList>
//!   <folder>
//!     <path>./rpg</path>
//!     <name>Role-playing</name>
//!   </folder>
//!   <game>
//!     <path>./rpg/ff6.sfc</path>
//!     <name>Final Fantasy VI</name>
//!     <favorite>true</favorite>
//!   </game>
//! </gameList>
//! ```
//!
//! Entry paths are relative to the system's ROM directory. Games in
//! subdirectories get their folders created on load even when the document
//! has no `<folder>` element for them.

use crate::models::{EntityKind, Entry, EntryId, GameTree, MetadataRecord, SchemaRegistry};
use crate::paths::{create_relative_path, normalize, resolve_relative_path};
use crate::xml::{XmlError, XmlNode};
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use thiserror::Error;

pub const GAMELIST_ROOT: &str = "gameList";

/// Errors from interpreting a gamelist document
#[derive(Error, Debug)]
pub enum GamelistError {
    #[error("Invalid gamelist XML: {0}")]
    Xml(#[from] XmlError),

    #[error("Expected <gameList> root element, found <{found}>")]
    WrongRoot { found: String },
}

/// Build the entry tree for one system from a gamelist document.
///
/// Entries without a `<path>` or outside `rom_dir` are skipped with a warning.
///
/// # Arguments
/// * `xml` - Document text
/// * `registry` - Schemas for `<game>` and `<folder>` metadata
/// * `system_name` - Name given to the tree's root folder
/// * `rom_dir` - Directory entry paths and `./` media paths resolve against
///
/// # Errors
/// Malformed XML or a root element other than `<gameList>`
pub fn parse_gamelist(
    xml: &str,
    registry: &SchemaRegistry,
    system_name: &str,
    rom_dir: &Utf8Path,
) -> Result<GameTree, GamelistError> {
    let document = XmlNode::parse(xml)?;
    if document.tag() != GAMELIST_ROOT {
        return Err(GamelistError::WrongRoot {
            found: document.tag().to_string(),
        });
    }

    let rom_dir = normalize(rom_dir);
    let mut tree = GameTree::new(system_name, registry, rom_dir.clone());
    let mut skipped = 0usize;

    for node in document.children() {
        let kind = match node.tag().parse::<EntityKind>() {
            Ok(kind) => kind,
            Err(_) => {
                tracing::debug!("Ignoring <{}> in gamelist", node.tag());
                continue;
            }
        };

        let Some(path_node) = node.child("path") else {
            tracing::warn!("{} entry without <path> in {} gamelist", kind, system_name);
            skipped += 1;
            continue;
        };

        let path = Utf8PathBuf::from(resolve_relative_path(path_node.text(), &rom_dir, false));
        if path.strip_prefix(&rom_dir).is_err() || path == rom_dir {
            tracing::warn!("{} is not inside the {} ROM directory {}", path, system_name, rom_dir);
            skipped += 1;
            continue;
        }

        let metadata = MetadataRecord::from_xml(registry.lookup(kind), node, &rom_dir);
        attach_entry(&mut tree, registry, &rom_dir, path, metadata);
    }

    tracing::info!(
        "Parsed {} gamelist: {} entries, {} skipped",
        system_name,
        tree.len() - 1,
        skipped
    );
    Ok(tree)
}

/// Place an entry at `path`, creating intermediate folders and replacing the
/// metadata of an entry of the same kind already there.
fn attach_entry(
    tree: &mut GameTree,
    registry: &SchemaRegistry,
    rom_dir: &Utf8Path,
    path: Utf8PathBuf,
    metadata: MetadataRecord,
) {
    let parent = ensure_folder_chain(tree, registry, rom_dir, path.parent().unwrap_or(rom_dir));
    let incoming = Entry::new(path, metadata);

    if let Some(existing) = tree.find_child_by_path(parent, incoming.path()) {
        if let Some(entry) = tree.get_mut(existing) {
            if entry.entry_type() == incoming.entry_type() {
                entry.set_metadata(incoming.metadata().clone());
                return;
            }
        }
        tracing::warn!("Duplicate gamelist path {} with a different kind", incoming.path());
    }

    if let Err(e) = tree.add(parent, incoming) {
        tracing::warn!("Failed to add gamelist entry: {}", e);
    }
}

fn ensure_folder_chain(
    tree: &mut GameTree,
    registry: &SchemaRegistry,
    rom_dir: &Utf8Path,
    folder: &Utf8Path,
) -> EntryId {
    let mut current = tree.root();
    let Ok(relative) = folder.strip_prefix(rom_dir) else {
        return current;
    };

    let mut path = rom_dir.to_path_buf();
    for component in relative.components() {
        path.push(component.as_str());
        current = match tree.find_child_by_path(current, &path) {
            Some(existing) if tree.get(existing).is_some_and(Entry::is_folder) => existing,
            _ => match tree.add(current, Entry::folder(registry, path.clone())) {
                Ok(id) => id,
                Err(e) => {
                    tracing::warn!("Failed to create folder {}: {}", path, e);
                    return current;
                }
            },
        };
    }
    current
}

/// Render `tree` as a gamelist document.
///
/// Every game is written; folders only when they carry non-default metadata.
pub fn gamelist_to_xml(tree: &GameTree, rom_dir: &Utf8Path, ignore_defaults: bool) -> Result<String, XmlError> {
    let rom_dir = normalize(rom_dir);
    let mut document = XmlNode::new(GAMELIST_ROOT);

    for id in tree.descendants(tree.root()) {
        let Some(entry) = tree.get(id) else {
            continue;
        };

        let mut node = XmlNode::new(entry.metadata().kind().as_str());
        node.push_child(XmlNode::with_text(
            "path",
            create_relative_path(entry.path().as_str(), &rom_dir, false),
        ));
        entry.metadata().append_to_xml(&mut node, ignore_defaults, &rom_dir);

        if entry.is_folder() && is_implicit_folder(entry) {
            continue;
        }
        document.push_child(node);
    }

    document.to_xml_string()
}

/// A folder whose metadata says nothing beyond its directory name
fn is_implicit_folder(entry: &Entry) -> bool {
    let stem = entry.path().file_stem().unwrap_or(entry.path().as_str());
    entry
        .metadata()
        .iter()
        .all(|(key, value)| match key {
            "name" => value == stem,
            _ => entry.metadata().is_default(key),
        })
}

/// Load `gamelist_path` into a tree for the system rooted at `rom_dir`.
pub fn load_gamelist(
    gamelist_path: &Utf8Path,
    registry: &SchemaRegistry,
    system_name: &str,
    rom_dir: &Utf8Path,
) -> Result<GameTree> {
    let contents = fs::read_to_string(gamelist_path)
        .with_context(|| format!("Failed to read gamelist: {}", gamelist_path))?;

    let tree = parse_gamelist(&contents, registry, system_name, rom_dir)
        .with_context(|| format!("Failed to parse gamelist: {}", gamelist_path))?;

    tracing::info!("Loaded gamelist from {}", gamelist_path);
    Ok(tree)
}

/// Write `tree` to `gamelist_path` in compact form and clear change flags.
///
/// Missing parent directories are created.
///
/// # Arguments
/// * `tree` - Tree to save; its change flags are reset on success
/// * `gamelist_path` - Destination file
/// * `rom_dir` - Directory paths are written relative to
pub fn save_gamelist(tree: &mut GameTree, gamelist_path: &Utf8Path, rom_dir: &Utf8Path) -> Result<()> {
    let xml = gamelist_to_xml(tree, rom_dir, true).context("Failed to serialize gamelist")?;

    if let Some(parent) = gamelist_path.parent() {
        if !parent.as_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create gamelist directory: {}", parent))?;
        }
    }

    fs::write(gamelist_path, xml)
        .with_context(|| format!("Failed to write gamelist: {}", gamelist_path))?;

    let root = tree.root();
    for id in std::iter::once(root).chain(tree.descendants(root)) {
        if let Some(entry) = tree.get_mut(id) {
            entry.metadata_mut().reset_changed_flag();
        }
    }

    tracing::info!("Saved gamelist to {}", gamelist_path);
    Ok(())
}

/// Whether any entry has unsaved metadata edits
pub fn has_unsaved_changes(tree: &GameTree) -> bool {
    tree.descendants(tree.root())
        .into_iter()
        .filter_map(|id| tree.get(id))
        .any(|entry| entry.metadata().was_changed())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0"?>
<gameList>
  <game>
    <path>./rpg/jrpg/ff6.sfc</path>
    <name>Final Fantasy VI</name>
    <favorite>true</favorite>
    <image>./media/ff6.png</image>
  </game>
  <folder>
    <path>./rpg</path>
    <name>Role-playing</name>
  </folder>
  <game>
    <path>./mario.sfc</path>
  </game>
  <game>
    <name>No path</name>
  </game>
  <game>
    <path>/elsewhere/outside.sfc</path>
  </game>
  <provider><software>scraper</software></provider>
</gameList>"#;

    #[test]
    fn test_parse_builds_folders_and_skips_bad_entries() {
        let registry = SchemaRegistry::builtin();
        let tree = parse_gamelist(SAMPLE, &registry, "snes", Utf8Path::new("/roms/snes")).unwrap();

        let root = tree.root();
        assert_eq!(tree.children(root).len(), 2);

        let rpg = tree.find_by_path(Utf8Path::new("/roms/snes/rpg")).unwrap();
        assert_eq!(tree.get(rpg).unwrap().name(), "Role-playing");

        let ff6 = tree.find_by_path(Utf8Path::new("/roms/snes/rpg/jrpg/ff6.sfc")).unwrap();
        let entry = tree.get(ff6).unwrap();
        assert!(entry.is_favorite());
        assert_eq!(entry.metadata().get("image").unwrap(), "/roms/snes/media/ff6.png");

        let jrpg = tree.parent(ff6).unwrap();
        assert_eq!(tree.parent(jrpg), Some(rpg));
        assert_eq!(tree.get(jrpg).unwrap().name(), "jrpg");

        let mario = tree.find_by_path(Utf8Path::new("/roms/snes/mario.sfc")).unwrap();
        assert_eq!(tree.get(mario).unwrap().name(), "mario");
        assert!(tree.find_by_path(Utf8Path::new("/elsewhere/outside.sfc")).is_none());
    }

    #[test]
    fn test_wrong_root_is_error() {
        let registry = SchemaRegistry::builtin();
        let err = parse_gamelist("<games/>", &registry, "snes", Utf8Path::new("/roms")).unwrap_err();
        assert!(matches!(err, GamelistError::WrongRoot { found } if found == "games"));
    }

    #[test]
    fn test_serialize_skips_default_folders() {
        let registry = SchemaRegistry::builtin();
        let rom_dir = Utf8Path::new("/roms/snes");
        let tree = parse_gamelist(SAMPLE, &registry, "snes", rom_dir).unwrap();

        let xml = gamelist_to_xml(&tree, rom_dir, true).unwrap();
        let document = XmlNode::parse(&xml).unwrap();

        let folders: Vec<&XmlNode> = document.children().iter().filter(|n| n.tag() == "folder").collect();
        assert_eq!(folders.len(), 1);
        assert_eq!(folders[0].child("path").unwrap().text(), "./rpg");

        let games: Vec<&XmlNode> = document.children().iter().filter(|n| n.tag() == "game").collect();
        assert_eq!(games.len(), 2);
        let ff6 = games
            .iter()
            .find(|g| g.child("path").unwrap().text() == "./rpg/jrpg/ff6.sfc")
            .unwrap();
        assert_eq!(ff6.child("image").unwrap().text(), "./media/ff6.png");
        assert!(ff6.child("developer").is_none());
    }

    #[test]
    fn test_unsaved_changes_tracking() {
        let registry = SchemaRegistry::builtin();
        let mut tree = parse_gamelist(SAMPLE, &registry, "snes", Utf8Path::new("/roms/snes")).unwrap();
        assert!(!has_unsaved_changes(&tree));

        let mario = tree.find_by_path(Utf8Path::new("/roms/snes/mario.sfc")).unwrap();
        tree.get_mut(mario).unwrap().metadata_mut().set("playcount", "1");
        assert!(has_unsaved_changes(&tree));
    }
}
