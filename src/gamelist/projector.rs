use crate::models::{Entry, EntryId, EntryType, GameTree};
use camino::Utf8Path;

/// Label shown for the stand-in row of an empty list
pub const DEFAULT_PLACEHOLDER_LABEL: &str = "<no entries>";

/// Collection whose entries are all favorites, so grouping them is pointless
pub const DEFAULT_FAVORITES_COLLECTION: &str = "Favorites";

pub const FOLDER_PREFIX: &str = "#";
pub const FAVORITE_PREFIX: &str = "★";

/// Grouping hint attached to each projected row.
///
/// The numeric values are what list widgets key their colours and icons on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Category {
    Normal = 0,
    Folder = 1,
    Favorite = 2,
    Localized = 3,
}

impl Category {
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Ordered substrings marking entries of a regional subset.
///
/// Matching is a case-sensitive literal search in the entry's file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleMarkers(Vec<String>);

impl LocaleMarkers {
    pub fn new<I, S>(markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(markers.into_iter().map(Into::into).collect())
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn matches(&self, name: &str) -> bool {
        let file_name = Utf8Path::new(name).file_name().unwrap_or(name);
        self.0.iter().any(|marker| file_name.contains(marker.as_str()))
    }
}

impl Default for LocaleMarkers {
    fn default() -> Self {
        Self::new(["한글", "한국", "korean", "kor"])
    }
}

/// Grouping policy switches
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectionOptions {
    pub folders_first: bool,
    pub favorites_first: bool,
    /// Name of the favorites collection; grouping and the favorite icon are
    /// switched off inside it
    pub favorites_collection: String,
    pub locale_markers: LocaleMarkers,
    pub placeholder_label: String,
}

impl Default for ProjectionOptions {
    fn default() -> Self {
        Self {
            folders_first: true,
            favorites_first: true,
            favorites_collection: DEFAULT_FAVORITES_COLLECTION.to_string(),
            locale_markers: LocaleMarkers::default(),
            placeholder_label: DEFAULT_PLACEHOLDER_LABEL.to_string(),
        }
    }
}

/// One displayed line of a game list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectedRow {
    /// `None` only for the placeholder row
    pub entry: Option<EntryId>,
    pub entry_type: EntryType,
    pub label: String,
    pub category: Category,
}

impl ProjectedRow {
    /// Stand-in row for an empty list.
    ///
    /// Tagged [`Category::Folder`], the same as folder rows.
    pub fn placeholder(label: impl Into<String>) -> Self {
        Self {
            entry: None,
            entry_type: EntryType::Placeholder,
            label: label.into(),
            category: Category::Folder,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.entry_type == EntryType::Placeholder
    }
}

/// Turns a folder's entries into the rows a list shows:
/// folders, then favorites, then everything else.
#[derive(Debug, Clone, Default)]
pub struct ListProjector {
    options: ProjectionOptions,
}

impl ListProjector {
    pub fn new(options: ProjectionOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ProjectionOptions {
        &self.options
    }

    /// Project `entries` (in display order) of the collection named
    /// `collection_name`. Ids missing from `tree` are skipped.
    ///
    /// # Arguments
    /// * `tree` - Tree the ids point into
    /// * `collection_name` - Name of the system or collection shown; the
    ///   favorites collection gets no favorite grouping or stars
    /// * `entries` - Entries to show, already filtered
    ///
    /// # Returns
    /// Folder rows, then favorite rows, then the rest, or a single
    /// placeholder row when nothing is left to show
    pub fn project(&self, tree: &GameTree, collection_name: &str, entries: &[EntryId]) -> Vec<ProjectedRow> {
        let show_favorite_icon = collection_name != self.options.favorites_collection;
        let favorites_first = self.options.favorites_first && show_favorite_icon;
        let folders_first = self.options.folders_first;

        let live: Vec<(EntryId, &Entry)> = entries
            .iter()
            .filter_map(|id| tree.get(*id).map(|entry| (*id, entry)))
            .collect();

        if live.is_empty() {
            return vec![ProjectedRow::placeholder(&self.options.placeholder_label)];
        }

        let mut rows = Vec::with_capacity(live.len());

        if folders_first {
            for (id, entry) in live.iter().filter(|(_, e)| e.is_folder()) {
                rows.push(folder_row(*id, entry.name()));
            }
        }

        if favorites_first {
            for (id, entry) in live.iter().filter(|(_, e)| !e.is_folder() && e.is_favorite()) {
                rows.push(ProjectedRow {
                    entry: Some(*id),
                    entry_type: entry.entry_type(),
                    label: format!("{}{}", FAVORITE_PREFIX, entry.name()),
                    category: self.classify(entry.name(), Category::Favorite),
                });
            }
        }

        for (id, entry) in &live {
            if entry.is_folder() {
                if !folders_first {
                    rows.push(folder_row(*id, entry.name()));
                }
                continue;
            }
            if favorites_first && entry.is_favorite() {
                continue;
            }

            let label = if show_favorite_icon && entry.is_favorite() {
                format!("{}{}", FAVORITE_PREFIX, entry.name())
            } else {
                entry.name().to_string()
            };

            rows.push(ProjectedRow {
                entry: Some(*id),
                entry_type: entry.entry_type(),
                label,
                category: self.classify(entry.name(), Category::Normal),
            });
        }

        tracing::debug!(
            "Projected {} rows for {} (favorites_first={})",
            rows.len(),
            collection_name,
            favorites_first
        );
        rows
    }

    fn classify(&self, name: &str, otherwise: Category) -> Category {
        if self.options.locale_markers.matches(name) {
            Category::Localized
        } else {
            otherwise
        }
    }
}

fn folder_row(id: EntryId, name: &str) -> ProjectedRow {
    ProjectedRow {
        entry: Some(id),
        entry_type: EntryType::Folder,
        label: format!("{}{}", FOLDER_PREFIX, name),
        category: Category::Folder,
    }
}
