use crate::gamelist::projector::{ListProjector, ProjectedRow};
use crate::models::{DisplayFilter, Entry, EntryId, GameTree, TreeError};
use std::fs;

/// Navigation state of a scrollable game list over one [`GameTree`].
///
/// The view never owns entries. It keeps the rows of the folder currently
/// shown, the selected row, and the chain of folders entered from the root
/// (the cursor stack, root excluded, outermost folder at the bottom).
#[derive(Debug, Clone)]
pub struct GameListView {
    root: EntryId,
    current_folder: EntryId,
    collection_name: String,
    projector: ListProjector,
    filter: DisplayFilter,
    rows: Vec<ProjectedRow>,
    cursor: usize,
    cursor_stack: Vec<EntryId>,
}

impl GameListView {
    /// View positioned on the first row of the tree's root folder
    pub fn new(tree: &GameTree, projector: ListProjector, filter: DisplayFilter) -> Self {
        let mut view = Self {
            root: tree.root(),
            current_folder: tree.root(),
            collection_name: tree.system_name().to_string(),
            projector,
            filter,
            rows: Vec::new(),
            cursor: 0,
            cursor_stack: Vec::new(),
        };
        view.populate(tree, tree.root());
        view
    }

    /// Replace the rows with the projection of `folder`'s displayable children.
    ///
    /// The cursor moves to the first row. The cursor stack is left alone;
    /// [`enter`](Self::enter), [`back`](Self::back) and
    /// [`set_cursor`](Self::set_cursor) maintain it.
    ///
    /// # Arguments
    /// * `tree` - Tree the view browses
    /// * `folder` - Folder whose children are shown
    pub fn populate(&mut self, tree: &GameTree, folder: EntryId) {
        let entries = tree.children_to_display(folder, &self.filter);
        self.rows = self.projector.project(tree, &self.collection_name, &entries);
        self.current_folder = folder;
        self.cursor = 0;
    }

    pub fn rows(&self) -> &[ProjectedRow] {
        &self.rows
    }

    pub fn current_folder(&self) -> EntryId {
        self.current_folder
    }

    pub fn cursor_stack(&self) -> &[EntryId] {
        &self.cursor_stack
    }

    pub fn cursor_index(&self) -> usize {
        self.cursor
    }

    pub fn cursor_row(&self) -> Option<&ProjectedRow> {
        self.rows.get(self.cursor)
    }

    /// Selected entry; `None` when the placeholder is shown
    pub fn cursor(&self) -> Option<EntryId> {
        self.cursor_row().and_then(|row| row.entry)
    }

    fn row_of(&self, id: EntryId) -> Option<usize> {
        self.rows.iter().position(|row| row.entry == Some(id))
    }

    /// Select `id`, switching to its folder when it is not in the current rows.
    ///
    /// When the folder switched to is not the top of the cursor stack, the
    /// stack is rebuilt from the folder's ancestors, root excluded.
    ///
    /// # Returns
    /// `false` when `id` is not a live entry with a parent
    pub fn set_cursor(&mut self, tree: &GameTree, id: EntryId) -> bool {
        if let Some(index) = self.row_of(id) {
            self.cursor = index;
            return true;
        }

        let Some(parent) = tree.parent(id) else {
            tracing::warn!("Cannot select {:?}: not a live entry below the root", id);
            return false;
        };

        self.populate(tree, parent);
        if let Some(index) = self.row_of(id) {
            self.cursor = index;
        }

        // The cursor may have landed in a folder we did not navigate into
        if self.cursor_stack.last() != Some(&parent) {
            self.rebuild_cursor_stack(tree, parent);
        }
        true
    }

    fn rebuild_cursor_stack(&mut self, tree: &GameTree, folder: EntryId) {
        let mut chain: Vec<EntryId> = std::iter::once(folder)
            .chain(tree.ancestors(folder))
            .take_while(|ancestor| *ancestor != self.root)
            .collect();
        chain.reverse();

        tracing::debug!("Rebuilt cursor stack with {} folders", chain.len());
        self.cursor_stack = chain;
    }

    /// Move the selection by `delta` rows, wrapping at either end
    pub fn move_cursor(&mut self, delta: isize) {
        if self.rows.is_empty() {
            return;
        }
        let len = self.rows.len() as isize;
        self.cursor = (self.cursor as isize + delta).rem_euclid(len) as usize;
    }

    /// Open the selected folder. Folders with nothing to show are not entered.
    pub fn enter(&mut self, tree: &GameTree) -> bool {
        let Some(selected) = self.cursor() else {
            return false;
        };
        if !tree.get(selected).is_some_and(Entry::is_folder) {
            return false;
        }
        if tree.children_to_display(selected, &self.filter).is_empty() {
            return false;
        }

        self.cursor_stack.push(selected);
        self.populate(tree, selected);
        true
    }

    /// Leave the current folder, selecting it in its parent's list
    pub fn back(&mut self, tree: &GameTree) -> bool {
        let Some(folder) = self.cursor_stack.pop() else {
            return false;
        };

        let parent = tree.parent(folder).unwrap_or(self.root);
        self.populate(tree, parent);
        if let Some(index) = self.row_of(folder) {
            self.cursor = index;
        }
        true
    }

    /// Remove `id` from the tree, keeping a sensible selection.
    ///
    /// When `id` is selected, the next sibling (else the previous one) is
    /// selected first. When the shown folder or a folder on the cursor stack
    /// goes away with `id`, the view moves to `id`'s parent and the stack is
    /// rebuilt for it.
    ///
    /// # Arguments
    /// * `tree` - Tree owning `id`
    /// * `id` - Entry to remove, with its subtree
    /// * `delete_file` - Also delete the entry's file; failures are logged, not fatal
    ///
    /// # Returns
    /// The detached entry
    ///
    /// # Errors
    /// [`TreeError::RemoveRoot`] for the root, [`TreeError::MissingEntry`]
    /// for ids that are not in the tree
    pub fn remove(&mut self, tree: &mut GameTree, id: EntryId, delete_file: bool) -> Result<Entry, TreeError> {
        if id == tree.root() {
            return Err(TreeError::RemoveRoot);
        }
        let parent = tree.parent(id).ok_or(TreeError::MissingEntry(id))?;

        let mut replacement = None;
        if self.cursor() == Some(id) {
            let siblings = tree.children_to_display(parent, &self.filter);
            if let Some(pos) = siblings.iter().position(|s| *s == id) {
                replacement = siblings
                    .get(pos + 1)
                    .or_else(|| pos.checked_sub(1).and_then(|prev| siblings.get(prev)))
                    .copied();
            }
            if let Some(next) = replacement {
                self.set_cursor(tree, next);
            }
        }

        if delete_file {
            if let Some(entry) = tree.get(id) {
                if let Err(e) = fs::remove_file(entry.path()) {
                    tracing::warn!("Failed to delete {}: {}", entry.path(), e);
                }
            }
        }

        let selected = self.cursor();
        let removed = tree.remove(id)?;
        tracing::info!("Removed {} from {}", removed.name(), tree.system_name());

        // A removed folder may be the one shown or one we navigated through
        let shown = if tree.contains(self.current_folder) {
            self.current_folder
        } else {
            parent
        };
        if !self.cursor_stack.iter().all(|folder| tree.contains(*folder)) {
            self.rebuild_cursor_stack(tree, shown);
        }

        // Empty folders fall back to the placeholder
        self.populate(tree, shown);
        if let Some(keep) = replacement.or(selected).filter(|s| tree.contains(*s)) {
            if let Some(index) = self.row_of(keep) {
                self.cursor = index;
            }
        }

        Ok(removed)
    }

    /// Re-sort the whole tree and re-project the current folder, keeping the selection
    pub fn sort(&mut self, tree: &mut GameTree) {
        let selected = self.cursor();
        tree.sort_children(self.root);
        self.populate(tree, self.current_folder_or_root(tree));
        if let Some(id) = selected {
            if let Some(index) = self.row_of(id) {
                self.cursor = index;
            }
        }
    }

    fn current_folder_or_root(&self, tree: &GameTree) -> EntryId {
        if tree.contains(self.current_folder) {
            self.current_folder
        } else {
            self.root
        }
    }
}
