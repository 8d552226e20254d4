//! Layout Model for Linkboard.
//!
//! Owns the canonical board state (sections, column layout, trash,
//! preferences) and is the only legal mutation path for it. Every mutation
//! validates its inputs before touching the state, so a failed call leaves
//! the board exactly as it was.
//!
//! Target indices passed to the move operations are insertion slots in the
//! target list *as it looks before the move*, in `0..=len`. For a move
//! inside one list the slot is corrected for the removal of the moved item
//! (see [`same_list_target`]); moves between lists use the slot as-is.

use std::collections::HashSet;

use tracing::debug;

use crate::managers::trash_manager::{TrashManager, TrashManagerTrait};
use crate::services::link_utils;
use crate::types::board::{AppState, Link, Section, TrashEntry};
use crate::types::errors::LayoutError;
use crate::types::ids::{ColumnId, LinkId, SectionId};
use crate::types::preferences::Preferences;
use crate::types::snapshot::Snapshot;

/// Number of columns on a freshly created board.
pub const DEFAULT_COLUMN_COUNT: usize = 3;

/// Title of the section created when a restored link has nowhere to go.
pub const FALLBACK_SECTION_TITLE: &str = "Restored";

/// Trait defining the board mutation interface.
pub trait LayoutModelTrait {
    fn add_section(&mut self, section: Section, column_id: &ColumnId, index: usize) -> Result<(), LayoutError>;
    fn remove_section(&mut self, section_id: &SectionId, relocate_links_to: Option<&SectionId>) -> Result<Section, LayoutError>;
    fn remove_section_with_links(&mut self, section_id: &SectionId) -> Result<Section, LayoutError>;
    fn move_section(&mut self, section_id: &SectionId, target_column_id: &ColumnId, target_index: usize) -> Result<(), LayoutError>;
    fn rename_section(&mut self, section_id: &SectionId, title: Option<&str>, icon: Option<&str>) -> Result<(), LayoutError>;
    fn add_link(&mut self, link: Link, section_id: &SectionId, index: usize) -> Result<LinkId, LayoutError>;
    fn move_link(&mut self, link_id: &LinkId, target_section_id: &SectionId, target_index: usize) -> Result<(), LayoutError>;
    fn update_link(&mut self, link_id: &LinkId, title: Option<&str>, url: Option<&str>) -> Result<(), LayoutError>;
    fn update_link_title(&mut self, link_id: &LinkId, title: &str) -> Result<(), LayoutError>;
    fn delete_link(&mut self, link_id: &LinkId) -> Result<(), LayoutError>;
    fn serialize(&self) -> Snapshot;
}

/// Converts an insertion slot computed against the list *including* the
/// moved item into the index to insert at once the item has been removed.
///
/// Removing the item at `current` shifts every later element down by one,
/// so slots past it are decremented. Only valid for moves within one list.
pub fn same_list_target(current: usize, target: usize) -> usize {
    if target > current {
        target - 1
    } else {
        target
    }
}

/// Moves `list[from]` to insertion slot `to` (pre-removal coordinates, clamped).
fn reorder_within<T>(list: &mut Vec<T>, from: usize, to: usize) {
    let to = same_list_target(from, to.min(list.len()));
    if to == from {
        return;
    }
    let item = list.remove(from);
    list.insert(to, item);
}

/// The single owner of the board state.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutModel {
    pub(crate) state: AppState,
}

impl LayoutModel {
    /// Creates an empty board with `columns` columns.
    pub fn new(columns: usize) -> Self {
        Self {
            state: AppState::empty(columns),
        }
    }

    /// Wraps an existing state after checking every board invariant.
    pub fn from_state(state: AppState) -> Result<Self, LayoutError> {
        check_invariants(&state)?;
        Ok(Self { state })
    }

    /// Rebuilds a model from a snapshot, rejecting states that break invariants.
    pub fn deserialize(snapshot: Snapshot) -> Result<Self, LayoutError> {
        Self::from_state(snapshot.data.into_state())
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn check_invariants(&self) -> Result<(), LayoutError> {
        check_invariants(&self.state)
    }

    pub fn section(&self, section_id: &SectionId) -> Option<&Section> {
        self.state.sections.get(section_id)
    }

    /// Section ids of a column in display order.
    pub fn column_sections(&self, column_id: &ColumnId) -> Option<&[SectionId]> {
        self.state
            .layout
            .columns
            .iter()
            .find(|c| &c.id == column_id)
            .map(|c| c.section_ids.as_slice())
    }

    pub fn column_ids(&self) -> Vec<ColumnId> {
        self.state.layout.columns.iter().map(|c| c.id.clone()).collect()
    }

    /// Finds a live link: `(owning section, position within it)`.
    pub fn locate_link(&self, link_id: &LinkId) -> Option<(SectionId, usize)> {
        self.state.sections.values().find_map(|s| {
            s.links
                .iter()
                .position(|l| &l.id == link_id)
                .map(|pos| (s.id.clone(), pos))
        })
    }

    /// Finds a section: `(owning column, position within it)`.
    pub fn locate_section(&self, section_id: &SectionId) -> Option<(ColumnId, usize)> {
        self.state
            .layout
            .locate(section_id)
            .map(|(ci, pos)| (self.state.layout.columns[ci].id.clone(), pos))
    }

    pub fn link(&self, link_id: &LinkId) -> Option<&Link> {
        self.state
            .sections
            .values()
            .flat_map(|s| s.links.iter())
            .find(|l| &l.id == link_id)
    }

    pub fn trash(&self) -> &[TrashEntry] {
        &self.state.trash
    }

    pub fn preferences(&self) -> &Preferences {
        &self.state.preferences
    }

    /// Sets one preference by wire name (see [`Preferences::set_value`]).
    pub fn set_preference(&mut self, key: &str, value: serde_json::Value) -> Result<(), LayoutError> {
        self.state.preferences.set_value(key, value)
    }

    /// Whether `link_id` is in use anywhere: on the board or in the trash.
    pub fn contains_link_id(&self, link_id: &LinkId) -> bool {
        self.locate_link(link_id).is_some()
            || self.state.trash.iter().any(|e| &e.link.id == link_id)
    }

    /// Returns the section that receives restored links whose original
    /// section is gone: the first section on the board, created on demand.
    pub(crate) fn ensure_fallback_section(&mut self) -> SectionId {
        if let Some(id) = self.state.layout.section_order().next() {
            return id.clone();
        }

        if self.state.layout.columns.is_empty() {
            self.state.layout = crate::types::board::Layout::with_columns(1);
        }
        let section = Section::new(FALLBACK_SECTION_TITLE, "");
        let id = section.id.clone();
        self.state.layout.columns[0].section_ids.push(id.clone());
        self.state.sections.insert(id.clone(), section);
        debug!(section = %id, "created fallback section");
        id
    }

    /// Normalises a new link: valid url, resolvable title, derived domain, timestamp.
    fn prepare_link(mut link: Link) -> Result<Link, LayoutError> {
        let url = link_utils::normalize_url(&link.url)
            .ok_or_else(|| LayoutError::Invalid(format!("invalid url: {}", link.url)))?;
        link.title = link_utils::resolve_title(&link.title, &url);
        if link.domain.as_deref().map_or(true, str::is_empty) {
            link.domain = link_utils::extract_domain(&url);
        }
        if link.added_at == 0 {
            link.added_at = link_utils::now_millis();
        }
        if link.metadata.as_ref().is_some_and(serde_json::Value::is_null) {
            link.metadata = None;
        }
        link.url = url;
        Ok(link)
    }

    fn section_mut(&mut self, section_id: &SectionId) -> Result<&mut Section, LayoutError> {
        self.state
            .sections
            .get_mut(section_id)
            .ok_or_else(|| LayoutError::NotFound(format!("section {}", section_id)))
    }

    fn link_mut(&mut self, link_id: &LinkId) -> Result<&mut Link, LayoutError> {
        self.state
            .sections
            .values_mut()
            .flat_map(|s| s.links.iter_mut())
            .find(|l| &l.id == link_id)
            .ok_or_else(|| LayoutError::NotFound(format!("link {}", link_id)))
    }

    /// Unlinks a section id from its column and drops the section record.
    fn detach_section(&mut self, section_id: &SectionId) -> Option<Section> {
        let (ci, pos) = self.state.layout.locate(section_id)?;
        self.state.layout.columns[ci].section_ids.remove(pos);
        self.state.sections.remove(section_id)
    }
}

impl Default for LayoutModel {
    fn default() -> Self {
        Self::new(DEFAULT_COLUMN_COUNT)
    }
}

impl LayoutModelTrait for LayoutModel {
    /// Inserts a new section into `column_id` at `index` (clamped to the column length).
    fn add_section(
        &mut self,
        section: Section,
        column_id: &ColumnId,
        index: usize,
    ) -> Result<(), LayoutError> {
        let ci = self
            .state
            .layout
            .column_index(column_id)
            .ok_or_else(|| LayoutError::NotFound(format!("column {}", column_id)))?;

        if self.state.sections.contains_key(&section.id) {
            return Err(LayoutError::AlreadyExists(format!("section {}", section.id)));
        }
        let mut seen = HashSet::new();
        for link in &section.links {
            if !seen.insert(&link.id) || self.contains_link_id(&link.id) {
                return Err(LayoutError::AlreadyExists(format!("link {}", link.id)));
            }
        }

        let column = &mut self.state.layout.columns[ci];
        let index = index.min(column.section_ids.len());
        column.section_ids.insert(index, section.id.clone());
        debug!(section = %section.id, column = %column_id, index, "section added");
        self.state.sections.insert(section.id.clone(), section);
        Ok(())
    }

    /// Removes a section. A non-empty section needs a relocation target for
    /// its links (appended there in order); otherwise this fails with `NotEmpty`.
    fn remove_section(
        &mut self,
        section_id: &SectionId,
        relocate_links_to: Option<&SectionId>,
    ) -> Result<Section, LayoutError> {
        let section = self
            .state
            .sections
            .get(section_id)
            .ok_or_else(|| LayoutError::NotFound(format!("section {}", section_id)))?;

        match relocate_links_to {
            Some(target) if target == section_id => {
                return Err(LayoutError::Invalid(
                    "cannot relocate links into the section being removed".to_string(),
                ));
            }
            Some(target) if !self.state.sections.contains_key(target) => {
                return Err(LayoutError::NotFound(format!("section {}", target)));
            }
            None if !section.links.is_empty() => {
                return Err(LayoutError::NotEmpty(section_id.to_string()));
            }
            _ => {}
        }

        let mut removed = self
            .detach_section(section_id)
            .ok_or_else(|| LayoutError::NotFound(format!("section {}", section_id)))?;

        if let Some(target) = relocate_links_to {
            let links = std::mem::take(&mut removed.links);
            let count = links.len();
            self.section_mut(target)?.links.extend(links);
            debug!(section = %section_id, target = %target, count, "links relocated");
        }

        debug!(section = %section_id, "section removed");
        Ok(removed)
    }

    /// Removes a section after moving all of its links to the trash.
    fn remove_section_with_links(&mut self, section_id: &SectionId) -> Result<Section, LayoutError> {
        let mut removed = self
            .detach_section(section_id)
            .ok_or_else(|| LayoutError::NotFound(format!("section {}", section_id)))?;

        let deleted_at = link_utils::now_millis();
        let count = removed.links.len();
        self.state
            .trash
            .extend(removed.links.drain(..).map(|link| TrashEntry {
                link,
                originating_section_id: section_id.clone(),
                deleted_at,
            }));

        debug!(section = %section_id, trashed = count, "section removed with links");
        Ok(removed)
    }

    /// Moves a section to slot `target_index` of `target_column_id`.
    /// Dropping a section onto its own slot succeeds without change.
    fn move_section(
        &mut self,
        section_id: &SectionId,
        target_column_id: &ColumnId,
        target_index: usize,
    ) -> Result<(), LayoutError> {
        let target_ci = self
            .state
            .layout
            .column_index(target_column_id)
            .ok_or_else(|| LayoutError::NotFound(format!("column {}", target_column_id)))?;
        let (source_ci, source_pos) = self
            .state
            .layout
            .locate(section_id)
            .ok_or_else(|| LayoutError::NotFound(format!("section {}", section_id)))?;

        let columns = &mut self.state.layout.columns;
        if source_ci == target_ci {
            reorder_within(&mut columns[source_ci].section_ids, source_pos, target_index);
        } else {
            let id = columns[source_ci].section_ids.remove(source_pos);
            let target = &mut columns[target_ci].section_ids;
            let index = target_index.min(target.len());
            target.insert(index, id);
        }

        debug!(section = %section_id, column = %target_column_id, target_index, "section moved");
        Ok(())
    }

    /// Updates a section's title and/or icon. A blank title is rejected.
    fn rename_section(
        &mut self,
        section_id: &SectionId,
        title: Option<&str>,
        icon: Option<&str>,
    ) -> Result<(), LayoutError> {
        if title.is_some_and(|t| t.trim().is_empty()) {
            return Err(LayoutError::Invalid("section title cannot be empty".to_string()));
        }
        let section = self.section_mut(section_id)?;
        if let Some(title) = title {
            section.title = title.trim().to_string();
        }
        if let Some(icon) = icon {
            section.icon = icon.to_string();
        }
        Ok(())
    }

    /// Inserts a new link into `section_id` at `index` (clamped). Returns its id.
    fn add_link(&mut self, link: Link, section_id: &SectionId, index: usize) -> Result<LinkId, LayoutError> {
        if !self.state.sections.contains_key(section_id) {
            return Err(LayoutError::NotFound(format!("section {}", section_id)));
        }
        if self.contains_link_id(&link.id) {
            return Err(LayoutError::AlreadyExists(format!("link {}", link.id)));
        }
        let link = Self::prepare_link(link)?;
        let id = link.id.clone();

        let links = &mut self.section_mut(section_id)?.links;
        let index = index.min(links.len());
        links.insert(index, link);
        debug!(link = %id, section = %section_id, index, "link added");
        Ok(id)
    }

    /// Moves a link to slot `target_index` of `target_section_id`.
    fn move_link(
        &mut self,
        link_id: &LinkId,
        target_section_id: &SectionId,
        target_index: usize,
    ) -> Result<(), LayoutError> {
        if !self.state.sections.contains_key(target_section_id) {
            return Err(LayoutError::NotFound(format!("section {}", target_section_id)));
        }
        let (source_id, source_pos) = self
            .locate_link(link_id)
            .ok_or_else(|| LayoutError::NotFound(format!("link {}", link_id)))?;

        if &source_id == target_section_id {
            reorder_within(&mut self.section_mut(&source_id)?.links, source_pos, target_index);
        } else {
            let link = self.section_mut(&source_id)?.links.remove(source_pos);
            let target = &mut self.section_mut(target_section_id)?.links;
            let index = target_index.min(target.len());
            target.insert(index, link);
        }

        debug!(link = %link_id, section = %target_section_id, target_index, "link moved");
        Ok(())
    }

    /// Edits a link in place. A new url is validated and refreshes the domain.
    fn update_link(&mut self, link_id: &LinkId, title: Option<&str>, url: Option<&str>) -> Result<(), LayoutError> {
        let url = match url {
            Some(u) => Some(
                link_utils::normalize_url(u)
                    .ok_or_else(|| LayoutError::Invalid(format!("invalid url: {}", u)))?,
            ),
            None => None,
        };
        let link = self.link_mut(link_id)?;
        if let Some(url) = url {
            link.domain = link_utils::extract_domain(&url);
            link.url = url;
        }
        if let Some(title) = title {
            link.title = link_utils::resolve_title(title, &link.url);
        }
        Ok(())
    }

    /// Applies a title resolved asynchronously for the link's url.
    ///
    /// The link may have been trashed while the title was in flight; the
    /// entry in the trash is updated in that case.
    fn update_link_title(&mut self, link_id: &LinkId, title: &str) -> Result<(), LayoutError> {
        if let Ok(link) = self.link_mut(link_id) {
            link.title = link_utils::resolve_title(title, &link.url);
            return Ok(());
        }
        let entry = self
            .state
            .trash
            .iter_mut()
            .find(|e| &e.link.id == link_id)
            .ok_or_else(|| LayoutError::NotFound(format!("link {}", link_id)))?;
        entry.link.title = link_utils::resolve_title(title, &entry.link.url);
        Ok(())
    }

    /// Soft-deletes a link; see [`TrashManager::delete`].
    fn delete_link(&mut self, link_id: &LinkId) -> Result<(), LayoutError> {
        TrashManager::new(self).delete(link_id)
    }

    fn serialize(&self) -> Snapshot {
        Snapshot::of(&self.state)
    }
}

/// Verifies the board invariants:
///
/// - column ids are unique;
/// - every section id in the layout names an existing section, exactly once;
/// - every section is placed in some column and is keyed by its own id;
/// - every link id is unique across all sections and the trash.
pub fn check_invariants(state: &AppState) -> Result<(), LayoutError> {
    let mut columns = HashSet::new();
    for column in &state.layout.columns {
        if !columns.insert(&column.id) {
            return Err(LayoutError::Invalid(format!("duplicate column {}", column.id)));
        }
    }

    let mut placed = HashSet::new();
    for id in state.layout.section_order() {
        if !state.sections.contains_key(id) {
            return Err(LayoutError::Invalid(format!("layout references unknown section {}", id)));
        }
        if !placed.insert(id) {
            return Err(LayoutError::Invalid(format!("section {} is placed twice", id)));
        }
    }

    for (key, section) in &state.sections {
        if key != &section.id {
            return Err(LayoutError::Invalid(format!("section keyed as {} has id {}", key, section.id)));
        }
        if !placed.contains(key) {
            return Err(LayoutError::Invalid(format!("section {} is not in any column", key)));
        }
    }

    let mut links = HashSet::new();
    let live = state.sections.values().flat_map(|s| s.links.iter());
    let trashed = state.trash.iter().map(|e| &e.link);
    for link in live.chain(trashed) {
        if !links.insert(&link.id) {
            return Err(LayoutError::Invalid(format!("link id {} appears more than once", link.id)));
        }
    }

    Ok(())
}
