//! Trash Manager for Linkboard.
//!
//! Soft-delete, restore and purge of links, layered on a borrowed
//! [`LayoutModel`]. Deleted links keep the id of the section they came from
//! so a restore can put them back; purging is permanent.

use tracing::debug;

use crate::managers::layout_model::LayoutModel;
use crate::services::link_utils;
use crate::types::board::TrashEntry;
use crate::types::errors::LayoutError;
use crate::types::ids::{LinkId, SectionId};

/// Trait defining trash operations.
pub trait TrashManagerTrait {
    fn delete(&mut self, link_id: &LinkId) -> Result<(), LayoutError>;
    fn restore(&mut self, link_id: &LinkId) -> Result<SectionId, LayoutError>;
    fn purge(&mut self, link_id: &LinkId) -> Result<TrashEntry, LayoutError>;
    fn purge_all(&mut self) -> usize;
    fn list(&self) -> &[TrashEntry];
}

/// Trash operations over a mutably borrowed board.
pub struct TrashManager<'a> {
    model: &'a mut LayoutModel,
}

impl<'a> TrashManager<'a> {
    /// Creates a new `TrashManager` working on the provided board.
    pub fn new(model: &'a mut LayoutModel) -> Self {
        Self { model }
    }

    fn trash_position(&self, link_id: &LinkId) -> Result<usize, LayoutError> {
        self.model
            .state
            .trash
            .iter()
            .position(|e| &e.link.id == link_id)
            .ok_or_else(|| LayoutError::NotFound(format!("trash entry {}", link_id)))
    }
}

impl<'a> TrashManagerTrait for TrashManager<'a> {
    /// Moves a link from its section to the end of the trash.
    fn delete(&mut self, link_id: &LinkId) -> Result<(), LayoutError> {
        let (section_id, pos) = self
            .model
            .locate_link(link_id)
            .ok_or_else(|| LayoutError::NotFound(format!("link {}", link_id)))?;

        let state = &mut self.model.state;
        let link = match state.sections.get_mut(&section_id) {
            Some(section) => section.links.remove(pos),
            None => return Err(LayoutError::NotFound(format!("section {}", section_id))),
        };
        state.trash.push(TrashEntry {
            link,
            originating_section_id: section_id.clone(),
            deleted_at: link_utils::now_millis(),
        });

        debug!(link = %link_id, section = %section_id, "link moved to trash");
        Ok(())
    }

    /// Takes a link out of the trash and appends it to its original section,
    /// or to the fallback section if that one no longer exists.
    /// Returns the section the link landed in.
    fn restore(&mut self, link_id: &LinkId) -> Result<SectionId, LayoutError> {
        let pos = self.trash_position(link_id)?;
        let entry = self.model.state.trash.remove(pos);

        let target = if self.model.state.sections.contains_key(&entry.originating_section_id) {
            entry.originating_section_id.clone()
        } else {
            self.model.ensure_fallback_section()
        };

        match self.model.state.sections.get_mut(&target) {
            Some(section) => section.links.push(entry.link),
            None => {
                self.model.state.trash.insert(pos, entry);
                return Err(LayoutError::NotFound(format!("section {}", target)));
            }
        }

        debug!(link = %link_id, section = %target, "link restored");
        Ok(target)
    }

    /// Permanently removes one trash entry.
    fn purge(&mut self, link_id: &LinkId) -> Result<TrashEntry, LayoutError> {
        let pos = self.trash_position(link_id)?;
        let entry = self.model.state.trash.remove(pos);
        debug!(link = %link_id, "trash entry purged");
        Ok(entry)
    }

    /// Permanently empties the trash. Returns how many entries were removed.
    fn purge_all(&mut self) -> usize {
        let count = self.model.state.trash.len();
        self.model.state.trash.clear();
        debug!(count, "trash emptied");
        count
    }

    fn list(&self) -> &[TrashEntry] {
        &self.model.state.trash
    }
}
