//! Drag Controller for Linkboard.
//!
//! Turns pointer events into at most one board mutation:
//!
//! ```text
//! Idle -> Pending -> Dragging -> (commit | cancel) -> Idle
//! ```
//!
//! While pending or dragging nothing on the board changes; the placeholder
//! and floating proxy are transient view state held here. Releasing a drag
//! performs exactly one `move_link`/`move_section` call. Cancelling performs
//! none.

use tracing::debug;

use crate::managers::layout_model::{LayoutModel, LayoutModelTrait};
use crate::services::insertion_resolver;
use crate::types::drag::{
    CancelReason, DragCommit, DragItem, DragOutcome, DragView, DropContainer, DropSurface,
    Placeholder,
};
use crate::types::errors::{DragError, LayoutError};
use crate::types::geometry::{Point, Rect};

/// Squared pointer travel (logical px) separating a click from a drag.
pub const DRAG_START_THRESHOLD: f64 = 5. * 5.;

/// Lifecycle hooks invoked synchronously by the controller.
pub trait DragObserver {
    fn on_drag_start(&mut self, _item: &DragItem) {}
    fn on_drag_commit(&mut self, _commit: &DragCommit) {}
    fn on_drag_cancel(&mut self, _item: &DragItem, _reason: CancelReason) {}
}

/// Current phase of the drag session.
#[derive(Debug, Clone, PartialEq)]
pub enum DragState {
    Idle,
    /// Pointer is down on a handle but has not travelled past the threshold.
    Pending {
        item: DragItem,
        start: Point,
        /// Pointer offset from the item's top-left corner.
        grab_offset: Point,
        /// Where the item sits on the board, as a placeholder.
        origin: Placeholder,
    },
    Dragging {
        item: DragItem,
        grab_offset: Point,
        view: DragView,
    },
}

/// Trait defining the drag session interface.
pub trait DragControllerTrait {
    fn pointer_down(&mut self, model: &LayoutModel, item: DragItem, pointer: Point, item_bounds: Rect) -> Result<(), DragError>;
    fn pointer_move(&mut self, pointer: Point, surface: &DropSurface) -> Option<&DragView>;
    fn pointer_up(&mut self, model: &mut LayoutModel) -> Result<DragOutcome, DragError>;
    fn cancel(&mut self, reason: CancelReason) -> bool;
}

/// Single-session drag state machine.
pub struct DragController {
    state: DragState,
    observers: Vec<Box<dyn DragObserver>>,
}

impl DragController {
    pub fn new() -> Self {
        Self {
            state: DragState::Idle,
            observers: Vec::new(),
        }
    }

    pub fn add_observer(&mut self, observer: Box<dyn DragObserver>) {
        self.observers.push(observer);
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, DragState::Idle)
    }

    /// The placeholder and proxy to render, while dragging.
    pub fn view(&self) -> Option<&DragView> {
        match &self.state {
            DragState::Dragging { view, .. } => Some(view),
            _ => None,
        }
    }

    /// Pointer left the interactive surface without a release.
    pub fn pointer_leave(&mut self) -> bool {
        self.cancel(CancelReason::LeftSurface)
    }

    /// The item's current slot on the board, expressed as a placeholder.
    fn origin_of(model: &LayoutModel, item: &DragItem) -> Result<Placeholder, LayoutError> {
        match item {
            DragItem::Link(id) => {
                let (section, pos) = model
                    .locate_link(id)
                    .ok_or_else(|| LayoutError::NotFound(format!("link {}", id)))?;
                let before = model
                    .section(&section)
                    .and_then(|s| s.links.get(pos + 1))
                    .map(|l| l.id.clone());
                Ok(Placeholder::Link { section, before })
            }
            DragItem::Section(id) => {
                let (column, pos) = model
                    .locate_section(id)
                    .ok_or_else(|| LayoutError::NotFound(format!("section {}", id)))?;
                let before = model
                    .column_sections(&column)
                    .and_then(|ids| ids.get(pos + 1))
                    .cloned();
                Ok(Placeholder::Section { column, before })
            }
        }
    }

    /// Resolves the live placeholder for `pointer`, or `None` if the surface
    /// offers no container for this kind of item.
    fn resolve_placeholder(item: &DragItem, pointer: Point, surface: &DropSurface) -> Option<Placeholder> {
        match item {
            DragItem::Link(id) => {
                let container = pick_container(&surface.sections, pointer)?;
                let before =
                    insertion_resolver::resolve(&container.items, Some(id), pointer, container.flow)
                        .cloned();
                Some(Placeholder::Link {
                    section: container.id.clone(),
                    before,
                })
            }
            DragItem::Section(id) => {
                let container = pick_container(&surface.columns, pointer)?;
                let before =
                    insertion_resolver::resolve(&container.items, Some(id), pointer, container.flow)
                        .cloned();
                Some(Placeholder::Section {
                    column: container.id.clone(),
                    before,
                })
            }
        }
    }

    /// Translates the final placeholder into one model move.
    fn commit(model: &mut LayoutModel, item: &DragItem, placeholder: &Placeholder) -> Result<DragCommit, DragError> {
        match (item, placeholder) {
            (DragItem::Link(id), Placeholder::Link { section, before }) => {
                let links = &model
                    .section(section)
                    .ok_or_else(|| LayoutError::NotFound(format!("section {}", section)))?
                    .links;
                let index = before
                    .as_ref()
                    .and_then(|b| links.iter().position(|l| &l.id == b))
                    .unwrap_or(links.len());
                model.move_link(id, section, index)?;
                Ok(DragCommit::Link {
                    id: id.clone(),
                    section: section.clone(),
                    index,
                })
            }
            (DragItem::Section(id), Placeholder::Section { column, before }) => {
                let ids = model
                    .column_sections(column)
                    .ok_or_else(|| LayoutError::NotFound(format!("column {}", column)))?;
                let index = before
                    .as_ref()
                    .and_then(|b| ids.iter().position(|s| s == b))
                    .unwrap_or(ids.len());
                model.move_section(id, column, index)?;
                Ok(DragCommit::Section {
                    id: id.clone(),
                    column: column.clone(),
                    index,
                })
            }
            _ => Err(DragError::Layout(LayoutError::Invalid(
                "placeholder does not match the dragged item".to_string(),
            ))),
        }
    }
}

impl Default for DragController {
    fn default() -> Self {
        Self::new()
    }
}

/// The container under the pointer, else the one closest to it.
fn pick_container<C, I>(containers: &[DropContainer<C, I>], pointer: Point) -> Option<&DropContainer<C, I>> {
    containers
        .iter()
        .find(|c| c.bounds.contains(pointer))
        .or_else(|| {
            containers.iter().min_by(|a, b| {
                a.bounds
                    .distance_sq_to(pointer)
                    .total_cmp(&b.bounds.distance_sq_to(pointer))
            })
        })
}

impl DragControllerTrait for DragController {
    /// Starts a pending drag on `item`. Fails with `ConcurrentDrag` while
    /// another session is active; callers drop that error silently.
    fn pointer_down(
        &mut self,
        model: &LayoutModel,
        item: DragItem,
        pointer: Point,
        item_bounds: Rect,
    ) -> Result<(), DragError> {
        if !self.is_idle() {
            debug!(?item, "pointer down ignored: drag already active");
            return Err(DragError::ConcurrentDrag);
        }

        let origin = Self::origin_of(model, &item)?;
        debug!(?item, "drag pending");
        self.state = DragState::Pending {
            item,
            start: pointer,
            grab_offset: Point::new(pointer.x - item_bounds.x, pointer.y - item_bounds.y),
            origin,
        };
        Ok(())
    }

    /// Feeds a pointer move. Returns the view to render while dragging.
    fn pointer_move(&mut self, pointer: Point, surface: &DropSurface) -> Option<&DragView> {
        match &mut self.state {
            DragState::Idle => return None,
            DragState::Pending {
                item,
                start,
                grab_offset,
                origin,
            } => {
                if start.distance_sq(pointer) < DRAG_START_THRESHOLD {
                    return None;
                }
                let placeholder = Self::resolve_placeholder(item, pointer, surface)
                    .unwrap_or_else(|| origin.clone());
                let item = item.clone();
                let grab_offset = *grab_offset;
                let view = DragView {
                    suppressed: item.clone(),
                    proxy_origin: Point::new(pointer.x - grab_offset.x, pointer.y - grab_offset.y),
                    placeholder,
                };
                debug!(?item, "drag started");
                for observer in &mut self.observers {
                    observer.on_drag_start(&item);
                }
                self.state = DragState::Dragging {
                    item,
                    grab_offset,
                    view,
                };
            }
            DragState::Dragging {
                item,
                grab_offset,
                view,
            } => {
                // Off every container: keep the last placeholder.
                if let Some(placeholder) = Self::resolve_placeholder(item, pointer, surface) {
                    view.placeholder = placeholder;
                }
                view.proxy_origin = Point::new(pointer.x - grab_offset.x, pointer.y - grab_offset.y);
            }
        }
        self.view()
    }

    /// Ends the session. A drag commits exactly one move; a release before
    /// the threshold is reported as a click. The controller is idle afterwards
    /// even if the move fails.
    fn pointer_up(&mut self, model: &mut LayoutModel) -> Result<DragOutcome, DragError> {
        match std::mem::replace(&mut self.state, DragState::Idle) {
            DragState::Idle => Ok(DragOutcome::Idle),
            DragState::Pending { item, .. } => {
                debug!(?item, "released before threshold: click");
                Ok(DragOutcome::Click { item })
            }
            DragState::Dragging { item, view, .. } => {
                let commit = Self::commit(model, &item, &view.placeholder)?;
                debug!(?commit, "drag committed");
                for observer in &mut self.observers {
                    observer.on_drag_commit(&commit);
                }
                Ok(DragOutcome::Committed { commit })
            }
        }
    }

    /// Abandons the session without touching the board. Returns whether a
    /// session was active.
    fn cancel(&mut self, reason: CancelReason) -> bool {
        match std::mem::replace(&mut self.state, DragState::Idle) {
            DragState::Idle => false,
            DragState::Pending { item, .. } => {
                debug!(?item, ?reason, "pending drag cancelled");
                true
            }
            DragState::Dragging { item, .. } => {
                debug!(?item, ?reason, "drag cancelled");
                for observer in &mut self.observers {
                    observer.on_drag_cancel(&item, reason);
                }
                true
            }
        }
    }
}
