use serde::{Deserialize, Serialize};

use super::geometry::{Flow, Point, Rect};
use super::ids::{ColumnId, LinkId, SectionId};

/// The thing being dragged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum DragItem {
    Section(SectionId),
    Link(LinkId),
}

/// A rendered element the pointer can be dropped next to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate<I> {
    pub id: I,
    pub bounds: Rect,
}

/// A rendered container (a section for links, a column for sections) with its
/// items in display order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropContainer<C, I> {
    pub id: C,
    pub bounds: Rect,
    #[serde(default)]
    pub flow: Flow,
    #[serde(default = "Vec::new")]
    pub items: Vec<Candidate<I>>,
}

/// Geometry reported by the rendering layer on each pointer move.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DropSurface {
    /// Where a dragged link may land.
    #[serde(default)]
    pub sections: Vec<DropContainer<SectionId, LinkId>>,
    /// Where a dragged section may land.
    #[serde(default)]
    pub columns: Vec<DropContainer<ColumnId, SectionId>>,
}

/// Where the dragged item would land if released now. `before == None`
/// means the end of the container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Placeholder {
    Link {
        section: SectionId,
        before: Option<LinkId>,
    },
    Section {
        column: ColumnId,
        before: Option<SectionId>,
    },
}

/// Transient view state of an active drag, for the rendering layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DragView {
    /// Rendered in place but hidden while the proxy is shown.
    pub suppressed: DragItem,
    /// Top-left corner of the floating proxy.
    pub proxy_origin: Point,
    pub placeholder: Placeholder,
}

/// Why a drag was abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CancelReason {
    Escape,
    CaptureLost,
    LeftSurface,
}

/// The single mutation a completed drag performed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DragCommit {
    Link {
        id: LinkId,
        section: SectionId,
        index: usize,
    },
    Section {
        id: SectionId,
        column: ColumnId,
        index: usize,
    },
}

/// Result of a pointer release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum DragOutcome {
    /// Nothing was in progress.
    Idle,
    /// Released before the movement threshold: a plain click on the item.
    Click { item: DragItem },
    /// The drag completed and exactly one move was applied.
    Committed { commit: DragCommit },
}
