use std::fmt;

// === LayoutError ===

/// Errors raised by board mutations (sections, links, trash).
///
/// A failed operation never leaves a partial change behind.
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutError {
    /// The referenced section, column, link or trash entry does not exist.
    NotFound(String),
    /// Removal blocked because the section still holds links.
    NotEmpty(String),
    /// An entity with this id is already on the board.
    AlreadyExists(String),
    /// The request itself is malformed (bad url, bad relocation target).
    Invalid(String),
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutError::NotFound(what) => write!(f, "Not found: {}", what),
            LayoutError::NotEmpty(id) => {
                write!(f, "Section is not empty: {} (relocate or trash its links first)", id)
            }
            LayoutError::AlreadyExists(id) => write!(f, "Already exists: {}", id),
            LayoutError::Invalid(msg) => write!(f, "Invalid request: {}", msg),
        }
    }
}

impl std::error::Error for LayoutError {}

// === DragError ===

/// Errors raised by the drag controller.
#[derive(Debug, Clone, PartialEq)]
pub enum DragError {
    /// A drag session is already in progress; the new pointer-down is ignored.
    ConcurrentDrag,
    /// The grabbed item or the drop target could not be resolved on the board.
    Layout(LayoutError),
}

impl fmt::Display for DragError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DragError::ConcurrentDrag => write!(f, "A drag is already in progress"),
            DragError::Layout(err) => write!(f, "Drag failed: {}", err),
        }
    }
}

impl std::error::Error for DragError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DragError::Layout(err) => Some(err),
            DragError::ConcurrentDrag => None,
        }
    }
}

impl From<LayoutError> for DragError {
    fn from(err: LayoutError) -> Self {
        DragError::Layout(err)
    }
}

// === PersistenceError ===

/// Errors raised while saving, loading, importing or exporting snapshots.
#[derive(Debug, Clone, PartialEq)]
pub enum PersistenceError {
    /// The durable store could not be read or written.
    Storage(String),
    /// A snapshot could not be encoded or decoded.
    Serialization(String),
    /// An import payload failed shape or integrity checks.
    Validation(String),
}

impl fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistenceError::Storage(msg) => write!(f, "Storage error: {}", msg),
            PersistenceError::Serialization(msg) => {
                write!(f, "Snapshot serialization error: {}", msg)
            }
            PersistenceError::Validation(msg) => write!(f, "Invalid board data: {}", msg),
        }
    }
}

impl std::error::Error for PersistenceError {}

