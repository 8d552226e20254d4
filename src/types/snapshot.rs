use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::board::{AppState, BoardStats, Layout, Section, TrashEntry};
use super::preferences::Preferences;

/// Current snapshot schema version. Bump when the wire shape changes.
pub const SCHEMA_VERSION: u32 = 1;

/// Stamp written into the `exportedBy` field of export files.
pub const EXPORTED_BY: &str = concat!("linkboard ", env!("CARGO_PKG_VERSION"));

/// The serializable body of a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BoardData {
    pub sections: Vec<Section>,
    pub layout: Layout,
    #[serde(default)]
    pub trash: Vec<TrashEntry>,
    #[serde(default)]
    pub preferences: Preferences,
}

impl BoardData {
    /// Captures `state` with sections listed in display order.
    pub fn from_state(state: &AppState) -> Self {
        let mut sections: Vec<Section> = state
            .layout
            .section_order()
            .filter_map(|id| state.sections.get(id).cloned())
            .collect();
        // Unplaced sections only exist in states that failed validation, but
        // they must still never be dropped from a snapshot.
        for (id, section) in &state.sections {
            if state.layout.locate(id).is_none() {
                sections.push(section.clone());
            }
        }

        Self {
            sections,
            layout: state.layout.clone(),
            trash: state.trash.clone(),
            preferences: state.preferences.clone(),
        }
    }

    /// Rebuilds the state. Performs no validation.
    pub fn into_state(self) -> AppState {
        let sections: BTreeMap<_, _> = self
            .sections
            .into_iter()
            .map(|s| (s.id.clone(), s))
            .collect();
        AppState {
            sections,
            layout: self.layout,
            trash: self.trash,
            preferences: self.preferences,
        }
    }
}

/// The versioned envelope persisted to the store: `{version, data}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    pub version: u32,
    pub data: BoardData,
}

impl Snapshot {
    pub fn of(state: &AppState) -> Self {
        Self {
            version: SCHEMA_VERSION,
            data: BoardData::from_state(state),
        }
    }
}

/// A user-facing export file: the snapshot envelope plus stamps and counts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExportFile {
    pub version: u32,
    /// Milliseconds since the UNIX epoch.
    pub exported_at: i64,
    pub exported_by: String,
    pub data: BoardData,
    pub metadata: BoardStats,
    /// Base64 SHA-256 of the serialized `data` block.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}
