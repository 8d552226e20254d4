use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::ids::{ColumnId, LinkId, SectionId};
use super::preferences::Preferences;

/// A single saved link.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    pub id: LinkId,
    pub title: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    /// Creation time in milliseconds since the UNIX epoch.
    #[serde(alias = "date", default)]
    pub added_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl Link {
    /// A fresh link with a generated id. Domain and timestamp are filled in
    /// when the link is added to the board.
    pub fn new(title: &str, url: &str) -> Self {
        Self {
            id: LinkId::generate(),
            title: title.to_string(),
            url: url.to_string(),
            domain: None,
            added_at: 0,
            metadata: None,
        }
    }
}

/// A named, ordered collection of links.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Section {
    pub id: SectionId,
    pub title: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub links: Vec<Link>,
}

impl Section {
    pub fn new(title: &str, icon: &str) -> Self {
        Self {
            id: SectionId::generate(),
            title: title.to_string(),
            icon: icon.to_string(),
            links: Vec::new(),
        }
    }
}

/// One vertical lane of the board. Holds section ids only, never sections.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub id: ColumnId,
    #[serde(alias = "sections", default)]
    pub section_ids: Vec<SectionId>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Layout {
    pub columns: Vec<Column>,
}

impl Layout {
    /// Builds `count` empty columns named `col-1`..`col-N`.
    pub fn with_columns(count: usize) -> Self {
        Self {
            columns: (1..=count)
                .map(|n| Column {
                    id: ColumnId::from(format!("col-{}", n)),
                    section_ids: Vec::new(),
                })
                .collect(),
        }
    }

    /// Locates a section: `(column index, position within that column)`.
    pub fn locate(&self, section_id: &SectionId) -> Option<(usize, usize)> {
        self.columns.iter().enumerate().find_map(|(ci, col)| {
            col.section_ids
                .iter()
                .position(|id| id == section_id)
                .map(|pos| (ci, pos))
        })
    }

    pub fn column_index(&self, column_id: &ColumnId) -> Option<usize> {
        self.columns.iter().position(|c| &c.id == column_id)
    }

    /// Section ids in display order, column by column.
    pub fn section_order(&self) -> impl Iterator<Item = &SectionId> {
        self.columns.iter().flat_map(|c| c.section_ids.iter())
    }
}

/// A soft-deleted link waiting in the trash.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrashEntry {
    pub link: Link,
    /// Kept even after the section itself is deleted.
    pub originating_section_id: SectionId,
    pub deleted_at: i64,
}

/// The aggregate root of the board.
#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    pub sections: BTreeMap<SectionId, Section>,
    pub layout: Layout,
    pub trash: Vec<TrashEntry>,
    pub preferences: Preferences,
}

impl AppState {
    /// An empty board with `columns` empty columns.
    pub fn empty(columns: usize) -> Self {
        Self {
            sections: BTreeMap::new(),
            layout: Layout::with_columns(columns),
            trash: Vec::new(),
            preferences: Preferences::default(),
        }
    }

    pub fn stats(&self) -> BoardStats {
        BoardStats {
            section_count: self.sections.len(),
            link_count: self.sections.values().map(|s| s.links.len()).sum(),
            trash_count: self.trash.len(),
            columns: self.layout.columns.len(),
        }
    }
}

/// Summary counts, used by export metadata and the CLI.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BoardStats {
    pub section_count: usize,
    pub link_count: usize,
    pub trash_count: usize,
    pub columns: usize,
}
