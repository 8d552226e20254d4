//! Opaque typed identifiers for board entities.
//!
//! Ids are strings on the wire (`"link-0001"`, `"col-1"`, uuids for new
//! records), but each entity kind gets its own newtype so a section id can
//! never be passed where a link id is expected.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! board_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Generates a fresh, never-before-used id.
            pub fn generate() -> Self {
                Self(format!("{}-{}", $prefix, Uuid::new_v4()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

board_id!(
    /// Identity of a [`Link`](super::board::Link). Assigned once, never reused.
    LinkId,
    "link"
);
board_id!(
    /// Identity of a [`Section`](super::board::Section).
    SectionId,
    "section"
);
board_id!(
    /// Identity of a [`Column`](super::board::Column).
    ColumnId,
    "col"
);
