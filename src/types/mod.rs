// Linkboard shared type definitions
// Each submodule defines types used across the board, drag and persistence layers.

pub mod board;
pub mod drag;
pub mod errors;
pub mod geometry;
pub mod ids;
pub mod preferences;
pub mod snapshot;
