//! Linkboard database layer.
//!
//! Provides the SQLite connection that backs snapshot persistence, plus
//! schema migrations.
//!
//! # Usage
//!
//! ```no_run
//! use linkboard::database::Database;
//!
//! // Open a persistent database
//! let db = Database::open("linkboard.db").expect("failed to open database");
//!
//! // Or use an in-memory database for testing
//! let db = Database::open_in_memory().expect("failed to open in-memory database");
//!
//! // Access the underlying connection for queries
//! let conn = db.connection();
//! ```

pub mod connection;
pub mod migrations;

pub use connection::Database;
