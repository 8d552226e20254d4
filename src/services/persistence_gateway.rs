//! Persistence Gateway for Linkboard.
//!
//! Saves board snapshots to SQLite as a versioned JSON envelope, with a
//! trailing debounce so a burst of commits becomes a single write. Loading
//! never fails the application: a missing or unreadable snapshot yields the
//! caller's default. Imports are validated in full before anything is
//! touched, and the replaced state is backed up first.

use std::sync::Arc;
use std::time::{Duration, Instant};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use ring::digest;
use rusqlite::{params, OptionalExtension};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::database::connection::Database;
use crate::managers::layout_model::{LayoutModel, LayoutModelTrait};
use crate::services::link_utils;
use crate::types::board::{AppState, BoardStats};
use crate::types::errors::PersistenceError;
use crate::types::snapshot::{BoardData, ExportFile, Snapshot, EXPORTED_BY, SCHEMA_VERSION};

/// Default quiet period before a scheduled save is written.
pub const DEFAULT_SAVE_DEBOUNCE: Duration = Duration::from_millis(500);

/// Slot holding the live board.
const CURRENT_SLOT: &str = "current";

/// Backup reason for a stored board that failed to decode at startup.
pub const UNREADABLE_REASON: &str = "unreadable";

/// Summary of a stored backup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BackupInfo {
    pub id: String,
    pub reason: String,
    pub created_at: i64,
}

/// Trait defining snapshot persistence operations.
pub trait PersistenceGatewayTrait {
    fn save(&mut self, snapshot: &Snapshot) -> Result<(), PersistenceError>;
    fn poll(&mut self, now: Instant) -> Result<bool, PersistenceError>;
    fn flush(&mut self) -> Result<bool, PersistenceError>;
    fn load(&self, default: LayoutModel) -> LayoutModel;
    fn export(&self, state: &AppState) -> Result<Vec<u8>, PersistenceError>;
    fn import(&mut self, model: &mut LayoutModel, bytes: &[u8]) -> Result<BoardStats, PersistenceError>;
    fn backup(&self, state: &AppState, reason: &str) -> Result<String, PersistenceError>;
    fn list_backups(&self) -> Result<Vec<BackupInfo>, PersistenceError>;
    fn restore_backup(&mut self, model: &mut LayoutModel, backup_id: &str) -> Result<(), PersistenceError>;
}

/// A serialized snapshot waiting for its debounce deadline.
struct PendingWrite {
    json: String,
    due: Instant,
}

/// Snapshot persistence backed by SQLite.
pub struct PersistenceGateway {
    db: Arc<Database>,
    debounce: Duration,
    pending: Option<PendingWrite>,
    writes: u64,
}

impl PersistenceGateway {
    pub fn new(db: Arc<Database>, debounce: Duration) -> Self {
        Self {
            db,
            debounce,
            pending: None,
            writes: 0,
        }
    }

    /// Schedules `snapshot` to be written once `now + debounce` has passed.
    /// A later call replaces the pending snapshot and pushes the deadline out.
    pub fn save_at(&mut self, snapshot: &Snapshot, now: Instant) -> Result<(), PersistenceError> {
        let json = serde_json::to_string(snapshot)
            .map_err(|e| PersistenceError::Serialization(e.to_string()))?;
        self.pending = Some(PendingWrite {
            json,
            due: now + self.debounce,
        });
        Ok(())
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Number of snapshot writes that reached the store.
    pub fn write_count(&self) -> u64 {
        self.writes
    }

    /// Reads the stored snapshot. `Ok(None)` if nothing was ever saved.
    pub fn try_load(&self) -> Result<Option<LayoutModel>, PersistenceError> {
        match self.read_current()? {
            Some((_, json)) => decode_snapshot(&json).map(Some),
            None => Ok(None),
        }
    }

    /// The raw `(version, data)` row of the live board, if any.
    fn read_current(&self) -> Result<Option<(i64, String)>, PersistenceError> {
        self.db
            .connection()
            .query_row(
                "SELECT version, data FROM board_snapshots WHERE slot = ?1",
                params![CURRENT_SLOT],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(|e| PersistenceError::Storage(e.to_string()))
    }

    /// Moves a stored board that could not be decoded into the backups,
    /// untouched, so the next save does not overwrite it.
    fn keep_unreadable(&self, version: i64, json: &str) -> Result<String, PersistenceError> {
        let id = Uuid::new_v4().to_string();
        let conn = self.db.connection();
        conn.execute_batch("BEGIN")
            .map_err(|e| PersistenceError::Storage(e.to_string()))?;
        let moved = conn
            .execute(
                "INSERT INTO board_backups (id, reason, version, data, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![id, UNREADABLE_REASON, version, json, link_utils::now_millis()],
            )
            .and_then(|_| conn.execute("DELETE FROM board_snapshots WHERE slot = ?1", params![CURRENT_SLOT]));
        let finished = match moved {
            Ok(_) => conn.execute_batch("COMMIT"),
            Err(e) => {
                let _ = conn.execute_batch("ROLLBACK");
                Err(e)
            }
        };
        finished.map_err(|e| PersistenceError::Storage(e.to_string()))?;
        Ok(id)
    }

    /// Writes the pending snapshot. On failure it stays pending for a retry.
    fn write_pending(&mut self) -> Result<bool, PersistenceError> {
        let Some(pending) = self.pending.take() else {
            return Ok(false);
        };

        let result = self.db.connection().execute(
            "INSERT OR REPLACE INTO board_snapshots (slot, version, data, saved_at) VALUES (?1, ?2, ?3, ?4)",
            params![CURRENT_SLOT, SCHEMA_VERSION, pending.json, link_utils::now_millis()],
        );

        match result {
            Ok(_) => {
                self.writes += 1;
                debug!(writes = self.writes, "snapshot written");
                Ok(true)
            }
            Err(e) => {
                warn!(error = %e, "snapshot write failed; will retry");
                self.pending = Some(pending);
                Err(PersistenceError::Storage(e.to_string()))
            }
        }
    }

    /// Replaces `model` with `incoming` after backing up the current state.
    fn replace_with_backup(
        &mut self,
        model: &mut LayoutModel,
        incoming: LayoutModel,
        reason: &str,
    ) -> Result<(), PersistenceError> {
        let backup_id = self.backup(model.state(), reason)?;
        *model = incoming;
        info!(backup = %backup_id, reason, "board replaced");
        self.save(&model.serialize())
    }
}

impl PersistenceGatewayTrait for PersistenceGateway {
    /// Schedules a debounced write of `snapshot`.
    fn save(&mut self, snapshot: &Snapshot) -> Result<(), PersistenceError> {
        self.save_at(snapshot, Instant::now())
    }

    /// Writes the pending snapshot if its deadline has passed.
    /// Returns whether a write happened.
    fn poll(&mut self, now: Instant) -> Result<bool, PersistenceError> {
        match &self.pending {
            Some(pending) if now >= pending.due => self.write_pending(),
            _ => Ok(false),
        }
    }

    /// Writes the pending snapshot immediately, if any.
    fn flush(&mut self) -> Result<bool, PersistenceError> {
        self.write_pending()
    }

    /// Loads the stored board, falling back to `default` when there is none
    /// or it cannot be decoded. An undecodable board is kept as a backup.
    fn load(&self, default: LayoutModel) -> LayoutModel {
        let (version, json) = match self.read_current() {
            Ok(Some(row)) => row,
            Ok(None) => return default,
            Err(e) => {
                warn!(error = %e, "stored board unreadable; starting from defaults");
                return default;
            }
        };
        match decode_snapshot(&json) {
            Ok(model) => model,
            Err(e) => {
                match self.keep_unreadable(version, &json) {
                    Ok(backup) => warn!(error = %e, %backup, "stored board unreadable; kept as backup, starting from defaults"),
                    Err(backup_err) => warn!(error = %e, %backup_err, "stored board unreadable and could not be backed up"),
                }
                default
            }
        }
    }

    /// Produces export file bytes: the envelope plus counts, stamps and a checksum.
    fn export(&self, state: &AppState) -> Result<Vec<u8>, PersistenceError> {
        let data = BoardData::from_state(state);
        let file = ExportFile {
            version: SCHEMA_VERSION,
            exported_at: link_utils::now_millis(),
            exported_by: EXPORTED_BY.to_string(),
            checksum: Some(checksum(&data)?),
            metadata: state.stats(),
            data,
        };
        let bytes = serde_json::to_vec_pretty(&file)
            .map_err(|e| PersistenceError::Serialization(e.to_string()))?;
        info!(sections = file.metadata.section_count, links = file.metadata.link_count, "board exported");
        Ok(bytes)
    }

    /// Validates `bytes`, backs up the current board, then replaces it.
    /// On any validation failure the board is left untouched.
    fn import(&mut self, model: &mut LayoutModel, bytes: &[u8]) -> Result<BoardStats, PersistenceError> {
        let incoming = validate_import(bytes)?;
        let stats = incoming.state().stats();
        self.replace_with_backup(model, incoming, "pre-import")?;
        info!(sections = stats.section_count, links = stats.link_count, "board imported");
        Ok(stats)
    }

    /// Stores a copy of `state`. Returns the backup id.
    fn backup(&self, state: &AppState, reason: &str) -> Result<String, PersistenceError> {
        let json = serde_json::to_string(&Snapshot::of(state))
            .map_err(|e| PersistenceError::Serialization(e.to_string()))?;
        let id = Uuid::new_v4().to_string();
        self.db
            .connection()
            .execute(
                "INSERT INTO board_backups (id, reason, version, data, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![id, reason, SCHEMA_VERSION, json, link_utils::now_millis()],
            )
            .map_err(|e| PersistenceError::Storage(e.to_string()))?;
        Ok(id)
    }

    /// Lists backups, newest first.
    fn list_backups(&self) -> Result<Vec<BackupInfo>, PersistenceError> {
        let conn = self.db.connection();
        let mut stmt = conn
            .prepare("SELECT id, reason, created_at FROM board_backups ORDER BY created_at DESC, rowid DESC")
            .map_err(|e| PersistenceError::Storage(e.to_string()))?;

        let rows = stmt
            .query_map([], |row| {
                Ok(BackupInfo {
                    id: row.get(0)?,
                    reason: row.get(1)?,
                    created_at: row.get(2)?,
                })
            })
            .map_err(|e| PersistenceError::Storage(e.to_string()))?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row.map_err(|e| PersistenceError::Storage(e.to_string()))?);
        }
        Ok(results)
    }

    /// Replaces the board with a stored backup, backing up the current one first.
    fn restore_backup(&mut self, model: &mut LayoutModel, backup_id: &str) -> Result<(), PersistenceError> {
        let json: String = self
            .db
            .connection()
            .query_row(
                "SELECT data FROM board_backups WHERE id = ?1",
                params![backup_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| PersistenceError::Storage(e.to_string()))?
            .ok_or_else(|| PersistenceError::Storage(format!("backup not found: {}", backup_id)))?;

        let incoming = decode_snapshot(&json)?;
        self.replace_with_backup(model, incoming, "pre-restore")
    }
}

/// Base64 SHA-256 of the serialized data block.
pub fn checksum(data: &BoardData) -> Result<String, PersistenceError> {
    let bytes = serde_json::to_vec(data).map_err(|e| PersistenceError::Serialization(e.to_string()))?;
    Ok(BASE64.encode(digest::digest(&digest::SHA256, &bytes).as_ref()))
}

fn decode_snapshot(json: &str) -> Result<LayoutModel, PersistenceError> {
    let snapshot: Snapshot =
        serde_json::from_str(json).map_err(|e| PersistenceError::Serialization(e.to_string()))?;
    if snapshot.version > SCHEMA_VERSION {
        return Err(PersistenceError::Validation(format!(
            "snapshot version {} is newer than supported version {}",
            snapshot.version, SCHEMA_VERSION
        )));
    }
    LayoutModel::deserialize(snapshot).map_err(|e| PersistenceError::Validation(e.to_string()))
}

/// Checks an import payload and builds the board it describes.
///
/// Accepts an export file or a bare `{version, data}` envelope; a payload
/// without a `data` block is read as the data block itself. Sections that
/// no column lists are appended to the column holding the fewest sections.
pub fn validate_import(bytes: &[u8]) -> Result<LayoutModel, PersistenceError> {
    let invalid = |msg: String| PersistenceError::Validation(msg);

    let root: Value =
        serde_json::from_slice(bytes).map_err(|e| invalid(format!("not valid JSON: {}", e)))?;
    let top = root
        .as_object()
        .ok_or_else(|| invalid("top level must be an object".to_string()))?;

    if let Some(version) = top.get("version") {
        let version = version
            .as_u64()
            .ok_or_else(|| invalid("version must be a non-negative integer".to_string()))?;
        if version > u64::from(SCHEMA_VERSION) {
            return Err(invalid(format!(
                "version {} is newer than supported version {}",
                version, SCHEMA_VERSION
            )));
        }
    }

    let body = match top.get("data") {
        Some(data) => data
            .as_object()
            .ok_or_else(|| invalid("data must be an object".to_string()))?,
        None => top,
    };
    match body.get("sections") {
        Some(Value::Array(_)) => {}
        Some(_) => return Err(invalid("sections must be an array".to_string())),
        None => return Err(invalid("missing required key: sections".to_string())),
    }
    match body.get("layout") {
        Some(Value::Object(layout)) if layout.get("columns").is_some_and(Value::is_array) => {}
        Some(_) => return Err(invalid("layout must be an object with a columns array".to_string())),
        None => return Err(invalid("missing required key: layout".to_string())),
    }

    let mut data: BoardData = serde_json::from_value(Value::Object(body.clone()))
        .map_err(|e| invalid(format!("malformed board data: {}", e)))?;

    match top.get("checksum") {
        None => {}
        Some(Value::String(expected)) => {
            if &checksum(&data)? != expected {
                return Err(invalid("checksum does not match data".to_string()));
            }
        }
        Some(_) => return Err(invalid("checksum must be a string".to_string())),
    }

    let mut section_ids = std::collections::HashSet::new();
    for section in &data.sections {
        if !section_ids.insert(section.id.clone()) {
            return Err(invalid(format!("duplicate section id {}", section.id)));
        }
    }
    for id in data.layout.section_order() {
        if !section_ids.contains(id) {
            return Err(invalid(format!("layout references unknown section {}", id)));
        }
    }

    let orphans: Vec<_> = data
        .sections
        .iter()
        .filter(|s| data.layout.locate(&s.id).is_none())
        .map(|s| s.id.clone())
        .collect();
    if !orphans.is_empty() {
        let column = data
            .layout
            .columns
            .iter_mut()
            .min_by_key(|c| c.section_ids.len())
            .ok_or_else(|| invalid("layout has no columns for its sections".to_string()))?;
        debug!(count = orphans.len(), column = %column.id, "placing unlisted sections");
        column.section_ids.extend(orphans);
    }

    LayoutModel::from_state(data.into_state()).map_err(|e| invalid(e.to_string()))
}
