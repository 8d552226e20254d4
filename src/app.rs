//! App Core for Linkboard.
//!
//! Holds the single board model together with the drag session and the
//! persistence gateway. Every committed mutation is followed by a debounced
//! save; a failed save is reported but never undoes the in-memory change.

use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::database::connection::Database;
use crate::managers::drag_controller::{DragController, DragControllerTrait};
use crate::managers::layout_model::{LayoutModel, LayoutModelTrait, DEFAULT_COLUMN_COUNT};
use crate::services::persistence_gateway::{
    PersistenceGateway, PersistenceGatewayTrait, DEFAULT_SAVE_DEBOUNCE,
};
use crate::services::seed_import::{self, SeedLink, SeedReport};
use crate::types::board::BoardStats;
use crate::types::drag::{CancelReason, DragItem, DragOutcome, DragView, DropSurface};
use crate::types::errors::{DragError, LayoutError, PersistenceError};
use crate::types::geometry::{Point, Rect};

/// Database file name inside the data directory.
pub const DB_FILE_NAME: &str = "linkboard.db";

/// Runtime configuration, read from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub save_debounce: Duration,
    pub columns: usize,
}

impl AppConfig {
    /// Reads `LINKBOARD_DATA_DIR` and `LINKBOARD_SAVE_DEBOUNCE_MS`, falling
    /// back to the platform data directory and the default debounce.
    pub fn from_env() -> Self {
        let data_dir = match env::var("LINKBOARD_DATA_DIR") {
            Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("linkboard"),
        };
        let save_debounce = env::var("LINKBOARD_SAVE_DEBOUNCE_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_SAVE_DEBOUNCE);

        Self {
            data_dir,
            save_debounce,
            columns: DEFAULT_COLUMN_COUNT,
        }
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILE_NAME)
    }
}

/// Central application struct.
pub struct App {
    pub db: Arc<Database>,
    pub model: LayoutModel,
    pub drag: DragController,
    pub persistence: PersistenceGateway,
    last_persistence_error: Option<PersistenceError>,
}

impl App {
    /// Opens the store under `config.data_dir` and loads the saved board.
    pub fn new(config: &AppConfig) -> Result<Self, Box<dyn std::error::Error>> {
        std::fs::create_dir_all(&config.data_dir)?;
        let db = Arc::new(Database::open(config.db_path())?);
        Ok(Self::with_database(db, config.save_debounce, config.columns))
    }

    /// An app backed by an in-memory store, with saves written on the next poll.
    pub fn open_in_memory() -> Result<Self, rusqlite::Error> {
        let db = Arc::new(Database::open_in_memory()?);
        Ok(Self::with_database(db, Duration::ZERO, DEFAULT_COLUMN_COUNT))
    }

    pub fn with_database(db: Arc<Database>, save_debounce: Duration, columns: usize) -> Self {
        let persistence = PersistenceGateway::new(db.clone(), save_debounce);
        let model = persistence.load(LayoutModel::new(columns));
        Self {
            db,
            model,
            drag: DragController::new(),
            persistence,
            last_persistence_error: None,
        }
    }

    /// The most recent save failure, cleared by the next successful write.
    pub fn persistence_error(&self) -> Option<&PersistenceError> {
        self.last_persistence_error.as_ref()
    }

    /// Runs one board mutation and schedules a save if it succeeded.
    pub fn mutate<T>(
        &mut self,
        f: impl FnOnce(&mut LayoutModel) -> Result<T, LayoutError>,
    ) -> Result<T, LayoutError> {
        let out = f(&mut self.model)?;
        self.persist();
        Ok(out)
    }

    /// Schedules a debounced save of the current board.
    pub fn persist(&mut self) {
        if let Err(e) = self.persistence.save(&self.model.serialize()) {
            warn!(error = %e, "could not schedule save");
            self.last_persistence_error = Some(e);
        }
    }

    /// Writes a due save, if any. Call this from the event loop.
    pub fn tick(&mut self) -> Result<bool, PersistenceError> {
        let result = self.persistence.poll(Instant::now());
        self.record(result)
    }

    /// Writes any pending save immediately.
    pub fn flush(&mut self) -> Result<bool, PersistenceError> {
        let result = self.persistence.flush();
        self.record(result)
    }

    fn record(&mut self, result: Result<bool, PersistenceError>) -> Result<bool, PersistenceError> {
        match &result {
            Ok(true) => self.last_persistence_error = None,
            Ok(false) => {}
            Err(e) => self.last_persistence_error = Some(e.clone()),
        }
        result
    }

    /// Starts a drag. Returns `false` when a drag is already in progress;
    /// that pointer-down is dropped without an error.
    pub fn pointer_down(&mut self, item: DragItem, pointer: Point, item_bounds: Rect) -> Result<bool, DragError> {
        match self.drag.pointer_down(&self.model, item, pointer, item_bounds) {
            Ok(()) => Ok(true),
            Err(DragError::ConcurrentDrag) => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub fn pointer_move(&mut self, pointer: Point, surface: &DropSurface) -> Option<DragView> {
        self.drag.pointer_move(pointer, surface).cloned()
    }

    /// Ends the drag; a committed move is saved.
    pub fn pointer_up(&mut self) -> Result<DragOutcome, DragError> {
        let outcome = self.drag.pointer_up(&mut self.model)?;
        if matches!(outcome, DragOutcome::Committed { .. }) {
            self.persist();
        }
        Ok(outcome)
    }

    pub fn cancel_drag(&mut self, reason: CancelReason) -> bool {
        self.drag.cancel(reason)
    }

    pub fn export(&self) -> Result<Vec<u8>, PersistenceError> {
        self.persistence.export(self.model.state())
    }

    /// Replaces the board with an imported one. The drag session, if any,
    /// is cancelled first since its ids may no longer exist.
    pub fn import(&mut self, bytes: &[u8]) -> Result<BoardStats, PersistenceError> {
        if self.drag.cancel(CancelReason::CaptureLost) {
            debug!("drag cancelled by import");
        }
        self.persistence.import(&mut self.model, bytes)
    }

    pub fn restore_backup(&mut self, backup_id: &str) -> Result<(), PersistenceError> {
        self.drag.cancel(CancelReason::CaptureLost);
        self.persistence.restore_backup(&mut self.model, backup_id)
    }

    pub fn seed(&mut self, records: Vec<SeedLink>) -> SeedReport {
        let report = seed_import::seed_model(&mut self.model, records);
        if report.added > 0 || report.sections_created > 0 {
            self.persist();
        }
        report
    }

    /// Flushes pending writes before exit.
    pub fn shutdown(&mut self) {
        self.drag.cancel(CancelReason::CaptureLost);
        if let Err(e) = self.flush() {
            warn!(error = %e, "final save failed");
        }
    }
}
