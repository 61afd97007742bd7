//! Editing state for one waypoint: draft, save status and move mode.

use crate::error::{Result, WaypointError};
use crate::icons::IconCatalog;
use crate::record::WaypointRecord;
use crate::store::WaypointStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Created from a map position, never written.
    Unsaved,
    /// Backed by `filename`; `moved` once the position changed after loading.
    Saved { filename: String, moved: bool },
    /// File removed; the session accepts no further operations.
    Deleted,
}

#[derive(Debug, Clone)]
pub struct WaypointEditSession {
    draft: WaypointRecord,
    state: SessionState,
    move_mode: bool,
}

impl WaypointEditSession {
    /// Start a new waypoint at a map position with the catalog's default icon.
    pub fn new_at(latitude: f64, longitude: f64, catalog: &IconCatalog) -> Self {
        Self {
            draft: WaypointRecord::new(latitude, longitude, catalog.default_key()),
            state: SessionState::Unsaved,
            move_mode: false,
        }
    }

    /// Open an existing waypoint file for editing.
    pub fn open(store: &WaypointStore, filename: &str) -> Result<Self> {
        Ok(Self::from_record(store.read(filename)?))
    }

    /// Open the waypoint called `name` inside `filename`; files exported by other
    /// tools may hold several.
    pub fn open_named(store: &WaypointStore, filename: &str, name: &str) -> Result<Self> {
        Ok(Self::from_record(store.read_named(filename, name)?))
    }

    /// Edit a record produced by enumeration. Records without a file name start
    /// unsaved.
    pub fn from_record(record: WaypointRecord) -> Self {
        let state = match record.filename.as_deref() {
            Some(filename) if !filename.is_empty() => SessionState::Saved {
                filename: filename.to_string(),
                moved: false,
            },
            _ => SessionState::Unsaved,
        };
        Self {
            draft: record,
            state,
            move_mode: false,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn draft(&self) -> &WaypointRecord {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> Result<&mut WaypointRecord> {
        self.ensure_live()?;
        Ok(&mut self.draft)
    }

    pub fn is_move_mode(&self) -> bool {
        self.move_mode
    }

    /// Whether a save would pass the name check.
    pub fn can_save(&self) -> bool {
        self.state != SessionState::Deleted && self.draft.has_name()
    }

    pub fn save(&mut self, store: &WaypointStore) -> Result<String> {
        self.ensure_live()?;
        let filename = store.persist(&mut self.draft)?;
        self.mark_saved(filename.clone());
        Ok(filename)
    }

    pub fn start_move(&mut self) -> Result<()> {
        self.ensure_live()?;
        self.move_mode = true;
        Ok(())
    }

    pub fn cancel_move(&mut self) {
        self.move_mode = false;
    }

    /// Relocate the draft to the clicked position and leave move mode. A saved,
    /// named waypoint is written back straight away; a failed write is logged and
    /// the session stays usable. Returns the file written, if any.
    pub fn complete_move(
        &mut self,
        latitude: f64,
        longitude: f64,
        store: &WaypointStore,
    ) -> Result<Option<String>> {
        self.ensure_live()?;
        if !self.move_mode {
            return Err(WaypointError::InvalidState("not in move mode"));
        }
        self.move_mode = false;
        self.draft.set_position(latitude, longitude);

        let SessionState::Saved { moved, .. } = &mut self.state else {
            return Ok(None);
        };
        *moved = true;
        if !self.draft.has_name() {
            return Ok(None);
        }
        Ok(store.persist_silently(&mut self.draft))
    }

    pub fn delete(&mut self, store: &WaypointStore) -> Result<()> {
        let SessionState::Saved { filename, .. } = &self.state else {
            return Err(WaypointError::InvalidState("only saved waypoints can be deleted"));
        };
        store.delete(filename)?;
        self.state = SessionState::Deleted;
        self.move_mode = false;
        Ok(())
    }

    fn mark_saved(&mut self, filename: String) {
        let moved = matches!(self.state, SessionState::Saved { moved: true, .. });
        self.state = SessionState::Saved { filename, moved };
    }

    fn ensure_live(&self) -> Result<()> {
        if self.state == SessionState::Deleted {
            return Err(WaypointError::InvalidState("waypoint was deleted"));
        }
        Ok(())
    }
}
