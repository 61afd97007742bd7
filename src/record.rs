use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum number of hyperlinks stored per waypoint.
pub const MAX_LINKS: usize = 3;

/// Name given to waypoints read from documents without a usable `<name>`.
pub const DEFAULT_NAME: &str = "Unnamed";

/// One waypoint, as edited by the user and stored in its own GPX file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaypointRecord {
    /// Backing file name inside the waypoint directory; `None` until first saved.
    #[serde(default)]
    pub filename: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub name: String,
    pub icon_key: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub links: Vec<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl WaypointRecord {
    pub fn new(latitude: f64, longitude: f64, icon_key: impl Into<String>) -> Self {
        Self {
            filename: None,
            latitude,
            longitude,
            name: String::new(),
            icon_key: icon_key.into(),
            description: String::new(),
            links: Vec::new(),
            created_at: None,
        }
    }

    pub fn is_saved(&self) -> bool {
        self.filename.as_deref().is_some_and(|f| !f.is_empty())
    }

    /// True when the record carries a name that may be persisted.
    pub fn has_name(&self) -> bool {
        !self.name.trim().is_empty()
    }

    /// Replace the links, trimming each entry, dropping blanks and keeping at most
    /// [`MAX_LINKS`].
    pub fn set_links<I, S>(&mut self, links: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.links = links
            .into_iter()
            .map(|l| l.as_ref().trim().to_string())
            .filter(|l| !l.is_empty())
            .take(MAX_LINKS)
            .collect();
    }

    /// Links as they will be written: trimmed, non-empty, capped.
    pub fn normalized_links(&self) -> Vec<&str> {
        self.links
            .iter()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .take(MAX_LINKS)
            .collect()
    }

    pub fn set_position(&mut self, latitude: f64, longitude: f64) {
        self.latitude = latitude;
        self.longitude = longitude;
    }
}
