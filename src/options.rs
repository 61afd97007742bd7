use serde::Deserialize;

/// Fixed markers written into every generated GPX document.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GpxOptions {
    /// Value of the `creator` attribute on `<gpx>` (default: "Garmin Waypoint Creator")
    #[serde(default = "default_creator")]
    pub creator: String,

    /// Content of `<gpxx:DisplayMode>` (default: "SymbolAndName")
    #[serde(default = "default_display_mode")]
    pub display_mode: String,
}

impl Default for GpxOptions {
    fn default() -> Self {
        Self {
            creator: default_creator(),
            display_mode: default_display_mode(),
        }
    }
}

/// Options for a waypoint directory.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreOptions {
    /// Extension of waypoint files, without the dot (default: "gpx")
    #[serde(default = "default_extension")]
    pub extension: String,

    /// Length of generated file stems (default: 8)
    #[serde(default = "default_filename_length")]
    pub filename_length: usize,

    /// Keep the first creation time when an existing waypoint is saved again
    /// (default: true)
    #[serde(default = "default_true")]
    pub preserve_creation_time: bool,

    #[serde(default)]
    pub gpx: GpxOptions,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            extension: default_extension(),
            filename_length: default_filename_length(),
            preserve_creation_time: true,
            gpx: GpxOptions::default(),
        }
    }
}

impl StoreOptions {
    /// Whether `file_name` carries the waypoint extension (case-insensitive).
    pub fn matches_extension(&self, file_name: &str) -> bool {
        match file_name.rsplit_once('.') {
            Some((stem, ext)) => !stem.is_empty() && ext.eq_ignore_ascii_case(&self.extension),
            None => false,
        }
    }
}

fn default_creator() -> String {
    "Garmin Waypoint Creator".to_string()
}

fn default_display_mode() -> String {
    "SymbolAndName".to_string()
}

fn default_extension() -> String {
    "gpx".to_string()
}

fn default_filename_length() -> usize {
    8
}

fn default_true() -> bool {
    true
}
