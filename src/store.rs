//! Directory-backed waypoint storage: one GPX file per waypoint.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{SubsecRound, Utc};
use rand::Rng;
use rand::distr::Alphanumeric;
use tempfile::NamedTempFile;

use crate::error::{Result, WaypointError};
use crate::icons::IconCatalog;
use crate::options::StoreOptions;
use crate::parser::parse_records;
use crate::record::WaypointRecord;
use crate::writer::{serialize_record, validate};

const MAX_NAME_ATTEMPTS: usize = 16;

/// A waypoint file that could not be loaded during enumeration.
#[derive(Debug)]
pub struct ScanWarning {
    pub path: PathBuf,
    pub error: WaypointError,
}

impl std::fmt::Display for ScanWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "skipped {}: {}", self.path.display(), self.error)
    }
}

/// Everything found by one enumeration pass.
#[derive(Debug, Default)]
pub struct Enumeration {
    pub records: Vec<WaypointRecord>,
    pub warnings: Vec<ScanWarning>,
}

#[derive(Debug)]
pub struct WaypointStore {
    dir: PathBuf,
    catalog: IconCatalog,
    options: StoreOptions,
}

impl WaypointStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            catalog: IconCatalog::garmin(),
            options: StoreOptions::default(),
        }
    }

    pub fn with_catalog(mut self, catalog: IconCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_options(mut self, options: StoreOptions) -> Self {
        self.options = options;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn catalog(&self) -> &IconCatalog {
        &self.catalog
    }

    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    /// Snapshot the directory listing and return a lazy iterator over its
    /// waypoints. Files are parsed as the iterator advances; a file that fails to
    /// load yields one `Err(ScanWarning)` and iteration continues.
    /// Symlinks are followed; an entry that cannot be inspected is reported as a
    /// warning in listing order.
    pub fn enumerate(&self) -> Result<Waypoints<'_>> {
        let mut files: Vec<(PathBuf, Option<WaypointError>)> = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    files.push((self.dir.clone(), Some(WaypointError::Io(e))));
                    continue;
                }
            };
            let matches = entry
                .file_name()
                .to_str()
                .is_some_and(|name| self.options.matches_extension(name));
            if !matches {
                continue;
            }
            let path = entry.path();
            match fs::metadata(&path) {
                Ok(meta) if meta.is_file() => files.push((path, None)),
                Ok(_) => {}
                Err(e) => files.push((path, Some(WaypointError::Io(e)))),
            }
        }
        files.sort_by(|a, b| a.0.cmp(&b.0));

        Ok(Waypoints {
            store: self,
            files: files.into_iter(),
            pending: Vec::new().into_iter(),
        })
    }

    /// Run a full enumeration, splitting records from warnings.
    pub fn load_all(&self) -> Result<Enumeration> {
        let mut out = Enumeration::default();
        for item in self.enumerate()? {
            match item {
                Ok(record) => out.records.push(record),
                Err(warning) => out.warnings.push(warning),
            }
        }
        Ok(out)
    }

    /// Load the first waypoint of one file.
    pub fn read(&self, filename: &str) -> Result<WaypointRecord> {
        let path = self.path_for(filename)?;
        let mut records = self.load_file(&path)?;
        if records.is_empty() {
            return Err(WaypointError::MissingElement("wpt"));
        }
        Ok(records.swap_remove(0))
    }

    /// Load the waypoint called `name` from a file that may hold several.
    pub fn read_named(&self, filename: &str, name: &str) -> Result<WaypointRecord> {
        let path = self.path_for(filename)?;
        let name = name.trim();
        self.load_file(&path)?
            .into_iter()
            .find(|rec| rec.name == name)
            .ok_or(WaypointError::MissingElement("wpt"))
    }

    /// Write `record` to its file, creating a new file name for unsaved records.
    /// On success the record carries its file name and creation time.
    pub fn persist(&self, record: &mut WaypointRecord) -> Result<String> {
        validate(record)?;

        let filename = match record.filename.as_deref() {
            Some(name) if !name.is_empty() => {
                self.path_for(name)?;
                name.to_string()
            }
            _ => self.generate_filename()?,
        };

        let created_at = match record.created_at {
            Some(t) if self.options.preserve_creation_time => t,
            _ => Utc::now().trunc_subsecs(0),
        };

        let xml = serialize_record(record, &self.catalog, &self.options.gpx, created_at)?;
        let path = self.dir.join(&filename);
        self.write_replacing(&path, xml.as_bytes())?;

        tracing::debug!(file = %path.display(), "waypoint saved");
        record.filename = Some(filename.clone());
        record.created_at = Some(created_at);
        Ok(filename)
    }

    /// Best-effort persist used while moving a waypoint: failures are logged and
    /// reported as `None`.
    pub fn persist_silently(&self, record: &mut WaypointRecord) -> Option<String> {
        match self.persist(record) {
            Ok(filename) => Some(filename),
            Err(e) => {
                tracing::warn!(
                    file = record.filename.as_deref().unwrap_or("<new>"),
                    error = %e,
                    "auto-save failed"
                );
                None
            }
        }
    }

    /// Remove a waypoint file.
    pub fn delete(&self, filename: &str) -> Result<()> {
        let path = self.path_for(filename)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                tracing::debug!(file = %path.display(), "waypoint deleted");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(WaypointError::NotFound(path))
            }
            Err(e) => Err(WaypointError::Io(e)),
        }
    }

    /// Write into a temporary file next to `path`, then rename it over `path`, so
    /// readers see either the old document or the new one.
    fn write_replacing(&self, path: &Path, contents: &[u8]) -> Result<()> {
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        if let Some(meta) = fs::metadata(path).ok().filter(|meta| meta.is_file()) {
            tmp.as_file().set_permissions(meta.permissions())?;
        }
        tmp.write_all(contents)?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| WaypointError::Io(e.error))?;
        Ok(())
    }

    fn load_file(&self, path: &Path) -> Result<Vec<WaypointRecord>> {
        let bytes = fs::read(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => WaypointError::NotFound(path.to_path_buf()),
            _ => WaypointError::Io(e),
        })?;
        let xml = std::str::from_utf8(&bytes)?;
        let mut records = parse_records(xml, &self.catalog)?;

        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string);
        for record in &mut records {
            record.filename = filename.clone();
        }
        Ok(records)
    }

    /// Join a bare file name onto the store directory.
    fn path_for(&self, filename: &str) -> Result<PathBuf> {
        let is_plain = !filename.is_empty()
            && Path::new(filename).file_name().and_then(|n| n.to_str()) == Some(filename);
        if !is_plain {
            return Err(WaypointError::Validation(format!(
                "'{filename}' is not a plain file name"
            )));
        }
        Ok(self.dir.join(filename))
    }

    fn generate_filename(&self) -> Result<String> {
        let mut rng = rand::rng();
        for _ in 0..MAX_NAME_ATTEMPTS {
            let stem: String = (&mut rng)
                .sample_iter(&Alphanumeric)
                .take(self.options.filename_length)
                .map(char::from)
                .collect();
            let filename = format!("{stem}.{}", self.options.extension);
            if !self.dir.join(&filename).exists() {
                return Ok(filename);
            }
        }
        Err(WaypointError::Io(std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            "could not find a free waypoint file name",
        )))
    }
}

/// Lazy enumeration over a directory snapshot. Restart by calling
/// [`WaypointStore::enumerate`] again.
#[derive(Debug)]
pub struct Waypoints<'a> {
    store: &'a WaypointStore,
    files: std::vec::IntoIter<(PathBuf, Option<WaypointError>)>,
    pending: std::vec::IntoIter<WaypointRecord>,
}

impl Iterator for Waypoints<'_> {
    type Item = std::result::Result<WaypointRecord, ScanWarning>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(record) = self.pending.next() {
                return Some(Ok(record));
            }
            let (path, listing_error) = self.files.next()?;
            let loaded = match listing_error {
                Some(error) => Err(error),
                None => self.store.load_file(&path),
            };
            match loaded {
                Ok(records) => self.pending = records.into_iter(),
                Err(error) => {
                    let warning = ScanWarning { path, error };
                    tracing::warn!("{warning}");
                    return Some(Err(warning));
                }
            }
        }
    }
}
