use std::collections::HashMap;

use crate::error::{Result, WaypointError};

/// Garmin symbol names understood by BaseCamp and Garmin devices. For these the
/// internal key and the on-the-wire symbol are the same string.
const GARMIN_SYMBOLS: &[&str] = &[
    "Campground",
    "RV Park",
    "Scenic Area",
    "Museum",
    "Church",
    "Information",
    "Parking Area",
    "Restaurant",
    "Winery",
    "Hotel",
    "Lodge",
    "Funicular",
    "Gas Station",
    "Bar",
    "Library",
    "Theater",
    "Swimming Area",
    "Waypoint",
    "Summit",
    "Geocache",
    "Car",
    "Flag",
    "Truck Stop",
    "Airport",
    "Shopping",
    "School",
    "Cemetery",
    "Park",
    "Picnic Area",
    "Restroom",
    "Telephone",
    "Medical Facility",
    "Pharmacy",
    "Police Station",
    "Fire Department",
    "Bank",
    "Fast Food",
    "Pizza",
    "Stadium",
    "Golf Course",
    "Skiing Area",
    "Dam",
    "Controlled Area",
    "Danger Area",
    "Restricted Area",
    "Null",
    "Ball Park",
    "Car Rental",
    "City (Capitol)",
    "City (Large)",
    "City (Medium)",
    "City (Small)",
    "Civil",
    "Coast Guard",
    "Contact, Afro",
    "Contact, Alien",
    "Contact, Ball Cap",
    "Contact, Big Ears",
    "Contact, Biker",
    "Contact, Bug",
    "Contact, Cat",
    "Contact, Dog",
    "Contact, Dreadlocks",
    "Contact, Female1",
    "Contact, Female2",
    "Contact, Female3",
    "Contact, Goatee",
    "Contact, Kung-Fu",
    "Contact, Pirate",
    "Contact, Ranger",
    "Contact, Smiley",
    "Contact, Spike",
    "Contact, Sumo",
];

/// Closed lookup table between internal icon keys and the `<sym>` strings written
/// into waypoint files.
#[derive(Debug, Clone)]
pub struct IconCatalog {
    entries: Vec<(String, String)>,
    by_key: HashMap<String, usize>,
    by_symbol: HashMap<String, usize>,
    aliases: HashMap<String, usize>,
    default_key: String,
}

impl IconCatalog {
    /// Build a catalog from `(key, symbol)` pairs. Keys and symbols must each be
    /// unique and `default_key` must be one of the keys.
    pub fn new<I, K, S>(entries: I, default_key: &str) -> Result<Self>
    where
        I: IntoIterator<Item = (K, S)>,
        K: Into<String>,
        S: Into<String>,
    {
        let mut catalog = Self {
            entries: Vec::new(),
            by_key: HashMap::new(),
            by_symbol: HashMap::new(),
            aliases: HashMap::new(),
            default_key: default_key.to_string(),
        };

        for (key, symbol) in entries {
            let (key, symbol) = (key.into(), symbol.into());
            let idx = catalog.entries.len();
            if catalog.by_key.insert(key.clone(), idx).is_some() {
                return Err(WaypointError::Validation(format!(
                    "duplicate icon key '{key}'"
                )));
            }
            if catalog.by_symbol.insert(symbol.clone(), idx).is_some() {
                return Err(WaypointError::Validation(format!(
                    "duplicate icon symbol '{symbol}'"
                )));
            }
            catalog.entries.push((key, symbol));
        }

        if !catalog.by_key.contains_key(default_key) {
            return Err(WaypointError::Validation(format!(
                "default icon key '{default_key}' is not in the catalog"
            )));
        }

        Ok(catalog)
    }

    /// The Garmin symbol set, defaulting to `Waypoint`.
    pub fn garmin() -> Self {
        let mut catalog = Self {
            entries: Vec::with_capacity(GARMIN_SYMBOLS.len()),
            by_key: HashMap::with_capacity(GARMIN_SYMBOLS.len()),
            by_symbol: HashMap::with_capacity(GARMIN_SYMBOLS.len()),
            aliases: HashMap::new(),
            default_key: "Waypoint".to_string(),
        };
        for (idx, sym) in GARMIN_SYMBOLS.iter().enumerate() {
            catalog.by_key.insert(sym.to_string(), idx);
            catalog.by_symbol.insert(sym.to_string(), idx);
            catalog.entries.push((sym.to_string(), sym.to_string()));
        }
        // Older files carry the icon file name instead of the symbol.
        catalog.with_alias("Funicular.png", "Funicular")
    }

    /// Accept an extra symbol on read that maps back to `key`. Unknown keys are
    /// ignored.
    pub fn with_alias(mut self, symbol: &str, key: &str) -> Self {
        if let Some(&idx) = self.by_key.get(key) {
            self.aliases.insert(symbol.to_string(), idx);
        }
        self
    }

    pub fn default_key(&self) -> &str {
        &self.default_key
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.by_key.contains_key(key)
    }

    /// Canonical `<sym>` string for an icon key.
    pub fn symbol_for(&self, key: &str) -> Option<&str> {
        self.by_key
            .get(key)
            .map(|&idx| self.entries[idx].1.as_str())
    }

    /// Icon key for a `<sym>` string, including read-only aliases.
    pub fn key_for(&self, symbol: &str) -> Option<&str> {
        self.by_symbol
            .get(symbol)
            .or_else(|| self.aliases.get(symbol))
            .map(|&idx| self.entries[idx].0.as_str())
    }

    /// Like [`key_for`](Self::key_for) but falls back to the default key.
    pub fn resolve_key(&self, symbol: &str) -> &str {
        self.key_for(symbol).unwrap_or(&self.default_key)
    }

    /// Icon keys in catalog order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for IconCatalog {
    fn default() -> Self {
        Self::garmin()
    }
}
