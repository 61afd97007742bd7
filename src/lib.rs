//! Garmin-compatible GPX waypoint files: one waypoint per file, with name, icon,
//! description and up to three hyperlinks.
//!
//! The parsing, rendering and GeoJSON marker export are available everywhere,
//! including the WebAssembly build; the directory store and edit sessions are
//! native only.

pub mod converter;
pub mod error;
pub mod icons;
pub mod options;
pub mod parser;
pub mod record;
#[cfg(not(target_arch = "wasm32"))]
pub mod session;
#[cfg(not(target_arch = "wasm32"))]
pub mod store;
pub mod writer;

use chrono::{SubsecRound, Utc};
use wasm_bindgen::prelude::*;

pub use crate::error::{ErrorKind, WaypointError};
pub use crate::icons::IconCatalog;
pub use crate::options::{GpxOptions, StoreOptions};
pub use crate::record::{MAX_LINKS, WaypointRecord};
#[cfg(not(target_arch = "wasm32"))]
pub use crate::session::{SessionState, WaypointEditSession};
#[cfg(not(target_arch = "wasm32"))]
pub use crate::store::{Enumeration, ScanWarning, WaypointStore, Waypoints};

/// Parse a GPX document's first waypoint, returned as a JS object.
#[wasm_bindgen(js_name = parseWaypoint)]
pub fn parse_waypoint(gpx_string: &str) -> std::result::Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();

    let record = parser::parse_record(gpx_string, &IconCatalog::garmin())?;
    serde_wasm_bindgen::to_value(&record).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Render a waypoint JS object as a GPX document string. Uses the record's
/// `createdAt` when present, the current time otherwise.
#[wasm_bindgen(js_name = serializeWaypoint)]
pub fn serialize_waypoint(record: JsValue, options: JsValue) -> std::result::Result<String, JsValue> {
    console_error_panic_hook::set_once();

    let record: WaypointRecord =
        serde_wasm_bindgen::from_value(record).map_err(|e| JsValue::from_str(&e.to_string()))?;
    let opts = parse_options(options)?;
    let created_at = record
        .created_at
        .unwrap_or_else(|| Utc::now().trunc_subsecs(0));
    Ok(writer::serialize_record(
        &record,
        &IconCatalog::garmin(),
        &opts,
        created_at,
    )?)
}

/// Convert an array of waypoint JS objects to a GeoJSON FeatureCollection.
#[wasm_bindgen(js_name = waypointsToGeoJson)]
pub fn waypoints_to_geojson(records: JsValue) -> std::result::Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();

    let records: Vec<WaypointRecord> =
        serde_wasm_bindgen::from_value(records).map_err(|e| JsValue::from_str(&e.to_string()))?;
    let fc = converter::to_feature_collection(&records, &IconCatalog::garmin());
    serde_wasm_bindgen::to_value(&fc).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Icon keys available for the icon picker, in catalog order.
#[wasm_bindgen(js_name = iconKeys)]
pub fn icon_keys() -> std::result::Result<JsValue, JsValue> {
    let catalog = IconCatalog::garmin();
    let keys: Vec<&str> = catalog.keys().collect();
    serde_wasm_bindgen::to_value(&keys).map_err(|e| JsValue::from_str(&e.to_string()))
}

fn parse_options(options: JsValue) -> std::result::Result<GpxOptions, JsValue> {
    if options.is_undefined() || options.is_null() {
        Ok(GpxOptions::default())
    } else {
        serde_wasm_bindgen::from_value(options).map_err(|e| JsValue::from_str(&e.to_string()))
    }
}
