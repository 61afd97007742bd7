use geojson::feature::Id;
use geojson::{Feature, FeatureCollection, Geometry, Value};
use serde_json::{Map, Value as JsonValue};

use crate::icons::IconCatalog;
use crate::record::WaypointRecord;

/// Convert waypoints to a GeoJSON FeatureCollection of map markers.
pub fn to_feature_collection(records: &[WaypointRecord], catalog: &IconCatalog) -> FeatureCollection {
    let features = records
        .iter()
        .map(|rec| waypoint_to_feature(rec, catalog))
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

fn waypoint_to_feature(rec: &WaypointRecord, catalog: &IconCatalog) -> Feature {
    let geometry = Geometry::new(Value::Point(vec![rec.longitude, rec.latitude]));

    let mut props = Map::new();
    props.insert("name".to_string(), JsonValue::String(rec.name.clone()));
    props.insert(
        "iconKey".to_string(),
        JsonValue::String(rec.icon_key.clone()),
    );
    if let Some(sym) = catalog.symbol_for(&rec.icon_key) {
        props.insert("sym".to_string(), JsonValue::String(sym.to_string()));
    }
    if !rec.description.is_empty() {
        props.insert(
            "desc".to_string(),
            JsonValue::String(rec.description.clone()),
        );
    }
    let links = rec.normalized_links();
    if !links.is_empty() {
        props.insert(
            "links".to_string(),
            JsonValue::Array(
                links
                    .into_iter()
                    .map(|l| JsonValue::String(l.to_string()))
                    .collect(),
            ),
        );
    }
    if let Some(t) = rec.created_at {
        props.insert(
            "createdAt".to_string(),
            JsonValue::String(t.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)),
        );
    }

    Feature {
        bbox: None,
        geometry: Some(geometry),
        id: rec.filename.clone().map(Id::String),
        properties: Some(props),
        foreign_members: None,
    }
}
