#![cfg(not(target_arch = "wasm32"))]

use std::fs;
use std::path::Path;

use garmin_waypoint_store::parser::{parse_record, parse_records};
use garmin_waypoint_store::writer::serialize_record;
use garmin_waypoint_store::{
    ErrorKind, GpxOptions, IconCatalog, SessionState, WaypointEditSession, WaypointError,
    WaypointRecord, WaypointStore,
};

fn load_fixture(path: &str) -> String {
    std::fs::read_to_string(format!("tests/fixtures/{path}")).unwrap()
}

fn parse(path: &str) -> WaypointRecord {
    parse_record(&load_fixture(path), &IconCatalog::garmin()).unwrap()
}

fn lighthouse() -> WaypointRecord {
    let mut rec = WaypointRecord::new(42.343780, -3.696096, "Scenic Area");
    rec.name = "Lighthouse".into();
    rec.description = "Nice view".into();
    rec.set_links(["https://example.com"]);
    rec
}

fn copy_fixture(path: &str, dir: &Path, as_name: &str) {
    fs::copy(format!("tests/fixtures/{path}"), dir.join(as_name)).unwrap();
}

// ---- parsing fixtures ----

#[test]
fn test_01_own_output() {
    let rec = parse("waypoints/cathedral.gpx");
    assert_eq!(rec.name, "Burgos Cathedral");
    assert!((rec.latitude - 42.340833).abs() < 1e-9);
    assert!((rec.longitude + 3.704167).abs() < 1e-9);
    assert_eq!(rec.icon_key, "Church");
    assert_eq!(
        rec.description,
        "Gothic cathedral, UNESCO World Heritage Site.\nOpen daily."
    );
    assert_eq!(
        rec.links,
        vec![
            "https://catedraldeburgos.es",
            "https://en.wikipedia.org/wiki/Burgos_Cathedral"
        ]
    );
    assert_eq!(
        rec.created_at.unwrap().to_rfc3339(),
        "2025-08-03T14:02:11+00:00"
    );
}

#[test]
fn test_02_legacy_pretty_printed_file() {
    let rec = parse("waypoints/legacy_pretty.gpx");
    assert_eq!(rec.name, "Funicular Station");
    assert_eq!(rec.icon_key, "Funicular");
    assert_eq!(rec.description, "");
    assert!(rec.links.is_empty());
    let created = rec.created_at.unwrap();
    assert_eq!(created.timestamp_subsec_micros(), 512907);
}

#[test]
fn test_03_multi_waypoint_export() {
    let recs = parse_records(
        &load_fixture("waypoints/basecamp_export.gpx"),
        &IconCatalog::garmin(),
    )
    .unwrap();
    assert_eq!(recs.len(), 2);
    assert_eq!(recs[0].name, "Guggenheim");
    assert_eq!(recs[0].icon_key, "Museum");
    assert_eq!(recs[1].description, "Best in the old town");
    assert_eq!(recs[1].icon_key, "Fast Food");
    assert!(recs[1].created_at.is_none());
}

#[test]
fn test_04_unknown_symbol_falls_back_to_default_icon() {
    let rec = parse("waypoints/unknown_symbol.gpx");
    assert_eq!(rec.name, "Opera House");
    assert_eq!(rec.icon_key, IconCatalog::garmin().default_key());
}

#[test]
fn test_05_truncated_file() {
    let err = parse_record(&load_fixture("broken/truncated.gpx"), &IconCatalog::garmin())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Parse);
}

#[test]
fn test_06_bad_latitude() {
    let err = parse_record(&load_fixture("broken/bad_latitude.gpx"), &IconCatalog::garmin())
        .unwrap_err();
    assert!(matches!(
        err,
        WaypointError::InvalidAttribute { attribute: "lat", .. }
    ));
}

// ---- round trips ----

#[test]
fn test_round_trip_preserves_fields() {
    let catalog = IconCatalog::garmin();
    let created = chrono::DateTime::parse_from_rfc3339("2025-08-17T10:30:00Z")
        .unwrap()
        .with_timezone(&chrono::Utc);

    let mut records = vec![lighthouse()];

    let mut south = WaypointRecord::new(-54.807222, -68.304444, "City (Small)");
    south.name = "Ushuaia".into();
    south.description = "Fin del mundo\n\nsecond paragraph".into();
    records.push(south);

    let mut links_only = WaypointRecord::new(89.999999, 179.999999, "Contact, Kung-Fu");
    links_only.name = "Dojo".into();
    links_only.set_links(["https://a.example", "https://b.example", "https://c.example"]);
    records.push(links_only);

    for rec in records {
        let xml = serialize_record(&rec, &catalog, &GpxOptions::default(), created).unwrap();
        let back = parse_record(&xml, &catalog).unwrap();
        assert_eq!(back.name, rec.name);
        assert!((back.latitude - rec.latitude).abs() < 1e-6);
        assert!((back.longitude - rec.longitude).abs() < 1e-6);
        assert_eq!(back.icon_key, rec.icon_key);
        assert_eq!(back.description, rec.description);
        assert_eq!(back.links, rec.links);
        assert_eq!(back.created_at, Some(created));
    }
}

#[test]
fn test_five_links_keep_first_three() {
    let catalog = IconCatalog::garmin();
    let mut rec = lighthouse();
    rec.links = (1..=5).map(|i| format!("https://{i}.example")).collect();

    let xml = serialize_record(&rec, &catalog, &GpxOptions::default(), chrono::Utc::now())
        .unwrap();
    assert_eq!(xml.matches("<link ").count(), 3);

    let back = parse_record(&xml, &catalog).unwrap();
    assert_eq!(
        back.links,
        vec!["https://1.example", "https://2.example", "https://3.example"]
    );
}

// ---- store scenarios ----

#[test]
fn test_persist_new_lighthouse() {
    let dir = tempfile::tempdir().unwrap();
    let store = WaypointStore::new(dir.path());
    let mut rec = lighthouse();

    let filename = store.persist(&mut rec).unwrap();
    let (stem, ext) = filename.split_once('.').unwrap();
    assert_eq!(stem.len(), 8);
    assert!(stem.chars().all(|c| c.is_ascii_alphanumeric()));
    assert_eq!(ext, "gpx");
    assert!(dir.path().join(&filename).is_file());

    let xml = fs::read_to_string(dir.path().join(&filename)).unwrap();
    let back = parse_record(&xml, store.catalog()).unwrap();
    assert_eq!(back.name, "Lighthouse");
    assert!((back.latitude - 42.343780).abs() < 1e-6);
    assert!((back.longitude + 3.696096).abs() < 1e-6);
    assert_eq!(back.icon_key, "Scenic Area");
    assert_eq!(back.description, "Nice view");
    assert_eq!(back.links, vec!["https://example.com"]);
}

#[test]
fn test_persist_blank_name_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let store = WaypointStore::new(dir.path());
    let mut rec = lighthouse();
    rec.name = " \n\t ".into();

    let err = store.persist(&mut rec).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(rec.filename.is_none());
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_move_overwrites_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let store = WaypointStore::new(dir.path());
    let mut rec = lighthouse();
    let filename = store.persist(&mut rec).unwrap();

    rec.set_position(43.0, -4.0);
    assert_eq!(store.persist_silently(&mut rec).as_deref(), Some(filename.as_str()));

    let loaded = store.load_all().unwrap();
    assert_eq!(loaded.records.len(), 1);
    assert_eq!(loaded.records[0].latitude, 43.0);
    assert_eq!(loaded.records[0].filename.as_deref(), Some(filename.as_str()));
}

#[test]
fn test_delete_missing_file_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let store = WaypointStore::new(dir.path());
    let err = store.delete("ZZZZZZZZ.gpx").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn test_delete_removes_file() {
    let dir = tempfile::tempdir().unwrap();
    let store = WaypointStore::new(dir.path());
    let mut rec = lighthouse();
    let filename = store.persist(&mut rec).unwrap();

    store.delete(&filename).unwrap();
    assert!(!dir.path().join(&filename).exists());
    assert_eq!(
        store.delete(&filename).unwrap_err().kind(),
        ErrorKind::NotFound
    );
}

#[test]
fn test_enumerate_skips_corrupt_file_with_warning() {
    let dir = tempfile::tempdir().unwrap();
    copy_fixture("waypoints/cathedral.gpx", dir.path(), "good.gpx");
    copy_fixture("broken/truncated.gpx", dir.path(), "bad.gpx");
    let store = WaypointStore::new(dir.path());

    let found = store.load_all().unwrap();
    assert_eq!(found.records.len(), 1);
    assert_eq!(found.records[0].name, "Burgos Cathedral");
    assert_eq!(found.records[0].filename.as_deref(), Some("good.gpx"));
    assert_eq!(found.warnings.len(), 1);
    assert!(found.warnings[0].path.ends_with("bad.gpx"));
    assert_eq!(found.warnings[0].error.kind(), ErrorKind::Parse);
}

#[test]
fn test_enumerate_is_lazy_and_restartable() {
    let dir = tempfile::tempdir().unwrap();
    copy_fixture("waypoints/cathedral.gpx", dir.path(), "a.gpx");
    let store = WaypointStore::new(dir.path());

    let mut first = store.enumerate().unwrap();
    assert!(first.next().unwrap().is_ok());
    assert!(first.next().is_none());

    copy_fixture("waypoints/basecamp_export.gpx", dir.path(), "b.gpx");
    let names: Vec<String> = store
        .enumerate()
        .unwrap()
        .map(|item| item.unwrap().name)
        .collect();
    assert_eq!(names, vec!["Burgos Cathedral", "Guggenheim", "Pintxos"]);
}

#[test]
fn test_enumerate_fixture_directory() {
    let store = WaypointStore::new("tests/fixtures/waypoints");
    let found = store.load_all().unwrap();
    assert_eq!(found.records.len(), 5);
    assert!(found.warnings.is_empty());
    assert!(found.records.iter().all(|r| r.filename.is_some()));
}

#[test]
fn test_edit_existing_file_keeps_creation_time() {
    let dir = tempfile::tempdir().unwrap();
    copy_fixture("waypoints/cathedral.gpx", dir.path(), "cathedral.gpx");
    let store = WaypointStore::new(dir.path());

    let mut rec = store.read("cathedral.gpx").unwrap();
    rec.description = "Closed on Mondays".into();
    store.persist(&mut rec).unwrap();

    let back = store.read("cathedral.gpx").unwrap();
    assert_eq!(back.description, "Closed on Mondays");
    assert_eq!(
        back.created_at.unwrap().to_rfc3339(),
        "2025-08-03T14:02:11+00:00"
    );
    assert_eq!(back.links.len(), 2);
}

#[test]
fn test_select_second_waypoint_of_export() {
    let dir = tempfile::tempdir().unwrap();
    copy_fixture("waypoints/basecamp_export.gpx", dir.path(), "bilbao.gpx");
    let store = WaypointStore::new(dir.path());

    let markers = store.load_all().unwrap().records;
    assert_eq!(markers.len(), 2);
    let clicked = markers[1].clone();
    assert_eq!(clicked.name, "Pintxos");

    let by_name = WaypointEditSession::open_named(&store, "bilbao.gpx", &clicked.name).unwrap();
    assert_eq!(by_name.draft().name, "Pintxos");
    assert_eq!(by_name.draft().description, "Best in the old town");
    assert_eq!(by_name.draft().icon_key, "Fast Food");

    let from_marker = WaypointEditSession::from_record(clicked);
    assert_eq!(from_marker.draft().name, "Pintxos");
    assert_eq!(
        from_marker.state(),
        &SessionState::Saved {
            filename: "bilbao.gpx".to_string(),
            moved: false
        }
    );
}

#[test]
fn test_delete_directory_named_like_waypoint() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("folder.gpx")).unwrap();
    let store = WaypointStore::new(dir.path());
    let err = store.delete("folder.gpx").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
    assert!(matches!(err, WaypointError::Io(_)));
}

#[test]
fn test_persist_write_failure_reaches_caller() {
    let dir = tempfile::tempdir().unwrap();
    let store = WaypointStore::new(dir.path().join("unplugged"));
    let mut rec = lighthouse();
    let err = store.persist(&mut rec).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
    assert!(rec.filename.is_none());
}
