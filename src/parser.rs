use chrono::{DateTime, Utc};
use quick_xml::Reader;
use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};

use crate::error::{Result, WaypointError};
use crate::icons::IconCatalog;
use crate::record::{DEFAULT_NAME, MAX_LINKS, WaypointRecord};

/// Parse the first waypoint of a GPX document.
pub fn parse_record(xml: &str, catalog: &IconCatalog) -> Result<WaypointRecord> {
    parse_records(xml, catalog)?
        .into_iter()
        .next()
        .ok_or(WaypointError::MissingElement("wpt"))
}

/// Parse every `<wpt>` of a GPX document. A single malformed waypoint fails the
/// whole document.
pub fn parse_records(xml: &str, catalog: &IconCatalog) -> Result<Vec<WaypointRecord>> {
    let mut reader = Reader::from_str(xml);
    let mut records = Vec::new();
    let mut in_root = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"gpx" if !in_root => in_root = true,
                _ if !in_root => return Err(WaypointError::MissingElement("gpx")),
                b"wpt" => records.push(parse_waypoint(&e, &mut reader, catalog)?),
                _ => {
                    // rte, trk, metadata and friends
                    reader
                        .read_to_end(e.name())
                        .map_err(WaypointError::XmlParse)?;
                }
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"gpx" if !in_root => return Ok(records),
                _ if !in_root => return Err(WaypointError::MissingElement("gpx")),
                b"wpt" => {
                    let (lat, lon) = parse_lat_lon(&e)?;
                    records.push(build_record(lat, lon, WaypointParts::default(), catalog));
                }
                _ => {}
            },
            Ok(Event::End(e)) if e.local_name().as_ref() == b"gpx" => return Ok(records),
            Ok(Event::Eof) if in_root => return Err(WaypointError::UnexpectedEof("gpx")),
            Ok(Event::Eof) => return Err(WaypointError::MissingElement("gpx")),
            Err(e) => return Err(WaypointError::XmlParse(e)),
            _ => {}
        }
    }
}

/// Remove the heading and link paragraphs that the writer generates around the
/// user's description, leaving the prose.
pub fn strip_generated_html(raw: &str) -> String {
    let without_heading = remove_spans(raw, "<h2>", None, "</h2>");
    let without_links = remove_spans(&without_heading, "<p><a", Some(">"), "</a></p>");
    without_links.trim().to_string()
}

/// Remove every `open ... close` span. With `open_end`, the opening tag runs on to
/// the first `open_end` after `open`.
fn remove_spans(text: &str, open: &str, open_end: Option<&str>, close: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find(open) {
        let after_open = &rest[start + open.len()..];
        let body_start = match open_end {
            Some(end) => match after_open.find(end) {
                Some(i) => i + end.len(),
                None => break,
            },
            None => 0,
        };
        let body = &after_open[body_start..];
        match body.find(close) {
            Some(end) => {
                out.push_str(&rest[..start]);
                rest = &body[end + close.len()..];
            }
            None => break,
        }
    }

    out.push_str(rest);
    out
}

#[derive(Debug, Default)]
struct WaypointParts {
    name: Option<String>,
    desc: Option<String>,
    sym: Option<String>,
    links: Vec<String>,
    created_at: Option<DateTime<Utc>>,
}

impl WaypointParts {
    fn push_link(&mut self, href: String) {
        let href = href.trim();
        if !href.is_empty() && self.links.len() < MAX_LINKS {
            self.links.push(href.to_string());
        }
    }
}

fn build_record(lat: f64, lon: f64, parts: WaypointParts, catalog: &IconCatalog) -> WaypointRecord {
    let name = parts
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| DEFAULT_NAME.to_string());

    let icon_key = match parts.sym.as_deref().map(str::trim) {
        Some(sym) => catalog.key_for(sym).unwrap_or_else(|| {
            tracing::debug!(symbol = sym, "unknown waypoint symbol, using default icon");
            catalog.default_key()
        }),
        None => catalog.default_key(),
    };

    WaypointRecord {
        filename: None,
        latitude: lat,
        longitude: lon,
        name,
        icon_key: icon_key.to_string(),
        description: parts
            .desc
            .as_deref()
            .map(strip_generated_html)
            .unwrap_or_default(),
        links: parts.links,
        created_at: parts.created_at,
    }
}

/// Parse lat/lon attributes from a `<wpt>` start tag.
fn parse_lat_lon(e: &BytesStart<'_>) -> Result<(f64, f64)> {
    let mut lat: Option<f64> = None;
    let mut lon: Option<f64> = None;

    for attr_result in e.attributes() {
        let attr = attr_result.map_err(|e| WaypointError::XmlParse(e.into()))?;
        let key = attr.key.local_name();
        let val = std::str::from_utf8(&attr.value).unwrap_or_default();
        match key.as_ref() {
            b"lat" => lat = Some(parse_coordinate(val, "lat")?),
            b"lon" => lon = Some(parse_coordinate(val, "lon")?),
            _ => {}
        }
    }

    let lat = lat.ok_or(WaypointError::MissingAttribute {
        element: "wpt",
        attribute: "lat",
    })?;
    let lon = lon.ok_or(WaypointError::MissingAttribute {
        element: "wpt",
        attribute: "lon",
    })?;

    Ok((lat, lon))
}

fn parse_coordinate(val: &str, attribute: &'static str) -> Result<f64> {
    val.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| WaypointError::InvalidAttribute {
            element: "wpt",
            attribute,
            value: val.to_string(),
        })
}

/// `href` of a `<link>` element; empty when absent.
fn link_href(start: &BytesStart<'_>) -> String {
    for attr in start.attributes().flatten() {
        if attr.key.local_name().as_ref() == b"href" {
            let raw = std::str::from_utf8(&attr.value).unwrap_or_default();
            return unescape(raw)
                .map(|v| v.into_owned())
                .unwrap_or_else(|_| raw.to_string());
        }
    }
    String::new()
}

/// Scan an `<extensions>` block for the Garmin creation time.
fn parse_extensions<'a>(
    start: &BytesStart<'a>,
    reader: &mut Reader<&'a [u8]>,
) -> Result<Option<DateTime<Utc>>> {
    let end_name = start.name().0.to_vec();
    let mut created_at = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"CreationTime" => {
                let text = read_text_owned(reader, &e)?;
                created_at = parse_creation_time(&text);
            }
            Ok(Event::End(e)) if e.name().0 == end_name.as_slice() => break,
            Ok(Event::Eof) => return Err(WaypointError::UnexpectedEof("extensions")),
            Err(e) => return Err(WaypointError::XmlParse(e)),
            _ => {}
        }
    }

    Ok(created_at)
}

fn parse_creation_time(text: &str) -> Option<DateTime<Utc>> {
    match DateTime::parse_from_rfc3339(text.trim()) {
        Ok(t) => Some(t.with_timezone(&Utc)),
        Err(e) => {
            tracing::debug!(value = text, error = %e, "ignoring unparseable creation time");
            None
        }
    }
}

/// Parse a `<wpt>` element and its children.
/// Called after receiving Event::Start for the waypoint.
fn parse_waypoint<'a>(
    start: &BytesStart<'a>,
    reader: &mut Reader<&'a [u8]>,
    catalog: &IconCatalog,
) -> Result<WaypointRecord> {
    let (lat, lon) = parse_lat_lon(start)?;
    let mut parts = WaypointParts::default();
    let end_name = start.name().0.to_vec();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"name" => parts.name = Some(read_text_owned(reader, &e)?),
                b"desc" => parts.desc = Some(read_text_owned(reader, &e)?),
                b"sym" => parts.sym = Some(read_text_owned(reader, &e)?),
                b"link" => {
                    let href = link_href(&e);
                    reader
                        .read_to_end(e.name())
                        .map_err(WaypointError::XmlParse)?;
                    parts.push_link(href);
                }
                b"extensions" => {
                    if let Some(t) = parse_extensions(&e, reader)? {
                        parts.created_at = Some(t);
                    }
                }
                _ => {
                    reader
                        .read_to_end(e.name())
                        .map_err(WaypointError::XmlParse)?;
                }
            },
            Ok(Event::Empty(e)) if e.local_name().as_ref() == b"link" => {
                parts.push_link(link_href(&e));
            }
            Ok(Event::End(e)) if e.name().0 == end_name.as_slice() => break,
            Ok(Event::Eof) => return Err(WaypointError::UnexpectedEof("wpt")),
            Err(e) => return Err(WaypointError::XmlParse(e)),
            _ => {}
        }
    }

    Ok(build_record(lat, lon, parts, catalog))
}

/// Read text content of an element as an owned String.
/// Handles regular text, CDATA sections, and entity references (Event::GeneralRef).
fn read_text_owned<'a>(reader: &mut Reader<&'a [u8]>, start: &BytesStart<'_>) -> Result<String> {
    let end_name = start.name().0.to_vec();
    let mut text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Text(e)) => {
                let raw = std::str::from_utf8(e.as_ref()).unwrap_or_default();
                text.push_str(raw);
            }
            Ok(Event::CData(e)) => {
                let s = std::str::from_utf8(e.as_ref()).unwrap_or_default();
                text.push_str(s);
            }
            Ok(Event::GeneralRef(e)) => {
                if let Ok(Some(ch)) = e.resolve_char_ref() {
                    text.push(ch);
                } else {
                    let name = std::str::from_utf8(e.as_ref()).unwrap_or_default();
                    match name {
                        "amp" => text.push('&'),
                        "lt" => text.push('<'),
                        "gt" => text.push('>'),
                        "quot" => text.push('"'),
                        "apos" => text.push('\''),
                        _ => {}
                    }
                }
            }
            Ok(Event::End(e)) if e.name().0 == end_name.as_slice() => break,
            Ok(Event::Eof) => return Err(WaypointError::UnexpectedEof("text")),
            Err(e) => return Err(WaypointError::XmlParse(e)),
            _ => {}
        }
    }

    Ok(text)
}
