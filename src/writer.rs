use chrono::{DateTime, SecondsFormat, Utc};
use quick_xml::Writer;
use quick_xml::escape::{escape, partial_escape};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::error::{Result, WaypointError};
use crate::icons::IconCatalog;
use crate::options::GpxOptions;
use crate::record::WaypointRecord;

pub const GPX_NS: &str = "http://www.topografix.com/GPX/1/1";
pub const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";
pub const GPXX_NS: &str = "http://www.garmin.com/xmlschemas/GpxExtensions/v3";
pub const CTX_NS: &str = "http://www.garmin.com/xmlschemas/CreationTimeExtension/v1";

const SCHEMA_LOCATION: &str = "http://www.topografix.com/GPX/1/1 http://www.topografix.com/GPX/1/1/gpx.xsd http://www.garmin.com/xmlschemas/GpxExtensions/v3 http://www.garmin.com/xmlschemas/GpxExtensionsv3.xsd http://www.garmin.com/xmlschemas/CreationTimeExtension/v1 http://www.garmin.com/xmlschemas/CreationTimeExtensionv1.xsd";

/// Render a single-waypoint GPX document. Output depends only on the arguments.
pub fn serialize_record(
    record: &WaypointRecord,
    catalog: &IconCatalog,
    opts: &GpxOptions,
    created_at: DateTime<Utc>,
) -> Result<String> {
    validate(record)?;
    let name = record.name.trim();
    let symbol = catalog.symbol_for(&record.icon_key).ok_or_else(|| {
        WaypointError::Validation(format!("unknown icon '{}'", record.icon_key))
    })?;
    let links = record.normalized_links();
    let lat = record.latitude.to_string();
    let lon = record.longitude.to_string();
    let created = created_at.to_rfc3339_opts(SecondsFormat::Secs, true);

    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer.write_event(Event::Start(BytesStart::new("gpx").with_attributes([
        ("version", "1.1"),
        ("creator", opts.creator.as_str()),
        ("xmlns", GPX_NS),
        ("xmlns:xsi", XSI_NS),
        ("xmlns:gpxx", GPXX_NS),
        ("xmlns:ctx", CTX_NS),
        ("xsi:schemaLocation", SCHEMA_LOCATION),
    ])))?;
    writer.write_event(Event::Start(
        BytesStart::new("wpt").with_attributes([("lat", lat.as_str()), ("lon", lon.as_str())]),
    ))?;

    write_text_element(&mut writer, "name", name)?;
    write_text_element(
        &mut writer,
        "desc",
        &describe(name, record.description.trim(), &links),
    )?;
    for link in &links {
        writer.write_event(Event::Empty(
            BytesStart::new("link").with_attributes([("href", *link)]),
        ))?;
    }
    write_text_element(&mut writer, "sym", symbol)?;

    writer.write_event(Event::Start(BytesStart::new("extensions")))?;
    writer.write_event(Event::Start(BytesStart::new("gpxx:WaypointExtension")))?;
    write_text_element(&mut writer, "gpxx:DisplayMode", &opts.display_mode)?;
    writer.write_event(Event::End(BytesEnd::new("gpxx:WaypointExtension")))?;
    writer.write_event(Event::Start(
        BytesStart::new("ctx:CreationTimeExtension").with_attributes([("xmlns:ctx", CTX_NS)]),
    ))?;
    write_text_element(&mut writer, "ctx:CreationTime", &created)?;
    writer.write_event(Event::End(BytesEnd::new("ctx:CreationTimeExtension")))?;
    writer.write_event(Event::End(BytesEnd::new("extensions")))?;

    writer.write_event(Event::End(BytesEnd::new("wpt")))?;
    writer.write_event(Event::End(BytesEnd::new("gpx")))?;

    let mut xml = String::from_utf8(writer.into_inner()).map_err(|e| e.utf8_error())?;
    xml.push('\n');
    Ok(xml)
}

/// Checks a record must pass before it is written.
pub fn validate(record: &WaypointRecord) -> Result<()> {
    if !record.has_name() {
        return Err(WaypointError::Validation(
            "waypoint name is required".to_string(),
        ));
    }
    if !record.latitude.is_finite() || !(-90.0..=90.0).contains(&record.latitude) {
        return Err(WaypointError::Validation(format!(
            "latitude {} out of range",
            record.latitude
        )));
    }
    if !record.longitude.is_finite() || !(-180.0..=180.0).contains(&record.longitude) {
        return Err(WaypointError::Validation(format!(
            "longitude {} out of range",
            record.longitude
        )));
    }
    Ok(())
}

/// HTML shown by Garmin software: heading, prose, then one paragraph per link.
/// The heading and anchors are markup; the name and links inside them are text.
/// The description prose is the user's own HTML and goes in as is.
fn describe(name: &str, description: &str, links: &[&str]) -> String {
    let mut html = format!("<h2>{}</h2>\n", partial_escape(name));
    if !description.is_empty() {
        html.push_str(description);
        html.push('\n');
    }
    for link in links {
        html.push_str(&format!(
            "<p><a href=\"{}\" target=\"_blank\">{}</a></p>\n",
            escape(*link),
            partial_escape(*link)
        ));
    }
    html
}

fn write_text_element(writer: &mut Writer<Vec<u8>>, tag: &str, text: &str) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new(tag)))?;
    writer.write_event(Event::Text(BytesText::from_escaped(partial_escape(text))))?;
    writer.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}
