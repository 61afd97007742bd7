use std::path::PathBuf;
use std::str::Utf8Error;
use wasm_bindgen::JsValue;

/// Broad error categories exposed to callers of the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Parse,
    Validation,
    NotFound,
    Io,
}

#[derive(Debug)]
pub enum WaypointError {
    XmlParse(quick_xml::Error),
    MissingElement(&'static str),
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },
    InvalidAttribute {
        element: &'static str,
        attribute: &'static str,
        value: String,
    },
    UnexpectedEof(&'static str),
    Encoding(Utf8Error),
    Validation(String),
    InvalidState(&'static str),
    NotFound(PathBuf),
    Io(std::io::Error),
}

impl WaypointError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::XmlParse(_)
            | Self::MissingElement(_)
            | Self::MissingAttribute { .. }
            | Self::InvalidAttribute { .. }
            | Self::UnexpectedEof(_)
            | Self::Encoding(_) => ErrorKind::Parse,
            Self::Validation(_) | Self::InvalidState(_) => ErrorKind::Validation,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Io(_) => ErrorKind::Io,
        }
    }
}

impl std::fmt::Display for WaypointError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::XmlParse(e) => write!(f, "XML parse error: {e}"),
            Self::MissingElement(element) => write!(f, "Missing element <{element}>"),
            Self::MissingAttribute { element, attribute } => {
                write!(f, "Missing attribute '{attribute}' on <{element}>")
            }
            Self::InvalidAttribute {
                element,
                attribute,
                value,
            } => write!(
                f,
                "Invalid value '{value}' for attribute '{attribute}' on <{element}>"
            ),
            Self::UnexpectedEof(element) => {
                write!(f, "Document ended inside <{element}>")
            }
            Self::Encoding(e) => write!(f, "Document is not valid UTF-8: {e}"),
            Self::Validation(msg) => write!(f, "Validation error: {msg}"),
            Self::InvalidState(msg) => write!(f, "Invalid session state: {msg}"),
            Self::NotFound(path) => write!(f, "Waypoint file not found: {}", path.display()),
            Self::Io(e) => write!(f, "IO error: {e}"),
        }
    }
}

impl std::error::Error for WaypointError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::XmlParse(e) => Some(e),
            Self::Encoding(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<quick_xml::Error> for WaypointError {
    fn from(e: quick_xml::Error) -> Self {
        Self::XmlParse(e)
    }
}

impl From<std::io::Error> for WaypointError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<Utf8Error> for WaypointError {
    fn from(e: Utf8Error) -> Self {
        Self::Encoding(e)
    }
}

impl From<WaypointError> for JsValue {
    fn from(e: WaypointError) -> Self {
        JsValue::from_str(&e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, WaypointError>;
