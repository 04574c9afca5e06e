//! Loading of form field descriptors from JSON.


use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;


#[derive(Debug)]
pub enum Error {
    /// The descriptor file could not be read.
    Io { path: PathBuf, error: io::Error },

    /// The descriptor file is not a JSON array.
    MalformedDescriptorFile(serde_json::Error),

    /// An element of the descriptor array does not have the expected shape.
    MalformedDescriptor { index: usize, reason: String },
}
impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, error }
                => write!(f, "failed to read descriptors from {}: {}", path.display(), error),
            Self::MalformedDescriptorFile(e)
                => write!(f, "descriptor file is not a JSON array: {}", e),
            Self::MalformedDescriptor { index, reason }
                => write!(f, "malformed descriptor at index {}: {}", index, reason),
        }
    }
}
impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { error, .. } => Some(error),
            Self::MalformedDescriptorFile(e) => Some(e),
            Self::MalformedDescriptor { .. } => None,
        }
    }
}


/// The description of a single form field to place into the document.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    /// The kind of field, e.g. `text` or `checkbox`.
    ///
    /// Kept verbatim; it is interpreted when the field is created.
    #[serde(rename = "type")]
    pub field_type: String,

    /// Zero-based index of the page that receives the field.
    pub page: usize,

    /// The fully qualified field name.
    pub name: String,

    pub position: Position,

    pub text_color: Option<String>,

    pub background_color: Option<String>,
}


/// The placement of a field as given in the descriptor.
///
/// The members are kept as raw JSON values so that a missing or non-numeric coordinate can be
/// reported precisely by [`crate::geometry::to_rectangle`].
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct Position {
    #[serde(default)]
    pub x: Value,

    #[serde(default)]
    pub y: Value,

    #[serde(default)]
    pub width: Value,

    #[serde(default)]
    pub height: Value,
}


/// Decodes a JSON array of descriptors, validating each element.
pub fn parse_descriptors(json: &str) -> Result<Vec<FieldDescriptor>, Error> {
    let entries: Vec<Value> = serde_json::from_str(json)
        .map_err(Error::MalformedDescriptorFile)?;

    entries.into_iter()
        .enumerate()
        .map(|(index, entry)| {
            let descriptor: FieldDescriptor = serde_json::from_value(entry)
                .map_err(|e| Error::MalformedDescriptor { index, reason: e.to_string() })?;
            if descriptor.name.is_empty() {
                return Err(Error::MalformedDescriptor { index, reason: "field name is empty".to_owned() });
            }
            Ok(descriptor)
        })
        .collect()
}


/// Reads and decodes the descriptor file at the given path.
pub fn load_descriptors(path: &Path) -> Result<Vec<FieldDescriptor>, Error> {
    let json = std::fs::read_to_string(path)
        .map_err(|error| Error::Io { path: path.to_owned(), error })?;
    let descriptors = parse_descriptors(&json)?;
    debug!("loaded {} descriptors from {}", descriptors.len(), path.display());
    Ok(descriptors)
}


#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn full_descriptor() {
        let descriptors = parse_descriptors(r##"[
            {
                "type": "text",
                "page": 0,
                "name": "f1",
                "position": {"x": 10, "y": 10, "width": 100, "height": 20},
                "textColor": "#ff0000",
                "backgroundColor": "00ff00"
            }
        ]"##).unwrap();

        assert_eq!(descriptors.len(), 1);
        let d = &descriptors[0];
        assert_eq!(d.field_type, "text");
        assert_eq!(d.page, 0);
        assert_eq!(d.name, "f1");
        assert_eq!(d.position.x, json!(10));
        assert_eq!(d.position.height, json!(20));
        assert_eq!(d.text_color.as_deref(), Some("#ff0000"));
        assert_eq!(d.background_color.as_deref(), Some("00ff00"));
    }

    #[test]
    fn optional_colors_and_unknown_keys() {
        let descriptors = parse_descriptors(r#"[
            {"type": "checkbox", "page": 2, "name": "c", "position": {}, "textColor": null, "comment": "ignored"}
        ]"#).unwrap();
        assert_eq!(descriptors[0].text_color, None);
        assert_eq!(descriptors[0].background_color, None);
        assert_eq!(descriptors[0].position.x, Value::Null);
    }

    #[test]
    fn unknown_type_is_kept_for_later() {
        let descriptors = parse_descriptors(r#"[
            {"type": "radio", "page": 0, "name": "r", "position": {"x": 1, "y": 1, "width": 1, "height": 1}}
        ]"#).unwrap();
        assert_eq!(descriptors[0].field_type, "radio");
    }

    #[test]
    fn empty_list() {
        assert_eq!(parse_descriptors("[]").unwrap(), Vec::new());
    }

    #[test]
    fn not_an_array() {
        let err = parse_descriptors(r#"{"type": "text"}"#).unwrap_err();
        assert!(matches!(err, Error::MalformedDescriptorFile(_)));

        let err = parse_descriptors("this is not JSON").unwrap_err();
        assert!(matches!(err, Error::MalformedDescriptorFile(_)));
    }

    #[test]
    fn malformed_entries_report_their_index() {
        let cases = [
            r#"[{"type": "text", "page": 0, "name": "a", "position": {}}, 42]"#,
            r#"[{"type": "text", "page": 0, "name": "a", "position": {}}, {"type": "text", "page": 0, "position": {}}]"#,
            r#"[{"type": "text", "page": 0, "name": "a", "position": {}}, {"type": "text", "page": -1, "name": "b", "position": {}}]"#,
            r#"[{"type": "text", "page": 0, "name": "a", "position": {}}, {"type": 5, "page": 0, "name": "b", "position": {}}]"#,
            r#"[{"type": "text", "page": 0, "name": "a", "position": {}}, {"type": "text", "page": 0, "name": "b", "position": 3}]"#,
            r#"[{"type": "text", "page": 0, "name": "a", "position": {}}, {"type": "text", "page": 0, "name": "b", "position": {}, "textColor": 255}]"#,
        ];
        for case in cases {
            match parse_descriptors(case) {
                Err(Error::MalformedDescriptor { index, .. }) => assert_eq!(index, 1, "{}", case),
                other => panic!("unexpected result {:?} for {}", other, case),
            }
        }
    }

    #[test]
    fn empty_name_is_rejected() {
        let err = parse_descriptors(r#"[{"type": "text", "page": 0, "name": "", "position": {}}]"#).unwrap_err();
        assert!(matches!(err, Error::MalformedDescriptor { index: 0, .. }));
    }

    #[test]
    fn missing_file() {
        let err = load_descriptors(Path::new("/nonexistent/descriptors.json")).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
