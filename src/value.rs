use std::path::Path;

use indexmap::IndexMap;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::path;

/// Upload status codes carried by [`FileUpload::error`].
pub const UPLOAD_ERR_OK: u8 = 0;
pub const UPLOAD_ERR_NO_FILE: u8 = 4;

/// Characters left untouched by the form encoder: ASCII alphanumerics and `-_.`.
const FORM_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.');

/// The current value of a field, as it would be submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Multiple(Vec<String>),
    File(FileUpload),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_multiple(&self) -> Option<&[String]> {
        match self {
            Self::Multiple(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_file(&self) -> Option<&FileUpload> {
        match self {
            Self::File(upload) => Some(upload),
            _ => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

/// Descriptor of a file attached to a file input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileUpload {
    pub name: String,
    #[serde(rename = "type")]
    pub mime_type: String,
    pub tmp_name: String,
    pub error: u8,
    pub size: u64,
}

impl Default for FileUpload {
    fn default() -> Self {
        Self::empty()
    }
}

impl FileUpload {
    /// The descriptor of a file input nobody attached anything to.
    pub fn empty() -> Self {
        Self {
            name: String::new(),
            mime_type: String::new(),
            tmp_name: String::new(),
            error: UPLOAD_ERR_NO_FILE,
            size: 0,
        }
    }

    /// Describe the file at `path`. The file system is not consulted.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        Self {
            name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            mime_type: String::new(),
            tmp_name: path.to_string_lossy().into_owned(),
            error: UPLOAD_ERR_OK,
            size: 0,
        }
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
    }
}

/// A value assigned to one field or, for lists and maps, to a whole subtree.
#[derive(Debug, Clone, PartialEq)]
pub enum SetValue {
    Text(String),
    Bool(bool),
    List(Vec<String>),
    Map(IndexMap<String, SetValue>),
}

impl SetValue {
    pub fn is_compound(&self) -> bool {
        matches!(self, Self::List(_) | Self::Map(_))
    }

    /// Key/value pairs of a compound value; lists are keyed by position.
    pub(crate) fn into_entries(self) -> Vec<(String, SetValue)> {
        match self {
            Self::List(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, item)| (i.to_string(), Self::Text(item)))
                .collect(),
            Self::Map(map) => map.into_iter().collect(),
            _ => Vec::new(),
        }
    }

    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "a string",
            Self::Bool(_) => "a boolean",
            Self::List(_) => "a list",
            Self::Map(_) => "a map",
        }
    }
}

impl From<&str> for SetValue {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for SetValue {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&String> for SetValue {
    fn from(text: &String) -> Self {
        Self::Text(text.clone())
    }
}

impl From<bool> for SetValue {
    fn from(flag: bool) -> Self {
        Self::Bool(flag)
    }
}

impl From<Vec<String>> for SetValue {
    fn from(items: Vec<String>) -> Self {
        Self::List(items)
    }
}

impl From<Vec<&str>> for SetValue {
    fn from(items: Vec<&str>) -> Self {
        Self::List(items.into_iter().map(String::from).collect())
    }
}

impl<const N: usize> From<[&str; N]> for SetValue {
    fn from(items: [&str; N]) -> Self {
        Self::List(items.into_iter().map(String::from).collect())
    }
}

impl<K: Into<String>> From<IndexMap<K, SetValue>> for SetValue {
    fn from(map: IndexMap<K, SetValue>) -> Self {
        Self::Map(map.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl From<serde_json::Value> for SetValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Null => Self::Text(String::new()),
            Value::Bool(flag) => Self::Bool(flag),
            Value::Number(n) => Self::Text(n.to_string()),
            Value::String(s) => Self::Text(s),
            Value::Array(items) => Self::List(
                items
                    .into_iter()
                    .map(|item| match item {
                        Value::String(s) => s,
                        other => other.to_string(),
                    })
                    .collect(),
            ),
            Value::Object(map) => Self::Map(map.into_iter().map(|(k, v)| (k, v.into())).collect()),
        }
    }
}

/// Field values re-expanded into nested structures (`a[b]=v` becomes `{a: {b: v}}`),
/// the way a server-side form decoder sees them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum NestedValue {
    Text(String),
    File(FileUpload),
    Map(IndexMap<String, NestedValue>),
}

impl NestedValue {
    pub fn get(&self, key: &str) -> Option<&NestedValue> {
        match self {
            Self::Map(map) => map.get(key),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }
}

pub type NestedValues = IndexMap<String, NestedValue>;

/// Expand flat, fully qualified names into a nested structure.
///
/// Later names override earlier ones; maps are merged recursively. A list
/// without items encodes to nothing and therefore disappears.
pub(crate) fn expand(entries: impl IntoIterator<Item = (String, FieldValue)>) -> NestedValues {
    let mut output = NestedValues::new();

    for (name, value) in entries {
        let leaf = match value {
            FieldValue::Text(text) => NestedValue::Text(text),
            FieldValue::File(upload) => NestedValue::File(upload),
            FieldValue::Multiple(items) if items.is_empty() => continue,
            FieldValue::Multiple(items) => NestedValue::Map(
                items
                    .into_iter()
                    .enumerate()
                    .map(|(i, item)| (i.to_string(), NestedValue::Text(item)))
                    .collect(),
            ),
        };

        let segments = match path::parse(&name) {
            Ok(segments) => segments,
            Err(err) => {
                warn!(name = %name, error = %err, "skipping unexpandable field name");
                continue;
            }
        };

        insert_nested(&mut output, &segments, leaf);
    }

    output
}

fn insert_nested(map: &mut NestedValues, segments: &[String], leaf: NestedValue) {
    let Some((head, tail)) = segments.split_first() else {
        return;
    };

    if tail.is_empty() {
        match leaf {
            NestedValue::Map(incoming) if matches!(map.get(head), Some(NestedValue::Map(_))) => {
                for (key, value) in incoming {
                    insert_nested(map, &[head.clone(), key], value);
                }
            }
            leaf => {
                map.insert(head.clone(), leaf);
            }
        }
        return;
    }

    let child = map
        .entry(head.clone())
        .or_insert_with(|| NestedValue::Map(IndexMap::new()));
    if !matches!(child, NestedValue::Map(_)) {
        *child = NestedValue::Map(IndexMap::new());
    }
    if let NestedValue::Map(child) = child {
        insert_nested(child, tail, leaf);
    }
}

/// `application/x-www-form-urlencoded` encoding of one key or value.
pub(crate) fn encode_component(raw: &str) -> String {
    utf8_percent_encode(raw, FORM_COMPONENT)
        .to_string()
        .replace("%20", "+")
}

pub(crate) fn decode_component(encoded: &str) -> String {
    percent_decode_str(&encoded.replace('+', " "))
        .decode_utf8_lossy()
        .into_owned()
}

/// Decode a query string into ordered key/value pairs.
pub(crate) fn parse_query(query: &str) -> Vec<(String, String)> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) => (decode_component(key), decode_component(value)),
            None => (decode_component(pair), String::new()),
        })
        .filter(|(key, _)| !key.is_empty())
        .collect()
}

pub(crate) fn build_query(pairs: &[(String, String)]) -> String {
    pairs
        .iter()
        .map(|(key, value)| format!("{}={}", encode_component(key), encode_component(value)))
        .collect::<Vec<_>>()
        .join("&")
}
