use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Caller-chosen document identifier. Integers order before strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DocId {
    Int(i64),
    Str(String),
}

impl DocId {
    /// Parse a path segment: digits become [`DocId::Int`], anything else a string id.
    pub fn parse(raw: &str) -> Self {
        raw.parse::<i64>().map(DocId::Int).unwrap_or_else(|_| DocId::Str(raw.to_string()))
    }
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocId::Int(n) => write!(f, "{n}"),
            DocId::Str(s) => f.write_str(s),
        }
    }
}

impl From<i64> for DocId {
    fn from(n: i64) -> Self { DocId::Int(n) }
}

impl From<i32> for DocId {
    fn from(n: i32) -> Self { DocId::Int(n.into()) }
}

impl From<u32> for DocId {
    fn from(n: u32) -> Self { DocId::Int(n.into()) }
}

impl From<&str> for DocId {
    fn from(s: &str) -> Self { DocId::Str(s.to_string()) }
}

impl From<String> for DocId {
    fn from(s: String) -> Self { DocId::Str(s) }
}

/// Read access to the string fields of a caller-owned document.
pub trait Document {
    /// Text of a string-valued field, `None` if absent or not a string.
    fn field(&self, name: &str) -> Option<&str>;

    /// All string-valued top-level fields.
    fn string_fields(&self) -> Vec<(&str, &str)>;
}

impl Document for serde_json::Map<String, serde_json::Value> {
    fn field(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|v| v.as_str())
    }

    fn string_fields(&self) -> Vec<(&str, &str)> {
        self.iter()
            .filter_map(|(k, v)| v.as_str().map(|s| (k.as_str(), s)))
            .collect()
    }
}

impl Document for serde_json::Value {
    fn field(&self, name: &str) -> Option<&str> {
        self.as_object().and_then(|obj| obj.field(name))
    }

    fn string_fields(&self) -> Vec<(&str, &str)> {
        self.as_object().map(|obj| obj.string_fields()).unwrap_or_default()
    }
}

impl Document for HashMap<String, String> {
    fn field(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }

    fn string_fields(&self) -> Vec<(&str, &str)> {
        self.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect()
    }
}

impl Document for BTreeMap<String, String> {
    fn field(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }

    fn string_fields(&self) -> Vec<(&str, &str)> {
        self.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect()
    }
}
