//! Case-insensitive header map shared by requests and responses.
//!
//! Header names are normalized to lower case on insertion and lookup, so
//! `Content-Length`, `content-length` and `CONTENT-LENGTH` all address the
//! same entry. Values are stored trimmed. Re-inserting a name replaces the
//! previous value, which gives duplicate header lines last-occurrence-wins
//! semantics. Insertion order is preserved only so serialized responses come
//! out in a stable order.

use indexmap::IndexMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
    fields: IndexMap<String, String>,
}

impl HeaderMap {
    pub fn new() -> Self {
        Self {
            fields: IndexMap::new(),
        }
    }

    pub fn insert(&mut self, name: &str, value: &str) {
        self.fields.insert(name.to_lowercase(), value.trim().to_string());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(&name.to_lowercase()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn clear(&mut self) {
        self.fields.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Serialize every field as `name: value\r\n`, ready to be embedded in a
    /// response head.
    pub fn stringify(&self) -> String {
        let mut result = String::new();
        for (name, value) in &self.fields {
            result.push_str(&format!("{}: {}\r\n", name, value));
        }
        result
    }
}
