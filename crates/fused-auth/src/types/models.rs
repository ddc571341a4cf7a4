/*
[INPUT]:  Caller identity and loosely typed JSON objects
[OUTPUT]: Identity value and coerced string maps
[POS]:    Data layer - core domain models
[UPDATE]: When identity fields or map coercion rules change
*/

use std::collections::BTreeMap;
use std::ops::Deref;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::enums::SubjectKind;

/// Who is signing in, and to which application
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    subject: String,
    kind: SubjectKind,
    app_id: String,
}

impl Identity {
    pub fn new(subject: impl Into<String>, kind: SubjectKind, app_id: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            kind,
            app_id: app_id.into(),
        }
    }

    /// Identity keyed by an email address
    pub fn email(email: impl Into<String>, app_id: impl Into<String>) -> Self {
        Self::new(email, SubjectKind::Email, app_id)
    }

    /// Identity keyed by a device or user uuid
    pub fn uuid(uuid: impl Into<String>, app_id: impl Into<String>) -> Self {
        Self::new(uuid, SubjectKind::Uuid, app_id)
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn kind(&self) -> SubjectKind {
        self.kind
    }

    /// Application id; may be empty
    pub fn app_id(&self) -> &str {
        &self.app_id
    }
}

/// Flat string-to-string map
///
/// Deserializes from any JSON object. Values that are not strings are
/// coerced to text: `null` becomes `""`, numbers and booleans use their
/// JSON spelling, nested arrays and objects keep their compact JSON text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct StringMap(BTreeMap<String, String>);

impl StringMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_object(object: serde_json::Map<String, Value>) -> Self {
        Self(
            object
                .into_iter()
                .map(|(key, value)| (key, coerce_to_string(value)))
                .collect(),
        )
    }

    /// Look up a value as `&str`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn into_inner(self) -> BTreeMap<String, String> {
        self.0
    }
}

impl Deref for StringMap {
    type Target = BTreeMap<String, String>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for StringMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

impl<'de> Deserialize<'de> for StringMap {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let object = serde_json::Map::<String, Value>::deserialize(deserializer)?;
        Ok(Self::from_json_object(object))
    }
}

pub(crate) fn coerce_to_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}
