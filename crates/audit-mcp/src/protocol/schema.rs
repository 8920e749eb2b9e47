//! Tool input schemas
//!
//! A tool's `inputSchema` is a JSON Schema object. Only the subset that the
//! auditor reads and the demo server publishes is modelled: the top-level
//! `type`, an ordered `properties` map and the `required` list.
//!
//! Deserialization never fails on a malformed optional field. A value of the
//! wrong JSON type falls back to the field's default so that one odd tool
//! cannot make the whole `tools/list` result unreadable.

use std::borrow::Cow;

use serde::de::{DeserializeOwned, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

fn default_object_type() -> String {
    "object".to_string()
}

/// Deserialize an optional field, mapping any shape mismatch to `None`.
pub(crate) fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Deserialize a field, mapping any shape mismatch to `T::default()`.
pub(crate) fn lenient_or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

fn lenient_object_type<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let declared: Option<String> = lenient(deserializer)?;
    Ok(declared.unwrap_or_else(default_object_type))
}

/// Top-level input schema of a tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputSchema {
    /// JSON Schema type, `"object"` unless the server says otherwise
    #[serde(
        rename = "type",
        default = "default_object_type",
        deserialize_with = "lenient_object_type"
    )]
    pub schema_type: String,

    /// Declared parameters in server order; `None` when the schema has no
    /// usable `properties` mapping
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub properties: Option<Properties>,

    /// Names of required parameters
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub required: Vec<String>,
}

impl Default for InputSchema {
    fn default() -> Self {
        Self {
            schema_type: default_object_type(),
            properties: None,
            required: Vec::new(),
        }
    }
}

impl InputSchema {
    /// An object schema with an empty property map
    pub fn object() -> Self {
        Self {
            properties: Some(Properties::default()),
            ..Self::default()
        }
    }

    /// Append a parameter, marking it required when asked
    pub fn with_property(
        mut self,
        name: impl Into<String>,
        schema: PropertySchema,
        required: bool,
    ) -> Self {
        let name = name.into();
        if required {
            self.required.push(name.clone());
        }
        self.properties
            .get_or_insert_with(Properties::default)
            .push(name, schema);
        self
    }

    /// Look up a declared parameter
    pub fn property(&self, name: &str) -> Option<&PropertySchema> {
        self.properties.as_ref().and_then(|props| props.get(name))
    }

    /// Whether `name` is listed in `required`
    pub fn is_required(&self, name: &str) -> bool {
        self.required.iter().any(|r| r == name)
    }
}

/// Ordered parameter map
///
/// Serialized as a JSON object. Entries keep the order in which the server
/// declared them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties(Vec<(String, PropertySchema)>);

impl Properties {
    /// Append an entry, replacing an existing one with the same name in place
    pub fn push(&mut self, name: impl Into<String>, schema: PropertySchema) {
        let name = name.into();
        match self.0.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = schema,
            None => self.0.push((name, schema)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&PropertySchema> {
        self.0
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, schema)| schema)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertySchema)> {
        self.0.iter().map(|(name, schema)| (name.as_str(), schema))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<N: Into<String>> FromIterator<(N, PropertySchema)> for Properties {
    fn from_iter<I: IntoIterator<Item = (N, PropertySchema)>>(iter: I) -> Self {
        let mut props = Properties::default();
        for (name, schema) in iter {
            props.push(name, schema);
        }
        props
    }
}

impl Serialize for Properties {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, schema) in &self.0 {
            map.serialize_entry(name, schema)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Properties {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // serde_json's `preserve_order` keeps the declaration order here.
        let raw = Map::<String, Value>::deserialize(deserializer)?;
        Ok(raw
            .into_iter()
            .map(|(name, value)| {
                let schema = serde_json::from_value(value).unwrap_or_default();
                (name, schema)
            })
            .collect())
    }
}

/// Schema of a single parameter
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertySchema {
    /// JSON Schema type exactly as declared: usually a string, but unions
    /// such as `["boolean", "null"]` are kept too. Absent for `$ref`/`anyOf`
    /// style declarations.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<Value>,

    /// Description of this parameter
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<String>,

    /// Default value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    /// Additional schema keywords (title, minimum, $ref, ...)
    #[serde(flatten)]
    pub additional: Map<String, Value>,
}

impl PropertySchema {
    fn typed(schema_type: &str, description: impl Into<String>) -> Self {
        Self {
            schema_type: Some(Value::String(schema_type.to_string())),
            description: Some(description.into()),
            ..Self::default()
        }
    }

    /// Create a number parameter
    pub fn number(description: impl Into<String>) -> Self {
        Self::typed("number", description)
    }

    /// Create a boolean parameter
    pub fn boolean(description: impl Into<String>) -> Self {
        Self::typed("boolean", description)
    }

    /// Attach a default value
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Whether the declared type is the single type `name`
    pub fn has_type(&self, name: &str) -> bool {
        self.schema_type.as_ref().and_then(Value::as_str) == Some(name)
    }

    /// Declared type for display: the bare name for a single type, JSON text
    /// for anything else
    pub fn type_label(&self) -> Option<Cow<'_, str>> {
        self.schema_type.as_ref().map(|declared| match declared {
            Value::String(name) => Cow::Borrowed(name.as_str()),
            other => Cow::Owned(other.to_string()),
        })
    }
}
