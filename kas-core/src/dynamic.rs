//! Contains types for documents whose kind is only known at runtime.
//!
//! Every manifest in a dump decodes into a [`DynamicObject`] before anything else looks at it.
//! Field access goes through [`lookup`], which walks a dotted path and resolves to `None`
//! instead of failing when a segment is missing or has the wrong shape.
pub use crate::discovery::ApiResource;
use crate::metadata::{ListMeta, TypeMeta};

use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("failed to parse this DynamicObject into a typed object: {source}")]
/// Failed to parse `DynamicObject` into a typed struct
pub struct ParseDynamicObjectError {
    #[from]
    source: serde_json::Error,
}

/// Resolve a dotted path inside a document
///
/// Object members are addressed by key, array elements by decimal index.
/// Empty segments are ignored so `.spec.replicas` and `spec.replicas` are equivalent.
pub fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .filter(|segment| !segment.is_empty())
        .try_fold(value, |current, segment| match current {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
}

/// A dynamic representation of a kubernetes object
///
/// This will work with any non-list type object.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(transparent)]
pub struct DynamicObject {
    /// The full document
    pub data: Value,
}

impl DynamicObject {
    /// Create a DynamicObject with minimal values set from ApiResource.
    #[must_use]
    pub fn new(name: &str, resource: &ApiResource) -> Self {
        Self {
            data: json!({
                "apiVersion": resource.api_version,
                "kind": resource.kind,
                "metadata": { "name": name },
            }),
        }
    }

    /// Wrap an already decoded document
    pub fn from_value(data: Value) -> Self {
        Self { data }
    }

    /// Resolve a dotted path, see [`lookup`]
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        lookup(&self.data, path)
    }

    /// Resolve a dotted path to a string value
    pub fn lookup_str(&self, path: &str) -> Option<&str> {
        self.lookup(path).and_then(Value::as_str)
    }

    /// Resolve a dotted path to an integer value
    pub fn lookup_i64(&self, path: &str) -> Option<i64> {
        self.lookup(path).and_then(Value::as_i64)
    }

    /// Resolve a dotted path to a boolean value
    pub fn lookup_bool(&self, path: &str) -> Option<bool> {
        self.lookup(path).and_then(Value::as_bool)
    }

    /// Resolve a dotted path to an array, empty when absent
    pub fn lookup_array(&self, path: &str) -> &[Value] {
        self.lookup(path)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// The apiVersion, empty when unset
    pub fn api_version(&self) -> &str {
        self.lookup_str("apiVersion").unwrap_or_default()
    }

    /// The kind, empty when unset
    pub fn kind(&self) -> &str {
        self.lookup_str("kind").unwrap_or_default()
    }

    /// The type fields of this object
    pub fn types(&self) -> TypeMeta {
        TypeMeta::new(self.api_version(), self.kind())
    }

    /// The object name
    pub fn name(&self) -> Option<&str> {
        self.lookup_str("metadata.name")
    }

    /// The object namespace
    pub fn namespace(&self) -> Option<&str> {
        self.lookup_str("metadata.namespace")
    }

    /// Labels of the object; non-string values are ignored
    pub fn labels(&self) -> BTreeMap<String, String> {
        string_map(self.lookup("metadata.labels"))
    }

    /// Fill in apiVersion and kind where the document does not carry them
    pub fn default_types(&mut self, types: &TypeMeta) {
        if let Value::Object(map) = &mut self.data {
            for (key, value) in [("apiVersion", &types.api_version), ("kind", &types.kind)] {
                let missing = map.get(key).and_then(Value::as_str).is_none_or(str::is_empty);
                if missing && !value.is_empty() {
                    map.insert(key.to_string(), Value::String(value.clone()));
                }
            }
        }
    }

    /// A copy holding only the type fields and metadata
    pub fn metadata_projection(&self) -> Value {
        let metadata = self.lookup("metadata").cloned().unwrap_or_else(|| json!({}));
        json!({
            "apiVersion": self.api_version(),
            "kind": self.kind(),
            "metadata": metadata,
        })
    }

    /// Attempt to convert this `DynamicObject` to a typed struct
    pub fn try_parse<K: DeserializeOwned>(self) -> Result<K, ParseDynamicObjectError> {
        Ok(serde_json::from_value(self.data)?)
    }
}

/// Collect the string members of a JSON object into a sorted map
pub fn string_map(value: Option<&Value>) -> BTreeMap<String, String> {
    value
        .and_then(Value::as_object)
        .map(|map| {
            map.iter()
                .filter_map(|(k, v)| Some((k.clone(), v.as_str()?.to_string())))
                .collect()
        })
        .unwrap_or_default()
}

/// A list of dynamic objects with its own type envelope
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct DynamicList {
    /// The list envelope
    #[serde(flatten)]
    pub types: TypeMeta,

    /// List metadata carried over from the source document
    #[serde(default)]
    pub metadata: ListMeta,

    /// The items, `null` on disk is read as empty
    #[serde(default, deserialize_with = "nullable")]
    pub items: Vec<DynamicObject>,
}

impl Default for DynamicList {
    fn default() -> Self {
        Self::new(TypeMeta::list())
    }
}

impl DynamicList {
    /// An empty list with the given envelope
    pub fn new(types: TypeMeta) -> Self {
        Self {
            types,
            metadata: ListMeta::default(),
            items: vec![],
        }
    }

    /// Build a list and derive its envelope from the first item
    pub fn from_items(items: Vec<DynamicObject>) -> Self {
        let mut list = Self {
            items,
            ..Self::default()
        };
        list.retag();
        list
    }

    /// Set the envelope to `<first item kind>List` and the first item's apiVersion
    ///
    /// Lists without items keep their envelope.
    pub fn retag(&mut self) {
        if let Some(first) = self.items.first() {
            self.types = first.types().to_list();
        }
    }

    /// Find an item by `metadata.name`
    pub fn find(&self, name: &str) -> Option<&DynamicObject> {
        self.items.iter().find(|item| item.name() == Some(name))
    }

    /// A new list with the same envelope holding the items accepted by `predicate`
    pub fn filtered(&self, mut predicate: impl FnMut(&DynamicObject) -> bool) -> Self {
        Self {
            types: self.types.clone(),
            metadata: self.metadata.clone(),
            items: self.items.iter().filter(|item| predicate(item)).cloned().collect(),
        }
    }

    /// Number of items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the list has no items
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
