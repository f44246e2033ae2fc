//! Metadata structs used in lists, tables and dynamic objects.
pub use k8s_openapi::apimachinery::pkg::apis::meta::v1::ListMeta;
use serde::{Deserialize, Serialize};

/// Type information that is flattened into every kubernetes object
///
/// Both fields default to empty strings since dumped documents are not always complete.
#[derive(Deserialize, Serialize, Clone, Default, Debug, Eq, PartialEq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct TypeMeta {
    /// The version of the API
    #[serde(default)]
    pub api_version: String,

    /// The name of the API
    #[serde(default)]
    pub kind: String,
}

impl TypeMeta {
    /// Construct from an apiVersion and kind
    pub fn new(api_version: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            api_version: api_version.into(),
            kind: kind.into(),
        }
    }

    /// The envelope used for lists that carry nothing to derive a type from
    pub fn list() -> Self {
        Self::new("v1", "List")
    }

    /// The list envelope matching an item of this type
    pub fn to_list(&self) -> Self {
        Self::new(self.api_version.clone(), format!("{}List", self.kind))
    }

    /// Whether either field is missing
    pub fn is_incomplete(&self) -> bool {
        self.api_version.is_empty() || self.kind.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::TypeMeta;

    #[test]
    fn list_envelope_appends_list_suffix() {
        let pod = TypeMeta::new("v1", "Pod");
        assert_eq!(pod.to_list(), TypeMeta::new("v1", "PodList"));
        assert!(!pod.is_incomplete());
        assert!(TypeMeta::new("", "Pod").is_incomplete());
    }
}
