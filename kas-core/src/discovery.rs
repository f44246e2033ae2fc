//! Type information structs for API discovery
use crate::gvk::GroupVersion;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::APIResource;
use serde::{Deserialize, Serialize};

/// Information about a resource found in a dump
///
/// At most one of these exists per (group, version, plural).
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct ApiResource {
    /// Resource group, empty for core group.
    pub group: String,
    /// group version
    pub version: String,
    /// apiVersion of the resource (v1 for core group,
    /// groupName/groupVersions for other).
    pub api_version: String,
    /// Singular PascalCase name of the resource
    pub kind: String,
    /// Plural name of the resource
    pub plural: String,
    /// Whether objects live in a namespace
    pub scope: Scope,
    /// Supported verbs
    pub verbs: Vec<String>,
    /// Abbreviations clients may use instead of the plural
    pub short_names: Vec<String>,
}

impl ApiResource {
    /// Creates a read-only ApiResource from a group version, kind and plural name.
    pub fn from_gv_with_plural(gv: &GroupVersion, kind: &str, plural: &str, scope: Scope) -> Self {
        ApiResource {
            api_version: gv.api_version(),
            group: gv.group.clone(),
            version: gv.version.clone(),
            kind: kind.to_string(),
            plural: plural.to_string(),
            scope,
            verbs: verbs::READ_ONLY.iter().map(|v| v.to_string()).collect(),
            short_names: vec![],
        }
    }

    /// The synthetic core `namespaces` resource
    pub fn namespaces() -> Self {
        ApiResource::from_gv_with_plural(&GroupVersion::core_v1(), "Namespace", "namespaces", Scope::Cluster)
            .with_short_names(["ns"])
    }

    /// Attach short names
    #[must_use]
    pub fn with_short_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.short_names = names.into_iter().map(Into::into).collect();
        self
    }

    /// The group version this resource is served under
    pub fn group_version(&self) -> GroupVersion {
        GroupVersion::gv(&self.group, &self.version)
    }

    /// Whether objects of this resource are namespaced
    pub fn namespaced(&self) -> bool {
        self.scope == Scope::Namespaced
    }
}

impl From<&ApiResource> for APIResource {
    fn from(res: &ApiResource) -> Self {
        APIResource {
            name: res.plural.clone(),
            singular_name: res.kind.to_ascii_lowercase(),
            namespaced: res.namespaced(),
            kind: res.kind.clone(),
            verbs: res.verbs.clone(),
            short_names: (!res.short_names.is_empty()).then(|| res.short_names.clone()),
            ..APIResource::default()
        }
    }
}

/// Resource scope
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Scope {
    /// Objects are global
    Cluster,
    /// Each object lives in namespace.
    Namespaced,
}

/// Rbac verbs for ApiCapabilities
pub mod verbs {
    /// Get single resource
    pub const GET: &str = "get";
    /// List objects
    pub const LIST: &str = "list";
    /// Watch for objects changes
    pub const WATCH: &str = "watch";

    /// Everything a frozen snapshot can serve
    pub const READ_ONLY: [&str; 3] = [GET, LIST, WATCH];
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_json_diff::assert_json_eq;
    use serde_json::json;

    #[test]
    fn converts_to_discovery_entry() {
        let sts = ApiResource::from_gv_with_plural(
            &GroupVersion::gv("apps", "v1"),
            "StatefulSet",
            "statefulsets",
            Scope::Namespaced,
        )
        .with_short_names(["sts"]);
        assert_json_eq!(
            serde_json::to_value(APIResource::from(&sts)).unwrap(),
            json!({
                "name": "statefulsets",
                "singularName": "statefulset",
                "namespaced": true,
                "kind": "StatefulSet",
                "verbs": ["get", "list", "watch"],
                "shortNames": ["sts"],
            })
        );
    }

    #[test]
    fn namespaces_are_cluster_scoped_core() {
        let ns = ApiResource::namespaces();
        assert_eq!(ns.api_version, "v1");
        assert!(!ns.namespaced());
        assert_eq!(ns.short_names, vec!["ns".to_string()]);
        assert_eq!(ns.group_version(), GroupVersion::core_v1());
    }
}
