//! Discovery documents served under `/api` and `/apis`
use std::collections::BTreeMap;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::{
    APIGroup, APIGroupList, APIResource, APIResourceList, APIVersions, GroupVersionForDiscovery,
};
use kas_core::GroupVersion;

use crate::index::DumpIndex;

/// Serialized discovery documents, computed once from the index
#[derive(Debug, Clone)]
pub struct Discovery {
    versions: APIVersions,
    groups: APIGroupList,
    resources: BTreeMap<GroupVersion, APIResourceList>,
}

impl Discovery {
    /// Build every discovery document the index implies
    pub fn new(index: &DumpIndex) -> Self {
        let resources: BTreeMap<_, _> = index
            .group_versions()
            .map(|gv| {
                let list = APIResourceList {
                    group_version: gv.api_version(),
                    resources: index
                        .resources(gv)
                        .unwrap_or_default()
                        .iter()
                        .map(APIResource::from)
                        .collect(),
                };
                (gv.clone(), list)
            })
            .collect();

        let mut by_group: BTreeMap<&str, Vec<&GroupVersion>> = BTreeMap::new();
        for gv in resources.keys().filter(|gv| !gv.group.is_empty()) {
            by_group.entry(gv.group.as_str()).or_default().push(gv);
        }
        let groups = by_group
            .into_iter()
            .map(|(name, gvs)| {
                let versions: Vec<_> = gvs
                    .into_iter()
                    .map(|gv| GroupVersionForDiscovery {
                        group_version: gv.api_version(),
                        version: gv.version.clone(),
                    })
                    .collect();
                APIGroup {
                    name: name.to_string(),
                    preferred_version: versions.first().cloned(),
                    versions,
                    server_address_by_client_cidrs: None,
                }
            })
            .collect();

        Self {
            versions: APIVersions {
                versions: vec!["v1".into()],
                server_address_by_client_cidrs: vec![],
            },
            groups: APIGroupList { groups },
            resources,
        }
    }

    /// `/api`
    pub fn api_versions(&self) -> &APIVersions {
        &self.versions
    }

    /// `/apis`
    pub fn api_groups(&self) -> &APIGroupList {
        &self.groups
    }

    /// `/api/v1` or `/apis/{group}/{version}`
    pub fn resources(&self, gv: &GroupVersion) -> Option<&APIResourceList> {
        self.resources.get(gv)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{config::ShortNames, testing::write};
    use assert_json_diff::assert_json_include;
    use serde_json::json;

    #[tokio::test]
    async fn documents_reflect_the_index() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "namespaces/default/core/pods/a.yaml", "apiVersion: v1\nkind: Pod\nmetadata:\n  name: a\n");
        write(
            root,
            "namespaces/default/apps/deployments/web.yaml",
            "apiVersion: apps/v1\nkind: Deployment\nmetadata:\n  name: web\n",
        );
        write(
            root,
            "namespaces/default/example.com/widgets/w.yaml",
            "apiVersion: example.com/v2\nkind: Widget\nmetadata:\n  name: w\n",
        );
        write(
            root,
            "namespaces/default/example.com/oldwidgets/w.yaml",
            "apiVersion: example.com/v1\nkind: OldWidget\nmetadata:\n  name: w\n",
        );
        let index = DumpIndex::build(root, &ShortNames::default()).await.unwrap();
        let discovery = Discovery::new(&index);

        assert_json_include!(
            actual: serde_json::to_value(discovery.api_versions()).unwrap(),
            expected: json!({ "kind": "APIVersions", "versions": ["v1"] })
        );

        let core = serde_json::to_value(discovery.resources(&GroupVersion::core_v1()).unwrap()).unwrap();
        assert_json_include!(
            actual: core,
            expected: json!({
                "kind": "APIResourceList",
                "groupVersion": "v1",
                "resources": [
                    { "name": "namespaces", "singularName": "namespace", "namespaced": false, "kind": "Namespace", "shortNames": ["ns"] },
                    { "name": "pods", "singularName": "pod", "namespaced": true, "kind": "Pod", "verbs": ["get", "list", "watch"], "shortNames": ["po"] },
                ],
            })
        );
        assert!(discovery.resources(&GroupVersion::gv("batch", "v1")).is_none());

        let groups = serde_json::to_value(discovery.api_groups()).unwrap();
        assert_json_include!(
            actual: groups,
            expected: json!({
                "kind": "APIGroupList",
                "groups": [
                    {
                        "name": "apps",
                        "versions": [{ "groupVersion": "apps/v1", "version": "v1" }],
                        "preferredVersion": { "groupVersion": "apps/v1", "version": "v1" },
                    },
                    {
                        "name": "example.com",
                        "versions": [
                            { "groupVersion": "example.com/v1", "version": "v1" },
                            { "groupVersion": "example.com/v2", "version": "v2" },
                        ],
                        "preferredVersion": { "groupVersion": "example.com/v1", "version": "v1" },
                    },
                ],
            })
        );
    }
}
