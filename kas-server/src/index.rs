//! The resource catalog built from one walk over the dump at startup.
use std::{
    collections::{BTreeMap, HashMap},
    path::{Component, Path, PathBuf},
};

use futures::future::join_all;
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kas_core::{
    discovery::Scope, dynamic::lookup, ApiResource, DynamicList, DynamicObject, GroupVersion, TypeMeta,
};
use serde_json::Value;
use walkdir::WalkDir;

use crate::{config::ShortNames, error::Errors, reader, Error, Result};

/// Directory holding one subdirectory per namespace
pub const NAMESPACES_DIR: &str = "namespaces";
/// Directory holding cluster scoped resources
pub const CLUSTER_SCOPED_DIR: &str = "cluster-scoped-resources";

const CRD_GROUP: &str = "apiextensions.k8s.io";
const CRD_RESOURCE: &str = "customresourcedefinitions";

/// Immutable catalog of everything found in a dump
#[derive(Debug)]
pub struct DumpIndex {
    root: PathBuf,
    resources: BTreeMap<GroupVersion, Vec<ApiResource>>,
    lookup: HashMap<(GroupVersion, String), ApiResource>,
    crds: HashMap<String, CustomResourceDefinition>,
    namespaces: Vec<String>,
}

/// What a single manifest says about its resource
#[derive(Debug, Clone, PartialEq, Eq)]
struct Discovered {
    plural: String,
    types: TypeMeta,
    scope: Scope,
}

impl DumpIndex {
    /// Walk the dump below `root` and build the catalog
    ///
    /// Any unreadable or undecodable manifest fails the whole build.
    pub async fn build(root: impl Into<PathBuf>, short_names: &ShortNames) -> Result<Self> {
        let root = root.into();
        tracing::info!(root = %root.display(), "discovering api resources");

        let crds = read_crds(&root).await;
        let namespaces = read_namespaces(&root).await?;

        let walk_root = root.clone();
        let (paths, mut errors) = tokio::task::spawn_blocking(move || manifest_paths(&walk_root))
            .await
            .map_err(Error::Join)?;

        let tasks = paths.into_iter().map(|path| {
            let root = root.clone();
            tokio::spawn(async move { discover(&root, &path).await })
        });
        let mut found = vec![];
        for joined in join_all(tasks).await {
            match joined.map_err(Error::Join).and_then(|r| r) {
                Ok(Some(discovered)) => found.push(discovered),
                Ok(None) => {}
                Err(err) => errors.push(err),
            }
        }
        if !errors.is_empty() {
            return Err(Error::Discovery(errors));
        }

        let mut index = DumpIndex {
            root,
            resources: BTreeMap::new(),
            lookup: HashMap::new(),
            crds,
            namespaces,
        };
        index.insert(ApiResource::namespaces());
        for discovered in found {
            let gv = match discovered.types.api_version.parse::<GroupVersion>() {
                Ok(gv) => gv,
                Err(err) => {
                    tracing::warn!(error = %err, resource = %discovered.plural, "skipping resource");
                    continue;
                }
            };
            let names = short_names.resolve(&discovered.plural, &gv.group, &index.crds);
            let resource =
                ApiResource::from_gv_with_plural(&gv, &discovered.types.kind, &discovered.plural, discovered.scope)
                    .with_short_names(names);
            index.insert(resource);
        }
        tracing::info!(
            group_versions = index.resources.len(),
            resources = index.lookup.len(),
            namespaces = index.namespaces.len(),
            crds = index.crds.len(),
            "finished discovering api resources"
        );
        Ok(index)
    }

    // First writer wins.
    fn insert(&mut self, resource: ApiResource) {
        let key = (resource.group_version(), resource.plural.clone());
        if self.lookup.contains_key(&key) {
            return;
        }
        self.resources
            .entry(key.0.clone())
            .or_default()
            .push(resource.clone());
        self.lookup.insert(key, resource);
    }

    /// Root directory of the dump
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Look up a resource by group version and plural name
    pub fn resource(&self, gv: &GroupVersion, plural: &str) -> Option<&ApiResource> {
        self.lookup.get(&(gv.clone(), plural.to_string()))
    }

    /// Resources served under a group version, in discovery order
    pub fn resources(&self, gv: &GroupVersion) -> Option<&[ApiResource]> {
        self.resources.get(gv).map(Vec::as_slice)
    }

    /// All group versions, sorted
    pub fn group_versions(&self) -> impl Iterator<Item = &GroupVersion> {
        self.resources.keys()
    }

    /// CRDs keyed by `<plural>.<group>`
    pub fn crds(&self) -> &HashMap<String, CustomResourceDefinition> {
        &self.crds
    }

    /// Namespace names from the dump's directory listing, sorted
    pub fn namespaces(&self) -> &[String] {
        &self.namespaces
    }

    /// Directory holding a group's manifests for one namespace, or cluster scoped ones
    pub fn group_dir(&self, namespace: Option<&str>, gv: &GroupVersion) -> PathBuf {
        match namespace {
            Some(ns) => self.root.join(NAMESPACES_DIR).join(ns).join(gv.dump_dir()),
            None => self.root.join(CLUSTER_SCOPED_DIR).join(gv.dump_dir()),
        }
    }

    /// Namespace objects made up from the directory listing
    pub fn namespace_list(&self) -> DynamicList {
        let resource = ApiResource::namespaces();
        let mut list = DynamicList::new(TypeMeta::new("v1", "NamespaceList"));
        list.items = self
            .namespaces
            .iter()
            .map(|ns| DynamicObject::new(ns, &resource))
            .collect();
        list
    }
}

async fn read_crds(root: &Path) -> HashMap<String, CustomResourceDefinition> {
    let dir = root.join(CLUSTER_SCOPED_DIR).join(CRD_GROUP);
    let list = match reader::read_list(&dir, CRD_RESOURCE).await {
        Ok(list) => list,
        Err(err) => {
            tracing::warn!(error = %err, "encountered errors reading crds");
            return HashMap::new();
        }
    };
    let mut crds = HashMap::new();
    for item in list.items {
        let name = item.name().unwrap_or_default().to_string();
        match item.try_parse::<CustomResourceDefinition>() {
            Ok(crd) => {
                crds.insert(crd.metadata.name.clone().unwrap_or(name), crd);
            }
            Err(err) => tracing::warn!(crd = %name, error = %err, "failed to parse crd"),
        }
    }
    crds
}

async fn read_namespaces(root: &Path) -> Result<Vec<String>> {
    let dir = root.join(NAMESPACES_DIR);
    let mut entries = match tokio::fs::read_dir(&dir).await {
        Ok(entries) => entries,
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(dir = %dir.display(), "dump has no namespaces directory");
            return Ok(vec![]);
        }
        Err(source) => return Err(Error::ReadFile { path: dir, source }),
    };
    let mut namespaces = vec![];
    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(source) => return Err(Error::ReadFile { path: dir, source }),
        };
        let path = entry.path();
        let metadata = tokio::fs::metadata(&path)
            .await
            .map_err(|source| Error::ReadFile { path: path.clone(), source })?;
        if metadata.is_dir() {
            namespaces.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    namespaces.sort();
    Ok(namespaces)
}

fn manifest_paths(root: &Path) -> (Vec<PathBuf>, Errors) {
    let mut paths = vec![];
    let mut errors = Errors::default();
    for entry in WalkDir::new(root).sort_by_file_name() {
        match entry {
            Ok(entry) if entry.file_type().is_file() && entry.file_name().to_string_lossy().ends_with(".yaml") => {
                paths.push(entry.into_path());
            }
            Ok(_) => {}
            Err(err) => {
                let path = err.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf());
                errors.push(Error::ReadFile {
                    path,
                    source: err.into(),
                });
            }
        }
    }
    (paths, errors)
}

async fn discover(root: &Path, path: &Path) -> Result<Option<Discovered>> {
    let documents = reader::read_documents(path).await?.unwrap_or_default();
    let Some(document) = documents.first() else {
        return Ok(None);
    };
    let relative = path.strip_prefix(root).unwrap_or(path);
    let discovered = infer(relative, document).map_err(|reason| Error::Malformed {
        path: path.to_path_buf(),
        reason,
    })?;
    if let Some(found) = &discovered {
        if found.types.is_incomplete() {
            tracing::warn!(path = %path.display(), "skipping manifest without apiVersion or kind");
            return Ok(None);
        }
    }
    Ok(discovered)
}

/// Work out which resource a manifest belongs to from its path and contents
///
/// Lists are named after their file, lone objects after the nearest ancestor
/// directory that differs from the file name (`pods/<name>/<name>.yaml` is a pod).
fn infer(relative: &Path, document: &Value) -> Result<Option<Discovered>, String> {
    let components: Vec<&str> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => part.to_str(),
            _ => None,
        })
        .collect();
    let Some((file_name, parents)) = components.split_last() else {
        return Ok(None);
    };
    let stem = file_name.strip_suffix(".yaml").unwrap_or(file_name);
    let scope = if parents.first() == Some(&NAMESPACES_DIR) {
        Scope::Namespaced
    } else {
        Scope::Cluster
    };
    let type_of = |value: &Value| {
        let field = |name| lookup(value, name).and_then(Value::as_str).unwrap_or_default();
        TypeMeta::new(field("apiVersion"), field("kind"))
    };

    match lookup(document, "items") {
        None => {}
        Some(Value::Null) => return Ok(None),
        Some(Value::Array(items)) => {
            let Some(first) = items.first() else {
                return Ok(None);
            };
            return Ok(Some(Discovered {
                plural: stem.to_string(),
                types: type_of(first),
                scope,
            }));
        }
        Some(_) => return Err("items field is not a list".into()),
    }

    let Some(plural) = parents.iter().rev().find(|dir| **dir != stem) else {
        return Ok(None);
    };
    Ok(Some(Discovered {
        plural: plural.to_string(),
        types: type_of(document),
        scope,
    }))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::testing::{crd_yaml, write};
    use serde_json::json;

    #[test]
    fn infers_list_and_exploded_layouts() {
        let pods = infer(
            Path::new("namespaces/default/core/pods.yaml"),
            &json!({ "kind": "PodList", "items": [{ "apiVersion": "v1", "kind": "Pod" }] }),
        )
        .unwrap()
        .unwrap();
        assert_eq!(pods.plural, "pods");
        assert_eq!(pods.types, TypeMeta::new("v1", "Pod"));
        assert_eq!(pods.scope, Scope::Namespaced);

        let nested = infer(
            Path::new("namespaces/default/pods/web/web.yaml"),
            &json!({ "apiVersion": "v1", "kind": "Pod" }),
        )
        .unwrap()
        .unwrap();
        assert_eq!(nested.plural, "pods");

        let node = infer(
            Path::new("cluster-scoped-resources/core/nodes/node-1.yaml"),
            &json!({ "apiVersion": "v1", "kind": "Node" }),
        )
        .unwrap()
        .unwrap();
        assert_eq!(node.plural, "nodes");
        assert_eq!(node.scope, Scope::Cluster);

        assert_eq!(infer(Path::new("x/pods.yaml"), &json!({ "items": [] })).unwrap(), None);
        assert_eq!(infer(Path::new("x/pods.yaml"), &json!({ "items": null })).unwrap(), None);
        assert!(infer(Path::new("x/pods.yaml"), &json!({ "items": "nope" })).is_err());
        assert_eq!(infer(Path::new("top.yaml"), &json!({ "kind": "Pod" })).unwrap(), None);
    }

    #[tokio::test]
    async fn builds_catalog_with_short_names() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(
            root,
            "namespaces/default/core/pods.yaml",
            "apiVersion: v1\nkind: PodList\nitems:\n- apiVersion: v1\n  kind: Pod\n  metadata:\n    name: a\n",
        );
        write(
            root,
            "namespaces/default/apps/deployments/web.yaml",
            "apiVersion: apps/v1\nkind: Deployment\nmetadata:\n  name: web\n",
        );
        write(
            root,
            "namespaces/other/example.com/widgets/w1.yaml",
            "apiVersion: example.com/v1\nkind: Widget\nmetadata:\n  name: w1\n",
        );
        write(
            root,
            "cluster-scoped-resources/apiextensions.k8s.io/customresourcedefinitions/widgets.example.com.yaml",
            &crd_yaml("widgets", "example.com", "Widget", &["wd"], ""),
        );
        write(root, "cluster-scoped-resources/core/nodes.yaml", "apiVersion: v1\nkind: NodeList\nitems: []\n");
        write(root, "namespaces/default/core/pods/a/a/logs/current.log", "log line\n");

        let index = DumpIndex::build(root, &ShortNames::default()).await.unwrap();
        assert_eq!(index.namespaces(), ["default".to_string(), "other".to_string()]);

        let core = index.resources(&GroupVersion::core_v1()).unwrap();
        let names: Vec<_> = core.iter().map(|r| r.plural.as_str()).collect();
        assert_eq!(names, vec!["namespaces", "pods"]);

        let pods = index.resource(&GroupVersion::core_v1(), "pods").unwrap();
        assert!(pods.namespaced());
        assert_eq!(pods.short_names, vec!["po"]);

        let deploy = index.resource(&GroupVersion::gv("apps", "v1"), "deployments").unwrap();
        assert_eq!(deploy.kind, "Deployment");
        assert_eq!(deploy.short_names, vec!["deploy"]);

        let widgets = index.resource(&GroupVersion::gv("example.com", "v1"), "widgets").unwrap();
        assert_eq!(widgets.short_names, vec!["wd"]);
        assert!(index.crds().contains_key("widgets.example.com"));

        let crds = index
            .resource(&GroupVersion::gv("apiextensions.k8s.io", "v1"), "customresourcedefinitions")
            .unwrap();
        assert!(!crds.namespaced());
        assert_eq!(crds.short_names, vec!["crd", "crds"]);

        assert!(index.resource(&GroupVersion::core_v1(), "nodes").is_none());
        assert_eq!(index.namespace_list().len(), 2);
        assert_eq!(index.namespace_list().types.kind, "NamespaceList");
    }

    #[tokio::test]
    async fn corrupt_manifests_fail_startup() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "namespaces/default/core/pods.yaml", "items: [unterminated\n");
        let err = DumpIndex::build(dir.path(), &ShortNames::default()).await.unwrap_err();
        assert!(matches!(err, Error::Discovery(_)), "{err}");
    }

    #[tokio::test]
    async fn dumps_without_namespaces_still_index() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "cluster-scoped-resources/core/nodes/n1.yaml", "apiVersion: v1\nkind: Node\nmetadata:\n  name: n1\n");
        let index = DumpIndex::build(dir.path(), &ShortNames::default()).await.unwrap();
        assert!(index.namespaces().is_empty());
        assert!(index.resource(&GroupVersion::core_v1(), "nodes").is_some());
        assert!(index.resource(&GroupVersion::core_v1(), "namespaces").is_some());
    }

    #[tokio::test]
    async fn only_directories_are_namespaces() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "namespaces/b/core/pods/p.yaml", "apiVersion: v1\nkind: Pod\nmetadata:\n  name: p\n");
        write(dir.path(), "namespaces/README.txt", "not a namespace\n");
        std::fs::create_dir_all(dir.path().join("namespaces/a")).unwrap();
        let index = DumpIndex::build(dir.path(), &ShortNames::default()).await.unwrap();
        assert_eq!(index.namespaces(), ["a", "b"]);
    }
}
