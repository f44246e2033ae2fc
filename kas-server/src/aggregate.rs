//! All-namespaces list requests: one reader per namespace, merged into a single list
use futures::future::join_all;
use kas_core::{DynamicList, GroupVersion};

use crate::{error::Errors, index::DumpIndex, reader, Error, Result};

/// Read `resource` from every known namespace and merge the results
///
/// Items keep the sorted namespace order. Failed namespaces are logged and skipped
/// as long as at least one namespace could be read.
pub async fn read_all_namespaces(index: &DumpIndex, gv: &GroupVersion, resource: &str) -> Result<DynamicList> {
    let tasks = index.namespaces().iter().map(|ns| {
        let dir = index.group_dir(Some(ns), gv);
        let resource = resource.to_string();
        tokio::spawn(async move { reader::read_list(&dir, &resource).await })
    });

    let mut items = vec![];
    let mut errors = Errors::default();
    let mut succeeded = 0;
    for (ns, joined) in index.namespaces().iter().zip(join_all(tasks).await) {
        match joined.map_err(Error::Join).and_then(|r| r) {
            Ok(list) => {
                succeeded += 1;
                items.extend(list.items);
            }
            Err(err) => {
                tracing::debug!(namespace = %ns, error = %err, "namespace read failed");
                errors.push(err);
            }
        }
    }

    if !errors.is_empty() {
        if succeeded == 0 {
            return Err(Error::Aggregate(errors));
        }
        tracing::warn!(
            resource,
            group_version = %gv,
            failed = errors.0.len(),
            error = %errors,
            "serving partial all-namespaces list"
        );
    }
    Ok(DynamicList::from_items(items))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{config::ShortNames, testing::write};
    use kas_core::{DynamicObject, TypeMeta};

    fn widget(name: &str) -> String {
        format!("apiVersion: example.com/v1\nkind: Widget\nmetadata:\n  name: {name}\n")
    }

    #[tokio::test]
    async fn merges_namespaces_and_skips_absent_ones() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "namespaces/x/example.com/widgets/x1.yaml", &widget("x1"));
        write(root, "namespaces/x/example.com/widgets/x2.yaml", &widget("x2"));
        write(root, "namespaces/y/example.com/widgets.yaml", &widget("y1"));
        std::fs::create_dir_all(root.join("namespaces/z")).unwrap();

        let index = DumpIndex::build(root, &ShortNames::default()).await.unwrap();
        let list = read_all_namespaces(&index, &GroupVersion::gv("example.com", "v1"), "widgets")
            .await
            .unwrap();
        assert_eq!(list.types, TypeMeta::new("example.com/v1", "WidgetList"));
        let names: Vec<_> = list.items.iter().filter_map(DynamicObject::name).collect();
        assert_eq!(names, vec!["x1", "x2", "y1"]);
    }

    #[tokio::test]
    async fn partial_failures_still_serve() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "namespaces/x/example.com/widgets.yaml", &widget("x1"));
        std::fs::create_dir_all(root.join("namespaces/y")).unwrap();
        let index = DumpIndex::build(root, &ShortNames::default()).await.unwrap();
        // corrupt after indexing so only the request path sees it
        write(root, "namespaces/y/example.com/widgets.yaml", "kind: [broken\n");

        let gv = GroupVersion::gv("example.com", "v1");
        let list = read_all_namespaces(&index, &gv, "widgets").await.unwrap();
        assert_eq!(list.len(), 1);

        write(root, "namespaces/x/example.com/widgets.yaml", "kind: [broken\n");
        let err = read_all_namespaces(&index, &gv, "widgets").await.unwrap_err();
        assert!(matches!(err, Error::Aggregate(_)), "{err}");
    }

    #[tokio::test]
    async fn unknown_resources_are_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("namespaces/x")).unwrap();
        let index = DumpIndex::build(dir.path(), &ShortNames::default()).await.unwrap();
        let list = read_all_namespaces(&index, &GroupVersion::core_v1(), "pods").await.unwrap();
        assert_eq!(list, DynamicList::default());
    }
}
