//! Helpers for building dumps in unit tests
use std::path::Path;

/// Write `contents` to `root/rel`, creating parent directories
pub(crate) fn write(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, contents).unwrap();
}

/// A minimal CRD for `<plural>.<group>` with optional short names and printer columns
pub(crate) fn crd_yaml(plural: &str, group: &str, kind: &str, short_names: &[&str], columns: &str) -> String {
    let short_names = short_names
        .iter()
        .map(|s| format!("\"{s}\""))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        r#"apiVersion: apiextensions.k8s.io/v1
kind: CustomResourceDefinition
metadata:
  name: {plural}.{group}
spec:
  group: {group}
  names:
    kind: {kind}
    plural: {plural}
    shortNames: [{short_names}]
  scope: Namespaced
  versions:
  - name: v1
    served: true
    storage: true
    additionalPrinterColumns: [{columns}]
"#
    )
}
