//! Process configuration and the lookup tables handed to the server components
use std::{collections::HashMap, net::SocketAddr, path::PathBuf};

use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;

/// Command line configuration for the `static-kas` binary
#[derive(clap::Parser, Debug, Clone)]
#[command(name = "static-kas", version, about = "Serve a cluster dump as a read-only API server")]
pub struct Config {
    /// Root directory of the dump
    #[arg(long, env = "STATIC_KAS_BASE_DIR")]
    pub base_dir: PathBuf,

    /// Address to listen on
    #[arg(long, default_value = "0.0.0.0:8080")]
    pub listen_address: SocketAddr,

    /// Log as JSON lines instead of human readable text
    #[arg(long)]
    pub log_json: bool,
}

/// Options for the table printers
///
/// The server always renders with [`PrinterOptions::default`], which is wide; request
/// parameters never change it. Narrow output is for callers driving a
/// [`TableConvertor`](crate::printers::TableConvertor) themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrinterOptions {
    /// Include priority > 0 columns
    pub wide: bool,
}

impl Default for PrinterOptions {
    fn default() -> Self {
        Self { wide: true }
    }
}

/// Short names for resources, keyed by `resource` for the core group and `resource.group` otherwise
#[derive(Debug, Clone)]
pub struct ShortNames(HashMap<String, Vec<String>>);

impl Default for ShortNames {
    fn default() -> Self {
        let known: &[(&str, &[&str])] = &[
            ("pods", &["po"]),
            ("services", &["svc"]),
            ("configmaps", &["cm"]),
            ("endpoints", &["ep"]),
            ("events", &["ev"]),
            ("namespaces", &["ns"]),
            ("nodes", &["no"]),
            ("persistentvolumeclaims", &["pvc"]),
            ("persistentvolumes", &["pv"]),
            ("replicationcontrollers", &["rc"]),
            ("serviceaccounts", &["sa"]),
            ("limitranges", &["limits"]),
            ("resourcequotas", &["quota"]),
            ("statefulsets.apps", &["sts"]),
            ("deployments.apps", &["deploy"]),
            ("daemonsets.apps", &["ds"]),
            ("replicasets.apps", &["rs"]),
            ("cronjobs.batch", &["cj"]),
            ("horizontalpodautoscalers.autoscaling", &["hpa"]),
            ("ingresses.networking.k8s.io", &["ing"]),
            ("networkpolicies.networking.k8s.io", &["netpol"]),
            ("poddisruptionbudgets.policy", &["pdb"]),
            ("priorityclasses.scheduling.k8s.io", &["pc"]),
            ("storageclasses.storage.k8s.io", &["sc"]),
            ("customresourcedefinitions.apiextensions.k8s.io", &["crd", "crds"]),
        ];
        Self(
            known
                .iter()
                .map(|(key, names)| (key.to_string(), names.iter().map(|n| n.to_string()).collect()))
                .collect(),
        )
    }
}

impl ShortNames {
    /// A table with only the given entries
    pub fn new(entries: HashMap<String, Vec<String>>) -> Self {
        Self(entries)
    }

    fn key(resource: &str, group: &str) -> String {
        if group.is_empty() {
            resource.to_string()
        } else {
            format!("{resource}.{group}")
        }
    }

    /// Short names for a resource
    ///
    /// The static table wins over short names declared by a matching CRD.
    pub fn resolve(
        &self,
        resource: &str,
        group: &str,
        crds: &HashMap<String, CustomResourceDefinition>,
    ) -> Vec<String> {
        let key = Self::key(resource, group);
        if let Some(names) = self.0.get(&key) {
            return names.clone();
        }
        crds.get(&key)
            .and_then(|crd| crd.spec.names.short_names.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    fn crd(name: &str, short_names: &[&str]) -> CustomResourceDefinition {
        serde_json::from_value(json!({
            "apiVersion": "apiextensions.k8s.io/v1",
            "kind": "CustomResourceDefinition",
            "metadata": { "name": name },
            "spec": {
                "group": name.split_once('.').unwrap().1,
                "names": { "kind": "Thing", "plural": name.split_once('.').unwrap().0, "shortNames": short_names },
                "scope": "Namespaced",
                "versions": [],
            },
        }))
        .unwrap()
    }

    #[test]
    fn static_table_wins_over_crds() {
        let crds: HashMap<_, _> = [
            ("pods".to_string(), crd("pods.example.com", &["x"])),
            ("deployments.apps".to_string(), crd("deployments.apps", &["d"])),
            ("widgets.example.com".to_string(), crd("widgets.example.com", &["wd"])),
        ]
        .into();
        let names = ShortNames::default();
        assert_eq!(names.resolve("deployments", "apps", &crds), vec!["deploy"]);
        assert_eq!(names.resolve("pods", "", &crds), vec!["po"]);
        assert_eq!(names.resolve("widgets", "example.com", &crds), vec!["wd"]);
        assert!(names.resolve("gadgets", "example.com", &crds).is_empty());
    }
}
