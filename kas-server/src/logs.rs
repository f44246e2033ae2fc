//! Container logs captured alongside the dump
use std::path::{Path, PathBuf};

use bytes::Bytes;
use kas_core::GroupVersion;

use crate::{
    index::{DumpIndex, NAMESPACES_DIR},
    reader, Error, Result,
};

/// Query options of a `pods/{name}/log` request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogOptions {
    /// Container to read, the pod's first container when unset
    pub container: Option<String>,
    /// Read the log of the previous container instance
    pub previous: bool,
    /// Keep only this many trailing lines
    pub tail_lines: Option<usize>,
    /// Keep the response open after the content
    pub follow: bool,
}

pub(crate) fn is_true(value: &str) -> bool {
    matches!(value, "true" | "1")
}

impl LogOptions {
    /// Parse the request query; a `tailLines` that is not a non-negative integer is rejected
    pub fn from_query(query: &[(String, String)]) -> Result<Self> {
        let mut opts = LogOptions::default();
        for (key, value) in query {
            match key.as_str() {
                "container" if !value.is_empty() => opts.container = Some(value.clone()),
                "previous" => opts.previous = is_true(value),
                "follow" => opts.follow = is_true(value),
                "tailLines" if !value.is_empty() => {
                    let lines = value.parse::<usize>().map_err(|_| {
                        Error::BadRequest(format!("tailLines must be a non-negative integer, got {value:?}"))
                    })?;
                    opts.tail_lines = Some(lines);
                }
                _ => {}
            }
        }
        Ok(opts)
    }
}

/// Log file locations for one container, in lookup order
fn candidates(root: &Path, namespace: &str, pod: &str, container: &str, previous: bool) -> [PathBuf; 2] {
    let ns_dir = root.join(NAMESPACES_DIR).join(namespace);
    let (file, suffix) = if previous {
        ("previous.log", "-previous.log")
    } else {
        ("current.log", ".log")
    };
    [
        ns_dir
            .join("pods")
            .join(pod)
            .join(container)
            .join(container)
            .join("logs")
            .join(file),
        ns_dir
            .join(GroupVersion::core_v1().dump_dir())
            .join("pods")
            .join("logs")
            .join(format!("{pod}-{container}{suffix}")),
    ]
}

async fn default_container(index: &DumpIndex, namespace: &str, pod: &str) -> Result<String> {
    let dir = index.group_dir(Some(namespace), &GroupVersion::core_v1());
    let found = reader::read_object(&dir, "pods", pod).await?;
    found
        .as_ref()
        .and_then(|pod| pod.lookup_str("spec.containers.0.name"))
        .map(str::to_string)
        .ok_or_else(|| Error::NotFound(format!("container for pod {namespace}/{pod}")))
}

/// Read the log of one pod container, honoring `previous` and `tailLines`
pub async fn read_log(index: &DumpIndex, namespace: &str, pod: &str, opts: &LogOptions) -> Result<Bytes> {
    let container = match &opts.container {
        Some(container) => container.clone(),
        None => default_container(index, namespace, pod).await?,
    };
    for path in candidates(index.root(), namespace, pod, &container, opts.previous) {
        let content = match tokio::fs::read(&path).await {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => continue,
            Err(source) => return Err(Error::ReadFile { path, source }),
        };
        tracing::debug!(path = %path.display(), "serving container log");
        let content = match opts.tail_lines {
            Some(lines) => tail(&content, lines),
            None => content,
        };
        return Ok(Bytes::from(content));
    }
    Err(Error::NotFound(format!("log of container {container:?} in pod {namespace}/{pod}")))
}

/// Keep the last `lines` newline separated segments, plus the one after the final newline
pub fn tail(content: &[u8], lines: usize) -> Vec<u8> {
    let segments: Vec<&[u8]> = content.split(|b| *b == b'\n').collect();
    if lines + 1 >= segments.len() {
        return content.to_vec();
    }
    segments[segments.len() - lines - 1..].join(&b'\n')
}
