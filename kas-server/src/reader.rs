//! Resolves `(directory, resource, name)` requests to documents on disk.
//!
//! A resource is stored either as a collection file `<dir>/<resource>.yaml` or exploded into
//! `<dir>/<resource>/<name>.yaml`. Both layouts read into the same [`DynamicList`].
use std::path::{Path, PathBuf};

use futures::future::join_all;
use kas_core::{DynamicList, DynamicObject};
use serde::Deserialize;
use serde_json::Value;

use crate::{Error, Result};

const MANIFEST_SUFFIX: &str = ".yaml";

/// Decode every non-empty YAML document in `bytes`
pub(crate) fn decode_documents(path: &Path, bytes: &[u8]) -> Result<Vec<Value>> {
    let mut documents = vec![];
    for document in serde_yaml::Deserializer::from_slice(bytes) {
        let value = Value::deserialize(document).map_err(|source| Error::Decode {
            path: path.to_path_buf(),
            source,
        })?;
        if !value.is_null() {
            documents.push(value);
        }
    }
    Ok(documents)
}

/// Read and decode a manifest, `None` when the file does not exist
pub(crate) async fn read_documents(path: &Path) -> Result<Option<Vec<Value>>> {
    match tokio::fs::read(path).await {
        Ok(bytes) => decode_documents(path, &bytes).map(Some),
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(Error::ReadFile {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn into_object(path: &Path, value: Value) -> Result<DynamicObject> {
    if value.is_object() {
        Ok(DynamicObject::from_value(value))
    } else {
        Err(Error::Malformed {
            path: path.to_path_buf(),
            reason: "expected a mapping".into(),
        })
    }
}

fn manifest_path(dir: &Path, stem: &str) -> PathBuf {
    dir.join(format!("{stem}{MANIFEST_SUFFIX}"))
}

/// Read every object of `resource` below `dir`
///
/// A missing collection file and a missing directory both yield an empty `v1`/`List`.
pub async fn read_list(dir: &Path, resource: &str) -> Result<DynamicList> {
    let collection = manifest_path(dir, resource);
    match read_documents(&collection).await? {
        Some(documents) => list_from_documents(&collection, documents),
        None => read_exploded(&dir.join(resource)).await,
    }
}

fn list_from_documents(path: &Path, mut documents: Vec<Value>) -> Result<DynamicList> {
    if documents.len() != 1 {
        let items = documents
            .into_iter()
            .map(|doc| into_object(path, doc))
            .collect::<Result<Vec<_>>>()?;
        return Ok(DynamicList::from_items(items));
    }
    let document = documents.remove(0);
    let kind = kas_core::dynamic::lookup(&document, "kind").and_then(Value::as_str);
    if !kind.is_some_and(|k| k.ends_with("List")) {
        return Ok(DynamicList::from_items(vec![into_object(path, document)?]));
    }
    let mut list: DynamicList = serde_json::from_value(document).map_err(|e| Error::Malformed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    list.retag();
    Ok(list)
}

async fn read_exploded(dir: &Path) -> Result<DynamicList> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => return Ok(DynamicList::default()),
        Err(source) => {
            return Err(Error::ReadFile {
                path: dir.to_path_buf(),
                source,
            })
        }
    };
    let mut paths = vec![];
    let read_err = |source| Error::ReadFile {
        path: dir.to_path_buf(),
        source,
    };
    while let Some(entry) = entries.next_entry().await.map_err(read_err)? {
        let is_file = entry.file_type().await.map_err(read_err)?.is_file();
        if is_file && entry.file_name().to_string_lossy().ends_with(MANIFEST_SUFFIX) {
            paths.push(entry.path());
        }
    }
    paths.sort();

    let tasks = paths.into_iter().map(|path| {
        tokio::spawn(async move {
            let documents = read_documents(&path).await?.unwrap_or_default();
            documents
                .into_iter()
                .map(|doc| into_object(&path, doc))
                .collect::<Result<Vec<_>>>()
        })
    });
    let mut items = vec![];
    for joined in join_all(tasks).await {
        items.extend(joined.map_err(Error::Join)??);
    }
    tracing::trace!(dir = %dir.display(), items = items.len(), "read exploded resource");
    Ok(DynamicList::from_items(items))
}

/// Find one object by name
///
/// The exploded `<dir>/<resource>/<name>.yaml` is tried first, then every item of the resource.
pub async fn read_object(dir: &Path, resource: &str, name: &str) -> Result<Option<DynamicObject>> {
    let exploded = manifest_path(&dir.join(resource), name);
    if let Some(documents) = read_documents(&exploded).await? {
        if let Some(first) = documents.into_iter().next() {
            return into_object(&exploded, first).map(Some);
        }
    }
    let list = read_list(dir, resource).await?;
    Ok(list.find(name).cloned())
}
