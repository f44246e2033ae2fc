//! Types for the watch api
//!
//! See <https://kubernetes.io/docs/reference/using-api/api-concepts/#efficient-detection-of-changes>
use serde::{Deserialize, Serialize};

/// A raw event sent on a watch stream
///
/// Note that a watch response carries many of these as newline separated JSON.
/// A snapshot never changes, so `Added` is the only event there is.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", content = "object", rename_all = "UPPERCASE")]
pub enum WatchEvent<K> {
    /// Resource was added
    Added(K),
}

impl<K: Serialize> WatchEvent<K> {
    /// Encode as one line of a watch stream, including the trailing newline
    pub fn to_line(&self) -> serde_json::Result<Vec<u8>> {
        let mut line = serde_json::to_vec(self)?;
        line.push(b'\n');
        Ok(line)
    }
}

#[cfg(test)]
mod test {
    use super::WatchEvent;
    use serde_json::json;

    #[test]
    fn encodes_tagged_lines() {
        let line = WatchEvent::Added(json!({ "kind": "Pod" })).to_line().unwrap();
        assert_eq!(
            String::from_utf8(line).unwrap(),
            "{\"type\":\"ADDED\",\"object\":{\"kind\":\"Pod\"}}\n"
        );
    }

    #[test]
    fn only_added_events_exist() {
        let added: WatchEvent<serde_json::Value> =
            serde_json::from_str(r#"{"type":"ADDED","object":{"kind":"Pod"}}"#).unwrap();
        assert_eq!(added, WatchEvent::Added(json!({ "kind": "Pod" })));
        let modified = serde_json::from_str::<WatchEvent<serde_json::Value>>(r#"{"type":"MODIFIED","object":{}}"#);
        assert!(modified.is_err());
    }
}
