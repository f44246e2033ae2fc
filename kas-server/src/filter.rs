//! Field and label selector filtering of list results
use std::collections::BTreeMap;

use kas_core::{DynamicList, DynamicObject, Selector};

use crate::{Error, Result};

/// Required `path=value` pairs from all `fieldSelector` query values
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSelector(BTreeMap<String, String>);

impl FieldSelector {
    /// Merge every `fieldSelector` value into one set of requirements
    ///
    /// Each value is a comma separated list of `key=value` clauses.
    /// A key given more than once keeps the last value seen.
    pub fn parse<'a>(values: impl IntoIterator<Item = &'a str>) -> Result<Self> {
        let mut requirements = BTreeMap::new();
        for value in values.into_iter().filter(|v| !v.is_empty()) {
            for clause in value.split(',') {
                let parts: Vec<&str> = clause.split('=').collect();
                let [key, expected] = parts.as_slice() else {
                    return Err(Error::BadRequest(format!(
                        "invalid field selector clause {clause:?}, expected key=value"
                    )));
                };
                requirements.insert(key.to_string(), expected.to_string());
            }
        }
        Ok(Self(requirements))
    }

    /// Whether every required path resolves to the required string
    pub fn matches(&self, obj: &DynamicObject) -> bool {
        self.0
            .iter()
            .all(|(path, expected)| obj.lookup_str(path) == Some(expected.as_str()))
    }

    /// Whether there is nothing to filter on
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Selectors from a list request, applied field selector first
#[derive(Debug, Clone, Default)]
pub struct Filters {
    fields: FieldSelector,
    labels: Vec<Selector>,
}

impl Filters {
    /// Parse the `fieldSelector` and `labelSelector` values of a request
    pub fn from_query(query: &[(String, String)]) -> Result<Self> {
        let values = |name: &'static str| {
            query
                .iter()
                .filter(move |(key, _)| key == name)
                .map(|(_, value)| value.as_str())
        };
        let fields = FieldSelector::parse(values("fieldSelector"))?;
        let labels = values("labelSelector")
            .map(|value| value.parse::<Selector>().map_err(Error::LabelSelector))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { fields, labels })
    }

    /// Whether an object passes both stages
    pub fn matches(&self, obj: &DynamicObject) -> bool {
        if !self.fields.matches(obj) {
            return false;
        }
        if self.labels.is_empty() {
            return true;
        }
        let labels = obj.labels();
        self.labels.iter().all(|selector| selector.matches(&labels))
    }

    /// A new list holding the matching items in their original order
    pub fn apply(&self, list: &DynamicList) -> DynamicList {
        if self.fields.is_empty() && self.labels.is_empty() {
            return list.clone();
        }
        list.filtered(|obj| self.matches(obj))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    fn list() -> DynamicList {
        let item = |name: &str, labels: serde_json::Value| {
            DynamicObject::from_value(json!({
                "apiVersion": "v1",
                "kind": "Pod",
                "metadata": { "name": name, "namespace": "default", "labels": labels },
                "spec": { "nodeName": "node-1" },
            }))
        };
        DynamicList::from_items(vec![
            item("a", json!({ "foo": "bar", "env": "prod" })),
            item("b", json!({ "foo": "baz" })),
            item("c", json!(null)),
        ])
    }

    fn query(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn names(list: &DynamicList) -> Vec<&str> {
        list.items.iter().filter_map(DynamicObject::name).collect()
    }

    #[test]
    fn field_selectors_match_paths() {
        let filters = Filters::from_query(&query(&[("fieldSelector", "metadata.name=a")])).unwrap();
        assert_eq!(names(&filters.apply(&list())), vec!["a"]);

        let filters = Filters::from_query(&query(&[("fieldSelector", "spec.nodeName=node-1,metadata.namespace=default")]))
            .unwrap();
        assert_eq!(names(&filters.apply(&list())), vec!["a", "b", "c"]);

        let filters = Filters::from_query(&query(&[("fieldSelector", "status.phase=Running")])).unwrap();
        assert!(filters.apply(&list()).is_empty());
    }

    #[test]
    fn duplicate_field_keys_keep_the_last_value() {
        let filters = Filters::from_query(&query(&[
            ("fieldSelector", "metadata.name=a"),
            ("fieldSelector", "metadata.name=b"),
        ]))
        .unwrap();
        assert_eq!(names(&filters.apply(&list())), vec!["b"]);
    }

    #[test]
    fn label_selectors_all_apply() {
        let filters = Filters::from_query(&query(&[("labelSelector", "foo=bar")])).unwrap();
        assert_eq!(names(&filters.apply(&list())), vec!["a"]);

        let filters = Filters::from_query(&query(&[("labelSelector", "foo=baz")])).unwrap();
        assert_eq!(names(&filters.apply(&list())), vec!["b"]);

        let filters = Filters::from_query(&query(&[("labelSelector", "foo"), ("labelSelector", "env!=prod")])).unwrap();
        assert_eq!(names(&filters.apply(&list())), vec!["b"]);

        let filters = Filters::from_query(&query(&[("labelSelector", "!foo")])).unwrap();
        assert_eq!(names(&filters.apply(&list())), vec!["c"]);
    }

    #[test]
    fn fields_and_labels_compose() {
        let filters = Filters::from_query(&query(&[
            ("fieldSelector", "metadata.name=b"),
            ("labelSelector", "foo=bar"),
        ]))
        .unwrap();
        assert!(filters.apply(&list()).is_empty());
    }

    #[test]
    fn malformed_selectors_are_bad_requests() {
        for pairs in [
            [("fieldSelector", "metadata.name")],
            [("fieldSelector", "a=b=c")],
            [("labelSelector", "foo in bar")],
        ] {
            let err = Filters::from_query(&query(&pairs)).unwrap_err();
            assert_eq!(err.status_code(), http::StatusCode::BAD_REQUEST, "{err}");
        }
    }

    #[test]
    fn no_selectors_pass_everything_through() {
        let filters = Filters::from_query(&query(&[("watch", "true")])).unwrap();
        assert_eq!(filters.apply(&list()), list());
    }
}
