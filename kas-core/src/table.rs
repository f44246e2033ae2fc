//! The `meta.k8s.io` Table representation returned for `Accept: ...;as=Table` requests
use crate::metadata::{ListMeta, TypeMeta};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Tabular rendering of one object or a list of objects
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    /// Always `Table` in `meta.k8s.io/<version>`
    #[serde(flatten)]
    pub types: TypeMeta,
    /// Standard list metadata
    #[serde(default)]
    pub metadata: ListMeta,
    /// Describes each column, in cell order
    pub column_definitions: Vec<TableColumnDefinition>,
    /// One row per object
    pub rows: Vec<TableRow>,
}

impl Table {
    /// An empty table for the requested `meta.k8s.io` version
    pub fn new(version: &str, column_definitions: Vec<TableColumnDefinition>) -> Self {
        Self {
            types: TypeMeta::new(format!("meta.k8s.io/{version}"), "Table"),
            metadata: ListMeta::default(),
            column_definitions,
            rows: vec![],
        }
    }
}

/// Column metadata
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct TableColumnDefinition {
    /// Human readable column name
    pub name: String,
    /// OpenAPI type of the cells: `integer`, `number`, `string`, `boolean` or `date`
    #[serde(rename = "type")]
    pub type_: String,
    /// Optional OpenAPI format modifier, like `name`
    #[serde(default)]
    pub format: String,
    /// Human readable description
    #[serde(default)]
    pub description: String,
    /// Columns with priority above 0 are only shown in wide output
    #[serde(default)]
    pub priority: i32,
}

impl TableColumnDefinition {
    /// A string column
    pub fn string(name: &str, description: &str) -> Self {
        Self::typed(name, "string", description)
    }

    /// A column with an explicit type
    pub fn typed(name: &str, type_: &str, description: &str) -> Self {
        Self {
            name: name.into(),
            type_: type_.into(),
            format: String::new(),
            description: description.into(),
            priority: 0,
        }
    }

    /// Set the format modifier
    #[must_use]
    pub fn format(mut self, format: &str) -> Self {
        self.format = format.into();
        self
    }

    /// Mark as a wide column
    #[must_use]
    pub fn wide(mut self) -> Self {
        self.priority = 1;
        self
    }
}

/// One rendered object
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct TableRow {
    /// Cell values, one per column definition
    pub cells: Vec<Value>,
    /// Extra state about the row, like completion
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<TableRowCondition>,
    /// Metadata-only projection of the source object
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<Value>,
}

/// A condition attached to a row
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct TableRowCondition {
    /// Condition type, `Completed` is the only one in use
    #[serde(rename = "type")]
    pub type_: String,
    /// `True`, `False` or `Unknown`
    pub status: String,
    /// Machine readable reason
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Human readable message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl TableRowCondition {
    /// A `Completed=True` condition
    pub fn completed(reason: &str, message: &str) -> Self {
        Self {
            type_: "Completed".into(),
            status: "True".into(),
            reason: Some(reason.into()),
            message: Some(message.into()),
        }
    }
}
