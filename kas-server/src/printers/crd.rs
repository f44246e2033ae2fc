//! Printer columns declared on a CustomResourceDefinition
use jiff::Timestamp;
use jsonpath_lib::select as jsonpath_select;
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::{
    CustomResourceColumnDefinition, CustomResourceDefinition,
};
use kas_core::{duration, DynamicObject, TableColumnDefinition, TableRow};
use serde_json::Value;

use super::{age_cell, age_column, name_cell, name_column};
use crate::{Error, Result};

/// The declared columns of one served CRD version, between `Name` and `Age`
#[derive(Debug, Clone, PartialEq)]
pub struct CustomColumns {
    kind: String,
    columns: Vec<CustomResourceColumnDefinition>,
}

impl CustomColumns {
    /// Columns declared for `version`, `None` when the version declares none
    pub fn from_crd(crd: &CustomResourceDefinition, version: &str) -> Option<Self> {
        let columns = crd
            .spec
            .versions
            .iter()
            .find(|v| v.name == version)?
            .additional_printer_columns
            .clone()
            .filter(|columns| !columns.is_empty())?;
        Some(Self {
            kind: crd.spec.names.kind.clone(),
            columns,
        })
    }

    pub(super) fn columns(&self) -> Vec<TableColumnDefinition> {
        let declared = self.columns.iter().map(|c| {
            // dates are rendered as ages
            let type_ = if c.type_ == "date" { "string" } else { &c.type_ };
            let mut column = TableColumnDefinition::typed(&c.name, type_, c.description.as_deref().unwrap_or_default());
            column.format = c.format.clone().unwrap_or_default();
            column.priority = c.priority.unwrap_or_default();
            column
        });
        std::iter::once(name_column())
            .chain(declared)
            .chain(std::iter::once(age_column()))
            .collect()
    }

    pub(super) fn row(&self, obj: &DynamicObject, now: Timestamp) -> Result<TableRow> {
        let mut cells = vec![name_cell(obj)];
        for column in &self.columns {
            cells.push(self.cell(obj, column, now)?);
        }
        cells.push(age_cell(obj, now));
        Ok(TableRow {
            cells,
            ..TableRow::default()
        })
    }

    fn cell(&self, obj: &DynamicObject, column: &CustomResourceColumnDefinition, now: Timestamp) -> Result<Value> {
        let path = format!("${}", column.json_path.trim_matches(|c| c == '{' || c == '}'));
        let found = jsonpath_select(&obj.data, &path).map_err(|e| Error::Table {
            kind: self.kind.clone(),
            reason: format!("column {:?} has unusable jsonPath {:?}: {e}", column.name, column.json_path),
        })?;
        let Some(value) = found.first() else {
            return Ok(Value::Null);
        };
        Ok(typed_cell(&column.type_, value, now))
    }
}

fn typed_cell(type_: &str, value: &Value, now: Timestamp) -> Value {
    match type_ {
        "integer" => value
            .as_i64()
            .map(Value::from)
            .or_else(|| value.as_f64().map(|f| Value::from(f as i64)))
            .unwrap_or(Value::Null),
        "number" => value.as_f64().map(Value::from).unwrap_or(Value::Null),
        "boolean" => value.as_bool().map(Value::from).unwrap_or(Value::Null),
        "date" => match value.as_str() {
            Some(raw) => duration::since(duration::parse_timestamp(Some(raw)), now).into(),
            None => Value::Null,
        },
        _ => match value {
            Value::String(s) => Value::String(s.clone()),
            Value::Null => Value::Null,
            other => Value::String(other.to_string()),
        },
    }
}
