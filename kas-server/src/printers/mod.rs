//! Rendering of objects as `meta.k8s.io` tables.
//!
//! A [`TableConvertor`] is resolved once per request from the resource being served:
//! a built-in printer for a fixed set of well-known kinds, else the printer columns a
//! matching CRD declares for the requested version, else plain `Name` and `Age`.
//! Every row carries a metadata-only copy of its source object.
use std::collections::HashMap;

use jiff::Timestamp;
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kas_core::{duration, ApiResource, DynamicList, DynamicObject, Table, TableColumnDefinition, TableRow};

use crate::{config::PrinterOptions, Result};

mod builtin;
mod crd;

pub use builtin::Builtin;
pub use crd::CustomColumns;

/// Table version used when the client does not ask for one
pub const DEFAULT_TABLE_VERSION: &str = "v1";

/// Pick the table version out of an `Accept` header, if it asks for a table at all
///
/// `application/json;as=Table;v=v1;g=meta.k8s.io` yields `Some("v1")`.
pub fn requested_table_version(accept: &str) -> Option<String> {
    if !accept.contains("as=Table") {
        return None;
    }
    let version = accept
        .split(';')
        .map(str::trim)
        .find_map(|param| param.strip_prefix("v="))
        .filter(|v| !v.is_empty())
        .unwrap_or(DEFAULT_TABLE_VERSION);
    Some(version.to_string())
}

/// How rows of one resource are produced
#[derive(Debug, Clone)]
pub enum Printer {
    /// A fixed per-kind printer
    Builtin(Builtin),
    /// Columns declared by a CRD
    Custom(CustomColumns),
    /// Name and Age only
    Default,
}

impl Printer {
    /// Resolve the printer for a resource served at `resource.version`
    pub fn resolve(resource: &ApiResource, crds: &HashMap<String, CustomResourceDefinition>) -> Self {
        if let Some(builtin) = Builtin::for_kind(&resource.group, &resource.kind) {
            return Printer::Builtin(builtin);
        }
        let key = format!("{}.{}", resource.plural, resource.group);
        if let Some(columns) = crds
            .get(&key)
            .and_then(|crd| CustomColumns::from_crd(crd, &resource.version))
        {
            return Printer::Custom(columns);
        }
        Printer::Default
    }

    fn columns(&self) -> Vec<TableColumnDefinition> {
        match self {
            Printer::Builtin(builtin) => builtin.columns(),
            Printer::Custom(custom) => custom.columns(),
            Printer::Default => vec![name_column(), age_column()],
        }
    }

    fn cells(&self, obj: &DynamicObject, now: Timestamp) -> Result<TableRow> {
        match self {
            Printer::Builtin(builtin) => Ok(builtin.row(obj, now)),
            Printer::Custom(custom) => custom.row(obj, now),
            Printer::Default => Ok(TableRow {
                cells: vec![name_cell(obj), age_cell(obj, now)],
                ..TableRow::default()
            }),
        }
    }
}

/// Converts objects of one resource into tables
#[derive(Debug, Clone)]
pub struct TableConvertor {
    resource: ApiResource,
    printer: Printer,
    options: PrinterOptions,
}

impl TableConvertor {
    /// Build the convertor for `resource`
    pub fn new(
        resource: &ApiResource,
        crds: &HashMap<String, CustomResourceDefinition>,
        options: PrinterOptions,
    ) -> Self {
        let printer = Printer::resolve(resource, crds);
        tracing::trace!(resource = %resource.plural, ?printer, "resolved table printer");
        Self {
            resource: resource.clone(),
            printer,
            options,
        }
    }

    /// The printer in use
    pub fn printer(&self) -> &Printer {
        &self.printer
    }

    /// One row per list item, in list order
    pub fn convert_list(&self, list: &DynamicList, version: &str, now: Timestamp) -> Result<Table> {
        self.convert(list.items.iter(), version, now)
    }

    /// A single row table
    pub fn convert_object(&self, obj: &DynamicObject, version: &str, now: Timestamp) -> Result<Table> {
        self.convert(std::iter::once(obj), version, now)
    }

    fn convert<'a>(
        &self,
        objects: impl Iterator<Item = &'a DynamicObject>,
        version: &str,
        now: Timestamp,
    ) -> Result<Table> {
        let columns = self.printer.columns();
        let shown: Vec<bool> = columns
            .iter()
            .map(|c| self.options.wide || c.priority == 0)
            .collect();

        let mut table = Table::new(
            version,
            columns
                .into_iter()
                .zip(&shown)
                .filter_map(|(c, show)| show.then_some(c))
                .collect(),
        );
        let types = self.resource_types();
        for obj in objects {
            let mut row = self.printer.cells(obj, now)?;
            if !self.options.wide {
                row.cells = row
                    .cells
                    .into_iter()
                    .zip(&shown)
                    .filter_map(|(cell, show)| show.then_some(cell))
                    .collect();
            }
            let mut projection = DynamicObject::from_value(obj.metadata_projection());
            projection.default_types(&types);
            row.object = Some(projection.data);
            table.rows.push(row);
        }
        Ok(table)
    }

    fn resource_types(&self) -> kas_core::TypeMeta {
        kas_core::TypeMeta::new(self.resource.api_version.clone(), self.resource.kind.clone())
    }
}

pub(crate) fn name_column() -> TableColumnDefinition {
    TableColumnDefinition::string(
        "Name",
        "Name must be unique within a namespace. Is required when creating resources, although some resources may \
         allow a client to request the generation of an appropriate name automatically. Name is primarily intended \
         for creation idempotence and configuration definition. Cannot be updated.",
    )
    .format("name")
}

pub(crate) fn age_column() -> TableColumnDefinition {
    TableColumnDefinition::string(
        "Age",
        "CreationTimestamp is a timestamp representing the server time when this object was created. It is not \
         guaranteed to be set in happens-before order across separate operations. Clients may not set this value. \
         It is represented in RFC3339 form and is in UTC.",
    )
}

pub(crate) fn name_cell(obj: &DynamicObject) -> serde_json::Value {
    obj.name().unwrap_or_default().into()
}

pub(crate) fn age_cell(obj: &DynamicObject, now: Timestamp) -> serde_json::Value {
    duration::since(
        duration::parse_timestamp(obj.lookup_str("metadata.creationTimestamp")),
        now,
    )
    .into()
}
