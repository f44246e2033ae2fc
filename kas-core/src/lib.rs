//! Types shared by the static API server that need no I/O
//!
//! Everything read from a dump is handled as a [`DynamicObject`] or [`DynamicList`];
//! the rest of this crate describes how those documents are discovered ([`discovery`]),
//! selected ([`labels`]) and rendered ([`table`], [`watch`]).

pub mod discovery;
pub use discovery::ApiResource;

pub mod dynamic;
pub use dynamic::{DynamicList, DynamicObject};

pub mod duration;

pub mod gvk;
pub use gvk::GroupVersion;

pub mod labels;
pub use labels::Selector;

pub mod metadata;
pub use metadata::TypeMeta;

pub mod table;
pub use table::{Table, TableColumnDefinition, TableRow};

pub mod watch;
pub use watch::WatchEvent;

mod error;
pub use error::Error;

/// Convient alias for `Result<T, Error>`
pub type Result<T, E = Error> = std::result::Result<T, E>;
