//! Serves a static dump of cluster manifests as a read-only Kubernetes API.
//!
//! Startup walks the dump once to build a [`DumpIndex`](index::DumpIndex); requests are then
//! resolved against the files on disk by the [`router`]. Discovery, get, list, selectors,
//! table output, watch, pod logs and self subject access reviews are supported.
//!
//! ```no_run
//! use std::sync::Arc;
//! use kas_server::{config::{PrinterOptions, ShortNames}, index::DumpIndex, router};
//!
//! # async fn wrapper() -> Result<(), Box<dyn std::error::Error>> {
//! let index = DumpIndex::build("/tmp/must-gather", &ShortNames::default()).await?;
//! let app = router::router(Arc::new(router::AppState::new(index, PrinterOptions::default())));
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

pub mod aggregate;
pub mod config;
pub mod discovery;
pub mod filter;
pub mod index;
pub mod logs;
pub mod printers;
pub mod reader;
pub mod router;

mod error;
pub use error::{Error, Errors};

#[cfg(test)] mod testing;

/// Convient alias for `Result<T, Error>`
pub type Result<T, E = Error> = std::result::Result<T, E>;
