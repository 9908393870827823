//! cloudfile - client-side file controller
//!
//! Uploads local data to a REST file endpoint, downloads remote files on
//! demand, and keeps a local disk cache so content is transferred once.

pub mod cache;
pub mod config;
pub mod file;
pub mod rest;

pub use cache::FileCache;
pub use config::{ClientConfig, ConfigError, RestEndpoint};
pub use file::{FileController, FileError, FileState};
pub use rest::{HttpTransport, ProgressCallback, RestError, TransportProvider};
pub use tokio_util::sync::CancellationToken;
