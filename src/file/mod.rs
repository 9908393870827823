//! File descriptors and the save/fetch controller

pub mod controller;
pub mod errors;
pub mod state;

pub use controller::FileController;
pub use errors::FileError;
pub use state::{FileState, FileStateBuilder, DEFAULT_MIME_TYPE};
