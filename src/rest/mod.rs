//! REST commands and HTTP transports

pub mod client;
pub mod command;
pub mod errors;
pub mod provider;
pub mod types;

#[cfg(test)]
pub(crate) mod mock;

pub use client::{HttpTransport, ReqwestTransport};
pub use command::{BinaryRequest, Payload, RestFileCommand};
pub use errors::RestError;
pub use provider::TransportProvider;
pub use types::*;
