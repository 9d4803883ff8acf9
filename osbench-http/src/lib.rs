#![forbid(unsafe_code)]

mod client;
mod config;
mod error;
mod reader;
mod storage;

pub use client::HttpClient;
pub use config::{Credentials, DEFAULT_CONNECT_TIMEOUT, HttpStorageConfig};
pub use error::{Error, HttpStorageErrorKind, Result};
pub use reader::BodyReader;
pub use storage::HttpStorage;
