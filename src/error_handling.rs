//! Error taxonomy shared by every layer of the service.
pub mod types;

pub use types::{ConfigError, ServiceError, StorageError, ValidationError, WebError};
