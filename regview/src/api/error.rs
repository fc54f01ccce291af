use thiserror::Error;

use crate::error::{ConfigError, DocumentError};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("description document could not be read completely")]
    Document(#[from] DocumentError),
    #[error("invalid configuration")]
    Config(#[from] ConfigError),
    #[error("zero peripherals were read, either the file doesn't have any peripheral definitions, or they were all ignored by current filters")]
    ZeroEntries,
}
