//! Methods for reading files

use std::{io, path};

use fs_err as fs;

use crate::error::DocumentError;

/// Opens the description document at `path` for streaming
///
/// # Errors
///
/// The path does not exist or the file cannot be opened
pub(crate) fn open_document(path: &path::Path) -> Result<io::BufReader<fs::File>, DocumentError> {
    Ok(io::BufReader::new(fs::File::open(path)?))
}
