//! Exposes functionality supported by this crate
mod error;

use std::{io::BufRead, path};

use log::{info, warn};

use crate::{
    config::LoadConfig, error::DocumentError, frontend::svd_stream::SvdReader, model::Group, util,
};

pub use error::ApiError;

fn read_document<R: BufRead>(src: R, config: &LoadConfig) -> (Vec<Group>, Option<DocumentError>) {
    let reader = SvdReader {
        default_register_size: config.default_register_size,
    };
    let (groups, err) = reader.read(src);
    (config.filters.apply(groups), err)
}

fn read_file(path: &path::Path, config: &LoadConfig) -> (Vec<Group>, Option<DocumentError>) {
    match util::open_document(path) {
        Ok(src) => read_document(src, config),
        Err(e) => (Vec::new(), Some(e)),
    }
}

/// Reads every peripheral described in `src`
///
/// Problems in the document are logged and never fail the read. Peripherals read before the
/// document stopped being well-formed are kept.
pub fn parse_document<R: BufRead>(src: R, config: &LoadConfig) -> Vec<Group> {
    let (groups, err) = read_document(src, config);
    if let Some(e) = err {
        warn!("{e}, keeping {} peripherals read before the error", groups.len());
    }
    groups
}

/// Reads every peripheral described in the file at `path`
///
/// A file that cannot be opened yields no peripherals, same as a file that describes none.
pub fn load_groups(path: &path::Path, config: &LoadConfig) -> Vec<Group> {
    let (groups, err) = read_file(path, config);
    match err {
        Some(e @ DocumentError::Unreadable(_)) => {
            warn!("{e} {}, no peripherals available", path.display());
        }
        Some(e) => {
            warn!(
                "{e} in {}, keeping {} peripherals read before the error",
                path.display(),
                groups.len()
            );
        }
        None => {}
    }
    groups
}

/// Run the parser on the input without doing anything
///
/// Good for checking whether a description file can be read completely. Returns the number of
/// peripherals found.
///
/// # Errors
///
/// The file cannot be read, is not well-formed, or yields zero peripherals with the current
/// filters.
pub fn dry_run(path: &path::Path, config: &LoadConfig) -> Result<usize, ApiError> {
    let (groups, err) = read_file(path, config);
    if let Some(e) = err {
        return Err(e.into());
    }
    if groups.is_empty() {
        return Err(ApiError::ZeroEntries);
    }
    info!("{} can be read completely", path.display());
    Ok(groups.len())
}

/// Names of all peripherals in `groups` with their register counts, in document order
pub fn list_groups(groups: &[Group]) -> Vec<(String, usize)> {
    groups
        .iter()
        .map(|g| (g.name.clone(), g.registers.len()))
        .collect()
}
