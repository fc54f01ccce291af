use std::io;

use thiserror::Error;

use crate::{codec::Format, model::Access, view::EntityKey};

/// Text entered for a value does not match the selected numeric format
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("{text:?} is not a valid {format} value")]
    InvalidFormat { text: String, format: Format },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("address of {id} overflows: base {base:#x} + offset {offset:#x}")]
pub struct AddrOverflowError {
    pub(crate) id: String,
    pub(crate) base: u64,
    pub(crate) offset: u64,
}

/// Error that happened while reading a description document
///
/// These never reach the caller of [`crate::load_groups`]: an unreadable document is treated as a
/// document without peripherals.
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("cannot read description file")]
    Unreadable(#[from] io::Error),
    #[error("malformed XML at byte {pos}: {msg}")]
    Xml { pos: usize, msg: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("no peripheral named {0:?}")]
    UnknownGroup(String),
    #[error("no entity at {0:?}")]
    UnknownEntity(EntityKey),
    #[error("{0:?} has no display format")]
    NoFormat(EntityKey),
}

/// Reasons for rejecting a value edit
///
/// A rejected edit leaves the model untouched and issues no device write.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    #[error("invalid value")]
    InvalidFormat(#[from] ParseError),
    #[error("target is not writable (access: {0})")]
    AccessDenied(Access),
    #[error("value {value:#x} does not fit in {width} bits")]
    ValueTooWide { value: u64, width: u32 },
    #[error("edit target does not exist")]
    UnknownEntity(#[from] ModelError),
    #[error("groups cannot be edited")]
    NotEditable,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid register size {0} bits, must be one of 8, 16, 32 or 64")]
    InvalidRegisterSize(u32),
}
