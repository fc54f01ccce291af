//! Encodes information about memory mapped peripherals, their registers and bit fields.

mod addr;
mod group;
mod register;

// Anything that's part of the public API of the submodules is also part of the public API of model
pub use addr::*;
pub use group::*;
pub use register::*;

pub use crate::codec::Format;
