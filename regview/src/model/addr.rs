use std::fmt;

use crate::error::AddrOverflowError;

/// Address of a register as its peripheral base and the register's offset from that base
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AddrRepr {
    base: u64,
    offset: u64,
}

impl AddrRepr {
    pub const fn new(base: u64, offset: u64) -> Self {
        Self { base, offset }
    }

    pub const fn base(&self) -> u64 {
        self.base
    }

    pub const fn offset(&self) -> u64 {
        self.offset
    }

    /// Absolute memory address, `base + offset`
    ///
    /// # Arguments
    ///
    /// * `id` - identifier of the addressed item, used in the error
    ///
    /// # Errors
    ///
    /// The sum does not fit in 64 bits
    pub fn full(&self, id: &str) -> Result<u64, AddrOverflowError> {
        self.base
            .checked_add(self.offset)
            .ok_or_else(|| AddrOverflowError {
                id: id.to_owned(),
                base: self.base,
                offset: self.offset,
            })
    }
}

impl fmt::Display for AddrRepr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{ base: {:#x}, offset: {:#x} }}",
            self.base, self.offset
        )
    }
}

#[test]
fn full_addr_adds_offset_to_base() {
    assert_eq!(
        AddrRepr::new(0x4000_0000, 0x10).full("UART0-DR"),
        Ok(0x4000_0010)
    );
    assert_eq!(
        AddrRepr::new(u64::MAX, 1).full("X-Y"),
        Err(AddrOverflowError {
            id: "X-Y".to_owned(),
            base: u64::MAX,
            offset: 1
        })
    );
}

#[test]
fn addr_repr_displays_components() {
    assert_eq!(
        AddrRepr::new(0x4000_1000, 0x4).to_string(),
        "{ base: 0x40001000, offset: 0x4 }"
    );
}
