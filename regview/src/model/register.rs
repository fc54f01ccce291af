//! `Register` is the main primitive of the model. It holds the metadata parsed for a register
//! together with the values last seen on the target.

use std::{fmt, str};

use crate::{
    codec::{self, Format},
    error::{AddrOverflowError, ParseError},
    model::AddrRepr,
};

/// Software access rights e.g., read-only or read-write, as defined by
/// CMSIS-SVD `accessType`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Access {
    /// read-only
    ReadOnly,
    /// write-only
    WriteOnly,
    /// read-write
    ReadWrite,
    /// Not given in input, or given as something other than the above
    #[default]
    Unknown,
}

impl Access {
    /// Decode CMSIS-SVD `accessType` text
    ///
    /// Anything but `read-only`, `write-only` or `read-write` is [`Access::Unknown`].
    #[must_use]
    pub fn decode(s: &str) -> Self {
        match s.trim() {
            "read-only" => Self::ReadOnly,
            "write-only" => Self::WriteOnly,
            "read-write" => Self::ReadWrite,
            _ => Self::Unknown,
        }
    }

    /// Short label for tabular display
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::ReadOnly => "RO",
            Self::WriteOnly => "WO",
            Self::ReadWrite => "RW",
            Self::Unknown => "N/A",
        }
    }

    /// Whether a value with this access may be edited by the user
    #[must_use]
    pub const fn is_write(&self) -> bool {
        matches!(self, Self::ReadWrite | Self::WriteOnly)
    }
}

impl fmt::Display for Access {
    /// Convert into CMSIS-SVD `accessType` string
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ReadOnly => "read-only",
            Self::WriteOnly => "write-only",
            Self::ReadWrite => "read-write",
            Self::Unknown => "unknown",
        })
    }
}

/// Register value, compared bitwise
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct RegisterValue(pub u64);

impl RegisterValue {
    /// Parse `text` written in `fmt`
    ///
    /// # Errors
    ///
    /// See [`codec::parse_value`].
    pub fn from_str_with(text: &str, fmt: Format) -> Result<Self, ParseError> {
        codec::parse_value(text, fmt).map(Self)
    }

    /// Render for a register `size` bits wide
    #[must_use]
    pub fn to_string_with(self, size: u32, fmt: Format) -> String {
        codec::format_value(self.0, size, fmt)
    }
}

impl From<u64> for RegisterValue {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<RegisterValue> for u64 {
    fn from(value: RegisterValue) -> Self {
        value.0
    }
}

impl fmt::LowerHex for RegisterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

/// A named range of bits within a register
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub description: String,
    /// Position of the least significant bit
    pub bit_offset: u32,
    pub bit_width: u32,
    pub access: Access,
    pub format: Format,
}

impl Default for Field {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            bit_offset: 0,
            bit_width: 1,
            access: Access::Unknown,
            format: Format::default(),
        }
    }
}

impl Field {
    #[must_use]
    pub fn mask(&self) -> u64 {
        codec::mask(self.bit_offset, self.bit_width)
    }

    /// This field's value within a full register value
    #[must_use]
    pub fn value(&self, register_value: RegisterValue) -> u64 {
        codec::extract_bits(register_value.0, self.bit_offset, self.bit_width)
    }

    /// Field value rendered in the field's own format
    #[must_use]
    pub fn value_string(&self, register_value: RegisterValue) -> String {
        codec::format_value(self.value(register_value), self.bit_width, self.format)
    }

    /// Bit range as `[msb..lsb]`
    #[must_use]
    pub fn bit_range_string(&self) -> String {
        let lsb = self.bit_offset;
        let msb = self
            .bit_offset
            .saturating_add(self.bit_width)
            .saturating_sub(1);
        format!("[{msb}..{lsb}]")
    }

    /// `register_value` with this field's bits replaced by `value`
    ///
    /// Returns `None` if `value` has bits set beyond the field width.
    #[must_use]
    pub fn insert(&self, register_value: RegisterValue, value: u64) -> Option<RegisterValue> {
        if value & !codec::mask(0, self.bit_width) != 0 {
            return None;
        }
        let shifted = value.checked_shl(self.bit_offset).unwrap_or(0);
        Some(RegisterValue(
            (register_value.0 & !self.mask()) | (shifted & self.mask()),
        ))
    }
}

/// Represents a single memory-mapped I/O register.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Register {
    pub name: String,
    pub display_name: String,
    pub description: String,
    /// Offset from the owning peripheral's base address
    pub address_offset: u64,
    /// Register value bit-width
    pub size: u32,
    pub access: Access,
    pub reset_value: RegisterValue,
    /// Last value reported by the target, or the reset value before the first report
    pub current_value: RegisterValue,
    /// Value immediately before the most recent update
    pub previous_value: RegisterValue,
    pub format: Format,
    /// Bit fields in document order
    pub fields: Vec<Field>,
}

impl Default for Register {
    fn default() -> Self {
        Self {
            name: String::new(),
            display_name: String::new(),
            description: String::new(),
            address_offset: 0,
            size: 32,
            access: Access::Unknown,
            reset_value: RegisterValue::default(),
            current_value: RegisterValue::default(),
            previous_value: RegisterValue::default(),
            format: Format::default(),
            fields: Vec::new(),
        }
    }
}

impl Register {
    pub fn addr(&self, base_address: u64) -> AddrRepr {
        AddrRepr::new(base_address, self.address_offset)
    }

    /// Get register's absolute memory address
    ///
    /// # Errors
    ///
    /// Address overflows
    pub fn full_addr(&self, base_address: u64) -> Result<u64, AddrOverflowError> {
        self.addr(base_address).full(&self.name)
    }

    /// Absolute address as `0x...`, without padding
    #[must_use]
    pub fn address_string(&self, base_address: u64) -> String {
        format!("{:#x}", base_address.wrapping_add(self.address_offset))
    }

    #[must_use]
    pub fn current_value_string(&self) -> String {
        self.current_value.to_string_with(self.size, self.format)
    }

    #[must_use]
    pub fn previous_value_string(&self) -> String {
        self.previous_value.to_string_with(self.size, self.format)
    }

    #[must_use]
    pub fn reset_value_string(&self) -> String {
        self.reset_value.to_string_with(self.size, self.format)
    }

    /// Set the reset value and start tracking from it
    pub(crate) fn reset_to(&mut self, value: RegisterValue) {
        self.reset_value = value;
        self.current_value = value;
        self.previous_value = value;
    }
}
