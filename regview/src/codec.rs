//! Conversions between register values and their textual representations

use lazy_static::lazy_static;
use regex::Regex;
use strum::{Display, EnumIter};

use crate::error::ParseError;

/// Display format of a register or field value
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum Format {
    #[default]
    #[strum(serialize = "hexadecimal")]
    Hexadecimal,
    #[strum(serialize = "decimal")]
    Decimal,
    #[strum(serialize = "octal")]
    Octal,
    #[strum(serialize = "binary")]
    Binary,
}

impl Format {
    const fn radix(self) -> u32 {
        match self {
            Self::Hexadecimal => 16,
            Self::Decimal => 10,
            Self::Octal => 8,
            Self::Binary => 2,
        }
    }
}

/// Renders `value` in `fmt`, zero-padded to a digit count derived from `bit_width`
///
/// Widths above 64 bits are padded as 64 bits.
///
/// * hexadecimal: `0x` followed by at least `bit_width / 4` digits
/// * decimal: no prefix, no padding
/// * octal: `0` followed by at least `bit_width / 2` digits
/// * binary: `0b` followed by at least `bit_width` digits
#[must_use]
pub fn format_value(value: u64, bit_width: u32, fmt: Format) -> String {
    let bits = bit_width.min(u64::BITS) as usize;
    match fmt {
        Format::Hexadecimal => {
            let width = bits / 4;
            format!("0x{value:0width$x}")
        }
        Format::Decimal => value.to_string(),
        Format::Octal => {
            let width = bits / 2;
            format!("0{value:0width$o}")
        }
        Format::Binary => {
            let width = bits;
            format!("0b{value:0width$b}")
        }
    }
}

/// Parses user-entered `text` as a number in `fmt`
///
/// The text must consist of an optional prefix matching the format (`0x`, `0`, `0b`, none for
/// decimal) followed only by digits of that base. Hexadecimal digits are case-insensitive.
///
/// # Errors
///
/// [`ParseError::InvalidFormat`] if the text does not fully match or the number does not fit into
/// 64 bits.
pub fn parse_value(text: &str, fmt: Format) -> Result<u64, ParseError> {
    // Compile Regexes only once as recommended by the documentation of the Regex crate
    lazy_static! {
        static ref HEX_RE: Regex = Regex::new(r"^(?:0[xX])?([[:xdigit:]]+)$").unwrap();
        static ref DEC_RE: Regex = Regex::new(r"^([[:digit:]]+)$").unwrap();
        static ref OCT_RE: Regex = Regex::new(r"^0?([0-7]+)$").unwrap();
        static ref BIN_RE: Regex = Regex::new(r"^(?:0[bB])?([01]+)$").unwrap();
    }

    let re: &Regex = match fmt {
        Format::Hexadecimal => &HEX_RE,
        Format::Decimal => &DEC_RE,
        Format::Octal => &OCT_RE,
        Format::Binary => &BIN_RE,
    };
    let invalid = || ParseError::InvalidFormat {
        text: text.to_owned(),
        format: fmt,
    };

    let captures = re.captures(text).ok_or_else(invalid)?;
    u64::from_str_radix(&captures[1], fmt.radix()).map_err(|_| invalid())
}

/// Bit mask covering `bit_width` bits starting from `bit_offset`
///
/// Bits that would land beyond bit 63 are dropped.
#[must_use]
pub fn mask(bit_offset: u32, bit_width: u32) -> u64 {
    let ones = u64::MAX
        .checked_shr(u64::BITS.saturating_sub(bit_width))
        .unwrap_or(0);
    ones.checked_shl(bit_offset).unwrap_or(0)
}

/// Value of the bit field at `bit_offset` with `bit_width` bits within `register_value`
#[must_use]
pub fn extract_bits(register_value: u64, bit_offset: u32, bit_width: u32) -> u64 {
    (register_value & mask(bit_offset, bit_width))
        .checked_shr(bit_offset)
        .unwrap_or(0)
}

/// Decodes a number found in a description document
///
/// Base-10 is tried first; on failure the text is read as base-16, with or without a `0x`
/// prefix. Text that is neither yields `None`.
pub(crate) fn decode_numeric(text: &str) -> Option<u64> {
    let text = text.trim();
    if let Ok(value) = text.parse::<u64>() {
        return Some(value);
    }
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    u64::from_str_radix(digits, 16).ok()
}
