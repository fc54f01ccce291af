//! Options for loading description documents

use std::env;

use itertools::Itertools;

use crate::{
    error::ConfigError,
    filtering::{Filters, ItemFilter},
};

/// Environment variable listing the only peripherals to load, comma separated
pub const ENV_INCLUDE_PERIPHERALS: &str = "REGVIEW_INCLUDE_PERIPHERALS";
/// Environment variable listing peripherals to leave out, comma separated
pub const ENV_EXCLUDE_PERIPHERALS: &str = "REGVIEW_EXCLUDE_PERIPHERALS";

pub(crate) fn is_valid_bit_count(bit_count: u32) -> bool {
    matches!(bit_count, 8 | 16 | 32 | 64)
}

pub struct LoadConfig {
    /// Register bit-width used when neither a register nor its peripheral declares `size`
    pub(crate) default_register_size: u32,
    pub(crate) filters: Filters,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            default_register_size: 32,
            filters: Filters::all(),
        }
    }
}

impl LoadConfig {
    /// Default configuration with peripheral filters taken from the environment
    ///
    /// See [`ENV_INCLUDE_PERIPHERALS`] and [`ENV_EXCLUDE_PERIPHERALS`].
    #[must_use]
    pub fn from_env() -> Self {
        let include = read_vec_from_env(ENV_INCLUDE_PERIPHERALS, ',');
        let exclude = read_vec_from_env(ENV_EXCLUDE_PERIPHERALS, ',');
        let group_filter = (include.is_some() || exclude.is_some())
            .then(|| ItemFilter::list(include, exclude.unwrap_or_default()));
        Self {
            filters: Filters::from_filters(group_filter, None),
            ..Default::default()
        }
    }

    /// # Errors
    ///
    /// - `bits` is not a supported register width
    pub fn default_register_size(mut self, bits: u32) -> Result<Self, ConfigError> {
        if !is_valid_bit_count(bits) {
            return Err(ConfigError::InvalidRegisterSize(bits));
        }
        self.default_register_size = bits;
        Ok(self)
    }

    #[must_use]
    pub fn filters(mut self, filters: Filters) -> Self {
        self.filters = filters;
        self
    }
}

/// Read an environment variable into a Vec<String>
///
/// # Parameters:
///
/// `var` - The name of the environment variable
/// `sep` - The separator for Vec elements
///
/// Returns Some(`v`) if the variable is present, None otherwise
fn read_vec_from_env(var: &str, sep: char) -> Option<Vec<String>> {
    env::var(var).ok().map(|value| {
        value
            .split(sep)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToOwned::to_owned)
            .collect_vec()
    })
}

#[test]
fn register_size_must_be_a_power_of_two_byte_count() {
    assert!(LoadConfig::default().default_register_size(16).is_ok());
    assert_eq!(
        LoadConfig::default().default_register_size(12).err(),
        Some(ConfigError::InvalidRegisterSize(12))
    );
}
