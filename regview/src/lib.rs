//! Regview --- Browse and edit the memory-mapped registers of a live target, as described by a
//! CMSIS-SVD file.

// Export full API at crate root
pub use api::*;

pub use change::ModelEvent;
pub use codec::{extract_bits, format_value, mask, parse_value};
pub use config::{LoadConfig, ENV_EXCLUDE_PERIPHERALS, ENV_INCLUDE_PERIPHERALS};
pub use device::{report_channel, ChannelDevice, Detached, DeviceLink, DeviceReport, DeviceRequest};
pub use error::{AddrOverflowError, ConfigError, DocumentError, EditError, ModelError, ParseError};
pub use filtering::{Filters, ItemFilter};
pub use model::{Access, AddrRepr, Field, Format, Group, Register, RegisterValue};
pub use session::RegisterModel;
pub use to_json::groups_to_json;
pub use view::{EntityKey, FieldKey, GroupEntry, RegisterKey, Row};

mod api;
mod change;
mod codec;
mod config;
mod device;
mod error;
mod filtering;
mod frontend;
mod model;
mod session;
mod to_json;
mod util;
mod view;
