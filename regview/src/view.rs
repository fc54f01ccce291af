//! What a presentation layer needs to show the model as a tree of rows

use crate::model::{Field, Group, Register};

/// Identifies a register by its position in the model
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegisterKey {
    pub group: usize,
    pub register: usize,
}

/// Identifies a field by its position in the model
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldKey {
    pub register: RegisterKey,
    pub field: usize,
}

/// Any addressable entity of the model
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKey {
    Group(usize),
    Register(RegisterKey),
    Field(FieldKey),
}

impl EntityKey {
    /// Nesting level in the tree: groups at 0, registers at 1, fields at 2
    #[must_use]
    pub const fn depth(&self) -> usize {
        match self {
            Self::Group(_) => 0,
            Self::Register(_) => 1,
            Self::Field(_) => 2,
        }
    }
}

impl From<RegisterKey> for EntityKey {
    fn from(value: RegisterKey) -> Self {
        Self::Register(value)
    }
}

impl From<FieldKey> for EntityKey {
    fn from(value: FieldKey) -> Self {
        Self::Field(value)
    }
}

/// One displayable line of the register tree
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Row {
    pub key: EntityKey,
    pub name: String,
    /// Current value in the entity's display format
    pub value: String,
    /// `RO`, `WO`, `RW` or `N/A`
    pub access: &'static str,
    /// Tooltip for the name column
    pub tooltip: String,
    /// Tooltip for the value column
    pub value_tooltip: String,
    pub changed: bool,
    /// Whether the value may be edited
    pub editable: bool,
}

impl Row {
    pub(crate) fn for_register(group: &Group, key: RegisterKey, reg: &Register) -> Self {
        Self {
            key: key.into(),
            name: reg.name.clone(),
            value: reg.current_value_string(),
            access: reg.access.label(),
            tooltip: format!(
                "{} / {}\n{}\n{} @ {}, {}",
                group.name,
                reg.name,
                reg.description,
                reg.access.label(),
                reg.address_string(group.base_address),
                reg.size
            ),
            value_tooltip: format!(
                "Current value: {}\nPrevious value: {}\nReset value: {}",
                reg.current_value_string(),
                reg.previous_value_string(),
                reg.reset_value_string()
            ),
            changed: reg.is_changed(),
            editable: reg.access.is_write(),
        }
    }

    pub(crate) fn for_field(key: FieldKey, reg: &Register, field: &Field) -> Self {
        let value = field.value_string(reg.current_value);
        Self {
            key: key.into(),
            name: field.name.clone(),
            value_tooltip: format!("Value: {value}"),
            value,
            access: field.access.label(),
            tooltip: format!(
                "{}.{}\n{}\nBits: {}, {}",
                reg.name,
                field.name,
                field.description,
                field.bit_range_string(),
                field.bit_width
            ),
            changed: reg.is_field_changed(field),
            editable: field.access.is_write(),
        }
    }
}

/// Entry of a peripheral chooser
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupEntry {
    pub name: String,
    /// `NAME: description`
    pub label: String,
    pub active: bool,
}

impl From<&Group> for GroupEntry {
    fn from(group: &Group) -> Self {
        Self {
            name: group.name.clone(),
            label: group.menu_label(),
            active: group.active,
        }
    }
}
