use crate::model::{Access, Register};

/// A peripheral: named collection of registers sharing a base address
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Group {
    pub name: String,
    /// Taken from `groupName` in CMSIS-SVD
    pub display_name: String,
    pub description: String,
    pub base_address: u64,
    /// Default register bit-width
    pub size: u32,
    pub access: Access,
    /// Whether this group is currently materialized for a target
    pub active: bool,
    /// Registers in document order
    pub registers: Vec<Register>,
}

impl Group {
    /// Independent copy for a peripheral declared with `derivedFrom`
    ///
    /// Every register and field is duplicated, so later edits to either group do not affect the
    /// other. The copy starts out inactive.
    #[must_use]
    pub fn derive(&self) -> Self {
        Self {
            active: false,
            ..self.clone()
        }
    }

    /// Label for a group chooser, e.g. `UART0: Universal asynchronous receiver`
    #[must_use]
    pub fn menu_label(&self) -> String {
        format!("{}: {}", self.name, self.description)
    }

    pub fn find_register(&self, name: &str) -> Option<(usize, &Register)> {
        self.registers.iter().enumerate().find(|(_, r)| r.name == name)
    }
}

#[test]
fn derived_group_does_not_alias_base() {
    let mut base = Group {
        name: "UART0".to_owned(),
        active: true,
        registers: vec![Register {
            name: "CR".to_owned(),
            ..Default::default()
        }],
        ..Default::default()
    };
    let mut derived = base.derive();
    assert!(!derived.active);

    derived.registers[0].current_value = crate::model::RegisterValue(7);
    base.registers[0].name = "CTRL".to_owned();
    assert_eq!(base.registers[0].current_value, crate::model::RegisterValue(0));
    assert_eq!(derived.registers[0].name, "CR");
}
