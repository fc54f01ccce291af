//! Live register model bound to a target device
//!
//! At most one peripheral is active at a time. Activating one deactivates all others, indexes the
//! registers of the new one by absolute address and asks the device for fresh values. Values
//! reported for addresses outside the index are dropped, which is also what happens to late
//! answers for a peripheral that was deactivated in the meantime.
//!
//! The model has a single owner. Reports produced on another thread reach it through a channel,
//! see [`RegisterModel::apply_reports`].

use std::{
    collections::{hash_map::Entry, HashMap},
    sync::mpsc::Receiver,
};

use itertools::Itertools;
use log::{debug, info, trace, warn};

use crate::{
    change::{ChangeTracker, ModelEvent},
    codec::{self, Format},
    device::{DeviceLink, DeviceReport},
    error::{EditError, ModelError},
    model::{Field, Group, Register, RegisterValue},
    view::{EntityKey, FieldKey, GroupEntry, RegisterKey, Row},
};

pub struct RegisterModel<D: DeviceLink> {
    groups: Vec<Group>,
    /// Index of the active group in `groups`
    active: Option<usize>,
    /// Absolute address to register of the active group
    index: HashMap<u64, RegisterKey>,
    device: D,
    tracker: ChangeTracker,
}

impl<D: DeviceLink> RegisterModel<D> {
    pub fn new(groups: Vec<Group>, device: D) -> Self {
        Self {
            groups,
            active: None,
            index: HashMap::new(),
            device,
            tracker: ChangeTracker::default(),
        }
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Entries for choosing the peripheral to activate, in document order
    pub fn group_entries(&self) -> Vec<GroupEntry> {
        self.groups.iter().map(GroupEntry::from).collect()
    }

    /// Replaces all peripherals, e.g. after a different description file was selected
    pub fn set_groups(&mut self, groups: Vec<Group>) {
        self.clear_active();
        self.groups = groups;
        self.tracker.notify(ModelEvent::Rebuilt);
    }

    pub fn active_group(&self) -> Option<&Group> {
        self.active.and_then(|idx| self.groups.get(idx))
    }

    /// Receive a [`ModelEvent`] for every change of the model from now on
    pub fn subscribe(&mut self) -> Receiver<ModelEvent> {
        self.tracker.subscribe()
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    /// Makes the peripheral called `name` the only active one
    ///
    /// # Errors
    ///
    /// No peripheral is called `name`. The previously active peripheral, if any, stays active.
    pub fn activate(&mut self, name: &str) -> Result<(), ModelError> {
        let Some(group_idx) = self.groups.iter().position(|g| g.name == name) else {
            warn!("cannot activate unknown peripheral {name:?}");
            return Err(ModelError::UnknownGroup(name.to_owned()));
        };

        self.clear_active();
        self.groups[group_idx].active = true;
        self.active = Some(group_idx);

        let group = &self.groups[group_idx];
        let mut addresses = Vec::with_capacity(group.registers.len());
        for (reg_idx, reg) in group.registers.iter().enumerate() {
            let key = RegisterKey {
                group: group_idx,
                register: reg_idx,
            };
            let address = match reg.full_addr(group.base_address) {
                Ok(address) => address,
                Err(e) => {
                    warn!("{e}, register is not tracked");
                    continue;
                }
            };
            match self.index.entry(address) {
                Entry::Vacant(entry) => {
                    entry.insert(key);
                    addresses.push(address);
                }
                Entry::Occupied(entry) => {
                    let other = &group.registers[entry.get().register];
                    warn!(
                        "Address for register {reg}@{address:#x} is already registered for another register {other}. {reg} is ignored.",
                        reg = reg.name,
                        other = other.name
                    );
                }
            }
        }

        info!(
            "Activated peripheral {name} with {} registers at {:#x}",
            addresses.len(),
            group.base_address
        );
        self.tracker.notify(ModelEvent::Rebuilt);
        self.device.request_current_values(&addresses);
        Ok(())
    }

    /// Deactivates every peripheral and forgets the active registers
    pub fn deactivate_all(&mut self) {
        self.clear_active();
        self.tracker.notify(ModelEvent::Rebuilt);
    }

    fn clear_active(&mut self) {
        self.index.clear();
        self.active = None;
        for group in &mut self.groups {
            group.active = false;
        }
    }

    /// Register of the active peripheral at exactly `address`
    pub fn lookup(&self, address: u64) -> Option<&Register> {
        self.lookup_key(address).and_then(|key| self.register(key))
    }

    pub fn lookup_key(&self, address: u64) -> Option<RegisterKey> {
        self.index.get(&address).copied()
    }

    /// Addresses of all registers of the active peripheral, ascending
    pub fn active_addresses(&self) -> Vec<u64> {
        self.index.keys().copied().sorted().collect()
    }

    pub fn register(&self, key: RegisterKey) -> Option<&Register> {
        self.groups.get(key.group)?.registers.get(key.register)
    }

    fn register_mut(&mut self, key: RegisterKey) -> Option<&mut Register> {
        self.groups
            .get_mut(key.group)?
            .registers
            .get_mut(key.register)
    }

    pub fn field(&self, key: FieldKey) -> Option<&Field> {
        self.register(key.register)?.fields.get(key.field)
    }

    /// Resolves `REG` or `REG.FIELD` within the active peripheral
    pub fn find(&self, path: &str) -> Option<EntityKey> {
        let group_idx = self.active?;
        let (reg_name, field_name) = match path.split_once('.') {
            Some((reg, field)) => (reg, Some(field)),
            None => (path, None),
        };
        let (reg_idx, reg) = self.groups[group_idx].find_register(reg_name)?;
        let reg_key = RegisterKey {
            group: group_idx,
            register: reg_idx,
        };
        match field_name {
            None => Some(reg_key.into()),
            Some(field_name) => reg
                .fields
                .iter()
                .position(|f| f.name == field_name)
                .map(|field| {
                    FieldKey {
                        register: reg_key,
                        field,
                    }
                    .into()
                }),
        }
    }

    /// Stores a value reported by the device for `address`
    ///
    /// Returns false, dropping the value, if no active register lives at `address`.
    pub fn apply_update(&mut self, address: u64, value: u64) -> bool {
        let Some(key) = self.lookup_key(address) else {
            debug!("dropping value {value:#x} for untracked address {address:#x}");
            return false;
        };
        self.record(key, RegisterValue(value));
        true
    }

    /// Applies every report waiting in `reports` without blocking
    ///
    /// Returns the number of reports that matched an active register.
    pub fn apply_reports(&mut self, reports: &Receiver<DeviceReport>) -> usize {
        reports
            .try_iter()
            .filter(|report| self.apply_update(report.address, report.value))
            .count()
    }

    fn record(&mut self, key: RegisterKey, value: RegisterValue) {
        let Some(reg) = self.register_mut(key) else {
            return;
        };
        reg.record(value);
        let changed = reg.is_changed();
        trace!("{} = {value:#x} (changed: {changed})", reg.name);
        self.tracker.notify(ModelEvent::Updated { key, changed });
    }

    /// Absolute address of `key` if it is a register of the active peripheral
    fn active_address(&self, key: RegisterKey) -> Option<u64> {
        let group = self.groups.get(key.group).filter(|g| g.active)?;
        let address = group
            .registers
            .get(key.register)?
            .full_addr(group.base_address)
            .ok()?;
        (self.index.get(&address) == Some(&key)).then_some(address)
    }

    /// Sets the value of a register or field from user-entered `text`
    ///
    /// The new value is recorded like a device report and written to the device. For a field,
    /// only the field's bits of the current register value are replaced. Returns the new full
    /// register value.
    ///
    /// # Errors
    ///
    /// The target is not an active register or field, is not writable, or `text` is not a valid
    /// value in `fmt`. The model is left unchanged and nothing is written.
    pub fn edit_value(
        &mut self,
        target: EntityKey,
        text: &str,
        fmt: Format,
    ) -> Result<u64, EditError> {
        let unknown = || ModelError::UnknownEntity(target);
        let (reg_key, value) = match target {
            EntityKey::Group(_) => return Err(EditError::NotEditable),
            EntityKey::Register(key) => {
                let reg = self.register(key).ok_or_else(unknown)?;
                if !reg.access.is_write() {
                    return Err(EditError::AccessDenied(reg.access));
                }
                let value = codec::parse_value(text, fmt)?;
                if value & !codec::mask(0, reg.size) != 0 {
                    return Err(EditError::ValueTooWide {
                        value,
                        width: reg.size,
                    });
                }
                (key, RegisterValue(value))
            }
            EntityKey::Field(key) => {
                let reg = self.register(key.register).ok_or_else(unknown)?;
                let field = reg.fields.get(key.field).ok_or_else(unknown)?;
                if !field.access.is_write() {
                    return Err(EditError::AccessDenied(field.access));
                }
                let value = codec::parse_value(text, fmt)?;
                let full = field
                    .insert(reg.current_value, value)
                    .ok_or(EditError::ValueTooWide {
                        value,
                        width: field.bit_width,
                    })?;
                (key.register, full)
            }
        };
        let address = self.active_address(reg_key).ok_or_else(unknown)?;

        self.record(reg_key, value);
        self.device.write_value(address, value.0);
        Ok(value.0)
    }

    /// Changes the display format of a register or field
    ///
    /// # Errors
    ///
    /// The target does not exist or is a peripheral
    pub fn set_format(&mut self, target: EntityKey, fmt: Format) -> Result<(), ModelError> {
        let unknown = ModelError::UnknownEntity(target);
        let reg_key = match target {
            EntityKey::Group(_) => return Err(ModelError::NoFormat(target)),
            EntityKey::Register(key) => {
                self.register_mut(key).ok_or(unknown)?.format = fmt;
                key
            }
            EntityKey::Field(key) => {
                self.register_mut(key.register)
                    .and_then(|reg| reg.fields.get_mut(key.field))
                    .ok_or(unknown)?
                    .format = fmt;
                key.register
            }
        };
        if self.active_address(reg_key).is_some() {
            let changed = self.register(reg_key).is_some_and(Register::is_changed);
            self.tracker.notify(ModelEvent::Updated {
                key: reg_key,
                changed,
            });
        }
        Ok(())
    }

    /// Rows of the active peripheral: each register followed by its fields
    pub fn rows(&self) -> Vec<Row> {
        let Some(group_idx) = self.active else {
            return Vec::new();
        };
        let group = &self.groups[group_idx];
        let mut rows = Vec::new();
        for (reg_idx, reg) in group.registers.iter().enumerate() {
            let reg_key = RegisterKey {
                group: group_idx,
                register: reg_idx,
            };
            rows.push(Row::for_register(group, reg_key, reg));
            rows.extend(reg.fields.iter().enumerate().map(|(field_idx, field)| {
                let key = FieldKey {
                    register: reg_key,
                    field: field_idx,
                };
                Row::for_field(key, reg, field)
            }));
        }
        rows
    }

    /// Row of a single register or field, for redisplay after an update
    pub fn row(&self, key: EntityKey) -> Option<Row> {
        match key {
            EntityKey::Group(_) => None,
            EntityKey::Register(reg_key) => {
                let group = self.groups.get(reg_key.group)?;
                let reg = group.registers.get(reg_key.register)?;
                Some(Row::for_register(group, reg_key, reg))
            }
            EntityKey::Field(field_key) => {
                let reg = self.register(field_key.register)?;
                let field = reg.fields.get(field_key.field)?;
                Some(Row::for_field(field_key, reg, field))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        device::{ChannelDevice, DeviceRequest},
        error::ParseError,
        model::{Access, Field},
    };

    fn register(name: &str, offset: u64, access: Access, fields: Vec<Field>) -> Register {
        let mut reg = Register {
            name: name.to_owned(),
            address_offset: offset,
            access,
            fields,
            ..Default::default()
        };
        reg.reset_to(RegisterValue(1));
        reg
    }

    fn field(name: &str, bit_offset: u32, bit_width: u32, access: Access) -> Field {
        Field {
            name: name.to_owned(),
            bit_offset,
            bit_width,
            access,
            ..Default::default()
        }
    }

    fn groups() -> Vec<Group> {
        let uart0 = Group {
            name: "UART0".to_owned(),
            description: "Serial port".to_owned(),
            base_address: 0x4000_0000,
            registers: vec![
                register(
                    "CR",
                    0,
                    Access::ReadWrite,
                    vec![
                        field("EN", 0, 1, Access::ReadWrite),
                        field("MODE", 4, 4, Access::ReadWrite),
                        field("REV", 8, 4, Access::ReadOnly),
                    ],
                ),
                register("SR", 4, Access::ReadOnly, vec![]),
            ],
            ..Default::default()
        };
        let mut uart1 = uart0.derive();
        uart1.name = "UART1".to_owned();
        uart1.base_address = 0x4000_1000;
        vec![uart0, uart1]
    }

    fn model() -> (RegisterModel<ChannelDevice>, Receiver<DeviceRequest>) {
        let (device, requests) = ChannelDevice::new();
        (RegisterModel::new(groups(), device), requests)
    }

    #[test]
    fn activate_indexes_registers_and_requests_values() {
        let (mut model, requests) = model();
        assert!(model.active_group().is_none());

        model.activate("UART0").unwrap();
        assert_eq!(model.active_group().map(|g| g.name.as_str()), Some("UART0"));
        assert_eq!(model.active_addresses(), [0x4000_0000, 0x4000_0004]);
        assert_eq!(
            requests.try_recv(),
            Ok(DeviceRequest::Read(vec![0x4000_0000, 0x4000_0004]))
        );
        assert_eq!(model.lookup(0x4000_0004).map(|r| r.name.as_str()), Some("SR"));
        assert!(model.lookup(0x4000_0008).is_none());
    }

    #[test]
    fn activation_is_exclusive() {
        let (mut model, _requests) = model();
        model.activate("UART0").unwrap();
        model.activate("UART1").unwrap();

        assert!(model.lookup(0x4000_0000).is_none());
        assert!(model.lookup(0x4000_1000).is_some());
        let active: Vec<_> = model
            .group_entries()
            .into_iter()
            .filter(|e| e.active)
            .map(|e| e.name)
            .collect();
        assert_eq!(active, ["UART1"]);
    }

    #[test]
    fn unknown_group_keeps_previous_activation() {
        let (mut model, requests) = model();
        model.activate("UART0").unwrap();
        let _ = requests.try_recv();

        assert_eq!(
            model.activate("SPI9"),
            Err(ModelError::UnknownGroup("SPI9".to_owned()))
        );
        assert_eq!(model.active_group().map(|g| g.name.as_str()), Some("UART0"));
        assert!(model.lookup(0x4000_0000).is_some());
        assert!(requests.try_recv().is_err());
    }

    #[test]
    fn deactivate_all_clears_index() {
        let (mut model, _requests) = model();
        model.activate("UART0").unwrap();
        model.deactivate_all();
        assert!(model.active_group().is_none());
        assert!(model.active_addresses().is_empty());
        assert!(model.groups().iter().all(|g| !g.active));
        assert!(model.rows().is_empty());
    }

    #[test]
    fn updates_shift_current_into_previous() {
        let (mut model, _requests) = model();
        let events = model.subscribe();
        model.activate("UART0").unwrap();
        assert_eq!(events.try_recv(), Ok(ModelEvent::Rebuilt));

        assert!(model.apply_update(0x4000_0000, 0x3));
        assert!(model.apply_update(0x4000_0000, 0x5));
        let cr = model.lookup(0x4000_0000).unwrap();
        assert_eq!(cr.previous_value, RegisterValue(0x3));
        assert_eq!(cr.current_value, RegisterValue(0x5));
        assert!(cr.is_changed());

        assert!(model.apply_update(0x4000_0000, 0x5));
        assert!(!model.lookup(0x4000_0000).unwrap().is_changed());

        let key = RegisterKey {
            group: 0,
            register: 0,
        };
        assert_eq!(
            events.try_iter().collect::<Vec<_>>(),
            [
                ModelEvent::Updated { key, changed: true },
                ModelEvent::Updated { key, changed: true },
                ModelEvent::Updated {
                    key,
                    changed: false
                },
            ]
        );
    }

    #[test]
    fn updates_for_untracked_addresses_are_dropped() {
        let (mut model, _requests) = model();
        assert!(!model.apply_update(0x4000_0000, 1));

        model.activate("UART0").unwrap();
        model.activate("UART1").unwrap();
        // Late answer to the read issued for UART0
        assert!(!model.apply_update(0x4000_0000, 0xff));
        assert_eq!(model.groups()[0].registers[0].current_value, RegisterValue(1));
    }

    #[test]
    fn editing_a_register_writes_to_the_device() {
        let (mut model, requests) = model();
        model.activate("UART0").unwrap();
        let _ = requests.try_recv();

        let cr = model.find("CR").unwrap();
        assert_eq!(model.edit_value(cr, "0x12", Format::Hexadecimal), Ok(0x12));
        let reg = model.lookup(0x4000_0000).unwrap();
        assert_eq!(reg.current_value, RegisterValue(0x12));
        assert_eq!(reg.previous_value, RegisterValue(1));
        assert_eq!(
            requests.try_recv(),
            Ok(DeviceRequest::Write {
                address: 0x4000_0000,
                value: 0x12
            })
        );
    }

    #[test]
    fn editing_a_field_replaces_only_its_bits() {
        let (mut model, requests) = model();
        model.activate("UART0").unwrap();
        model.apply_update(0x4000_0000, 0xa5);
        let _ = requests.try_recv();

        let mode = model.find("CR.MODE").unwrap();
        assert_eq!(model.edit_value(mode, "3", Format::Decimal), Ok(0x35));
        assert_eq!(
            requests.try_recv(),
            Ok(DeviceRequest::Write {
                address: 0x4000_0000,
                value: 0x35
            })
        );

        assert_eq!(
            model.edit_value(mode, "0b10000", Format::Binary),
            Err(EditError::ValueTooWide {
                value: 0x10,
                width: 4
            })
        );
    }

    #[test]
    fn rejected_edits_change_nothing() {
        let (mut model, requests) = model();
        model.activate("UART0").unwrap();
        let _ = requests.try_recv();
        let before = model.lookup(0x4000_0000).cloned();

        let cr = model.find("CR").unwrap();
        assert_eq!(
            model.edit_value(cr, "12", Format::Binary),
            Err(EditError::InvalidFormat(ParseError::InvalidFormat {
                text: "12".to_owned(),
                format: Format::Binary
            }))
        );
        let rev = model.find("CR.REV").unwrap();
        assert_eq!(
            model.edit_value(rev, "1", Format::Hexadecimal),
            Err(EditError::AccessDenied(Access::ReadOnly))
        );
        let sr = model.find("SR").unwrap();
        assert_eq!(
            model.edit_value(sr, "1", Format::Hexadecimal),
            Err(EditError::AccessDenied(Access::ReadOnly))
        );
        // Registers of inactive peripherals cannot be edited
        let inactive = EntityKey::Register(RegisterKey {
            group: 1,
            register: 0,
        });
        assert_eq!(
            model.edit_value(inactive, "1", Format::Hexadecimal),
            Err(EditError::UnknownEntity(ModelError::UnknownEntity(inactive)))
        );
        assert_eq!(
            model.edit_value(EntityKey::Group(0), "1", Format::Hexadecimal),
            Err(EditError::NotEditable)
        );

        assert_eq!(model.lookup(0x4000_0000).cloned(), before);
        assert!(requests.try_recv().is_err());
    }

    #[test]
    fn register_edit_must_fit_register_size() {
        let (mut model, requests) = model();
        model.activate("UART0").unwrap();
        let _ = requests.try_recv();

        let cr = model.find("CR").unwrap();
        assert_eq!(
            model.edit_value(cr, "0x1ffffffff", Format::Hexadecimal),
            Err(EditError::ValueTooWide {
                value: 0x1_ffff_ffff,
                width: 32
            })
        );
        assert_eq!(model.lookup(0x4000_0000).unwrap().current_value, RegisterValue(1));
        assert!(requests.try_recv().is_err());

        assert_eq!(
            model.edit_value(cr, "0xffffffff", Format::Hexadecimal),
            Ok(0xffff_ffff)
        );
    }

    #[test]
    fn rows_describe_registers_and_fields() {
        let (mut model, _requests) = model();
        model.activate("UART0").unwrap();
        model.apply_update(0x4000_0000, 0x3);

        let rows = model.rows();
        let names: Vec<_> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["CR", "EN", "MODE", "REV", "SR"]);

        let cr = &rows[0];
        assert_eq!(cr.value, "0x00000003");
        assert_eq!(cr.access, "RW");
        assert_eq!(cr.tooltip, "UART0 / CR\n\nRW @ 0x40000000, 32");
        assert_eq!(
            cr.value_tooltip,
            "Current value: 0x00000003\nPrevious value: 0x00000001\nReset value: 0x00000001"
        );
        assert!(cr.changed);
        assert!(cr.editable);

        let en = &rows[1];
        assert_eq!(en.key.depth(), 2);
        assert_eq!(en.value, "0x1");
        assert_eq!(en.tooltip, "CR.EN\n\nBits: [0..0], 1");
        assert!(!en.changed);

        let rev = &rows[3];
        assert!(!rev.editable);
        assert!(!rows[4].editable);
    }

    #[test]
    fn set_format_changes_rendering() {
        let (mut model, _requests) = model();
        let events = model.subscribe();
        model.activate("UART0").unwrap();
        let mode = model.find("CR.MODE").unwrap();
        model.apply_update(0x4000_0000, 0x50);

        model.set_format(mode, Format::Binary).unwrap();
        assert_eq!(model.row(mode).unwrap().value, "0b0101");
        assert_eq!(
            model.set_format(EntityKey::Group(0), Format::Binary),
            Err(ModelError::NoFormat(EntityKey::Group(0)))
        );
        assert_eq!(
            events.try_iter().last(),
            Some(ModelEvent::Updated {
                key: RegisterKey {
                    group: 0,
                    register: 0
                },
                changed: true
            })
        );
    }

    #[test]
    fn duplicate_addresses_index_first_register() {
        let mut groups = groups();
        groups[0].registers[1].address_offset = 0;
        let mut model = RegisterModel::new(groups, crate::device::Detached);
        model.activate("UART0").unwrap();
        assert_eq!(model.active_addresses(), [0x4000_0000]);
        assert_eq!(model.lookup(0x4000_0000).map(|r| r.name.as_str()), Some("CR"));
    }

    #[test]
    fn set_groups_resets_activation() {
        let (mut model, _requests) = model();
        model.activate("UART0").unwrap();
        model.set_groups(groups());
        assert!(model.active_group().is_none());
        assert!(model.lookup(0x4000_0000).is_none());
    }
}
