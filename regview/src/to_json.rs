//! JSON rendering of a parsed model

use json::JsonValue;

use crate::model::{Field, Group, Register};

impl Field {
    pub fn to_json(&self) -> JsonValue {
        let mut obj = JsonValue::new_object();
        obj["name"] = self.name.as_str().into();
        obj["description"] = self.description.as_str().into();
        obj["bit_offset"] = self.bit_offset.into();
        obj["bit_width"] = self.bit_width.into();
        obj["access"] = self.access.to_string().into();
        obj
    }
}

impl Register {
    /// `base_address` is the address of the owning peripheral
    pub fn to_json(&self, base_address: u64) -> JsonValue {
        let mut obj = JsonValue::new_object();
        obj["name"] = self.name.as_str().into();
        obj["display_name"] = self.display_name.as_str().into();
        obj["description"] = self.description.as_str().into();
        obj["address_offset"] = self.address_offset.into();
        obj["address"] = match self.full_addr(base_address) {
            Ok(addr) => addr.into(),
            Err(_) => JsonValue::Null,
        };
        obj["size"] = self.size.into();
        obj["access"] = self.access.to_string().into();
        obj["reset_value"] = self.reset_value.0.into();
        obj["fields"] = JsonValue::Array(self.fields.iter().map(Field::to_json).collect());
        obj
    }
}

impl Group {
    pub fn to_json(&self) -> JsonValue {
        let mut obj = JsonValue::new_object();
        obj["name"] = self.name.as_str().into();
        obj["display_name"] = self.display_name.as_str().into();
        obj["description"] = self.description.as_str().into();
        obj["base_address"] = self.base_address.into();
        obj["size"] = self.size.into();
        obj["registers"] = JsonValue::Array(
            self.registers
                .iter()
                .map(|r| r.to_json(self.base_address))
                .collect(),
        );
        obj
    }
}

/// Pretty-printed JSON array of `groups`
pub fn groups_to_json(groups: &[Group]) -> String {
    json::stringify_pretty(
        JsonValue::Array(groups.iter().map(Group::to_json).collect()),
        2,
    )
}

#[test]
fn register_json_contains_absolute_address_and_fields() {
    let reg = Register {
        name: "CR".to_owned(),
        address_offset: 0x4,
        fields: vec![Field {
            name: "EN".to_owned(),
            ..Default::default()
        }],
        ..Default::default()
    };
    let json = reg.to_json(0x4000_0000);
    assert_eq!(json["address"].as_u64(), Some(0x4000_0004));
    assert_eq!(json["size"].as_u32(), Some(32));
    assert_eq!(json["access"].as_str(), Some("unknown"));
    assert_eq!(json["fields"][0]["name"].as_str(), Some("EN"));
    assert_eq!(json["fields"][0]["bit_width"].as_u32(), Some(1));

    assert!(reg.to_json(u64::MAX)["address"].is_null());
}

#[test]
fn groups_render_as_array() {
    let groups = [Group {
        name: "UART0".to_owned(),
        ..Default::default()
    }];
    let parsed = json::parse(&groups_to_json(&groups)).unwrap();
    assert!(parsed.is_array());
    assert_eq!(parsed[0]["name"].as_str(), Some("UART0"));
    assert_eq!(parsed[0]["registers"].len(), 0);
}
