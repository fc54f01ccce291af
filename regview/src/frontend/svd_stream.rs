//! Streaming CMSIS-SVD reader
//!
//! Walks `device > peripherals > peripheral > registers > register > fields > field` in a single
//! forward pass. Elements that are not understood are skipped along with their contents. A
//! document that stops being well-formed halfway keeps everything that was read up to that point.

use std::io::BufRead;

use log::{debug, info, warn};
use quick_xml::{events::Event, Reader};

use crate::{
    codec::decode_numeric,
    error::DocumentError,
    model::{Access, Field, Group, Register, RegisterValue},
};

/// A start tag, reduced to what the reader needs from it
struct Element {
    name: String,
    derived_from: Option<String>,
}

enum Token {
    Start(Element),
    End,
    Text(String),
    /// Comments, processing instructions, declarations
    Other,
    Eof,
}

/// Forward-only cursor over XML events
struct Cursor<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    /// Number of elements opened but not yet closed
    depth: usize,
    error: Option<DocumentError>,
}

impl<R: BufRead> Cursor<R> {
    fn new(src: R) -> Self {
        let mut reader = Reader::from_reader(src);
        reader
            .trim_text(true)
            .expand_empty_elements(true)
            // Mismatched end tags close the current element instead of failing the document
            .check_end_names(false);
        Self {
            reader,
            buf: Vec::new(),
            depth: 0,
            error: None,
        }
    }

    fn next_token(&mut self) -> Token {
        if self.error.is_some() {
            return Token::Eof;
        }
        self.buf.clear();
        match self.reader.read_event_into(&mut self.buf) {
            Ok(Event::Start(start)) => {
                self.depth += 1;
                let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
                let derived_from = start
                    .try_get_attribute("derivedFrom")
                    .ok()
                    .flatten()
                    .and_then(|attr| attr.unescape_value().ok().map(|v| v.into_owned()))
                    .filter(|v| !v.is_empty());
                Token::Start(Element { name, derived_from })
            }
            Ok(Event::End(_)) => {
                self.depth = self.depth.saturating_sub(1);
                Token::End
            }
            Ok(Event::Text(text)) => match text.unescape() {
                Ok(text) => Token::Text(text.into_owned()),
                Err(e) => {
                    warn!(
                        "cannot unescape text near byte {}: {e}",
                        self.reader.buffer_position()
                    );
                    Token::Other
                }
            },
            Ok(Event::CData(data)) => {
                Token::Text(String::from_utf8_lossy(&data.into_inner()).into_owned())
            }
            Ok(Event::Eof) if self.depth > 0 => {
                let pos = self.reader.buffer_position();
                warn!("document ends inside {} open elements", self.depth);
                self.error = Some(DocumentError::Xml {
                    pos,
                    msg: format!(
                        "unexpected end of document, {} elements left open",
                        self.depth
                    ),
                });
                Token::Eof
            }
            Ok(Event::Eof) => Token::Eof,
            Ok(_) => Token::Other,
            Err(e) => {
                let pos = self.reader.buffer_position();
                warn!("malformed XML at byte {pos}, keeping what was read so far: {e}");
                self.error = Some(DocumentError::Xml {
                    pos,
                    msg: e.to_string(),
                });
                Token::Eof
            }
        }
    }

    /// Advances to the next child element of the current element
    ///
    /// Returns `None` once the current element ends or the input runs out.
    fn next_child(&mut self) -> Option<Element> {
        loop {
            match self.next_token() {
                Token::Start(element) => return Some(element),
                Token::End | Token::Eof => return None,
                Token::Text(_) | Token::Other => {}
            }
        }
    }

    /// Text content of the current element, consuming its end tag
    ///
    /// Nested elements are skipped.
    fn read_text(&mut self) -> String {
        let mut text = String::new();
        loop {
            match self.next_token() {
                Token::Text(t) => text.push_str(&t),
                Token::Start(_) => self.skip_current(),
                Token::End | Token::Eof => return text,
                Token::Other => {}
            }
        }
    }

    /// Skips the rest of the current element, including its end tag
    fn skip_current(&mut self) {
        let mut depth = 0usize;
        loop {
            match self.next_token() {
                Token::Start(_) => depth += 1,
                Token::End if depth == 0 => return,
                Token::End => depth -= 1,
                Token::Eof => return,
                Token::Text(_) | Token::Other => {}
            }
        }
    }

    /// Reads the current element's text as a number, see [`decode_numeric`]
    ///
    /// Logs and returns `None` if the text is not a number representable by `T`.
    fn read_number<T: TryFrom<u64>>(&mut self, tag: &str, owner: &str) -> Option<T> {
        let text = self.read_text();
        let value = decode_numeric(&text).and_then(|v| T::try_from(v).ok());
        if value.is_none() {
            warn!("ignoring <{tag}> of {owner:?}: {text:?} is not a valid number");
        }
        value
    }

    /// Reads a `size` element, rejecting widths a 64-bit register value cannot have
    fn read_size(&mut self, owner: &str) -> Option<u32> {
        self.read_number::<u32>("size", owner).filter(|&size| {
            let valid = (1..=64).contains(&size);
            if !valid {
                warn!("ignoring <size> of {owner:?}: {size} is not within 1..=64 bits");
            }
            valid
        })
    }
}

/// Bit position information of a field, as given in the document
///
/// A field may describe its position as `lsb` + `msb`, as a `bitRange` of the form `[msb:lsb]`,
/// or as `bitOffset` + `bitWidth`. They are collected during the scan and resolved once the field
/// element ends since they can appear in any order.
#[derive(Default)]
struct FieldGeometry {
    lsb: Option<u32>,
    msb: Option<u32>,
    bit_range: Option<(u32, u32)>,
    bit_offset: Option<u32>,
    bit_width: Option<u32>,
}

impl FieldGeometry {
    /// Returns `(bit_offset, bit_width)`
    ///
    /// `lsb` + `msb` take precedence over `bitRange`, which takes precedence over
    /// `bitOffset` + `bitWidth`. Missing parts default to offset 0, width 1. A source describing
    /// bits outside a 64-bit value is ignored.
    fn resolve(&self, field_name: &str) -> (u32, u32) {
        if let (Some(lsb), Some(msb)) = (self.lsb, self.msb) {
            match span(lsb, msb) {
                Some(geometry) => return geometry,
                None => {
                    warn!("field {field_name:?}: ignoring invalid lsb {lsb}, msb {msb}");
                }
            }
        }
        if let Some((msb, lsb)) = self.bit_range {
            match span(lsb, msb) {
                Some(geometry) => return geometry,
                None => {
                    warn!("field {field_name:?}: ignoring invalid bitRange [{msb}:{lsb}]");
                }
            }
        }
        let bit_width = match self.bit_width {
            Some(0) => {
                warn!("field {field_name:?} has zero bitWidth, assuming bitWidth = 1");
                1
            }
            Some(width) => width,
            None => 1,
        };
        let bit_offset = self.bit_offset.unwrap_or(0);
        if fits_in_register(bit_offset, bit_width) {
            (bit_offset, bit_width)
        } else {
            warn!(
                "field {field_name:?} with bitOffset {bit_offset}, bitWidth {bit_width} exceeds \
                 64 bits, assuming bit 0"
            );
            (0, 1)
        }
    }
}

/// `(bit_offset, bit_width)` of bits `lsb..=msb`, if they lie within a 64-bit value
fn span(lsb: u32, msb: u32) -> Option<(u32, u32)> {
    let width = msb.checked_sub(lsb)?.checked_add(1)?;
    fits_in_register(lsb, width).then_some((lsb, width))
}

fn fits_in_register(bit_offset: u32, bit_width: u32) -> bool {
    bit_width >= 1
        && bit_offset
            .checked_add(bit_width)
            .is_some_and(|end| end <= 64)
}

/// Parses `bitRange` text `[msb:lsb]` into `(msb, lsb)`
fn parse_bit_range(text: &str) -> Option<(u32, u32)> {
    let start = text.find('[')?;
    let end = text.find(']')?;
    let inner = text.get(start + 1..end)?;
    let (msb, lsb) = inner.split_once(':')?;
    let msb = u32::try_from(decode_numeric(msb)?).ok()?;
    let lsb = u32::try_from(decode_numeric(lsb)?).ok()?;
    (msb >= lsb).then_some((msb, lsb))
}

/// Reads CMSIS-SVD documents into [`Group`]s
#[derive(Clone, Copy, Debug)]
pub(crate) struct SvdReader {
    /// Register bit-width used when neither the register nor its peripheral declares `size`
    pub(crate) default_register_size: u32,
}

impl SvdReader {
    /// Reads every peripheral in `src`, in document order
    ///
    /// Also returns the error that ended the read early, if any. The groups read before the
    /// error are kept.
    pub(crate) fn read<R: BufRead>(&self, src: R) -> (Vec<Group>, Option<DocumentError>) {
        let mut cursor = Cursor::new(src);
        let mut groups = Vec::new();

        while let Some(root) = cursor.next_child() {
            if root.name != "device" {
                debug!("skipping top-level element <{}>", root.name);
                cursor.skip_current();
                continue;
            }
            while let Some(element) = cursor.next_child() {
                if element.name != "peripherals" {
                    cursor.skip_current();
                    continue;
                }
                while let Some(element) = cursor.next_child() {
                    if element.name == "peripheral" {
                        let group = self.read_peripheral(&mut cursor, &element, &groups);
                        groups.push(group);
                    } else {
                        cursor.skip_current();
                    }
                }
            }
        }

        info!(
            "Found {} peripherals with {} registers",
            groups.len(),
            groups.iter().map(|g| g.registers.len()).sum::<usize>()
        );
        (groups, cursor.error)
    }

    fn read_peripheral<R: BufRead>(
        &self,
        cursor: &mut Cursor<R>,
        element: &Element,
        parsed: &[Group],
    ) -> Group {
        let mut group = match &element.derived_from {
            Some(base) => match parsed.iter().rev().find(|g| &g.name == base) {
                Some(base_group) => base_group.derive(),
                None => {
                    warn!(
                        "peripheral derives from {base:?} which was not declared before it, \
                         starting empty"
                    );
                    Group::default()
                }
            },
            None => Group::default(),
        };
        // Registers that did not declare their own size
        let mut sizeless = Vec::new();

        while let Some(child) = cursor.next_child() {
            match child.name.as_str() {
                "name" => group.name = cursor.read_text(),
                "description" => group.description = cursor.read_text(),
                "groupName" => group.display_name = cursor.read_text(),
                "baseAddress" => {
                    if let Some(base) = cursor.read_number("baseAddress", &group.name) {
                        group.base_address = base;
                    }
                }
                "size" => {
                    if let Some(size) = cursor.read_size(&group.name) {
                        group.size = size;
                    }
                }
                "access" => group.access = Access::decode(&cursor.read_text()),
                "registers" => {
                    while let Some(reg_element) = cursor.next_child() {
                        if reg_element.name != "register" {
                            cursor.skip_current();
                            continue;
                        }
                        let (register, has_size) = read_register(cursor);
                        let idx = match group.find_register(&register.name) {
                            // Overrides a register inherited through derivedFrom
                            Some((idx, _)) => {
                                group.registers[idx] = register;
                                idx
                            }
                            None => {
                                group.registers.push(register);
                                group.registers.len() - 1
                            }
                        };
                        sizeless.retain(|&i| i != idx);
                        if !has_size {
                            sizeless.push(idx);
                        }
                    }
                }
                _ => cursor.skip_current(),
            }
        }

        let size = if group.size != 0 {
            group.size
        } else {
            self.default_register_size
        };
        for idx in sizeless {
            let register = &mut group.registers[idx];
            debug!(
                "property 'size' is not defined for register '{}-{}', assuming size = {size}",
                group.name, register.name
            );
            register.size = size;
        }
        group
    }
}

/// Returns the register and whether it declared its own `size`
fn read_register<R: BufRead>(cursor: &mut Cursor<R>) -> (Register, bool) {
    let mut register = Register::default();
    let mut reset_value = RegisterValue::default();
    let mut has_size = false;

    while let Some(child) = cursor.next_child() {
        match child.name.as_str() {
            "name" => register.name = cursor.read_text(),
            "displayName" => register.display_name = cursor.read_text(),
            "description" => register.description = cursor.read_text(),
            "addressOffset" => {
                if let Some(offset) = cursor.read_number("addressOffset", &register.name) {
                    register.address_offset = offset;
                }
            }
            "size" => {
                if let Some(size) = cursor.read_size(&register.name) {
                    register.size = size;
                    has_size = true;
                }
            }
            "access" => register.access = Access::decode(&cursor.read_text()),
            "resetValue" => {
                if let Some(value) = cursor.read_number::<u64>("resetValue", &register.name) {
                    reset_value = value.into();
                }
            }
            "fields" => {
                while let Some(field_element) = cursor.next_child() {
                    if field_element.name == "field" {
                        register.fields.push(read_field(cursor));
                    } else {
                        cursor.skip_current();
                    }
                }
            }
            _ => cursor.skip_current(),
        }
    }

    // Fields without access rights of their own inherit the register's
    for field in &mut register.fields {
        if field.access == Access::Unknown {
            field.access = register.access;
        }
    }
    register.reset_to(reset_value);
    (register, has_size)
}

fn read_field<R: BufRead>(cursor: &mut Cursor<R>) -> Field {
    let mut field = Field::default();
    let mut geometry = FieldGeometry::default();

    while let Some(child) = cursor.next_child() {
        match child.name.as_str() {
            "name" => field.name = cursor.read_text(),
            "description" => field.description = cursor.read_text(),
            "access" => field.access = Access::decode(&cursor.read_text()),
            "bitRange" => {
                let text = cursor.read_text();
                match parse_bit_range(&text) {
                    Some(range) => geometry.bit_range = Some(range),
                    None => warn!(
                        "ignoring malformed bitRange {text:?} of field {:?}",
                        field.name
                    ),
                }
            }
            "bitOffset" => geometry.bit_offset = cursor.read_number("bitOffset", &field.name),
            "bitWidth" => geometry.bit_width = cursor.read_number("bitWidth", &field.name),
            "lsb" => geometry.lsb = cursor.read_number("lsb", &field.name),
            "msb" => geometry.msb = cursor.read_number("msb", &field.name),
            _ => cursor.skip_current(),
        }
    }

    (field.bit_offset, field.bit_width) = geometry.resolve(&field.name);
    field
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;

    const READER: SvdReader = SvdReader {
        default_register_size: 32,
    };

    fn read(doc: &str) -> Vec<Group> {
        READER.read(doc.as_bytes()).0
    }

    const UARTS: &str = indoc! {r#"
        <?xml version="1.0" encoding="utf-8"?>
        <device schemaVersion="1.1">
          <name>TESTCHIP</name>
          <peripherals>
            <peripheral>
              <name>UART0</name>
              <description>Universal asynchronous receiver &amp; transmitter</description>
              <groupName>UART</groupName>
              <baseAddress>0x40000000</baseAddress>
              <interrupt><name>UART0</name><value>5</value></interrupt>
              <registers>
                <register>
                  <name>CR</name>
                  <displayName>Control</displayName>
                  <description>Control register</description>
                  <addressOffset>0x00</addressOffset>
                  <size>32</size>
                  <access>read-write</access>
                  <resetValue>0x1</resetValue>
                  <fields>
                    <field>
                      <name>EN</name>
                      <description>Enable</description>
                      <bitOffset>0</bitOffset>
                      <bitWidth>1</bitWidth>
                    </field>
                    <field>
                      <name>MODE</name>
                      <bitRange>[7:4]</bitRange>
                      <access>read-only</access>
                    </field>
                  </fields>
                </register>
                <register>
                  <name>SR</name>
                  <addressOffset>4</addressOffset>
                  <size>16</size>
                  <access>read-only</access>
                  <fields>
                    <field><name>BUSY</name><msb>3</msb><lsb>2</lsb></field>
                  </fields>
                </register>
              </registers>
            </peripheral>
            <peripheral derivedFrom="UART0">
              <name>UART1</name>
              <baseAddress>0x40001000</baseAddress>
            </peripheral>
          </peripherals>
        </device>
    "#};

    #[test]
    fn reads_peripherals_registers_and_fields() {
        let groups = read(UARTS);
        assert_eq!(groups.len(), 2);

        let uart0 = &groups[0];
        assert_eq!(uart0.name, "UART0");
        assert_eq!(uart0.display_name, "UART");
        assert_eq!(
            uart0.description,
            "Universal asynchronous receiver & transmitter"
        );
        assert_eq!(uart0.base_address, 0x4000_0000);
        assert_eq!(uart0.registers.len(), 2);

        let cr = &uart0.registers[0];
        assert_eq!(cr.name, "CR");
        assert_eq!(cr.display_name, "Control");
        assert_eq!(cr.size, 32);
        assert_eq!(cr.access, Access::ReadWrite);
        assert_eq!(cr.reset_value, RegisterValue(1));
        assert_eq!(cr.current_value, RegisterValue(1));
        assert_eq!(cr.previous_value, RegisterValue(1));

        let en = &cr.fields[0];
        assert_eq!((en.bit_offset, en.bit_width), (0, 1));
        assert_eq!(en.access, Access::ReadWrite);

        let mode = &cr.fields[1];
        assert_eq!((mode.bit_offset, mode.bit_width), (4, 4));
        assert_eq!(mode.access, Access::ReadOnly);

        let sr = &uart0.registers[1];
        assert_eq!(sr.address_offset, 4);
        assert_eq!(sr.size, 16);
        let busy = &sr.fields[0];
        assert_eq!((busy.bit_offset, busy.bit_width), (2, 2));
        assert_eq!(busy.access, Access::ReadOnly);
    }

    #[test]
    fn derived_peripheral_copies_registers() {
        let groups = read(UARTS);
        let (uart0, uart1) = (&groups[0], &groups[1]);

        assert_eq!(uart1.name, "UART1");
        assert_eq!(uart1.base_address, 0x4000_1000);
        assert_eq!(uart1.description, uart0.description);
        assert_eq!(uart1.registers, uart0.registers);
        assert_eq!(uart1.registers[0].full_addr(uart1.base_address), Ok(0x4000_1000));
    }

    #[test]
    fn derived_peripheral_overrides_and_extends_registers() {
        let doc = indoc! {r#"
            <device><peripherals>
              <peripheral>
                <name>TIM0</name><baseAddress>0x1000</baseAddress><size>16</size>
                <registers>
                  <register><name>CNT</name><addressOffset>0</addressOffset></register>
                  <register><name>ARR</name><addressOffset>4</addressOffset></register>
                </registers>
              </peripheral>
              <peripheral derivedFrom="TIM0">
                <name>TIM1</name><baseAddress>0x2000</baseAddress>
                <registers>
                  <register><name>ARR</name><addressOffset>8</addressOffset><size>32</size></register>
                  <register><name>PSC</name><addressOffset>0xC</addressOffset></register>
                </registers>
              </peripheral>
            </peripherals></device>
        "#};
        let groups = read(doc);
        let names: Vec<_> = groups[1].registers.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["CNT", "ARR", "PSC"]);
        assert_eq!(groups[1].registers[1].address_offset, 8);
        assert_eq!(groups[1].registers[1].size, 32);
        // Size cascades from the (inherited) peripheral size
        assert_eq!(groups[1].registers[2].size, 16);
        assert_eq!(groups[0].registers.len(), 2);
        assert_eq!(groups[0].registers[1].address_offset, 4);
    }

    #[test]
    fn derived_from_unknown_peripheral_starts_empty() {
        let doc = indoc! {r#"
            <device><peripherals>
              <peripheral derivedFrom="NOPE"><name>GPIOA</name></peripheral>
            </peripherals></device>
        "#};
        let groups = read(doc);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].name, "GPIOA");
        assert!(groups[0].registers.is_empty());
    }

    #[test]
    fn register_size_falls_back_to_default() {
        let doc = indoc! {r#"
            <device><peripherals><peripheral>
              <name>P</name>
              <registers><register><name>R</name><resetValue>FF</resetValue></register></registers>
            </peripheral></peripherals></device>
        "#};
        let groups = read(doc);
        let reg = &groups[0].registers[0];
        assert_eq!(reg.size, 32);
        assert_eq!(reg.reset_value, RegisterValue(0xff));
        assert_eq!(reg.access, Access::Unknown);
    }

    #[test]
    fn geometry_precedence() {
        let geometry = FieldGeometry {
            lsb: Some(1),
            msb: Some(2),
            bit_range: Some((7, 4)),
            bit_offset: Some(9),
            bit_width: Some(3),
        };
        assert_eq!(geometry.resolve("F"), (1, 2));

        let geometry = FieldGeometry {
            bit_range: Some((7, 4)),
            bit_offset: Some(9),
            bit_width: Some(3),
            ..Default::default()
        };
        assert_eq!(geometry.resolve("F"), (4, 4));

        let geometry = FieldGeometry {
            lsb: Some(3),
            bit_offset: Some(9),
            bit_width: Some(3),
            ..Default::default()
        };
        assert_eq!(geometry.resolve("F"), (9, 3));
        assert_eq!(FieldGeometry::default().resolve("F"), (0, 1));
    }

    #[test]
    fn bit_range_text() {
        assert_eq!(parse_bit_range("[7:4]"), Some((7, 4)));
        assert_eq!(parse_bit_range(" [31:0] "), Some((31, 0)));
        assert_eq!(parse_bit_range("[0:0]"), Some((0, 0)));
        assert_eq!(parse_bit_range("7:4"), None);
        assert_eq!(parse_bit_range("[7]"), None);
        assert_eq!(parse_bit_range("[4:7]"), None);
    }

    fn single_field(field: &str) -> Field {
        let doc = format!(
            "<device><peripherals><peripheral><name>P</name><registers><register>\
             <name>R</name><fields><field><name>F</name>{field}</field></fields>\
             </register></registers></peripheral></peripherals></device>"
        );
        read(&doc).remove(0).registers.remove(0).fields.remove(0)
    }

    #[test]
    fn geometry_beyond_64_bits_falls_back() {
        let f = single_field("<lsb>0</lsb><msb>4294967295</msb><bitRange>[7:4]</bitRange>");
        assert_eq!((f.bit_offset, f.bit_width), (4, 4));

        let f = single_field("<bitRange>[4294967295:0]</bitRange><bitOffset>2</bitOffset>");
        assert_eq!((f.bit_offset, f.bit_width), (2, 1));

        let f = single_field("<bitOffset>4294967295</bitOffset><bitWidth>2</bitWidth>");
        assert_eq!((f.bit_offset, f.bit_width), (0, 1));
        assert_eq!(f.bit_range_string(), "[0..0]");

        let f = single_field("<bitOffset>60</bitOffset><bitWidth>4294967295</bitWidth>");
        assert_eq!((f.bit_offset, f.bit_width), (0, 1));

        let f = single_field("<lsb>32</lsb><msb>63</msb>");
        assert_eq!((f.bit_offset, f.bit_width), (32, 32));
    }

    #[test]
    fn register_size_beyond_64_bits_is_ignored() {
        let doc = indoc! {r#"
            <device><peripherals><peripheral>
              <name>P</name>
              <size>16</size>
              <registers>
                <register><name>A</name><size>4294967295</size></register>
                <register><name>B</name><size>0</size></register>
                <register><name>C</name><size>64</size></register>
              </registers>
            </peripheral></peripherals></device>
        "#};
        let groups = read(doc);
        let sizes: Vec<_> = groups[0].registers.iter().map(|r| r.size).collect();
        assert_eq!(sizes, [16, 16, 64]);
        assert_eq!(groups[0].registers[0].current_value_string(), "0x0000");
    }

    #[test]
    fn unknown_elements_are_skipped() {
        let doc = indoc! {r#"
            <device>
              <cpu><name>CM4</name><peripherals>not these</peripherals></cpu>
              <peripherals>
                <!-- comment -->
                <vendorExtension><peripheral><name>HIDDEN</name></peripheral></vendorExtension>
                <peripheral>
                  <name>GPIO</name>
                  <addressBlock><offset>0</offset><size>0x400</size></addressBlock>
                  <registers>
                    <cluster><name>CL</name></cluster>
                    <register><name>ODR</name><dim>4</dim></register>
                  </registers>
                </peripheral>
              </peripherals>
            </device>
        "#};
        let groups = read(doc);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].name, "GPIO");
        assert_eq!(groups[0].size, 0);
        assert_eq!(groups[0].registers.len(), 1);
        assert_eq!(groups[0].registers[0].name, "ODR");
    }

    #[test]
    fn malformed_document_keeps_partial_results() {
        let doc = indoc! {r#"
            <device><peripherals>
              <peripheral><name>A</name><baseAddress>0x10</baseAddress></peripheral>
              <peripheral><name>B</name><registers><register><name>R</name>
              <addressOffset>4</addressOffset></register></registers>
              <peripheral><name>C</name
        "#};
        let (groups, error) = READER.read(doc.as_bytes());
        assert!(matches!(error, Some(DocumentError::Xml { .. })));
        let names: Vec<_> = groups.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(&names[..2], ["A", "B"]);
        assert_eq!(groups[1].registers[0].address_offset, 4);
    }

    #[test]
    fn truncated_document_is_reported() {
        let doc = "<device><peripherals><peripheral><name>A</name></peripheral>";
        let (groups, error) = READER.read(doc.as_bytes());
        assert_eq!(groups.len(), 1);
        assert!(matches!(error, Some(DocumentError::Xml { .. })));
    }

    #[test]
    fn mismatched_end_tag_closes_current_element() {
        let doc = indoc! {r#"
            <device><peripherals>
              <peripheral><name>A</nam><baseAddress>0x10</baseAddress></peripheral>
              <peripheral><name>B</name></peripheral>
            </peripherals></device>
        "#};
        let groups = read(doc);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].name, "A");
        assert_eq!(groups[0].base_address, 0x10);
        assert_eq!(groups[1].name, "B");
    }

    #[test]
    fn empty_or_foreign_documents_have_no_groups() {
        assert!(read("").is_empty());
        assert!(read("<component><name>X</name></component>").is_empty());
    }
}
