//! In-memory register map

use std::collections::BTreeMap;

use serde::ser::{Serialize, Serializer};
use serde::Deserialize;

use super::table::TableRow;

/// A bit field within a register.
///
/// All values are kept as the strings found in the table; bit positions and
/// reset values use mixed notations in existing tables.
///
/// Fields are declared in the sorted order of their serialized keys so the
/// JSON output is stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, Deserialize)]
pub struct Field {
    #[serde(rename = "LSB")]
    pub lsb: String,
    #[serde(rename = "MSB")]
    pub msb: String,
    pub access: String,
    pub description: String,
    pub hardware: String,
    pub reset: String,
}

impl From<&TableRow> for Field {
    fn from(row: &TableRow) -> Self {
        Self {
            lsb: row.lsb.clone(),
            msb: row.msb.clone(),
            access: row.access.clone(),
            description: row.description.clone(),
            hardware: row.hardware.clone(),
            reset: row.reset.clone(),
        }
    }
}

/// A named, addressable register and its fields in table order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Register {
    /// Address literal, verbatim from the table
    pub address: String,
    pub description: String,
    entries: Vec<(String, Field)>,
}

impl Register {
    /// Create a register without fields
    pub fn new(address: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            description: description.into(),
            entries: Vec::new(),
        }
    }

    /// Insert a field, replacing an existing field of the same name in place.
    ///
    /// Returns `true` if a field was replaced.
    pub fn insert_field(&mut self, name: impl Into<String>, field: Field) -> bool {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => {
                *existing = field;
                true
            }
            None => {
                self.entries.push((name, field));
                false
            }
        }
    }

    /// Get a field by name
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, f)| f)
    }

    /// Check if this register has a field
    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Fields in insertion order
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Field)> {
        self.entries.iter().map(|(n, f)| (n.as_str(), f))
    }

    /// Field names in insertion order
    pub fn field_names(&self) -> Vec<&str> {
        self.entries.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Ordered mapping from register name to register
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterMap {
    registers: Vec<(String, Register)>,
}

impl RegisterMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a register and return its position.
    ///
    /// A register with the same name is replaced in place, fields included.
    pub fn insert(&mut self, name: impl Into<String>, register: Register) -> usize {
        let name = name.into();
        match self.position(&name) {
            Some(index) => {
                self.registers[index].1 = register;
                index
            }
            None => {
                self.registers.push((name, register));
                self.registers.len() - 1
            }
        }
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.registers.iter().position(|(n, _)| n == name)
    }

    /// Get a register by name
    pub fn get(&self, name: &str) -> Option<&Register> {
        self.registers.iter().find(|(n, _)| n == name).map(|(_, r)| r)
    }

    /// Get a mutable register by position
    pub fn get_index_mut(&mut self, index: usize) -> Option<(&str, &mut Register)> {
        self.registers
            .get_mut(index)
            .map(|(n, r)| (n.as_str(), r))
    }

    /// Check if a register exists
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Registers in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Register)> {
        self.registers.iter().map(|(n, r)| (n.as_str(), r))
    }

    /// Register names in insertion order
    pub fn names(&self) -> Vec<&str> {
        self.registers.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.registers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registers.is_empty()
    }

    /// Serialize to the JSON data file format: sorted keys, four-space indent,
    /// no trailing newline.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut serializer)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    /// Re-derive table rows: each register row followed by its field rows
    pub fn to_rows(&self) -> Vec<TableRow> {
        let mut rows = Vec::new();
        for (name, register) in self.iter() {
            rows.push(TableRow {
                register: name.to_string(),
                address: register.address.clone(),
                description: register.description.clone(),
                ..TableRow::default()
            });
            for (field_name, field) in register.fields() {
                rows.push(TableRow {
                    field: field_name.to_string(),
                    description: field.description.clone(),
                    access: field.access.clone(),
                    hardware: field.hardware.clone(),
                    lsb: field.lsb.clone(),
                    msb: field.msb.clone(),
                    reset: field.reset.clone(),
                    ..TableRow::default()
                });
            }
        }
        rows
    }
}

#[derive(serde::Serialize)]
struct MapRepr<'a> {
    registers: BTreeMap<&'a str, RegisterRepr<'a>>,
}

#[derive(serde::Serialize)]
struct RegisterRepr<'a> {
    address: &'a str,
    description: &'a str,
    entries: BTreeMap<&'a str, &'a Field>,
}

impl Serialize for RegisterMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let registers = self
            .iter()
            .map(|(name, register)| {
                let repr = RegisterRepr {
                    address: &register.address,
                    description: &register.description,
                    entries: register.fields().collect(),
                };
                (name, repr)
            })
            .collect();
        MapRepr { registers }.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn field(access: &str, lsb: &str, msb: &str) -> Field {
        Field {
            access: access.to_string(),
            lsb: lsb.to_string(),
            msb: msb.to_string(),
            reset: "0".to_string(),
            ..Field::default()
        }
    }

    #[test]
    fn test_field_order_is_insertion_order() {
        let mut reg = Register::new("0x4", "status");
        reg.insert_field("ZETA", field("RO", "0", "0"));
        reg.insert_field("ALPHA", field("RO", "1", "1"));
        assert_eq!(reg.field_names(), vec!["ZETA", "ALPHA"]);
    }

    #[test]
    fn test_insert_field_replaces_in_place() {
        let mut reg = Register::new("0x4", "");
        reg.insert_field("A", field("RO", "0", "0"));
        reg.insert_field("B", field("RO", "1", "1"));
        assert!(reg.insert_field("A", field("RW", "2", "3")));
        assert_eq!(reg.field_names(), vec!["A", "B"]);
        assert_eq!(reg.field("A").map(|f| f.access.as_str()), Some("RW"));
    }

    #[test]
    fn test_insert_register_replaces_fields() {
        let mut map = RegisterMap::new();
        let mut first = Register::new("0x0", "first");
        first.insert_field("EN", field("RW", "0", "0"));
        assert_eq!(map.insert("CTRL", first), 0);
        assert_eq!(map.insert("STATUS", Register::new("0x4", "")), 1);
        assert_eq!(map.insert("CTRL", Register::new("0x8", "second")), 0);

        let ctrl = map.get("CTRL").expect("CTRL exists");
        assert_eq!(ctrl.address, "0x8");
        assert!(ctrl.is_empty());
        assert_eq!(map.names(), vec!["CTRL", "STATUS"]);
    }

    #[test]
    fn test_to_json_sorted_and_indented() {
        let mut map = RegisterMap::new();
        let mut ctrl = Register::new("0x0", "");
        ctrl.insert_field("EN", field("RW", "0", "0"));
        map.insert("ZREG", Register::new("0x4", "last"));
        map.insert("CTRL", ctrl);

        let json = map.to_json().expect("serializes");
        insta::assert_snapshot!(json, @r#"
        {
            "registers": {
                "CTRL": {
                    "address": "0x0",
                    "description": "",
                    "entries": {
                        "EN": {
                            "LSB": "0",
                            "MSB": "0",
                            "access": "RW",
                            "description": "",
                            "hardware": "",
                            "reset": "0"
                        }
                    }
                },
                "ZREG": {
                    "address": "0x4",
                    "description": "last",
                    "entries": {}
                }
            }
        }
        "#);
    }

    #[test]
    fn test_to_json_empty_map() {
        let json = RegisterMap::new().to_json().expect("serializes");
        assert_eq!(json, "{\n    \"registers\": {}\n}");
    }

    #[test]
    fn test_to_rows_register_then_fields() {
        let mut map = RegisterMap::new();
        let mut ctrl = Register::new("0x0", "control");
        ctrl.insert_field("EN", field("RW", "0", "0"));
        ctrl.insert_field("MODE", field("RW", "2", "1"));
        map.insert("CTRL", ctrl);

        let rows = map.to_rows();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].register, "CTRL");
        assert_eq!(rows[0].address, "0x0");
        assert_eq!(rows[1].register, "");
        assert_eq!(rows[1].field, "EN");
        assert_eq!(rows[2].field, "MODE");
        assert_eq!(rows[2].msb, "1");
    }
}
