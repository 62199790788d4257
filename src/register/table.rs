//! Register table rows and the row fold that builds a [`RegisterMap`]

use std::io::Read;

use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::model::{Field, Register, RegisterMap};

/// Header names every register table must carry
pub const REQUIRED_COLUMNS: &[&str] = &[
    "RegName",
    "Address",
    "Description",
    "BitName",
    "Access",
    "HW",
    "LSB",
    "MSB",
    "Reset",
];

/// Errors that can occur while reading a table or building a register map
#[derive(Debug, Error)]
pub enum TableError {
    #[error("missing required column '{column}'")]
    MissingColumn { column: String },

    #[error("row {row}: field '{field}' appears before any register")]
    FieldBeforeRegister { row: usize, field: String },

    #[error("row {row}: continuation row without a field name")]
    MissingFieldName { row: usize },

    #[error("row {row}: duplicate register '{name}'")]
    DuplicateRegister { row: usize, name: String },

    #[error("row {row}: duplicate field '{field}' in register '{register}'")]
    DuplicateField {
        row: usize,
        register: String,
        field: String,
    },

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
}

/// How repeated register or field names are handled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// Later rows overwrite earlier ones
    #[default]
    LastWriteWins,
    /// Repeated names are an error
    Reject,
}

/// One row of a register table.
///
/// A non-empty `register` opens a new register; otherwise the row adds the
/// field `field` to the register opened last. `description` belongs to
/// whichever of the two the row describes. Cells missing from short rows
/// are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct TableRow {
    #[serde(rename = "RegName")]
    pub register: String,
    #[serde(rename = "Address")]
    pub address: String,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "BitName")]
    pub field: String,
    #[serde(rename = "Access")]
    pub access: String,
    #[serde(rename = "HW")]
    pub hardware: String,
    #[serde(rename = "LSB")]
    pub lsb: String,
    #[serde(rename = "MSB")]
    pub msb: String,
    #[serde(rename = "Reset")]
    pub reset: String,
}

impl TableRow {
    /// Start a register row
    pub fn register(name: &str, address: &str, description: &str) -> Self {
        Self {
            register: name.to_string(),
            address: address.to_string(),
            description: description.to_string(),
            ..Self::default()
        }
    }

    /// Start a field row with the given access and bit range
    pub fn field(name: &str, access: &str, lsb: &str, msb: &str, reset: &str) -> Self {
        Self {
            field: name.to_string(),
            access: access.to_string(),
            lsb: lsb.to_string(),
            msb: msb.to_string(),
            reset: reset.to_string(),
            ..Self::default()
        }
    }

    /// True when every column is empty (padding rows of spreadsheet exports)
    pub fn is_blank(&self) -> bool {
        [
            &self.register,
            &self.address,
            &self.description,
            &self.field,
            &self.access,
            &self.hardware,
            &self.lsb,
            &self.msb,
            &self.reset,
        ]
        .iter()
        .all(|value| value.is_empty())
    }
}

/// Read table rows from CSV with a header row
pub fn read_table<R: Read>(reader: R) -> Result<Vec<TableRow>, TableError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .flexible(true)
        .from_reader(reader);
    let headers = reader.headers()?.clone();

    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|header| header == *column) {
            return Err(TableError::MissingColumn {
                column: column.to_string(),
            });
        }
    }

    let mut rows = Vec::new();
    for record in reader.deserialize() {
        rows.push(record?);
    }
    Ok(rows)
}

/// Build a register map, later duplicates overwriting earlier ones
pub fn build<I>(rows: I) -> Result<RegisterMap, TableError>
where
    I: IntoIterator<Item = TableRow>,
{
    build_with(rows, DuplicatePolicy::default())
}

/// Build a register map with an explicit duplicate policy.
///
/// The register that continuation rows attach to is carried through the fold
/// as an index into the map.
pub fn build_with<I>(rows: I, policy: DuplicatePolicy) -> Result<RegisterMap, TableError>
where
    I: IntoIterator<Item = TableRow>,
{
    let (map, _) = rows.into_iter().enumerate().try_fold(
        (RegisterMap::new(), None::<usize>),
        |(mut map, current), (index, row)| {
            let row_number = index + 1;
            debug!("row {}: {:?}", row_number, row);

            if row.is_blank() {
                return Ok((map, current));
            }

            if !row.register.is_empty() {
                if policy == DuplicatePolicy::Reject && map.contains(&row.register) {
                    return Err(TableError::DuplicateRegister {
                        row: row_number,
                        name: row.register,
                    });
                }
                let register = Register::new(row.address, row.description);
                let position = map.insert(row.register, register);
                return Ok((map, Some(position)));
            }

            if row.field.is_empty() {
                return Err(TableError::MissingFieldName { row: row_number });
            }

            let field = Field::from(&row);
            let target = match current {
                Some(index) => map.get_index_mut(index),
                None => None,
            };
            let Some((register_name, register)) = target else {
                return Err(TableError::FieldBeforeRegister {
                    row: row_number,
                    field: row.field,
                });
            };

            if policy == DuplicatePolicy::Reject && register.has_field(&row.field) {
                return Err(TableError::DuplicateField {
                    row: row_number,
                    register: register_name.to_string(),
                    field: row.field,
                });
            }
            register.insert_field(row.field, field);
            Ok((map, current))
        },
    )?;

    Ok(map)
}
