//! Register model built from flat register tables
//!
//! Register maps are authored as CSV tables where a row either opens a new
//! register or adds a bit field to the register opened last:
//!
//! ```text
//! RegName,Address,Description,BitName,Access,HW,LSB,MSB,Reset
//! CTRL,0x0,Control register,,,,,,
//! ,,Enable the core,EN,RW,,0,0,0
//! ```
//!
//! The resulting [`RegisterMap`] is serialized to JSON and consumed later by
//! the template regions of host files.

mod model;
mod table;

pub use model::{Field, Register, RegisterMap};
pub use table::{build, build_with, read_table, DuplicatePolicy, TableError, TableRow, REQUIRED_COLUMNS};
