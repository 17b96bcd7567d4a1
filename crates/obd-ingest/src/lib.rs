//! obd-ingest
//!
//! Read side of the outbound pipeline: turns the daily order export and the
//! inventory balance export into [`obd_reconcile::OrderLine`] and
//! [`obd_reconcile::InventoryRecord`] values.
//!
//! This crate only decodes and normalises cells. It does not reconcile and it
//! does not write anything. Any failure here is fatal to the run; the
//! reconciliation core is never started on partial input.

mod decode;
mod error;
mod inventory;
mod numeric;
mod orders;

pub use decode::{decode_text, read_text_file, TextEncoding};
pub use error::IngestError;
pub use inventory::{
    default_inventory_aliases, parse_inventory_str, read_inventory_file, read_inventory_workbook,
    InventoryAliases, InventoryField,
};
pub use numeric::{parse_quantity, price_to_micros, strip_cell_spaces, NumericError};
pub use orders::{parse_orders_str, read_orders_file, OrderColumns};
