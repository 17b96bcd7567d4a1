//! obd-sheets
//!
//! Write side of the outbound pipeline: one CSV shipment sheet per channel
//! batch plus a run `manifest.json`.
//!
//! CSV cannot carry cell colours, so row highlighting (unmatched rows take
//! priority over shortage rows) is recorded in the manifest instead.

mod layout;
mod manifest;

pub use layout::{format_micros, render_rows, sheet_file_name, SheetLayout};
pub use manifest::{
    write_run_sheets, HighlightKind, ManifestInputs, ManifestSheet, ManifestTotals, RowHighlight,
    RunManifest, WriteRunArgs, WriteRunResult, MANIFEST_FILE, SCHEMA_VERSION,
};
