//! Inventory balance export ("库存余额表") parsing.
//!
//! Header cells are trimmed and mapped through an alias table onto the three
//! fields the reconciler reads. Unknown headers are ignored. When two headers
//! alias to the same field the leftmost one is used.
//!
//! The export is usually a workbook (`.xlsx` / `.xls`); only its first sheet
//! is read. Any other extension is read as CSV text.

use std::collections::BTreeMap;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use obd_reconcile::InventoryRecord;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{read_text_file, IngestError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InventoryField {
    Code,
    Model,
    Serial,
}

impl InventoryField {
    pub fn as_str(&self) -> &'static str {
        match self {
            InventoryField::Code => "code",
            InventoryField::Model => "model",
            InventoryField::Serial => "serial",
        }
    }
}

/// header label -> field
pub type InventoryAliases = BTreeMap<String, InventoryField>;

pub fn default_inventory_aliases() -> InventoryAliases {
    [
        ("存货编码", InventoryField::Code),
        ("商品编码", InventoryField::Code),
        ("在庫品番", InventoryField::Code),
        ("规格型号", InventoryField::Model),
        ("型番", InventoryField::Model),
        ("SN码", InventoryField::Serial),
        ("シリアル番号", InventoryField::Serial),
        ("SN", InventoryField::Serial),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

fn field_for(header: &str, aliases: &InventoryAliases) -> Option<InventoryField> {
    if let Some(f) = aliases.get(header) {
        return Some(*f);
    }
    // canonical names are always accepted
    match header {
        "code" => Some(InventoryField::Code),
        "model" => Some(InventoryField::Model),
        "serial" | "sn" => Some(InventoryField::Serial),
        _ => None,
    }
}

/// Header row plus data rows -> records. At least one of the code / model
/// columns must be present; the serial column is optional (no product is
/// serial-tracked without it).
fn records_from_rows<I>(
    header: &[String],
    rows: I,
    aliases: &InventoryAliases,
) -> Result<Vec<InventoryRecord>, IngestError>
where
    I: IntoIterator<Item = Result<Vec<String>, IngestError>>,
{
    let mut cols: BTreeMap<InventoryField, usize> = BTreeMap::new();
    for (i, h) in header.iter().enumerate() {
        if let Some(f) = field_for(h.trim(), aliases) {
            cols.entry(f).or_insert(i);
        }
    }

    let code_col = cols.get(&InventoryField::Code).copied();
    let model_col = cols.get(&InventoryField::Model).copied();
    let serial_col = cols.get(&InventoryField::Serial).copied();
    if code_col.is_none() && model_col.is_none() {
        return Err(IngestError::MissingHeader("code | model".to_string()));
    }

    let mut out = Vec::new();
    for row in rows {
        let row = row?;
        let cell = |c: Option<usize>| c.and_then(|i| row.get(i)).map_or("", |v| v.trim());

        let code = cell(code_col);
        let model = cell(model_col);
        let serial = cell(serial_col);
        if code.is_empty() && model.is_empty() && serial.is_empty() {
            continue;
        }
        let serial = if serial.is_empty() { None } else { Some(serial) };
        out.push(InventoryRecord::new(code, model, serial));
    }

    debug!(
        records = out.len(),
        serial_column = serial_col.is_some(),
        "inventory records parsed"
    );
    Ok(out)
}

/// Parse inventory CSV text.
pub fn parse_inventory_str(
    src: &str,
    aliases: &InventoryAliases,
) -> Result<Vec<InventoryRecord>, IngestError> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(src.as_bytes());

    let header: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    let rows = rdr.records().map(|rec| {
        rec.map(|r| r.iter().map(str::to_string).collect())
            .map_err(IngestError::from)
    });
    records_from_rows(&header, rows, aliases)
}

/// Whole-number floats print without a fraction: JANs stored as numbers
/// come back as `4901234567890`, not `4901234567890.0`.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        other => other.to_string(),
    }
}

/// Read the first sheet of a workbook (`.xlsx`, `.xlsm`, `.xlsb`, `.xls`, `.ods`).
pub fn read_inventory_workbook(
    path: &Path,
    aliases: &InventoryAliases,
) -> Result<Vec<InventoryRecord>, IngestError> {
    let mut wb = open_workbook_auto(path)
        .map_err(|e| IngestError::Workbook(format!("open '{}': {e}", path.display())))?;
    let range = wb
        .worksheet_range_at(0)
        .ok_or_else(|| IngestError::Workbook(format!("'{}' has no sheets", path.display())))?
        .map_err(|e| IngestError::Workbook(format!("read '{}': {e}", path.display())))?;

    let mut rows = range
        .rows()
        .map(|r| r.iter().map(cell_text).collect::<Vec<String>>());
    let Some(header) = rows.next() else {
        return Err(IngestError::MissingHeader("code | model".to_string()));
    };
    debug!(path = %path.display(), rows = range.height(), "workbook sheet loaded");
    records_from_rows(&header, rows.map(Ok), aliases)
}

fn is_workbook(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .is_some_and(|e| matches!(e.as_str(), "xlsx" | "xlsm" | "xlsb" | "xls" | "ods"))
}

/// Read an inventory export, picking the reader by file extension.
pub fn read_inventory_file(
    path: &Path,
    aliases: &InventoryAliases,
) -> Result<Vec<InventoryRecord>, IngestError> {
    if is_workbook(path) {
        return read_inventory_workbook(path, aliases);
    }
    let text = read_text_file(path)?;
    parse_inventory_str(&text, aliases)
}
