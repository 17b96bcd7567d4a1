//! Daily order export ("当日発送") parsing.
//!
//! ## Column contract (names configurable, order-independent)
//!
//! | Field        | Default header | Required | Notes                          |
//! |--------------|----------------|----------|--------------------------------|
//! | `channel`    | `店舗名`       | yes      | Sales channel name             |
//! | `jan`        | `JANコード`    | yes      | Primary product key            |
//! | `model`      | `规格型号`     | no       | Secondary key; empty if absent |
//! | `quantity`   | `数量`         | yes      | Bad / negative / empty -> 0    |
//! | `unit_price` | `単価`         | yes      | Decimal; bad / empty -> 0      |
//! | `note`       | `注文番号`     | yes      | Order reference                |

use std::path::Path;

use obd_reconcile::OrderLine;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{parse_quantity, price_to_micros, read_text_file, IngestError};

/// Header names of the order export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderColumns {
    pub channel: String,
    pub jan: String,
    pub model: String,
    pub quantity: String,
    pub unit_price: String,
    pub note: String,
}

impl Default for OrderColumns {
    fn default() -> Self {
        Self {
            channel: "店舗名".to_string(),
            jan: "JANコード".to_string(),
            model: "规格型号".to_string(),
            quantity: "数量".to_string(),
            unit_price: "単価".to_string(),
            note: "注文番号".to_string(),
        }
    }
}

struct OrderIndex {
    channel: usize,
    jan: usize,
    model: Option<usize>,
    quantity: usize,
    unit_price: usize,
    note: usize,
}

fn locate(headers: &[String], name: &str) -> Option<usize> {
    headers.iter().position(|h| h == name.trim())
}

fn require(headers: &[String], name: &str) -> Result<usize, IngestError> {
    locate(headers, name).ok_or_else(|| IngestError::MissingHeader(name.to_string()))
}

/// Parse order CSV text. An empty document yields no lines.
pub fn parse_orders_str(src: &str, cols: &OrderColumns) -> Result<Vec<OrderLine>, IngestError> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(src.as_bytes());

    let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();
    if headers.iter().all(String::is_empty) {
        return Ok(Vec::new());
    }

    let idx = OrderIndex {
        channel: require(&headers, &cols.channel)?,
        jan: require(&headers, &cols.jan)?,
        model: locate(&headers, &cols.model),
        quantity: require(&headers, &cols.quantity)?,
        unit_price: require(&headers, &cols.unit_price)?,
        note: require(&headers, &cols.note)?,
    };

    let mut out = Vec::new();
    for rec in rdr.records() {
        let rec = rec?;
        if rec.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        let row = rec.position().map(|p| p.line()).unwrap_or(0);
        let cell = |i: usize| rec.get(i).unwrap_or("").trim();

        let quantity = match parse_quantity(cell(idx.quantity)) {
            Ok(q) => q,
            Err(e) => {
                warn!(row, error = %e, "quantity coerced to 0");
                0
            }
        };
        let unit_price_micros = match price_to_micros(cell(idx.unit_price)) {
            Ok(p) => p,
            Err(e) => {
                warn!(row, error = %e, "unit price coerced to 0");
                0
            }
        };

        out.push(OrderLine::new(
            cell(idx.channel),
            cell(idx.jan),
            idx.model.map(cell).unwrap_or(""),
            quantity,
            unit_price_micros,
            cell(idx.note),
        ));
    }

    debug!(lines = out.len(), "order lines parsed");
    Ok(out)
}

/// Read, decode and parse an order export file.
pub fn read_orders_file(path: &Path, cols: &OrderColumns) -> Result<Vec<OrderLine>, IngestError> {
    let text = read_text_file(path)?;
    parse_orders_str(&text, cols)
}

#[cfg(test)]
mod tests {
    use super::*;
    use obd_reconcile::MICROS_SCALE;

    const HEADER: &str = "店舗名,注文番号,JANコード,规格型号,数量,単価";

    #[test]
    fn empty_input_returns_empty_vec() {
        assert!(parse_orders_str("", &OrderColumns::default()).unwrap().is_empty());
    }

    #[test]
    fn header_only_returns_empty_vec() {
        assert!(parse_orders_str(HEADER, &OrderColumns::default())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn missing_required_header_returns_err() {
        let err = parse_orders_str("店舗名,JANコード,数量,単価", &OrderColumns::default())
            .unwrap_err();
        assert_eq!(err, IngestError::MissingHeader("注文番号".to_string()));
    }

    #[test]
    fn model_column_is_optional() {
        let csv = "店舗名,注文番号,JANコード,数量,単価\nshop,o-1,4901,2,100\n";
        let lines = parse_orders_str(csv, &OrderColumns::default()).unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].model, "");
        assert_eq!(lines[0].quantity, 2);
    }

    #[test]
    fn rows_parsed_and_trimmed() {
        let csv = format!(
            "{HEADER}\n 販売一丁目 Amazon店 , 250101-1 , 4901 , M-1 , 3 , 1980 \n"
        );
        let lines = parse_orders_str(&csv, &OrderColumns::default()).unwrap();
        let l = &lines[0];
        assert_eq!(l.channel, "販売一丁目 Amazon店");
        assert_eq!(l.note, "250101-1");
        assert_eq!(l.jan, "4901");
        assert_eq!(l.model, "M-1");
        assert_eq!(l.quantity, 3);
        assert_eq!(l.unit_price_micros, 1980 * MICROS_SCALE);
    }

    #[test]
    fn bad_numbers_coerced_to_zero() {
        let csv = format!("{HEADER}\nshop,o,4901,,-2,abc\nshop,o,4902,,\u{3000},\n");
        let lines = parse_orders_str(&csv, &OrderColumns::default()).unwrap();
        assert_eq!(lines[0].quantity, 0);
        assert_eq!(lines[0].unit_price_micros, 0);
        assert_eq!(lines[1].quantity, 0);
        assert_eq!(lines[1].unit_price_micros, 0);
    }

    #[test]
    fn quoted_fields_with_commas() {
        let csv = format!("{HEADER}\nshop,\"o-1,o-2\",4901,,1,\"1,980\"\n");
        let lines = parse_orders_str(&csv, &OrderColumns::default()).unwrap();
        assert_eq!(lines[0].note, "o-1,o-2");
        // thousands separators are not a number
        assert_eq!(lines[0].unit_price_micros, 0);
    }

    #[test]
    fn blank_rows_skipped_and_short_rows_padded() {
        let csv = format!("{HEADER}\n,,,,,\nshop,o,4901\n");
        let lines = parse_orders_str(&csv, &OrderColumns::default()).unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, 0);
    }

    #[test]
    fn custom_column_names() {
        let cols = OrderColumns {
            channel: "store".into(),
            jan: "jan".into(),
            model: "model".into(),
            quantity: "qty".into(),
            unit_price: "price".into(),
            note: "order".into(),
        };
        let csv = "order,store,jan,qty,price\nX1,shop,4901,5,9.99\n";
        let lines = parse_orders_str(csv, &cols).unwrap();
        assert_eq!(lines[0].quantity, 5);
        assert_eq!(lines[0].unit_price_micros, 9_990_000);
    }

    #[test]
    fn read_from_bom_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orders.csv");
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(format!("{HEADER}\nshop,o,4901,,1,1\n").as_bytes());
        std::fs::write(&path, bytes).unwrap();

        let lines = read_orders_file(&path, &OrderColumns::default()).unwrap();
        assert_eq!(lines[0].channel, "shop");
    }
}
