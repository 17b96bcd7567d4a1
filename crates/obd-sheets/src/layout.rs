use obd_reconcile::{ChannelBatch, ResolvedLine};
use serde::{Deserialize, Serialize};

/// Fixed sheet text: header labels and the trailer notices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetLayout {
    /// Exactly six labels: code, warehouse, quantity, unit price, serials, note.
    pub header: Vec<String>,
    /// Appended (after a blank row) when the batch has unmatched lines.
    pub unmatched_notice: String,
    /// Appended when the batch has serial shortages.
    pub shortage_notice: String,
}

impl Default for SheetLayout {
    fn default() -> Self {
        Self {
            header: ["存货编码", "仓库", "数量", "单价", "SN码", "备注"]
                .into_iter()
                .map(str::to_string)
                .collect(),
            unmatched_notice: "当前表格中有未找到的JANコード".to_string(),
            shortage_notice: "SN码不足".to_string(),
        }
    }
}

/// Render micros as the shortest exact decimal: `1980000000` -> `"1980"`,
/// `12500000` -> `"12.5"`.
pub fn format_micros(micros: i64) -> String {
    let sign = if micros < 0 { "-" } else { "" };
    let abs = micros.unsigned_abs();
    let int_part = abs / 1_000_000;
    let frac = abs % 1_000_000;
    if frac == 0 {
        return format!("{sign}{int_part}");
    }
    let frac = format!("{frac:06}");
    format!("{sign}{int_part}.{}", frac.trim_end_matches('0'))
}

fn line_row(l: &ResolvedLine) -> Vec<String> {
    vec![
        l.resolved_code.clone(),
        l.warehouse.clone(),
        l.quantity.to_string(),
        format_micros(l.unit_price_micros),
        l.serials_joined(),
        l.note.clone(),
    ]
}

/// All sheet rows in order: header, one row per line, then trailers.
pub fn render_rows(batch: &ChannelBatch, layout: &SheetLayout) -> Vec<Vec<String>> {
    let mut rows = Vec::with_capacity(batch.lines.len() + 4);
    rows.push(layout.header.clone());
    rows.extend(batch.lines.iter().map(line_row));
    if batch.has_error {
        // blank separator row, as wide as the header
        rows.push(vec![String::new(); layout.header.len()]);
        rows.push(vec![layout.unmatched_notice.clone()]);
    }
    if batch.has_short {
        rows.push(vec![layout.shortage_notice.clone()]);
    }
    rows
}

/// `{channel}+{rowcount}.csv`, with path separators in the channel name
/// replaced so the file always lands in the output directory.
pub fn sheet_file_name(batch: &ChannelBatch) -> String {
    let stem: String = batch
        .artifact_stem()
        .chars()
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect();
    format!("{stem}.csv")
}

#[cfg(test)]
mod tests {
    use super::*;
    use obd_reconcile::LineStatus;

    fn line(code: &str, status: LineStatus, serials: &[&str]) -> ResolvedLine {
        ResolvedLine {
            resolved_code: code.to_string(),
            resolved_model: String::new(),
            warehouse: "通販倉庫".to_string(),
            quantity: 2,
            unit_price_micros: 1_980_500_000,
            serials: serials.iter().map(|s| s.to_string()).collect(),
            note: "250101-1".to_string(),
            status,
        }
    }

    #[test]
    fn format_micros_is_minimal_and_exact() {
        assert_eq!(format_micros(0), "0");
        assert_eq!(format_micros(1_980_000_000), "1980");
        assert_eq!(format_micros(12_500_000), "12.5");
        assert_eq!(format_micros(1), "0.000001");
        assert_eq!(format_micros(-3_250_000), "-3.25");
    }

    #[test]
    fn clean_batch_has_no_trailers() {
        let mut b = ChannelBatch::new("shop");
        b.push(line("A1", LineStatus::Clean, &["S1", "S2"]));
        let rows = render_rows(&b, &SheetLayout::default());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][0], "存货编码");
        assert_eq!(
            rows[1],
            vec!["A1", "通販倉庫", "2", "1980.5", "S1,S2", "250101-1"]
        );
    }

    #[test]
    fn trailers_follow_flags() {
        let layout = SheetLayout::default();
        let mut b = ChannelBatch::new("shop");
        b.push(line("ZZZ", LineStatus::Unmatched, &[]));
        b.push(line("A1", LineStatus::SerialShortage, &["S1"]));
        let rows = render_rows(&b, &layout);
        assert_eq!(rows.len(), 6);
        assert!(rows[3].iter().all(String::is_empty));
        assert_eq!(rows[4], vec![layout.unmatched_notice.clone()]);
        assert_eq!(rows[5], vec![layout.shortage_notice.clone()]);
    }

    #[test]
    fn shortage_only_has_no_blank_separator() {
        let layout = SheetLayout::default();
        let mut b = ChannelBatch::new("shop");
        b.push(line("A1", LineStatus::SerialShortage, &[]));
        let rows = render_rows(&b, &layout);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2], vec![layout.shortage_notice]);
    }

    #[test]
    fn file_name_embeds_row_count_and_sanitizes() {
        let mut b = ChannelBatch::new("a/b");
        b.push(line("A1", LineStatus::Clean, &[]));
        assert_eq!(sheet_file_name(&b), "a_b+2.csv");
    }
}
