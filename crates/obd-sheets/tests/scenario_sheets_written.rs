use std::path::Path;

use obd_reconcile::{reconcile, InventoryIndex, InventoryRecord, OrderLine, MICROS_SCALE};
use obd_sheets::*;

fn report() -> obd_reconcile::ReconcileReport {
    let mut idx = InventoryIndex::build(&[
        InventoryRecord::new("A1", "", Some("S1")),
        InventoryRecord::new("B2", "", None),
    ]);
    let orders = vec![
        OrderLine::new("amazon", "B2", "", 1, 500 * MICROS_SCALE, "o-3"),
        OrderLine::new("amazon", "A1", "", 2, 1_980 * MICROS_SCALE, "o-1"),
        OrderLine::new("amazon", "ZZZ", "", 1, 0, "o-2"),
        OrderLine::new("qoo10", "B2", "", 4, 0, "q-1"),
    ];
    let channels = vec![
        "qoo10".to_string(),
        "rakuten".to_string(),
        "amazon".to_string(),
    ];
    reconcile(&mut idx, &orders, &channels, "通販倉庫")
}

fn read_rows(path: &Path) -> Vec<Vec<String>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .unwrap();
    rdr.records()
        .map(|r| r.unwrap().iter().map(str::to_string).collect())
        .collect()
}

#[test]
fn scenario_one_sheet_per_non_empty_channel_plus_manifest() {
    let dir = tempfile::tempdir().unwrap();
    let report = report();
    let layout = SheetLayout::default();

    let res = write_run_sheets(WriteRunArgs {
        out_dir: dir.path(),
        report: &report,
        layout: &layout,
        warehouse: "通販倉庫",
        config_hash: "abc123",
        orders_path: Path::new("/tmp/当日発送.csv"),
        inventory_path: Path::new("/tmp/库存余额表.csv"),
    })
    .unwrap();

    let names: Vec<String> = res
        .sheet_paths
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["qoo10+2.csv", "amazon+4.csv"]);
    assert!(res.manifest_path.exists());

    let m = &res.manifest;
    assert_eq!(m.schema_version, SCHEMA_VERSION);
    assert_eq!(m.inputs.orders, "当日発送.csv");
    assert_eq!(m.empty_channels, vec!["rakuten".to_string()]);
    assert_eq!(m.totals.lines, 4);
    assert_eq!(m.totals.unmatched, 1);
    assert_eq!(m.totals.shortage, 1);
}

#[test]
fn scenario_sheet_rows_and_trailers() {
    let dir = tempfile::tempdir().unwrap();
    let report = report();
    let layout = SheetLayout::default();

    let res = write_run_sheets(WriteRunArgs {
        out_dir: dir.path(),
        report: &report,
        layout: &layout,
        warehouse: "通販倉庫",
        config_hash: "abc123",
        orders_path: Path::new("orders.csv"),
        inventory_path: Path::new("inventory.csv"),
    })
    .unwrap();

    let rows = read_rows(&res.sheet_paths[1]);
    // header, A1, B2, ZZZ, blank, unmatched notice, shortage notice
    assert_eq!(rows.len(), 7);
    assert_eq!(rows[0], layout.header);
    assert_eq!(rows[1], vec!["A1", "通販倉庫", "2", "1980", "S1", "o-1"]);
    assert_eq!(rows[2], vec!["B2", "通販倉庫", "1", "500", "", "o-3"]);
    assert_eq!(rows[3], vec!["ZZZ", "通販倉庫", "1", "0", "", "o-2"]);
    assert!(rows[4].iter().all(String::is_empty));
    assert_eq!(rows[5], vec![layout.unmatched_notice.clone()]);
    assert_eq!(rows[6], vec![layout.shortage_notice.clone()]);

    let amazon = &res.manifest.sheets[1];
    assert_eq!(amazon.row_count, 4);
    assert_eq!(
        amazon.highlights,
        vec![
            RowHighlight {
                row: 2,
                kind: HighlightKind::Shortage
            },
            RowHighlight {
                row: 4,
                kind: HighlightKind::Error
            },
        ]
    );
}

#[test]
fn scenario_manifest_round_trips_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let report = report();

    let res = write_run_sheets(WriteRunArgs {
        out_dir: &dir.path().join("nested").join("out"),
        report: &report,
        layout: &SheetLayout::default(),
        warehouse: "なんば倉庫",
        config_hash: "h",
        orders_path: Path::new("o.csv"),
        inventory_path: Path::new("i.csv"),
    })
    .unwrap();

    let raw = std::fs::read_to_string(&res.manifest_path).unwrap();
    let m: RunManifest = serde_json::from_str(&raw).unwrap();
    assert_eq!(m.run_id, res.manifest.run_id);
    assert_eq!(m.warehouse, "なんば倉庫");
    assert_eq!(m.sheets.len(), 2);
}
