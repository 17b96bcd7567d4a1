use obd_reconcile::*;

const SHOP: &str = "shop";

fn channels() -> Vec<String> {
    vec![SHOP.to_string()]
}

fn order(jan: &str, model: &str, qty: u64, note: &str) -> OrderLine {
    OrderLine::new(SHOP, jan, model, qty, 1_980 * MICROS_SCALE, note)
}

#[test]
fn scenario_clean_match_then_shortage() {
    let mut idx = InventoryIndex::build(&[
        InventoryRecord::new("A1", "", Some("S1")),
        InventoryRecord::new("A1", "", Some("S2")),
        InventoryRecord::new("A1", "", Some("S3")),
    ]);
    let orders = vec![order("A1", "", 2, "o-1"), order("A1", "", 2, "o-2")];

    let r = reconcile(&mut idx, &orders, &channels(), "WH");
    let b = &r.batches[0];

    assert_eq!(b.lines[0].serials_joined(), "S1,S2");
    assert_eq!(b.lines[0].status, LineStatus::Clean);

    assert_eq!(b.lines[1].serials_joined(), "S3");
    assert_eq!(b.lines[1].status, LineStatus::SerialShortage);
    assert!(b.lines[1].flag_short());

    assert!(b.has_short);
    assert!(!b.has_error);
}

#[test]
fn scenario_need_detection_persists_after_drain() {
    let mut idx = InventoryIndex::build(&[InventoryRecord::new("A1", "", Some("S1"))]);
    let orders = vec![
        order("A1", "", 1, "first"),
        order("A1", "", 1, "second"),
        order("A1", "", 1, "third"),
    ];

    let r = reconcile(&mut idx, &orders, &channels(), "WH");
    let lines = &r.batches[0].lines;

    assert_eq!(lines[0].serials, vec!["S1"]);
    for l in &lines[1..] {
        assert_eq!(l.status, LineStatus::SerialShortage);
        assert!(l.serials.is_empty());
    }
    assert!(idx.serialized.codes.contains("A1"));
}

#[test]
fn scenario_zero_quantity_on_serialized_product_is_clean() {
    let mut idx = InventoryIndex::build(&[InventoryRecord::new("A1", "", Some("S1"))]);
    let orders = vec![order("A1", "", 0, "zero"), order("A1", "", 1, "one")];

    let r = reconcile(&mut idx, &orders, &channels(), "WH");
    let lines = &r.batches[0].lines;
    assert_eq!(lines[0].status, LineStatus::Clean);
    assert!(lines[0].serials.is_empty());
    assert_eq!(lines[1].serials, vec!["S1"]);
}

#[test]
fn scenario_model_pool_tops_up_code_pool() {
    let mut idx = InventoryIndex::build(&[
        InventoryRecord::new("A1", "M1", Some("S1")),
        InventoryRecord::new("", "M1", Some("S2")),
    ]);
    // Matched by exact code, line carries the model: code pool has S1 only,
    // model pool contributes S2 (S1 is the same token and not counted twice).
    let orders = vec![order("A1", "M1", 2, "o")];

    let r = reconcile(&mut idx, &orders, &channels(), "WH");
    let l = &r.batches[0].lines[0];
    assert_eq!(l.serials, vec!["S1", "S2"]);
    assert_eq!(l.status, LineStatus::Clean);
    assert_eq!(idx.pool.live_tokens(), 0);
}

#[test]
fn scenario_stable_jan_sort_decides_priority() {
    let mut idx = InventoryIndex::build(&[
        InventoryRecord::new("A1", "", Some("S1")),
        InventoryRecord::new("B2", "", Some("T1")),
    ]);
    // Input order B2, A1(first), A1(second). Sorted: A1(first), A1(second), B2.
    let orders = vec![
        order("B2", "", 1, "b"),
        order("A1", "", 1, "a-first"),
        order("A1", "", 1, "a-second"),
    ];

    let r = reconcile(&mut idx, &orders, &channels(), "WH");
    let notes: Vec<&str> = r.batches[0].lines.iter().map(|l| l.note.as_str()).collect();
    assert_eq!(notes, vec!["a-first", "a-second", "b"]);

    let lines = &r.batches[0].lines;
    assert_eq!(lines[0].serials, vec!["S1"]);
    assert_eq!(lines[1].status, LineStatus::SerialShortage);
    assert_eq!(lines[2].serials, vec!["T1"]);
}

#[test]
fn scenario_earlier_channel_wins_contested_serials() {
    let mut idx = InventoryIndex::build(&[InventoryRecord::new("A1", "", Some("S1"))]);
    let orders = vec![
        OrderLine::new("second", "A1", "", 1, 0, "late"),
        OrderLine::new("first", "A1", "", 1, 0, "early"),
    ];
    let chans = vec!["first".to_string(), "second".to_string()];

    let r = reconcile(&mut idx, &orders, &chans, "WH");
    assert_eq!(r.batches[0].channel, "first");
    assert_eq!(r.batches[0].lines[0].serials, vec!["S1"]);
    assert_eq!(r.batches[1].channel, "second");
    assert!(r.batches[1].has_short);
}
