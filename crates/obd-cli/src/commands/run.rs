//! `obd run`: ingest -> reconcile -> write sheets.
//!
//! Input problems (unreadable file, wrong encoding, missing header column)
//! abort before reconciliation starts. Nothing is written in that case.

use std::path::Path;

use anyhow::{Context, Result};
use obd_config::UnusedKeyPolicy;
use obd_reconcile::InventoryIndex;
use tracing::{info, warn};

use super::{load_config, resolve_out_dir};

pub struct RunArgs {
    pub orders: String,
    pub inventory: String,
    pub warehouse: String,
    pub config_paths: Vec<String>,
    pub out_dir: Option<String>,
}

/// Execute `obd run`.
pub fn run_outbound(args: RunArgs) -> Result<()> {
    let loaded = load_config(&args.config_paths)?;
    let cfg = &loaded.config;
    cfg.check_warehouse(&args.warehouse)?;

    let unused = obd_config::report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Warn)?;
    for p in &unused.unused_leaf_pointers {
        warn!(pointer = %p, "unused config key");
    }

    let orders_path = Path::new(&args.orders);
    let inventory_path = Path::new(&args.inventory);

    let orders = obd_ingest::read_orders_file(orders_path, &cfg.orders.columns)
        .with_context(|| format!("read orders failed: {}", args.orders))?;
    let records = obd_ingest::read_inventory_file(inventory_path, &cfg.inventory.aliases)
        .with_context(|| format!("read inventory failed: {}", args.inventory))?;

    let mut index = InventoryIndex::build(&records);
    let report = obd_reconcile::reconcile(&mut index, &orders, &cfg.channels, &args.warehouse);

    let out_dir = resolve_out_dir(args.out_dir);
    let written = obd_sheets::write_run_sheets(obd_sheets::WriteRunArgs {
        out_dir: &out_dir,
        report: &report,
        layout: &cfg.sheet,
        warehouse: &args.warehouse,
        config_hash: &loaded.config_hash,
        orders_path,
        inventory_path,
    })?;

    let totals = &written.manifest.totals;
    info!(
        run_id = %written.manifest.run_id,
        sheets = written.sheet_paths.len(),
        lines = totals.lines,
        unmatched = totals.unmatched,
        shortage = totals.shortage,
        serials_left = index.pool.live_tokens(),
        "run complete"
    );

    for channel in &report.empty_channels {
        println!("no_orders channel={}", channel);
    }
    for p in &written.sheet_paths {
        println!("sheet={}", p.display());
    }
    println!("run_id={}", written.manifest.run_id);
    println!("warehouse={}", args.warehouse);
    println!("config_hash={}", loaded.config_hash);
    println!(
        "lines={} unmatched={} shortage={} unrouted={}",
        totals.lines, totals.unmatched, totals.shortage, totals.unrouted
    );
    println!("has_error={} has_short={}", report.has_error(), report.has_short());
    println!("manifest_path={}", written.manifest_path.display());

    Ok(())
}
