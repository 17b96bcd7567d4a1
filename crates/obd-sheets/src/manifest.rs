use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use obd_reconcile::{ChannelBatch, LineStatus, ReconcileReport};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::{render_rows, sheet_file_name, SheetLayout};

pub const SCHEMA_VERSION: i32 = 1;
pub const MANIFEST_FILE: &str = "manifest.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HighlightKind {
    Error,
    Shortage,
}

/// A highlighted sheet row. `row` is 1-based and counts the header as row 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowHighlight {
    pub row: usize,
    pub kind: HighlightKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestSheet {
    pub channel: String,
    pub file_name: String,
    /// Header + line rows; trailers excluded.
    pub row_count: usize,
    pub has_error: bool,
    pub has_short: bool,
    pub highlights: Vec<RowHighlight>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestInputs {
    pub orders: String,
    pub inventory: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestTotals {
    pub lines: usize,
    pub unmatched: usize,
    pub shortage: usize,
    pub unrouted: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    pub schema_version: i32,
    pub run_id: Uuid,
    pub created_at_utc: DateTime<Utc>,
    pub warehouse: String,
    pub config_hash: String,
    pub inputs: ManifestInputs,
    pub totals: ManifestTotals,
    pub empty_channels: Vec<String>,
    pub sheets: Vec<ManifestSheet>,
}

pub struct WriteRunArgs<'a> {
    pub out_dir: &'a Path,
    pub report: &'a ReconcileReport,
    pub layout: &'a SheetLayout,
    pub warehouse: &'a str,
    pub config_hash: &'a str,
    pub orders_path: &'a Path,
    pub inventory_path: &'a Path,
}

pub struct WriteRunResult {
    pub sheet_paths: Vec<PathBuf>,
    pub manifest_path: PathBuf,
    pub manifest: RunManifest,
}

fn highlights(batch: &ChannelBatch) -> Vec<RowHighlight> {
    batch
        .lines
        .iter()
        .enumerate()
        .filter_map(|(i, l)| {
            let kind = match l.status {
                LineStatus::Unmatched => HighlightKind::Error,
                LineStatus::SerialShortage => HighlightKind::Shortage,
                LineStatus::Clean => return None,
            };
            // +1 for the header, +1 for 1-based rows
            Some(RowHighlight { row: i + 2, kind })
        })
        .collect()
}

fn write_sheet(path: &Path, rows: &[Vec<String>]) -> Result<()> {
    let mut w = csv::WriterBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("create sheet failed: {}", path.display()))?;
    for row in rows {
        w.write_record(row)
            .with_context(|| format!("write sheet row failed: {}", path.display()))?;
    }
    w.flush()
        .with_context(|| format!("flush sheet failed: {}", path.display()))?;
    Ok(())
}

fn file_label(p: &Path) -> String {
    p.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| p.display().to_string())
}

/// Write one sheet per batch and the run manifest into `out_dir`.
///
/// Existing files with the same names are overwritten.
pub fn write_run_sheets(args: WriteRunArgs<'_>) -> Result<WriteRunResult> {
    fs::create_dir_all(args.out_dir)
        .with_context(|| format!("create output dir failed: {}", args.out_dir.display()))?;

    let mut sheet_paths = Vec::with_capacity(args.report.batches.len());
    let mut sheets = Vec::with_capacity(args.report.batches.len());

    for batch in &args.report.batches {
        let file_name = sheet_file_name(batch);
        let path = args.out_dir.join(&file_name);
        write_sheet(&path, &render_rows(batch, args.layout))?;
        info!(channel = %batch.channel, path = %path.display(), rows = batch.row_count(), "sheet written");

        sheets.push(ManifestSheet {
            channel: batch.channel.clone(),
            file_name,
            row_count: batch.row_count(),
            has_error: batch.has_error,
            has_short: batch.has_short,
            highlights: highlights(batch),
        });
        sheet_paths.push(path);
    }

    let manifest = RunManifest {
        schema_version: SCHEMA_VERSION,
        run_id: Uuid::new_v4(),
        created_at_utc: Utc::now(),
        warehouse: args.warehouse.to_string(),
        config_hash: args.config_hash.to_string(),
        inputs: ManifestInputs {
            orders: file_label(args.orders_path),
            inventory: file_label(args.inventory_path),
        },
        totals: ManifestTotals {
            lines: args.report.line_count(),
            unmatched: args.report.count_status(LineStatus::Unmatched),
            shortage: args.report.count_status(LineStatus::SerialShortage),
            unrouted: args.report.unrouted.lines,
        },
        empty_channels: args.report.empty_channels.clone(),
        sheets,
    };

    let manifest_path = args.out_dir.join(MANIFEST_FILE);
    let json = serde_json::to_string_pretty(&manifest).context("serialize manifest failed")?;
    fs::write(&manifest_path, format!("{json}\n"))
        .with_context(|| format!("write manifest failed: {}", manifest_path.display()))?;

    Ok(WriteRunResult {
        sheet_paths,
        manifest_path,
        manifest,
    })
}
