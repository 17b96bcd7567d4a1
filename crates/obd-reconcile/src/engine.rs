use std::collections::BTreeSet;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
    ChannelBatch, InventoryIndex, LineStatus, OrderLine, ResolvedLine, Resolution, Resolver,
};

/// Order lines whose channel is not in the configured channel list. They are
/// never processed and never draw serials.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct UnroutedOrders {
    pub lines: usize,
    pub channels: BTreeSet<String>,
}

/// Full result of one reconciliation pass.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// One batch per configured channel that had orders, in channel order.
    pub batches: Vec<ChannelBatch>,
    /// Configured channels with no orders today, in channel order.
    pub empty_channels: Vec<String>,
    pub unrouted: UnroutedOrders,
}

impl ReconcileReport {
    pub fn has_error(&self) -> bool {
        self.batches.iter().any(|b| b.has_error)
    }

    pub fn has_short(&self) -> bool {
        self.batches.iter().any(|b| b.has_short)
    }

    pub fn line_count(&self) -> usize {
        self.batches.iter().map(|b| b.lines.len()).sum()
    }

    pub fn count_status(&self, status: LineStatus) -> usize {
        self.batches
            .iter()
            .flat_map(|b| b.lines.iter())
            .filter(|l| l.status == status)
            .count()
    }
}

/// Reconcile with the default matcher chain. See [`reconcile_with`].
pub fn reconcile(
    index: &mut InventoryIndex,
    orders: &[OrderLine],
    channels: &[String],
    warehouse: &str,
) -> ReconcileReport {
    reconcile_with(&Resolver::default(), index, orders, channels, warehouse)
}

/// Deterministic reconciliation pass:
/// - channels in the order given (first occurrence of a repeated name only),
///   lines within a channel stably sorted by JAN
/// - unmatched line => `Unmatched`, no allocation
/// - matched, never-serialized identity => `Clean`, empty serials
/// - matched, serialized identity => allocate; short => `SerialShortage`
///
/// Processing order is the allocation priority: an earlier line wins a
/// contested serial. Every order line of a configured channel yields exactly
/// one [`ResolvedLine`].
pub fn reconcile_with(
    resolver: &Resolver,
    index: &mut InventoryIndex,
    orders: &[OrderLine],
    channels: &[String],
    warehouse: &str,
) -> ReconcileReport {
    let mut report = ReconcileReport::default();

    let configured: BTreeSet<&str> = channels.iter().map(String::as_str).collect();
    for o in orders {
        if !configured.contains(o.channel.as_str()) {
            report.unrouted.lines += 1;
            report.unrouted.channels.insert(o.channel.clone());
        }
    }
    if report.unrouted.lines > 0 {
        warn!(
            lines = report.unrouted.lines,
            channels = ?report.unrouted.channels,
            "order lines for unconfigured channels were skipped"
        );
    }

    let mut seen: BTreeSet<&str> = BTreeSet::new();
    for channel in channels {
        if !seen.insert(channel.as_str()) {
            warn!(channel = %channel, "channel listed more than once; repeat ignored");
            continue;
        }
        let mut subset: Vec<&OrderLine> = orders.iter().filter(|o| &o.channel == channel).collect();
        if subset.is_empty() {
            debug!(channel = %channel, "no orders for channel");
            report.empty_channels.push(channel.clone());
            continue;
        }
        // Stable: equal JANs keep input order.
        subset.sort_by(|a, b| a.jan.trim().cmp(b.jan.trim()));

        let mut batch = ChannelBatch::new(channel.clone());
        for line in subset {
            batch.push(resolve_line(resolver, index, line, warehouse));
        }

        info!(
            channel = %batch.channel,
            lines = batch.lines.len(),
            has_error = batch.has_error,
            has_short = batch.has_short,
            "channel reconciled"
        );
        report.batches.push(batch);
    }

    report
}

fn resolve_line(
    resolver: &Resolver,
    index: &mut InventoryIndex,
    line: &OrderLine,
    warehouse: &str,
) -> ResolvedLine {
    let jan = line.jan.trim();
    let model = line.model.trim();

    let mut out = ResolvedLine {
        resolved_code: jan.to_string(),
        resolved_model: model.to_string(),
        warehouse: warehouse.to_string(),
        quantity: line.quantity,
        unit_price_micros: line.unit_price_micros,
        serials: Vec::new(),
        note: line.note.trim().to_string(),
        status: LineStatus::Clean,
    };

    let (identity, rule) = match resolver.resolve(jan, model, &index.known) {
        Resolution::Matched { identity, rule } => (identity, rule),
        Resolution::Unmatched => {
            warn!(channel = %line.channel, jan, model, note = %out.note, "no inventory identity");
            out.status = LineStatus::Unmatched;
            return out;
        }
    };

    out.resolved_code = identity.code.clone();
    out.resolved_model = identity.model.clone();

    if !index.serialized.needs_serial(&identity) {
        debug!(code = %identity.code, ?rule, "matched, not serial-tracked");
        return out;
    }

    let alloc = index
        .pool
        .allocate(&identity.code, &identity.model, line.quantity);
    if !alloc.enough {
        warn!(
            channel = %line.channel,
            code = %identity.code,
            model = %identity.model,
            wanted = line.quantity,
            got = alloc.serials.len(),
            "serial shortage"
        );
        out.status = LineStatus::SerialShortage;
    } else {
        debug!(code = %identity.code, ?rule, serials = alloc.serials.len(), "serials allocated");
    }
    out.serials = alloc.serials;
    out
}
