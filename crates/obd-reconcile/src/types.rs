use serde::{Deserialize, Serialize};

/// One inventory row. Empty `code` / `model` mean "absent".
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub code: String,
    pub model: String,
    pub serial: Option<String>,
}

impl InventoryRecord {
    pub fn new(code: impl Into<String>, model: impl Into<String>, serial: Option<&str>) -> Self {
        Self {
            code: code.into(),
            model: model.into(),
            serial: serial.map(str::to_string),
        }
    }
}

/// One order row from the daily batch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub channel: String,
    /// Primary lookup key; matched against inventory codes first.
    pub jan: String,
    /// Secondary lookup key. May be empty.
    pub model: String,
    pub quantity: u64,
    /// Unit price in micros (1e-6).
    pub unit_price_micros: i64,
    /// Order reference, passed through untouched.
    pub note: String,
}

impl OrderLine {
    pub fn new(
        channel: impl Into<String>,
        jan: impl Into<String>,
        model: impl Into<String>,
        quantity: u64,
        unit_price_micros: i64,
        note: impl Into<String>,
    ) -> Self {
        Self {
            channel: channel.into(),
            jan: jan.into(),
            model: model.into(),
            quantity,
            unit_price_micros,
            note: note.into(),
        }
    }
}

/// The (code, model) pair an order line resolved to.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Identity {
    pub code: String,
    /// May be empty when the line carried no model and matched by code.
    pub model: String,
}

impl Identity {
    pub fn new(code: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            model: model.into(),
        }
    }
}

/// Classification of a resolved line. Exactly one holds per line, so an
/// unmatched line can never also be short.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineStatus {
    Clean,
    /// No inventory identity matched the JAN/model candidates.
    Unmatched,
    /// Serial-tracked product, pool could not cover the quantity.
    SerialShortage,
}

/// One output row of a channel batch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedLine {
    /// Resolved code, or the raw JAN when unmatched.
    pub resolved_code: String,
    pub resolved_model: String,
    /// Warehouse tag, passed through from the run.
    pub warehouse: String,
    pub quantity: u64,
    pub unit_price_micros: i64,
    /// Drawn serials in allocation order. Possibly fewer than `quantity`.
    pub serials: Vec<String>,
    pub note: String,
    pub status: LineStatus,
}

impl ResolvedLine {
    /// Comma-joined serial field as rendered on the sheet.
    pub fn serials_joined(&self) -> String {
        self.serials.join(",")
    }

    pub fn flag_error(&self) -> bool {
        self.status == LineStatus::Unmatched
    }

    pub fn flag_short(&self) -> bool {
        self.status == LineStatus::SerialShortage
    }
}

/// All resolved lines for one sales channel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelBatch {
    pub channel: String,
    pub lines: Vec<ResolvedLine>,
    pub has_error: bool,
    pub has_short: bool,
}

impl ChannelBatch {
    pub fn new(channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            lines: Vec::new(),
            has_error: false,
            has_short: false,
        }
    }

    /// Append a line and fold its flag into the channel aggregates.
    pub fn push(&mut self, line: ResolvedLine) {
        match line.status {
            LineStatus::Unmatched => self.has_error = true,
            LineStatus::SerialShortage => self.has_short = true,
            LineStatus::Clean => {}
        }
        self.lines.push(line);
    }

    /// Sheet row count including the header row.
    pub fn row_count(&self) -> usize {
        self.lines.len() + 1
    }

    /// Artifact stem: `"{channel}+{rowcount}"`.
    pub fn artifact_stem(&self) -> String {
        format!("{}+{}", self.channel, self.row_count())
    }
}
