//! Inventory index and serial pools.
//!
//! [`InventoryIndex::build`] scans the inventory once. Everything it produces
//! is fixed for the run except the [`SerialPool`], which depletes as
//! [`SerialPool::allocate`] draws serials.
//!
//! Serials are stored as tokens: token `i` is the i-th serial row seen in the
//! scan. The per-code and per-model pools hold token ids, so a row carrying
//! both a code and a model is the *same* token in both views. Drawing a token
//! kills it everywhere; two rows that happen to carry the same serial string
//! stay two distinct tokens.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use serde::Serialize;
use tracing::debug;

use crate::{Identity, InventoryRecord};

/// Every non-empty code and model present in the inventory, serial or not.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KnownIdentities {
    pub codes: BTreeSet<String>,
    pub models: BTreeSet<String>,
    /// model -> first code seen paired with it. First write wins.
    pub model_to_code: BTreeMap<String, String>,
}

/// Identities that had at least one serial row at scan time.
///
/// Write-once: allocation never touches these, so "is this product
/// serial-tracked" keeps answering yes after its pool is drained.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SerializedMarkers {
    pub codes: BTreeSet<String>,
    pub models: BTreeSet<String>,
}

impl SerializedMarkers {
    pub fn needs_serial(&self, identity: &Identity) -> bool {
        self.codes.contains(&identity.code) || self.models.contains(&identity.model)
    }
}

/// Result of one [`SerialPool::allocate`] call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Allocation {
    /// Drawn serials: code pool first, then model pool, FIFO within each.
    pub serials: Vec<String>,
    /// Combined pool covered the requested quantity at call time.
    pub enough: bool,
}

impl Allocation {
    fn nothing_needed() -> Self {
        Self {
            serials: Vec::new(),
            enough: true,
        }
    }
}

/// Depleting serial pools keyed by code and by model.
#[derive(Clone, Debug, Default)]
pub struct SerialPool {
    /// token id -> serial string
    tokens: Vec<String>,
    /// token id -> not yet drawn
    live: Vec<bool>,
    by_code: BTreeMap<String, VecDeque<usize>>,
    by_model: BTreeMap<String, VecDeque<usize>>,
}

impl SerialPool {
    fn push(&mut self, code: &str, model: &str, serial: &str) {
        let id = self.tokens.len();
        self.tokens.push(serial.to_string());
        self.live.push(true);
        if !code.is_empty() {
            self.by_code.entry(code.to_string()).or_default().push_back(id);
        }
        if !model.is_empty() {
            self.by_model
                .entry(model.to_string())
                .or_default()
                .push_back(id);
        }
    }

    fn live_ids<'a>(
        &'a self,
        view: &'a BTreeMap<String, VecDeque<usize>>,
        key: &str,
    ) -> impl Iterator<Item = usize> + 'a {
        view.get(key)
            .into_iter()
            .flatten()
            .copied()
            .filter(move |id| self.live.get(*id).copied().unwrap_or(false))
    }

    /// Live serials still drawable under `code`, in draw order.
    pub fn available_for_code(&self, code: &str) -> Vec<&str> {
        self.live_ids(&self.by_code, code)
            .filter_map(|id| self.tokens.get(id).map(String::as_str))
            .collect()
    }

    /// Live serials still drawable under `model`, in draw order.
    pub fn available_for_model(&self, model: &str) -> Vec<&str> {
        self.live_ids(&self.by_model, model)
            .filter_map(|id| self.tokens.get(id).map(String::as_str))
            .collect()
    }

    /// Total serial tokens seen at build time (drawn or not).
    pub fn total_tokens(&self) -> usize {
        self.tokens.len()
    }

    /// Tokens not yet drawn.
    pub fn live_tokens(&self) -> usize {
        self.live.iter().filter(|l| **l).count()
    }

    /// Draw up to `quantity` serials for `(code, model)`.
    ///
    /// The combined pool is the live code pool, extended with the live model
    /// pool only when the code pool alone cannot cover `quantity` and `model`
    /// is non-empty. A token already taken from the code pool is not counted
    /// twice. When the combined pool is short everything in it is drawn and
    /// `enough` is false.
    ///
    /// Quantity 0 draws nothing and reports `enough`.
    pub fn allocate(&mut self, code: &str, model: &str, quantity: u64) -> Allocation {
        if quantity == 0 {
            return Allocation::nothing_needed();
        }
        let want = usize::try_from(quantity).unwrap_or(usize::MAX);

        let mut picked: Vec<usize> = self.live_ids(&self.by_code, code).collect();
        if picked.len() < want && !model.is_empty() {
            let seen: BTreeSet<usize> = picked.iter().copied().collect();
            let extra: Vec<usize> = self
                .live_ids(&self.by_model, model)
                .filter(|id| !seen.contains(id))
                .collect();
            picked.extend(extra);
        }

        let enough = picked.len() >= want;
        picked.truncate(want);

        for id in &picked {
            if let Some(slot) = self.live.get_mut(*id) {
                *slot = false;
            }
        }
        self.compact(code, model);

        let serials = picked
            .iter()
            .filter_map(|id| self.tokens.get(*id).cloned())
            .collect();

        Allocation { serials, enough }
    }

    /// Drop dead ids from the two views just touched. Other views skip dead
    /// ids lazily.
    fn compact(&mut self, code: &str, model: &str) {
        let live = &self.live;
        let is_live = |id: &usize| live.get(*id).copied().unwrap_or(false);
        if let Some(q) = self.by_code.get_mut(code) {
            q.retain(is_live);
        }
        if let Some(q) = self.by_model.get_mut(model) {
            q.retain(is_live);
        }
    }
}

/// Everything the driver needs from one inventory scan.
#[derive(Clone, Debug, Default)]
pub struct InventoryIndex {
    pub known: KnownIdentities,
    pub serialized: SerializedMarkers,
    pub pool: SerialPool,
}

impl InventoryIndex {
    /// Single pass over `records`. Fields are trimmed; empty means absent.
    /// Never fails.
    pub fn build(records: &[InventoryRecord]) -> Self {
        let mut idx = InventoryIndex::default();

        for r in records {
            let code = r.code.trim();
            let model = r.model.trim();
            let serial = r.serial.as_deref().map(str::trim).unwrap_or("");

            if !code.is_empty() {
                idx.known.codes.insert(code.to_string());
            }
            if !model.is_empty() {
                idx.known.models.insert(model.to_string());
            }

            if !serial.is_empty() {
                if !code.is_empty() {
                    idx.serialized.codes.insert(code.to_string());
                }
                if !model.is_empty() {
                    idx.serialized.models.insert(model.to_string());
                }
                if !code.is_empty() || !model.is_empty() {
                    idx.pool.push(code, model, serial);
                }
            }

            if !code.is_empty() && !model.is_empty() {
                idx.known
                    .model_to_code
                    .entry(model.to_string())
                    .or_insert_with(|| code.to_string());
            }
        }

        debug!(
            records = records.len(),
            codes = idx.known.codes.len(),
            models = idx.known.models.len(),
            serial_tokens = idx.pool.total_tokens(),
            "inventory index built"
        );

        idx
    }
}
