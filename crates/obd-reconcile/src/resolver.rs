//! Identity resolution.
//!
//! An order line names a product by JAN (usually an inventory code) and
//! optionally a model. [`Resolver`] tries an ordered list of
//! [`IdentityMatcher`]s; the first one that matches decides the identity.
//!
//! Default chain:
//! 1. [`ExactCode`]: JAN is a known code
//! 2. [`ModelFallback`]: line model is a known model
//! 3. [`JanAsModel`]: JAN is itself a known model
//!
//! Resolution never touches the serial pools.

use serde::Serialize;

use crate::{Identity, KnownIdentities};

/// Which matcher produced a resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchRule {
    ExactCode,
    ModelFallback,
    JanAsModel,
}

/// One step of the fallback chain.
pub trait IdentityMatcher {
    fn rule(&self) -> MatchRule;

    /// `jan` and `model` arrive trimmed.
    fn try_match(&self, jan: &str, model: &str, known: &KnownIdentities) -> Option<Identity>;
}

/// JAN equals a known inventory code. The line's own model rides along.
#[derive(Clone, Copy, Debug, Default)]
pub struct ExactCode;

impl IdentityMatcher for ExactCode {
    fn rule(&self) -> MatchRule {
        MatchRule::ExactCode
    }

    fn try_match(&self, jan: &str, model: &str, known: &KnownIdentities) -> Option<Identity> {
        if known.codes.contains(jan) {
            Some(Identity::new(jan, model))
        } else {
            None
        }
    }
}

/// Line model is a known model. Code comes from the model's first paired
/// code, or stays the JAN when the model was never seen with a code.
#[derive(Clone, Copy, Debug, Default)]
pub struct ModelFallback;

impl IdentityMatcher for ModelFallback {
    fn rule(&self) -> MatchRule {
        MatchRule::ModelFallback
    }

    fn try_match(&self, jan: &str, model: &str, known: &KnownIdentities) -> Option<Identity> {
        if model.is_empty() || !known.models.contains(model) {
            return None;
        }
        let code = known
            .model_to_code
            .get(model)
            .map(String::as_str)
            .unwrap_or(jan);
        Some(Identity::new(code, model))
    }
}

/// The JAN column actually holds a model identifier.
#[derive(Clone, Copy, Debug, Default)]
pub struct JanAsModel;

impl IdentityMatcher for JanAsModel {
    fn rule(&self) -> MatchRule {
        MatchRule::JanAsModel
    }

    fn try_match(&self, jan: &str, _model: &str, known: &KnownIdentities) -> Option<Identity> {
        if !known.models.contains(jan) {
            return None;
        }
        let code = known
            .model_to_code
            .get(jan)
            .map(String::as_str)
            .unwrap_or(jan);
        Some(Identity::new(code, jan))
    }
}

/// Outcome of resolving one line.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum Resolution {
    Matched { identity: Identity, rule: MatchRule },
    Unmatched,
}

impl Resolution {
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Resolution::Matched { identity, .. } => Some(identity),
            Resolution::Unmatched => None,
        }
    }
}

/// Ordered matcher chain.
pub struct Resolver {
    matchers: Vec<Box<dyn IdentityMatcher>>,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new(vec![
            Box::new(ExactCode),
            Box::new(ModelFallback),
            Box::new(JanAsModel),
        ])
    }
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rules: Vec<MatchRule> = self.matchers.iter().map(|m| m.rule()).collect();
        f.debug_struct("Resolver").field("rules", &rules).finish()
    }
}

impl Resolver {
    pub fn new(matchers: Vec<Box<dyn IdentityMatcher>>) -> Self {
        Self { matchers }
    }

    /// First matching strategy wins. An empty JAN with an empty model
    /// never matches (empty identities are not indexed).
    pub fn resolve(&self, jan: &str, model: &str, known: &KnownIdentities) -> Resolution {
        let jan = jan.trim();
        let model = model.trim();
        for m in &self.matchers {
            if let Some(identity) = m.try_match(jan, model, known) {
                return Resolution::Matched {
                    identity,
                    rule: m.rule(),
                };
            }
        }
        Resolution::Unmatched
    }
}
