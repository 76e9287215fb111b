//! Tiered, sorted view over the engine's current hypothesis set.
//!
//! The view is rebuilt from scratch on every refresh. Tiers drive display
//! emphasis only; nothing in the interview flow branches on them.

use serde::Serialize;

use crate::domain::Hypothesis;

/// Lower bound of the high tier, inclusive.
pub const HIGH_TIER_MIN: f64 = 70.0;
/// Lower bound of the medium tier, inclusive.
pub const MEDIUM_TIER_MIN: f64 = 40.0;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    High,
    Medium,
    Low,
}

impl Tier {
    pub fn for_probability(probability: f64) -> Self {
        if probability >= HIGH_TIER_MIN {
            Self::High
        } else if probability >= MEDIUM_TIER_MIN {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::High => "alta",
            Self::Medium => "media",
            Self::Low => "baja",
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RankedHypothesis {
    pub name: String,
    /// Clamped to 0..=100.
    pub probability: f64,
    pub tier: Tier,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct HypothesisRanking {
    entries: Vec<RankedHypothesis>,
}

impl HypothesisRanking {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Most probable first. Ties keep the engine's order.
    pub fn derive(hypotheses: &[Hypothesis]) -> Self {
        let mut entries: Vec<RankedHypothesis> = hypotheses
            .iter()
            .map(|h| {
                let probability = sanitize(h.probability);
                RankedHypothesis {
                    name: h.name.clone(),
                    probability,
                    tier: Tier::for_probability(probability),
                }
            })
            .collect();

        entries.sort_by(|a, b| b.probability.total_cmp(&a.probability));

        Self { entries }
    }

    pub fn entries(&self) -> &[RankedHypothesis] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when any candidate sits in the high tier, the cue that a
    /// technician will likely be needed.
    pub fn suggests_technician(&self) -> bool {
        self.entries.iter().any(|h| h.tier == Tier::High)
    }
}

fn sanitize(probability: f64) -> f64 {
    if probability.is_nan() {
        0.0
    } else {
        probability.clamp(0.0, 100.0)
    }
}
