//! Pure derivations from engine data to what the operator sees.

pub mod hypotheses;
pub mod result;

pub use hypotheses::{HypothesisRanking, RankedHypothesis, Tier};
pub use result::{ResultPanel, ResultView};
