pub mod aivat;
pub mod chips;
pub mod imaginary;

use crate::Utility;
use crate::cfr::strategy::Strategy;
use crate::error::Result;
use crate::sampling::state::HandState;

/// off-policy utility estimation from a single logged hand: given
/// the strategy that actually sampled the actions, score what each
/// evaluated strategy would have earned. two player games only.
pub trait Estimator {
    fn estimate(
        &self,
        state: &HandState,
        seat: usize,
        sampling: &Strategy,
        evaluated: &[&Strategy],
    ) -> Result<Vec<Utility>>;
}
