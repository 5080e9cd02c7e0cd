use crate::NUM_ACTIONS;
use crate::Probability;
use rand::rngs::SmallRng;

/// seam through which the response algorithms bend the opponent
/// seat of a cfr+ run. the trainer side is never consulted, so
/// regrets stay standard while the opponent can be pinned to a
/// fixed or empirical policy.
pub trait Restriction {
    /// called once at the top of every iteration, before either
    /// trainer seat traverses
    fn begin(&mut self, rng: &mut SmallRng);

    /// called at every opponent decision. `matched` is the regret
    /// matched distribution the opponent would otherwise play;
    /// returning `Some` replaces it for this visit.
    fn policy(
        &mut self,
        index: usize,
        matched: &[Probability; NUM_ACTIONS],
        rng: &mut SmallRng,
    ) -> Option<[Probability; NUM_ACTIONS]>;
}
