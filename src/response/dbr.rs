use crate::NUM_ACTIONS;
use crate::Probability;
use crate::cfr::plus::CfrPlus;
use crate::cfr::restriction::Restriction;
use crate::error::Error;
use crate::error::Result;
use crate::game::game::Game;
use crate::sampling::samples::Samples;
use crate::tree::builder::Builder;
use rand::Rng;
use rand::rngs::SmallRng;

/// data biased response: cfr+ against an opponent pinned, per
/// infoset, to the action frequencies observed in match logs. the
/// pin strength scales with how much data backs the infoset, up
/// to p_max at ten or more observed decisions, so unseen spots
/// fall back to plain regret matching.
struct Biased {
    counts: Samples,
    p_max: Probability,
}

impl Biased {
    fn confidence(&self, index: usize) -> Probability {
        let samples = self.counts.total(index);
        self.p_max * (samples as f64 / crate::DBR_CONFIDENCE_SAMPLES as f64).min(1.0)
    }
}

impl Restriction for Biased {
    fn begin(&mut self, _rng: &mut SmallRng) {}

    fn policy(
        &mut self,
        index: usize,
        _matched: &[Probability; NUM_ACTIONS],
        rng: &mut SmallRng,
    ) -> Option<[Probability; NUM_ACTIONS]> {
        let confidence = self.confidence(index);
        if confidence > 0.0 && rng.random::<f64>() <= confidence {
            Some(self.counts.frequencies(index))
        } else {
            None
        }
    }
}

/// build a solver whose opponent seat is biased toward observed
/// play. an empty observation store degrades to plain cfr+.
pub fn data_biased(game: &Game, counts: &Samples, p_max: Probability, seed: u64) -> Result<CfrPlus> {
    if !(0.0..=1.0).contains(&p_max) {
        return Err(Error::ParameterOutOfRange(format!(
            "confidence cap {} outside [0, 1]",
            p_max
        )));
    }
    let tree = Builder::build(game)?;
    if counts.len() != tree.decision_count() {
        return Err(Error::MissingInfoset(format!(
            "observations cover {} of {} infosets",
            counts.len(),
            tree.decision_count()
        )));
    }
    CfrPlus::restricted(
        game,
        seed,
        Box::new(Biased {
            counts: counts.clone(),
            p_max,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfr::options::Options;
    use crate::cfr::strategy::Strategy;
    use crate::evaluation::exploitability::Exploitability;
    use crate::game::action::Action;

    #[test]
    fn confidence_saturates_at_ten_samples() {
        let mut counts = Samples::new(1);
        let biased = |counts: &Samples| Biased {
            counts: counts.clone(),
            p_max: 0.8,
        };
        assert_eq!(biased(&counts).confidence(0), 0.0);
        for _ in 0..5 {
            counts.record(0, Action::Call);
        }
        assert!((biased(&counts).confidence(0) - 0.4).abs() < crate::VALUE_TOLERANCE);
        for _ in 0..20 {
            counts.record(0, Action::Raise);
        }
        assert!((biased(&counts).confidence(0) - 0.8).abs() < crate::VALUE_TOLERANCE);
    }

    #[test]
    fn empty_observations_degrade_to_cfr_plus() {
        let game = Game::kuhn();
        let tree = Builder::build(&game).unwrap();
        let options = Options::new(800);
        let plain = CfrPlus::new(&game, 0).unwrap().solve(&options).unwrap();
        let biased = data_biased(&game, &Samples::new(tree.decision_count()), 0.8, 0)
            .unwrap()
            .solve(&options)
            .unwrap();
        assert_eq!(plain, biased);
    }

    #[test]
    fn heavy_fold_observations_get_exploited() {
        let game = Game::kuhn();
        let exploitability = Exploitability::new(&game).unwrap();
        let tree = Builder::build(&game).unwrap();
        let mut counts = Samples::new(tree.decision_count());
        for index in 0..tree.decision_count() {
            let legal = tree.legal(tree.decision(index));
            let observed = if legal.contains(&Action::Fold) {
                Action::Fold
            } else {
                Action::Call
            };
            for _ in 0..20 {
                counts.record(index, observed);
            }
        }
        let response = data_biased(&game, &counts, 0.8, 0)
            .unwrap()
            .solve(&Options::new(1500))
            .unwrap();
        let folder = Strategy::preferring(&tree, Action::Fold);
        let winnings = exploitability.response_utility(&folder, &response).unwrap();
        // the response farms the observed over-folding
        assert!(winnings > 500.0, "won {} mbb/g", winnings);
    }
}
