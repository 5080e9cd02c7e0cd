use crate::NUM_ACTIONS;
use crate::Probability;
use crate::cfr::plus::CfrPlus;
use crate::cfr::restriction::Restriction;
use crate::cfr::strategy::Strategy;
use crate::error::Error;
use crate::error::Result;
use crate::game::game::Game;
use crate::tree::builder::Builder;
use rand::Rng;
use rand::rngs::SmallRng;

/// restricted nash response: cfr+ against an opponent who, with
/// probability p per iteration, is pinned to a supplied averaged
/// strategy instead of regret matching. small p trains a cautious
/// near-equilibrium, large p a full exploit of the fixed opponent.
struct Restricted {
    opponent: Strategy,
    p: Probability,
    play_fix: bool,
}

impl Restriction for Restricted {
    fn begin(&mut self, rng: &mut SmallRng) {
        self.play_fix = rng.random::<f64>() <= self.p;
    }
    fn policy(
        &mut self,
        index: usize,
        _matched: &[Probability; NUM_ACTIONS],
        _rng: &mut SmallRng,
    ) -> Option<[Probability; NUM_ACTIONS]> {
        if self.play_fix {
            Some(*self.opponent.probs(index))
        } else {
            None
        }
    }
}

/// build a solver whose opponent seat is restricted toward the
/// given strategy. the opponent must cover every infoset of the
/// canonical tree.
pub fn restricted_nash(
    game: &Game,
    opponent: &Strategy,
    p: Probability,
    seed: u64,
) -> Result<CfrPlus> {
    if !(0.0..=1.0).contains(&p) {
        return Err(Error::ParameterOutOfRange(format!(
            "restriction probability {} outside [0, 1]",
            p
        )));
    }
    let tree = Builder::build(game)?;
    if opponent.len() != tree.decision_count() {
        return Err(Error::MissingInfoset(format!(
            "opponent covers {} of {} infosets",
            opponent.len(),
            tree.decision_count()
        )));
    }
    opponent
        .validate(&tree)
        .map_err(|_| Error::MissingInfoset("opponent strategy is not a distribution".to_string()))?;
    CfrPlus::restricted(
        game,
        seed,
        Box::new(Restricted {
            opponent: opponent.clone(),
            p,
            play_fix: false,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfr::options::Options;
    use crate::evaluation::exploitability::Exploitability;
    use crate::game::action::Action;

    #[test]
    fn rejects_probabilities_outside_unit_interval() {
        let game = Game::kuhn();
        let tree = Builder::build(&game).unwrap();
        let opponent = Strategy::uniform(&tree);
        assert!(restricted_nash(&game, &opponent, -0.1, 0).is_err());
        assert!(restricted_nash(&game, &opponent, 1.1, 0).is_err());
    }

    #[test]
    fn rejects_partial_opponents() {
        let game = Game::kuhn();
        let opponent = Strategy::empty(3);
        assert!(matches!(
            restricted_nash(&game, &opponent, 0.5, 0),
            Err(Error::MissingInfoset(_))
        ));
    }

    #[test]
    fn exploitability_grows_with_p() {
        let game = Game::kuhn();
        let exploitability = Exploitability::new(&game).unwrap();
        let opponent = Strategy::preferring(exploitability.tree(), Action::Call);
        let options = Options::new(1500);
        let mut measured = Vec::new();
        for (trial, p) in [0.2, 0.5, 0.8].into_iter().enumerate() {
            let mut solver = restricted_nash(&game, &opponent, p, trial as u64).unwrap();
            let response = solver.solve(&options).unwrap();
            measured.push(exploitability.exploitability(&response).unwrap());
        }
        assert!(
            measured[0] < measured[1] && measured[1] < measured[2],
            "exploitability not monotone in p: {:?}",
            measured
        );
    }
}
