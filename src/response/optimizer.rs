use super::rnr::restricted_nash;
use crate::Utility;
use crate::cfr::options::Options;
use crate::cfr::strategy::Strategy;
use crate::error::Error;
use crate::error::Result;
use crate::evaluation::exploitability::Exploitability;
use crate::game::game::Game;

/// binary searches the restriction probability p until the
/// trained response lands at a target exploitability. this is how
/// portfolio entries are tuned: a target near equilibrium gives a
/// safe response, a high target a maximally greedy one.
pub struct RnrOptimizer {
    game: Game,
    options: Options,
    exploitability: Exploitability,
}

/// probes after which the search gives up and keeps its best
const MAX_PROBES: usize = 16;

impl RnrOptimizer {
    pub fn new(game: &Game, options: Options) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            game: game.clone(),
            options,
            exploitability: Exploitability::new(game)?,
        })
    }

    /// train responses to the opponent until one lands within
    /// `delta` of the target exploitability (mbb/g). returns the
    /// response, its measured exploitability, and the p found.
    ///
    /// checkpoints taken before three quarters of the configured
    /// iterations are ignored so the candidate has converged.
    pub fn train(
        &self,
        opponent: &Strategy,
        target: Utility,
        delta: Utility,
        seed: u64,
    ) -> Result<(Strategy, Utility, f64)> {
        if delta <= 0.0 {
            return Err(Error::ParameterOutOfRange(format!(
                "exploitability tolerance {} must be positive",
                delta
            )));
        }
        let gate = (3 * self.options.iterations) / 4;
        let mut low = 0.0f64;
        let mut high = 1.0f64;
        let mut kept: Option<(Strategy, Utility, f64)> = None;
        let mut kept_delta = Utility::INFINITY;
        for probe in 0..MAX_PROBES {
            let p = low + (high - low) / 2.0;
            log::info!("rnr probe {} at p = {:.4}", probe, p);
            let mut best: Option<(Strategy, Utility)> = None;
            let mut best_delta = Utility::INFINITY;
            let mut failure = None;
            let mut solver = restricted_nash(&self.game, opponent, p, seed.wrapping_add(probe as u64))?;
            solver.train(&self.options, |strategy, _, iterations| {
                if iterations <= gate || failure.is_some() {
                    return;
                }
                match self.exploitability.exploitability(strategy) {
                    Ok(measured) => {
                        let measured_delta = (measured - target).abs();
                        if measured_delta < best_delta {
                            best_delta = measured_delta;
                            best = Some((strategy.clone(), measured));
                        }
                    }
                    Err(error) => failure = Some(error),
                }
            })?;
            if let Some(error) = failure {
                return Err(error);
            }
            let (strategy, measured) = best.expect("the final checkpoint passes the gate");
            if best_delta < kept_delta {
                kept_delta = best_delta;
                kept = Some((strategy, measured, p));
            }
            if kept_delta <= delta {
                return Ok(kept.expect("just set"));
            }
            log::info!(
                "rnr probe {} measured {:.3} mbb/g against target {:.3}",
                probe,
                measured,
                target
            );
            if measured > target {
                high = p;
            } else {
                low = p;
            }
        }
        let (strategy, measured, p) = kept.expect("at least one probe ran");
        log::warn!(
            "rnr search exhausted {} probes, keeping {:.3} mbb/g at p = {:.4}",
            MAX_PROBES,
            measured,
            p
        );
        Ok((strategy, measured, p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::action::Action;
    use crate::tree::builder::Builder;

    #[test]
    fn rejects_nonpositive_tolerance() {
        let game = Game::kuhn();
        let optimizer =
            RnrOptimizer::new(&game, Options::new(100).with_weight_delay(50)).unwrap();
        let tree = Builder::build(&game).unwrap();
        let opponent = Strategy::uniform(&tree);
        assert!(optimizer.train(&opponent, 50.0, 0.0, 0).is_err());
    }

    #[test]
    fn lands_near_the_requested_exploitability() {
        let game = Game::kuhn();
        let options = Options::new(400).with_weight_delay(100).with_checkpoints(100);
        let optimizer = RnrOptimizer::new(&game, options).unwrap();
        let tree = Builder::build(&game).unwrap();
        let opponent = Strategy::preferring(&tree, Action::Call);
        let (response, measured, p) = optimizer.train(&opponent, 150.0, 75.0, 1).unwrap();
        assert!(response.validate(&tree).is_ok());
        assert!((measured - 150.0).abs() <= 75.0, "landed at {}", measured);
        assert!((0.0..=1.0).contains(&p));
    }
}
