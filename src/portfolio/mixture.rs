use crate::NUM_ACTIONS;
use crate::Probability;
use crate::cfr::strategy::Strategy;
use crate::error::Error;
use crate::error::Result;

/// the weighted blend of the portfolio's strategies that the
/// agent actually plays from. reblended whenever the bandit moves
/// its weights, read like any other strategy.
#[derive(Debug, Clone)]
pub struct Mixture {
    strategies: Vec<Strategy>,
    weights: Vec<Probability>,
    blended: Strategy,
}

impl Mixture {
    pub fn new(strategies: Vec<Strategy>) -> Result<Self> {
        if strategies.is_empty() {
            return Err(Error::ParameterOutOfRange(
                "a mixture needs at least one strategy".to_string(),
            ));
        }
        let decisions = strategies[0].len();
        if strategies.iter().any(|strategy| strategy.len() != decisions) {
            return Err(Error::InvalidStrategy(
                "mixture strategies cover different trees".to_string(),
            ));
        }
        let weights = vec![1.0 / strategies.len() as Probability; strategies.len()];
        let mut mixture = Self {
            strategies,
            weights,
            blended: Strategy::empty(decisions),
        };
        mixture.blend();
        Ok(mixture)
    }

    pub fn strategies(&self) -> &[Strategy] {
        &self.strategies
    }

    /// the current blend
    pub fn strategy(&self) -> &Strategy {
        &self.blended
    }

    pub fn set_weights(&mut self, weights: &[Probability]) -> Result<()> {
        if weights.len() != self.strategies.len() {
            return Err(Error::ParameterOutOfRange(format!(
                "{} weights for {} strategies",
                weights.len(),
                self.strategies.len()
            )));
        }
        self.weights.copy_from_slice(weights);
        self.blend();
        Ok(())
    }

    fn blend(&mut self) {
        for index in 0..self.blended.len() {
            let mut probs = [0.0; NUM_ACTIONS];
            for (strategy, weight) in self.strategies.iter().zip(self.weights.iter()) {
                for action in 0..NUM_ACTIONS {
                    probs[action] += weight * strategy.probs(index)[action];
                }
            }
            self.blended.set(index, probs);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::action::Action;
    use crate::game::game::Game;
    use crate::tree::builder::Builder;

    #[test]
    fn blends_are_weighted_averages() {
        let tree = Builder::build(&Game::kuhn()).unwrap();
        let caller = Strategy::preferring(&tree, Action::Call);
        let raiser = Strategy::preferring(&tree, Action::Raise);
        let mut mixture = Mixture::new(vec![caller, raiser]).unwrap();
        // uniform to begin with
        assert_eq!(mixture.strategy().probs(0), &[0.0, 0.5, 0.5]);
        mixture.set_weights(&[0.9, 0.1]).unwrap();
        let probs = mixture.strategy().probs(0);
        assert!((probs[1] - 0.9).abs() < crate::VALUE_TOLERANCE);
        assert!((probs[2] - 0.1).abs() < crate::VALUE_TOLERANCE);
        assert!(mixture.strategy().validate(&tree).is_ok());
    }

    #[test]
    fn mismatched_strategies_are_rejected() {
        let tree = Builder::build(&Game::kuhn()).unwrap();
        let whole = Strategy::uniform(&tree);
        let partial = Strategy::empty(1);
        assert!(Mixture::new(vec![whole, partial]).is_err());
        assert!(Mixture::new(Vec::new()).is_err());
    }
}
