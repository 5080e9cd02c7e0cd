use crate::Probability;
use crate::cfr::strategy::Strategy;
use crate::error::Error;
use crate::error::Result;
use crate::game::action::Action;
use crate::tree::tree::Tree;

/// how a tilt perturbs the chosen action's probability
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tilt {
    /// add the tilt probability outright
    Add,
    /// add proportionally to the current probability
    Multiply,
}

/// skew a strategy toward one action everywhere it is legal,
/// spreading the displaced mass over the other legal actions.
/// this is how the weak opponents for portfolio training are
/// manufactured from an equilibrium.
pub fn tilt_strategy(
    tree: &Tree,
    strategy: &Strategy,
    action: Action,
    tilt: Tilt,
    probability: Probability,
) -> Result<Strategy> {
    if probability < 0.0 {
        return Err(Error::ParameterOutOfRange(format!(
            "tilt probability {} is negative",
            probability
        )));
    }
    strategy.validate(tree)?;
    let mut tilted = strategy.clone();
    for index in 0..tree.decision_count() {
        let legal = tree.legal(tree.decision(index));
        if !legal.contains(&action) || legal.len() < 2 {
            continue;
        }
        let mut probs = *strategy.probs(index);
        let original = probs[action.index()];
        let skewed = match tilt {
            Tilt::Add => (original + probability).clamp(0.0, 1.0),
            Tilt::Multiply => (original + original * probability).clamp(0.0, 1.0),
        };
        probs[action.index()] = skewed;
        let spread = (original - skewed) / (legal.len() - 1) as Probability;
        for other in legal {
            if other != action {
                probs[other.index()] += spread;
            }
        }
        tilted.set(index, probs);
    }
    Ok(tilted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::game::Game;
    use crate::tree::builder::Builder;

    #[test]
    fn additive_tilt_moves_mass_toward_the_action() {
        let tree = Builder::build(&Game::kuhn()).unwrap();
        let uniform = Strategy::uniform(&tree);
        let tilted = tilt_strategy(&tree, &uniform, Action::Raise, Tilt::Add, 0.2).unwrap();
        // first decision offers call and raise at a half each
        assert!((tilted.probs(0)[2] - 0.7).abs() < crate::VALUE_TOLERANCE);
        assert!((tilted.probs(0)[1] - 0.3).abs() < crate::VALUE_TOLERANCE);
        assert!(tilted.validate(&tree).is_ok());
    }

    #[test]
    fn multiplicative_tilt_scales_the_action() {
        let tree = Builder::build(&Game::kuhn()).unwrap();
        let uniform = Strategy::uniform(&tree);
        let tilted =
            tilt_strategy(&tree, &uniform, Action::Raise, Tilt::Multiply, 0.5).unwrap();
        assert!((tilted.probs(0)[2] - 0.75).abs() < crate::VALUE_TOLERANCE);
        assert!(tilted.validate(&tree).is_ok());
    }

    #[test]
    fn tilts_saturate_at_certainty() {
        let tree = Builder::build(&Game::kuhn()).unwrap();
        let uniform = Strategy::uniform(&tree);
        let tilted = tilt_strategy(&tree, &uniform, Action::Call, Tilt::Add, 5.0).unwrap();
        assert!((tilted.probs(0)[1] - 1.0).abs() < crate::VALUE_TOLERANCE);
        assert!(tilted.validate(&tree).is_ok());
    }

    #[test]
    fn negative_tilts_are_rejected() {
        let tree = Builder::build(&Game::kuhn()).unwrap();
        let uniform = Strategy::uniform(&tree);
        assert!(tilt_strategy(&tree, &uniform, Action::Call, Tilt::Add, -0.1).is_err());
    }
}
