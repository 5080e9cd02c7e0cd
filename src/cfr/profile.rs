use super::strategy::Strategy;
use crate::NUM_ACTIONS;
use crate::Probability;
use crate::Utility;
use crate::game::action::Action;
use crate::tree::tree::Tree;

/// mutable training state: accumulated regrets, the strategy
/// played on the last visit, and the weighted strategy sum the
/// average is extracted from. flat arrays over decision indices,
/// allocated once and reused for the whole run.
#[derive(Debug, Clone)]
pub struct Profile {
    regrets: Vec<[Utility; NUM_ACTIONS]>,
    current: Vec<[Probability; NUM_ACTIONS]>,
    accumulated: Vec<[Probability; NUM_ACTIONS]>,
}

impl Profile {
    pub fn new(decisions: usize) -> Self {
        Self {
            regrets: vec![[0.0; NUM_ACTIONS]; decisions],
            current: vec![[0.0; NUM_ACTIONS]; decisions],
            accumulated: vec![[0.0; NUM_ACTIONS]; decisions],
        }
    }

    pub fn current(&self, index: usize) -> [Probability; NUM_ACTIONS] {
        self.current[index]
    }
    pub fn set_current(&mut self, index: usize, probs: [Probability; NUM_ACTIONS]) {
        self.current[index] = probs;
    }

    /// regret matching: play in proportion to clipped positive
    /// regret, uniform over the legal actions when none is positive
    pub fn matched(&self, index: usize, legal: &[Action]) -> [Probability; NUM_ACTIONS] {
        let mut probs = [0.0; NUM_ACTIONS];
        let positive = self.regrets[index]
            .iter()
            .map(|regret| regret.max(0.0))
            .sum::<Utility>();
        if positive > 0.0 {
            for action in legal {
                probs[action.index()] = self.regrets[index][action.index()].max(0.0) / positive;
            }
        } else {
            let share = 1.0 / legal.len() as Probability;
            for action in legal {
                probs[action.index()] = share;
            }
        }
        probs
    }

    /// plain cfr accumulation, regrets may run negative
    pub fn add_regret(&mut self, index: usize, action: Action, delta: Utility) {
        self.regrets[index][action.index()] += delta;
    }
    /// cfr+ accumulation, regrets floored at zero on every update
    pub fn floor_regret(&mut self, index: usize, action: Action, delta: Utility) {
        let regret = &mut self.regrets[index][action.index()];
        *regret = (*regret + delta).max(0.0);
    }

    pub fn accumulate(&mut self, index: usize, weight: f64, probs: &[Probability; NUM_ACTIONS]) {
        for action in 0..NUM_ACTIONS {
            self.accumulated[index][action] += weight * probs[action];
        }
    }

    /// extract the averaged strategy. decisions whose strategy sum
    /// never accumulated weight come out uniform over their legal
    /// actions. a nonzero `minimal` floors tiny probabilities to
    /// zero and renormalizes the rest.
    pub fn average(&self, tree: &Tree, minimal: Probability) -> Strategy {
        let mut strategy = Strategy::empty(tree.decision_count());
        for index in 0..tree.decision_count() {
            let legal = tree.legal(tree.decision(index));
            let sum = self.accumulated[index].iter().sum::<Probability>();
            let mut probs = [0.0; NUM_ACTIONS];
            if sum > 0.0 {
                for action in 0..NUM_ACTIONS {
                    probs[action] = self.accumulated[index][action] / sum;
                }
                if minimal > 0.0 {
                    let mut floored = probs;
                    for prob in floored.iter_mut() {
                        if *prob > 0.0 && *prob < minimal {
                            *prob = 0.0;
                        }
                    }
                    let rest = floored.iter().sum::<Probability>();
                    if rest > 0.0 {
                        for prob in floored.iter_mut() {
                            *prob /= rest;
                        }
                        probs = floored;
                    }
                }
            } else {
                let share = 1.0 / legal.len() as Probability;
                for action in &legal {
                    probs[action.index()] = share;
                }
            }
            strategy.set(index, probs);
        }
        strategy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::game::Game;
    use crate::tree::builder::Builder;

    #[test]
    fn matching_projects_negative_regret() {
        let mut profile = Profile::new(1);
        let legal = vec![Action::Fold, Action::Call, Action::Raise];
        profile.add_regret(0, Action::Fold, -2.0);
        profile.add_regret(0, Action::Call, 3.0);
        profile.add_regret(0, Action::Raise, 1.0);
        let probs = profile.matched(0, &legal);
        assert_eq!(probs, [0.0, 0.75, 0.25]);
    }

    #[test]
    fn matching_is_uniform_without_regret() {
        let profile = Profile::new(1);
        let legal = vec![Action::Call, Action::Raise];
        assert_eq!(profile.matched(0, &legal), [0.0, 0.5, 0.5]);
    }

    #[test]
    fn flooring_never_goes_negative() {
        let mut profile = Profile::new(1);
        profile.floor_regret(0, Action::Call, -5.0);
        assert_eq!(profile.matched(0, &[Action::Call])[1], 1.0);
    }

    #[test]
    fn average_normalizes_and_floors() {
        let tree = Builder::build(&Game::kuhn()).unwrap();
        let mut profile = Profile::new(tree.decision_count());
        profile.accumulate(0, 1.0, &[0.0, 0.98, 0.02]);
        let averaged = profile.average(&tree, 0.05);
        assert_eq!(*averaged.probs(0), [0.0, 1.0, 0.0]);
        // untouched decisions come out uniform over legal actions
        assert!(averaged.validate(&tree).is_ok());
    }
}
