use crate::NUM_ACTIONS;
use crate::Probability;
use crate::error::Error;
use crate::error::Result;
use crate::game::action::Action;
use crate::tree::tree::Tree;

/// an averaged strategy, the artifact every downstream consumer
/// reads: file export, best response, evaluation, mixtures.
/// one probability row per decision node, addressed by the dense
/// index the tree assigned at build time.
#[derive(Debug, Clone, PartialEq)]
pub struct Strategy {
    probs: Vec<[Probability; NUM_ACTIONS]>,
}

impl Strategy {
    pub fn empty(decisions: usize) -> Self {
        Self {
            probs: vec![[0.0; NUM_ACTIONS]; decisions],
        }
    }

    /// uniform over the legal actions at every decision
    pub fn uniform(tree: &Tree) -> Self {
        let mut strategy = Self::empty(tree.decision_count());
        for index in 0..tree.decision_count() {
            let legal = tree.legal(tree.decision(index));
            let share = 1.0 / legal.len() as Probability;
            for action in legal {
                strategy.probs[index][action.index()] = share;
            }
        }
        strategy
    }

    /// plays the given action wherever it is legal, calls otherwise.
    /// handy for weak baseline opponents and correctness checks.
    pub fn preferring(tree: &Tree, action: Action) -> Self {
        let mut strategy = Self::empty(tree.decision_count());
        for index in 0..tree.decision_count() {
            let legal = tree.legal(tree.decision(index));
            let chosen = if legal.contains(&action) {
                action
            } else {
                Action::Call
            };
            strategy.probs[index][chosen.index()] = 1.0;
        }
        strategy
    }

    pub fn len(&self) -> usize {
        self.probs.len()
    }
    pub fn is_empty(&self) -> bool {
        self.probs.is_empty()
    }
    pub fn probs(&self, index: usize) -> &[Probability; NUM_ACTIONS] {
        &self.probs[index]
    }
    pub fn probability(&self, index: usize, action: Action) -> Probability {
        self.probs[index][action.index()]
    }
    pub fn set(&mut self, index: usize, probs: [Probability; NUM_ACTIONS]) {
        self.probs[index] = probs;
    }

    /// every row sums to one over its legal actions and is zero
    /// everywhere else
    pub fn validate(&self, tree: &Tree) -> Result<()> {
        if self.probs.len() != tree.decision_count() {
            return Err(Error::InvalidStrategy(format!(
                "strategy covers {} decisions, tree has {}",
                self.probs.len(),
                tree.decision_count()
            )));
        }
        for index in 0..self.probs.len() {
            let node = tree.decision(index);
            let legal = tree.legal(node);
            let row = &self.probs[index];
            let sum = row.iter().sum::<Probability>();
            if (sum - 1.0).abs() > crate::PROBABILITY_TOLERANCE {
                return Err(Error::InvalidStrategy(format!(
                    "probabilities at {} sum to {}",
                    tree.node(node).path(),
                    sum
                )));
            }
            for action in Action::ALL {
                if !legal.contains(&action) && row[action.index()] != 0.0 {
                    return Err(Error::InvalidStrategy(format!(
                        "probability on illegal {} at {}",
                        action,
                        tree.node(node).path()
                    )));
                }
            }
        }
        Ok(())
    }
}
