use super::exp3g::Exp3G;
use super::mixture::Mixture;
use crate::cfr::strategy::Strategy;
use crate::error::Result;
use crate::estimation::Estimator;
use crate::game::action::Action;
use crate::sampling::state::HandState;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::SmallRng;

/// the on-line implicit modelling agent: plays the bandit
/// weighted mixture of its portfolio, and after every finished
/// hand scores each portfolio member with an off-policy estimator
/// and feeds the estimates back into the bandit.
pub struct ImplicitAgent {
    portfolio: Vec<Strategy>,
    mixture: Mixture,
    bandit: Exp3G,
    estimator: Box<dyn Estimator>,
    rng: SmallRng,
}

impl ImplicitAgent {
    pub fn new(
        portfolio: Vec<Strategy>,
        gamma: f64,
        eta: f64,
        estimator: Box<dyn Estimator>,
        seed: u64,
    ) -> Result<Self> {
        let bandit = Exp3G::new(gamma, eta, portfolio.len());
        let mixture = Mixture::new(portfolio.clone())?;
        Ok(Self {
            portfolio,
            mixture,
            bandit,
            estimator,
            rng: SmallRng::seed_from_u64(seed),
        })
    }

    pub fn expert_probabilities(&self) -> Vec<f64> {
        self.bandit.probabilities()
    }

    /// sample an action from the mixed strategy at a decision
    /// infoset. floating point dust falls through to the last
    /// action with any mass.
    pub fn act(&mut self, index: usize) -> Action {
        let probs = self.mixture.strategy().probs(index);
        let draw = self.rng.random::<f64>();
        let mut cumulative = 0.0;
        let mut fallback = Action::Call;
        for action in Action::ALL {
            let probability = probs[action.index()];
            if probability == 0.0 {
                continue;
            }
            fallback = action;
            cumulative += probability;
            if draw < cumulative {
                return action;
            }
        }
        fallback
    }

    /// end of hand: refresh the mixture from the bandit, estimate
    /// every expert's utility off the realized hand, and let the
    /// bandit reweight.
    pub fn observe(&mut self, state: &HandState, seat: usize) -> Result<()> {
        let probabilities = self.bandit.probabilities();
        self.mixture.set_weights(&probabilities)?;
        let experts = self.portfolio.iter().collect::<Vec<_>>();
        let rewards = self
            .estimator
            .estimate(state, seat, self.mixture.strategy(), &experts)?;
        self.bandit.update(&rewards);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimation::chips::Chips;
    use crate::game::game::Game;
    use crate::tree::builder::Builder;

    #[test]
    fn acting_respects_the_mixture_support() {
        let game = Game::kuhn();
        let tree = Builder::build(&game).unwrap();
        let caller = Strategy::preferring(&tree, Action::Call);
        let estimator = Box::new(Chips::new(&game).unwrap());
        let mut agent =
            ImplicitAgent::new(vec![caller], crate::EXP3G_GAMMA, crate::EXP3G_ETA, estimator, 5)
                .unwrap();
        for index in 0..tree.decision_count() {
            assert_eq!(agent.act(index), Action::Call);
        }
    }

    #[test]
    fn winning_experts_gain_weight() {
        let game = Game::kuhn();
        let tree = Builder::build(&game).unwrap();
        let caller = Strategy::preferring(&tree, Action::Call);
        let raiser = Strategy::preferring(&tree, Action::Raise);
        let estimator = Box::new(Chips::new(&game).unwrap());
        let mut agent = ImplicitAgent::new(
            vec![caller, raiser],
            crate::EXP3G_GAMMA,
            crate::EXP3G_ETA,
            estimator,
            5,
        )
        .unwrap();
        // we raised holding the best card and the opponent folded,
        // which only the raising expert would reliably do
        let state = HandState::parse(&game, "STATE:0:rf:4c|2c:1|-1:me|them").unwrap();
        agent.observe(&state, 0).unwrap();
        let probabilities = agent.expert_probabilities();
        assert!(probabilities[1] > probabilities[0]);
    }
}
