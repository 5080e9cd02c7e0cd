use crate::Probability;
use crate::Utility;

/// the exp3g adversarial bandit that mixes portfolio experts
/// between hands. weights grow exponentially in estimated reward,
/// play probabilities keep a gamma floor of uniform exploration.
#[derive(Debug, Clone)]
pub struct Exp3G {
    gamma: f64,
    eta: f64,
    weights: Vec<f64>,
}

impl Exp3G {
    pub fn new(gamma: f64, eta: f64, experts: usize) -> Self {
        Self {
            gamma,
            eta,
            weights: vec![1.0; experts],
        }
    }

    pub fn experts(&self) -> usize {
        self.weights.len()
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn probabilities(&self) -> Vec<Probability> {
        let total = self.weights.iter().sum::<f64>();
        let floor = self.gamma / self.weights.len() as f64;
        self.weights
            .iter()
            .map(|weight| (1.0 - self.gamma) * (weight / total) + floor)
            .collect()
    }

    pub fn update(&mut self, rewards: &[Utility]) {
        for (weight, reward) in self.weights.iter_mut().zip(rewards.iter()) {
            *weight *= (self.eta * reward).exp();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_and_probabilities_match_the_formulas() {
        let mut bandit = Exp3G::new(0.02, 0.025, 3);
        bandit.update(&[0.0, 10.0, 0.0]);
        let grown = 0.25f64.exp();
        assert!((bandit.weights()[0] - 1.0).abs() < 1e-12);
        assert!((bandit.weights()[1] - grown).abs() < 1e-12);
        assert!((bandit.weights()[2] - 1.0).abs() < 1e-12);
        let probabilities = bandit.probabilities();
        let total = 2.0 + grown;
        for (index, weight) in [1.0, grown, 1.0].into_iter().enumerate() {
            let expected = 0.98 * weight / total + 0.02 / 3.0;
            assert!((probabilities[index] - expected).abs() < 1e-12);
        }
        assert!((probabilities.iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }
}
