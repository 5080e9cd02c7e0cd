use crate::Probability;
use crate::error::Error;
use crate::error::Result;

/// the cfr+ training knob set. checkpoints fire every
/// `checkpoint_iterations` after an initial `weight_delay` warmup
/// and always once at the end of the run.
#[derive(Debug, Clone)]
pub struct Options {
    pub iterations: usize,
    pub weight_delay: usize,
    pub checkpoint_iterations: Option<usize>,
    pub minimal_action_probability: Probability,
}

impl Options {
    pub fn new(iterations: usize) -> Self {
        Self {
            iterations,
            weight_delay: crate::WEIGHT_DELAY,
            checkpoint_iterations: None,
            minimal_action_probability: 0.0,
        }
    }

    pub fn with_weight_delay(mut self, weight_delay: usize) -> Self {
        self.weight_delay = weight_delay;
        self
    }
    pub fn with_checkpoints(mut self, checkpoint_iterations: usize) -> Self {
        self.checkpoint_iterations = Some(checkpoint_iterations);
        self
    }
    pub fn with_minimal_action_probability(mut self, minimal: Probability) -> Self {
        self.minimal_action_probability = minimal;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.iterations <= self.weight_delay {
            return Err(Error::ParameterOutOfRange(format!(
                "iterations ({}) must exceed the weight delay ({})",
                self.iterations, self.weight_delay
            )));
        }
        if self.minimal_action_probability < 0.0 || self.minimal_action_probability >= 1.0 {
            return Err(Error::ParameterOutOfRange(format!(
                "minimal action probability {} outside [0, 1)",
                self.minimal_action_probability
            )));
        }
        Ok(())
    }

    /// unset, zero or oversized checkpoint windows collapse to a
    /// single checkpoint at the end of the run
    pub fn checkpoint_window(&self) -> usize {
        match self.checkpoint_iterations {
            Some(window) if window > 0 && window <= self.iterations => window,
            _ => self.iterations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iterations_must_exceed_delay() {
        assert!(Options::new(700).validate().is_err());
        assert!(Options::new(701).validate().is_ok());
        assert!(
            Options::new(100)
                .with_weight_delay(50)
                .validate()
                .is_ok()
        );
    }

    #[test]
    fn checkpoint_window_collapses() {
        assert_eq!(Options::new(1000).checkpoint_window(), 1000);
        assert_eq!(
            Options::new(1000).with_checkpoints(100).checkpoint_window(),
            100
        );
        assert_eq!(
            Options::new(1000).with_checkpoints(5000).checkpoint_window(),
            1000
        );
    }

    #[test]
    fn minimal_probability_bounds() {
        assert!(
            Options::new(800)
                .with_minimal_action_probability(-0.1)
                .validate()
                .is_err()
        );
        assert!(
            Options::new(800)
                .with_minimal_action_probability(1.0)
                .validate()
                .is_err()
        );
    }
}
