use super::value::GameValue;
use crate::Utility;
use crate::cfr::strategy::Strategy;
use crate::error::Result;
use crate::game::game::Game;
use crate::response::best::BestResponse;

/// how much a best responder wins against a strategy, in milli
/// big blinds per game averaged over both seats. zero at a nash
/// equilibrium, positive everywhere else.
pub struct Exploitability {
    big_blind: Utility,
    value: GameValue,
    response: BestResponse,
}

impl Exploitability {
    pub fn new(game: &Game) -> Result<Self> {
        game.require_two_players()?;
        Ok(Self {
            big_blind: game.big_blind() as Utility,
            value: GameValue::new(game)?,
            response: BestResponse::new(game)?,
        })
    }

    pub fn tree(&self) -> &crate::tree::tree::Tree {
        self.value.tree()
    }

    pub fn exploitability(&self, strategy: &Strategy) -> Result<Utility> {
        let response = self.response.solve(strategy)?;
        let utilities = self.value.evaluate(&[strategy, &response])?;
        Ok(self.millibets(utilities[1]))
    }

    /// seat averaged utility a response earns against an opponent
    pub fn response_utility(&self, opponent: &Strategy, response: &Strategy) -> Result<Utility> {
        let utilities = self.value.evaluate(&[opponent, response])?;
        Ok(self.millibets(utilities[1]))
    }

    fn millibets(&self, chips: Utility) -> Utility {
        chips * 1000.0 / self.big_blind
    }
}
