use super::Estimator;
use crate::Probability;
use crate::Utility;
use crate::cfr::strategy::Strategy;
use crate::error::Error;
use crate::error::Result;
use crate::evaluation::showdown;
use crate::game::game::Game;
use crate::sampling::state::HandState;
use crate::tree::builder::Builder;
use crate::tree::node::Node;
use crate::tree::tree::Tree;

/// the baseline estimator: realized chips from the terminal on
/// the logged trajectory, importance weighted by the ratio of
/// evaluated to sampling action probabilities over the seat's own
/// decisions.
pub struct Chips {
    game: Game,
    tree: Tree,
}

impl Chips {
    pub fn new(game: &Game) -> Result<Self> {
        game.require_limit()?;
        game.require_two_players()?;
        game.require_evaluable()?;
        Ok(Self {
            game: game.clone(),
            tree: Builder::build(game)?,
        })
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }
}

impl Estimator for Chips {
    fn estimate(
        &self,
        state: &HandState,
        seat: usize,
        sampling: &Strategy,
        evaluated: &[&Strategy],
    ) -> Result<Vec<Utility>> {
        let holes = state.hole(seat).ok_or(Error::MuckingUnsupported)?;
        let mut cursor = self
            .tree
            .deal(self.tree.root(), &holes)
            .ok_or_else(|| Error::Io(std::io::Error::other("hand does not fit the game tree")))?;
        let mut sampling_reach: Probability = 1.0;
        let mut reaches = vec![1.0; evaluated.len()];
        let mut round = 0;
        let mut action_index = 0;
        loop {
            match self.tree.node(cursor) {
                Node::Holes { .. } => unreachable!("hole cards are dealt from the root"),
                Node::Board { .. } => {
                    let mut cards = state
                        .boards
                        .get(round)
                        .cloned()
                        .ok_or_else(|| Error::Io(std::io::Error::other("missing board cards")))?;
                    cards.sort();
                    cursor = self
                        .tree
                        .deal(cursor, &cards)
                        .ok_or_else(|| Error::Io(std::io::Error::other("unknown board cards")))?;
                }
                Node::Decision { player, .. } => {
                    let action = *state
                        .actions
                        .get(round)
                        .and_then(|sequence| sequence.get(action_index))
                        .ok_or_else(|| Error::Io(std::io::Error::other("betting ended early")))?;
                    if *player == seat {
                        let index = self
                            .tree
                            .node(cursor)
                            .index()
                            .expect("decision carries an index");
                        sampling_reach *= sampling.probability(index, action);
                        for (reach, strategy) in reaches.iter_mut().zip(evaluated.iter()) {
                            *reach *= strategy.probability(index, action);
                        }
                    }
                    cursor = self
                        .tree
                        .follow(cursor, action)
                        .ok_or_else(|| Error::Io(std::io::Error::other("illegal logged action")))?;
                    action_index += 1;
                    if action_index >= state.actions[round].len() {
                        round += 1;
                        action_index = 0;
                    }
                }
                Node::Terminal { .. } => {
                    let commitment = self
                        .tree
                        .node(cursor)
                        .commitment()
                        .expect("terminal carries commitments");
                    let utility = if state.folded[seat] {
                        -commitment[seat] as Utility
                    } else {
                        let opponent = state.hole(1 - seat).ok_or(Error::MuckingUnsupported)?;
                        let mut seats = [holes.clone(), holes.clone()];
                        seats[1 - seat] = opponent;
                        showdown::utility(
                            &seats,
                            &state.board(),
                            &state.folded,
                            commitment,
                            self.game.suits(),
                        )?[seat]
                    };
                    if sampling_reach <= 0.0 {
                        return Ok(vec![0.0; evaluated.len()]);
                    }
                    return Ok(reaches
                        .into_iter()
                        .map(|reach| utility * reach / sampling_reach)
                        .collect());
                }
            }
        }
    }
}
