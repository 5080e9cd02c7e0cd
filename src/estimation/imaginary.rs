use super::Estimator;
use crate::Probability;
use crate::Utility;
use crate::cards::card::Card;
use crate::cards::combos;
use crate::cfr::strategy::Strategy;
use crate::error::Error;
use crate::error::Result;
use crate::evaluation::showdown;
use crate::game::action::Action;
use crate::game::game::Game;
use crate::sampling::state::HandState;
use crate::tree::builder::Builder;
use crate::tree::node::Node;
use crate::tree::tree::Tree;
use petgraph::graph::NodeIndex;

/// variance reduced estimation by imaginary observations: instead
/// of scoring only the hole cards the seat actually held, score
/// every holding consistent with the public cards and the
/// opponent's revealed hand, weighted by how likely each strategy
/// was to play the logged actions with that holding.
pub struct ImaginaryObservations {
    game: Game,
    tree: Tree,
}

/// cursor state for one walk down the logged trajectory, shared
/// by every hole card hypothesis
pub(crate) struct Hypotheses {
    pub holes: Vec<Vec<Card>>,
    pub nodes: Vec<NodeIndex>,
    pub sampling_reach: Vec<Probability>,
    pub evaluated_reach: Vec<Vec<Probability>>,
}

impl Hypotheses {
    /// all hole choices disjoint from the opponent's revealed
    /// cards and from every board card of the hand
    pub fn seed(
        tree: &Tree,
        opponent_holes: &[Card],
        board: &[Card],
        experts: usize,
    ) -> Self {
        let mut holes = Vec::new();
        let mut nodes = Vec::new();
        for (edge, child) in tree.children(tree.root()) {
            let cards = edge.cards().expect("hole children are deals");
            if combos::disjoint(cards, opponent_holes) && combos::disjoint(cards, board) {
                holes.push(cards.to_vec());
                nodes.push(child);
            }
        }
        let count = holes.len();
        Self {
            holes,
            nodes,
            sampling_reach: vec![1.0; count],
            evaluated_reach: vec![vec![1.0; count]; experts],
        }
    }

    pub fn len(&self) -> usize {
        self.holes.len()
    }

    /// scale every reach probability, the way chance transitions
    /// spread mass across their outcomes
    pub fn scale(&mut self, factor: Probability) {
        for reach in self.sampling_reach.iter_mut() {
            *reach *= factor;
        }
        for expert in self.evaluated_reach.iter_mut() {
            for reach in expert.iter_mut() {
                *reach *= factor;
            }
        }
    }

    /// multiply through the seat's own action probabilities
    pub fn observe(
        &mut self,
        tree: &Tree,
        sampling: &Strategy,
        evaluated: &[&Strategy],
        action: Action,
    ) {
        for (i, &node) in self.nodes.iter().enumerate() {
            let index = tree.node(node).index().expect("decision carries an index");
            self.sampling_reach[i] *= sampling.probability(index, action);
            for (expert, strategy) in evaluated.iter().enumerate() {
                self.evaluated_reach[expert][i] *= strategy.probability(index, action);
            }
        }
    }

    pub fn follow(&mut self, tree: &Tree, action: Action) -> Result<()> {
        for node in self.nodes.iter_mut() {
            *node = tree
                .follow(*node, action)
                .ok_or_else(|| Error::Io(std::io::Error::other("illegal logged action")))?;
        }
        Ok(())
    }

    pub fn deal(&mut self, tree: &Tree, cards: &[Card]) -> Result<()> {
        for node in self.nodes.iter_mut() {
            *node = tree
                .deal(*node, cards)
                .ok_or_else(|| Error::Io(std::io::Error::other("unknown board cards")))?;
        }
        Ok(())
    }

    /// fold the terminal utilities of every hypothesis into the
    /// per expert estimates
    #[allow(clippy::too_many_arguments)]
    pub fn settle(
        &self,
        tree: &Tree,
        game: &Game,
        seat: usize,
        opponent_holes: &[Card],
        board: &[Card],
        folded: &[bool],
        utilities: &mut [Utility],
    ) -> Result<()> {
        let commitment = tree
            .node(self.nodes[0])
            .commitment()
            .expect("terminal carries commitments");
        let denominator = self.sampling_reach.iter().sum::<Probability>();
        if denominator <= 0.0 {
            return Ok(());
        }
        for i in 0..self.len() {
            let utility = if folded[seat] {
                -commitment[seat] as Utility
            } else {
                let mut seats = [self.holes[i].clone(), self.holes[i].clone()];
                seats[1 - seat] = opponent_holes.to_vec();
                showdown::utility(&seats, board, folded, commitment, game.suits())?[seat]
            };
            for (expert, reaches) in self.evaluated_reach.iter().enumerate() {
                utilities[expert] += utility * reaches[i] / denominator;
            }
        }
        Ok(())
    }
}

impl ImaginaryObservations {
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

impl Estimator for ImaginaryObservations {
    fn estimate(
        &self,
        state: &HandState,
        seat: usize,
        sampling: &Strategy,
        evaluated: &[&Strategy],
    ) -> Result<Vec<Utility>> {
        let opponent = state.hole(1 - seat).ok_or(Error::MuckingUnsupported)?;
        let board = state.board();
        let mut utilities = vec![0.0; evaluated.len()];
        let mut hypotheses = Hypotheses::seed(&self.tree, &opponent, &board, evaluated.len());
        let mut round = 0;
        let mut action_index = 0;
        loop {
            match self.tree.node(hypotheses.nodes[0]) {
                Node::Holes { .. } => unreachable!("hole cards are dealt from the root"),
                Node::Board { .. } => {
                    let mut cards = state
                        .boards
                        .get(round)
                        .cloned()
                        .ok_or_else(|| Error::Io(std::io::Error::other("missing board cards")))?;
                    cards.sort();
                    hypotheses.deal(&self.tree, &cards)?;
                }
                Node::Decision { player, .. } => {
                    let action = *state
                        .actions
                        .get(round)
                        .and_then(|sequence| sequence.get(action_index))
                        .ok_or_else(|| Error::Io(std::io::Error::other("betting ended early")))?;
                    if *player == seat {
                        hypotheses.observe(&self.tree, sampling, evaluated, action);
                    }
                    hypotheses.follow(&self.tree, action)?;
                    action_index += 1;
                    if action_index >= state.actions[round].len() {
                        round += 1;
                        action_index = 0;
                    }
                }
                Node::Terminal { .. } => {
                    hypotheses.settle(
                        &self.tree,
                        &self.game,
                        seat,
                        &opponent,
                        &board,
                        &state.folded,
                        &mut utilities,
                    )?;
                    return Ok(utilities);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fold_wins_marginalize_over_hypotheses() {
        let game = Game::kuhn();
        let estimator = ImaginaryObservations::new(&game).unwrap();
        let uniform = Strategy::uniform(estimator.tree());
        // alice raised with an unknown-to-bob holding, bob folded:
        // both remaining hole cards win alice the same pot
        let state = HandState::parse(&game, "STATE:0:rf:2c|4c:1|-1:alice|bob").unwrap();
        let estimates = estimator.estimate(&state, 0, &uniform, &[&uniform]).unwrap();
        assert!((estimates[0] - 1.0).abs() < crate::VALUE_TOLERANCE);
    }

    #[test]
    fn showdowns_weight_each_holding_by_its_reach() {
        let game = Game::kuhn();
        let estimator = ImaginaryObservations::new(&game).unwrap();
        let uniform = Strategy::uniform(estimator.tree());
        // bob called a raise holding the middle card; alice shows
        // the ace. hypotheses for bob are the two cards below it,
        // both losing the four chip pot under uniform play.
        let state = HandState::parse(&game, "STATE:0:rc:4c|3c:2|-2:alice|bob").unwrap();
        let estimates = estimator.estimate(&state, 1, &uniform, &[&uniform]).unwrap();
        assert!((estimates[0] + 2.0).abs() < crate::VALUE_TOLERANCE);
    }

    #[test]
    fn mucked_opponents_are_rejected() {
        let game = Game::kuhn();
        let estimator = ImaginaryObservations::new(&game).unwrap();
        let uniform = Strategy::uniform(estimator.tree());
        let state = HandState::parse(&game, "STATE:0:rf:2c|:1|-1:alice|bob").unwrap();
        assert!(matches!(
            estimator.estimate(&state, 0, &uniform, &[&uniform]),
            Err(Error::MuckingUnsupported)
        ));
    }
}
