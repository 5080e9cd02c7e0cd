use super::Estimator;
use super::imaginary::Hypotheses;
use crate::Probability;
use crate::Utility;
use crate::cards::card::Card;
use crate::cards::combos;
use crate::cfr::strategy::Strategy;
use crate::error::Error;
use crate::error::Result;
use crate::evaluation::value::GameValue;
use crate::game::action::Action;
use crate::game::game::Game;
use crate::sampling::state::HandState;
use crate::tree::builder::Builder;
use crate::tree::node::Node;
use crate::tree::tree::Tree;
use petgraph::graph::NodeIndex;
use std::collections::HashMap;

/// aivat: imaginary observations plus a control variate. on every
/// public transition the hand reveals, subtract the change in the
/// expected value a known equilibrium assigns to the infoset,
/// scaled by the importance ratio between the evaluated and
/// sampling strategies. the equilibrium's expectations are
/// precomputed once, keyed by the pair of seat view nodes.
pub struct Aivat {
    game: Game,
    tree: Tree,
    table: HashMap<(NodeIndex, NodeIndex), Vec<Utility>>,
}

impl Aivat {
    pub fn new(game: &Game, equilibrium: &Strategy) -> Result<Self> {
        game.require_limit()?;
        game.require_two_players()?;
        game.require_evaluable()?;
        let value = GameValue::new(game)?;
        equilibrium.validate(value.tree()).map_err(|error| {
            Error::MissingInfoset(format!("equilibrium baseline unusable: {}", error))
        })?;
        let mut table = HashMap::new();
        value.utilities(&[equilibrium, equilibrium], &mut |nodes, values| {
            table
                .entry((nodes[0], nodes[1]))
                .or_insert_with(|| values.to_vec());
        })?;
        Ok(Self {
            game: game.clone(),
            tree: Builder::build(game)?,
            table,
        })
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// equilibrium expectation for the estimated seat at a pair of
    /// seat views
    fn baseline(&self, seat: usize, mine: NodeIndex, theirs: NodeIndex) -> Result<Utility> {
        let key = if seat == 0 { (mine, theirs) } else { (theirs, mine) };
        self.table
            .get(&key)
            .map(|values| values[seat])
            .ok_or_else(|| {
                Error::MissingInfoset(format!(
                    "baseline pair {} / {}",
                    self.tree.node(mine).path(),
                    self.tree.node(theirs).path()
                ))
            })
    }

    /// correction for the hole card deal itself
    fn correct_holes(
        &self,
        seat: usize,
        hypotheses: &mut Hypotheses,
        opponent: NodeIndex,
        utilities: &mut [Utility],
    ) -> Result<()> {
        let count = hypotheses.len() as Probability;
        let before = hypotheses.sampling_reach.iter().sum::<Probability>();
        let mut current = 0.0;
        for (i, &node) in hypotheses.nodes.iter().enumerate() {
            for (edge, child) in self.tree.children(self.tree.root()) {
                let cards = edge.cards().expect("hole children are deals");
                if combos::disjoint(cards, &hypotheses.holes[i]) {
                    current +=
                        self.baseline(seat, node, child)? * hypotheses.sampling_reach[i] / count;
                }
            }
        }
        hypotheses.scale(1.0 / count);
        let after = hypotheses.sampling_reach.iter().sum::<Probability>();
        let mut next = 0.0;
        for (i, &node) in hypotheses.nodes.iter().enumerate() {
            next += self.baseline(seat, node, opponent)? * hypotheses.sampling_reach[i];
        }
        if before > 0.0 && after > 0.0 {
            let correction = current / before - next / after;
            for utility in utilities.iter_mut() {
                *utility += correction;
            }
        }
        Ok(())
    }

    /// correction for one board reveal; returns the opponent's
    /// advanced view
    #[allow(clippy::too_many_arguments)]
    fn correct_board(
        &self,
        seat: usize,
        hypotheses: &mut Hypotheses,
        opponent: NodeIndex,
        cards: &[Card],
        utilities: &mut [Utility],
    ) -> Result<NodeIndex> {
        let reveals = self
            .tree
            .children(opponent)
            .into_iter()
            .map(|(edge, child)| {
                (
                    edge.cards().expect("board children are deals").to_vec(),
                    child,
                )
            })
            .collect::<Vec<_>>();
        let count = reveals.len() as Probability;
        let before = hypotheses.sampling_reach.iter().sum::<Probability>();
        let ratios = hypotheses
            .evaluated_reach
            .iter()
            .map(|reaches| reaches.iter().sum::<Probability>())
            .collect::<Vec<_>>();
        let mut current = 0.0;
        for (i, &node) in hypotheses.nodes.iter().enumerate() {
            for (reveal, child) in &reveals {
                if let Some(mine) = self.tree.deal(node, reveal) {
                    current +=
                        self.baseline(seat, mine, *child)? * hypotheses.sampling_reach[i] / count;
                }
            }
        }
        hypotheses.scale(1.0 / count);
        let after = hypotheses.sampling_reach.iter().sum::<Probability>();
        let advanced = self
            .tree
            .deal(opponent, cards)
            .ok_or_else(|| Error::Io(std::io::Error::other("unknown board cards")))?;
        let mut next = 0.0;
        for (i, &node) in hypotheses.nodes.iter().enumerate() {
            let mine = self
                .tree
                .deal(node, cards)
                .ok_or_else(|| Error::Io(std::io::Error::other("unknown board cards")))?;
            next += self.baseline(seat, mine, advanced)? * hypotheses.sampling_reach[i];
        }
        if before > 0.0 && after > 0.0 {
            for (utility, ratio) in utilities.iter_mut().zip(ratios.iter()) {
                *utility += (current / before - next / after) * (ratio / before);
            }
        }
        Ok(advanced)
    }

    /// correction for one of the seat's own actions; reach updates
    /// happen here so the ratios straddle the transition
    #[allow(clippy::too_many_arguments)]
    fn correct_action(
        &self,
        seat: usize,
        hypotheses: &mut Hypotheses,
        opponent: NodeIndex,
        action: Action,
        sampling: &Strategy,
        evaluated: &[&Strategy],
        utilities: &mut [Utility],
    ) -> Result<()> {
        let legal = self.tree.legal(hypotheses.nodes[0]);
        let before = hypotheses.sampling_reach.iter().sum::<Probability>();
        let ratios = hypotheses
            .evaluated_reach
            .iter()
            .map(|reaches| reaches.iter().sum::<Probability>())
            .collect::<Vec<_>>();
        let mut current = 0.0;
        for (i, &node) in hypotheses.nodes.iter().enumerate() {
            let index = self
                .tree
                .node(node)
                .index()
                .expect("decision carries an index");
            for &candidate in &legal {
                let mine = self
                    .tree
                    .follow(node, candidate)
                    .expect("legal actions have children");
                let theirs = self
                    .tree
                    .follow(opponent, candidate)
                    .expect("legal actions have children");
                current += self.baseline(seat, mine, theirs)?
                    * hypotheses.sampling_reach[i]
                    * sampling.probability(index, candidate);
            }
        }
        hypotheses.observe(&self.tree, sampling, evaluated, action);
        let after = hypotheses.sampling_reach.iter().sum::<Probability>();
        let theirs = self
            .tree
            .follow(opponent, action)
            .expect("legal actions have children");
        let mut next = 0.0;
        for (i, &node) in hypotheses.nodes.iter().enumerate() {
            let mine = self
                .tree
                .follow(node, action)
                .expect("legal actions have children");
            next += self.baseline(seat, mine, theirs)? * hypotheses.sampling_reach[i];
        }
        if before > 0.0 && after > 0.0 {
            for (utility, ratio) in utilities.iter_mut().zip(ratios.iter()) {
                *utility += (current / before - next / after) * (ratio / before);
            }
        }
        Ok(())
    }
}

impl Estimator for Aivat {
    fn estimate(
        &self,
        state: &HandState,
        seat: usize,
        sampling: &Strategy,
        evaluated: &[&Strategy],
    ) -> Result<Vec<Utility>> {
        let opponent_holes = state.hole(1 - seat).ok_or(Error::MuckingUnsupported)?;
        let board = state.board();
        let mut utilities = vec![0.0; evaluated.len()];
        let mut hypotheses = Hypotheses::seed(&self.tree, &opponent_holes, &board, evaluated.len());
        let mut opponent = self
            .tree
            .deal(self.tree.root(), &opponent_holes)
            .ok_or_else(|| Error::Io(std::io::Error::other("hand does not fit the game tree")))?;
        self.correct_holes(seat, &mut hypotheses, opponent, &mut utilities)?;
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
                    opponent =
                        self.correct_board(seat, &mut hypotheses, opponent, &cards, &mut utilities)?;
                    hypotheses.deal(&self.tree, &cards)?;
                }
                Node::Decision { player, .. } => {
                    let action = *state
                        .actions
                        .get(round)
                        .and_then(|sequence| sequence.get(action_index))
                        .ok_or_else(|| Error::Io(std::io::Error::other("betting ended early")))?;
                    if *player == seat {
                        self.correct_action(
                            seat,
                            &mut hypotheses,
                            opponent,
                            action,
                            sampling,
                            evaluated,
                            &mut utilities,
                        )?;
                    }
                    hypotheses.follow(&self.tree, action)?;
                    opponent = self
                        .tree
                        .follow(opponent, action)
                        .ok_or_else(|| Error::Io(std::io::Error::other("illegal logged action")))?;
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
                        &opponent_holes,
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
    use crate::cfr::options::Options;
    use crate::cfr::plus::CfrPlus;

    fn equilibrium(game: &Game) -> Strategy {
        CfrPlus::new(game, 0)
            .unwrap()
            .solve(&Options::new(960))
            .unwrap()
    }

    #[test]
    fn rejects_baselines_that_do_not_cover_the_tree() {
        let game = Game::kuhn();
        assert!(matches!(
            Aivat::new(&game, &Strategy::empty(1)),
            Err(Error::MissingInfoset(_))
        ));
    }

    #[test]
    fn estimates_every_kuhn_showdown() {
        let game = Game::kuhn();
        let baseline = equilibrium(&game);
        let aivat = Aivat::new(&game, &baseline).unwrap();
        let uniform = Strategy::uniform(aivat.tree());
        for (mine, theirs) in [("2c", "3c"), ("2c", "4c"), ("3c", "4c"), ("4c", "2c")] {
            let line = format!("STATE:0:cc:{}|{}:0|0:alice|bob", mine, theirs);
            let state = HandState::parse(&game, &line).unwrap();
            for seat in 0..2 {
                let estimates = aivat
                    .estimate(&state, seat, &uniform, &[&uniform, &baseline])
                    .unwrap();
                assert_eq!(estimates.len(), 2);
                assert!(estimates.iter().all(|estimate| estimate.is_finite()));
            }
        }
    }

    #[test]
    fn estimation_is_deterministic() {
        let game = Game::leduc();
        let baseline = equilibrium(&game);
        let aivat = Aivat::new(&game, &baseline).unwrap();
        let uniform = Strategy::uniform(aivat.tree());
        let state =
            HandState::parse(&game, "STATE:0:rc/crc:2c|3d/4c:9|-9:alice|bob").unwrap();
        let once = aivat.estimate(&state, 0, &uniform, &[&baseline]).unwrap();
        let again = aivat.estimate(&state, 0, &uniform, &[&baseline]).unwrap();
        assert_eq!(once, again);
        assert!(once[0].is_finite());
    }

    #[test]
    fn mucked_showdowns_are_rejected() {
        let game = Game::kuhn();
        let baseline = equilibrium(&game);
        let aivat = Aivat::new(&game, &baseline).unwrap();
        let uniform = Strategy::uniform(aivat.tree());
        let state = HandState::parse(&game, "STATE:0:cc:2c|:-1|1:alice|bob").unwrap();
        assert!(matches!(
            aivat.estimate(&state, 0, &uniform, &[&uniform]),
            Err(Error::MuckingUnsupported)
        ));
    }
}
