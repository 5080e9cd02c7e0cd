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
use crate::tree::builder::Builder;
use crate::tree::node::Node;
use crate::tree::tree::Tree;
use petgraph::graph::NodeIndex;

/// the opponent hypotheses carried down a best response walk:
/// which node the opponent's view sits at, the posterior weight
/// of that hypothesis, and the hole cards behind it.
#[derive(Debug, Clone)]
struct Belief {
    node: NodeIndex,
    weight: Probability,
    holes: Vec<Card>,
}

/// exact best response against a fixed strategy. one walk per
/// seat over the hero's view of the tree, with a belief
/// distribution over the opponent's hidden cards reweighted as
/// chance and opponent actions reveal information. ties at the
/// hero's decisions split uniformly over the argmax set.
pub struct BestResponse {
    game: Game,
    tree: Tree,
}

impl BestResponse {
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

    pub fn solve(&self, strategy: &Strategy) -> Result<Strategy> {
        if strategy.len() != self.tree.decision_count() {
            return Err(Error::InvalidStrategy(format!(
                "strategy covers {} decisions, tree has {}",
                strategy.len(),
                self.tree.decision_count()
            )));
        }
        let mut response = Strategy::empty(self.tree.decision_count());
        for hero in 0..2 {
            self.from_root(hero, strategy, &mut response)?;
        }
        Ok(response)
    }

    /// hero's hole cards are uniform over the deal; each choice
    /// spawns a fresh uniform belief over disjoint opponent deals
    fn from_root(&self, hero: usize, strategy: &Strategy, response: &mut Strategy) -> Result<Utility> {
        let deals = self
            .tree
            .children(self.tree.root())
            .into_iter()
            .map(|(edge, child)| {
                (
                    edge.cards().expect("hole children are deals").to_vec(),
                    child,
                )
            })
            .collect::<Vec<_>>();
        let mut sum = 0.0;
        for (cards, child) in &deals {
            let beliefs = deals
                .iter()
                .filter(|(other, _)| combos::disjoint(other, cards))
                .map(|(other, node)| Belief {
                    node: *node,
                    weight: 1.0,
                    holes: other.clone(),
                })
                .collect::<Vec<_>>();
            sum += self.value(
                hero,
                *child,
                beliefs,
                cards,
                &[],
                [false, false],
                strategy,
                response,
            )?;
        }
        Ok(sum / deals.len() as Utility)
    }

    #[allow(clippy::too_many_arguments)]
    fn value(
        &self,
        hero: usize,
        node: NodeIndex,
        beliefs: Vec<Belief>,
        holes: &[Card],
        board: &[Card],
        folded: [bool; 2],
        strategy: &Strategy,
        response: &mut Strategy,
    ) -> Result<Utility> {
        match self.tree.node(node) {
            Node::Terminal { .. } => self.showdown(hero, node, &beliefs, holes, board, folded),
            Node::Board { .. } => {
                self.board(hero, node, beliefs, holes, board, folded, strategy, response)
            }
            Node::Decision { player, .. } if *player == hero => {
                self.maximize(hero, node, beliefs, holes, board, folded, strategy, response)
            }
            Node::Decision { .. } => {
                self.respond(hero, node, beliefs, holes, board, folded, strategy, response)
            }
            Node::Holes { .. } => unreachable!("hole cards are dealt from the root"),
        }
    }

    /// belief weighted utility over opponent hypotheses
    fn showdown(
        &self,
        hero: usize,
        node: NodeIndex,
        beliefs: &[Belief],
        holes: &[Card],
        board: &[Card],
        folded: [bool; 2],
    ) -> Result<Utility> {
        let total = beliefs.iter().map(|belief| belief.weight).sum::<Probability>();
        if total <= 0.0 {
            return Ok(0.0);
        }
        let commitment = self
            .tree
            .node(node)
            .commitment()
            .expect("terminal carries commitments");
        let mut sum = 0.0;
        for belief in beliefs {
            let mut seats = [holes.to_vec(), holes.to_vec()];
            seats[1 - hero] = belief.holes.clone();
            let utilities =
                showdown::utility(&seats, board, &folded, commitment, self.game.suits())?;
            sum += belief.weight * utilities[hero];
        }
        Ok(sum / total)
    }

    /// hero's view enumerates the board uniformly; hypotheses that
    /// conflict with the revealed cards drop out of the belief
    #[allow(clippy::too_many_arguments)]
    fn board(
        &self,
        hero: usize,
        node: NodeIndex,
        beliefs: Vec<Belief>,
        holes: &[Card],
        board: &[Card],
        folded: [bool; 2],
        strategy: &Strategy,
        response: &mut Strategy,
    ) -> Result<Utility> {
        let reveals = self
            .tree
            .children(node)
            .into_iter()
            .map(|(edge, child)| {
                (
                    edge.cards().expect("board children are deals").to_vec(),
                    child,
                )
            })
            .collect::<Vec<_>>();
        let mut sum = 0.0;
        for (cards, child) in &reveals {
            let surviving = beliefs
                .iter()
                .filter_map(|belief| {
                    self.tree.deal(belief.node, cards).map(|node| Belief {
                        node,
                        weight: belief.weight,
                        holes: belief.holes.clone(),
                    })
                })
                .collect::<Vec<_>>();
            let mut shown = board.to_vec();
            shown.extend_from_slice(cards);
            sum += self.value(
                hero, *child, surviving, holes, &shown, folded, strategy, response,
            )?;
        }
        Ok(sum / reveals.len() as Utility)
    }

    /// hero's decision: evaluate every action, give the argmax set
    /// uniform probability in the response, return the best value
    #[allow(clippy::too_many_arguments)]
    fn maximize(
        &self,
        hero: usize,
        node: NodeIndex,
        beliefs: Vec<Belief>,
        holes: &[Card],
        board: &[Card],
        folded: [bool; 2],
        strategy: &Strategy,
        response: &mut Strategy,
    ) -> Result<Utility> {
        let index = self
            .tree
            .node(node)
            .index()
            .expect("decision carries an index");
        let legal = self.tree.legal(node);
        let mut values = Vec::new();
        for &action in &legal {
            let child = self.tree.follow(node, action).expect("legal actions have children");
            let next = beliefs
                .iter()
                .map(|belief| Belief {
                    node: self
                        .tree
                        .follow(belief.node, action)
                        .expect("legal actions have children"),
                    weight: belief.weight,
                    holes: belief.holes.clone(),
                })
                .collect::<Vec<_>>();
            let value = self.value(
                hero,
                child,
                next,
                holes,
                board,
                fold(folded, hero, action),
                strategy,
                response,
            )?;
            values.push((action, value));
        }
        let best = values
            .iter()
            .map(|(_, value)| *value)
            .fold(Utility::NEG_INFINITY, Utility::max);
        let argmax = values
            .iter()
            .filter(|(_, value)| best - value < crate::VALUE_TOLERANCE)
            .map(|(action, _)| *action)
            .collect::<Vec<_>>();
        let share = 1.0 / argmax.len() as Probability;
        let mut probs = [0.0; crate::NUM_ACTIONS];
        for action in argmax {
            probs[action.index()] = share;
        }
        response.set(index, probs);
        Ok(best)
    }

    /// opponent's decision: mix children by the belief weighted
    /// marginal strategy and multiply hypothesis weights through
    #[allow(clippy::too_many_arguments)]
    fn respond(
        &self,
        hero: usize,
        node: NodeIndex,
        beliefs: Vec<Belief>,
        holes: &[Card],
        board: &[Card],
        folded: [bool; 2],
        strategy: &Strategy,
        response: &mut Strategy,
    ) -> Result<Utility> {
        let opponent = 1 - hero;
        let total = beliefs.iter().map(|belief| belief.weight).sum::<Probability>();
        if total <= 0.0 {
            return Ok(0.0);
        }
        let mut value = 0.0;
        for action in self.tree.legal(node) {
            let child = self.tree.follow(node, action).expect("legal actions have children");
            let mut marginal = 0.0;
            let next = beliefs
                .iter()
                .map(|belief| {
                    let sigma = strategy.probability(
                        self.tree
                            .node(belief.node)
                            .index()
                            .expect("decision carries an index"),
                        action,
                    );
                    marginal += belief.weight * sigma;
                    Belief {
                        node: self
                            .tree
                            .follow(belief.node, action)
                            .expect("legal actions have children"),
                        weight: belief.weight * sigma,
                        holes: belief.holes.clone(),
                    }
                })
                .collect::<Vec<_>>();
            let utility = self.value(
                hero,
                child,
                next,
                holes,
                board,
                fold(folded, opponent, action),
                strategy,
                response,
            )?;
            value += (marginal / total) * utility;
        }
        Ok(value)
    }
}

fn fold(mut folded: [bool; 2], player: usize, action: Action) -> [bool; 2] {
    if action == Action::Fold {
        folded[player] = true;
    }
    folded
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::value::GameValue;

    fn game_values(game: &Game, strategy: &Strategy) -> Vec<Utility> {
        let response = BestResponse::new(game).unwrap().solve(strategy).unwrap();
        GameValue::new(game)
            .unwrap()
            .evaluate(&[strategy, &response])
            .unwrap()
    }

    #[test]
    fn kuhn_always_call_loses_a_third() {
        let game = Game::kuhn();
        let tree = BestResponse::new(&game).unwrap();
        let caller = Strategy::preferring(tree.tree(), Action::Call);
        let values = game_values(&game, &caller);
        assert!((values[0] + 1.0 / 3.0).abs() < crate::VALUE_TOLERANCE);
        assert!((values[1] - 1.0 / 3.0).abs() < crate::VALUE_TOLERANCE);
    }

    #[test]
    fn kuhn_always_fold_loses_the_blind() {
        let game = Game::kuhn();
        let tree = BestResponse::new(&game).unwrap();
        let folder = Strategy::preferring(tree.tree(), Action::Fold);
        let values = game_values(&game, &folder);
        assert!((values[0] + 1.0).abs() < crate::VALUE_TOLERANCE);
        assert!((values[1] - 1.0).abs() < crate::VALUE_TOLERANCE);
    }

    #[test]
    fn leduc_always_fold_loses_the_blind() {
        let game = Game::leduc();
        let tree = BestResponse::new(&game).unwrap();
        let folder = Strategy::preferring(tree.tree(), Action::Fold);
        let values = game_values(&game, &folder);
        assert!((values[0] + 1.0).abs() < crate::VALUE_TOLERANCE);
        assert!((values[1] - 1.0).abs() < crate::VALUE_TOLERANCE);
    }

    #[test]
    fn leduc_always_call_is_exploitable() {
        let game = Game::leduc();
        let tree = BestResponse::new(&game).unwrap();
        let caller = Strategy::preferring(tree.tree(), Action::Call);
        let values = game_values(&game, &caller);
        assert!(values[0] < 0.0);
    }

    #[test]
    fn responses_are_uniform_over_ties() {
        let game = Game::kuhn();
        let solver = BestResponse::new(&game).unwrap();
        let uniform = Strategy::uniform(solver.tree());
        let response = solver.solve(&uniform).unwrap();
        for index in 0..solver.tree().decision_count() {
            let support = response
                .probs(index)
                .iter()
                .filter(|&&p| p > 0.0)
                .copied()
                .collect::<Vec<_>>();
            assert!(!support.is_empty());
            let first = support[0];
            assert!(support.iter().all(|&p| (p - first).abs() < crate::VALUE_TOLERANCE));
        }
        assert!(response.validate(solver.tree()).is_ok());
    }
}
