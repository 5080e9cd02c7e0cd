use super::options::Options;
use super::profile::Profile;
use super::restriction::Restriction;
use super::strategy::Strategy;
use crate::Probability;
use crate::Utility;
use crate::cards::card::Card;
use crate::error::Result;
use crate::evaluation::showdown;
use crate::game::action::Action;
use crate::game::game::Game;
use crate::tree::builder::Builder;
use crate::tree::node::Node;
use crate::tree::tree::Tree;
use petgraph::graph::NodeIndex;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use std::collections::HashMap;

/// two player cfr+ over the canonical tree. chance nodes are
/// fully enumerated rather than sampled, each iteration fixes one
/// trainer seat and traverses twice, regrets floor at zero, and
/// strategy averaging is delayed and linearly weighted.
///
/// an optional restriction bends the opponent seat, which is how
/// restricted nash and data biased responses reuse this engine.
pub struct CfrPlus {
    game: Game,
    tree: Tree,
    profile: Profile,
    restriction: Option<Box<dyn Restriction>>,
    rng: SmallRng,
}

impl CfrPlus {
    pub fn new(game: &Game, seed: u64) -> Result<Self> {
        Self::create(game, seed, None)
    }

    pub fn restricted(game: &Game, seed: u64, restriction: Box<dyn Restriction>) -> Result<Self> {
        Self::create(game, seed, Some(restriction))
    }

    fn create(game: &Game, seed: u64, restriction: Option<Box<dyn Restriction>>) -> Result<Self> {
        game.require_limit()?;
        game.require_two_players()?;
        game.require_evaluable()?;
        let tree = Builder::build(game)?;
        let profile = Profile::new(tree.decision_count());
        Ok(Self {
            game: game.clone(),
            tree,
            profile,
            restriction,
            rng: SmallRng::seed_from_u64(seed),
        })
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn strategy(&self, minimal: Probability) -> Strategy {
        self.profile.average(&self.tree, minimal)
    }

    /// run to completion and hand back the averaged strategy
    pub fn solve(&mut self, options: &Options) -> Result<Strategy> {
        self.train(options, |_, _, _| {})
    }

    /// train for the configured number of iterations, invoking the
    /// checkpoint callback with (strategy, checkpoint index,
    /// iterations so far). calling this again continues from the
    /// accumulated regret and strategy state.
    pub fn train<F>(&mut self, options: &Options, mut checkpoint: F) -> Result<Strategy>
    where
        F: FnMut(&Strategy, usize, usize),
    {
        options.validate()?;
        let window = options.checkpoint_window();
        let mut until_checkpoint = options.weight_delay + window;
        let mut checkpoints = 0;
        for i in 0..options.iterations {
            let weight = (i as f64 - options.weight_delay as f64).max(0.0);
            self.iterate(weight)?;
            until_checkpoint -= 1;
            if until_checkpoint == 0 || i == options.iterations - 1 {
                let strategy = self
                    .profile
                    .average(&self.tree, options.minimal_action_probability);
                checkpoint(&strategy, checkpoints, i + 1);
                checkpoints += 1;
                until_checkpoint = window;
            }
        }
        Ok(self
            .profile
            .average(&self.tree, options.minimal_action_probability))
    }

    /// run both trainer-seat traversals for a single iteration
    fn iterate(&mut self, weight: f64) -> Result<()> {
        let mut restriction = self.restriction.as_deref_mut();
        if let Some(restriction) = restriction.as_deref_mut() {
            restriction.begin(&mut self.rng);
        }
        for trainer in 0..2 {
            let mut pass = Pass {
                tree: &self.tree,
                profile: &mut self.profile,
                restriction: restriction.as_deref_mut().map(|r| r as &mut dyn Restriction),
                rng: &mut self.rng,
                suits: self.game.suits(),
                trainer,
                weight,
            };
            let root = [pass.tree.root(), pass.tree.root()];
            pass.descend(root, &[Vec::new(), Vec::new()], &[], [false, false], 1.0)?;
        }
        Ok(())
    }
}

/// one counterfactual traversal for a fixed trainer seat.
/// borrows the pieces of the solver separately so the profile can
/// mutate while the tree is walked.
struct Pass<'a> {
    tree: &'a Tree,
    profile: &'a mut Profile,
    restriction: Option<&'a mut dyn Restriction>,
    rng: &'a mut SmallRng,
    suits: u8,
    trainer: usize,
    weight: f64,
}

impl Pass<'_> {
    /// returns the trainer's utility scaled by the opponent's
    /// reach probability, which folds the counterfactual weighting
    /// into the recursion itself.
    fn descend(
        &mut self,
        nodes: [NodeIndex; 2],
        holes: &[Vec<Card>; 2],
        board: &[Card],
        folded: [bool; 2],
        reach: Probability,
    ) -> Result<Utility> {
        match self.tree.node(nodes[0]) {
            Node::Terminal { .. } => self.terminal(nodes, holes, board, folded, reach),
            Node::Holes { .. } => self.holes(nodes, board, folded, reach),
            Node::Board { .. } => self.board(nodes, holes, board, folded, reach),
            Node::Decision { .. } => self.decision(nodes, holes, board, folded, reach),
        }
    }

    fn terminal(
        &mut self,
        nodes: [NodeIndex; 2],
        holes: &[Vec<Card>; 2],
        board: &[Card],
        folded: [bool; 2],
        reach: Probability,
    ) -> Result<Utility> {
        let commitment = self
            .tree
            .node(nodes[0])
            .commitment()
            .expect("terminal carries commitments");
        let utilities = showdown::utility(holes, board, &folded, commitment, self.suits)?;
        Ok(utilities[self.trainer] * reach)
    }

    /// enumerate every disjoint pair of hole card deals and return
    /// the mean value across them
    fn holes(
        &mut self,
        nodes: [NodeIndex; 2],
        board: &[Card],
        folded: [bool; 2],
        reach: Probability,
    ) -> Result<Utility> {
        let deals = |view: NodeIndex| {
            self.tree
                .children(view)
                .into_iter()
                .map(|(edge, child)| {
                    (
                        edge.cards().expect("hole children are deals").to_vec(),
                        child,
                    )
                })
                .collect::<Vec<_>>()
        };
        let first = deals(nodes[0]);
        let second = deals(nodes[1]);
        let mut sum = 0.0;
        let mut count = 0usize;
        for (a, n0) in &first {
            for (b, n1) in &second {
                if crate::cards::combos::disjoint(a, b) {
                    count += 1;
                    sum += self.descend(
                        [*n0, *n1],
                        &[a.clone(), b.clone()],
                        board,
                        folded,
                        reach,
                    )?;
                }
            }
        }
        Ok(sum / count as Utility)
    }

    /// both views exclude their own dealt cards, so the legal
    /// board deals are the intersection of their child keys
    fn board(
        &mut self,
        nodes: [NodeIndex; 2],
        holes: &[Vec<Card>; 2],
        board: &[Card],
        folded: [bool; 2],
        reach: Probability,
    ) -> Result<Utility> {
        let other = self
            .tree
            .children(nodes[1])
            .into_iter()
            .map(|(edge, index)| (edge.clone(), index))
            .collect::<HashMap<_, _>>();
        let shared = self
            .tree
            .children(nodes[0])
            .into_iter()
            .filter_map(|(edge, index)| other.get(edge).map(|&found| (edge.clone(), index, found)))
            .collect::<Vec<_>>();
        let count = shared.len() as Utility;
        let mut sum = 0.0;
        for (edge, n0, n1) in shared {
            let mut dealt = board.to_vec();
            dealt.extend_from_slice(edge.cards().expect("board children are deals"));
            sum += self.descend([n0, n1], holes, &dealt, folded, reach)?;
        }
        Ok(sum / count)
    }

    fn decision(
        &mut self,
        nodes: [NodeIndex; 2],
        holes: &[Vec<Card>; 2],
        board: &[Card],
        folded: [bool; 2],
        reach: Probability,
    ) -> Result<Utility> {
        let player = self
            .tree
            .node(nodes[0])
            .player()
            .expect("decision carries a player");
        let view = nodes[player];
        let index = self
            .tree
            .node(view)
            .index()
            .expect("decision carries an index");
        let legal = self.tree.legal(view);
        if player == self.trainer {
            // counterfactual side: probe every action at full reach
            // against the strategy played on the last opponent visit
            let sigma = self.profile.current(index);
            let mut utils = [0.0; crate::NUM_ACTIONS];
            let mut value = 0.0;
            for &action in &legal {
                let next = self.follow(nodes, action);
                let next_folded = fold(folded, player, action);
                let util = self.descend(next, holes, board, next_folded, reach)?;
                utils[action.index()] = util;
                value += sigma[action.index()] * util;
            }
            for &action in &legal {
                self.profile
                    .floor_regret(index, action, utils[action.index()] - value);
            }
            Ok(value)
        } else {
            // opponent side: refresh the regret matched strategy,
            // let any restriction override what actually gets
            // played, and accumulate the weighted average
            let matched = self.profile.matched(index, &legal);
            self.profile.set_current(index, matched);
            let played = match self.restriction.as_deref_mut() {
                Some(restriction) => restriction
                    .policy(index, &matched, &mut *self.rng)
                    .unwrap_or(matched),
                None => matched,
            };
            let mut value = 0.0;
            for &action in &legal {
                let next = self.follow(nodes, action);
                let next_folded = fold(folded, player, action);
                value += self.descend(
                    next,
                    holes,
                    board,
                    next_folded,
                    reach * played[action.index()],
                )?;
            }
            self.profile
                .accumulate(index, reach * self.weight, &played);
            Ok(value)
        }
    }

    fn follow(&self, nodes: [NodeIndex; 2], action: Action) -> [NodeIndex; 2] {
        [
            self.tree
                .follow(nodes[0], action)
                .expect("action legal in every view"),
            self.tree
                .follow(nodes[1], action)
                .expect("action legal in every view"),
        ]
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
    use crate::evaluation::exploitability::Exploitability;

    #[test]
    fn rejects_short_runs() {
        let mut solver = CfrPlus::new(&Game::kuhn(), 0).unwrap();
        assert!(solver.solve(&Options::new(700)).is_err());
    }

    #[test]
    fn kuhn_converges_under_five_millibets() {
        let game = Game::kuhn();
        let mut solver = CfrPlus::new(&game, 0).unwrap();
        let strategy = solver.solve(&Options::new(960)).unwrap();
        assert!(strategy.validate(solver.tree()).is_ok());
        let exploitability = Exploitability::new(&game)
            .unwrap()
            .exploitability(&strategy)
            .unwrap();
        assert!(
            exploitability < 5.0,
            "exploitability {} mbb/g",
            exploitability
        );
    }

    #[test]
    fn checkpoints_fire_on_schedule() {
        let game = Game::kuhn();
        let mut solver = CfrPlus::new(&game, 0).unwrap();
        let mut seen = Vec::new();
        let options = Options::new(800).with_weight_delay(700).with_checkpoints(40);
        solver
            .train(&options, |_, index, iterations| {
                seen.push((index, iterations));
            })
            .unwrap();
        // first checkpoint lands after the warmup plus one window,
        // then every window, then once more at the end
        assert_eq!(seen, vec![(0, 740), (1, 780), (2, 800)]);
    }

    #[test]
    fn leduc_training_stays_normalized() {
        let game = Game::leduc();
        let mut solver = CfrPlus::new(&game, 1).unwrap();
        let options = Options::new(30).with_weight_delay(10);
        let strategy = solver.train(&options, |_, _, _| {}).unwrap();
        assert!(strategy.validate(solver.tree()).is_ok());
        let exploitability = Exploitability::new(&game)
            .unwrap()
            .exploitability(&strategy)
            .unwrap();
        assert!(exploitability >= 0.0);
        assert!(exploitability.is_finite());
    }

    #[test]
    fn training_is_resumable() {
        let game = Game::kuhn();
        let exploitability = Exploitability::new(&game).unwrap();
        let mut solver = CfrPlus::new(&game, 0).unwrap();
        let options = Options::new(800);
        let first = solver.solve(&options).unwrap();
        let early = exploitability.exploitability(&first).unwrap();
        let second = solver.solve(&options).unwrap();
        let late = exploitability.exploitability(&second).unwrap();
        assert!(late <= early + 0.5);
    }
}
