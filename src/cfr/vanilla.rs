use super::profile::Profile;
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
use rand::seq::SliceRandom;

/// classic chance sampled cfr. works for two or more players:
/// each iteration shuffles the deck once, deals deterministically
/// from it at every chance node, and regret matches with negative
/// regrets projected away at strategy time.
pub struct VanillaCfr {
    game: Game,
    tree: Tree,
    profile: Profile,
    rng: SmallRng,
}

impl VanillaCfr {
    pub fn new(game: &Game, seed: u64) -> Result<Self> {
        game.require_limit()?;
        game.require_evaluable()?;
        let tree = Builder::build(game)?;
        let profile = Profile::new(tree.decision_count());
        Ok(Self {
            game: game.clone(),
            tree,
            profile,
            rng: SmallRng::seed_from_u64(seed),
        })
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn strategy(&self) -> Strategy {
        self.profile.average(&self.tree, 0.0)
    }

    /// run the given number of sampled iterations. training picks
    /// up from the accumulated state on repeated calls.
    pub fn train(&mut self, iterations: usize) -> Result<Strategy> {
        let players = self.game.players();
        for _ in 0..iterations {
            let mut deck = self.game.deck().cards().to_vec();
            deck.shuffle(&mut self.rng);
            let root = self.tree.root();
            let mut walk = Walk {
                tree: &self.tree,
                profile: &mut self.profile,
                suits: self.game.suits(),
                players,
            };
            walk.descend(
                &vec![root; players],
                &vec![1.0; players],
                &[],
                &[],
                &deck,
                &vec![false; players],
            )?;
        }
        Ok(self.strategy())
    }
}

struct Walk<'a> {
    tree: &'a Tree,
    profile: &'a mut Profile,
    suits: u8,
    players: usize,
}

impl Walk<'_> {
    fn descend(
        &mut self,
        nodes: &[NodeIndex],
        reach: &[Probability],
        holes: &[Vec<Card>],
        board: &[Card],
        deck: &[Card],
        folded: &[bool],
    ) -> Result<Vec<Utility>> {
        match self.tree.node(nodes[0]) {
            Node::Terminal { .. } => {
                let commitment = self
                    .tree
                    .node(nodes[0])
                    .commitment()
                    .expect("terminal carries commitments");
                showdown::utility(holes, board, folded, commitment, self.suits)
            }
            Node::Holes { count, .. } => {
                // deal each player the next cards off the shuffle
                let count = *count;
                let mut dealt = Vec::new();
                for player in 0..self.players {
                    let mut cards = deck[player * count..(player + 1) * count].to_vec();
                    cards.sort();
                    dealt.push(cards);
                }
                let next = nodes
                    .iter()
                    .enumerate()
                    .map(|(player, &node)| {
                        self.tree
                            .deal(node, &dealt[player])
                            .expect("every deal is keyed")
                    })
                    .collect::<Vec<_>>();
                self.descend(
                    &next,
                    reach,
                    &dealt,
                    board,
                    &deck[self.players * count..],
                    folded,
                )
            }
            Node::Board { count, .. } => {
                let count = *count;
                let mut cards = deck[..count].to_vec();
                cards.sort();
                let next = nodes
                    .iter()
                    .map(|&node| self.tree.deal(node, &cards).expect("every deal is keyed"))
                    .collect::<Vec<_>>();
                let mut shown = board.to_vec();
                shown.extend_from_slice(&cards);
                self.descend(&next, reach, holes, &shown, &deck[count..], folded)
            }
            Node::Decision { .. } => self.decision(nodes, reach, holes, board, deck, folded),
        }
    }

    fn decision(
        &mut self,
        nodes: &[NodeIndex],
        reach: &[Probability],
        holes: &[Vec<Card>],
        board: &[Card],
        deck: &[Card],
        folded: &[bool],
    ) -> Result<Vec<Utility>> {
        let actor = self
            .tree
            .node(nodes[0])
            .player()
            .expect("decision carries a player");
        let view = nodes[actor];
        let index = self
            .tree
            .node(view)
            .index()
            .expect("decision carries an index");
        let legal = self.tree.legal(view);
        let sigma = self.profile.matched(index, &legal);
        self.profile.set_current(index, sigma);
        self.profile.accumulate(index, reach[actor], &sigma);
        let mut utils = vec![Vec::new(); crate::NUM_ACTIONS];
        let mut value = vec![0.0; self.players];
        for &action in &legal {
            let next = nodes
                .iter()
                .map(|&node| {
                    self.tree
                        .follow(node, action)
                        .expect("action legal in every view")
                })
                .collect::<Vec<_>>();
            let mut next_reach = reach.to_vec();
            next_reach[actor] *= sigma[action.index()];
            let mut next_folded = folded.to_vec();
            if action == Action::Fold {
                next_folded[actor] = true;
            }
            let util = self.descend(&next, &next_reach, holes, board, deck, &next_folded)?;
            for player in 0..self.players {
                value[player] += sigma[action.index()] * util[player];
            }
            utils[action.index()] = util;
        }
        let opponents = reach
            .iter()
            .enumerate()
            .filter(|(player, _)| *player != actor)
            .map(|(_, &probability)| probability)
            .product::<Probability>();
        for &action in &legal {
            let regret = utils[action.index()][actor] - value[actor];
            self.profile.add_regret(index, action, regret * opponents);
        }
        Ok(value)
    }
}
