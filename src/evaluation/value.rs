use super::showdown;
use crate::Utility;
use crate::cards::card::Card;
use crate::cards::combos;
use crate::cfr::strategy::Strategy;
use crate::error::Error;
use crate::error::Result;
use crate::game::action::Action;
use crate::game::game::Game;
use crate::tree::builder::Builder;
use crate::tree::node::Node;
use crate::tree::tree::Tree;
use petgraph::graph::NodeIndex;

/// expected utility of a strategy profile by exhaustive walk.
/// chance nodes average uniformly over their legal deals, decision
/// nodes mix children by the acting seat's probabilities.
pub struct GameValue {
    game: Game,
    tree: Tree,
}

impl GameValue {
    pub fn new(game: &Game) -> Result<Self> {
        game.require_limit()?;
        game.require_evaluable()?;
        Ok(Self {
            game: game.clone(),
            tree: Builder::build(game)?,
        })
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// per strategy utilities, averaged over every seating of the
    /// provided strategies so nobody benefits from position
    pub fn evaluate(&self, strategies: &[&Strategy]) -> Result<Vec<Utility>> {
        let players = self.game.players();
        if strategies.len() != players {
            return Err(Error::ParameterOutOfRange(format!(
                "{} strategies provided for a {} player game",
                strategies.len(),
                players
            )));
        }
        let mut sums = vec![0.0; players];
        let seatings = permutations(players);
        for seating in &seatings {
            let assigned = seating
                .iter()
                .map(|&strategy| strategies[strategy])
                .collect::<Vec<_>>();
            let values = self.utilities(&assigned, &mut |_, _| {})?;
            for (seat, &strategy) in seating.iter().enumerate() {
                sums[strategy] += values[seat];
            }
        }
        Ok(sums
            .into_iter()
            .map(|sum| sum / seatings.len() as Utility)
            .collect())
    }

    /// single seat-ordered traversal. the visitor sees every node
    /// tuple together with the expected utilities of the subgame
    /// below it, which is how the aivat baseline table gets built.
    pub fn utilities<F>(&self, assigned: &[&Strategy], visitor: &mut F) -> Result<Vec<Utility>>
    where
        F: FnMut(&[NodeIndex], &[Utility]),
    {
        let players = self.game.players();
        let cursors = vec![self.tree.root(); players];
        self.walk(
            assigned,
            &cursors,
            &Vec::new(),
            &[],
            &vec![false; players],
            visitor,
        )
    }

    fn walk<F>(
        &self,
        assigned: &[&Strategy],
        cursors: &[NodeIndex],
        holes: &[Vec<Card>],
        board: &[Card],
        folded: &[bool],
        visitor: &mut F,
    ) -> Result<Vec<Utility>>
    where
        F: FnMut(&[NodeIndex], &[Utility]),
    {
        let values = match self.tree.node(cursors[0]) {
            Node::Terminal { .. } => {
                let commitment = self
                    .tree
                    .node(cursors[0])
                    .commitment()
                    .expect("terminal carries commitments");
                showdown::utility(holes, board, folded, commitment, self.game.suits())?
            }
            Node::Holes { .. } => self.chance_holes(assigned, cursors, board, folded, visitor)?,
            Node::Board { .. } => {
                self.chance_board(assigned, cursors, holes, board, folded, visitor)?
            }
            Node::Decision { .. } => {
                self.decision(assigned, cursors, holes, board, folded, visitor)?
            }
        };
        visitor(cursors, &values);
        Ok(values)
    }

    /// uniform over every disjoint assignment of hole cards
    fn chance_holes<F>(
        &self,
        assigned: &[&Strategy],
        cursors: &[NodeIndex],
        board: &[Card],
        folded: &[bool],
        visitor: &mut F,
    ) -> Result<Vec<Utility>>
    where
        F: FnMut(&[NodeIndex], &[Utility]),
    {
        let players = self.game.players();
        let deals = cursors
            .iter()
            .map(|&cursor| {
                self.tree
                    .children(cursor)
                    .into_iter()
                    .map(|(edge, child)| {
                        (
                            edge.cards().expect("hole children are deals").to_vec(),
                            child,
                        )
                    })
                    .collect::<Vec<_>>()
            })
            .collect::<Vec<_>>();
        let mut sums = vec![0.0; players];
        let mut count = 0usize;
        let mut chosen = Vec::with_capacity(players);
        self.assign(assigned, &deals, &mut chosen, board, folded, visitor, &mut sums, &mut count)?;
        Ok(sums.into_iter().map(|sum| sum / count as Utility).collect())
    }

    /// recursive cartesian product over per-seat deals, pruned to
    /// mutually disjoint card choices
    #[allow(clippy::too_many_arguments)]
    fn assign<F>(
        &self,
        assigned: &[&Strategy],
        deals: &[Vec<(Vec<Card>, NodeIndex)>],
        chosen: &mut Vec<(Vec<Card>, NodeIndex)>,
        board: &[Card],
        folded: &[bool],
        visitor: &mut F,
        sums: &mut [Utility],
        count: &mut usize,
    ) -> Result<()>
    where
        F: FnMut(&[NodeIndex], &[Utility]),
    {
        if chosen.len() == deals.len() {
            let holes = chosen.iter().map(|(cards, _)| cards.clone()).collect::<Vec<_>>();
            let cursors = chosen.iter().map(|(_, cursor)| *cursor).collect::<Vec<_>>();
            let values = self.walk(assigned, &cursors, &holes, board, folded, visitor)?;
            for (sum, value) in sums.iter_mut().zip(values.iter()) {
                *sum += value;
            }
            *count += 1;
            return Ok(());
        }
        for (cards, child) in &deals[chosen.len()] {
            if chosen
                .iter()
                .all(|(taken, _)| combos::disjoint(taken, cards))
            {
                chosen.push((cards.clone(), *child));
                self.assign(assigned, deals, chosen, board, folded, visitor, sums, count)?;
                chosen.pop();
            }
        }
        Ok(())
    }

    /// uniform over the board deals legal in every seat's view
    fn chance_board<F>(
        &self,
        assigned: &[&Strategy],
        cursors: &[NodeIndex],
        holes: &[Vec<Card>],
        board: &[Card],
        folded: &[bool],
        visitor: &mut F,
    ) -> Result<Vec<Utility>>
    where
        F: FnMut(&[NodeIndex], &[Utility]),
    {
        let players = self.game.players();
        let mut sums = vec![0.0; players];
        let mut count = 0usize;
        for (edge, child) in self.tree.children(cursors[0]) {
            let cards = edge.cards().expect("board children are deals");
            let next = cursors
                .iter()
                .enumerate()
                .map(|(seat, &cursor)| {
                    if seat == 0 {
                        Some(child)
                    } else {
                        self.tree.deal(cursor, cards)
                    }
                })
                .collect::<Option<Vec<_>>>();
            if let Some(next) = next {
                let mut shown = board.to_vec();
                shown.extend_from_slice(cards);
                let values = self.walk(assigned, &next, holes, &shown, folded, visitor)?;
                for (sum, value) in sums.iter_mut().zip(values.iter()) {
                    *sum += value;
                }
                count += 1;
            }
        }
        Ok(sums.into_iter().map(|sum| sum / count as Utility).collect())
    }

    fn decision<F>(
        &self,
        assigned: &[&Strategy],
        cursors: &[NodeIndex],
        holes: &[Vec<Card>],
        board: &[Card],
        folded: &[bool],
        visitor: &mut F,
    ) -> Result<Vec<Utility>>
    where
        F: FnMut(&[NodeIndex], &[Utility]),
    {
        let players = self.game.players();
        let actor = self
            .tree
            .node(cursors[0])
            .player()
            .expect("decision carries a player");
        let view = cursors[actor];
        let index = self
            .tree
            .node(view)
            .index()
            .expect("decision carries an index");
        let sigma = assigned[actor].probs(index);
        let mut values = vec![0.0; players];
        for action in self.tree.legal(view) {
            let probability = sigma[action.index()];
            let next = cursors
                .iter()
                .map(|&cursor| {
                    self.tree
                        .follow(cursor, action)
                        .expect("action legal in every view")
                })
                .collect::<Vec<_>>();
            let mut next_folded = folded.to_vec();
            if action == Action::Fold {
                next_folded[actor] = true;
            }
            let child = self.walk(assigned, &next, holes, board, &next_folded, visitor)?;
            for (value, utility) in values.iter_mut().zip(child.iter()) {
                *value += probability * utility;
            }
        }
        Ok(values)
    }
}

/// all seatings of n strategies
pub fn permutations(n: usize) -> Vec<Vec<usize>> {
    fn recurse(prefix: &mut Vec<usize>, remaining: &mut Vec<usize>, out: &mut Vec<Vec<usize>>) {
        if remaining.is_empty() {
            out.push(prefix.clone());
            return;
        }
        for i in 0..remaining.len() {
            let picked = remaining.remove(i);
            prefix.push(picked);
            recurse(prefix, remaining, out);
            prefix.pop();
            remaining.insert(i, picked);
        }
    }
    let mut out = Vec::new();
    recurse(&mut Vec::new(), &mut (0..n).collect(), &mut out);
    out
}
