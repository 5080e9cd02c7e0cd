use super::edge::Edge;
use super::node::Node;
use super::tree::Tree;
use crate::Chips;
use crate::cards::card::Card;
use crate::cards::combos;
use crate::error::Result;
use crate::game::action::Action;
use crate::game::game::Game;
use petgraph::graph::DiGraph;
use petgraph::graph::NodeIndex;

/// betting state carried down while the tree is generated.
/// the deck shrinks as chance nodes deal cards, everything else
/// follows the limit betting rules.
#[derive(Debug, Clone)]
struct State {
    folded: Vec<bool>,
    commitment: Vec<Chips>,
    deck: Vec<Card>,
    round: usize,
    raises: usize,
    acted: usize,
    actor: usize,
}

impl State {
    fn new(game: &Game, deck: Vec<Card>) -> Self {
        Self {
            folded: vec![false; game.players()],
            commitment: (0..game.players()).map(|p| game.blind(p)).collect(),
            deck,
            round: 0,
            raises: 0,
            acted: 0,
            actor: game.first_player(0),
        }
    }
    fn next_round(&self, game: &Game) -> Self {
        let mut next = self.clone();
        next.round += 1;
        next.raises = 0;
        next.acted = 0;
        next.actor = game.first_player(next.round);
        next
    }
    fn next_move(&self) -> Self {
        let mut next = self.clone();
        next.acted += 1;
        next.actor = (self.actor + 1) % self.folded.len();
        next
    }
    /// all live bets are equal
    fn settled(&self) -> bool {
        let mut live = self
            .folded
            .iter()
            .zip(self.commitment.iter())
            .filter(|(folded, _)| !**folded)
            .map(|(_, chips)| *chips);
        match live.next() {
            None => true,
            Some(first) => live.all(|chips| chips == first),
        }
    }
    fn all_acted(&self) -> bool {
        let folded = self.folded.iter().filter(|folded| **folded).count();
        self.acted >= self.folded.len() - folded
    }
    fn max_commitment(&self) -> Chips {
        self.commitment
            .iter()
            .copied()
            .max()
            .expect("at least one seat")
    }
}

/// generates the canonical tree for a game: one hole cards root
/// enumerating every unordered deal, then per round a board node
/// over the remaining deck and the limit betting sequences, down
/// to pot commitment terminals.
pub struct Builder<'a> {
    game: &'a Game,
    graph: DiGraph<Node, Edge>,
    decisions: Vec<NodeIndex>,
}

impl<'a> Builder<'a> {
    pub fn build(game: &'a Game) -> Result<Tree> {
        game.require_limit()?;
        let mut builder = Self {
            game,
            graph: DiGraph::new(),
            decisions: Vec::new(),
        };
        let root = builder.graph.add_node(Node::Holes {
            count: game.hole_cards(),
            path: String::new(),
        });
        let deck = game.deck().cards().to_vec();
        for combo in combos::combinations(&deck, game.hole_cards()) {
            let state = State::new(game, combos::without(&deck, &combo));
            let path = extend("", &Edge::Deal(combo.clone()));
            builder.board(root, Edge::Deal(combo), path, state);
        }
        Ok(Tree::new(builder.graph, root, builder.decisions))
    }

    fn board(&mut self, parent: NodeIndex, edge: Edge, path: String, state: State) {
        let count = self.game.board_cards(state.round);
        if count == 0 {
            self.action(parent, edge, path, state);
        } else {
            let node = self.graph.add_node(Node::Board {
                count,
                path: path.clone(),
            });
            self.graph.add_edge(parent, node, edge);
            let deck = state.deck.clone();
            for combo in combos::combinations(&deck, count) {
                let mut next = state.clone();
                next.deck = combos::without(&deck, &combo);
                let child = extend(&path, &Edge::Deal(combo.clone()));
                self.action(node, Edge::Deal(combo), child, next);
            }
        }
    }

    fn action(&mut self, parent: NodeIndex, edge: Edge, path: String, state: State) {
        if state.settled() && state.all_acted() {
            if state.round + 1 < self.game.rounds() {
                self.board(parent, edge, path, state.next_round(self.game));
            } else {
                let node = self.graph.add_node(Node::Terminal {
                    commitment: state.commitment.clone(),
                    path,
                });
                self.graph.add_edge(parent, node, edge);
            }
            return;
        }
        let index = self.decisions.len();
        let node = self.graph.add_node(Node::Decision {
            player: state.actor,
            index,
            path: path.clone(),
        });
        self.decisions.push(node);
        self.graph.add_edge(parent, node, edge);
        for action in self.legal(&state) {
            let mut next = state.next_move();
            match action {
                Action::Fold => next.folded[state.actor] = true,
                Action::Call => next.commitment[state.actor] = state.max_commitment(),
                Action::Raise => {
                    next.raises += 1;
                    next.commitment[state.actor] =
                        state.max_commitment() + self.game.raise_size(state.round);
                }
            }
            let child = extend(&path, &Edge::Choice(action));
            self.action(node, Edge::Choice(action), child, next);
        }
    }

    /// call is always available, fold only against an outstanding
    /// bet, raise until the round's cap
    fn legal(&self, state: &State) -> Vec<Action> {
        let mut actions = vec![Action::Call];
        if !state.settled() {
            actions.push(Action::Fold);
        }
        if state.raises < self.game.max_raises(state.round) {
            actions.push(Action::Raise);
        }
        actions
    }
}

/// card blocks are colon separated, actions concatenate directly
fn extend(path: &str, edge: &Edge) -> String {
    match edge {
        Edge::Deal(_) if !path.is_empty() && !path.ends_with(':') => {
            format!("{}:{}", path, edge)
        }
        _ => format!("{}{}", path, edge),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(tree: &Tree) -> Vec<String> {
        (0..tree.decision_count())
            .map(|i| tree.node(tree.decision(i)).path().to_string())
            .collect()
    }

    #[test]
    fn kuhn_shape() {
        let tree = Builder::build(&Game::kuhn()).unwrap();
        // per deal: p0 root, p1 after check, p0 facing the bet, p1 facing the bet
        assert_eq!(tree.decision_count(), 12);
        // 12 decisions, 15 terminals, 3 deals under one root
        assert_eq!(tree.size(), 28);
        assert!(paths(&tree).contains(&"0:".to_string()));
        assert!(paths(&tree).contains(&"1:cr".to_string()));
        assert!(paths(&tree).contains(&"2:r".to_string()));
    }

    #[test]
    fn leduc_shape() {
        let tree = Builder::build(&Game::leduc()).unwrap();
        // 6 deals x (6 round one decisions + 5 continuations x 5 boards x 6)
        assert_eq!(tree.decision_count(), 936);
        assert!(paths(&tree).contains(&"0:cc:1:".to_string()));
        assert!(paths(&tree).contains(&"5:crc:0:rr".to_string()));
    }

    #[test]
    fn terminal_commitments_follow_the_betting() {
        let game = Game::kuhn();
        let tree = Builder::build(&game).unwrap();
        let (_, first) = tree.children(tree.root())[0];
        let bet = tree.follow(first, Action::Raise).unwrap();
        let fold = tree.follow(bet, Action::Fold).unwrap();
        assert_eq!(tree.node(fold).commitment().unwrap(), &[2, 1]);
        assert_eq!(tree.node(fold).path(), "0:rf");
        let call = tree.follow(bet, Action::Call).unwrap();
        assert_eq!(tree.node(call).commitment().unwrap(), &[2, 2]);
    }

    #[test]
    fn builds_are_deterministic() {
        let once = Builder::build(&Game::leduc()).unwrap();
        let again = Builder::build(&Game::leduc()).unwrap();
        assert_eq!(once.size(), again.size());
        assert_eq!(paths(&once), paths(&again));
        for index in 0..once.decision_count() {
            assert_eq!(
                once.legal(once.decision(index)),
                again.legal(again.decision(index))
            );
        }
    }

    #[test]
    fn decision_paths_are_unique_infoset_keys() {
        let tree = Builder::build(&Game::leduc()).unwrap();
        let mut keys = paths(&tree);
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), tree.decision_count());
    }

    #[test]
    fn every_path_reaches_a_terminal() {
        fn depth(tree: &Tree, node: petgraph::graph::NodeIndex) -> usize {
            let children = tree.children(node);
            if children.is_empty() {
                assert!(tree.node(node).commitment().is_some());
                return 0;
            }
            1 + children
                .into_iter()
                .map(|(_, child)| depth(tree, child))
                .max()
                .expect("children is non-empty")
        }
        let tree = Builder::build(&Game::kuhn()).unwrap();
        assert!(depth(&tree, tree.root()) <= 6);
    }

    #[test]
    fn nolimit_games_are_rejected() {
        let text = "GAMEDEF\nnolimit\nnumPlayers = 2\nnumRounds = 1\nblind = 1 1\n\
                    raiseSize = 1\nfirstPlayer = 1\nmaxRaises = 1\nnumSuits = 1\n\
                    numRanks = 3\nnumHoleCards = 1\nnumBoardCards = 0\nEND GAMEDEF";
        let game = text.parse::<Game>().unwrap();
        assert!(Builder::build(&game).is_err());
    }
}
