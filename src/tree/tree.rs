use super::edge::Edge;
use super::node::Node;
use crate::cards::card::Card;
use crate::game::action::Action;
use petgraph::Direction;
use petgraph::graph::DiGraph;
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;

/// the canonical extensive form tree, built once per game and
/// shared read-only by every algorithm. the graph shape never
/// changes after construction; all mutable training state lives
/// in flat arrays addressed by each decision node's dense index.
pub struct Tree {
    graph: DiGraph<Node, Edge>,
    root: NodeIndex,
    decisions: Vec<NodeIndex>,
}

impl Tree {
    pub(crate) fn new(graph: DiGraph<Node, Edge>, root: NodeIndex, decisions: Vec<NodeIndex>) -> Self {
        Self {
            graph,
            root,
            decisions,
        }
    }

    pub fn root(&self) -> NodeIndex {
        self.root
    }
    pub fn node(&self, index: NodeIndex) -> &Node {
        self.graph
            .node_weight(index)
            .expect("indices originate from this tree")
    }
    pub fn size(&self) -> usize {
        self.graph.node_count()
    }
    pub fn decision_count(&self) -> usize {
        self.decisions.len()
    }
    /// the decision node carrying this dense index
    pub fn decision(&self, index: usize) -> NodeIndex {
        self.decisions[index]
    }

    /// children in insertion order. petgraph iterates outgoing
    /// edges most recent first, so we reverse.
    pub fn children(&self, index: NodeIndex) -> Vec<(&Edge, NodeIndex)> {
        let mut children = self
            .graph
            .edges(index)
            .map(|edge| (edge.weight(), edge.target()))
            .collect::<Vec<_>>();
        children.reverse();
        children
    }

    pub fn parent(&self, index: NodeIndex) -> Option<NodeIndex> {
        self.graph
            .edges_directed(index, Direction::Incoming)
            .next()
            .map(|edge| edge.source())
    }

    /// follow an action edge out of a decision node
    pub fn follow(&self, index: NodeIndex, action: Action) -> Option<NodeIndex> {
        self.graph
            .edges(index)
            .find(|edge| edge.weight().action() == Some(action))
            .map(|edge| edge.target())
    }

    /// follow a chance edge by its sorted dealt cards
    pub fn deal(&self, index: NodeIndex, cards: &[Card]) -> Option<NodeIndex> {
        self.graph
            .edges(index)
            .find(|edge| edge.weight().cards() == Some(cards))
            .map(|edge| edge.target())
    }

    /// legal actions at a decision node, in child insertion order
    pub fn legal(&self, index: NodeIndex) -> Vec<Action> {
        self.children(index)
            .iter()
            .filter_map(|(edge, _)| edge.action())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::game::game::Game;
    use crate::tree::builder::Builder;

    #[test]
    fn children_are_insertion_ordered() {
        let tree = Builder::build(&Game::kuhn()).unwrap();
        let holes = tree.children(tree.root());
        assert_eq!(holes.len(), 3);
        // first decision of the hand: bets settled, so call then raise
        let (_, first) = holes[0];
        let legal = tree.legal(first);
        assert_eq!(
            legal,
            vec![crate::game::action::Action::Call, crate::game::action::Action::Raise]
        );
    }

    #[test]
    fn parents_link_back() {
        let tree = Builder::build(&Game::kuhn()).unwrap();
        assert_eq!(tree.parent(tree.root()), None);
        let (_, child) = tree.children(tree.root())[0];
        assert_eq!(tree.parent(child), Some(tree.root()));
    }
}
