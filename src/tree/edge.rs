use crate::cards::card::Card;
use crate::game::action::Action;
use std::fmt::Display;
use std::fmt::Formatter;

/// child key on a tree edge. chance nodes key their children by
/// the sorted cards dealt, decision nodes by the action taken.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Edge {
    Deal(Vec<Card>),
    Choice(Action),
}

impl Edge {
    pub fn cards(&self) -> Option<&[Card]> {
        match self {
            Edge::Deal(cards) => Some(cards),
            Edge::Choice(_) => None,
        }
    }
    pub fn action(&self) -> Option<Action> {
        match self {
            Edge::Deal(_) => None,
            Edge::Choice(action) => Some(*action),
        }
    }
}

impl Display for Edge {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            Edge::Deal(cards) => {
                for card in cards {
                    write!(f, "{}:", card)?;
                }
                Ok(())
            }
            Edge::Choice(action) => write!(f, "{}", action),
        }
    }
}
