use super::samples::Samples;
use super::state::HandState;
use crate::Utility;
use crate::error::Error;
use crate::error::Result;
use crate::game::game::Game;
use crate::tree::node::Node;
use crate::tree::tree::Tree;
use std::collections::HashMap;
use std::path::Path;

/// a whole match: every parsed STATE line plus the closing SCORE
/// line's totals, when the log carried one.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchLog {
    pub hands: Vec<HandState>,
    pub score: Option<(Vec<Utility>, Vec<String>)>,
}

impl MatchLog {
    pub fn read(game: &Game, path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(game, &text)
    }

    pub fn parse(game: &Game, text: &str) -> Result<Self> {
        let mut hands = Vec::new();
        let mut score = None;
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if line.starts_with("STATE") {
                hands.push(HandState::parse(game, line)?);
            } else if line.starts_with("SCORE") {
                score = Some(parse_score(line)?);
                break;
            }
        }
        Ok(Self { hands, score })
    }

    /// per hand utilities with one column per player, columns
    /// ordered by the SCORE line's roster. seats rotate between
    /// hands, the names on each STATE line say who sat where.
    pub fn utility_table(&self) -> Result<(Vec<Vec<Utility>>, Vec<String>)> {
        let (_, names) = self
            .score
            .as_ref()
            .ok_or_else(|| Error::Io(std::io::Error::other("log has no SCORE line")))?;
        let mut table = vec![vec![0.0; names.len()]; self.hands.len()];
        for hand in &self.hands {
            let row = table.get_mut(hand.hand).ok_or_else(|| {
                Error::Io(std::io::Error::other(format!(
                    "hand number {} out of range",
                    hand.hand
                )))
            })?;
            for (seat, name) in hand.names.iter().enumerate() {
                let column = names.iter().position(|known| known == name).ok_or_else(|| {
                    Error::Io(std::io::Error::other(format!("unknown player {}", name)))
                })?;
                row[column] = hand.scores[seat];
            }
        }
        Ok((table, names.clone()))
    }
}

fn parse_score(line: &str) -> Result<(Vec<Utility>, Vec<String>)> {
    let malformed = || Error::Io(std::io::Error::other(format!("malformed SCORE line {}", line)));
    let fields = line.split(':').collect::<Vec<_>>();
    let [_, scores, names] = fields.as_slice() else {
        return Err(malformed());
    };
    let scores = scores
        .split('|')
        .map(|score| score.parse::<Utility>().map_err(|_| malformed()))
        .collect::<Result<Vec<_>>>()?;
    let names = names
        .split('|')
        .map(|name| name.trim().to_string())
        .collect::<Vec<_>>();
    if scores.len() != names.len() {
        return Err(malformed());
    }
    Ok((scores, names))
}

/// walk every seat's view of the canonical tree through each
/// logged hand and count which action each player took at each of
/// their infosets. the result feeds the data biased response.
pub fn sample(game: &Game, tree: &Tree, log: &MatchLog) -> Result<HashMap<String, Samples>> {
    let mut players: HashMap<String, Samples> = HashMap::new();
    for hand in &log.hands {
        for name in &hand.names {
            players
                .entry(name.clone())
                .or_insert_with(|| Samples::new(tree.decision_count()));
        }
        record(game, tree, hand, &mut players)?;
    }
    Ok(players)
}

fn record(
    game: &Game,
    tree: &Tree,
    hand: &HandState,
    players: &mut HashMap<String, Samples>,
) -> Result<()> {
    let unknown = |what: &str| {
        Error::Io(std::io::Error::other(format!(
            "hand {} does not fit the game tree: {}",
            hand.hand, what
        )))
    };
    let mut cursors = vec![tree.root(); game.players()];
    let mut round = 0;
    let mut action_index = 0;
    loop {
        match tree.node(cursors[0]) {
            Node::Terminal { .. } => return Ok(()),
            Node::Holes { .. } => {
                for seat in 0..game.players() {
                    let holes = hand.hole(seat).ok_or(Error::MuckingUnsupported)?;
                    cursors[seat] = tree
                        .deal(cursors[seat], &holes)
                        .ok_or_else(|| unknown("hole cards"))?;
                }
            }
            Node::Board { .. } => {
                let mut cards = hand
                    .boards
                    .get(round)
                    .cloned()
                    .ok_or_else(|| unknown("missing board"))?;
                cards.sort();
                for cursor in cursors.iter_mut() {
                    *cursor = tree
                        .deal(*cursor, &cards)
                        .ok_or_else(|| unknown("board cards"))?;
                }
            }
            Node::Decision { player, .. } => {
                let player = *player;
                let action = *hand
                    .actions
                    .get(round)
                    .and_then(|sequence| sequence.get(action_index))
                    .ok_or_else(|| unknown("betting ended early"))?;
                let index = tree
                    .node(cursors[player])
                    .index()
                    .expect("decision carries an index");
                players
                    .get_mut(&hand.names[player])
                    .expect("seeded above")
                    .record(index, action);
                for cursor in cursors.iter_mut() {
                    *cursor = tree
                        .follow(*cursor, action)
                        .ok_or_else(|| unknown("illegal action"))?;
                }
                action_index += 1;
                if action_index >= hand.actions[round].len() {
                    round += 1;
                    action_index = 0;
                }
            }
        }
    }
}
