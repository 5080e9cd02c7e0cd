use crate::Utility;
use crate::cards::card::Card;
use crate::error::Error;
use crate::error::Result;
use crate::game::action::Action;
use crate::game::game::Game;

/// one fully parsed hand from a match log STATE line: who held
/// what, which boards fell per round, the betting, and the final
/// scores in seat order. hole cards a log withheld stay `None`
/// and surface as `MuckingUnsupported` in the consumers that
/// cannot live without them.
#[derive(Debug, Clone, PartialEq)]
pub struct HandState {
    pub hand: usize,
    pub holes: Vec<Option<Vec<Card>>>,
    pub boards: Vec<Vec<Card>>,
    pub actions: Vec<Vec<Action>>,
    pub folded: Vec<bool>,
    pub scores: Vec<Utility>,
    pub names: Vec<String>,
}

impl HandState {
    /// `STATE:<hand#>:<betting>:<cards>:<scores>:<names>` with
    /// rounds separated by `/`, seats by `|`, cards in two
    /// character rank-suit form.
    pub fn parse(game: &Game, line: &str) -> Result<Self> {
        let malformed = || Error::Io(std::io::Error::other(format!("malformed STATE line {}", line)));
        let fields = line.trim().split(':').collect::<Vec<_>>();
        let [tag, hand, betting, cards, scores, names] = fields.as_slice() else {
            return Err(malformed());
        };
        if *tag != "STATE" {
            return Err(malformed());
        }
        let hand = hand.parse::<usize>().map_err(|_| malformed())?;
        let actions = betting
            .split('/')
            .map(|round| round.chars().map(Action::from_code).collect::<Result<Vec<_>>>())
            .collect::<Result<Vec<_>>>()
            .map_err(|_| malformed())?;
        if actions.len() > game.rounds() {
            return Err(malformed());
        }
        let mut blocks = cards.split('/');
        let holes = blocks
            .next()
            .ok_or_else(malformed)?
            .split('|')
            .map(|seat| parse_cards(game, seat))
            .collect::<Result<Vec<_>>>()?;
        if holes.len() != game.players() {
            return Err(malformed());
        }
        // board blocks appear only for rounds that deal cards, but
        // every consumer indexes boards by round number
        let mut boards = Vec::new();
        for round in 0..game.rounds() {
            if game.board_cards(round) == 0 {
                boards.push(Vec::new());
            } else {
                match blocks.next() {
                    Some(block) => {
                        let cards = parse_cards(game, block)?.unwrap_or_default();
                        if !cards.is_empty() && cards.len() != game.board_cards(round) {
                            return Err(malformed());
                        }
                        boards.push(cards);
                    }
                    // the hand ended before this round was dealt
                    None => break,
                }
            }
        }
        let scores = scores
            .split('|')
            .map(|score| score.parse::<Utility>().map_err(|_| malformed()))
            .collect::<Result<Vec<_>>>()?;
        let names = names
            .split('|')
            .map(|name| name.trim().to_string())
            .collect::<Vec<_>>();
        if scores.len() != game.players() || names.len() != game.players() {
            return Err(malformed());
        }
        let folded = replay_folds(game, &actions);
        Ok(Self {
            hand,
            holes,
            boards,
            actions,
            folded,
            scores,
            names,
        })
    }

    /// all board cards revealed so far, flattened across rounds
    pub fn board(&self) -> Vec<Card> {
        self.boards.iter().flatten().copied().collect()
    }

    /// sorted hole cards of a seat, if the log revealed them
    pub fn hole(&self, seat: usize) -> Option<Vec<Card>> {
        self.holes[seat].as_ref().map(|cards| {
            let mut cards = cards.clone();
            cards.sort();
            cards
        })
    }
}

fn parse_cards(game: &Game, block: &str) -> Result<Option<Vec<Card>>> {
    if block.is_empty() {
        return Ok(None);
    }
    if block.len() % 2 != 0 {
        return Err(Error::Io(std::io::Error::other(format!(
            "odd card block {}",
            block
        ))));
    }
    let cards = (0..block.len() / 2)
        .map(|i| Card::from_text(&block[2 * i..2 * i + 2], game.suits()))
        .collect::<Result<Vec<_>>>()
        .map_err(|_| Error::Io(std::io::Error::other(format!("unparseable cards {}", block))))?;
    Ok(Some(cards))
}

/// replay the betting to learn who folded, using the same actor
/// rotation the tree builder uses
fn replay_folds(game: &Game, actions: &[Vec<Action>]) -> Vec<bool> {
    let mut folded = vec![false; game.players()];
    for (round, sequence) in actions.iter().enumerate() {
        let mut actor = game.first_player(round);
        for action in sequence {
            if *action == Action::Fold {
                folded[actor] = true;
            }
            actor = (actor + 1) % game.players();
        }
    }
    folded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_kuhn_hand() {
        let game = Game::kuhn();
        let state = HandState::parse(&game, "STATE:0:cc:2c|4c:-1|1:alice|bob").unwrap();
        assert_eq!(state.hand, 0);
        assert_eq!(state.actions, vec![vec![Action::Call, Action::Call]]);
        assert_eq!(state.hole(0), Some(vec![Card::from(0u8)]));
        assert_eq!(state.hole(1), Some(vec![Card::from(2u8)]));
        assert_eq!(state.folded, vec![false, false]);
        assert_eq!(state.scores, vec![-1.0, 1.0]);
        assert_eq!(state.names, vec!["alice", "bob"]);
    }

    #[test]
    fn parses_a_leduc_hand_with_board() {
        let game = Game::leduc();
        let state =
            HandState::parse(&game, "STATE:3:rc/crc:2c|3d/4c:9|-9:bob|alice").unwrap();
        assert_eq!(state.boards, vec![Vec::new(), vec![Card::from(4u8)]]);
        assert_eq!(state.board(), vec![Card::from(4u8)]);
        assert_eq!(state.actions[1].len(), 3);
        assert_eq!(state.folded, vec![false, false]);
    }

    #[test]
    fn folds_are_replayed_from_the_betting() {
        let game = Game::kuhn();
        let state = HandState::parse(&game, "STATE:1:rf:2c|4c:1|-1:alice|bob").unwrap();
        assert_eq!(state.folded, vec![false, true]);
    }

    #[test]
    fn mucked_holes_parse_to_none() {
        let game = Game::kuhn();
        let state = HandState::parse(&game, "STATE:2:rf:2c|:1|-1:alice|bob").unwrap();
        assert_eq!(state.hole(1), None);
    }

    #[test]
    fn rejects_malformed_lines() {
        let game = Game::kuhn();
        assert!(HandState::parse(&game, "STATE:0:cc:2c|4c:-1|1").is_err());
        assert!(HandState::parse(&game, "STATE:x:cc:2c|4c:-1|1:a|b").is_err());
        assert!(HandState::parse(&game, "STATE:0:cz:2c|4c:-1|1:a|b").is_err());
        assert!(HandState::parse(&game, "SCORE:0:cc:2c|4c:-1|1:a|b").is_err());
    }
}
