use crate::Chips;
use crate::cards::card::Card;
use crate::cards::deck::Deck;
use crate::error::Error;
use crate::error::Result;
use std::fmt::Display;
use std::fmt::Formatter;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Betting {
    Limit,
    NoLimit,
}

/// immutable game definition. everything downstream of here,
/// from the tree builder to the estimators, consumes this record
/// and nothing else about the rules.
///
/// first players are stored zero based even though the gamedef
/// text format counts seats from one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Game {
    players: usize,
    rounds: usize,
    ranks: u8,
    suits: u8,
    hole_cards: usize,
    board_cards: Vec<usize>,
    blinds: Vec<Chips>,
    raise_sizes: Vec<Chips>,
    max_raises: Vec<usize>,
    first_players: Vec<usize>,
    betting: Betting,
}

impl Game {
    /// three card, one round, one raise Kuhn poker
    pub fn kuhn() -> Self {
        Self {
            players: 2,
            rounds: 1,
            ranks: 3,
            suits: 1,
            hole_cards: 1,
            board_cards: vec![0],
            blinds: vec![1, 1],
            raise_sizes: vec![1],
            max_raises: vec![1],
            first_players: vec![0],
            betting: Betting::Limit,
        }
    }

    /// six card, two round Leduc hold'em
    pub fn leduc() -> Self {
        Self {
            players: 2,
            rounds: 2,
            ranks: 3,
            suits: 2,
            hole_cards: 1,
            board_cards: vec![0, 1],
            blinds: vec![1, 1],
            raise_sizes: vec![2, 4],
            max_raises: vec![2, 2],
            first_players: vec![0, 0],
            betting: Betting::Limit,
        }
    }

    pub fn players(&self) -> usize {
        self.players
    }
    pub fn rounds(&self) -> usize {
        self.rounds
    }
    pub fn ranks(&self) -> u8 {
        self.ranks
    }
    pub fn suits(&self) -> u8 {
        self.suits
    }
    pub fn hole_cards(&self) -> usize {
        self.hole_cards
    }
    pub fn board_cards(&self, round: usize) -> usize {
        self.board_cards[round]
    }
    pub fn total_board_cards(&self, round: usize) -> usize {
        self.board_cards.iter().take(round + 1).sum()
    }
    pub fn blind(&self, player: usize) -> Chips {
        self.blinds[player]
    }
    pub fn big_blind(&self) -> Chips {
        self.blinds.iter().copied().max().expect("at least one seat")
    }
    pub fn raise_size(&self, round: usize) -> Chips {
        self.raise_sizes[round]
    }
    pub fn max_raises(&self, round: usize) -> usize {
        self.max_raises[round]
    }
    pub fn first_player(&self, round: usize) -> usize {
        self.first_players[round]
    }
    pub fn betting(&self) -> Betting {
        self.betting
    }
    pub fn deck(&self) -> Deck {
        Deck::new(self.ranks, self.suits)
    }
    /// largest deal any single player can see at showdown
    pub fn eval_card_count(&self) -> usize {
        self.hole_cards + self.board_cards.iter().sum::<usize>()
    }

    pub fn require_limit(&self) -> Result<()> {
        match self.betting {
            Betting::Limit => Ok(()),
            Betting::NoLimit => Err(Error::UnsupportedGame(
                "no-limit betting is not supported".to_string(),
            )),
        }
    }
    pub fn require_two_players(&self) -> Result<()> {
        match self.players {
            2 => Ok(()),
            n => Err(Error::UnsupportedGame(format!(
                "only two player games are supported, got {}",
                n
            ))),
        }
    }
    pub fn require_evaluable(&self) -> Result<()> {
        let cards = self.eval_card_count();
        if cards > crate::MAX_EVALUATED_CARDS {
            Err(Error::UnsupportedGame(format!(
                "hand evaluation covers at most {} cards, game deals {}",
                crate::MAX_EVALUATED_CARDS,
                cards
            )))
        } else {
            Ok(())
        }
    }
}

fn parse_fields<T: FromStr>(value: &str, key: &str) -> Result<Vec<T>> {
    value
        .split_whitespace()
        .map(|field| {
            field
                .parse::<T>()
                .map_err(|_| Error::UnsupportedGame(format!("unparseable {} field {}", key, field)))
        })
        .collect()
}

fn parse_field<T: FromStr>(value: &str, key: &str) -> Result<T> {
    parse_fields::<T>(value, key)?
        .pop()
        .ok_or_else(|| Error::UnsupportedGame(format!("empty {} field", key)))
}

fn spread<T: Clone>(mut values: Vec<T>, len: usize, key: &str) -> Result<Vec<T>> {
    match values.len() {
        1 => Ok(vec![values.remove(0); len]),
        n if n == len => Ok(values),
        n => Err(Error::UnsupportedGame(format!(
            "{} expects 1 or {} fields, got {}",
            key, len, n
        ))),
    }
}

/// the gamedef text format: `GAMEDEF`, one `key = fields` line per
/// property, `END GAMEDEF`. single valued per-round properties are
/// spread across all rounds.
impl FromStr for Game {
    type Err = Error;
    fn from_str(text: &str) -> Result<Self> {
        let mut betting = None;
        let mut players = None;
        let mut rounds = None;
        let mut ranks = None;
        let mut suits = None;
        let mut hole_cards = None;
        let mut board_cards = None;
        let mut blinds = None;
        let mut raise_sizes = None;
        let mut max_raises = None;
        let mut first_players = None;
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match line.to_lowercase().as_str() {
                "gamedef" | "end gamedef" => continue,
                "limit" => {
                    betting = Some(Betting::Limit);
                    continue;
                }
                "nolimit" | "no limit" => {
                    betting = Some(Betting::NoLimit);
                    continue;
                }
                _ => {}
            }
            let (key, value) = line
                .split_once('=')
                .ok_or_else(|| Error::UnsupportedGame(format!("unparseable gamedef line {}", line)))?;
            let value = value.trim();
            match key.trim().to_lowercase().as_str() {
                "numplayers" => players = Some(parse_field::<usize>(value, "numPlayers")?),
                "numrounds" => rounds = Some(parse_field::<usize>(value, "numRounds")?),
                "numranks" => ranks = Some(parse_field::<u8>(value, "numRanks")?),
                "numsuits" => suits = Some(parse_field::<u8>(value, "numSuits")?),
                "numholecards" => hole_cards = Some(parse_field::<usize>(value, "numHoleCards")?),
                "numboardcards" => board_cards = Some(parse_fields::<usize>(value, "numBoardCards")?),
                "blind" => blinds = Some(parse_fields::<Chips>(value, "blind")?),
                "raisesize" => raise_sizes = Some(parse_fields::<Chips>(value, "raiseSize")?),
                "maxraises" => max_raises = Some(parse_fields::<usize>(value, "maxRaises")?),
                "firstplayer" => first_players = Some(parse_fields::<usize>(value, "firstPlayer")?),
                "stack" => continue,
                key => {
                    return Err(Error::UnsupportedGame(format!(
                        "unknown gamedef property {}",
                        key
                    )));
                }
            }
        }
        let players =
            players.ok_or_else(|| Error::UnsupportedGame("missing numPlayers".to_string()))?;
        let rounds = rounds.ok_or_else(|| Error::UnsupportedGame("missing numRounds".to_string()))?;
        if players < 2 || rounds == 0 {
            return Err(Error::UnsupportedGame(
                "need at least two players and one round".to_string(),
            ));
        }
        let first_players = first_players.unwrap_or_else(|| vec![1]);
        if first_players.iter().any(|&p| p == 0 || p > players) {
            return Err(Error::UnsupportedGame(
                "firstPlayer seats are one based".to_string(),
            ));
        }
        Ok(Self {
            players,
            rounds,
            ranks: ranks.ok_or_else(|| Error::UnsupportedGame("missing numRanks".to_string()))?,
            suits: suits.ok_or_else(|| Error::UnsupportedGame("missing numSuits".to_string()))?,
            hole_cards: hole_cards
                .ok_or_else(|| Error::UnsupportedGame("missing numHoleCards".to_string()))?,
            board_cards: spread(board_cards.unwrap_or_else(|| vec![0]), rounds, "numBoardCards")?,
            blinds: spread(blinds.unwrap_or_else(|| vec![0]), players, "blind")?,
            raise_sizes: spread(
                raise_sizes.ok_or_else(|| Error::UnsupportedGame("missing raiseSize".to_string()))?,
                rounds,
                "raiseSize",
            )?,
            max_raises: spread(max_raises.unwrap_or_else(|| vec![1]), rounds, "maxRaises")?,
            first_players: spread(first_players, rounds, "firstPlayer")?
                .into_iter()
                .map(|p| p - 1)
                .collect(),
            betting: betting
                .ok_or_else(|| Error::UnsupportedGame("missing betting type".to_string()))?,
        })
    }
}

impl Display for Game {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let fields = |xs: &[usize]| {
            xs.iter()
                .map(|x| x.to_string())
                .collect::<Vec<_>>()
                .join(" ")
        };
        let chips = |xs: &[Chips]| {
            xs.iter()
                .map(|x| x.to_string())
                .collect::<Vec<_>>()
                .join(" ")
        };
        writeln!(f, "GAMEDEF")?;
        match self.betting {
            Betting::Limit => writeln!(f, "limit")?,
            Betting::NoLimit => writeln!(f, "nolimit")?,
        }
        writeln!(f, "numPlayers = {}", self.players)?;
        writeln!(f, "numRounds = {}", self.rounds)?;
        writeln!(f, "blind = {}", chips(&self.blinds))?;
        writeln!(f, "raiseSize = {}", chips(&self.raise_sizes))?;
        writeln!(
            f,
            "firstPlayer = {}",
            fields(
                &self
                    .first_players
                    .iter()
                    .map(|p| p + 1)
                    .collect::<Vec<_>>()
            )
        )?;
        writeln!(f, "maxRaises = {}", fields(&self.max_raises))?;
        writeln!(f, "numSuits = {}", self.suits)?;
        writeln!(f, "numRanks = {}", self.ranks)?;
        writeln!(f, "numHoleCards = {}", self.hole_cards)?;
        writeln!(f, "numBoardCards = {}", fields(&self.board_cards))?;
        write!(f, "END GAMEDEF")
    }
}

/// deal helpers shared by the walkers
impl Game {
    pub fn deck_cards(&self) -> Vec<Card> {
        self.deck().cards().to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toy_games() {
        let kuhn = Game::kuhn();
        assert_eq!(kuhn.deck().len(), 3);
        assert_eq!(kuhn.eval_card_count(), 1);
        assert_eq!(kuhn.big_blind(), 1);
        let leduc = Game::leduc();
        assert_eq!(leduc.deck().len(), 6);
        assert_eq!(leduc.eval_card_count(), 2);
        assert_eq!(leduc.total_board_cards(1), 1);
        assert!(leduc.require_two_players().is_ok());
        assert!(leduc.require_evaluable().is_ok());
        assert!(leduc.require_limit().is_ok());
    }

    #[test]
    fn gamedef_round_trip() {
        for game in [Game::kuhn(), Game::leduc()] {
            let text = game.to_string();
            assert_eq!(text.parse::<Game>().unwrap(), game);
        }
    }

    #[test]
    fn gamedef_parses_acpc_text() {
        let text = "GAMEDEF\n\
                    limit\n\
                    numPlayers = 2\n\
                    numRounds = 2\n\
                    blind = 1 1\n\
                    raiseSize = 2 4\n\
                    firstPlayer = 1\n\
                    maxRaises = 2\n\
                    numSuits = 2\n\
                    numRanks = 3\n\
                    numHoleCards = 1\n\
                    numBoardCards = 0 1\n\
                    END GAMEDEF";
        assert_eq!(text.parse::<Game>().unwrap(), Game::leduc());
    }

    #[test]
    fn gamedef_rejects_garbage() {
        assert!("GAMEDEF\nlimit\nnumPlayers = 2\nEND GAMEDEF".parse::<Game>().is_err());
        assert!("GAMEDEF\nwat = 1\nEND GAMEDEF".parse::<Game>().is_err());
    }

    #[test]
    fn nolimit_is_rejected_downstream() {
        let mut game = Game::kuhn();
        game.betting = Betting::NoLimit;
        assert!(game.require_limit().is_err());
    }
}
