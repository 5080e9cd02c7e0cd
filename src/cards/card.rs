use crate::error::Error;
use crate::error::Result;
use std::fmt::Display;
use std::fmt::Formatter;

const RANK_CHARS: &str = "23456789TJQKA";
const SUIT_CHARS: &str = "cdhs";

/// a card is an index into the game's deck of rank x suit integers.
/// rank and suit are relative to the game's suit count, so a Card
/// only carries the index and the game supplies the rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Card(u8);

impl Card {
    pub fn rank(&self, suits: u8) -> u8 {
        self.0 / suits
    }
    pub fn suit(&self, suits: u8) -> u8 {
        self.0 % suits
    }
    /// two character rank-suit form used by match logs
    pub fn to_text(&self, suits: u8) -> String {
        let rank = RANK_CHARS
            .chars()
            .nth(self.rank(suits) as usize)
            .expect("rank within thirteen");
        let suit = SUIT_CHARS
            .chars()
            .nth(self.suit(suits) as usize)
            .expect("suit within four");
        format!("{}{}", rank, suit)
    }
    pub fn from_text(text: &str, suits: u8) -> Result<Self> {
        let mut chars = text.chars();
        let rank = chars.next();
        let suit = chars.next();
        match (rank, suit, chars.next()) {
            (Some(r), Some(s), None) => {
                let rank = RANK_CHARS
                    .find(r)
                    .ok_or_else(|| Error::InvalidStrategy(format!("unknown rank {}", r)))?;
                let suit = SUIT_CHARS
                    .find(s)
                    .ok_or_else(|| Error::InvalidStrategy(format!("unknown suit {}", s)))?;
                Ok(Self(rank as u8 * suits + suit as u8))
            }
            _ => Err(Error::InvalidStrategy(format!("unparseable card {}", text))),
        }
    }
}

// u8 isomorphism
impl From<u8> for Card {
    fn from(n: u8) -> Self {
        Self(n)
    }
}
impl From<Card> for u8 {
    fn from(c: Card) -> u8 {
        c.0
    }
}

// strategy files address cards by their bare index
impl Display for Card {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_and_suit_split() {
        let card = Card::from(51u8);
        assert_eq!(card.rank(4), 12);
        assert_eq!(card.suit(4), 3);
        let card = Card::from(5u8);
        assert_eq!(card.rank(2), 2);
        assert_eq!(card.suit(2), 1);
    }

    #[test]
    fn text_round_trip() {
        for n in 0..52u8 {
            let card = Card::from(n);
            let text = card.to_text(4);
            assert_eq!(Card::from_text(&text, 4).unwrap(), card);
        }
        assert_eq!(Card::from(51u8).to_text(4), "As");
        assert_eq!(Card::from(0u8).to_text(4), "2c");
    }

    #[test]
    fn reduced_deck_text() {
        // leduc uses three ranks and two suits
        assert_eq!(Card::from(5u8).to_text(2), "4d");
        assert_eq!(Card::from_text("2c", 2).unwrap(), Card::from(0u8));
    }
}
