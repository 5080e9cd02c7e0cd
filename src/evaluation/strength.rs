use crate::cards::card::Card;
use crate::error::Error;
use crate::error::Result;

/// comparable score of a one to five card hand.
///
/// the category is the descending multiset of rank counts, with
/// straights, flushes and straight flushes substituted in so that
/// plain lexicographic comparison orders every category correctly:
/// high card (1,..) < pair (2,1,..) < two pair (2,2,1) < trips
/// (3,1,1) < straight (3,1,1,1) < flush (3,1,1,2) < full house
/// (3,2) < quads (4,1) < straight flush (5).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Strength {
    category: Vec<i32>,
    ranks: Vec<i32>,
}

impl Strength {
    /// score a hand. ranks are counted, sorted by (count, rank)
    /// descending, and five distinct ranks trigger the straight
    /// and flush checks, with the ace playing low in the wheel.
    pub fn score(cards: &[Card], suits: u8) -> Result<Self> {
        if cards.len() > crate::MAX_EVALUATED_CARDS {
            return Err(Error::UnsupportedGame(format!(
                "cannot score {} cards",
                cards.len()
            )));
        }
        let mut counts = std::collections::BTreeMap::new();
        for card in cards {
            *counts.entry(card.rank(suits) as i32).or_insert(0i32) += 1;
        }
        let mut pairs = counts
            .into_iter()
            .map(|(rank, count)| (count, rank))
            .collect::<Vec<_>>();
        pairs.sort();
        pairs.reverse();
        let category = pairs.iter().map(|(count, _)| *count).collect::<Vec<_>>();
        let mut ranks = pairs.iter().map(|(_, rank)| *rank).collect::<Vec<_>>();
        if category.len() == 5 {
            if ranks[0] == 12 && ranks[1] == 3 {
                ranks = vec![3, 2, 1, 0, -1];
            }
            let straight = ranks[0] - ranks[4] == 4;
            let flush = {
                let suit = cards[0].suit(suits);
                cards.iter().all(|card| card.suit(suits) == suit)
            };
            let category = match (flush, straight) {
                (false, false) => vec![1],
                (false, true) => vec![3, 1, 1, 1],
                (true, false) => vec![3, 1, 1, 2],
                (true, true) => vec![5],
            };
            return Ok(Self { category, ranks });
        }
        Ok(Self { category, ranks })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(ids: &[u8]) -> Strength {
        let cards = ids.iter().copied().map(Card::from).collect::<Vec<_>>();
        Strength::score(&cards, 4).unwrap()
    }

    #[test]
    fn leduc_higher_card() {
        assert!(score(&[51, 23]) > score(&[43, 22]));
    }

    #[test]
    fn pair_beats_high_card() {
        assert!(score(&[22, 23]) > score(&[51, 23]));
    }

    #[test]
    fn equal_ranks_tie() {
        assert_eq!(score(&[50, 23]), score(&[51, 23]));
    }

    #[test]
    fn straight_flush_and_friends() {
        let royal = score(&[51, 47, 43, 39, 35]);
        let quads = score(&[48, 49, 50, 51, 0]);
        let house = score(&[48, 49, 50, 44, 45]);
        let flush = score(&[51, 47, 43, 39, 31]);
        let straight = score(&[51, 46, 43, 39, 35]);
        let trips = score(&[48, 49, 50, 44, 0]);
        assert!(royal > quads);
        assert!(quads > house);
        assert!(house > flush);
        assert!(flush > straight);
        assert!(straight > trips);
    }

    #[test]
    fn wheel_plays_the_ace_low() {
        // A2345 is a straight but the five is high
        let wheel = score(&[48, 1, 6, 11, 12]);
        let six_high = score(&[1, 6, 11, 12, 17]);
        let not_straight = score(&[48, 1, 6, 11, 16]);
        assert!(six_high > wheel);
        assert!(wheel > not_straight);
    }

    #[test]
    fn too_many_cards() {
        let cards = (0..6u8).map(Card::from).collect::<Vec<_>>();
        assert!(Strength::score(&cards, 4).is_err());
    }
}
