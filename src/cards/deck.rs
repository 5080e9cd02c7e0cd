use super::card::Card;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;

/// the full deck for a game, ranks x suits cards in index order.
/// shuffling is always driven by a caller owned rng so that
/// training runs stay reproducible from their seed.
#[derive(Debug, Clone)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    pub fn new(ranks: u8, suits: u8) -> Self {
        Self {
            cards: (0..ranks * suits).map(Card::from).collect(),
        }
    }

    pub fn shuffle(&mut self, rng: &mut SmallRng) {
        self.cards.shuffle(rng);
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn full_deck() {
        assert_eq!(Deck::new(13, 4).len(), 52);
        assert_eq!(Deck::new(3, 2).len(), 6);
        assert_eq!(Deck::new(3, 1).cards()[2], Card::from(2u8));
    }

    #[test]
    fn seeded_shuffle_is_deterministic() {
        let mut a = Deck::new(13, 4);
        let mut b = Deck::new(13, 4);
        a.shuffle(&mut SmallRng::seed_from_u64(42));
        b.shuffle(&mut SmallRng::seed_from_u64(42));
        assert_eq!(a.cards(), b.cards());
    }
}
