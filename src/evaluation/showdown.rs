use super::strength::Strength;
use crate::Chips;
use crate::Utility;
use crate::cards::card::Card;
use crate::error::Result;

/// indices of the strongest live hands, ties included.
/// folded seats pass `None` and never contest the pot.
pub fn winners(hands: &[Option<Vec<Card>>], suits: u8) -> Result<Vec<usize>> {
    let mut scored = Vec::new();
    for (seat, hand) in hands.iter().enumerate() {
        if let Some(cards) = hand {
            scored.push((seat, Strength::score(cards, suits)?));
        }
    }
    let best = scored
        .iter()
        .map(|(_, strength)| strength)
        .max()
        .expect("at least one live hand")
        .clone();
    Ok(scored
        .into_iter()
        .filter(|(_, strength)| *strength == best)
        .map(|(seat, _)| seat)
        .collect())
}

/// per seat chips won or lost at a terminal. the last seat
/// standing takes the whole pot, otherwise the winners split it
/// evenly; everyone pays what they committed.
pub fn utility(
    holes: &[Vec<Card>],
    board: &[Card],
    folded: &[bool],
    commitment: &[Chips],
    suits: u8,
) -> Result<Vec<Utility>> {
    let pot = commitment.iter().map(|&chips| chips as Utility).sum::<Utility>();
    let live = folded.iter().filter(|&&f| !f).count();
    let winners = if live == 1 {
        vec![
            folded
                .iter()
                .position(|&f| !f)
                .expect("exactly one live seat"),
        ]
    } else {
        let hands = holes
            .iter()
            .zip(folded.iter())
            .map(|(hole, &folded)| {
                if folded {
                    None
                } else {
                    let mut cards = hole.clone();
                    cards.extend_from_slice(board);
                    Some(cards)
                }
            })
            .collect::<Vec<_>>();
        self::winners(&hands, suits)?
    };
    let share = pot / winners.len() as Utility;
    Ok(commitment
        .iter()
        .enumerate()
        .map(|(seat, &chips)| {
            let won = if winners.contains(&seat) { share } else { 0.0 };
            won - chips as Utility
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cards(ids: &[u8]) -> Vec<Card> {
        ids.iter().copied().map(Card::from).collect()
    }

    #[test]
    fn winners_ignore_folded_hands() {
        let hands = vec![Some(cards(&[51, 47, 43, 39, 35])), None];
        assert_eq!(winners(&hands, 4).unwrap(), vec![0]);
    }

    #[test]
    fn winners_on_leduc_hands() {
        let hands = |a: &[u8], b: &[u8]| vec![Some(cards(a)), Some(cards(b))];
        assert_eq!(winners(&hands(&[43, 22], &[51, 23]), 4).unwrap(), vec![1]);
        assert_eq!(winners(&hands(&[22, 23], &[51, 23]), 4).unwrap(), vec![0]);
        assert_eq!(winners(&hands(&[50, 23], &[51, 23]), 4).unwrap(), vec![0, 1]);
    }

    #[test]
    fn fold_awards_the_pot() {
        let u = utility(
            &[cards(&[51]), cards(&[47])],
            &[],
            &[true, false],
            &[1, 1],
            4,
        )
        .unwrap();
        assert_eq!(u, vec![-1.0, 1.0]);
    }

    #[test]
    fn uneven_commitments_settle_against_the_pot() {
        let u = utility(
            &[cards(&[51]), cards(&[47])],
            &[],
            &[false, false],
            &[5, 1],
            4,
        )
        .unwrap();
        assert_eq!(u, vec![1.0, -1.0]);
    }

    #[test]
    fn board_pairs_decide_showdowns() {
        let u = utility(
            &[cards(&[51]), cards(&[47])],
            &cards(&[46]),
            &[false, false],
            &[1, 1],
            4,
        )
        .unwrap();
        assert_eq!(u, vec![-1.0, 1.0]);
    }

    #[test]
    fn ties_split_evenly() {
        let u = utility(
            &[cards(&[50]), cards(&[51])],
            &cards(&[0]),
            &[false, false],
            &[2, 2],
            4,
        )
        .unwrap();
        assert_eq!(u, vec![0.0, 0.0]);
    }
}
