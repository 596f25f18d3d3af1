use super::card::Card;
use super::rank::Rank;
use crate::HAND_SIZE;
use crate::JOKER_COPIES;
use crate::RANK_COPIES;
use rand::Rng;
use rand::seq::SliceRandom;

/// The fixed 20-card multiset for one table: six of each target rank plus
/// two jokers. Built fresh for every deal; never reused across rounds.
#[derive(Debug, Clone)]
pub struct Deck(Vec<Card>);

impl Deck {
    /// A random permutation of the full multiset, ordinals assigned 1..=20
    /// in composition order before shuffling.
    pub fn shuffled<R: Rng>(rng: &mut R) -> Self {
        let mut ordinal = 0u8;
        let mut cards = Rank::all()
            .into_iter()
            .flat_map(|rank| {
                let copies = if rank.is_wild() {
                    JOKER_COPIES
                } else {
                    RANK_COPIES
                };
                std::iter::repeat(rank).take(copies)
            })
            .map(|rank| {
                ordinal += 1;
                Card::new(rank, ordinal)
            })
            .collect::<Vec<Card>>();
        cards.shuffle(rng);
        Self(cards)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Contiguous `HAND_SIZE`-card slices in seating order, one per hand.
    /// None when the deck cannot cover every hand; the round must not start.
    pub fn deal(&self, hands: usize) -> Option<Vec<Vec<Card>>> {
        if hands * HAND_SIZE > self.0.len() {
            return None;
        }
        Some(
            self.0
                .chunks(HAND_SIZE)
                .take(hands)
                .map(|chunk| chunk.to_vec())
                .collect(),
        )
    }
}
