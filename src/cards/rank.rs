use rand::Rng;
use rand::seq::IndexedRandom;
use serde::Deserialize;
use serde::Serialize;

/// Card rank: the three target ranks plus the wild joker.
///
/// A round is played against a single target rank. Every discard is claimed
/// to consist of that rank; jokers count as any rank when a claim is
/// challenged, which is why they never become the target themselves.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rank {
    Queen,
    King,
    Ace,
    Joker,
}

impl Rank {
    /// All four ranks in deck-composition order.
    pub const fn all() -> [Rank; 4] {
        [Rank::Queen, Rank::King, Rank::Ace, Rank::Joker]
    }
    /// Ranks eligible to be a round's target. Jokers are excluded.
    pub const fn targets() -> [Rank; 3] {
        [Rank::Queen, Rank::King, Rank::Ace]
    }
    /// Jokers satisfy any claim.
    pub const fn is_wild(&self) -> bool {
        matches!(self, Rank::Joker)
    }
    /// Uniform choice among the target ranks.
    pub fn target<R: Rng>(rng: &mut R) -> Rank {
        *Self::targets().choose(rng).expect("targets are non-empty")
    }
    /// Whether a discarded tag satisfies a claim on `target`.
    pub fn satisfies(&self, target: Rank) -> bool {
        *self == target || self.is_wild()
    }
}

/// str isomorphism, matching the wire representation.
impl std::fmt::Display for Rank {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Rank::Queen => write!(f, "queen"),
            Rank::King => write!(f, "king"),
            Rank::Ace => write!(f, "ace"),
            Rank::Joker => write!(f, "joker"),
        }
    }
}
