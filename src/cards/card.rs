use super::rank::Rank;
use std::fmt::Display;
use std::fmt::Formatter;

/// A dealt card: a rank plus an ordinal unique within one shuffle.
///
/// Cards are transient. They exist from deal to discard and are never tracked
/// afterwards; the ordinal only serves to give clients a stable id for the
/// lifetime of a hand.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct Card {
    rank: Rank,
    ordinal: u8,
}

impl Card {
    pub fn new(rank: Rank, ordinal: u8) -> Self {
        Self { rank, ordinal }
    }
    pub fn rank(&self) -> Rank {
        self.rank
    }
    /// Wire id, e.g. `queen-7`.
    pub fn id(&self) -> String {
        self.to_string()
    }
}

impl Display for Card {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}-{}", self.rank, self.ordinal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_combines_rank_and_ordinal() {
        assert_eq!(Card::new(Rank::Queen, 7).id(), "queen-7");
        assert_eq!(Card::new(Rank::Joker, 20).id(), "joker-20");
    }
}
