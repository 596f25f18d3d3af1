use crate::HAND_SIZE;
use crate::ID;

/// A seated player identity within one room.
///
/// Owned by its room and mutated only at the room's serialization point.
/// Join order is turn order; removal on disconnect keeps the order of the
/// remainder intact.
#[derive(Debug, Clone)]
pub struct Participant {
    pub id: ID<Participant>,
    pub nickname: String,
    pub shots: u8,
    pub is_dead: bool,
    pub is_no_cards: bool,
    pub cards_left: usize,
}

impl Participant {
    pub fn new(id: ID<Participant>, nickname: String) -> Self {
        Self {
            id,
            nickname,
            shots: 0,
            is_dead: false,
            is_no_cards: false,
            cards_left: 0,
        }
    }
    /// Eligible for turn rotation: neither eliminated nor out of cards.
    pub fn is_live(&self) -> bool {
        !self.is_dead && !self.is_no_cards
    }
    /// A fresh hand arrived.
    pub fn redeal(&mut self) {
        self.cards_left = HAND_SIZE;
        self.is_no_cards = false;
    }
}

/// Next live participant strictly after `after` in join order, wrapping
/// around. Lands back on `after` only if nobody else is eligible.
pub fn next_live(roster: &[Participant], after: ID<Participant>) -> Option<ID<Participant>> {
    let pos = roster.iter().position(|p| p.id == after)?;
    next_live_at(roster, pos + 1)
}

/// Next live participant scanning from index `start` (mod len), inclusive.
/// Used when the reference participant has already been removed.
pub fn next_live_at(roster: &[Participant], start: usize) -> Option<ID<Participant>> {
    if roster.is_empty() {
        return None;
    }
    (0..roster.len())
        .map(|k| (start + k) % roster.len())
        .map(|i| &roster[i])
        .find(|p| p.is_live())
        .map(|p| p.id)
}
