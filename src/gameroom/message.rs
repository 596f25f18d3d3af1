use super::error::GameError;
use super::participant::Participant;
use crate::ID;
use crate::cards::Card;
use crate::cards::Rank;
use serde::Deserialize;
use serde::Serialize;

/// Messages sent from client to server over WebSocket.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientMessage {
    /// Take a seat in the room under a nickname.
    JoinRoom { nickname: String },
    /// Begin the game with everyone currently seated.
    StartGame,
    /// Discard cards face down, announced only as rank tags. The tags are
    /// deliberately never checked against the real hand; lying is the game.
    FoldCards { cards: Vec<Rank> },
    /// Challenge the previous player's discard.
    CallBluff,
}

/// Messages sent from server to client over WebSocket.
/// Hands are only ever serialized toward their owner; every other event is
/// safe to broadcast to the whole room.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerMessage {
    /// Initial connection confirmation with the minted participant id.
    #[serde(rename_all = "camelCase")]
    Connected { user_id: String },
    /// Someone took a seat; full roster attached.
    ParticipantJoined { participants: Vec<Standing> },
    /// Someone left; full roster attached.
    ParticipantLeft { participants: Vec<Standing> },
    /// The game began. Cards are the recipient's own hand, nobody else's.
    #[serde(rename_all = "camelCase")]
    GameStarted {
        cards: Vec<Dealt>,
        current_turn: String,
        prev_turn: String,
        target_type: Rank,
    },
    /// Turn pointers moved.
    #[serde(rename_all = "camelCase")]
    UpdateTurn {
        current_turn: String,
        prev_turn: String,
    },
    /// One participant's flags changed.
    #[serde(rename_all = "camelCase")]
    UpdateParticipant {
        user_id: String,
        shots: u8,
        is_dead: bool,
        is_no_cards: bool,
    },
    /// A fresh round after a challenge. Cards are the recipient's own hand.
    #[serde(rename_all = "camelCase")]
    StartRound {
        cards: Vec<Dealt>,
        target_type: Rank,
    },
    /// Size of the last discard. Tags stay concealed from observers.
    #[serde(rename_all = "camelCase")]
    UpdateTableCards { cards_count: usize },
    /// Terminal. Broadcast exactly once per room.
    GameOver { winner: String },
    /// Structured refusal.
    Error { kind: String, message: String },
}

/// A card as dealt to its owner.
#[derive(Clone, Debug, Serialize)]
pub struct Dealt {
    pub id: String,
    #[serde(rename = "type")]
    pub rank: Rank,
}

impl From<&Card> for Dealt {
    fn from(card: &Card) -> Self {
        Self {
            id: card.id(),
            rank: card.rank(),
        }
    }
}

/// A participant's public standing, as carried in roster updates.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Standing {
    pub user_id: String,
    pub nickname: String,
    pub shots: u8,
    pub is_dead: bool,
    pub is_no_cards: bool,
}

impl From<&Participant> for Standing {
    fn from(p: &Participant) -> Self {
        Self {
            user_id: p.id.to_string(),
            nickname: p.nickname.clone(),
            shots: p.shots,
            is_dead: p.is_dead,
            is_no_cards: p.is_no_cards,
        }
    }
}

impl ServerMessage {
    pub fn connected(user: ID<Participant>) -> Self {
        Self::Connected {
            user_id: user.to_string(),
        }
    }
    pub fn joined(roster: &[Participant]) -> Self {
        Self::ParticipantJoined {
            participants: roster.iter().map(Standing::from).collect(),
        }
    }
    pub fn left(roster: &[Participant]) -> Self {
        Self::ParticipantLeft {
            participants: roster.iter().map(Standing::from).collect(),
        }
    }
    pub fn game_started(
        hand: &[Card],
        turn: ID<Participant>,
        prev: ID<Participant>,
        target: Rank,
    ) -> Self {
        Self::GameStarted {
            cards: hand.iter().map(Dealt::from).collect(),
            current_turn: turn.to_string(),
            prev_turn: prev.to_string(),
            target_type: target,
        }
    }
    pub fn update_turn(turn: ID<Participant>, prev: ID<Participant>) -> Self {
        Self::UpdateTurn {
            current_turn: turn.to_string(),
            prev_turn: prev.to_string(),
        }
    }
    pub fn update_participant(p: &Participant) -> Self {
        Self::UpdateParticipant {
            user_id: p.id.to_string(),
            shots: p.shots,
            is_dead: p.is_dead,
            is_no_cards: p.is_no_cards,
        }
    }
    pub fn start_round(hand: &[Card], target: Rank) -> Self {
        Self::StartRound {
            cards: hand.iter().map(Dealt::from).collect(),
            target_type: target,
        }
    }
    pub fn table_cards(count: usize) -> Self {
        Self::UpdateTableCards { cards_count: count }
    }
    pub fn game_over(winner: &str) -> Self {
        Self::GameOver {
            winner: winner.to_string(),
        }
    }
    pub fn error(e: &GameError) -> Self {
        Self::Error {
            kind: e.kind().to_string(),
            message: e.to_string(),
        }
    }
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("serialize server message")
    }
}
