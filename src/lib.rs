//! Room server for a liar's-deck style bluffing card game.
//!
//! Players connect to a room over a persistent WebSocket, take turns
//! discarding cards face down while claiming they match the round's target
//! rank, and challenge each other's claims. The loser of a challenge faces a
//! roulette draw whose odds shorten with every survived shot. Last player
//! standing wins.
//!
//! ## Architecture
//!
//! - [`cards`] — deck composition, shuffling, dealing, and the roulette draw
//! - [`gameroom`] — per-room state machine, wire protocol, connection table
//! - [`hosting`] — HTTP/WebSocket gateway and the room registry

pub mod cards;
pub mod gameroom;
pub mod hosting;

// ============================================================================
// TABLE PARAMETERS
// ============================================================================
/// Maximum open connections per room. Also bounds hands per deal.
pub const CAPACITY: usize = 4;
/// Cards dealt to each participant at the start of every round.
pub const HAND_SIZE: usize = 5;
/// Copies of each target rank in the deck.
pub const RANK_COPIES: usize = 6;
/// Jokers in the deck.
pub const JOKER_COPIES: usize = 2;
/// Total deck size: three target ranks plus the jokers.
pub const DECK_SIZE: usize = 3 * RANK_COPIES + JOKER_COPIES;
/// Shot count at which the roulette draw becomes a certainty.
pub const MAX_SHOTS: u8 = 5;

// ============================================================================
// IDENTITY TYPES
// ============================================================================
use std::fmt::Debug;
use std::fmt::Display;
use std::fmt::Formatter;
use std::hash::Hash;
use std::hash::Hasher;
use std::marker::PhantomData;

/// Generic ID wrapper providing compile-time type safety over uuid::Uuid.
/// Opaque to clients; minted at room creation and at connection time.
pub struct ID<T> {
    inner: uuid::Uuid,
    marker: PhantomData<T>,
}

impl<T> ID<T> {
    pub fn inner(&self) -> uuid::Uuid {
        self.inner
    }
}

impl<T> From<uuid::Uuid> for ID<T> {
    fn from(inner: uuid::Uuid) -> Self {
        Self {
            inner,
            marker: PhantomData,
        }
    }
}
impl<T> From<ID<T>> for uuid::Uuid {
    fn from(id: ID<T>) -> Self {
        id.inner()
    }
}

impl<T> Default for ID<T> {
    fn default() -> Self {
        Self::from(uuid::Uuid::now_v7())
    }
}

impl<T> Copy for ID<T> {}
impl<T> Clone for ID<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Eq for ID<T> {}
impl<T> PartialEq for ID<T> {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<T> Hash for ID<T> {
    fn hash<H>(&self, state: &mut H)
    where
        H: Hasher,
    {
        self.inner.hash(state)
    }
}

impl<T> Display for ID<T> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}
impl<T> Debug for ID<T> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

// ============================================================================
// RUNTIME UTILITIES
// ============================================================================
/// Initialize dual logging (terminal + file) with timestamped log files.
/// Creates `logs/` directory and writes DEBUG level to file, INFO to terminal.
pub fn log() {
    std::fs::create_dir_all("logs").expect("create logs directory");
    let config = simplelog::ConfigBuilder::new()
        .set_location_level(log::LevelFilter::Off)
        .set_target_level(log::LevelFilter::Off)
        .set_thread_level(log::LevelFilter::Off)
        .build();
    let time = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("time moves slow")
        .as_secs();
    let file = simplelog::WriteLogger::new(
        log::LevelFilter::Debug,
        config.clone(),
        std::fs::File::create(format!("logs/{}.log", time)).expect("create log file"),
    );
    let term = simplelog::TermLogger::new(
        log::LevelFilter::Info,
        config.clone(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );
    simplelog::CombinedLogger::init(vec![term, file]).expect("initialize logger");
}

/// Register Ctrl+C handler for immediate termination.
pub fn halt() {
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.expect("install ctrl-c handler");
        println!();
        log::warn!("interrupt received, exiting");
        std::process::exit(0);
    });
}
