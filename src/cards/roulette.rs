use crate::MAX_SHOTS;
use rand::Rng;

/// The elimination draw. Each survived shot removes one empty chamber, so a
/// participant with `shots` prior near-misses is eliminated with probability
/// `1 / (6 - shots)`. At `MAX_SHOTS` the draw is a certainty rather than a
/// division by zero.
pub struct Roulette;

impl Roulette {
    /// One pull of the trigger. True means eliminated.
    /// Compares a uniform sample in [0, 1) strictly below the chamber odds.
    pub fn pull<R: Rng>(rng: &mut R, shots: u8) -> bool {
        if shots >= MAX_SHOTS {
            return true;
        }
        rng.random::<f64>() < 1.0 / f64::from(6 - shots)
    }
}
