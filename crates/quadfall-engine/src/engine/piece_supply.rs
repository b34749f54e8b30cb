use std::{collections::VecDeque, fmt::Write as _};

use rand::{
    Rng, SeedableRng as _,
    distr::{Distribution, StandardUniform},
    seq::SliceRandom,
};
use rand_pcg::Pcg32;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::PieceKind;

/// Supplies pieces using the 7-bag randomization algorithm.
///
/// # 7-Bag System
///
/// 1. A "bag" holds all 7 piece types (I, J, L, O, S, T, Z)
/// 2. The bag is shuffled
/// 3. Pieces are drawn in order from the queue
/// 4. A new shuffled bag is appended whenever 7 or fewer pieces remain
///
/// Every run of 7 draws starting at a bag boundary therefore contains each
/// type exactly once, and there is always at least one piece to
/// [`peek`](Self::peek) at.
///
/// # Example
///
/// ```
/// use quadfall_engine::PieceSupply;
///
/// let mut supply = PieceSupply::new();
///
/// let next = supply.peek();
/// assert_eq!(supply.pop_next(), next);
///
/// let upcoming: Vec<_> = supply.upcoming().take(5).collect();
/// assert_eq!(upcoming.len(), 5);
/// ```
#[derive(Debug, Clone)]
pub struct PieceSupply {
    rng: Pcg32,
    queue: VecDeque<PieceKind>,
}

impl Default for PieceSupply {
    fn default() -> Self {
        Self::new()
    }
}

/// Seed for deterministic piece generation.
///
/// A 128-bit seed for the piece supply's random number generator. The same
/// seed always produces the same piece sequence, which makes games
/// reproducible for tests and simulations.
///
/// Serialized as a 32-character hex string.
///
/// # Example
///
/// ```
/// use quadfall_engine::{PieceSeed, PieceSupply};
/// use rand::Rng as _;
///
/// let seed: PieceSeed = rand::rng().random();
///
/// let mut a = PieceSupply::with_seed(seed);
/// let mut b = PieceSupply::with_seed(seed);
/// assert_eq!(a.pop_next(), b.pop_next());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PieceSeed([u8; 16]);

impl PieceSeed {
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Builds a seed from a number, for short seeds typed on a command line.
    #[must_use]
    pub const fn from_u128(num: u128) -> Self {
        Self(num.to_be_bytes())
    }

    #[must_use]
    pub const fn as_u128(self) -> u128 {
        u128::from_be_bytes(self.0)
    }
}

impl Serialize for PieceSeed {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut hex_str = String::with_capacity(2 * self.0.len());
        write!(&mut hex_str, "{:032x}", self.as_u128()).map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&hex_str)
    }
}

impl<'de> Deserialize<'de> for PieceSeed {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let hex_str = String::deserialize(deserializer)?;
        if hex_str.len() != 32 {
            return Err(serde::de::Error::custom(format!(
                "invalid hex: expected 32 characters, got {}",
                hex_str.len()
            )));
        }
        let num = u128::from_str_radix(&hex_str, 16)
            .map_err(|e| serde::de::Error::custom(format!("invalid hex: {hex_str} ({e})")))?;
        Ok(Self::from_u128(num))
    }
}

/// Allows generating random `PieceSeed` values with `rng.random()`.
impl Distribution<PieceSeed> for StandardUniform {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> PieceSeed {
        let mut seed = [0; 16];
        rng.fill(&mut seed);
        PieceSeed(seed)
    }
}

impl PieceSupply {
    /// Creates a new piece supply with a random seed.
    ///
    /// For deterministic piece generation, use [`Self::with_seed`] instead.
    #[must_use]
    pub fn new() -> Self {
        Self::with_seed(rand::rng().random())
    }

    /// Like [`Self::new`], but with a specific seed for deterministic piece generation.
    #[must_use]
    pub fn with_seed(seed: PieceSeed) -> Self {
        let rng = Pcg32::from_seed(seed.0);
        let queue = VecDeque::with_capacity(PieceKind::LEN * 3);
        let mut this = Self { rng, queue };
        this.fill_queue();
        this
    }

    /// Appends shuffled bags while 7 or fewer pieces remain.
    ///
    /// Starting from an empty queue this appends two bags.
    fn fill_queue(&mut self) {
        while self.queue.len() <= PieceKind::LEN {
            let mut bag = PieceKind::ALL;
            bag.shuffle(&mut self.rng);
            self.queue.extend(bag);
        }
    }

    /// Removes and returns the next piece.
    ///
    /// # Panics
    ///
    /// Panics if the queue is empty (should never happen with the refill logic).
    pub fn pop_next(&mut self) -> PieceKind {
        let piece = self
            .queue
            .pop_front()
            .expect("Piece queue should never be empty");
        self.fill_queue();
        piece
    }

    /// Returns the next piece without removing it.
    #[must_use]
    pub fn peek(&self) -> PieceKind {
        self.queue[0]
    }

    /// Returns an iterator over the queued pieces, next piece first.
    ///
    /// The iterator always yields more than 7 pieces.
    pub fn upcoming(&self) -> impl Iterator<Item = PieceKind> + '_ {
        self.queue.iter().copied()
    }

    /// Discards the queue and starts over from two fresh bags.
    ///
    /// The random number generator keeps running; it is not reseeded.
    pub fn reset(&mut self) {
        self.queue.clear();
        self.fill_queue();
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn seed_from_bytes(bytes: [u8; 16]) -> PieceSeed {
        PieceSeed(bytes)
    }

    fn count_draws(supply: &mut PieceSupply, n: usize) -> HashMap<PieceKind, usize> {
        let mut counts = HashMap::new();
        for _ in 0..n {
            *counts.entry(supply.pop_next()).or_default() += 1;
        }
        counts
    }

    #[test]
    fn test_new_supply_holds_two_bags() {
        let supply = PieceSupply::new();
        assert_eq!(supply.upcoming().count(), 2 * PieceKind::LEN);
    }

    #[test]
    fn test_every_bag_is_a_permutation() {
        let mut supply = PieceSupply::with_seed(seed_from_bytes([7; 16]));
        for _ in 0..20 {
            let counts = count_draws(&mut supply, PieceKind::LEN);
            assert_eq!(counts.len(), PieceKind::LEN);
            assert!(counts.values().all(|&c| c == 1));
        }
    }

    #[test]
    fn test_peek_matches_pop() {
        let mut supply = PieceSupply::new();
        for _ in 0..50 {
            let peeked = supply.peek();
            assert_eq!(supply.pop_next(), peeked);
            assert!(supply.upcoming().count() > PieceKind::LEN);
        }
    }

    #[test]
    fn test_reset_starts_from_a_bag_boundary() {
        let mut supply = PieceSupply::with_seed(seed_from_bytes([3; 16]));
        for _ in 0..3 {
            supply.pop_next();
        }
        supply.reset();
        assert_eq!(supply.upcoming().count(), 2 * PieceKind::LEN);
        let counts = count_draws(&mut supply, PieceKind::LEN);
        assert!(counts.values().all(|&c| c == 1));
    }

    #[test]
    fn test_deterministic_piece_generation() {
        let seed = seed_from_bytes([
            0x12, 0x34, 0x56, 0x78, 0x9A, 0xBC, 0xDE, 0xF0, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66,
            0x77, 0x88,
        ]);

        let mut supply1 = PieceSupply::with_seed(seed);
        let mut supply2 = PieceSupply::with_seed(seed);

        for _ in 0..30 {
            assert_eq!(supply1.pop_next(), supply2.pop_next());
        }
    }

    mod piece_seed_serialization {
        use super::*;

        #[test]
        fn test_known_value_sequential_bytes() {
            let seed = seed_from_bytes([
                0x01, 0x23, 0x45, 0x67, 0x89, 0xAB, 0xCD, 0xEF, 0xFE, 0xDC, 0xBA, 0x98, 0x76, 0x54,
                0x32, 0x10,
            ]);
            let serialized = serde_json::to_string(&seed).unwrap();
            assert_eq!(serialized, "\"0123456789abcdeffedcba9876543210\"");

            let deserialized: PieceSeed = serde_json::from_str(&serialized).unwrap();
            assert_eq!(deserialized, seed);
        }

        #[test]
        fn test_from_u128_is_big_endian() {
            let seed = PieceSeed::from_u128(42);
            assert_eq!(
                serde_json::to_string(&seed).unwrap(),
                "\"0000000000000000000000000000002a\""
            );
            assert_eq!(seed.as_u128(), 42);
        }

        #[test]
        fn test_rejects_wrong_length_and_non_hex() {
            for json in [
                "\"\"",
                "\"0123456789abcdef0123456789abcde\"",
                "\"ghijklmnopqrstuvwxyzghijklmnopqr\"",
            ] {
                let err = serde_json::from_str::<PieceSeed>(json).unwrap_err();
                assert!(err.to_string().contains("invalid hex"), "{json}: {err}");
            }
        }
    }
}
