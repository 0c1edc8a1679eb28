//! Room code generation.

use rand::Rng;
use spinwheel_protocol::RoomCode;

use crate::{RoomConfig, RoomError};

/// Produces fixed-length, all-digit room codes.
///
/// Stateless apart from its settings. Uniqueness is checked against a
/// caller-supplied predicate; the registry calls [`generate`](Self::generate)
/// while holding its lock and inserts the room in the same critical section,
/// so two concurrent creations cannot end up with the same code.
#[derive(Debug, Clone, Copy)]
pub struct RoomCodeGenerator {
    length: usize,
    max_attempts: u32,
}

impl RoomCodeGenerator {
    pub fn new(length: usize, max_attempts: u32) -> Self {
        Self {
            length,
            max_attempts,
        }
    }

    pub fn from_config(config: &RoomConfig) -> Self {
        Self::new(config.code_length, config.max_code_attempts)
    }

    /// Draws one candidate code, each digit uniform over `0..=9`.
    pub fn candidate<R: Rng + ?Sized>(&self, rng: &mut R) -> RoomCode {
        let code: String = (0..self.length)
            .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
            .collect();
        RoomCode::from(code)
    }

    /// Draws candidates until one is not taken.
    ///
    /// # Errors
    /// [`RoomError::CodeSpaceExhausted`] after `max_attempts` collisions.
    pub fn generate<R, F>(&self, rng: &mut R, is_taken: F) -> Result<RoomCode, RoomError>
    where
        R: Rng + ?Sized,
        F: Fn(&RoomCode) -> bool,
    {
        for _ in 0..self.max_attempts {
            let code = self.candidate(rng);
            if !is_taken(&code) {
                return Ok(code);
            }
        }
        tracing::warn!(
            attempts = self.max_attempts,
            length = self.length,
            "room code space exhausted"
        );
        Err(RoomError::CodeSpaceExhausted)
    }
}

impl Default for RoomCodeGenerator {
    fn default() -> Self {
        Self::from_config(&RoomConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn test_candidate_is_six_digits() {
        let generator = RoomCodeGenerator::default();
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..500 {
            let code = generator.candidate(&mut rng);
            assert_eq!(code.as_str().len(), 6);
            assert!(code.as_str().chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_candidates_cover_every_digit() {
        let generator = RoomCodeGenerator::new(1, 1);
        let mut rng = StdRng::seed_from_u64(2);
        let seen: HashSet<String> = (0..500)
            .map(|_| generator.candidate(&mut rng).to_string())
            .collect();
        assert_eq!(seen.len(), 10);
    }

    #[test]
    fn test_generate_skips_taken_codes() {
        let generator = RoomCodeGenerator::new(1, 1_000);
        let mut rng = StdRng::seed_from_u64(3);
        // Everything but "7" is taken.
        let code = generator
            .generate(&mut rng, |code| code.as_str() != "7")
            .unwrap();
        assert_eq!(code.as_str(), "7");
    }

    #[test]
    fn test_generate_gives_up_when_everything_is_taken() {
        let generator = RoomCodeGenerator::new(1, 50);
        let mut rng = StdRng::seed_from_u64(4);
        let result = generator.generate(&mut rng, |_| true);
        assert_eq!(result, Err(RoomError::CodeSpaceExhausted));
    }
}
