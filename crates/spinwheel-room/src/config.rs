//! Registry configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Settings shared by every room in a registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Number of decimal digits in a room code.
    pub code_length: usize,

    /// How long an empty room is kept before it is deleted. A join within
    /// this window cancels the deletion.
    pub expiration_delay: Duration,

    /// Random candidates tried before code generation gives up.
    pub max_code_attempts: u32,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            code_length: 6,
            expiration_delay: Duration::from_secs(20 * 60),
            max_code_attempts: 10_000,
        }
    }
}

impl RoomConfig {
    /// Default config with a different expiration delay.
    pub fn with_expiration_delay(expiration_delay: Duration) -> Self {
        Self {
            expiration_delay,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_config_default() {
        let config = RoomConfig::default();
        assert_eq!(config.code_length, 6);
        assert_eq!(config.expiration_delay, Duration::from_secs(1200));
        assert!(config.max_code_attempts > 0);
    }

    #[test]
    fn test_with_expiration_delay_keeps_other_defaults() {
        let config = RoomConfig::with_expiration_delay(Duration::from_secs(5));
        assert_eq!(config.expiration_delay, Duration::from_secs(5));
        assert_eq!(config.code_length, 6);
    }
}
