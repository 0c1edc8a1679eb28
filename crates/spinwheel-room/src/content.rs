//! The two lists a wheel draws from.

use rand::Rng;
use rand::seq::IndexedRandom;

use crate::RoomError;

/// Validated, immutable item and penalty lists for one room.
///
/// Construction trims every entry and drops the blank ones. Both lists are
/// guaranteed non-empty afterwards, so a draw can never fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WheelContent {
    items: Vec<String>,
    penalties: Vec<String>,
}

impl WheelContent {
    /// # Errors
    /// [`RoomError::InvalidConfiguration`] if either list has no non-blank
    /// entry.
    pub fn new<I, P>(items: I, penalties: P) -> Result<Self, RoomError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
        P: IntoIterator,
        P::Item: AsRef<str>,
    {
        let items = clean(items);
        if items.is_empty() {
            return Err(RoomError::InvalidConfiguration(
                "at least one item is required".into(),
            ));
        }
        let penalties = clean(penalties);
        if penalties.is_empty() {
            return Err(RoomError::InvalidConfiguration(
                "at least one penalty is required".into(),
            ));
        }
        Ok(Self { items, penalties })
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn penalties(&self) -> &[String] {
        &self.penalties
    }

    /// Draws one item and one penalty, independently and with replacement.
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> (String, String) {
        (pick(&self.items, rng), pick(&self.penalties, rng))
    }
}

fn clean<T>(entries: T) -> Vec<String>
where
    T: IntoIterator,
    T::Item: AsRef<str>,
{
    entries
        .into_iter()
        .map(|entry| entry.as_ref().trim().to_string())
        .filter(|entry| !entry.is_empty())
        .collect()
}

fn pick<R: Rng + ?Sized>(entries: &[String], rng: &mut R) -> String {
    // Lists are non-empty by construction.
    entries.choose(rng).cloned().unwrap_or_default()
}
