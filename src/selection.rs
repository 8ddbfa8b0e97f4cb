use crate::availability::{format_number, Availability};
use rand::seq::index;
use rand::Rng;
use std::collections::HashSet;
use tracing::debug;

/// Result of a manual toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Added,
    Removed,
    /// Selection already held `quantity` numbers
    Ignored,
}

/// In-progress number picks for one raffle
///
/// Purely client-local: nothing is reserved on the backend until a purchase
/// completes, so another buyer can still take a picked number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    raffle_id: String,
    quantity: usize,
    picks: Vec<u32>,
}

impl Selection {
    pub fn new(raffle_id: impl Into<String>, quantity: usize) -> Self {
        Self {
            raffle_id: raffle_id.into(),
            quantity,
            picks: Vec::new(),
        }
    }

    pub fn raffle_id(&self) -> &str {
        &self.raffle_id
    }

    /// Target number of picks
    pub fn quantity(&self) -> usize {
        self.quantity
    }

    /// Change the target quantity
    ///
    /// Existing picks are kept even when they exceed the new quantity; the
    /// purchase flow refuses any selection whose size differs from it.
    pub fn set_quantity(&mut self, quantity: usize) {
        self.quantity = quantity;
    }

    /// Picks in the order they were made
    pub fn numbers(&self) -> &[u32] {
        &self.picks
    }

    /// Display labels of the picks
    pub fn labels(&self) -> Vec<String> {
        self.picks.iter().copied().map(format_number).collect()
    }

    pub fn len(&self) -> usize {
        self.picks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.picks.is_empty()
    }

    /// Exactly `quantity` numbers picked
    pub fn is_complete(&self) -> bool {
        self.picks.len() == self.quantity
    }

    pub fn contains(&self, number: u32) -> bool {
        self.picks.contains(&number)
    }

    /// Remove `number` if picked, otherwise add it while there is room
    pub fn toggle(&mut self, number: u32) -> ToggleOutcome {
        if let Some(pos) = self.picks.iter().position(|&n| n == number) {
            self.picks.remove(pos);
            return ToggleOutcome::Removed;
        }

        if self.picks.len() < self.quantity {
            self.picks.push(number);
            ToggleOutcome::Added
        } else {
            ToggleOutcome::Ignored
        }
    }

    /// Replace the selection with up to `quantity` random available numbers
    ///
    /// Draws uniformly without replacement from the numbers that are both
    /// available and not currently picked.
    pub fn random_fill<R: Rng + ?Sized>(
        &mut self,
        quantity: usize,
        availability: &Availability,
        rng: &mut R,
    ) -> &[u32] {
        let current: HashSet<u32> = self.picks.iter().copied().collect();
        let pool: Vec<u32> = availability
            .available
            .iter()
            .copied()
            .filter(|n| !current.contains(n))
            .collect();

        let amount = quantity.min(pool.len());
        let drawn: Vec<u32> = index::sample(rng, pool.len(), amount)
            .into_iter()
            .map(|i| pool[i])
            .collect();

        debug!(
            "Random fill for raffle {}: {} of {} requested from pool of {}",
            self.raffle_id,
            drawn.len(),
            quantity,
            pool.len()
        );

        self.picks = drawn;
        &self.picks
    }

    pub fn clear(&mut self) {
        self.picks.clear();
    }
}
