//! Payline definitions

use serde::{Deserialize, Serialize};

/// A scoring line across the grid
///
/// `coordinates` holds one 1-based row index per column, read left to
/// right: `[2, 1, 1, 2]` runs through (row 2, col 1), (row 1, col 2),
/// (row 1, col 3), (row 2, col 4). Whether the line fits a grid is the
/// grid's call, see [`ReelGridBuilder::add_payline`](crate::ReelGridBuilder::add_payline).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payline {
    /// Identifier shown to the player (1 is usually the middle row)
    pub(crate) reference: u32,
    pub(crate) coordinates: Vec<u32>,
    #[serde(default)]
    pub(crate) active: bool,
    /// Bet placed on this line; scales every score it pays
    #[serde(default)]
    pub(crate) bet: u32,
}

impl Payline {
    /// Inactive line with no bet
    pub fn new(reference: u32, coordinates: Vec<u32>) -> Self {
        Self {
            reference,
            coordinates,
            active: false,
            bet: 0,
        }
    }

    /// Same row across every column
    pub fn straight(reference: u32, row: u32, columns: usize) -> Self {
        Self::new(reference, vec![row; columns])
    }

    pub fn reference(&self) -> u32 {
        self.reference
    }

    pub fn coordinates(&self) -> &[u32] {
        &self.coordinates
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn bet(&self) -> u32 {
        self.bet
    }

    /// Zero-based (row, column) pairs this line runs through
    pub fn positions(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.coordinates
            .iter()
            .enumerate()
            .map(|(col, &row)| (row.saturating_sub(1) as usize, col))
    }

    pub(crate) fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub(crate) fn set_bet(&mut self, bet: u32) {
        self.bet = bet;
    }
}
