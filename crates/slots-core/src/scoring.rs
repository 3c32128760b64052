//! Payline evaluation

use serde::{Deserialize, Serialize};

use crate::grid::{Cell, ReelGrid};
use crate::payline::Payline;
use crate::symbols::{MatchLength, Symbol};

/// A single paying line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineWin {
    /// Payline reference
    pub reference: u32,
    pub symbol: Symbol,
    pub length: MatchLength,
    /// Already multiplied by the line's bet
    pub score: i64,
}

/// Outcome of evaluating every active payline
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreSheet {
    pub total: i64,
    pub line_wins: Vec<LineWin>,
}

/// Turns a resolved grid into a score
pub trait ScoringStrategy: Send + Sync {
    fn evaluate(&self, grid: &ReelGrid) -> ScoreSheet;
}

/// Left-anchored streaks along each active payline
///
/// The streak starts at the first real cell on the line and runs while the
/// next real cell shows the same symbol. Empty positions ahead of the first
/// cell are skipped; an empty position after it ends the streak.
#[derive(Debug, Clone, Copy, Default)]
pub struct PaylineStreakScoring;

impl PaylineStreakScoring {
    fn evaluate_line(&self, grid: &ReelGrid, payline: &Payline) -> Option<LineWin> {
        let mut cells = payline
            .positions()
            .map(|(row, col)| grid.cell(row, col))
            .skip_while(Option::is_none);

        let anchor: &Cell = cells.next().flatten()?;
        if !anchor.symbol.is_resolved() {
            return None;
        }

        let streak = 1 + cells
            .map_while(|c| c.filter(|c| c.symbol == anchor.symbol))
            .count();
        let length = MatchLength::from_streak(streak)?;

        // The anchor's own config carries the score table
        let config = grid.layout()?.symbol_for(anchor.value).ok()?;
        let per_unit = config.scores().get(&length).copied()?;
        let score = per_unit.saturating_mul(i64::from(payline.bet()));
        if score <= 0 {
            return None;
        }

        Some(LineWin {
            reference: payline.reference(),
            symbol: anchor.symbol,
            length,
            score,
        })
    }
}

impl ScoringStrategy for PaylineStreakScoring {
    fn evaluate(&self, grid: &ReelGrid) -> ScoreSheet {
        let line_wins: Vec<LineWin> = grid
            .active_paylines()
            .filter_map(|p| self.evaluate_line(grid, p))
            .collect();
        let total = line_wins
            .iter()
            .fold(0i64, |total, w| total.saturating_add(w.score));

        ScoreSheet { total, line_wins }
    }
}
