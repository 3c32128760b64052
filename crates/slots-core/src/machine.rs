//! Machine state and the spin/stop cycle
//!
//! ```text
//! INITIALIZED ──spin()──► SPINNING ──stop(fetcher)──► IDLE
//!                            ▲                          │
//!                            └──────────spin()──────────┘
//! ```
//!
//! `stop` always leaves the machine IDLE, even when drawing numbers fails:
//! the reels have stopped, the spin is void.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{SlotError, SlotResult};
use crate::grid::ReelGrid;
use crate::layout::ReelLayout;
use crate::payline::Payline;
use crate::scoring::{LineWin, PaylineStreakScoring, ScoringStrategy};

/// Opaque machine identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MachineId(Uuid);

impl MachineId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for MachineId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MachineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for MachineId {
    type Err = SlotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|e| SlotError::InvalidArgument(format!("Bad machine id '{}': {}", s, e)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MachineStatus {
    #[default]
    Initialized,
    Idle,
    Spinning,
}

/// Stock machine types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MachineKind {
    /// 3 reels, 3 rows
    Classic,
    /// 5 reels, 3 rows
    FiveByThree,
    /// 5 reels, 4 rows
    FiveByFour,
}

impl MachineKind {
    pub const ALL: [MachineKind; 3] = [Self::Classic, Self::FiveByThree, Self::FiveByFour];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Classic => "Classic",
            Self::FiveByThree => "FiveByThree",
            Self::FiveByFour => "FiveByFour",
        }
    }

    /// (rows, columns)
    pub fn dimensions(&self) -> (usize, usize) {
        match self {
            Self::Classic => (3, 3),
            Self::FiveByThree => (3, 5),
            Self::FiveByFour => (4, 5),
        }
    }

    pub fn cell_count(&self) -> usize {
        let (rows, columns) = self.dimensions();
        rows * columns
    }

    /// Grid with payline 1 through the second row, active at bet 1, and
    /// the stock layout
    pub fn build_grid(&self) -> SlotResult<ReelGrid> {
        let (rows, columns) = self.dimensions();
        let middle = Payline::straight(1, 2, columns);

        let mut grid = ReelGrid::builder(rows, columns)?
            .with_payline(middle.reference(), middle.coordinates().to_vec())?
            .with_layout(ReelLayout::classic()?)?
            .build();
        grid.activate_by_reference(1)?;
        grid.set_bet_by_reference(1, 1)?;
        Ok(grid)
    }
}

impl fmt::Display for MachineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MachineKind {
    type Err = SlotError;

    /// Accepts "Classic", "CLASSIC", "five_by_three", ...
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted: String = s
            .chars()
            .filter(|c| *c != '_' && *c != '-' && !c.is_whitespace())
            .collect();
        Self::ALL
            .into_iter()
            .find(|k| k.name().eq_ignore_ascii_case(&wanted))
            .ok_or_else(|| SlotError::InvalidArgument(format!("Unknown machine type '{}'", s)))
    }
}

/// Where `stop` draws its numbers from
#[async_trait]
pub trait NumberFetcher: Send + Sync {
    /// Exactly `amount` numbers, or an error
    async fn fetch(&self, amount: usize) -> SlotResult<Vec<i32>>;
}

/// A single playable machine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Machine {
    id: MachineId,
    name: String,
    /// Running total across all spins
    score: i64,
    created_at: DateTime<Utc>,
    player: String,
    grid: ReelGrid,
    status: MachineStatus,
    domain_low: i32,
    domain_high: i32,
}

/// What a successful stop hands back
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpinResult {
    /// Machine state after the stop, grid included
    pub machine: Machine,
    /// Score of this spin alone
    pub score: i64,
    pub line_wins: Vec<LineWin>,
}

impl Machine {
    /// Stock machine of the given kind
    pub fn create(kind: MachineKind, player: impl Into<String>) -> SlotResult<Self> {
        Self::new(kind.name(), player, kind.build_grid()?)
    }

    /// Machine over a custom grid. The grid must carry a valid layout.
    pub fn new(
        name: impl Into<String>,
        player: impl Into<String>,
        grid: ReelGrid,
    ) -> SlotResult<Self> {
        let layout = grid
            .layout()
            .ok_or_else(|| SlotError::invalid_argument("Machine grid has no layout"))?;
        let (domain_low, domain_high) = (layout.domain_low(), layout.domain_high());

        let machine = Self {
            id: MachineId::new(),
            name: name.into(),
            score: 0,
            created_at: Utc::now(),
            player: player.into(),
            grid,
            status: MachineStatus::Initialized,
            domain_low,
            domain_high,
        };
        log::debug!(
            "[Machine] Created {} '{}' for {} ({} cells, domain {}..={})",
            machine.id,
            machine.name,
            machine.player,
            machine.grid.cell_count(),
            domain_low,
            domain_high
        );
        Ok(machine)
    }

    pub fn id(&self) -> MachineId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn score(&self) -> i64 {
        self.score
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn player(&self) -> &str {
        &self.player
    }

    pub fn grid(&self) -> &ReelGrid {
        &self.grid
    }

    pub fn status(&self) -> MachineStatus {
        self.status
    }

    /// Inclusive number range the machine's layout resolves
    pub fn domain(&self) -> (i32, i32) {
        (self.domain_low, self.domain_high)
    }

    pub fn spin(&mut self) -> SlotResult<&Self> {
        if self.status == MachineStatus::Spinning {
            return Err(SlotError::InvalidState(format!("Machine {} is already spinning", self.id)));
        }
        self.status = MachineStatus::Spinning;
        log::debug!("[Machine] {} spinning", self.id);
        Ok(self)
    }

    /// Stop with the default line scoring
    pub async fn stop(&mut self, fetcher: &dyn NumberFetcher) -> SlotResult<SpinResult> {
        self.stop_with(fetcher, &PaylineStreakScoring).await
    }

    pub async fn stop_with(
        &mut self,
        fetcher: &dyn NumberFetcher,
        scoring: &dyn ScoringStrategy,
    ) -> SlotResult<SpinResult> {
        if self.status != MachineStatus::Spinning {
            return Err(SlotError::InvalidState(format!("Machine {} is not spinning", self.id)));
        }
        self.status = MachineStatus::Idle;

        let numbers = fetcher.fetch(self.grid.cell_count()).await.inspect_err(|e| {
            log::error!("[Machine] {} could not draw numbers: {}", self.id, e);
        })?;
        self.grid.assign_numbers(&numbers)?;

        let sheet = scoring.evaluate(&self.grid);
        self.score = self.score.saturating_add(sheet.total);
        log::debug!(
            "[Machine] {} stopped: {} (running total {})",
            self.id,
            sheet.total,
            self.score
        );

        Ok(SpinResult {
            machine: self.clone(),
            score: sheet.total,
            line_wins: sheet.line_wins,
        })
    }

    pub fn activate_payline(&mut self, reference: u32) -> SlotResult<&Payline> {
        self.grid.activate_by_reference(reference)
    }

    pub fn deactivate_payline(&mut self, reference: u32) -> SlotResult<&Payline> {
        self.grid.deactivate_by_reference(reference)
    }

    pub fn set_bet(&mut self, reference: u32, bet: u32) -> SlotResult<&Payline> {
        self.grid.set_bet_by_reference(reference, bet)
    }
}
