//! Reel grid — the machine's cells, paylines and layout
//!
//! Rows are read left to right, top to bottom. A row may be shorter or
//! longer than its neighbours, and a position may hold no cell at all
//! (`None`) so irregular machines can be described:
//!
//! ```text
//!     ┌───┬───┐
//! ┌───┼───┼───┼───┐
//! │   │   │   │   │
//! │   │   │   │   │
//! └───┼───┼───┼───┘
//!     └───┴───┘
//! ```
//!
//! Paylines are fixed once the grid is built; only their `active` flag and
//! bet can change afterwards.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{SlotError, SlotResult};
use crate::layout::ReelLayout;
use crate::payline::Payline;
use crate::symbols::Symbol;

/// One position on the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Cell {
    pub value: i32,
    #[serde(default)]
    pub symbol: Symbol,
}

impl Cell {
    pub fn new(value: i32) -> Self {
        Self {
            value,
            symbol: Symbol::None,
        }
    }
}

/// Rows of optional cells; `None` marks a position with no cell
pub type CellRows = Vec<Vec<Option<Cell>>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ReelGridRepr", into = "ReelGridRepr")]
pub struct ReelGrid {
    rows: CellRows,
    paylines: BTreeMap<u32, Payline>,
    layout: Option<ReelLayout>,
}

/// Wire shape of a grid
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ReelGridRepr {
    cells: CellRows,
    #[serde(default)]
    paylines: Vec<Payline>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    layout: Option<ReelLayout>,
}

impl TryFrom<ReelGridRepr> for ReelGrid {
    type Error = SlotError;

    fn try_from(repr: ReelGridRepr) -> Result<Self, Self::Error> {
        let mut builder = ReelGridBuilder::from_rows(repr.cells)?;
        for payline in repr.paylines {
            builder.insert_payline(payline)?;
        }
        if let Some(layout) = repr.layout {
            builder.layout(layout)?;
        }
        Ok(builder.build())
    }
}

impl From<ReelGrid> for ReelGridRepr {
    fn from(grid: ReelGrid) -> Self {
        Self {
            cells: grid.rows,
            paylines: grid.paylines.into_values().collect(),
            layout: grid.layout,
        }
    }
}

/// Builds a [`ReelGrid`]. Paylines can only be added here.
#[derive(Debug, Clone)]
pub struct ReelGridBuilder {
    grid: ReelGrid,
}

impl ReelGridBuilder {
    /// Rectangular grid of zero-valued, unresolved cells
    pub fn new(rows: usize, columns: usize) -> SlotResult<Self> {
        if rows == 0 || columns == 0 {
            return Err(SlotError::InvalidArgument(format!(
                "Grid needs at least one row and one column, got {}x{}",
                rows, columns
            )));
        }
        Self::from_rows(vec![vec![Some(Cell::default()); columns]; rows])
    }

    /// Grid from explicit rows, possibly of uneven length
    pub fn from_rows(rows: CellRows) -> SlotResult<Self> {
        if rows.is_empty() {
            return Err(SlotError::invalid_argument("Grid has no rows"));
        }
        if let Some(i) = rows.iter().position(|r| r.is_empty()) {
            return Err(SlotError::InvalidArgument(format!("Grid row {} has no positions", i + 1)));
        }
        if rows.iter().flatten().all(Option::is_none) {
            return Err(SlotError::invalid_argument("Grid has no cells"));
        }

        Ok(Self {
            grid: ReelGrid {
                rows,
                paylines: BTreeMap::new(),
                layout: None,
            },
        })
    }

    /// Declare an inactive, zero-bet payline
    ///
    /// Fails when the reference or the exact coordinate sequence is already
    /// taken, or when the line does not fit the grid.
    pub fn add_payline(&mut self, reference: u32, coordinates: Vec<u32>) -> SlotResult<&mut Self> {
        self.insert_payline(Payline::new(reference, coordinates))
    }

    /// Consuming variant of [`add_payline`](Self::add_payline)
    pub fn with_payline(mut self, reference: u32, coordinates: Vec<u32>) -> SlotResult<Self> {
        self.add_payline(reference, coordinates)?;
        Ok(self)
    }

    /// Declare a payline keeping its active flag and bet
    pub fn insert_payline(&mut self, payline: Payline) -> SlotResult<&mut Self> {
        let grid = &mut self.grid;
        if grid.paylines.contains_key(&payline.reference) {
            return Err(SlotError::InvalidArgument(format!(
                "Payline {} already exists",
                payline.reference
            )));
        }
        if let Some(existing) = grid
            .paylines
            .values()
            .find(|p| p.coordinates == payline.coordinates)
        {
            return Err(SlotError::InvalidArgument(format!(
                "Payline {} already runs through {:?}",
                existing.reference, payline.coordinates
            )));
        }
        grid.check_fits(&payline)?;

        grid.paylines.insert(payline.reference, payline);
        Ok(self)
    }

    pub fn layout(&mut self, layout: ReelLayout) -> SlotResult<&mut Self> {
        self.grid.set_layout(layout)?;
        Ok(self)
    }

    pub fn with_layout(mut self, layout: ReelLayout) -> SlotResult<Self> {
        self.layout(layout)?;
        Ok(self)
    }

    pub fn build(self) -> ReelGrid {
        self.grid
    }
}

impl ReelGrid {
    pub fn builder(rows: usize, columns: usize) -> SlotResult<ReelGridBuilder> {
        ReelGridBuilder::new(rows, columns)
    }

    /// Rectangular grid without paylines or layout
    pub fn of(rows: usize, columns: usize) -> SlotResult<Self> {
        Ok(ReelGridBuilder::new(rows, columns)?.build())
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Width of the widest row
    pub fn column_count(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Number of real cells, i.e. how many numbers one spin needs
    pub fn cell_count(&self) -> usize {
        self.rows.iter().flatten().filter(|c| c.is_some()).count()
    }

    pub fn rows(&self) -> &CellRows {
        &self.rows
    }

    /// Cell at zero-based (row, column); `None` for empty or missing positions
    pub fn cell(&self, row: usize, column: usize) -> Option<&Cell> {
        self.rows.get(row)?.get(column)?.as_ref()
    }

    pub fn paylines(&self) -> impl Iterator<Item = &Payline> {
        self.paylines.values()
    }

    pub fn active_paylines(&self) -> impl Iterator<Item = &Payline> {
        self.paylines.values().filter(|p| p.is_active())
    }

    pub fn payline(&self, reference: u32) -> Option<&Payline> {
        self.paylines.get(&reference)
    }

    pub fn layout(&self) -> Option<&ReelLayout> {
        self.layout.as_ref()
    }

    /// Set the layout. Allowed once, and only with a valid layout.
    pub fn set_layout(&mut self, layout: ReelLayout) -> SlotResult<()> {
        if self.layout.is_some() {
            return Err(SlotError::invalid_state("Grid already has a layout"));
        }
        if !layout.is_valid() {
            return Err(SlotError::InvalidArgument(format!(
                "Layout does not cover {}..={} exactly once",
                layout.domain_low(),
                layout.domain_high()
            )));
        }
        self.layout = Some(layout);
        Ok(())
    }

    pub fn activate_by_reference(&mut self, reference: u32) -> SlotResult<&Payline> {
        let payline = self.payline_mut(reference)?;
        payline.set_active(true);
        Ok(payline)
    }

    pub fn deactivate_by_reference(&mut self, reference: u32) -> SlotResult<&Payline> {
        let payline = self.payline_mut(reference)?;
        payline.set_active(false);
        Ok(payline)
    }

    pub fn set_bet_by_reference(&mut self, reference: u32, bet: u32) -> SlotResult<&Payline> {
        let payline = self.payline_mut(reference)?;
        payline.set_bet(bet);
        Ok(payline)
    }

    fn payline_mut(&mut self, reference: u32) -> SlotResult<&mut Payline> {
        if self.paylines.is_empty() {
            return Err(SlotError::invalid_state("Grid has no paylines"));
        }
        self.paylines
            .get_mut(&reference)
            .ok_or_else(|| SlotError::InvalidState(format!("Payline {} does not exist", reference)))
    }

    /// Write `numbers` into the cells in row-major order
    ///
    /// Empty positions are skipped. With a layout present every cell's
    /// symbol is resolved too; if any number cannot be resolved the grid is
    /// left untouched. Surplus numbers are ignored.
    pub fn assign_numbers(&mut self, numbers: &[i32]) -> SlotResult<()> {
        let needed = self.cell_count();
        if numbers.len() < needed {
            return Err(SlotError::InvalidArgument(format!(
                "Grid has {} cells but only {} numbers were supplied",
                needed,
                numbers.len()
            )));
        }

        let resolved: Vec<Cell> = numbers[..needed]
            .iter()
            .map(|&value| {
                let symbol = match &self.layout {
                    Some(layout) => layout.symbol_for(value)?.symbol(),
                    None => Symbol::None,
                };
                Ok(Cell { value, symbol })
            })
            .collect::<SlotResult<_>>()?;

        for (slot, cell) in self.rows.iter_mut().flatten().flatten().zip(resolved) {
            *slot = cell;
        }
        Ok(())
    }

    /// Every real cell carries a symbol
    pub fn is_resolved(&self) -> bool {
        self.rows
            .iter()
            .flatten()
            .flatten()
            .all(|c| c.symbol.is_resolved())
    }

    /// Geometry check. Empty positions do not matter here; a line may run
    /// through them.
    fn check_fits(&self, payline: &Payline) -> SlotResult<()> {
        let columns = self.column_count();
        if payline.coordinates.len() != columns {
            return Err(SlotError::InvalidArgument(format!(
                "Payline {} has {} coordinates, grid has {} columns",
                payline.reference,
                payline.coordinates.len(),
                columns
            )));
        }
        let rows = self.row_count() as u32;
        if let Some(bad) = payline.coordinates.iter().find(|&&c| c == 0 || c > rows) {
            return Err(SlotError::InvalidArgument(format!(
                "Payline {} row {} is outside 1..={}",
                payline.reference, bad, rows
            )));
        }
        Ok(())
    }
}
