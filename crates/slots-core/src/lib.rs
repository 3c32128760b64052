//! # slots-core — reels, paylines and symbols
//!
//! Turns a batch of drawn numbers into symbols and a score.
//!
//! ## Architecture
//!
//! ```text
//! Machine (status, running score)
//!     │
//!     └── ReelGrid (rows of cells)
//!           ├── Payline × n (reference, row per column, active, bet)
//!           └── ReelLayout (domain [from, to])
//!                 └── SymbolConfig × n (numbers → symbol + score table)
//!
//! stop(fetcher) → numbers → cells → symbols → ScoringStrategy → SpinResult
//! ```
//!
//! Where the numbers come from is not this crate's concern; `Machine::stop`
//! takes any [`NumberFetcher`].

pub mod error;
pub mod grid;
pub mod layout;
pub mod machine;
pub mod payline;
pub mod scoring;
pub mod symbols;

pub use error::*;
pub use grid::*;
pub use layout::*;
pub use machine::*;
pub use payline::*;
pub use scoring::*;
pub use symbols::*;
