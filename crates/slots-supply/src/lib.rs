//! # slots-supply — random numbers for the reels
//!
//! Drawing numbers from a remote generator is slow and rationed, so
//! machines never call it directly. They draw from a local buffer that is
//! topped up in large blocks once it runs low.
//!
//! ## Architecture
//!
//! ```text
//! Machine::stop ──request(n)──► RandomSupplyCache
//!                                   │  buffer (FIFO)
//!                                   │  quota  (bits / requests left)
//!                                   │
//!                         low water │ replenish(block)
//!                                   v
//!                            dyn NumberSource
//!                              ├── LocalNumberSource   (rand)
//!                              └── RandomOrgSource     (JSON-RPC over HTTPS)
//! ```

pub mod cache;
pub mod config;
pub mod local;
pub mod random_org;
pub mod source;

pub use cache::*;
pub use config::*;
pub use local::*;
pub use random_org::*;
pub use source::*;
