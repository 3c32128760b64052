//! # slots-service — machines as a service
//!
//! The operations a game front end calls: create a machine, spin it, stop
//! it for a scored result, quit it. Everything here is wiring; the rules
//! live in `slots-core` and the numbers come from `slots-supply`.
//!
//! ```text
//! SlotsConfig ──► SlotsRuntime::from_config
//!                     ├── source_for(profile) ──► RandomSupplyCache
//!                     └── MachineService
//!                           ├── dyn MachineStore (InMemoryMachineStore)
//!                           └── ScoringStrategy
//! ```

pub mod config;
pub mod runtime;
pub mod service;
pub mod store;

pub use config::*;
pub use runtime::*;
pub use service::*;
pub use store::*;
