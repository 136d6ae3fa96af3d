//! EOD Simulator
//!
//! Library side of the `eod-sim` binary.
//!
//! - **check-config**: [`EffectiveConfig`] shows what each community
//!   actually runs with
//! - **simulate**: [`run_simulator`] drives seeded concurrent voting across
//!   communities and audits the results

#![warn(missing_docs)]

pub mod effective;
pub mod simulator;

pub use effective::EffectiveConfig;
pub use simulator::{
    run_simulator, SimulatedAction, SimulatorConfig, SimulatorReport, SimulatorStats, Violation,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
