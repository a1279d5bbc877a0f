//! Runtime system
//!
//! This module contains admission control and the bounded task runner.

pub mod error;
pub mod gate;
pub mod runner;

pub use error::{RunnerError, RunnerResult};
pub use gate::{AdmissionGate, ConcurrencyLimit, SlotGuard};
pub use runner::{RunnerStats, StatsSnapshot, TaskRunner};
