//! slotgate - admission-gated task runner
//!
//! Runs any number of submitted units of work while guaranteeing that no
//! more than a configured number execute at once.
//!
//! # Example
//!
//! ```rust
//! use slotgate::TaskRunner;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), slotgate::RunnerError> {
//! let runner = TaskRunner::new(2)?;
//! let units = (0..6).map(|i| async move { Ok::<_, std::convert::Infallible>(i * 2) });
//! let results = runner.run_all(units).await?;
//! assert_eq!(results.len(), 6);
//! assert_eq!(runner.running(), 0);
//! # Ok(())
//! # }
//! ```

#![doc(html_root_url = "https://docs.rs/slotgate")]
#![warn(rust_2018_idioms)]

// Public modules
pub mod demo;
pub mod runtime;

// Utility modules
pub mod util;

// Re-exports
pub use runtime::{
    AdmissionGate, ConcurrencyLimit, RunnerError, RunnerResult, SlotGuard, StatsSnapshot,
    TaskRunner,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = "slotgate";
