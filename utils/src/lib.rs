//! Shared utilities for the Concord DAO core.

pub mod logging;
pub mod stats;

pub use logging::{init_logging, LogFormat, LoggingError};
pub use stats::OutcomeStats;
