//! Utility functions module
//!
//! Display formatting for second counts and shutdown signal handling.

pub mod format;
pub mod signals;

// Re-export main functions
pub use signals::shutdown_signal;
