//! Pure utility functions.
//!
//! Process bootstrap and retry policy shared by the runner and the binary.

pub mod bootstrap;
pub mod retry;
