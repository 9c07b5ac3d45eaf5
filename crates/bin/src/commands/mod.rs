//! Command implementations for the Sealnote CLI.

pub mod health;
pub mod serve;
