//! API-compatible types.
//!
//! The types in this module are what the HTTP layer reads and writes as JSON.

pub mod ballot;
pub mod election;
pub mod results;
