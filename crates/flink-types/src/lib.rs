//! Core types and traits for the Flink application operator.
//!
//! The REST model mirrors the Flink job-manager API so it round-trips through JSON.

mod application;
mod objects;
mod protocol;
mod traits;

pub use application::*;
pub use objects::*;
pub use protocol::*;
pub use traits::*;
