//! Test harness for the windowmesh engine: an in-memory session bus with
//! partition modeling, and helpers that drive a whole mesh of peers on one
//! manual clock.

pub mod local_bus;

pub use helpers::*;
pub use local_bus::{LocalBus, LocalHub};
