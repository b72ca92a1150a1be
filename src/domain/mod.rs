//! Domain types for Keygate.
//!
//! - Identity: the principal a request acts as, with its credential tags
//! - AuthOutcome: the binary allow/deny decision produced by the gate

mod identity;
mod outcome;

pub use identity::*;
pub use outcome::*;
