//! Authentication module for Keygate.
//!
//! The decision pipeline, executed once per request:
//! - CredentialExtractor: pulls the raw API key out of the header
//! - ApiKeyValidator: confirms the key against the identity's stored record
//! - ApiKeyGate: orchestrates both into an allow/deny outcome
//!
//! The session manager provides the upstream factor that establishes the
//! claimed identity before the gate runs.

mod extract;
mod gate;
mod middleware;
mod session;
mod validator;

pub use extract::*;
pub use gate::*;
pub use middleware::*;
pub use session::*;
pub use validator::*;
