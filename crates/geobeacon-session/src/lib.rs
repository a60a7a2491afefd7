//! Account and session bookkeeping for geobeacon.
//!
//! This crate knows who the simulated accounts are and where each of their
//! sessions stands:
//!
//! 1. **Roster**: the ordered accounts to run ([`Roster`],
//!    [`AccountCredential`], with passwords held in a [`Secret`])
//! 2. **State machine**: the lifecycle every session walks
//!    ([`SessionState`], [`FailureKind`])
//! 3. **Registry**: a lock-free view of every session's current state
//!    ([`SessionRegistry`], fed by one [`SessionReporter`] per session)
//!
//! # How it fits in the stack
//!
//! ```text
//! Simulator (above)  ← registers sessions, hands each engine its reporter
//!     ↕
//! Session Layer (this crate)  ← roster, session states, registry
//! ```

mod credential;
mod error;
mod registry;
mod roster;
mod session;

pub use credential::{AccountCredential, Secret};
pub use error::{BoxError, SessionError};
pub use registry::{SessionRegistry, SessionReporter, SessionSnapshot};
pub use roster::Roster;
pub use session::{FailureKind, SessionConfig, SessionId, SessionState};
