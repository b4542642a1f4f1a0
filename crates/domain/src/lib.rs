//! Shared data model for wow-guard: invocations, decisions, zones,
//! configuration, and the error type every other crate propagates.

pub mod config;
pub mod decision;
pub mod error;
pub mod invocation;
pub mod zone;

pub use decision::{Decision, DecisionKind};
pub use error::{Error, Result};
pub use invocation::Invocation;
pub use zone::{AuthTier, Zone};
