//! Session manager (§4.9): session id, metrics, event log, and
//! save/restore/archive/end for the single session a guard process
//! owns over its lifetime.

pub mod event;
pub mod manager;
pub mod session_id;

pub use event::{EventLog, EventRecord};
pub use manager::{Session, SessionManager};
pub use session_id::generate_session_id;
