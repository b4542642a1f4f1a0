//! Process-local state primitives shared by every wow-guard crate:
//! a namespaced key/value store with JSON snapshotting, and an ordered
//! pub/sub event bus.

pub mod events;
pub mod kv;

pub use events::{EventBus, EventRecord};
pub use kv::{Namespace, StateManager};
