//! Per-tool decision handlers (§4.2) plus the router that dispatches
//! to them (§4.1). Nothing in this crate performs the underlying tool
//! action — every handler only decides ALLOW/WARN/BLOCK/CRITICAL/
//! SUPERADMIN-REQUIRED for a proposed invocation.

pub mod bash;
pub mod context;
pub mod file_ops;
pub mod path_util;
pub mod router;
pub mod search;
pub mod task;
pub mod web;

pub use context::GuardContext;
pub use router::{HandlerRouter, ToolHandler};
