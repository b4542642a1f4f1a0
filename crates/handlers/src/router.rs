//! Handler router (§4.1): dispatch by tool name with a fail-closed
//! recovery wrapper.
//!
//! No reflection, no dynamic tool loading — a fixed `HashMap` built
//! once at orchestrator init, matching the teacher's design note
//! against runtime plugin discovery for anything security-relevant.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};

use wow_domain::{Decision, Invocation};
use wow_registry::ToolRegistry;

use crate::context::GuardContext;

pub trait ToolHandler: Send + Sync {
    fn handle(&self, ctx: &GuardContext<'_>, inv: &Invocation) -> Decision;
}

pub struct HandlerRouter {
    handlers: HashMap<&'static str, Box<dyn ToolHandler>>,
}

impl Default for HandlerRouter {
    fn default() -> Self {
        Self::standard()
    }
}

impl HandlerRouter {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// The router wired with every built-in tool handler (§2 component
    /// table). Keys are the registry's internal handler ids, not the
    /// wire-level tool names — `dispatch` resolves through
    /// [`ToolRegistry::handler_id`] first.
    pub fn standard() -> Self {
        let mut router = Self::new();
        router.register("bash", Box::new(crate::bash::BashHandler));
        router.register("write", Box::new(crate::file_ops::WriteHandler));
        router.register("edit", Box::new(crate::file_ops::EditHandler));
        router.register("read", Box::new(crate::file_ops::ReadHandler));
        router.register("glob", Box::new(crate::search::GlobHandler));
        router.register("grep", Box::new(crate::search::GrepHandler));
        router.register("task", Box::new(crate::task::TaskHandler));
        router.register("web_fetch", Box::new(crate::web::WebFetchHandler));
        router.register("web_search", Box::new(crate::web::WebSearchHandler));
        router
    }

    pub fn register(&mut self, handler_id: &'static str, handler: Box<dyn ToolHandler>) {
        self.handlers.insert(handler_id, handler);
    }

    /// Dispatch one invocation. Unknown tools (not in `registry`) pass
    /// through unchanged with ALLOW after their frequency is recorded
    /// (§4.1). A handler panic is caught and converted to a BLOCK
    /// decision — "fail closed" (§7, §9).
    pub fn dispatch(&self, ctx: &GuardContext<'_>, registry: &ToolRegistry, inv: &Invocation) -> Decision {
        let Some(handler_id) = registry.handler_id(&inv.tool) else {
            registry.record_unknown(&inv.tool);
            return Decision::allow(format!("'{}' is not a recognised tool; passed through", inv.tool));
        };

        let Some(handler) = self.handlers.get(handler_id) else {
            return Decision::block(format!("no handler registered for recognised tool '{}'", inv.tool));
        };

        let result = panic::catch_unwind(AssertUnwindSafe(|| handler.handle(ctx, inv)));
        match result {
            Ok(decision) => decision,
            Err(_) => {
                tracing::warn!(tool = %inv.tool, "handler panicked; failing closed");
                Decision::block("internal handler error")
            }
        }
    }
}
