use std::fmt;

use tokio::runtime::Handle;
use tracing::debug;

use super::handler::ErrorHandler;
use super::task::{Task, TaskError};
use crate::core::context::Context;

struct Entry {
    task: Box<dyn Task>,
    handler: ErrorHandler,
}

/// A list of tasks that are run concurrently.
///
/// Every task gets its own tokio task when the list is run; failures are
/// reported to the handler registered alongside the task and never surface to
/// the caller of [`List::run`].
///
/// `run` resets the list as soon as everything is spawned, without waiting for
/// completion. Tasks added afterwards form a new batch that may overlap with
/// the previous one.
#[derive(Default)]
pub struct List {
    entries: Vec<Entry>,
    handle: Option<Handle>,
}

impl List {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a list that spawns onto `handle` instead of the ambient runtime.
    pub fn with_handle(handle: Handle) -> Self {
        Self {
            entries: Vec::new(),
            handle: Some(handle),
        }
    }

    /// Add `task` to the list. `handler` is called with the error if the task fails.
    pub fn add<T, H>(&mut self, task: T, handler: H)
    where
        T: Task + 'static,
        H: FnOnce(TaskError) + Send + 'static,
    {
        self.entries.push(Entry {
            task: Box::new(task),
            handler: Box::new(handler),
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Spawn every task in the list and reset it. Returns without waiting for
    /// the spawned tasks.
    ///
    /// Without an explicit handle this must be called from within a tokio
    /// runtime.
    pub fn run(&mut self, ctx: &Context) {
        let entries = std::mem::take(&mut self.entries);
        if entries.is_empty() {
            return;
        }

        debug!(tasks = entries.len(), "launching task list");
        for (index, Entry { task, handler }) in entries.into_iter().enumerate() {
            let ctx = ctx.clone();
            let execution = async move {
                if let Err(err) = task.run(ctx).await {
                    debug!(index, error = %err, "list task failed");
                    handler(err);
                }
                // `task` is dropped only after the handler returned.
                drop(task);
            };

            match &self.handle {
                Some(handle) => {
                    handle.spawn(execution);
                }
                None => {
                    tokio::spawn(execution);
                }
            }
        }
    }
}

impl fmt::Debug for List {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("List")
            .field("tasks", &self.entries.len())
            .field("handle", &self.handle.is_some())
            .finish()
    }
}
