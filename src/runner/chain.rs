use std::fmt;

use tracing::debug;

use super::task::{Task, TaskResult};
use crate::core::context::Context;

/// A list of chained tasks, run one after another in the order they were added.
#[derive(Default)]
pub struct Chain {
    tasks: Vec<Box<dyn Task>>,
}

impl Chain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<T>(&mut self, task: T) -> &mut Self
    where
        T: Task + 'static,
    {
        self.tasks.push(Box::new(task));
        self
    }

    /// Append all `tasks`, keeping their order.
    pub fn add_all<I>(&mut self, tasks: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: Task + 'static,
    {
        self.extend(tasks);
        self
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Run the tasks in order on the current task.
    ///
    /// The first error stops the chain and is returned; tasks after it are
    /// dropped without being run. The chain is empty once this returns.
    pub async fn run(&mut self, ctx: &Context) -> TaskResult {
        let tasks = std::mem::take(&mut self.tasks);
        let total = tasks.len();

        for (index, task) in tasks.into_iter().enumerate() {
            if let Err(err) = task.run(ctx.clone()).await {
                debug!(index, total, error = %err, "chain stopped");
                return Err(err);
            }
        }

        if total > 0 {
            debug!(total, "chain completed");
        }
        Ok(())
    }
}

impl<T> Extend<T> for Chain
where
    T: Task + 'static,
{
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.tasks
            .extend(iter.into_iter().map(|task| Box::new(task) as Box<dyn Task>));
    }
}

impl<T> FromIterator<T> for Chain
where
    T: Task + 'static,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut chain = Chain::new();
        chain.extend(iter);
        chain
    }
}

impl fmt::Debug for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chain")
            .field("tasks", &self.tasks.len())
            .finish()
    }
}
