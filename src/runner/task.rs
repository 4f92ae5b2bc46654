use async_trait::async_trait;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::core::context::Context;

/// Failure returned by a task. All failures are treated alike by the runners.
pub type TaskError = Box<dyn std::error::Error + Send + Sync>;

pub type TaskResult = Result<(), TaskError>;

/// A runnable unit of work.
#[async_trait]
pub trait Task: Send + Sync {
    async fn run(&self, ctx: Context) -> TaskResult;
}

#[async_trait]
impl<T> Task for Arc<T>
where
    T: Task + ?Sized,
{
    async fn run(&self, ctx: Context) -> TaskResult {
        (**self).run(ctx).await
    }
}

#[async_trait]
impl<T> Task for Box<T>
where
    T: Task + ?Sized,
{
    async fn run(&self, ctx: Context) -> TaskResult {
        (**self).run(ctx).await
    }
}

/// Adapter that turns a plain async function into a [`Task`].
#[derive(Clone)]
pub struct Func<F>(F);

impl<F> fmt::Debug for Func<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Func").finish_non_exhaustive()
    }
}

/// Wrap `f` so it can be registered wherever a [`Task`] is expected.
pub fn func<F, Fut>(f: F) -> Func<F>
where
    F: Fn(Context) -> Fut + Send + Sync,
    Fut: Future<Output = TaskResult> + Send + 'static,
{
    Func(f)
}

#[async_trait]
impl<F, Fut> Task for Func<F>
where
    F: Fn(Context) -> Fut + Send + Sync,
    Fut: Future<Output = TaskResult> + Send + 'static,
{
    async fn run(&self, ctx: Context) -> TaskResult {
        (self.0)(ctx).await
    }
}
