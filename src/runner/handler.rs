use tracing::warn;

use super::task::TaskError;

/// Callback a [`List`](super::list::List) invokes when the paired task fails.
pub type ErrorHandler = Box<dyn FnOnce(TaskError) + Send + 'static>;

/// A handler that drops the error.
pub fn discard() -> ErrorHandler {
    Box::new(|_err: TaskError| {})
}

/// A handler that reports the failure as a `warn` event tagged with `name`.
pub fn log(name: impl Into<String>) -> ErrorHandler {
    let name = name.into();
    Box::new(move |err: TaskError| warn!(task = %name, error = %err, "task failed"))
}
