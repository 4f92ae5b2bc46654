//! Two small task runners over a common [`Task`] trait: [`List`] spawns every
//! task concurrently and reports failures to per-task handlers, [`Chain`] runs
//! tasks in order and stops at the first failure.

pub mod core;
pub mod modules;
pub mod runner;

pub use crate::core::context::{Context, ContextError};
pub use crate::runner::{Chain, ErrorHandler, Func, List, Task, TaskError, TaskResult, func};
