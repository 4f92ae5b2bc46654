pub mod chain;
pub mod handler;
pub mod list;
pub mod task;

pub use chain::Chain;
pub use handler::ErrorHandler;
pub use list::List;
pub use task::{Func, Task, TaskError, TaskResult, func};
