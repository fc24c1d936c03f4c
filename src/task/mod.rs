//! Task layer: per-operation lifecycle, scheduling and the result handle.

pub mod handle;
pub(crate) mod lifecycle;
pub mod operation;
pub mod scheduler;

pub use handle::ResultHandle;
pub use operation::Operation;
pub use scheduler::Scheduler;
