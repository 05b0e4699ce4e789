//! Workflow infrastructure - dispatch seam implementation

mod dispatcher;

pub use dispatcher::TracingTestDispatcher;
