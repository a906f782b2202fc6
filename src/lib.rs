// undo_history - Library exports for hosts, tests and benchmarks

pub mod command;
pub mod config;
pub mod history;
pub mod logging;

// Re-export commonly used types for convenience
pub use command::trait_def::{
    AfterAll, after, after_all, before, operation, sync_after_all, sync_operation,
};
pub use command::{
    Command, CommandAdapter, CommandError, CommandManager, CommandManagerBuilder, Envelope,
    HistoryError, Input, Instance, InstanceRegistry, Invocation, Method, RunReport,
};
pub use config::HistoryConfig;
pub use history::{HistoryEntry, LimitedBuffer};
pub use logging::{Logger, MemoryLogger, NoopLogger, TracingLogger};
