// Command Pattern for Undo/Redo functionality
//
// This module implements a bounded undo/redo history whose entries are
// pairs of undo and redo invocations, replayed asynchronously.
//
// Architecture:
// - descriptor: Invocation / Command / Commands, plus normalize() and validate()
// - trait_def: operation, middleware and hook types, CommandError
// - instance: registry used to resolve invocations that name a method
// - pipeline: sequential replay with before/after middleware and error aggregation
// - manager: CommandManager, owning the history buffer and the position pointer
// - adapter: CommandAdapter, turning a mutating method into a recordable command
//
// Replays never run concurrently: batches and the invocations inside them run
// strictly in the order they were collected.

pub mod adapter;
pub mod descriptor;
pub mod instance;
pub mod manager;
pub mod pipeline;
pub mod trait_def;

pub use adapter::{CommandAdapter, Recorder};
pub use descriptor::{Command, Commands, Envelope, Input, Invocation, Method};
pub use instance::{FnRegistry, Instance, InstanceRegistry};
pub use manager::{CommandManager, CommandManagerBuilder, HistoryError};
pub use pipeline::{Pipeline, Replay, RunReport};
pub use trait_def::{CommandError, CommandResult, Operation};
