// Operation and middleware types shared by descriptors, the pipeline and the manager

use futures::future::BoxFuture;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// Result type for command operations
pub type CommandResult<T> = Result<T, CommandError>;

/// Errors that can occur while replaying a command
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CommandError {
    /// Operation failed with a message
    #[error("{0}")]
    Failed(String),
    /// Operation failed without saying why
    #[error("Cant restore action")]
    Unspecified,
    /// The resolved instance has no method with this name
    #[error("Unknown method: {0}")]
    UnknownMethod(String),
}

impl From<String> for CommandError {
    fn from(message: String) -> Self {
        CommandError::Failed(message)
    }
}

impl From<&str> for CommandError {
    fn from(message: &str) -> Self {
        CommandError::Failed(message.to_string())
    }
}

/// Free-form fields carried by an invocation (instance id, labels, ...)
pub type Attributes = Map<String, Value>;

/// Future returned by every undo/redo operation
///
/// Resolves to the operation's result value, handed to `after` middleware.
pub type OperationFuture = BoxFuture<'static, CommandResult<Value>>;

/// A directly callable undo or redo operation
///
/// Receives the invocation arguments followed by any value produced by
/// `before` middleware.
pub type Operation = Arc<dyn Fn(Vec<Value>) -> OperationFuture + Send + Sync>;

/// Middleware run before an operation
///
/// A resolved `Some(value)` is appended to the operation's arguments.
pub type Before =
    Arc<dyn Fn(&Attributes) -> BoxFuture<'static, CommandResult<Option<Value>>> + Send + Sync>;

/// Middleware run after an operation succeeded, with the operation's result
pub type After =
    Arc<dyn Fn(Value, &Attributes) -> BoxFuture<'static, CommandResult<()>> + Send + Sync>;

/// Completion hook run once after a whole undo or redo call
pub type AfterAll = Arc<dyn Fn() -> BoxFuture<'static, CommandResult<()>> + Send + Sync>;

/// Build an [`Operation`] from an async closure
pub fn operation<F, Fut>(f: F) -> Operation
where
    F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = CommandResult<Value>> + Send + 'static,
{
    Arc::new(move |args: Vec<Value>| -> OperationFuture { Box::pin(f(args)) })
}

/// Build an [`Operation`] from a synchronous closure
pub fn sync_operation<F>(f: F) -> Operation
where
    F: Fn(Vec<Value>) -> CommandResult<Value> + Send + Sync + 'static,
{
    Arc::new(move |args: Vec<Value>| -> OperationFuture {
        Box::pin(futures::future::ready(f(args)))
    })
}

/// Build a [`Before`] middleware from an async closure
///
/// The closure receives the invocation's attributes.
pub fn before<F, Fut>(f: F) -> Before
where
    F: Fn(&Attributes) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = CommandResult<Option<Value>>> + Send + 'static,
{
    Arc::new(
        move |attributes: &Attributes| -> BoxFuture<'static, CommandResult<Option<Value>>> {
            Box::pin(f(attributes))
        },
    )
}

/// Build an [`After`] middleware from an async closure
pub fn after<F, Fut>(f: F) -> After
where
    F: Fn(Value, &Attributes) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = CommandResult<()>> + Send + 'static,
{
    Arc::new(
        move |result: Value, attributes: &Attributes| -> BoxFuture<'static, CommandResult<()>> {
            Box::pin(f(result, attributes))
        },
    )
}

/// Build an [`AfterAll`] hook from an async closure
pub fn after_all<F, Fut>(f: F) -> AfterAll
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = CommandResult<()>> + Send + 'static,
{
    Arc::new(move || -> BoxFuture<'static, CommandResult<()>> { Box::pin(f()) })
}

/// Build an [`AfterAll`] hook from a synchronous closure
pub fn sync_after_all<F>(f: F) -> AfterAll
where
    F: Fn() + Send + Sync + 'static,
{
    Arc::new(move || -> BoxFuture<'static, CommandResult<()>> {
        f();
        Box::pin(futures::future::ready(Ok(())))
    })
}

/// Wrapper so closures can appear in `Debug` output
pub(crate) struct Opaque<'a>(pub &'a str);

impl fmt::Debug for Opaque<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.0)
    }
}
