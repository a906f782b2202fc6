// Command descriptors and the normalization/validation applied before saving

use crate::command::trait_def::{After, Attributes, Before, Opaque, Operation};
use serde_json::Value;
use std::fmt;

/// Attribute key holding the target instance id unless configured otherwise
pub const DEFAULT_ID_FIELD: &str = "instanceID";

/// How an invocation reaches its code
#[derive(Clone)]
pub enum Method {
    /// Call this operation directly
    Call(Operation),
    /// Call the method with this name on an instance from the registry
    Named(String),
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Call(_) => f.debug_tuple("Call").field(&Opaque("operation")).finish(),
            Method::Named(name) => f.debug_tuple("Named").field(name).finish(),
        }
    }
}

/// One side (undo or redo) of a command
///
/// Carries the method to invoke, its arguments, free-form attributes (such
/// as the target instance id) and optional middleware.
#[derive(Clone, Default)]
pub struct Invocation {
    method: Option<Method>,
    arguments: Option<Value>,
    attributes: Attributes,
    before: Option<Before>,
    after: Option<After>,
}

impl Invocation {
    /// Invocation calling `operation` directly
    pub fn call(operation: Operation) -> Self {
        Self {
            method: Some(Method::Call(operation)),
            ..Self::default()
        }
    }

    /// Invocation calling `method` on an instance resolved at replay time
    pub fn named(method: impl Into<String>) -> Self {
        Self {
            method: Some(Method::Named(method.into())),
            ..Self::default()
        }
    }

    /// Invocation with arguments only; the method is filled in later
    pub fn with_only_arguments(arguments: Value) -> Self {
        Self {
            arguments: Some(arguments),
            ..Self::default()
        }
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Set the arguments
    ///
    /// An array is spread into positional arguments, any other value is
    /// passed as a single argument.
    pub fn with_arguments(mut self, arguments: Value) -> Self {
        self.arguments = Some(arguments);
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    /// Store the target instance id under [`DEFAULT_ID_FIELD`]
    pub fn with_instance_id(self, id: impl Into<Value>) -> Self {
        self.with_attribute(DEFAULT_ID_FIELD, id.into())
    }

    pub fn with_before(mut self, before: Before) -> Self {
        self.before = Some(before);
        self
    }

    pub fn with_after(mut self, after: After) -> Self {
        self.after = Some(after);
        self
    }

    pub fn method(&self) -> Option<&Method> {
        self.method.as_ref()
    }

    pub(crate) fn set_method_if_missing(&mut self, method: Method) {
        if self.method.is_none() {
            self.method = Some(method);
        }
    }

    pub fn arguments(&self) -> Option<&Value> {
        self.arguments.as_ref()
    }

    /// Arguments as a positional list (scalars are wrapped)
    pub fn argument_list(&self) -> Vec<Value> {
        match &self.arguments {
            None => Vec::new(),
            Some(Value::Array(items)) => items.clone(),
            Some(value) => vec![value.clone()],
        }
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    pub fn before(&self) -> Option<&Before> {
        self.before.as_ref()
    }

    pub fn after(&self) -> Option<&After> {
        self.after.as_ref()
    }
}

impl fmt::Debug for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invocation")
            .field("method", &self.method)
            .field("arguments", &self.arguments)
            .field("attributes", &self.attributes)
            .field("before", &self.before.as_ref().map(|_| Opaque("before")))
            .field("after", &self.after.as_ref().map(|_| Opaque("after")))
            .finish()
    }
}

/// A reversible action: the pair of undo and redo invocations
///
/// Either side may be missing on input; such a command fails validation
/// and is never replayed.
#[derive(Debug, Clone, Default)]
pub struct Command {
    pub undo: Option<Invocation>,
    pub redo: Option<Invocation>,
}

impl Command {
    pub fn new(undo: Invocation, redo: Invocation) -> Self {
        Self {
            undo: Some(undo),
            redo: Some(redo),
        }
    }

    /// True when both sides are present
    pub fn is_complete(&self) -> bool {
        self.undo.is_some() && self.redo.is_some()
    }
}

/// Command wrapper produced by [`crate::command::adapter::CommandAdapter`]
#[derive(Debug, Clone)]
pub struct Envelope {
    pub command: Command,
}

impl Envelope {
    pub fn new(command: Command) -> Self {
        Self { command }
    }
}

/// Normalized content of one history entry
#[derive(Debug, Clone)]
pub enum Commands {
    Single(Command),
    /// Several commands saved and replayed together
    Batch(Vec<Command>),
}

impl Commands {
    /// Undo invocations in list order, skipping commands without one
    pub fn undo_side(&self) -> Vec<Invocation> {
        self.side(|command| command.undo.as_ref())
    }

    /// Redo invocations in list order, skipping commands without one
    pub fn redo_side(&self) -> Vec<Invocation> {
        self.side(|command| command.redo.as_ref())
    }

    fn side<F>(&self, pick: F) -> Vec<Invocation>
    where
        F: Fn(&Command) -> Option<&Invocation>,
    {
        match self {
            Commands::Single(command) => pick(command).into_iter().cloned().collect(),
            Commands::Batch(commands) => commands.iter().filter_map(pick).cloned().collect(),
        }
    }

    /// Number of commands held
    pub fn len(&self) -> usize {
        match self {
            Commands::Single(_) => 1,
            Commands::Batch(commands) => commands.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Raw input accepted by `save_state`
#[derive(Debug, Clone)]
pub enum Input {
    Command(Command),
    Envelope(Envelope),
    List(Vec<Input>),
    /// The producer refused to build a command
    Rejected,
}

impl From<Command> for Input {
    fn from(command: Command) -> Self {
        Input::Command(command)
    }
}

impl From<Envelope> for Input {
    fn from(envelope: Envelope) -> Self {
        Input::Envelope(envelope)
    }
}

impl From<Option<Envelope>> for Input {
    fn from(envelope: Option<Envelope>) -> Self {
        envelope.map_or(Input::Rejected, Input::Envelope)
    }
}

impl<T: Into<Input>> From<Vec<T>> for Input {
    fn from(items: Vec<T>) -> Self {
        Input::List(items.into_iter().map(Into::into).collect())
    }
}

/// Unwrap envelopes and shape the input into [`Commands`]
///
/// Returns `None` for rejected input. Elements of a list that are neither
/// commands nor envelopes become empty commands, which never validate.
pub fn normalize(input: Input) -> Option<Commands> {
    match input {
        Input::Command(command) => Some(Commands::Single(command)),
        Input::Envelope(envelope) => Some(Commands::Single(envelope.command)),
        Input::List(items) => Some(Commands::Batch(
            items
                .into_iter()
                .map(|item| match item {
                    Input::Command(command) => command,
                    Input::Envelope(envelope) => envelope.command,
                    Input::List(_) | Input::Rejected => Command::default(),
                })
                .collect(),
        )),
        Input::Rejected => None,
    }
}

/// Check that the commands can be saved
///
/// A single command needs both sides. A batch is accepted when at least one
/// of its commands has both sides.
pub fn validate(commands: &Commands) -> bool {
    match commands {
        Commands::Single(command) => command.is_complete(),
        Commands::Batch(commands) => commands.iter().any(Command::is_complete),
    }
}
