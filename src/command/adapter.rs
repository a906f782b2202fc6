// CommandAdapter - turns a mutating method into a recordable command
//
// The adapter holds two transforms mapping the "previous" and "next" values
// of a change to undo and redo invocations. Wrapping a method hands it a
// Recorder that applies those transforms and fills in the method name, so the
// resulting invocations call the same method back through the registry.

use crate::command::descriptor::{Command, Envelope, Invocation, Method};
use crate::logging::{Level, SharedLogger, default_logger, log};
use serde_json::Value;
use std::sync::Arc;

const INVALID_ADAPTER: &str = "Editor.extends.stateManager|This is not valid StateManager object";

/// Maps a value captured at call time to an invocation
pub type Transform = Arc<dyn Fn(Value) -> Invocation + Send + Sync>;

/// Builds envelopes for methods whose changes should be undoable
#[derive(Clone)]
pub struct CommandAdapter {
    undo: Option<Transform>,
    redo: Option<Transform>,
    logger: SharedLogger,
}

impl CommandAdapter {
    pub fn builder() -> CommandAdapterBuilder {
        CommandAdapterBuilder::default()
    }

    /// True when both transforms are configured
    pub fn is_valid(&self) -> bool {
        self.undo.is_some() && self.redo.is_some()
    }

    /// Recorder bound to `method`, or `None` for a misconfigured adapter
    pub fn recorder(&self, method: impl Into<String>) -> Option<Recorder> {
        match (&self.undo, &self.redo) {
            (Some(undo), Some(redo)) => Some(Recorder {
                undo: Arc::clone(undo),
                redo: Arc::clone(redo),
                method: method.into(),
            }),
            _ => {
                log(self.logger.as_ref(), Level::Error, INVALID_ADAPTER);
                None
            }
        }
    }

    /// Wrap `body` so it receives a [`Recorder`] for `method`
    ///
    /// The wrapped closure returns whatever envelope `body` produced. With a
    /// misconfigured adapter it logs an error and returns `None` without
    /// running `body`.
    pub fn wrap<A, F>(
        &self,
        method: &str,
        body: F,
    ) -> impl Fn(A) -> Option<Envelope> + Send + Sync + use<A, F>
    where
        F: Fn(A, &Recorder) -> Option<Envelope> + Send + Sync + 'static,
    {
        let adapter = self.clone();
        let method = method.to_string();

        move |args: A| {
            let recorder = adapter.recorder(method.as_str())?;
            body(args, &recorder)
        }
    }
}

/// Produces envelopes for one wrapped method
pub struct Recorder {
    undo: Transform,
    redo: Transform,
    method: String,
}

impl Recorder {
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Build the envelope for a change from `prev` to `next`
    ///
    /// Invocations without a method call the wrapped method by name. Returns
    /// `None` if a side still has no method.
    pub fn record(&self, prev: Value, next: Value) -> Option<Envelope> {
        let mut undo = (self.undo)(prev);
        let mut redo = (self.redo)(next);

        if !self.method.is_empty() {
            undo.set_method_if_missing(Method::Named(self.method.clone()));
            redo.set_method_if_missing(Method::Named(self.method.clone()));
        }

        if undo.method().is_none() || redo.method().is_none() {
            return None;
        }

        Some(Envelope::new(Command::new(undo, redo)))
    }
}

#[derive(Default)]
pub struct CommandAdapterBuilder {
    undo: Option<Transform>,
    redo: Option<Transform>,
    logger: Option<SharedLogger>,
}

impl CommandAdapterBuilder {
    /// Undo transform returning the arguments for the undo call
    pub fn undo<F>(self, f: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.undo_invocation(move |value| Invocation::with_only_arguments(f(value)))
    }

    /// Undo transform returning a full invocation
    pub fn undo_invocation<F>(mut self, f: F) -> Self
    where
        F: Fn(Value) -> Invocation + Send + Sync + 'static,
    {
        self.undo = Some(Arc::new(f));
        self
    }

    /// Redo transform returning the arguments for the redo call
    pub fn redo<F>(self, f: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.redo_invocation(move |value| Invocation::with_only_arguments(f(value)))
    }

    /// Redo transform returning a full invocation
    pub fn redo_invocation<F>(mut self, f: F) -> Self
    where
        F: Fn(Value) -> Invocation + Send + Sync + 'static,
    {
        self.redo = Some(Arc::new(f));
        self
    }

    pub fn logger(mut self, logger: SharedLogger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn build(self) -> CommandAdapter {
        let adapter = CommandAdapter {
            undo: self.undo,
            redo: self.redo,
            logger: self.logger.unwrap_or_else(default_logger),
        };

        if !adapter.is_valid() {
            log(adapter.logger.as_ref(), Level::Error, INVALID_ADAPTER);
        }

        adapter
    }
}
