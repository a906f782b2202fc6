// CommandManager - bounded undo/redo history

use crate::command::descriptor::{Commands, Input, Invocation, normalize, validate};
use crate::command::instance::{FnRegistry, Instance, InstanceRegistry};
use crate::command::pipeline::{Pipeline, Replay, RunReport};
use crate::command::trait_def::{AfterAll, CommandError};
use crate::config::HistoryConfig;
use crate::history::{BufferError, HistoryEntry, LimitedBuffer};
use crate::logging::{Level, NoopLogger, SharedLogger, default_logger, log};
use serde_json::Value;
use std::sync::Arc;

/// Hook receiving the new pointer value
pub type IndexHook = Box<dyn Fn(usize) + Send + Sync>;

/// Hook receiving `(prev_index, prev_length, current_index, current_length)`
/// after redoable entries were discarded
pub type RemoveHook = Box<dyn Fn(usize, usize, usize, usize) + Send + Sync>;

/// Errors returned by undo and redo
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HistoryError {
    #[error("Nothing to undo")]
    NothingToUndo,

    #[error("Nothing to redo")]
    NothingToRedo,

    #[error("Requested {requested} steps but only {available} available")]
    OutOfRange { requested: usize, available: usize },

    #[error("Middleware failed: {0}")]
    Middleware(CommandError),

    #[error("Completion hook failed: {0}")]
    Hook(CommandError),

    #[error(transparent)]
    Buffer(#[from] BufferError),
}

#[derive(Default)]
struct Hooks {
    on_increment: Option<IndexHook>,
    on_decrement: Option<IndexHook>,
    on_remove_first: Option<RemoveHook>,
}

/// Manages the history buffer and the position pointer
///
/// `index` counts the entries currently applied: entries below it can be
/// undone, entries at or above it can be redone. Saving a new action drops
/// every redoable entry first, so after a save `index == len`.
///
/// Undo and redo are async because replayed operations may be. The manager
/// is not reentrant: callers must not start a second undo or redo before the
/// previous one finished.
pub struct CommandManager {
    buffer: LimitedBuffer<HistoryEntry>,
    index: usize,
    all_actions: u64,
    pipeline: Pipeline,
    hooks: Hooks,
    logger: SharedLogger,
}

impl CommandManager {
    /// Create a manager with the default configuration
    pub fn new() -> Self {
        Self::builder(HistoryConfig::default()).build()
    }

    /// Create a manager keeping at most `limit` entries
    pub fn with_capacity(limit: usize) -> Self {
        Self::builder(HistoryConfig::with_limit(limit)).build()
    }

    pub fn builder(config: HistoryConfig) -> CommandManagerBuilder {
        CommandManagerBuilder::new(config)
    }

    /// Record a new action
    ///
    /// Returns `Some(true)` if the oldest entry had to be evicted,
    /// `Some(false)` otherwise, and `None` if the input was rejected, in which
    /// case the history is untouched.
    pub fn save_state(
        &mut self,
        input: impl Into<Input>,
        after_all_undo: Option<AfterAll>,
        after_all_redo: Option<AfterAll>,
    ) -> Option<bool> {
        let commands: Commands = match normalize(input.into()) {
            Some(commands) if validate(&commands) => commands,
            other => {
                let shown = other.map_or_else(|| "false".to_string(), |c| format!("{:?}", c));
                self.log(
                    Level::Error,
                    &format!("StateManager.saveState|Invalid commands object - \"{}\"", shown),
                );
                return None;
            }
        };

        self.truncate_redoable();
        self.all_actions += 1;
        self.increment_index();

        let entry = HistoryEntry::new(commands, after_all_undo, after_all_redo);
        let entry_id = entry.id();
        let evicted = self.buffer.add(entry);

        // The oldest entry is gone, shift the pointer with the indices
        if evicted {
            self.decrement_index();
        }

        self.log(
            Level::Info,
            &format!(
                "StateManager.saveState|saved {}{}",
                entry_id,
                if evicted { " first item deleted" } else { "" }
            ),
        );

        Some(evicted)
    }

    /// Undo one entry, or `steps` entries (absolute value)
    ///
    /// Undo operations run newest first. `afterAllUndo` hooks run once all
    /// operations finished. Failing operations are reported in the returned
    /// [`RunReport`] and do not fail the call.
    pub async fn undo(&mut self, steps: Option<isize>) -> Result<RunReport, HistoryError> {
        let count = match normalize_steps(steps) {
            None if self.index == 0 => return Err(HistoryError::NothingToUndo),
            None => 1,
            Some(_) if self.index == 0 => return Err(HistoryError::NothingToUndo),
            Some(requested) if requested > self.index => {
                return Err(HistoryError::OutOfRange {
                    requested,
                    available: self.index,
                });
            }
            Some(requested) => requested,
        };

        let mut batches = Vec::with_capacity(count);
        let mut hooks = Vec::new();

        for _ in 0..count {
            self.decrement_index();
            let entry = self.buffer.at(self.index)?;
            batches.push(entry.commands().undo_side());
            if let Some(hook) = entry.after_all_undo() {
                hooks.push(Arc::clone(hook));
            }
        }

        self.replay(batches, hooks).await
    }

    /// Redo one entry, or `steps` entries (absolute value)
    pub async fn redo(&mut self, steps: Option<isize>) -> Result<RunReport, HistoryError> {
        let available = self.redo_count();
        let count = match normalize_steps(steps) {
            _ if available == 0 => return Err(HistoryError::NothingToRedo),
            None => 1,
            Some(requested) if requested > available => {
                return Err(HistoryError::OutOfRange {
                    requested,
                    available,
                });
            }
            Some(requested) => requested,
        };

        let mut batches = Vec::with_capacity(count);
        let mut hooks = Vec::new();

        for _ in 0..count {
            let entry = self.buffer.at(self.index)?;
            batches.push(entry.commands().redo_side());
            if let Some(hook) = entry.after_all_redo() {
                hooks.push(Arc::clone(hook));
            }
            self.increment_index();
        }

        self.replay(batches, hooks).await
    }

    /// Drop all history
    pub fn reset(&mut self) {
        self.log(Level::Info, "StateManager.stack|Reset stack");
        self.index = 0;
        self.buffer.reset();
    }

    /// Number of saves and replays since construction
    pub fn all_actions_counter(&self) -> u64 {
        self.all_actions
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.buffer.limit()
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index < self.buffer.len()
    }

    /// Entries that can be undone
    pub fn undo_count(&self) -> usize {
        self.index
    }

    /// Entries that can be redone
    pub fn redo_count(&self) -> usize {
        self.buffer.len() - self.index
    }

    pub fn entry(&self, index: usize) -> Result<&HistoryEntry, BufferError> {
        self.buffer.at(index)
    }

    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.buffer.iter()
    }

    /// Discard redoable entries before a new action is recorded
    fn truncate_redoable(&mut self) {
        let prev_length = self.buffer.len();
        if self.index == prev_length {
            return;
        }

        self.log(
            Level::Info,
            "StateManager.stack|Stack overflow, next items will be deleted",
        );

        let prev_index = self.index;
        self.buffer.splice(self.index, prev_length);
        self.index = self.buffer.len();

        if let Some(hook) = &self.hooks.on_remove_first {
            hook(prev_index, prev_length, self.index, self.buffer.len());
        }
    }

    async fn replay(
        &mut self,
        batches: Vec<Vec<Invocation>>,
        hooks: Vec<AfterAll>,
    ) -> Result<RunReport, HistoryError> {
        self.all_actions += 1;

        let report = self
            .pipeline
            .run(Replay::Batches(batches))
            .await
            .map_err(HistoryError::Middleware)?;

        for hook in hooks {
            if let Err(err) = hook().await {
                self.log(
                    Level::Error,
                    &format!("StateManager.afterAll|{}", err),
                );
                return Err(HistoryError::Hook(err));
            }
        }

        Ok(report)
    }

    fn increment_index(&mut self) {
        self.index += 1;
        if let Some(hook) = &self.hooks.on_increment {
            hook(self.index);
        }
    }

    fn decrement_index(&mut self) {
        self.index -= 1;
        if let Some(hook) = &self.hooks.on_decrement {
            hook(self.index);
        }
    }

    fn log(&self, level: Level, message: &str) {
        log(self.logger.as_ref(), level, message);
    }
}

impl Default for CommandManager {
    fn default() -> Self {
        Self::new()
    }
}

/// `Some(0)` means the same as no count
fn normalize_steps(steps: Option<isize>) -> Option<usize> {
    steps.map(isize::unsigned_abs).filter(|steps| *steps > 0)
}

/// Wires collaborators into a [`CommandManager`]
pub struct CommandManagerBuilder {
    config: HistoryConfig,
    registry: Option<Arc<dyn InstanceRegistry>>,
    hooks: Hooks,
    logger: Option<SharedLogger>,
}

impl CommandManagerBuilder {
    pub fn new(config: HistoryConfig) -> Self {
        Self {
            config,
            registry: None,
            hooks: Hooks::default(),
            logger: None,
        }
    }

    /// Registry used to resolve invocations that name a method
    pub fn registry(mut self, registry: Arc<dyn InstanceRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Closure form of [`Self::registry`]
    pub fn get_instance<F>(self, lookup: F) -> Self
    where
        F: Fn(Option<&Value>) -> Option<Arc<dyn Instance>> + Send + Sync + 'static,
    {
        self.registry(Arc::new(FnRegistry(lookup)))
    }

    pub fn on_increment<F>(mut self, hook: F) -> Self
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.hooks.on_increment = Some(Box::new(hook));
        self
    }

    pub fn on_decrement<F>(mut self, hook: F) -> Self
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.hooks.on_decrement = Some(Box::new(hook));
        self
    }

    pub fn on_remove_first<F>(mut self, hook: F) -> Self
    where
        F: Fn(usize, usize, usize, usize) + Send + Sync + 'static,
    {
        self.hooks.on_remove_first = Some(Box::new(hook));
        self
    }

    pub fn logger(mut self, logger: SharedLogger) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Silence all diagnostics
    pub fn without_logging(self) -> Self {
        self.logger(Arc::new(NoopLogger))
    }

    pub fn build(self) -> CommandManager {
        let logger = self.logger.unwrap_or_else(default_logger);

        CommandManager {
            buffer: LimitedBuffer::new(self.config.effective_limit()),
            index: 0,
            all_actions: 0,
            pipeline: Pipeline::new(self.config.id_field, self.registry, Arc::clone(&logger)),
            hooks: self.hooks,
            logger,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::descriptor::Command;
    use crate::command::trait_def::{after_all, sync_after_all, sync_operation};
    use crate::logging::MemoryLogger;
    use futures::executor::block_on;
    use std::sync::Mutex;

    type Journal = Arc<Mutex<Vec<String>>>;

    // Command whose sides append "<tag>:undo" / "<tag>:redo" to the journal
    fn mock_command(journal: &Journal, tag: &str) -> Command {
        let side = |action: &str| {
            let journal = Arc::clone(journal);
            let line = format!("{}:{}", tag, action);
            Invocation::call(sync_operation(move |_args| {
                journal.lock().unwrap().push(line.clone());
                Ok(Value::Null)
            }))
        };
        Command::new(side("undo"), side("redo"))
    }

    fn quiet_manager(limit: usize) -> CommandManager {
        CommandManager::builder(HistoryConfig::with_limit(limit))
            .without_logging()
            .build()
    }

    #[test]
    fn test_save_state() {
        let journal: Journal = Arc::default();
        let mut manager = quiet_manager(10);

        assert_eq!(manager.save_state(mock_command(&journal, "a"), None, None), Some(false));

        assert_eq!(manager.index(), 1);
        assert_eq!(manager.len(), 1);
        assert!(manager.can_undo());
        assert!(!manager.can_redo());
        // Saving never runs the command
        assert!(journal.lock().unwrap().is_empty());
    }

    #[test]
    fn test_undo() {
        let journal: Journal = Arc::default();
        let mut manager = quiet_manager(10);
        manager.save_state(mock_command(&journal, "a"), None, None);

        let report = block_on(manager.undo(None)).unwrap();

        assert_eq!(report.executed, 1);
        assert_eq!(*journal.lock().unwrap(), vec!["a:undo"]);
        assert_eq!(manager.undo_count(), 0);
        assert_eq!(manager.redo_count(), 1);
    }

    #[test]
    fn test_redo() {
        let journal: Journal = Arc::default();
        let mut manager = quiet_manager(10);
        manager.save_state(mock_command(&journal, "a"), None, None);
        block_on(manager.undo(None)).unwrap();

        block_on(manager.redo(None)).unwrap();

        assert_eq!(*journal.lock().unwrap(), vec!["a:undo", "a:redo"]);
        assert_eq!(manager.undo_count(), 1);
        assert_eq!(manager.redo_count(), 0);
    }

    #[test]
    fn test_redo_stack_cleared_on_new_command() {
        let journal: Journal = Arc::default();
        let removed: Arc<Mutex<Vec<(usize, usize, usize, usize)>>> = Arc::default();
        let captured = Arc::clone(&removed);
        let mut manager = CommandManager::builder(HistoryConfig::default())
            .without_logging()
            .on_remove_first(move |a, b, c, d| captured.lock().unwrap().push((a, b, c, d)))
            .build();

        manager.save_state(mock_command(&journal, "a"), None, None);
        manager.save_state(mock_command(&journal, "b"), None, None);
        block_on(manager.undo(None)).unwrap();
        manager.save_state(mock_command(&journal, "c"), None, None);

        assert!(!manager.can_redo());
        assert_eq!(manager.len(), 2);
        assert_eq!(manager.index(), 2);
        assert_eq!(*removed.lock().unwrap(), vec![(1, 2, 1, 1)]);

        block_on(manager.undo(None)).unwrap();
        block_on(manager.undo(None)).unwrap();
        assert_eq!(
            *journal.lock().unwrap(),
            vec!["b:undo", "c:undo", "a:undo"]
        );
    }

    #[test]
    fn test_history_limit() {
        let journal: Journal = Arc::default();
        let mut manager = quiet_manager(3);

        let evictions: Vec<_> = (0..5)
            .map(|i| manager.save_state(mock_command(&journal, &i.to_string()), None, None))
            .collect();

        assert_eq!(
            evictions,
            vec![Some(false), Some(false), Some(false), Some(true), Some(true)]
        );
        assert_eq!(manager.len(), 3);
        assert_eq!(manager.undo_count(), 3);
    }

    #[test]
    fn test_undo_with_empty_stack() {
        let mut manager = quiet_manager(10);
        assert_eq!(block_on(manager.undo(None)), Err(HistoryError::NothingToUndo));
        assert_eq!(block_on(manager.undo(Some(2))), Err(HistoryError::NothingToUndo));
        assert_eq!(manager.all_actions_counter(), 0);
    }

    #[test]
    fn test_redo_with_empty_stack() {
        let journal: Journal = Arc::default();
        let mut manager = quiet_manager(10);
        assert_eq!(block_on(manager.redo(None)), Err(HistoryError::NothingToRedo));

        manager.save_state(mock_command(&journal, "a"), None, None);
        assert_eq!(block_on(manager.redo(None)), Err(HistoryError::NothingToRedo));
    }

    #[test]
    fn test_invalid_command_is_rejected() {
        let logger = Arc::new(MemoryLogger::new());
        let mut manager = CommandManager::builder(HistoryConfig::default())
            .logger(logger.clone())
            .build();

        let partial = Command {
            undo: Some(Invocation::named("x")),
            redo: None,
        };

        assert_eq!(manager.save_state(partial, None, None), None);
        assert_eq!(manager.save_state(Input::Rejected, None, None), None);
        assert_eq!(manager.len(), 0);
        assert_eq!(manager.index(), 0);
        assert_eq!(manager.all_actions_counter(), 0);

        let errors = logger.messages(Level::Error);
        assert_eq!(errors.len(), 2);
        assert!(errors[0].starts_with("StateManager.saveState|Invalid commands object"));
        assert!(errors[1].ends_with("\"false\""));
    }

    #[test]
    fn test_steps_undo_and_redo() {
        let journal: Journal = Arc::default();
        let mut manager = quiet_manager(10);
        for tag in ["a", "b", "c"] {
            manager.save_state(mock_command(&journal, tag), None, None);
        }

        // Negative counts use their absolute value
        block_on(manager.undo(Some(-2))).unwrap();
        assert_eq!(manager.index(), 1);

        block_on(manager.redo(Some(2))).unwrap();
        assert_eq!(manager.index(), 3);

        assert_eq!(
            *journal.lock().unwrap(),
            vec!["c:undo", "b:undo", "b:redo", "c:redo"]
        );
    }

    #[test]
    fn test_steps_out_of_range_leaves_pointer() {
        let journal: Journal = Arc::default();
        let mut manager = quiet_manager(10);
        manager.save_state(mock_command(&journal, "a"), None, None);
        manager.save_state(mock_command(&journal, "b"), None, None);

        assert_eq!(
            block_on(manager.undo(Some(3))),
            Err(HistoryError::OutOfRange { requested: 3, available: 2 })
        );
        assert_eq!(manager.index(), 2);

        block_on(manager.undo(Some(1))).unwrap();
        assert_eq!(
            block_on(manager.redo(Some(2))),
            Err(HistoryError::OutOfRange { requested: 2, available: 1 })
        );
        assert_eq!(manager.index(), 1);
    }

    #[test]
    fn test_zero_steps_means_one() {
        let journal: Journal = Arc::default();
        let mut manager = quiet_manager(10);
        manager.save_state(mock_command(&journal, "a"), None, None);
        manager.save_state(mock_command(&journal, "b"), None, None);

        block_on(manager.undo(Some(0))).unwrap();
        assert_eq!(manager.index(), 1);
    }

    #[test]
    fn test_index_hooks_follow_eviction() {
        let journal: Journal = Arc::default();
        let increments: Arc<Mutex<Vec<usize>>> = Arc::default();
        let decrements: Arc<Mutex<Vec<usize>>> = Arc::default();
        let (inc, dec) = (Arc::clone(&increments), Arc::clone(&decrements));

        let mut manager = CommandManager::builder(HistoryConfig::with_limit(2))
            .without_logging()
            .on_increment(move |index| inc.lock().unwrap().push(index))
            .on_decrement(move |index| dec.lock().unwrap().push(index))
            .build();

        for tag in ["a", "b", "c"] {
            manager.save_state(mock_command(&journal, tag), None, None);
        }
        block_on(manager.undo(None)).unwrap();

        assert_eq!(*increments.lock().unwrap(), vec![1, 2, 3]);
        assert_eq!(*decrements.lock().unwrap(), vec![2, 1]);
    }

    #[test]
    fn test_batch_entry_runs_in_order() {
        let journal: Journal = Arc::default();
        let mut manager = quiet_manager(10);
        let batch = vec![mock_command(&journal, "x"), mock_command(&journal, "y")];
        manager.save_state(batch, None, None);

        block_on(manager.undo(None)).unwrap();
        block_on(manager.redo(None)).unwrap();

        assert_eq!(
            *journal.lock().unwrap(),
            vec!["x:undo", "y:undo", "x:redo", "y:redo"]
        );
    }

    #[test]
    fn test_after_all_hooks_run_after_operations() {
        let journal: Journal = Arc::default();
        let mut manager = quiet_manager(10);

        let hook = |name: &'static str| {
            let journal = Arc::clone(&journal);
            sync_after_all(move || journal.lock().unwrap().push(name.to_string()))
        };

        manager.save_state(
            mock_command(&journal, "a"),
            Some(hook("a:after-undo")),
            Some(hook("a:after-redo")),
        );
        manager.save_state(mock_command(&journal, "b"), Some(hook("b:after-undo")), None);

        block_on(manager.undo(Some(2))).unwrap();
        block_on(manager.redo(Some(2))).unwrap();

        assert_eq!(
            *journal.lock().unwrap(),
            vec![
                "b:undo",
                "a:undo",
                "b:after-undo",
                "a:after-undo",
                "a:redo",
                "b:redo",
                "a:after-redo",
            ]
        );
    }

    #[test]
    fn test_failing_hook_stops_chain() {
        let journal: Journal = Arc::default();
        let mut manager = quiet_manager(10);

        let failing = after_all(|| async { Err(CommandError::from("hook broke")) });
        let tail = {
            let journal = Arc::clone(&journal);
            sync_after_all(move || journal.lock().unwrap().push("tail".into()))
        };

        manager.save_state(mock_command(&journal, "a"), Some(tail), None);
        manager.save_state(mock_command(&journal, "b"), Some(failing), None);

        let result = block_on(manager.undo(Some(2)));

        assert_eq!(
            result,
            Err(HistoryError::Hook(CommandError::Failed("hook broke".into())))
        );
        // Pointer is not rolled back and the later hook never ran
        assert_eq!(manager.index(), 0);
        assert_eq!(*journal.lock().unwrap(), vec!["b:undo", "a:undo"]);
    }

    #[test]
    fn test_reset() {
        let journal: Journal = Arc::default();
        let mut manager = quiet_manager(10);
        manager.save_state(mock_command(&journal, "a"), None, None);
        manager.save_state(mock_command(&journal, "b"), None, None);
        block_on(manager.undo(None)).unwrap();

        manager.reset();

        assert_eq!(manager.index(), 0);
        assert_eq!(manager.len(), 0);
        assert!(!manager.can_undo());
        assert!(!manager.can_redo());
    }

    #[test]
    fn test_all_actions_counter() {
        let journal: Journal = Arc::default();
        let mut manager = quiet_manager(10);

        manager.save_state(mock_command(&journal, "a"), None, None);
        assert_eq!(manager.all_actions_counter(), 1);

        block_on(manager.undo(None)).unwrap();
        assert_eq!(manager.all_actions_counter(), 2);

        block_on(manager.redo(None)).unwrap();
        assert_eq!(manager.all_actions_counter(), 3);

        manager.reset();
        assert_eq!(manager.all_actions_counter(), 3);
    }

    #[test]
    fn test_zero_limit_uses_default() {
        let manager = quiet_manager(0);
        assert_eq!(manager.limit(), 10);
    }
}
