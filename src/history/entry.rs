// HistoryEntry - one saved action

use crate::command::descriptor::Commands;
use crate::command::trait_def::{AfterAll, Opaque};
use chrono::{DateTime, Utc};
use std::fmt;
use uuid::Uuid;

/// A saved action with its optional completion hooks
///
/// Entries are immutable; they leave the history only through branch
/// truncation, eviction or reset.
pub struct HistoryEntry {
    id: Uuid,
    recorded_at: DateTime<Utc>,
    commands: Commands,
    after_all_undo: Option<AfterAll>,
    after_all_redo: Option<AfterAll>,
}

impl HistoryEntry {
    pub fn new(
        commands: Commands,
        after_all_undo: Option<AfterAll>,
        after_all_redo: Option<AfterAll>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            recorded_at: Utc::now(),
            commands,
            after_all_undo,
            after_all_redo,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }

    pub fn commands(&self) -> &Commands {
        &self.commands
    }

    pub fn after_all_undo(&self) -> Option<&AfterAll> {
        self.after_all_undo.as_ref()
    }

    pub fn after_all_redo(&self) -> Option<&AfterAll> {
        self.after_all_redo.as_ref()
    }
}

impl fmt::Debug for HistoryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HistoryEntry")
            .field("id", &self.id)
            .field("recorded_at", &self.recorded_at)
            .field("commands", &self.commands)
            .field(
                "after_all_undo",
                &self.after_all_undo.as_ref().map(|_| Opaque("hook")),
            )
            .field(
                "after_all_redo",
                &self.after_all_redo.as_ref().map(|_| Opaque("hook")),
            )
            .finish()
    }
}
