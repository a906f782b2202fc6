// History storage
//
// - LimitedBuffer: fixed-capacity ordered storage, evicting the oldest element
// - HistoryEntry: one saved action plus its completion hooks

pub mod buffer;
pub mod entry;

pub use buffer::{BufferError, LimitedBuffer};
pub use entry::HistoryEntry;
