//! Observable runtime events
//!
//! Events are explicit and typed; the logger receives their stable names.

use std::fmt;

use super::logger::Severity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    ConfigLoaded,
    ConfigRejected,

    // Cursor lifecycle
    CursorOpen,
    CursorClose,
    /// Cursor entered the terminal state after an unrecoverable error
    CursorDestroyed,
    QueryCanceled,

    // Hierarchical scans
    GroupScanBatch,
    /// Child row whose parent was not observed in the scan
    OrphanRow,

    // Sorting
    SorterSelected,
    SpillRunWritten,
    SpillMergeStart,
    SpillCleanup,
    /// Spill record failed length or value decoding
    SpillCorruption,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::ConfigRejected => "CONFIG_REJECTED",
            Event::CursorOpen => "CURSOR_OPEN",
            Event::CursorClose => "CURSOR_CLOSE",
            Event::CursorDestroyed => "CURSOR_DESTROYED",
            Event::QueryCanceled => "QUERY_CANCELED",
            Event::GroupScanBatch => "GROUP_SCAN_BATCH",
            Event::OrphanRow => "ORPHAN_ROW",
            Event::SorterSelected => "SORTER_SELECTED",
            Event::SpillRunWritten => "SPILL_RUN_WRITTEN",
            Event::SpillMergeStart => "SPILL_MERGE_START",
            Event::SpillCleanup => "SPILL_CLEANUP",
            Event::SpillCorruption => "SPILL_CORRUPTION",
        }
    }

    /// Severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::CursorOpen | Event::CursorClose | Event::GroupScanBatch => Severity::Trace,
            Event::OrphanRow | Event::ConfigRejected | Event::CursorDestroyed => Severity::Warn,
            Event::SpillCorruption => Severity::Fatal,
            _ => Severity::Info,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
