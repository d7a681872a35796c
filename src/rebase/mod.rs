pub mod bundle;
pub mod rebaser;
pub mod timestamp;

pub use bundle::{LogBundle, LogEntry};
pub use rebaser::{default_output_path, rebase, rebase_with_clock, RebaseError, RebaseSummary};
pub use timestamp::{
    Clock, FixedClock, Minima, OffsetError, Offsets, SystemClock, TimestampField, UnixNanos,
};
