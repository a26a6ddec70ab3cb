pub mod line_writer;
pub mod report;

pub use line_writer::{resolve_target, LineWriter, WrittenOutput};
pub use report::{GeneratedFile, MoveRecord, RunReport, SkipReason, SkippedFile};
