//! Per-frame entity render records.
//!
//! Responsibilities:
//! - define the read-only projections of host scene state the programs
//!   consume (the host's entity store itself lives outside this crate)
//! - keep the records plain data so a frame's `process` loop stays a pure
//!   sequence of buffer writes

mod records;

pub use records::{EdgeDisplayData, EdgeGeometry, NodeDisplayData};
