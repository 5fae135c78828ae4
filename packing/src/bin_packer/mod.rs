//! Bin Packer
//!
//! Assigns extracted files to word-limited buckets.

pub mod packer;
pub mod sink;

pub use packer::{pack, PackLimits, PackOutcome, Packer};
pub use sink::{Assignment, AssignmentSink, NoopSink};
