//! Non-volatile storage sequencing

pub mod sequencer;

pub use sequencer::{JobId, PagedWriter, WriteError, WriteState, WriteStatus, SETTLE_MS};
