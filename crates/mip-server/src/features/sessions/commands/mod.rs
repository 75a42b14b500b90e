//! Session state machine commands

pub mod finalize;
pub mod mark_stale;

pub use finalize::FinalizeSessionCommand;
pub use mark_stale::MarkStaleCommand;
