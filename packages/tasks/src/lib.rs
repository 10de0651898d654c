//! # Taskhive Tasks
//!
//! Task lifecycle management: creation rules for personal and project
//! tasks, the status/completion/end-date state machine with its due-date
//! guard, and the tiered update/delete authorization.

pub mod manager;

pub use manager::TaskManager;
