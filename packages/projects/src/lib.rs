//! # Taskhive Projects
//!
//! Project and membership management: creation with the system-role gate,
//! membership visibility, role changes under the single-owner invariant,
//! archiving, and deletion with its cascades.

pub mod manager;

pub use manager::ProjectManager;
