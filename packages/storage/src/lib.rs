//! # Taskhive Storage
//!
//! SQLite persistence for the Taskhive workspace: pool bootstrap with
//! embedded migrations, and one storage struct per entity exposing
//! find / find-all / insert / update / delete with the eager relationship
//! loading the detail views depend on.

pub mod db;
pub mod error;
pub mod projects;
pub mod tasks;
pub mod teams;
pub mod users;

pub use db::DbState;
pub use error::{StorageError, StorageResult};
pub use projects::ProjectStorage;
pub use tasks::TaskStorage;
pub use teams::TeamStorage;
pub use users::UserStorage;
