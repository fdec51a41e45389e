//! Repository modules implementing the store operations for all Stash entities.
//!
//! Each module adds methods to `StashService` via `impl StashService` blocks.
//! `filing` holds the saga steps that pair an entity write with the capture's
//! progress marker in one transaction.

pub mod activity;
pub mod capture;
pub mod filing;
pub mod project;
pub mod task;
