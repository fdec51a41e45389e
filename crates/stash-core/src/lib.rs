//! # stash-core
//!
//! Core types, ID prefixes, and error types for Stash.
//!
//! This crate provides the foundational types shared across all Stash crates:
//! - Entity structs for captures, projects, tasks, and the activity log
//! - Status enums with state machine transitions
//! - The classification result contract shared by every classifier backend
//! - The confidence router that decides between auto-filing and review
//! - ID prefix constants
//! - Cross-cutting error types
//! - CLI response types

pub mod classification;
pub mod entities;
pub mod enums;
pub mod errors;
pub mod ids;
pub mod responses;
pub mod routing;
