//! Update builder types for entity mutations.
//!
//! Each builder produces an update struct with `Option` fields. Only `Some` fields
//! are applied: for tasks they become SET clauses in a dynamic UPDATE, for
//! review drafts they overwrite the matching draft field.

pub mod capture;
pub mod task;
