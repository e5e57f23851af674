//! Core types shared across the authority gateway.
//!
//! This crate defines the [`Decision`] produced by the decision engine and
//! rewritten by the cache layer on hits, and the [`AccessCheck`] input that
//! the engine evaluates. It performs no I/O.

pub mod check;
pub mod decision;

pub use check::{AccessCheck, Context, roles};
pub use decision::{CacheSource, Decision, DecisionMetadata};
