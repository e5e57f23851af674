//! Stateless decision engine for the authority gateway.
//!
//! The engine evaluates a closed, enumerable rule table against an
//! [`AccessCheck`] and returns a [`Decision`]. It performs no I/O, holds no
//! state, and is deterministic for identical inputs; only the timing
//! metadata varies between calls.
//!
//! [`AccessCheck`]: authority_core::AccessCheck
//! [`Decision`]: authority_core::Decision

pub mod rules;

pub use rules::decide;
