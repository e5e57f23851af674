//! Decision caching for the authority gateway.
//!
//! ## Architecture
//!
//! - **Persistent backend (Redis)**: survives restarts, native per-key
//!   expiration, shared across instances.
//! - **In-process fallback (DashMap)**: volatile, used only when the
//!   persistent backend cannot be opened at startup.
//!
//! The backend is selected once when the service starts and never
//! re-selected afterward. Callers see a single [`DecisionCache`] type and
//! never need to know which backend is active except for diagnostics.
//!
//! ## Graceful degradation
//!
//! Every backend I/O or codec error is caught, logged, and downgraded to a
//! cache miss (reads) or a no-op (writes). A cache fault never fails an
//! authorization request.

pub mod backend;
pub mod entry;
pub mod error;
pub mod key;

pub use backend::{CacheStats, DecisionCache};
pub use entry::{CacheEntry, DEFAULT_TTL};
pub use error::CacheError;
pub use key::{decision_key, principal_prefix};
