//! Criteria-based service resolution.
//!
//! A [`Resolver`] answers "which service should this requester get?" against a live
//! [`ServiceRegistry`](sift_registry::ServiceRegistry):
//!
//! 1. [`SelectionCriteria`] are validated and compiled up front ([`CompiledCriteria`]).
//! 2. The registry is queried with the composed filter, in ranking order.
//! 3. Candidates pass through the module, capability-tag and type filters.
//! 4. The selection policy picks the result shape: absent, one service, or all of them.
//!
//! A tracked request stays live: the requester is notified whenever a registry event
//! touches the set of services its criteria select, and is expected to resolve again.

/// Selection criteria, their builder and TOML loading.
pub mod criteria;
/// Configuration and resolution errors.
pub mod error;
/// Registry query step.
mod gateway;
/// Candidate post-filters.
pub mod pipeline;
/// Requester identity and notification hook.
pub mod requester;
/// The resolve entry point.
pub mod resolve;
/// Result shape policy.
pub mod selection;
/// Per-requester change listeners.
pub mod subscriptions;

pub use criteria::{CompiledCriteria, CriteriaBuilder, CriteriaSet, CustomPredicate, SelectionCriteria};
pub use error::{ConfigError, ResolveError, Result};
pub use requester::{Requester, RequesterId};
pub use resolve::{ResolveRequest, Resolved, Resolver};
pub use selection::{SelectionMode, Shape};
pub use subscriptions::Subscriptions;
