//! The observation lifecycle engine: creation with automatic deadline
//! assignment, status transitions, attachment accounting under the batch
//! size cap, and the append-only audit trail, all gated by role policy.

pub mod domain;
pub mod inbound;
pub mod outbound;
