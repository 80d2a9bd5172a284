//! Access policy subsystem.
//!
//! # Data Flow
//! ```text
//! Caller (from identity)
//!     → billing.rs (chapter-page paywall: allow / consume / 401 / 402)
//!     → admin.rs   (restricted administrative paths: allow / 403)
//!     → proxy (forwarding)
//! ```
//!
//! # Design Decisions
//! - Stages return tagged decisions; the handler dispatches on the tag
//!   instead of relying on call-chain side effects
//! - The only side effect in this subsystem is the credit debit on
//!   consume-and-allow
//! - Both stages see the same Caller value resolved once per request

pub mod admin;
pub mod billing;

pub use admin::{AdminDecision, RouteAuthorizer};
pub use billing::{BillingDecision, EntitlementGate};
