//! Caller identity subsystem.
//!
//! # Data Flow
//! ```text
//! inbound Authorization header
//!     → resolver.rs (extract Bearer token)
//!     → store.rs (verify token → account id)
//!     → store.rs (read profile row: role, credits, is_premium)
//!     → Caller (Known context or Anonymous marker)
//!     → policy stages (billing, admin)
//! ```
//!
//! # Design Decisions
//! - Resolution never fails a request: invalid tokens, timeouts, and store
//!   outages all degrade to Anonymous
//! - Identity is resolved exactly once per request; later stages receive
//!   the same Caller value
//! - The AccountStore trait is the injection seam for tests

pub mod resolver;
pub mod store;

pub use resolver::{Caller, CallerContext, IdentityResolver};
pub use store::{AccountStore, HttpAccountStore, Profile, Role, StoreError};
