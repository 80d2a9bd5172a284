//! Forwarding subsystem.
//!
//! # Data Flow
//! ```text
//! authorized request
//!     → router.rs (classify: API prefix → backend, catch-all → web UI)
//!     → forward.rs (URI rewrite, host rewrite, credential injection)
//!     → hyper client (streaming request/response)
//!     → upgrade.rs (byte tunnel when the upstream answers 101)
//! ```
//!
//! # Design Decisions
//! - The routing table is immutable and shared without locks
//! - Prefix classification is structural: the backend sees the same
//!   logical path it would receive without the gateway
//! - Upstream failures become a 502; no transparent retry at this layer

pub mod forward;
pub mod router;
pub mod upgrade;

pub use forward::{build_client, forward, ForwardClient};
pub use router::{RoutingTable, UpstreamKind};
