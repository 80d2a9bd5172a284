//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → loader.rs (environment overrides: PORT, SUWAYOMI_URL, ...)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → shared via Arc to all subsystems
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the routing table, restricted path
//!   set, and extension list never change after process start
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::GatewayConfig;
pub use schema::IdentityConfig;
pub use schema::InstallerConfig;
pub use schema::ObservabilityConfig;
pub use schema::PolicyConfig;
pub use schema::ServiceAuthConfig;
pub use schema::UpstreamConfig;
