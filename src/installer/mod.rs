//! Bootstrap extension installer.
//!
//! # Data Flow
//! ```text
//! process start (after the listener binds)
//!     → machine.rs WAITING_FOR_SERVER (poll readiness, bounded budget)
//!     → settle delay (repository sync)
//!     → machine.rs INSTALLING (per-package bounded retries)
//!     → DONE | TIMED_OUT (logged, never client-visible)
//! ```
//!
//! # Design Decisions
//! - Explicit finite state machine instead of nested timed loops
//! - Clock and backend are trait seams; unit tests drive the machine with
//!   zero real time
//! - Best-effort: no terminal phase is an error, nothing here can crash
//!   the gateway or block request handling

pub mod backend;
pub mod machine;

pub use backend::HttpExtensionBackend;
pub use machine::{Clock, ExtensionBackend, InstallOutcome, Installer, InstallerPhase, TokioClock};
