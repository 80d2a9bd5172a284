//! Bootstrap installer state machine.
//!
//! `WAITING_FOR_SERVER → INSTALLING → DONE`, terminal `TIMED_OUT`. Runs
//! once per process start as a background task; best-effort by contract,
//! so no state here can fail the gateway. All waits go through the
//! injected [`Clock`], which keeps the machine testable without real time.

use std::time::Duration;

use async_trait::async_trait;

use crate::config::InstallerConfig;
use crate::observability::metrics;

/// Installer lifecycle phase. `run` returns the terminal phase reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallerPhase {
    WaitingForServer,
    Installing,
    Done,
    TimedOut,
}

/// Outcome of a single install attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    Installed,
    /// The backend's extension repository has not synced the package yet;
    /// the only outcome that earns a retry.
    NotFoundYet,
    /// Any other failure; aborts retries for this package.
    Failed(String),
}

/// Time source seam. Production uses [`TokioClock`]; tests inject a
/// recording clock that returns immediately.
#[async_trait]
pub trait Clock: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Real clock backed by `tokio::time::sleep`.
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Backend operations the installer needs: a readiness probe and a
/// per-package install call.
#[async_trait]
pub trait ExtensionBackend: Send + Sync {
    /// True once the backend answers its health endpoint. Connection
    /// errors are "not ready yet", never failures.
    async fn is_ready(&self) -> bool;

    /// Attempt to install one extension package.
    async fn install(&self, pkg: &str) -> InstallOutcome;
}

/// The bootstrap installer.
pub struct Installer<B, C> {
    backend: B,
    clock: C,
    config: InstallerConfig,
}

impl<B: ExtensionBackend, C: Clock> Installer<B, C> {
    pub fn new(backend: B, clock: C, config: InstallerConfig) -> Self {
        Self {
            backend,
            clock,
            config,
        }
    }

    /// Drive the machine to a terminal phase. Never returns an error:
    /// outcomes are reported through logs and metrics only.
    pub async fn run(&self) -> InstallerPhase {
        if self.config.extensions.is_empty() {
            tracing::info!("no extensions configured, installer idle");
            return InstallerPhase::Done;
        }

        tracing::info!(
            extensions = self.config.extensions.len(),
            "waiting for backend to become ready"
        );

        match self.wait_for_server().await {
            InstallerPhase::Installing => self.install_all().await,
            phase => phase,
        }
    }

    /// WAITING_FOR_SERVER: poll the readiness endpoint on a fixed interval,
    /// bounded by the attempt budget. First success settles, then hands
    /// over to INSTALLING.
    async fn wait_for_server(&self) -> InstallerPhase {
        let poll_interval = Duration::from_secs(self.config.poll_interval_secs);
        let settle_delay = Duration::from_secs(self.config.settle_delay_secs);

        for _ in 0..self.config.max_polls {
            if self.backend.is_ready().await {
                tracing::info!(
                    settle_secs = self.config.settle_delay_secs,
                    "backend ready, waiting for extension repositories to sync"
                );
                self.clock.sleep(settle_delay).await;
                return InstallerPhase::Installing;
            }
            self.clock.sleep(poll_interval).await;
        }

        tracing::error!(
            polls = self.config.max_polls,
            "backend never became ready, skipping extension installation"
        );
        InstallerPhase::TimedOut
    }

    /// INSTALLING: walk the extension list in order. Success and retry
    /// exhaustion both advance; only a not-found-yet outcome earns another
    /// attempt.
    async fn install_all(&self) -> InstallerPhase {
        let retry_delay = Duration::from_secs(self.config.retry_delay_secs);

        for pkg in &self.config.extensions {
            let mut installed = false;

            for attempt in 1..=self.config.install_attempts {
                tracing::info!(
                    pkg = %pkg,
                    attempt,
                    max_attempts = self.config.install_attempts,
                    "installing extension"
                );

                match self.backend.install(pkg).await {
                    InstallOutcome::Installed => {
                        tracing::info!(pkg = %pkg, attempts = attempt, "extension installed");
                        metrics::record_extension_install("installed");
                        installed = true;
                        break;
                    }
                    InstallOutcome::NotFoundYet => {
                        tracing::warn!(
                            pkg = %pkg,
                            "extension not found, repository may not be synced yet"
                        );
                        if attempt < self.config.install_attempts {
                            self.clock.sleep(retry_delay).await;
                        }
                    }
                    InstallOutcome::Failed(reason) => {
                        tracing::error!(pkg = %pkg, reason = %reason, "extension install failed");
                        break;
                    }
                }
            }

            if !installed {
                tracing::error!(pkg = %pkg, "failed to install extension after retries");
                metrics::record_extension_install("failed");
            }
        }

        InstallerPhase::Done
    }
}
