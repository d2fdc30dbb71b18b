//! Run verification at most once per process.

use crate::introspect::{Introspector, ModelRegistry};
use crate::report::VerificationReport;
use crate::verify::{VerifyOptions, verify};
use plumb_config::Config;
use std::future::Future;
use std::time::Duration;
use tokio::sync::Mutex;

/// What to do once a run has failed.
///
/// Called while the verifier's lock is held, so concurrent callers wait for
/// the policy to finish before seeing the cached verdict.
pub trait FailurePolicy: Sync {
    fn on_failure(&self, report: &VerificationReport) -> impl Future<Output = ()> + Send;
}

/// Only log the failure. The report has already been logged by then.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogOnly;

impl FailurePolicy for LogOnly {
    async fn on_failure(&self, report: &VerificationReport) {
        tracing::warn!(
            failures = report.failures().count(),
            "continuing despite schema mismatch"
        );
    }
}

/// Give operators time to read the logs, then optionally exit the process.
///
/// Exiting is opt-in (`exit_on_failure true`); by default the process keeps
/// running after the delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayThenExit {
    pub delay: Duration,
    pub exit: bool,
}

impl Default for DelayThenExit {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(60),
            exit: false,
        }
    }
}

impl DelayThenExit {
    pub fn from_config(config: &Config) -> Self {
        let defaults = Self::default();
        Self {
            delay: config
                .failure_delay_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.delay),
            exit: config.exit_on_failure.unwrap_or(defaults.exit),
        }
    }
}

impl FailurePolicy for DelayThenExit {
    async fn on_failure(&self, report: &VerificationReport) {
        tracing::error!(
            delay_secs = self.delay.as_secs(),
            exit = self.exit,
            failures = report.failures().count(),
            "schema verification failed"
        );
        tokio::time::sleep(self.delay).await;
        if self.exit {
            std::process::exit(1);
        }
    }
}

/// Where the single verification run stands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum Attempt {
    #[default]
    NotStarted,
    /// A run started but its caller dropped it before it finished.
    Interrupted,
    Done(bool),
}

impl Attempt {
    fn verdict(self) -> Option<bool> {
        match self {
            Attempt::NotStarted => None,
            Attempt::Interrupted => Some(false),
            Attempt::Done(passed) => Some(passed),
        }
    }
}

/// Single-flight verification.
///
/// The first call to [`Verifier::run_once`] runs a full verification; every
/// later call returns the cached verdict without touching the database.
/// Callers racing the first run wait for it.
///
/// The attempt is recorded before the run starts. If the first caller is
/// cancelled mid-run (a timeout, a `select!`, shutdown), the attempt counts
/// as failed and is not retried until [`Verifier::reset`].
#[derive(Debug, Default)]
pub struct Verifier<P = LogOnly> {
    attempt: Mutex<Attempt>,
    policy: P,
}

impl Verifier<LogOnly> {
    pub fn new() -> Self {
        Self::with_policy(LogOnly)
    }
}

impl<P: FailurePolicy> Verifier<P> {
    pub fn with_policy(policy: P) -> Self {
        Self {
            attempt: Mutex::new(Attempt::NotStarted),
            policy,
        }
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// Verify once and return whether the schema matches the models.
    pub async fn run_once<I, R>(&self, introspector: &I, registry: &R, options: &VerifyOptions) -> bool
    where
        I: Introspector,
        R: ModelRegistry + ?Sized,
    {
        let mut attempt = self.attempt.lock().await;
        match *attempt {
            Attempt::NotStarted => {}
            Attempt::Interrupted => {
                tracing::warn!("previous schema verification was interrupted; treating as failed");
                return false;
            }
            Attempt::Done(passed) => {
                tracing::debug!(passed, "schema already verified");
                return passed;
            }
        }

        // Stays `Interrupted` if this future is dropped before the run ends.
        *attempt = Attempt::Interrupted;

        let report = match verify(introspector, registry, options).await {
            Ok(report) => report,
            Err(err) => VerificationReport::aborted(introspector.dialect(), &err),
        };
        report.log_summary();

        let passed = report.passed();
        *attempt = Attempt::Done(passed);
        if !passed {
            self.policy.on_failure(&report).await;
        }
        passed
    }

    /// The cached verdict, if a run has been attempted.
    ///
    /// An interrupted run reads as `Some(false)`.
    pub async fn verdict(&self) -> Option<bool> {
        self.attempt.lock().await.verdict()
    }

    /// Forget the cached verdict so the next call verifies again.
    pub async fn reset(&self) {
        *self.attempt.lock().await = Attempt::NotStarted;
    }
}
