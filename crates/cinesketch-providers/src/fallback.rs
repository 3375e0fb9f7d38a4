//! Ordered attempt sequence across candidates: first success wins.
//!
//! Candidates run strictly one after another, each wrapped by the retrier.
//! The chain advances on "this candidate can't serve the request" (unsupported
//! model, or availability failures once retries are spent) and stops on
//! anything definitive (auth, content rejection, parse, bad request).

use std::future::Future;

use tracing::{debug, error, info, warn};

use cinesketch_core::{Disposition, ProviderError};

use crate::classify::is_transient;
use crate::retry::BackoffRetrier;
use crate::traits::{Adapter, Candidate};

/// The winning result plus which candidate produced it.
#[derive(Clone, Debug, PartialEq)]
pub struct Attempted<T> {
    pub value: T,
    /// `Provider/model` of the winner.
    pub candidate_label: String,
    pub model: String,
    /// Calls made to the winning candidate (1 = no retries).
    pub attempts: u32,
}

/// Runs candidates in order until one succeeds.
#[derive(Clone, Debug, Default)]
pub struct FallbackChain {
    retrier: BackoffRetrier,
}

impl FallbackChain {
    pub fn new(retrier: BackoffRetrier) -> Self {
        Self { retrier }
    }

    pub fn retrier(&self) -> &BackoffRetrier {
        &self.retrier
    }

    /// Try each candidate with `attempt` until one succeeds.
    ///
    /// Errors:
    /// - `Configuration` when `candidates` is empty
    /// - the candidate's own error when it fails definitively
    /// - `Exhausted` when every candidate was unsupported or unavailable
    pub async fn run<A, T, F, Fut>(
        &self,
        operation: &str,
        candidates: &[Candidate<A>],
        attempt: F,
    ) -> Result<Attempted<T>, ProviderError>
    where
        A: Adapter + ?Sized,
        F: Fn(Candidate<A>) -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        if candidates.is_empty() {
            return Err(ProviderError::config(format!(
                "no configured provider can serve {operation}"
            )));
        }

        let mut attempted = Vec::with_capacity(candidates.len());
        let mut last_error = None;

        for candidate in candidates {
            let label = candidate.label();
            debug!(operation, candidate = %label, "Trying candidate");

            let (result, attempts) = self
                .retrier
                .execute_counted(|| attempt(candidate.clone()), is_transient)
                .await;

            match result {
                Ok(value) => {
                    info!(operation, candidate = %label, attempts, "Candidate succeeded");
                    return Ok(Attempted {
                        value,
                        candidate_label: label,
                        model: candidate.model.clone(),
                        attempts,
                    });
                }
                Err(err) => {
                    attempted.push(label.clone());
                    match err.disposition() {
                        Disposition::Unsupported => {
                            warn!(operation, candidate = %label, error = %err, "Candidate unsupported, advancing");
                        }
                        Disposition::Retryable => {
                            warn!(operation, candidate = %label, attempts, error = %err, "Candidate unavailable, advancing");
                        }
                        Disposition::Fatal => {
                            error!(operation, candidate = %label, error = %err, "Candidate failed, aborting chain");
                            return Err(err);
                        }
                    }
                    last_error = Some(err);
                }
            }
        }

        let last = last_error.unwrap_or_else(|| ProviderError::config("no candidate attempted"));
        error!(operation, tried = %attempted.join(", "), "All candidates failed");
        Err(ProviderError::Exhausted {
            operation: operation.to_string(),
            attempted,
            last: Box::new(last),
        })
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
