// SPDX-License-Identifier: GPL-3.0-only

//! Caller-side retry policy for advanced disk operations
//!
//! Operations report failure as a structured outcome and never retry
//! themselves; this helper is where the caller's `VdsOptions` policy
//! lives. Errors (contract violations, cancellation, missing disks)
//! propagate immediately — only non-success outcomes are retried.

use std::future::Future;

use tokio_util::sync::CancellationToken;

use deploy_contracts::{DeployError, OperationOutcome};
use deploy_types::VdsOptions;

/// Invoke `operation` until it succeeds, re-invoking a failed outcome
/// up to `retry_count` more times with `retry_timeout` between
/// attempts. The final outcome is returned either way.
pub async fn retry_operation<F, Fut>(
    options: &VdsOptions,
    cancel: &CancellationToken,
    mut operation: F,
) -> Result<OperationOutcome, DeployError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<OperationOutcome, DeployError>>,
{
    let attempts = options.retry_count.saturating_add(1);
    let mut outcome = operation().await?;

    for attempt in 1..attempts {
        if outcome.is_success() {
            break;
        }

        tracing::warn!(
            attempt,
            of = options.retry_count,
            "disk operation failed with {outcome}; retrying in {:?}",
            options.retry_timeout()
        );

        tokio::select! {
            _ = cancel.cancelled() => {
                return Err(DeployError::cancelled("retry wait cancelled"));
            }
            _ = tokio::time::sleep(options.retry_timeout()) => {}
        }

        outcome = operation().await?;
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn fast_options() -> VdsOptions {
        VdsOptions {
            retry_count: 3,
            retry_timeout_secs: 0,
        }
    }

    #[tokio::test]
    async fn success_on_first_attempt_runs_once() {
        let calls = AtomicUsize::new(0);
        let cancel = CancellationToken::new();

        let outcome = retry_operation(&fast_options(), &cancel, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(OperationOutcome::success()) }
        })
        .await
        .unwrap();

        assert!(outcome.is_success());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_outcomes_retry_up_to_the_configured_count() {
        let calls = AtomicUsize::new(0);
        let cancel = CancellationToken::new();

        let outcome = retry_operation(&fast_options(), &cancel, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(OperationOutcome::failure(1, "still busy")) }
        })
        .await
        .unwrap();

        assert!(!outcome.is_success());
        // Initial attempt plus three retries.
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn recovery_mid_sequence_stops_retrying() {
        let calls = AtomicUsize::new(0);
        let cancel = CancellationToken::new();

        let outcome = retry_operation(&fast_options(), &cancel, || {
            let attempt = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt < 2 {
                    Ok(OperationOutcome::failure(1, "transient"))
                } else {
                    Ok(OperationOutcome::success())
                }
            }
        })
        .await
        .unwrap();

        assert!(outcome.is_success());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn errors_propagate_without_retrying() {
        let calls = AtomicUsize::new(0);
        let cancel = CancellationToken::new();

        let result = retry_operation(&fast_options(), &cancel, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(DeployError::invalid_input("wrong overload")) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
