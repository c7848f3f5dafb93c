//! Retry loop: run a closure until success or the policy says stop.

use super::policy::{ErrorKind, RetryDecision, RetryPolicy};

/// Runs `f` until it succeeds or `policy` refuses another attempt.
///
/// `classify` maps each error to an [`ErrorKind`]; `on_failure` runs after
/// every failed attempt (retried or final) so the caller can clean up partial
/// output. Sleeps for the backoff delay between attempts.
pub fn run_with_retry<T, E, F, C, H>(
    policy: &RetryPolicy,
    classify: C,
    mut on_failure: H,
    mut f: F,
) -> Result<T, E>
where
    F: FnMut(u32) -> Result<T, E>,
    C: Fn(&E) -> ErrorKind,
    H: FnMut(&E),
    E: std::fmt::Display,
{
    let mut attempt = 1u32;
    loop {
        match f(attempt) {
            Ok(v) => return Ok(v),
            Err(e) => {
                on_failure(&e);
                let kind = classify(&e);
                match policy.decide(attempt, kind) {
                    RetryDecision::NoRetry => return Err(e),
                    RetryDecision::RetryAfter(d) => {
                        tracing::warn!(
                            attempt,
                            ?kind,
                            delay_ms = d.as_millis() as u64,
                            "retrying after error: {}",
                            e
                        );
                        std::thread::sleep(d);
                        attempt += 1;
                    }
                }
            }
        }
    }
}
