use std::time::Duration;

use tracing::warn;

use crate::clock::Clock;
use crate::error::{ErrorKind, ProviderError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 8,
            backoff: Duration::from_secs(2),
        }
    }
}

/// Runs `call`, retrying transient conflicts up to `policy.attempts` times in
/// total. Any other error is returned immediately.
pub fn call_with_retries<T>(
    clock: &dyn Clock,
    policy: &RetryPolicy,
    operation: &str,
    mut call: impl FnMut() -> Result<T, ProviderError>,
) -> Result<T, ProviderError> {
    let mut attempt = 1;
    loop {
        match call() {
            Ok(value) => return Ok(value),
            Err(error) if error.kind == ErrorKind::TransientConflict && attempt < policy.attempts => {
                warn!(
                    operation,
                    attempt,
                    code = %error.code,
                    "transient conflict, retrying in {}s",
                    policy.backoff.as_secs()
                );
                clock.sleep(policy.backoff);
                attempt += 1;
            }
            Err(error) => return Err(error),
        }
    }
}
