use std::fmt::Display;
use std::time::Duration;

use tracing::debug;

use crate::clock::Clock;
use crate::error::DeployError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            timeout: Duration::from_secs(120),
        }
    }
}

/// Observes `resource` until `ready` holds, sleeping `policy.interval` between
/// observations.
///
/// The timeout is checked after each observation, so a resource that never
/// becomes ready fails after at least `timeout` and at most
/// `timeout + interval`.
pub fn wait_until<S, O, R>(
    clock: &dyn Clock,
    policy: &PollPolicy,
    resource: &str,
    mut observe: O,
    ready: R,
) -> Result<S, DeployError>
where
    S: Display,
    O: FnMut() -> Result<S, DeployError>,
    R: Fn(&S) -> bool,
{
    let started = clock.now();
    loop {
        let state = observe()?;
        if ready(&state) {
            return Ok(state);
        }

        let waited = clock.now().saturating_duration_since(started);
        if waited >= policy.timeout {
            return Err(DeployError::Timeout {
                resource: resource.to_string(),
                waited,
                last_state: state.to_string(),
            });
        }

        debug!(resource, state = %state, "waiting for resource");
        clock.sleep(policy.interval);
    }
}
