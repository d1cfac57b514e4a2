//! Idempotent per-resource steps.
//!
//! Each resource type has a pure `plan_*` function deciding what to do from
//! the observed state, and an `ensure_*` function that observes, plans and
//! applies.

pub mod binding;
pub mod bucket;
pub mod function;
pub mod http_api;
pub mod permission;
pub mod site;
pub mod table;
pub mod topic;
pub mod trigger;

use crate::clock::Clock;
use crate::readiness::PollPolicy;
use crate::retry::RetryPolicy;

/// Clock plus the polling and retry policies shared by every step.
#[derive(Clone, Copy)]
pub struct Timing<'a> {
    pub clock: &'a dyn Clock,
    pub poll: PollPolicy,
    pub retry: RetryPolicy,
}

impl<'a> Timing<'a> {
    pub fn new(clock: &'a dyn Clock) -> Self {
        Self {
            clock,
            poll: PollPolicy::default(),
            retry: RetryPolicy::default(),
        }
    }
}
