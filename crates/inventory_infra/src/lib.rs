//! Provisioning and teardown for the inventory pipeline.
//!
//! Every cloud interaction goes through the traits in [`cloud`]; the
//! sequencers in [`provision`] and [`teardown`] only see those seams. The
//! [`aws`] module binds them to the AWS SDK, and `test_helpers` binds them to
//! an in-memory double.

pub mod aws;
pub mod clock;
pub mod cloud;
pub mod config;
pub mod ensure;
pub mod error;
pub mod names;
pub mod package;
pub mod provision;
pub mod readiness;
pub mod retry;
pub mod teardown;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;
