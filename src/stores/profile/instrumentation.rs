//! Query timing hooks

use std::time::Duration;

use super::subscriptions::SubscriptionPurpose;

/// Observer for query lifecycle; every hook defaults to doing nothing
pub trait ProfileInstrumentation {
    fn query_issued(&self, _sub_id: &str, _purpose: SubscriptionPurpose) {}
    fn first_event(&self, _sub_id: &str, _purpose: SubscriptionPurpose, _elapsed: Duration) {}
    fn query_completed(&self, _sub_id: &str, _purpose: SubscriptionPurpose, _elapsed: Duration) {}
    fn query_timed_out(&self, _sub_id: &str, _purpose: SubscriptionPurpose) {}
    fn event_dropped(&self, _sub_id: &str, _reason: &str) {}
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoopInstrumentation;

impl ProfileInstrumentation for NoopInstrumentation {}

/// Reports timings through `log`
#[derive(Clone, Copy, Debug, Default)]
pub struct LogInstrumentation;

impl ProfileInstrumentation for LogInstrumentation {
    fn query_issued(&self, sub_id: &str, purpose: SubscriptionPurpose) {
        log::debug!("[{}] query issued ({:?})", sub_id, purpose);
    }

    fn first_event(&self, sub_id: &str, _purpose: SubscriptionPurpose, elapsed: Duration) {
        log::debug!("[{}] first event after {}ms", sub_id, elapsed.as_millis());
    }

    fn query_completed(&self, sub_id: &str, purpose: SubscriptionPurpose, elapsed: Duration) {
        log::debug!("[{}] {:?} completed in {}ms", sub_id, purpose, elapsed.as_millis());
    }

    fn query_timed_out(&self, sub_id: &str, purpose: SubscriptionPurpose) {
        log::warn!("[{}] {:?} timed out", sub_id, purpose);
    }

    fn event_dropped(&self, sub_id: &str, reason: &str) {
        log::warn!("[{}] dropped event: {}", sub_id, reason);
    }
}
