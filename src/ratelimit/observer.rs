//! Observer seam for per-bucket diagnostics.
//!
//! The checks call an observer for every bucket they iterate. Observers
//! are purely observational and cannot influence a decision.

use tracing::{debug, error};

use super::bucket::{BucketRecord, RequestDescriptor};
use super::rules::{RequestPolicy, SourcePolicy};

/// Receives a callback for every bucket a check iterates over.
pub trait BucketObserver: Send + Sync {
    /// Called by the source-filtered check before the bucket is filtered.
    fn source_bucket(&self, _policy: &SourcePolicy, _bucket: &BucketRecord) {}

    /// Called by the request-scoped check before the bucket is filtered.
    fn request_bucket(
        &self,
        _policy: &RequestPolicy,
        _request: &RequestDescriptor,
        _bucket: &BucketRecord,
    ) {
    }
}

/// Observer that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl BucketObserver for NoopObserver {}

/// Observer that emits `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl BucketObserver for TracingObserver {
    fn source_bucket(&self, policy: &SourcePolicy, bucket: &BucketRecord) {
        debug!(
            window = %policy.window,
            count = bucket.values[policy.window],
            "Checking source bucket"
        );
    }

    fn request_bucket(
        &self,
        policy: &RequestPolicy,
        request: &RequestDescriptor,
        bucket: &BucketRecord,
    ) {
        error!(
            authority = request.authority().unwrap_or_default(),
            bucket = request.bucket().unwrap_or_default(),
            user = request.user().unwrap_or_default(),
            window = %policy.window,
            count = bucket.values[policy.window],
            values = ?bucket.values.to_array(),
            "Checking request bucket"
        );
        error!(labels = %bucket.labels, "Request bucket labels");
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts observer callbacks.
    #[derive(Debug, Default)]
    pub(crate) struct CountingObserver {
        source: AtomicUsize,
        request: AtomicUsize,
    }

    impl CountingObserver {
        pub(crate) fn source_calls(&self) -> usize {
            self.source.load(Ordering::SeqCst)
        }

        pub(crate) fn request_calls(&self) -> usize {
            self.request.load(Ordering::SeqCst)
        }
    }

    impl BucketObserver for CountingObserver {
        fn source_bucket(&self, _: &SourcePolicy, _: &BucketRecord) {
            self.source.fetch_add(1, Ordering::SeqCst);
        }

        fn request_bucket(&self, _: &RequestPolicy, _: &RequestDescriptor, _: &BucketRecord) {
            self.request.fetch_add(1, Ordering::SeqCst);
        }
    }
}
