//! Source-filtered fast limit check.

use tracing::trace;

use super::bucket::BucketRecord;
use super::observer::BucketObserver;
use super::rules::SourcePolicy;

/// Returns `false` as soon as a bucket labeled with the policy's source
/// has a tested-window count strictly above the threshold.
///
/// Buckets with a different or missing `source` label are ignored.
pub fn check_limit_by_source(
    buckets: &[BucketRecord],
    policy: &SourcePolicy,
    observer: &dyn BucketObserver,
) -> bool {
    for bucket in buckets {
        observer.source_bucket(policy, bucket);

        if bucket.labels.source() != Some(policy.source.as_str()) {
            continue;
        }

        let count = bucket.values[policy.window];
        if count > policy.threshold {
            trace!(
                source = %policy.source,
                count = count,
                threshold = policy.threshold,
                "Source limit exceeded"
            );
            return false;
        }
    }
    true
}
