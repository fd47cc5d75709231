//! Request-scoped fast limit check.

use tracing::trace;

use super::bucket::{BucketRecord, RequestDescriptor};
use super::observer::BucketObserver;
use super::rules::RequestPolicy;

/// Checks the buckets relevant to one request against a request policy.
///
/// Requests for any authority other than the policy's are accepted
/// without looking at the buckets. Otherwise a bucket is tested only when
/// both guards hold:
///
/// 1. its `bucket` label is the wildcard or the request's bucket;
/// 2. the request's (bucket, user) pair is on the policy's allow-list.
///
/// The first tested bucket above the threshold rejects the request.
pub fn check_limit_for_request(
    buckets: &[BucketRecord],
    request: &RequestDescriptor,
    policy: &RequestPolicy,
    observer: &dyn BucketObserver,
) -> bool {
    if request.authority() != Some(policy.authority.as_str()) {
        return true;
    }

    for bucket in buckets {
        observer.request_bucket(policy, request, bucket);

        if !bucket_matches(bucket, request, policy) {
            continue;
        }

        if !request_allowed(request, policy) {
            continue;
        }

        let count = bucket.values[policy.window];
        if count > policy.threshold {
            trace!(
                authority = %policy.authority,
                count = count,
                threshold = policy.threshold,
                "Request limit exceeded"
            );
            return false;
        }
    }
    true
}

/// Label `bucket` is the wildcard or equals the request's bucket. An
/// unlabeled bucket matches a request without a bucket.
fn bucket_matches(bucket: &BucketRecord, request: &RequestDescriptor, policy: &RequestPolicy) -> bool {
    let label = bucket.labels.bucket();
    label == Some(policy.wildcard.as_str()) || label == request.bucket()
}

fn request_allowed(request: &RequestDescriptor, policy: &RequestPolicy) -> bool {
    let Some(bucket) = request.bucket() else {
        return false;
    };
    policy.allow.iter().any(|pair| {
        (bucket == policy.wildcard || bucket == pair.bucket) && request.user() == Some(pair.user.as_str())
    })
}
