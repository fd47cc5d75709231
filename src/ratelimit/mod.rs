//! Rate limit predicates over pre-aggregated counter buckets.

mod bucket;
mod global;
mod observer;
mod request;
mod rules;
mod source;
mod window;

pub use bucket::{BucketLabel, BucketRecord, RequestDescriptor, BUCKET_LABEL, SOURCE_LABEL};
pub use global::{check_global, check_global_map, GLOBAL_FLOOR};
pub use observer::{BucketObserver, NoopObserver, TracingObserver};
pub use request::check_limit_for_request;
pub use rules::{AllowedPair, PolicySet, RequestPolicy, SourcePolicy};
pub use source::check_limit_by_source;
pub use window::{WindowCounters, WindowIndex};
