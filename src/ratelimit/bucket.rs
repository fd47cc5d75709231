//! Bucket records and request descriptors.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::window::WindowCounters;
use crate::error::RatecheckError;

/// Label key carrying the client source address.
pub const SOURCE_LABEL: &str = "source";
/// Label key carrying the target bucket name.
pub const BUCKET_LABEL: &str = "bucket";

/// Descriptive attributes of a bucket, as emitted by the aggregator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BucketLabel(BTreeMap<String, String>);

impl BucketLabel {
    /// Create an empty label set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an attribute, returning the label for chaining.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Get an attribute by key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// The `source` attribute.
    pub fn source(&self) -> Option<&str> {
        self.get(SOURCE_LABEL)
    }

    /// The `bucket` attribute.
    pub fn bucket(&self) -> Option<&str> {
        self.get(BUCKET_LABEL)
    }
}

impl fmt::Display for BucketLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries: Vec<String> = self.0.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        write!(f, "{{{}}}", entries.join(","))
    }
}

/// A labeled set of window counters.
///
/// On the wire the counters are a positional five-element array. Both
/// `{"labels": {...}, "values": [...]}` and `[{...}, [...]]` are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawBucket")]
pub struct BucketRecord {
    pub labels: BucketLabel,
    #[serde(serialize_with = "serialize_positional")]
    pub values: WindowCounters,
}

impl BucketRecord {
    /// Create a bucket record.
    pub fn new(labels: BucketLabel, values: WindowCounters) -> Self {
        Self { labels, values }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawBucket {
    Named { labels: BucketLabel, values: Vec<i64> },
    Pair(BucketLabel, Vec<i64>),
}

impl TryFrom<RawBucket> for BucketRecord {
    type Error = RatecheckError;

    fn try_from(raw: RawBucket) -> Result<Self, Self::Error> {
        let (labels, values) = match raw {
            RawBucket::Named { labels, values } => (labels, values),
            RawBucket::Pair(labels, values) => (labels, values),
        };
        Ok(Self {
            labels,
            values: WindowCounters::try_from(values)?,
        })
    }
}

fn serialize_positional<S>(values: &WindowCounters, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    values.to_array().serialize(serializer)
}

/// The attributes of an incoming request that the request-scoped check
/// looks at. Any attribute may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestDescriptor {
    /// Target host
    #[serde(default)]
    pub authority: Option<String>,
    /// Target resource name
    #[serde(default)]
    pub bucket: Option<String>,
    /// Requesting identity
    #[serde(default)]
    pub user: Option<String>,
}

impl RequestDescriptor {
    /// Create a descriptor with all three attributes set.
    pub fn new(
        authority: impl Into<String>,
        bucket: impl Into<String>,
        user: impl Into<String>,
    ) -> Self {
        Self {
            authority: Some(authority.into()),
            bucket: Some(bucket.into()),
            user: Some(user.into()),
        }
    }

    /// The target host, if present.
    pub fn authority(&self) -> Option<&str> {
        self.authority.as_deref()
    }

    /// The target bucket name, if present.
    pub fn bucket(&self) -> Option<&str> {
        self.bucket.as_deref()
    }

    /// The requesting identity, if present.
    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }
}
