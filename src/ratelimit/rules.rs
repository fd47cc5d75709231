//! Rate limit rules configuration.
//!
//! Each fast check is driven by a policy value. A [`PolicySet`] groups any
//! number of them and can be loaded from YAML:
//!
//! ```yaml
//! source_limits:
//!   - source: 192.168.192.14
//!     threshold: 3
//! request_limits:
//!   - authority: s3.example.com
//!     allow:
//!       - bucket: user17
//!         user: user17
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use super::window::WindowIndex;
use crate::error::{RatecheckError, Result};

/// Source address the default source rule applies to.
pub const DEFAULT_SOURCE: &str = "192.168.192.14";
/// Authority the default request rule applies to.
pub const DEFAULT_AUTHORITY: &str = "s3.example.com";
/// Identity on the default request allow-list.
pub const DEFAULT_ALLOWED_USER: &str = "user17";
/// Bucket on the default request allow-list.
pub const DEFAULT_ALLOWED_BUCKET: &str = "user17";
/// Token matching any bucket.
pub const DEFAULT_WILDCARD: &str = "*";
/// Counter value above which a fast check rejects.
pub const DEFAULT_THRESHOLD: i64 = 3;
/// Window tested by the fast checks.
pub const DEFAULT_WINDOW: WindowIndex = WindowIndex::Min1;

/// Rule for the source-filtered fast check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcePolicy {
    /// Buckets whose `source` label equals this value are tested
    pub source: String,
    /// Reject when the tested window is strictly greater than this
    #[serde(default = "default_threshold")]
    pub threshold: i64,
    /// Window to test
    #[serde(default = "default_window")]
    pub window: WindowIndex,
}

impl SourcePolicy {
    /// Create a rule for `source` with the default threshold and window.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            threshold: DEFAULT_THRESHOLD,
            window: DEFAULT_WINDOW,
        }
    }

    pub fn with_threshold(mut self, threshold: i64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_window(mut self, window: WindowIndex) -> Self {
        self.window = window;
        self
    }
}

impl Default for SourcePolicy {
    fn default() -> Self {
        Self::new(DEFAULT_SOURCE)
    }
}

/// A (bucket, user) combination the request-scoped check applies to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AllowedPair {
    pub bucket: String,
    pub user: String,
}

impl AllowedPair {
    pub fn new(bucket: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            user: user.into(),
        }
    }
}

/// Rule for the request-scoped fast check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestPolicy {
    /// Only requests targeting this authority are checked
    pub authority: String,
    /// Bucket token that matches any bucket name
    #[serde(default = "default_wildcard")]
    pub wildcard: String,
    /// (bucket, user) pairs the check is scoped to
    #[serde(default)]
    pub allow: Vec<AllowedPair>,
    /// Reject when the tested window is strictly greater than this
    #[serde(default = "default_threshold")]
    pub threshold: i64,
    /// Window to test
    #[serde(default = "default_window")]
    pub window: WindowIndex,
}

impl RequestPolicy {
    /// Create a rule for `authority` with an empty allow-list.
    pub fn new(authority: impl Into<String>) -> Self {
        Self {
            authority: authority.into(),
            wildcard: DEFAULT_WILDCARD.to_string(),
            allow: Vec::new(),
            threshold: DEFAULT_THRESHOLD,
            window: DEFAULT_WINDOW,
        }
    }

    pub fn allow(mut self, bucket: impl Into<String>, user: impl Into<String>) -> Self {
        self.allow.push(AllowedPair::new(bucket, user));
        self
    }

    pub fn with_wildcard(mut self, wildcard: impl Into<String>) -> Self {
        self.wildcard = wildcard.into();
        self
    }

    pub fn with_threshold(mut self, threshold: i64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_window(mut self, window: WindowIndex) -> Self {
        self.window = window;
        self
    }
}

impl Default for RequestPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_AUTHORITY).allow(DEFAULT_ALLOWED_BUCKET, DEFAULT_ALLOWED_USER)
    }
}

fn default_threshold() -> i64 {
    DEFAULT_THRESHOLD
}

fn default_window() -> WindowIndex {
    DEFAULT_WINDOW
}

fn default_wildcard() -> String {
    DEFAULT_WILDCARD.to_string()
}

/// All source and request rules applied to a snapshot.
///
/// The global sanity check has no parameters and always runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicySet {
    #[serde(default)]
    pub source_limits: Vec<SourcePolicy>,
    #[serde(default)]
    pub request_limits: Vec<RequestPolicy>,
}

impl Default for PolicySet {
    fn default() -> Self {
        Self {
            source_limits: vec![SourcePolicy::default()],
            request_limits: vec![RequestPolicy::default()],
        }
    }
}

impl PolicySet {
    /// A policy set with no source or request rules.
    pub fn empty() -> Self {
        Self {
            source_limits: Vec::new(),
            request_limits: Vec::new(),
        }
    }

    /// Load rules from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading rate limit policy");

        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Load rules from a YAML string. An empty document yields no rules.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::empty());
        }

        serde_yaml::from_str(yaml)
            .map_err(|e| RatecheckError::Config(format!("Failed to parse rate limit policy: {}", e)))
    }

    /// Serialize the rules as YAML.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self)
            .map_err(|e| RatecheckError::Config(format!("Failed to serialize rate limit policy: {}", e)))
    }
}
