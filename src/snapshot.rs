//! Evaluation snapshots and decisions.
//!
//! A [`Snapshot`] is one materialized input from the aggregator: the flat
//! totals, the labeled buckets and, optionally, the request being decided.
//! [`evaluate`] runs every rule of a [`PolicySet`] against it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

use crate::error::{RatecheckError, Result};
use crate::ratelimit::{
    check_global, check_limit_by_source, check_limit_for_request, BucketObserver, BucketRecord,
    PolicySet, RequestDescriptor, WindowCounters,
};

/// One evaluation input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Aggregated counters; the global check is skipped when absent
    #[serde(default)]
    pub totals: Option<WindowCounters>,
    /// Labeled per-dimension buckets
    #[serde(default)]
    pub buckets: Vec<BucketRecord>,
    /// Request being decided; request rules are skipped when absent
    #[serde(default)]
    pub request: Option<RequestDescriptor>,
}

impl Snapshot {
    /// Load a snapshot from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&contents)
    }

    /// Parse a snapshot from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| RatecheckError::Snapshot(format!("Failed to parse snapshot: {}", e)))
    }
}

/// A rule that rejected the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    /// The totals failed the global sanity check
    GlobalFloor,
    /// A source rule was exceeded
    SourceLimit { source: String },
    /// A request rule was exceeded
    RequestLimit { authority: String },
}

/// Outcome of evaluating a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub allowed: bool,
    pub evaluated_at: DateTime<Utc>,
    pub violations: Vec<Violation>,
}

impl Decision {
    /// Process exit status for this decision: 0 when allowed, 1 when denied.
    pub fn exit_status(&self) -> u8 {
        if self.allowed {
            0
        } else {
            1
        }
    }
}

/// Run the global check and every rule in `policy` against `snapshot`.
///
/// All rules are evaluated so that the decision lists every violation.
pub fn evaluate(snapshot: &Snapshot, policy: &PolicySet, observer: &dyn BucketObserver) -> Decision {
    let mut violations = Vec::new();

    if let Some(totals) = &snapshot.totals {
        if !check_global(totals) {
            violations.push(Violation::GlobalFloor);
        }
    }

    for rule in &policy.source_limits {
        if !check_limit_by_source(&snapshot.buckets, rule, observer) {
            violations.push(Violation::SourceLimit {
                source: rule.source.clone(),
            });
        }
    }

    if let Some(request) = &snapshot.request {
        for rule in &policy.request_limits {
            if !check_limit_for_request(&snapshot.buckets, request, rule, observer) {
                violations.push(Violation::RequestLimit {
                    authority: rule.authority.clone(),
                });
            }
        }
    } else if !policy.request_limits.is_empty() {
        debug!("Snapshot has no request, skipping request rules");
    }

    let decision = Decision {
        allowed: violations.is_empty(),
        evaluated_at: Utc::now(),
        violations,
    };

    info!(
        allowed = decision.allowed,
        buckets = snapshot.buckets.len(),
        violations = decision.violations.len(),
        "Rate check decision made"
    );

    decision
}
