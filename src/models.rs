use std::collections::HashSet;

use rquest::header::HeaderMap;
use rquest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::analysis::StructuralForm;

/// A response as the comparator sees it: whatever the transport got back
/// before any interpretation.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

/// Calibrated reference characteristics for one baseline URL.
///
/// Built once by [`crate::compare::HttpCompare::calibrate`] and read-only
/// afterwards. The ignore set and noise floor are fixed for the lifetime of
/// the value; fields are private so nothing can mutate them after
/// calibration has succeeded.
#[derive(Debug, Clone)]
pub struct Baseline {
    url: String,
    status: StatusCode,
    headers: HeaderMap,
    body: StructuralForm,
    ignored_headers: HashSet<String>,
    noise_floor: f64,
}

impl Baseline {
    pub(crate) fn new(
        url: String,
        status: StatusCode,
        headers: HeaderMap,
        body: StructuralForm,
        ignored_headers: HashSet<String>,
        noise_floor: f64,
    ) -> Self {
        Baseline {
            url,
            status,
            headers,
            body,
            ignored_headers,
            noise_floor,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn structural_body(&self) -> &StructuralForm {
        &self.body
    }

    /// Lowercase header names excluded from comparison: the seeded volatile
    /// names plus any header that varied between the two calibration
    /// samples.
    pub fn ignored_headers(&self) -> &HashSet<String> {
        &self.ignored_headers
    }

    /// Body distance observed between the two calibration samples. `0.0`
    /// when they were structurally identical. Subject responses match only
    /// at exactly this distance.
    pub fn noise_floor(&self) -> f64 {
        self.noise_floor
    }
}

/// Why a subject response was classified as diverging.
///
/// At most one reason is ever reported per comparison; checks short-circuit
/// in fixed precedence `Code` > `Header` > `Body`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MismatchReason {
    None,
    Code,
    Header,
    Body,
    /// Sentinel for a subject request that got no usable response (WAF
    /// drop, connection reset). Reported alongside `matched = true` so a
    /// blocked probe reads as a non-signal rather than a divergence.
    Blocked,
}

/// Outcome of one subject comparison. Created fresh per call and never
/// retained by the comparator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub matched: bool,
    pub reason: MismatchReason,
    pub reflection: bool,
}

impl ComparisonResult {
    pub(crate) fn matched() -> Self {
        ComparisonResult {
            matched: true,
            reason: MismatchReason::None,
            reflection: false,
        }
    }

    pub(crate) fn mismatch(reason: MismatchReason, reflection: bool) -> Self {
        ComparisonResult {
            matched: false,
            reason,
            reflection,
        }
    }

    pub(crate) fn blocked() -> Self {
        ComparisonResult {
            matched: true,
            reason: MismatchReason::Blocked,
            reflection: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_serializes_with_lowercase_reason() {
        let result = ComparisonResult::mismatch(MismatchReason::Code, true);
        let json = serde_json::to_string(&result).unwrap();
        assert_eq!(
            json,
            r#"{"matched":false,"reason":"code","reflection":true}"#
        );
    }

    #[test]
    fn blocked_counts_as_match() {
        let result = ComparisonResult::blocked();
        assert!(result.matched);
        assert_eq!(result.reason, MismatchReason::Blocked);
        assert!(!result.reflection);
    }
}
