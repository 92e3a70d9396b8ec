//! Baseline calibration and differential subject comparison.

use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

use log::{debug, info};
use rquest::header::{HeaderMap, HeaderValue, COOKIE};
use rquest::StatusCode;
use thiserror::Error;

use crate::analysis::{distance, parse_body};
use crate::headers::diff_headers;
use crate::models::{Baseline, ComparisonResult, HttpResponse, MismatchReason};
use crate::token::{append_cache_buster, rand_token};
use crate::transport::Transport;

/// Header names that vary between any two requests and are never evidence
/// of a behavioral difference.
pub const VOLATILE_HEADERS: [&str; 3] = ["date", "last-modified", "content-length"];

/// Pause between the two calibration samples, long enough for latent
/// time-based response variation to show up while the noise model is being
/// built instead of during later comparisons.
const CALIBRATION_PAUSE: Duration = Duration::from_secs(2);

/// Calibration failures. Fatal: when calibration fails no comparator is
/// produced, so nothing can compare against a broken baseline.
#[derive(Error, Debug)]
pub enum CalibrationError {
    #[error("unstable baseline: calibration samples returned {first} and {second}")]
    UnstableBaseline {
        first: StatusCode,
        second: StatusCode,
    },

    #[error("baseline request to {url} got no usable response")]
    Unreachable { url: String },
}

/// Differential comparator bound to one calibrated baseline URL.
///
/// Calibration runs once at construction; afterwards the comparator is
/// read-only, so independent `compare` calls may run concurrently against
/// the same instance without locking.
#[derive(Debug)]
pub struct HttpCompare<T: Transport> {
    transport: T,
    baseline: Baseline,
}

impl<T: Transport> HttpCompare<T> {
    /// Calibrates against `baseline_url` and returns a ready comparator.
    ///
    /// The URL is sampled twice with distinct cache-busting tokens,
    /// separated by a fixed pause. The first sample's status, headers and
    /// structural body become the reference values; headers that varied
    /// between the samples join the ignore set and the body distance
    /// between them becomes the noise floor. Either calibration fully
    /// succeeds or no comparator exists.
    pub async fn calibrate(transport: T, baseline_url: &str) -> Result<Self, CalibrationError> {
        info!("calibrating baseline for {}", baseline_url);

        let first = Self::fetch_baseline(&transport, baseline_url).await?;
        tokio::time::sleep(CALIBRATION_PAUSE).await;
        let second = Self::fetch_baseline(&transport, baseline_url).await?;

        if first.status != second.status {
            return Err(CalibrationError::UnstableBaseline {
                first: first.status,
                second: second.status,
            });
        }

        let body_1 = parse_body(&first.body);
        let body_2 = parse_body(&second.body);

        let mut ignored: HashSet<String> =
            VOLATILE_HEADERS.iter().map(|name| name.to_string()).collect();
        let dynamic = diff_headers(&first.headers, &second.headers, &ignored);
        if !dynamic.is_empty() {
            debug!(
                "dynamic headers discovered during calibration of {}: {:?}",
                baseline_url, dynamic
            );
        }
        ignored.extend(dynamic);

        let noise_floor = distance(&body_1, &body_2);
        info!(
            "calibration complete for {} (noise floor {:.4})",
            baseline_url, noise_floor
        );

        let baseline = Baseline::new(
            baseline_url.to_string(),
            first.status,
            first.headers,
            body_1,
            ignored,
            noise_floor,
        );
        Ok(HttpCompare {
            transport,
            baseline,
        })
    }

    async fn fetch_baseline(transport: &T, url: &str) -> Result<HttpResponse, CalibrationError> {
        let busted = append_cache_buster(url, &rand_token());
        transport
            .get(&busted, &HeaderMap::new())
            .await
            .ok_or_else(|| CalibrationError::Unreachable {
                url: url.to_string(),
            })
    }

    pub fn baseline(&self) -> &Baseline {
        &self.baseline
    }

    /// Compares a subject response against the calibrated baseline.
    ///
    /// Checks run in fixed precedence: status code, then headers, then
    /// structural body distance; the first divergence is the only reason
    /// reported. A subject request with no usable response yields a match
    /// with the `Blocked` sentinel, since a dropped probe is usually
    /// defensive infrastructure reacting rather than changed behavior.
    pub async fn compare(
        &self,
        subject_url: &str,
        extra_headers: Option<&HeaderMap>,
        extra_cookies: Option<&BTreeMap<String, String>>,
    ) -> ComparisonResult {
        let busted = append_cache_buster(subject_url, &rand_token());
        let request_headers = build_request_headers(extra_headers, extra_cookies);

        let subject = match self.transport.get(&busted, &request_headers).await {
            Some(resp) => resp,
            None => {
                debug!(
                    "no usable response from {}, treating as non-signal",
                    subject_url
                );
                return ComparisonResult::blocked();
            }
        };

        let reflection = check_reflection(extra_headers, extra_cookies, &subject.body);

        if self.baseline.status() != subject.status {
            debug!(
                "status code [{}] -> [{}], no match",
                self.baseline.status(),
                subject.status
            );
            return ComparisonResult::mismatch(MismatchReason::Code, reflection);
        }

        let differing = diff_headers(
            self.baseline.headers(),
            &subject.headers,
            self.baseline.ignored_headers(),
        );
        if !differing.is_empty() {
            debug!("headers were different, no match: {:?}", differing);
            return ComparisonResult::mismatch(MismatchReason::Header, reflection);
        }

        let subject_body = parse_body(&subject.body);
        let subject_distance = distance(self.baseline.structural_body(), &subject_body);
        if subject_distance != self.baseline.noise_floor() {
            debug!(
                "body distance {} -> {}, no match",
                self.baseline.noise_floor(),
                subject_distance
            );
            return ComparisonResult::mismatch(MismatchReason::Body, reflection);
        }

        ComparisonResult::matched()
    }
}

fn build_request_headers(
    extra_headers: Option<&HeaderMap>,
    extra_cookies: Option<&BTreeMap<String, String>>,
) -> HeaderMap {
    let mut headers = extra_headers.cloned().unwrap_or_default();
    if let Some(cookies) = extra_cookies {
        if !cookies.is_empty() {
            let cookie_line = cookies
                .iter()
                .map(|(name, value)| format!("{}={}", name, value))
                .collect::<Vec<_>>()
                .join("; ");
            match HeaderValue::from_str(&cookie_line) {
                Ok(value) => {
                    headers.insert(COOKIE, value);
                }
                Err(e) => debug!("skipping unencodable cookie header: {}", e),
            }
        }
    }
    headers
}

/// Reflection is only attributable when exactly one value was injected;
/// with several, any of them could be the one echoed back, so the check is
/// skipped. Injected headers take precedence over injected cookies.
fn check_reflection(
    extra_headers: Option<&HeaderMap>,
    extra_cookies: Option<&BTreeMap<String, String>>,
    body: &str,
) -> bool {
    if let Some(headers) = extra_headers {
        if headers.len() == 1 {
            if let Some(value) = headers.iter().next().and_then(|(_, v)| v.to_str().ok()) {
                return body.contains(value);
            }
        }
        if !headers.is_empty() {
            return false;
        }
    }
    if let Some(cookies) = extra_cookies {
        if cookies.len() == 1 {
            if let Some(value) = cookies.values().next() {
                return body.contains(value.as_str());
            }
        }
    }
    false
}
