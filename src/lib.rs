//! Differential HTTP response comparison for injection scanning.
//!
//! Calibrates a noise model from two time-separated samples of a baseline
//! URL, then classifies subject responses as matching or diverging with a
//! single precedence-ordered reason: status code, then headers, then
//! structural body distance.

pub mod analysis;
pub mod compare;
pub mod headers;
pub mod models;
pub mod token;
pub mod transport;

pub use compare::{CalibrationError, HttpCompare};
pub use models::{Baseline, ComparisonResult, HttpResponse, MismatchReason};
pub use transport::{RquestTransport, Transport};
