// SPDX-FileCopyrightText: © 2025 TTKB, LLC
// SPDX-License-Identifier: BSD-3-CLAUSE
use thiserror::Error;

pub mod align;
pub mod channel;
pub mod cli;
pub mod digest;
pub mod fingerprint;
pub mod reconcile;
pub mod search;
pub mod theory;

/// Failures surfaced by the core. Everything else is either recovered
/// internally or is not an error at all (empty input yields an empty
/// container). The core never logs; callers decide what to show.
#[derive(Debug, Error)]
pub enum Error {
    #[error("input is not valid UTF-8")]
    BadEncoding,

    #[error("channel {0} has no polynomial")]
    UnknownChannel(u16),

    #[error("repaired signal still aligns with an insertion")]
    AlignmentImpossible,

    #[error("a parallel worker crashed")]
    WorkerCrash,

    #[error("unparseable fingerprint rendering: {0}")]
    BadRendering(&'static str),
}

/// Tuning knobs for the fingerprint search.
///
/// `prefix_threshold` is normally derived per pass from
/// `prefix_thresholds`; setting it pins the search to a single pass at
/// that threshold (the `--all` flag does this).
#[derive(Debug, Clone)]
pub struct Params {
    pub channel: u16,
    pub max_prefix_len: usize,
    pub retry_percent: f64,
    pub prefix_thresholds: Vec<u16>,
    pub prefix_threshold: Option<u16>,
    pub skip_prefix: bool,
    pub feature_threshold: u16,
    pub max_feature_len: usize,
    pub parallel: bool,
    pub batch_size_divisor: usize,
    pub batch_increase_divisor: usize,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            channel: 963,
            max_prefix_len: 15,
            retry_percent: 0.01,
            prefix_thresholds: vec![0x002F, 0x004F, 0x008F],
            prefix_threshold: None,
            skip_prefix: false,
            feature_threshold: 0x00FF,
            max_feature_len: 150,
            parallel: true,
            batch_size_divisor: 100,
            batch_increase_divisor: 1000,
        }
    }
}

impl Params {
    /// Parameters with all interestingness filtering disabled: every
    /// window fingerprint is emitted.
    pub fn unfiltered() -> Self {
        Self {
            max_prefix_len: 0,
            skip_prefix: true,
            prefix_threshold: Some(0xFFFF),
            feature_threshold: 0xFFFF,
            ..Self::default()
        }
    }
}
