// SPDX-FileCopyrightText: © 2025 TTKB, LLC
// SPDX-License-Identifier: BSD-3-CLAUSE
use itertools::Itertools;
use serde::Serialize;
use serde_with::skip_serializing_none;

use crate::Error;

const MATCH: i32 = 1;
const MISMATCH: i32 = 0;
const GAP: i32 = -1;

/// Global pairwise alignment (Needleman-Wunsch) of two character
/// sequences. Returns two equal-length rows where `None` is the gap
/// symbol: the aligned noise and the aligned signal.
pub fn align(noise: &str, signal: &str) -> (Vec<Option<char>>, Vec<Option<char>>) {
    let noise: Vec<char> = noise.chars().collect();
    let signal: Vec<char> = signal.chars().collect();
    let n = noise.len();
    let m = signal.len();

    let width = m + 1;
    let mut score = vec![0i32; (n + 1) * width];
    for j in 0..=m {
        score[j] = GAP * j as i32;
    }
    for i in 0..=n {
        score[i * width] = GAP * i as i32;
    }

    for i in 1..=n {
        for j in 1..=m {
            let diag = score[(i - 1) * width + j - 1]
                + if noise[i - 1] == signal[j - 1] {
                    MATCH
                } else {
                    MISMATCH
                };
            let up = score[(i - 1) * width + j] + GAP;
            let left = score[i * width + j - 1] + GAP;
            score[i * width + j] = diag.max(up).max(left);
        }
    }

    let mut aligned_noise = Vec::new();
    let mut aligned_signal = Vec::new();
    let (mut i, mut j) = (n, m);
    while i > 0 || j > 0 {
        let here = score[i * width + j];
        if i > 0
            && j > 0
            && here
                == score[(i - 1) * width + j - 1]
                    + if noise[i - 1] == signal[j - 1] {
                        MATCH
                    } else {
                        MISMATCH
                    }
        {
            aligned_noise.push(Some(noise[i - 1]));
            aligned_signal.push(Some(signal[j - 1]));
            i -= 1;
            j -= 1;
        } else if i > 0 && here == score[(i - 1) * width + j] + GAP {
            aligned_noise.push(Some(noise[i - 1]));
            aligned_signal.push(None);
            i -= 1;
        } else {
            aligned_noise.push(None);
            aligned_signal.push(Some(signal[j - 1]));
            j -= 1;
        }
    }
    aligned_noise.reverse();
    aligned_signal.reverse();

    (aligned_noise, aligned_signal)
}

/// A subinterval of the given noise (might be kept signal, might be a
/// gap). Half-open character offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interval {
    pub start: usize,
    pub end: usize,
    pub content: String,
}

const STRIKE: &str = "\x1b[9m";
const RESET: &str = "\x1b[0m";

/// Wrap text in the strike-through rendering used for gaps.
pub fn struck(text: &str) -> String {
    format!("{STRIKE}{text}{RESET}")
}

/// Repair the user's buffer against the noise, then categorize it.
///
/// Pass one walks the alignment and rebuilds the signal so that it is a
/// true subsequence of noise: insertion columns contribute nothing
/// (editor actions that would create new data can only widen the
/// signal), matched columns contribute the noise character (overwriting
/// transcription errors), deletion columns stay deleted. Pass two
/// re-aligns the fixed signal and emits intervals whenever the walk
/// flips between signal and gap, accumulating a rendering in which gaps
/// are struck through.
pub fn align_and_fix(
    signal: &str,
    noise: &str,
) -> Result<(Vec<Interval>, Vec<Interval>, String), Error> {
    let (noise_row, signal_row) = align(noise, signal);
    let fixed: String = noise_row
        .iter()
        .zip_eq(signal_row.iter())
        .filter_map(|(c, s)| match (c, s) {
            (Some(c), Some(_)) => Some(*c),
            _ => None,
        })
        .collect();

    let (noise_row, signal_row) = align(noise, &fixed);
    let columns = noise_row.len();

    let mut signals = Vec::new();
    let mut gaps = Vec::new();
    let mut rendered = String::new();
    let mut buffer = String::new();
    let mut buffer_is_signal = false;
    let mut start = 0;

    fn flush(
        buffer: &mut String,
        is_signal: bool,
        start: usize,
        end: usize,
        rendered: &mut String,
        signals: &mut Vec<Interval>,
        gaps: &mut Vec<Interval>,
    ) {
        if buffer.is_empty() {
            return;
        }
        let interval = Interval {
            start,
            end,
            content: buffer.clone(),
        };
        if is_signal {
            rendered.push_str(buffer);
            signals.push(interval);
        } else {
            rendered.push_str(&struck(buffer));
            gaps.push(interval);
        }
        buffer.clear();
    }

    for (i, (c, s)) in noise_row.into_iter().zip_eq(signal_row).enumerate() {
        // pass one removed every insertion
        let c = c.ok_or(Error::AlignmentImpossible)?;

        let is_signal = s.is_some();
        if is_signal != buffer_is_signal {
            flush(
                &mut buffer,
                buffer_is_signal,
                start,
                i,
                &mut rendered,
                &mut signals,
                &mut gaps,
            );
            start = i;
        }
        buffer_is_signal = is_signal;
        buffer.push(c);
    }
    flush(
        &mut buffer,
        buffer_is_signal,
        start,
        columns,
        &mut rendered,
        &mut signals,
        &mut gaps,
    );

    Ok((signals, gaps, rendered))
}

/// How a span of noise relates to the user's buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Kind {
    /// Noise the user kept.
    Signal,
    /// Noise the user deleted.
    Gap,
    /// Characters the user substituted or inserted: `original` is the
    /// noise covered (possibly empty), `user_change` what was typed.
    Error {
        original: String,
        user_change: String,
    },
}

/// One classified span of noise. `start..end` are character offsets
/// into the noise; `signal_start..signal_end` the characters of the
/// user's buffer this span covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub content: String,
    pub kind: Kind,
    pub signal_start: usize,
    pub signal_end: usize,
}

impl Span {
    pub fn is_error(&self) -> bool {
        matches!(self.kind, Kind::Error { .. })
    }
}

/// An ordered, non-overlapping tiling of `[0, |noise|)`. Spans from
/// pure insertions are empty and sit between their neighbors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntervalMap {
    spans: Vec<Span>,
    noise_len: usize,
}

impl IntervalMap {
    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    pub fn iter(&self) -> impl Iterator<Item = &Span> {
        self.spans.iter()
    }

    /// The span containing noise position `position`.
    pub fn get(&self, position: usize) -> Option<&Span> {
        let idx = self.spans.partition_point(|s| s.end <= position);
        self.spans
            .get(idx)
            .filter(|s| s.start <= position && position < s.end)
    }

    pub fn noise_len(&self) -> usize {
        self.noise_len
    }

    pub fn has_errors(&self) -> bool {
        self.spans.iter().any(Span::is_error)
    }

    /// Reassemble the noise from span contents.
    pub fn concat(&self) -> String {
        self.spans.iter().map(|s| s.content.as_str()).collect()
    }
}

/// Classify every noise position against the user's buffer, preserving
/// the user's errors instead of silently correcting them. Matched
/// columns are signal, deletions are gaps, and runs of substituted or
/// inserted characters coalesce into error spans.
pub fn find_gaps(signal: &str, noise: &str) -> IntervalMap {
    #[derive(Clone, Copy, PartialEq)]
    enum Tag {
        Signal,
        Gap,
        Error,
    }

    let (noise_row, signal_row) = align(noise, signal);

    let mut spans = Vec::new();
    let mut noise_pos = 0;
    let mut signal_pos = 0;
    let mut run_start = 0;
    let mut run_signal_start = 0;
    let mut noise_run = String::new();
    let mut signal_run = String::new();
    let mut tag: Option<Tag> = None;

    fn flush(
        tag: Tag,
        noise_run: &mut String,
        signal_run: &mut String,
        span: (usize, usize),
        signal_span: (usize, usize),
        spans: &mut Vec<Span>,
    ) {
        let kind = match tag {
            Tag::Signal => Kind::Signal,
            Tag::Gap => Kind::Gap,
            Tag::Error => Kind::Error {
                original: noise_run.clone(),
                user_change: signal_run.clone(),
            },
        };
        spans.push(Span {
            start: span.0,
            end: span.1,
            content: noise_run.clone(),
            kind,
            signal_start: signal_span.0,
            signal_end: signal_span.1,
        });
        noise_run.clear();
        signal_run.clear();
    }

    for (c, s) in noise_row.iter().zip_eq(signal_row.iter()) {
        let column = match (c, s) {
            (Some(c), Some(s)) if c == s => Tag::Signal,
            (Some(_), None) => Tag::Gap,
            _ => Tag::Error,
        };

        if tag != Some(column) {
            if let Some(tag) = tag {
                flush(
                    tag,
                    &mut noise_run,
                    &mut signal_run,
                    (run_start, noise_pos),
                    (run_signal_start, signal_pos),
                    &mut spans,
                );
            }
            run_start = noise_pos;
            run_signal_start = signal_pos;
            tag = Some(column);
        }

        if let Some(c) = c {
            noise_run.push(*c);
            noise_pos += 1;
        }
        if let Some(s) = s {
            signal_run.push(*s);
            signal_pos += 1;
        }
    }
    if let Some(tag) = tag {
        flush(
            tag,
            &mut noise_run,
            &mut signal_run,
            (run_start, noise_pos),
            (run_signal_start, signal_pos),
            &mut spans,
        );
    }

    IntervalMap {
        spans,
        noise_len: noise_pos,
    }
}

/// Flat record shape for the interval-map output.
#[skip_serializing_none]
#[derive(Debug, Serialize)]
pub struct SpanRecord {
    pub start: usize,
    pub end: usize,
    pub kind: &'static str,
    pub content: String,
    pub original: Option<String>,
    pub user_change: Option<String>,
}

impl From<&Span> for SpanRecord {
    fn from(span: &Span) -> Self {
        let (kind, original, user_change) = match &span.kind {
            Kind::Signal => ("signal", None, None),
            Kind::Gap => ("gap", None, None),
            Kind::Error {
                original,
                user_change,
            } => ("error", Some(original.clone()), Some(user_change.clone())),
        };
        Self {
            start: span.start,
            end: span.end,
            kind,
            content: span.content.clone(),
            original,
            user_change,
        }
    }
}
