// SPDX-FileCopyrightText: © 2025 TTKB, LLC
// SPDX-License-Identifier: BSD-3-CLAUSE
use rayon::prelude::*;
use std::cmp;
use std::panic::{self, AssertUnwindSafe};

use crate::channel::channel_polynomial;
use crate::digest::Digest;
use crate::fingerprint::{Fingerprints, SearchStats, Subprint};
use crate::{Error, Params};

/// Scan the suffix of `text` beginning at byte `offset`.
///
/// The prefix phase folds the first `max_prefix_len` characters and
/// keeps the smallest buffer value seen. If that candidate clears the
/// threshold the search commits it and moves to the feature phase,
/// where every window whose buffer drops below `feature_threshold`
/// emits a fingerprint. A suffix that never clears the prefix phase
/// emits nothing.
pub fn from_start(
    offset: usize,
    text: &str,
    prefix_threshold: u16,
    params: &Params,
) -> Result<(Fingerprints, SearchStats), Error> {
    let mut digest = Digest::new(params.channel)?;
    let mut prints = Fingerprints::new();
    let mut stats = SearchStats::default();

    let mut in_prefix = !params.skip_prefix;
    let mut prefix_candidate = u16::MAX;
    let mut prefix: u16 = 0;
    let mut feature_chars = 0usize;
    let mut feature_found = false;
    let mut end = offset;

    for (i, c) in text[offset..].chars().enumerate() {
        if in_prefix && i == params.max_prefix_len {
            if prefix_candidate < prefix_threshold {
                prefix = prefix_candidate;
                stats.fruitful_prefix_searches += 1;
                in_prefix = false;
            } else {
                stats.fruitless_prefix_searches += 1;
                return Ok((prints, stats));
            }
        }

        if !in_prefix && feature_chars == params.max_feature_len {
            break;
        }

        digest.fold_char(c);
        end += c.len_utf8();

        if in_prefix {
            prefix_candidate = cmp::min(prefix_candidate, digest.fingerprint());
        } else {
            feature_chars += 1;
            let feature = digest.fingerprint();
            if feature < params.feature_threshold {
                prints.insert(
                    (offset, end),
                    Subprint {
                        channel: params.channel,
                        prefix,
                        feature,
                    },
                );
                stats.features_found += 1;
                feature_found = true;
            }
        }
    }

    if in_prefix {
        // ran out of characters before the prefix decision
        stats.fruitless_prefix_searches += 1;
    } else if !feature_found {
        stats.fruitless_feature_searches += 1;
    }

    Ok((prints, stats))
}

/// Fingerprint every suffix of `text`, escalating prefix thresholds
/// until enough interesting substrings accumulate.
///
/// Thresholds are tried in ascending order; a pass that yields more
/// than `retry_percent × n` entries ends the escalation. The container
/// from the final pass is returned (a wider threshold re-finds
/// everything a narrower one found). Empty input yields an empty
/// container.
pub fn all_subs(text: &str, params: &Params) -> Result<(Fingerprints, SearchStats), Error> {
    let mut prints = Fingerprints::new();
    let mut stats = SearchStats::default();

    let offsets: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
    let n = offsets.len();
    if n == 0 {
        return Ok((prints, stats));
    }

    // fail on a bad channel before any worker is spawned
    channel_polynomial(params.channel)?;

    let thresholds = match params.prefix_threshold {
        Some(t) => vec![t],
        None => params.prefix_thresholds.clone(),
    };

    for threshold in thresholds {
        let (pass_prints, pass_stats) = run_pass(text, &offsets, threshold, params)?;
        prints = pass_prints;
        stats.absorb(pass_stats);
        stats.passes += 1;

        prints.set_substrings(text);

        if prints.len() as f64 > params.retry_percent * n as f64 {
            break;
        }
    }

    Ok((prints, stats))
}

fn run_pass(
    text: &str,
    offsets: &[usize],
    threshold: u16,
    params: &Params,
) -> Result<(Fingerprints, SearchStats), Error> {
    let batches = make_batches(offsets, params);

    let results: Vec<Result<(Fingerprints, SearchStats), Error>> = if params.parallel {
        batches
            .into_par_iter()
            .map(|batch| {
                panic::catch_unwind(AssertUnwindSafe(|| {
                    run_batch(text, &batch, threshold, params)
                }))
                .unwrap_or(Err(Error::WorkerCrash))
            })
            .collect()
    } else {
        batches
            .into_iter()
            .map(|batch| run_batch(text, &batch, threshold, params))
            .collect()
    };

    let mut prints = Fingerprints::new();
    let mut stats = SearchStats::default();
    for result in results {
        let (batch_prints, batch_stats) = result?;
        prints.merge(batch_prints);
        stats.absorb(batch_stats);
    }

    Ok((prints, stats))
}

fn run_batch(
    text: &str,
    offsets: &[usize],
    threshold: u16,
    params: &Params,
) -> Result<(Fingerprints, SearchStats), Error> {
    let mut prints = Fingerprints::new();
    let mut stats = SearchStats::default();

    for &offset in offsets {
        let (suffix_prints, suffix_stats) = from_start(offset, text, threshold, params)?;
        prints.merge(suffix_prints);
        stats.absorb(suffix_stats);
    }

    Ok((prints, stats))
}

/// Slice the task list into batches, allocating from the end (shortest
/// suffixes first) with a growing batch size.
fn make_batches(offsets: &[usize], params: &Params) -> Vec<Vec<usize>> {
    let n = offsets.len();
    let mut size = cmp::max(5, n.div_ceil(params.batch_size_divisor));
    let step = cmp::max(1, n.div_ceil(params.batch_increase_divisor));

    let mut batches = Vec::new();
    let mut rest = offsets;
    while !rest.is_empty() {
        let take = cmp::min(size, rest.len());
        let (head, tail) = rest.split_at(rest.len() - take);
        batches.push(tail.to_vec());
        rest = head;
        size += step;
    }

    batches
}
