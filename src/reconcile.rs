// SPDX-FileCopyrightText: © 2025 TTKB, LLC
// SPDX-License-Identifier: BSD-3-CLAUSE
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

use crate::align::{IntervalMap, Kind};

/// What to do about one error span, keyed by where the user's change
/// sits in the signal buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EditAction {
    /// Drop the inserted characters.
    Ignore,
    /// Absorb the covered noise (and the chosen adjacent gap, when one
    /// was used) back into the signal, so a replacement keeps the text
    /// it replaced without fabricating data.
    ExtendSignal,
}

pub type EditStrategy = BTreeMap<usize, EditAction>;

/// Derive an edit strategy resolving every error span in the map.
pub fn reconcile(map: &IntervalMap) -> EditStrategy {
    reconcile_at(map, None)
}

/// As `reconcile`, with a noise-position hint for where the user's
/// cursor last resided; when an error is bordered by gaps on both
/// sides, the gap on the cursor's side absorbs the change.
pub fn reconcile_at(map: &IntervalMap, cursor: Option<usize>) -> EditStrategy {
    let mut strategy = EditStrategy::new();

    for (idx, span) in map.spans().iter().enumerate() {
        let Kind::Error {
            original,
            user_change,
        } = &span.kind
        else {
            continue;
        };

        let change_len = user_change.chars().count();

        let mut action = EditAction::Ignore;
        let gaps = adjacent_gaps(map, idx, cursor);
        if !gaps.is_empty() {
            if gaps
                .iter()
                .any(|&g| change_len <= map.spans()[g].content.chars().count())
            {
                action = EditAction::ExtendSignal;
            }
        } else if !original.is_empty()
            && change_len <= original.chars().count()
            && next_is_signal(map, idx)
        {
            // a replacement in the middle of kept text restores the
            // characters it covered; at the tail there is nothing to
            // extend into
            action = EditAction::ExtendSignal;
        }

        strategy.insert(span.signal_start, action);
    }

    strategy
}

/// Indices of gap spans adjacent to `idx`, in absorption preference
/// order: the cursor's side when known, otherwise the following gap
/// first.
fn adjacent_gaps(map: &IntervalMap, idx: usize, cursor: Option<usize>) -> Vec<usize> {
    let spans = map.spans();
    let next = (idx + 1 < spans.len() && spans[idx + 1].kind == Kind::Gap).then_some(idx + 1);
    let prev = (idx > 0 && spans[idx - 1].kind == Kind::Gap).then_some(idx - 1);

    let prefer_prev = cursor.is_some_and(|c| c < spans[idx].start);
    let ordered = if prefer_prev { [prev, next] } else { [next, prev] };
    ordered.into_iter().flatten().collect()
}

fn next_is_signal(map: &IntervalMap, idx: usize) -> bool {
    map.spans()
        .get(idx + 1)
        .is_some_and(|s| s.kind == Kind::Signal)
}

/// Rebuild the signal buffer with the strategy applied. The result is a
/// subsequence of the noise; classifying it again yields no errors.
pub fn apply_edit_strategy(map: &IntervalMap, strategy: &EditStrategy) -> String {
    apply_edit_strategy_at(map, strategy, None)
}

/// As `apply_edit_strategy`, absorbing into the gap on the cursor's
/// side when an error could extend either way.
pub fn apply_edit_strategy_at(
    map: &IntervalMap,
    strategy: &EditStrategy,
    cursor: Option<usize>,
) -> String {
    let mut absorbed: HashSet<usize> = HashSet::new();
    for (idx, span) in map.spans().iter().enumerate() {
        if !span.is_error() || strategy.get(&span.signal_start) != Some(&EditAction::ExtendSignal) {
            continue;
        }
        let change_len = match &span.kind {
            Kind::Error { user_change, .. } => user_change.chars().count(),
            _ => unreachable!(),
        };
        if let Some(&gap) = adjacent_gaps(map, idx, cursor)
            .iter()
            .find(|&&g| change_len <= map.spans()[g].content.chars().count())
        {
            absorbed.insert(gap);
        }
    }

    let mut out = String::new();
    for (idx, span) in map.spans().iter().enumerate() {
        match &span.kind {
            Kind::Signal => out.push_str(&span.content),
            Kind::Gap => {
                if absorbed.contains(&idx) {
                    out.push_str(&span.content);
                }
            }
            Kind::Error { original, .. } => {
                if strategy.get(&span.signal_start) == Some(&EditAction::ExtendSignal) {
                    out.push_str(original);
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::align::find_gaps;

    #[test]
    fn test_replacement_mid_signal_extends() {
        let it = find_gaps("axcd", "abcd");
        let strategy = reconcile(&it);
        assert_eq!(strategy.len(), 1);
        assert_eq!(strategy[&1], EditAction::ExtendSignal);

        let fixed = apply_edit_strategy(&it, &strategy);
        assert_eq!(fixed, "abcd");
        assert!(!find_gaps(&fixed, "abcd").has_errors());
    }

    #[test]
    fn test_trailing_insertion_is_ignored() {
        let it = find_gaps("abcx", "abcd");
        let strategy = reconcile(&it);
        assert_eq!(strategy.len(), 1);
        assert_eq!(strategy[&3], EditAction::Ignore);

        let fixed = apply_edit_strategy(&it, &strategy);
        assert_eq!(fixed, "abc");
        assert!(!find_gaps(&fixed, "abcd").has_errors());
    }

    #[test]
    fn test_change_absorbed_by_adjacent_gap() {
        // the user kept "a..d" and typed x over the hole
        let it = find_gaps("axd", "abcd");
        let strategy = reconcile(&it);
        assert!(strategy.values().any(|a| *a == EditAction::ExtendSignal));

        let fixed = apply_edit_strategy(&it, &strategy);
        assert!(!find_gaps(&fixed, "abcd").has_errors());
    }

    #[test]
    fn test_oversized_change_is_ignored() {
        // three inserted characters cannot be absorbed by a one-character gap
        let it = find_gaps("axyzcd", "abcd");
        let strategy = reconcile(&it);
        for action in strategy.values() {
            assert_eq!(*action, EditAction::Ignore);
        }

        let fixed = apply_edit_strategy(&it, &strategy);
        assert!(!find_gaps(&fixed, "abcd").has_errors());
    }

    #[test]
    fn test_no_errors_no_strategy() {
        let it = find_gaps("bcd", "abcd");
        assert!(reconcile(&it).is_empty());
    }
}
