// SPDX-FileCopyrightText: © 2025 TTKB, LLC
// SPDX-License-Identifier: BSD-3-CLAUSE
use std::collections::BTreeMap;

/// Excised text mapped to the half-open character range it occupied in
/// the original buffer.
pub type Excisions = BTreeMap<String, (usize, usize)>;

/// A hypothesis about which kind of edit the user just performed.
/// Theories are diagnostic: the alignment engine stays authoritative,
/// theories improve reconcile tie-breaks and UI feedback.
pub trait EditTheory {
    /// `Some((resulting cursor, excisions))` when replaying the
    /// hypothesis on the original buffer reproduces the edited one.
    fn evaluate(&self) -> Option<(usize, Excisions)>;
}

/// The user deleted the previously selected ranges.
pub struct DeletedSelection {
    original: Vec<char>,
    edited: String,
    cursor_begin: usize,
    cursor_end: usize,
    selections: Vec<(usize, usize)>,
}

impl DeletedSelection {
    pub fn new(
        original: &str,
        edited: &str,
        cursor_begin: usize,
        cursor_end: usize,
        selections: &[(usize, usize)],
    ) -> Self {
        Self {
            original: original.chars().collect(),
            edited: edited.to_string(),
            cursor_begin,
            cursor_end,
            selections: selections.to_vec(),
        }
    }
}

impl EditTheory for DeletedSelection {
    fn evaluate(&self) -> Option<(usize, Excisions)> {
        let len = self.original.len();
        if self.cursor_begin > len || self.cursor_end > len || self.selections.is_empty() {
            return None;
        }

        let mut ranges = self.selections.clone();
        ranges.sort();

        let mut kept = String::new();
        let mut excisions = Excisions::new();
        let mut pos = 0;
        for &(start, end) in &ranges {
            if start < pos || end < start || end > len {
                return None;
            }
            kept.extend(&self.original[pos..start]);
            excisions.insert(self.original[start..end].iter().collect(), (start, end));
            pos = end;
        }
        kept.extend(&self.original[pos..]);

        if kept != self.edited {
            return None;
        }

        let last_end = ranges.last().map(|r| r.1).unwrap_or(self.cursor_end);
        Some((last_end + 1, excisions))
    }
}

/// The user performed a single vi-style motion-delete at the cursor.
/// Candidate motions are tried in order; the first whose excision
/// reproduces the edited buffer wins.
pub struct DeletedMotion {
    original: Vec<char>,
    edited: String,
    cursor_begin: usize,
    cursor_end: usize,
}

impl DeletedMotion {
    pub fn new(
        original: &str,
        edited: &str,
        cursor_begin: usize,
        cursor_end: usize,
        _selections: &[(usize, usize)],
    ) -> Self {
        Self {
            original: original.chars().collect(),
            edited: edited.to_string(),
            cursor_begin,
            cursor_end,
        }
    }

    fn try_range(&self, range: Option<(usize, usize)>) -> Option<(usize, Excisions)> {
        let (start, end) = range?;
        if start >= end || end > self.original.len() {
            return None;
        }

        let mut remaining: String = self.original[..start].iter().collect();
        remaining.extend(&self.original[end..]);
        if remaining != self.edited {
            return None;
        }

        let excised: String = self.original[start..end].iter().collect();
        let mut excisions = Excisions::new();
        excisions.insert(excised, (start, end));
        Some((end, excisions))
    }
}

impl EditTheory for DeletedMotion {
    fn evaluate(&self) -> Option<(usize, Excisions)> {
        let chars = &self.original;
        if self.cursor_begin > chars.len() || self.cursor_end > chars.len() {
            return None;
        }

        let candidates = [
            line_range(chars, self.cursor_begin),
            word_range(chars, self.cursor_begin),
            inner_word_range(chars, self.cursor_begin),
            line_begin_range(chars, self.cursor_begin),
            line_end_range(chars, self.cursor_end),
        ];

        candidates
            .into_iter()
            .find_map(|range| self.try_range(range))
    }
}

fn is_blank(c: char) -> bool {
    c == ' ' || c == '\t'
}

fn is_word(c: char) -> bool {
    !is_blank(c) && c != '\n'
}

/// Bounds of the line containing `pos`; a cursor sitting on the newline
/// belongs to the line it terminates.
fn line_bounds(chars: &[char], pos: usize) -> (usize, usize) {
    let start = chars[..pos]
        .iter()
        .rposition(|&c| c == '\n')
        .map(|i| i + 1)
        .unwrap_or(0);
    let end = chars[pos..]
        .iter()
        .position(|&c| c == '\n')
        .map(|i| pos + i)
        .unwrap_or(chars.len());
    (start, end)
}

/// The whole line, including the newline separating it from a
/// neighbor.
fn line_range(chars: &[char], pos: usize) -> Option<(usize, usize)> {
    let (start, end) = line_bounds(chars, pos);
    if start > 0 {
        Some((start - 1, end))
    } else if end < chars.len() {
        Some((start, end + 1))
    } else {
        Some((start, end))
    }
}

/// From the cursor through the next word: blanks-then-word when resting
/// on a blank, word-then-trailing-blanks otherwise.
fn word_range(chars: &[char], pos: usize) -> Option<(usize, usize)> {
    if pos >= chars.len() || chars[pos] == '\n' {
        return None;
    }

    let mut end = pos;
    if is_blank(chars[pos]) {
        while end < chars.len() && is_blank(chars[end]) {
            end += 1;
        }
        while end < chars.len() && is_word(chars[end]) {
            end += 1;
        }
    } else {
        while end < chars.len() && is_word(chars[end]) {
            end += 1;
        }
        while end < chars.len() && is_blank(chars[end]) {
            end += 1;
        }
    }
    Some((pos, end))
}

/// The word under the cursor, without surrounding blanks.
fn inner_word_range(chars: &[char], pos: usize) -> Option<(usize, usize)> {
    if pos >= chars.len() || !is_word(chars[pos]) {
        return None;
    }

    let mut start = pos;
    while start > 0 && is_word(chars[start - 1]) {
        start -= 1;
    }
    let mut end = pos;
    while end < chars.len() && is_word(chars[end]) {
        end += 1;
    }
    Some((start, end))
}

fn line_begin_range(chars: &[char], pos: usize) -> Option<(usize, usize)> {
    let (start, _) = line_bounds(chars, pos);
    (pos > start).then_some((start, pos))
}

fn line_end_range(chars: &[char], pos: usize) -> Option<(usize, usize)> {
    let (_, end) = line_bounds(chars, pos);
    (end > pos).then_some((pos, end))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_line_bounds() {
        let chars: Vec<char> = "abc\ndef\nghi".chars().collect();
        assert_eq!(line_bounds(&chars, 0), (0, 3));
        assert_eq!(line_bounds(&chars, 3), (0, 3));
        assert_eq!(line_bounds(&chars, 4), (4, 7));
        assert_eq!(line_bounds(&chars, 11), (8, 11));
    }

    #[test]
    fn test_word_range_from_blank() {
        let chars: Vec<char> = "abc def ghi".chars().collect();
        assert_eq!(word_range(&chars, 3), Some((3, 7)));
        assert_eq!(word_range(&chars, 0), Some((0, 4)));
    }
}
