// SPDX-FileCopyrightText: © 2025 TTKB, LLC
// SPDX-License-Identifier: BSD-3-CLAUSE
use signalmatch::theory::{DeletedMotion, DeletedSelection, EditTheory, Excisions};

fn excisions(pairs: &[(&str, (usize, usize))]) -> Excisions {
    pairs
        .iter()
        .map(|(text, range)| (text.to_string(), *range))
        .collect()
}

#[test]
fn test_deleted_selection() {
    let original = "abcdefghijklmnop";
    let edited = "abcghijkop";
    let prev_selection = [(3, 6), (11, 14)];

    let theory = DeletedSelection::new(original, edited, 10, 11, &prev_selection);
    assert_eq!(
        theory.evaluate(),
        Some((15, excisions(&[("def", (3, 6)), ("lmn", (11, 14))])))
    );
}

#[test]
fn test_selection_mismatch() {
    let theory = DeletedSelection::new("abcdef", "abef", 0, 0, &[(1, 3)]);
    assert_eq!(theory.evaluate(), None);
}

#[test]
fn test_not_deleted_motion() {
    let original = "abcd\nefgh";
    let edited = "bcd\nfgh";
    let prev_selection = [(0, 1), (5, 6)];

    let theory = DeletedMotion::new(original, edited, 12, 13, &prev_selection);
    assert_eq!(theory.evaluate(), None);
}

#[test]
fn test_deleted_line() {
    let original = "abc\ndef\nghi";
    let edited = "abc\nghi";

    let theory = DeletedMotion::new(original, edited, 4, 4, &[]);
    assert_eq!(
        theory.evaluate(),
        Some((7, excisions(&[("\ndef", (3, 7))])))
    );
}

#[test]
fn test_deleted_word() {
    let original = "abc def ghi";
    let edited = "abc ghi";

    let theory = DeletedMotion::new(original, edited, 3, 4, &[]);
    assert_eq!(
        theory.evaluate(),
        Some((7, excisions(&[(" def", (3, 7))])))
    );
}

#[test]
fn test_deleted_linebegin() {
    let original = "abc def ghi";
    let edited = "def ghi";

    let theory = DeletedMotion::new(original, edited, 0, 0, &[]);
    assert_eq!(
        theory.evaluate(),
        Some((4, excisions(&[("abc ", (0, 4))])))
    );
}

#[test]
fn test_deleted_innerword() {
    let original = "abc def ghi";
    let edited = "abc ghi";

    let theory = DeletedMotion::new(original, edited, 3, 4, &[]);
    assert_eq!(
        theory.evaluate(),
        Some((7, excisions(&[(" def", (3, 7))])))
    );
}

#[test]
fn test_deleted_lineend() {
    let original = "ab\ncd";
    let edited = "a\ncd";

    let theory = DeletedMotion::new(original, edited, 0, 1, &[]);
    assert_eq!(theory.evaluate(), Some((2, excisions(&[("b", (1, 2))]))));
}
