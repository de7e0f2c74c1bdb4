// SPDX-FileCopyrightText: © 2025 TTKB, LLC
// SPDX-License-Identifier: BSD-3-CLAUSE
use signalmatch::channel::{channel_polynomial, CHANNEL_COUNT};
use signalmatch::digest::digest_str;
use signalmatch::fingerprint::Fingerprints;
use signalmatch::search::all_subs;
use signalmatch::Params;

#[test]
fn test_shared_digest_vectors() {
    // the channel table and the fold are pinned together: '¢' is C2 A2,
    // one reduction step by P_964
    assert_eq!(channel_polynomial(964).unwrap(), 0xC44B);
    assert_eq!(digest_str("¢", 964).unwrap(), 0x06E9);
    assert_eq!(digest_str("¢‽", 964).unwrap(), 0x0C0E);

    assert_eq!(channel_polynomial(963).unwrap(), 0xC447);
    assert_eq!(digest_str("ab", 963).unwrap(), 0x32FE);
}

#[test]
fn test_channel_table_is_fixed() {
    assert_eq!(CHANNEL_COUNT, 1800);
    assert!(channel_polynomial(CHANNEL_COUNT).is_err());
}

fn unfiltered_serial() -> Params {
    Params {
        parallel: false,
        ..Params::unfiltered()
    }
}

#[test]
fn test_all_subs_abcd() {
    let (prints, stats) = all_subs("abcd", &unfiltered_serial()).unwrap();

    let mut found: Vec<(String, u32)> = prints
        .iter()
        .map(|(score, _, substring)| (substring.to_string(), score))
        .collect();
    found.sort();

    let mut expected = vec![
        ("a".to_string(), 98),
        ("b".to_string(), 99),
        ("c".to_string(), 100),
        ("d".to_string(), 101),
        ("bc".to_string(), 9188),
        ("ab".to_string(), 13055),
        ("bcd".to_string(), 23343),
        ("abc".to_string(), 25702),
        ("cd".to_string(), 28462),
        ("abcd".to_string(), 32156),
    ];
    expected.sort();

    assert_eq!(found, expected);
    assert_eq!(prints.len(), 10);
    assert_eq!(stats.features_found, 10);
}

#[test]
fn test_every_prefix_of_every_suffix_is_covered() {
    // with filtering disabled the container holds one entry per
    // (offset, length) pair
    let text = "to be or not";
    let n = text.chars().count();
    let (prints, _) = all_subs(text, &unfiltered_serial()).unwrap();
    assert_eq!(prints.len(), n * (n + 1) / 2);

    let mut ranges: Vec<(usize, usize)> = prints.iter().map(|(_, entry, _)| entry.range).collect();
    ranges.sort();
    ranges.dedup();
    assert_eq!(ranges.len(), n * (n + 1) / 2);
}

#[test]
fn test_ranges_are_valid_char_boundaries() {
    let text = "pri¢e of the ‽ sign: 𝄞 only";
    let (prints, _) = all_subs(text, &unfiltered_serial()).unwrap();
    assert!(!prints.is_empty());

    for (_, entry, substring) in prints.iter() {
        let (start, end) = entry.range;
        assert!(start < end);
        assert!(end <= text.len());
        // slicing on a non-boundary would return None
        assert_eq!(text.get(start..end).unwrap(), substring);
    }
}

#[test]
fn test_scores_ascend() {
    let (prints, _) = all_subs("mississippi", &unfiltered_serial()).unwrap();
    let scores: Vec<u32> = prints.iter().map(|(score, _, _)| score).collect();
    let mut sorted = scores.clone();
    sorted.sort();
    assert_eq!(scores, sorted);
}

#[test]
fn test_parallel_merge_is_deterministic() {
    let text = "how much noise could a signal carve if a signal could carve noise";
    let serial = all_subs(text, &unfiltered_serial()).unwrap().0;
    let parallel = all_subs(text, &Params::unfiltered()).unwrap().0;
    assert_eq!(serial, parallel);
}

#[test]
fn test_merge_commutes() {
    let (a, _) = all_subs("abcd", &unfiltered_serial()).unwrap();
    let (b, _) = all_subs("bcde", &unfiltered_serial()).unwrap();

    let mut ab = a.clone();
    ab.merge(b.clone());
    let mut ba = b;
    ba.merge(a);

    assert_eq!(ab, ba);
}

#[test]
fn test_human_rendering_round_trips() {
    let (prints, _) = all_subs("signal in the noise", &unfiltered_serial()).unwrap();
    let parsed = Fingerprints::parse(&prints.to_string()).unwrap();
    assert_eq!(parsed, prints);
}

#[test]
fn test_json_shape() {
    let (prints, _) = all_subs("abcd", &unfiltered_serial()).unwrap();
    let json = prints.to_json();
    let root = json.as_object().unwrap();

    // score keys emit in ascending numeric order
    let scores: Vec<u64> = root.keys().map(|k| k.parse().unwrap()).collect();
    let mut sorted = scores.clone();
    sorted.sort();
    assert_eq!(scores, sorted);
    assert_eq!(scores[0], 98);

    let entry = &root["98"]["0"]["1"];
    assert_eq!(entry["fingerprint"], "[03c3:0000->0061]");
    assert_eq!(entry["substring"], "a");
}

#[test]
fn test_default_params_on_short_input() {
    // nothing clears a fifteen-character prefix window in a four
    // character text
    let (prints, stats) = all_subs("abcd", &Params::default()).unwrap();
    assert!(prints.is_empty());
    assert_eq!(stats.fruitless_prefix_searches, 4 * 3);
    assert_eq!(stats.passes, 3);
}

#[test]
fn test_empty_input_is_not_an_error() {
    let (prints, _) = all_subs("", &Params::default()).unwrap();
    assert!(prints.is_empty());
}

#[test]
fn test_threshold_escalation_stops_early() {
    // three thresholds are configured, but the first pass already
    // clears the retry bar
    let params = Params {
        skip_prefix: true,
        parallel: false,
        ..Params::default()
    };
    let (prints, stats) = all_subs("abcdefgh", &params).unwrap();
    assert!(!prints.is_empty());
    assert_eq!(stats.passes, 1);
}
