// SPDX-FileCopyrightText: © 2025 TTKB, LLC
// SPDX-License-Identifier: BSD-3-CLAUSE
use itertools::Itertools;
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use crate::Error;

/// Half-open byte range into the fingerprinted text.
pub type Range = (usize, usize);

/// A display label binding channel, prefix and feature:
/// `[channel:prefix->feature]`, four lowercase hex digits each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Subprint {
    pub channel: u16,
    pub prefix: u16,
    pub feature: u16,
}

impl Subprint {
    /// Rank of this subprint: smaller is rarer is more interesting.
    pub fn score(&self) -> u32 {
        (u32::from(self.prefix) + 1) * (u32::from(self.feature) + 1)
    }
}

impl Display for Subprint {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:04x}:{:04x}->{:04x}]",
            self.channel, self.prefix, self.feature
        )
    }
}

impl FromStr for Subprint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        let re = Regex::new(r"^\[([0-9a-f]{4}):([0-9a-f]{4})->([0-9a-f]{4})\]$").unwrap();
        let caps = re
            .captures(s)
            .ok_or(Error::BadRendering("subprint label"))?;

        let field = |i| {
            u16::from_str_radix(caps.get(i).unwrap().as_str(), 16)
                .map_err(|_| Error::BadRendering("subprint field"))
        };

        Ok(Self {
            channel: field(1)?,
            prefix: field(2)?,
            feature: field(3)?,
        })
    }
}

/// One emitted fingerprint: where it was seen and what was computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Entry {
    pub range: Range,
    pub subprint: Subprint,
}

/// Scored multimap of every interesting fingerprint found in a text:
/// score → (range, subprint) → substring. Outer iteration is ascending
/// by score; within a score the order is arbitrary. Duplicate
/// (range, subprint) pairs collapse, which makes merging worker results
/// commutative.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fingerprints {
    scores: BTreeMap<u32, HashMap<Entry, String>>,
}

impl Fingerprints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, range: Range, subprint: Subprint) {
        self.insert_with_substring(range, subprint, String::new());
    }

    pub fn insert_with_substring(&mut self, range: Range, subprint: Subprint, substring: String) {
        self.scores
            .entry(subprint.score())
            .or_default()
            .insert(Entry { range, subprint }, substring);
    }

    /// Absorb another container. Commutative and associative as a
    /// multiset of (score, range, subprint); substrings are a pure
    /// function of range and text, so last-write-wins is harmless and
    /// `set_substrings` re-derives them anyway.
    pub fn merge(&mut self, other: Fingerprints) {
        for (score, entries) in other.scores {
            self.scores.entry(score).or_default().extend(entries);
        }
    }

    /// Re-derive every substring from its range.
    pub fn set_substrings(&mut self, text: &str) {
        for entries in self.scores.values_mut() {
            for (entry, substring) in entries.iter_mut() {
                *substring = text[entry.range.0..entry.range.1].to_string();
            }
        }
    }

    pub fn len(&self) -> usize {
        self.scores.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Iterate ascending by score; within a score, entries come sorted
    /// by range for stable rendering.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &Entry, &str)> {
        self.scores.iter().flat_map(|(score, entries)| {
            entries
                .iter()
                .sorted_by_key(|(entry, _)| **entry)
                .map(move |(entry, substring)| (*score, entry, substring.as_str()))
        })
    }

    /// The machine rendering:
    /// `{score → {start → {end → {"fingerprint", "substring"}}}}` with
    /// all keys as decimal strings, scores ascending.
    pub fn to_json(&self) -> serde_json::Value {
        let mut root = serde_json::Map::new();

        for (score, entries) in &self.scores {
            let mut starts: BTreeMap<usize, BTreeMap<usize, (&Subprint, &str)>> = BTreeMap::new();
            for (entry, substring) in entries {
                starts
                    .entry(entry.range.0)
                    .or_default()
                    .insert(entry.range.1, (&entry.subprint, substring.as_str()));
            }

            let mut start_map = serde_json::Map::new();
            for (start, ends) in starts {
                let mut end_map = serde_json::Map::new();
                for (end, (subprint, substring)) in ends {
                    end_map.insert(
                        end.to_string(),
                        serde_json::json!({
                            "fingerprint": subprint.to_string(),
                            "substring": substring,
                        }),
                    );
                }
                start_map.insert(start.to_string(), serde_json::Value::Object(end_map));
            }
            root.insert(score.to_string(), serde_json::Value::Object(start_map));
        }

        serde_json::Value::Object(root)
    }

    /// Parse the human rendering back into a container. Inverse of
    /// `Display` modulo within-score ordering.
    pub fn parse(rendering: &str) -> Result<Self, Error> {
        let score_re = Regex::new(r"^(\d+)$").unwrap();
        let entry_re = Regex::new(r"^ {4}\((\d+), (\d+)\) (\[.+\])$").unwrap();
        let substring_re = Regex::new(r#"^ {8}(".*")$"#).unwrap();

        let mut prints = Self::new();
        let mut pending: Option<(Range, Subprint)> = None;

        for line in rendering.lines() {
            if let Some(caps) = substring_re.captures(line) {
                let (range, subprint) =
                    pending.take().ok_or(Error::BadRendering("dangling substring"))?;
                let substring: String = serde_json::from_str(caps.get(1).unwrap().as_str())
                    .map_err(|_| Error::BadRendering("substring literal"))?;
                prints.insert_with_substring(range, subprint, substring);
            } else if let Some(caps) = entry_re.captures(line) {
                let number = |i: usize| {
                    caps.get(i)
                        .unwrap()
                        .as_str()
                        .parse::<usize>()
                        .map_err(|_| Error::BadRendering("range bound"))
                };
                let subprint = Subprint::from_str(caps.get(3).unwrap().as_str())?;
                pending = Some(((number(1)?, number(2)?), subprint));
            } else if score_re.is_match(line) {
                // score lines are redundant with the subprint fields
                continue;
            } else if !line.trim().is_empty() {
                return Err(Error::BadRendering("unrecognized line"));
            }
        }

        Ok(prints)
    }
}

impl Display for Fingerprints {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (score, entries) in &self.scores {
            writeln!(f, "{}", score)?;
            for (entry, substring) in entries.iter().sorted_by_key(|(entry, _)| **entry) {
                writeln!(
                    f,
                    "    ({}, {}) {}",
                    entry.range.0, entry.range.1, entry.subprint
                )?;
                writeln!(
                    f,
                    "        {}",
                    serde_json::to_string(substring).expect("encode substring")
                )?;
            }
        }
        Ok(())
    }
}

/// Counters accumulated over every suffix search and threshold pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SearchStats {
    pub fruitful_prefix_searches: u64,
    pub fruitless_prefix_searches: u64,
    pub features_found: u64,
    pub fruitless_feature_searches: u64,
    pub passes: u64,
}

impl SearchStats {
    pub fn absorb(&mut self, other: SearchStats) {
        self.fruitful_prefix_searches += other.fruitful_prefix_searches;
        self.fruitless_prefix_searches += other.fruitless_prefix_searches;
        self.features_found += other.features_found;
        self.fruitless_feature_searches += other.fruitless_feature_searches;
        self.passes += other.passes;
    }
}

impl Display for SearchStats {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "passes: {}", self.passes)?;
        writeln!(
            f,
            "prefix searches: {} fruitful, {} fruitless",
            self.fruitful_prefix_searches, self.fruitless_prefix_searches
        )?;
        write!(
            f,
            "features: {} found, {} fruitless searches",
            self.features_found, self.fruitless_feature_searches
        )
    }
}
