//! "Did you mean" corrections for mistyped package names.
//!
//! Generates every string one edit away (deletion, transposition,
//! alteration, insertion over `a..=z`) and keeps those found in the
//! dictionary; if none match, tries two edits. All dictionary words weigh
//! the same, so ties go to the lexically smallest candidate.

use std::collections::{BTreeMap, HashMap};

const ALPHABET: std::ops::RangeInclusive<char> = 'a'..='z';

fn edits(word: &[char], results: &mut Vec<String>) {
    let n = word.len();
    let join = |parts: &[&[char]]| -> String { parts.iter().flat_map(|p| p.iter()).collect() };

    for i in 0..n {
        results.push(join(&[&word[..i], &word[i + 1..]]));
    }
    for i in 0..n.saturating_sub(1) {
        results.push(join(&[&word[..i], &[word[i + 1], word[i]][..], &word[i + 2..]]));
    }
    for c in ALPHABET {
        for i in 0..n {
            results.push(join(&[&word[..i], &[c][..], &word[i + 1..]]));
        }
        for i in 0..=n {
            results.push(join(&[&word[..i], &[c][..], &word[i..]]));
        }
    }
}

fn known(results: &[String], dictionary: &HashMap<String, u32>, candidates: &mut BTreeMap<String, u32>) {
    for r in results {
        if let Some(weight) = dictionary.get(r) {
            candidates.insert(r.clone(), *weight);
        }
    }
}

fn best(candidates: &BTreeMap<String, u32>) -> Option<String> {
    // First maximum in key order
    let mut winner: Option<(&String, u32)> = None;
    for (word, weight) in candidates {
        match winner {
            Some((_, w)) if w >= *weight => {}
            _ => winner = Some((word, *weight)),
        }
    }
    winner.map(|(w, _)| w.clone())
}

/// Most likely correction of `word` among `dictionary`, or `None`.
pub fn correct<'a, I>(word: &str, dictionary: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let dictionary: HashMap<String, u32> = dictionary
        .into_iter()
        .map(|w| (w.to_string(), 1))
        .collect();
    if dictionary.is_empty() {
        return None;
    }
    if dictionary.contains_key(word) {
        return Some(word.to_string());
    }

    let chars: Vec<char> = word.chars().collect();
    let mut first = Vec::new();
    edits(&chars, &mut first);

    let mut candidates = BTreeMap::new();
    known(&first, &dictionary, &mut candidates);
    if !candidates.is_empty() {
        return best(&candidates);
    }

    for edited in &first {
        let edited: Vec<char> = edited.chars().collect();
        let mut second = Vec::new();
        edits(&edited, &mut second);
        known(&second, &dictionary, &mut candidates);
    }
    best(&candidates)
}

/// Format a "did you mean" hint, or an empty string.
pub fn hint<'a, I>(word: &str, dictionary: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    match correct(word, dictionary) {
        Some(s) if s != word => format!(" (did you mean '{}'?)", s),
        _ => String::new(),
    }
}
