// SPDX-FileCopyrightText: 2026 Mailroom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pattern-vs-pattern overlap heuristic.
//!
//! Decides whether two reservation patterns could both match some file. The
//! answer may be a false positive but must never be a false negative: a
//! missed overlap lets two agents edit the same file.

use mailroom_core::PathMatcher;

/// Characters that make a path segment a wildcard.
const GLOB_META: [char; 4] = ['*', '?', '[', '{'];

/// Whether `s` contains any glob metacharacter.
pub fn has_glob_meta(s: &str) -> bool {
    s.contains(GLOB_META)
}

fn normalize(pattern: &str) -> &str {
    let mut p = pattern.trim();
    while let Some(rest) = p.strip_prefix("./") {
        p = rest;
    }
    p.trim_end_matches('/')
}

fn segments(pattern: &str) -> impl Iterator<Item = &str> {
    pattern.split('/').filter(|s| !s.is_empty() && *s != ".")
}

/// Literal path segments before the first wildcard segment.
pub fn static_base(pattern: &str) -> Vec<&str> {
    segments(pattern).take_while(|s| !has_glob_meta(s)).collect()
}

fn has_recursive_segment(pattern: &str) -> bool {
    segments(pattern).any(|s| s.contains("**"))
}

/// A wildcard anywhere before the file name.
fn has_wild_directory(pattern: &str) -> bool {
    match pattern.rsplit_once('/') {
        Some((dir, _)) => has_glob_meta(dir),
        None => false,
    }
}

fn is_prefix(short: &[&str], long: &[&str]) -> bool {
    short.len() <= long.len() && short.iter().zip(long).all(|(a, b)| a == b)
}

fn split_parent(pattern: &str) -> (&str, &str) {
    pattern.rsplit_once('/').unwrap_or(("", pattern))
}

/// Whether patterns `a` and `b` may reserve a common file.
///
/// Rules, first hit wins:
/// 1. Identical after normalization.
/// 2. Either has a `**` segment (or a wildcard in a directory segment) and
///    one static base is a segment-wise prefix of the other.
/// 3. `matcher` matches in either direction, one string taken as a literal
///    path against the other as a pattern.
/// 4. Same parent directory, and a wildcard in either file name or equal
///    file names.
pub fn patterns_overlap(a: &str, b: &str, matcher: &dyn PathMatcher) -> bool {
    let (a, b) = (normalize(a), normalize(b));
    if a == b {
        return true;
    }

    let recursive = has_recursive_segment(a) || has_recursive_segment(b);
    if recursive || has_wild_directory(a) || has_wild_directory(b) {
        let (base_a, base_b) = (static_base(a), static_base(b));
        if is_prefix(&base_a, &base_b) || is_prefix(&base_b, &base_a) {
            return true;
        }
    }

    if matcher.matches(a, b) || matcher.matches(b, a) {
        return true;
    }

    let (parent_a, file_a) = split_parent(a);
    let (parent_b, file_b) = split_parent(b);
    parent_a == parent_b && (has_glob_meta(file_a) || has_glob_meta(file_b) || file_a == file_b)
}
