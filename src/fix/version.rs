//! Fix-version ranges in the feed's interval notation.
//!
//! ```text
//! 1.0          1.0 <= x
//! (,1.0]       x <= 1.0
//! (,1.0)       x < 1.0
//! [1.0]        x == 1.0
//! (1.0,)       1.0 < x
//! (1.0, 2.0)   1.0 < x < 2.0
//! [1.0, 2.0]   1.0 <= x <= 2.0
//! ```
//!
//! Only a closed lower bound is actionable: it is the smallest version that
//! contains the fix.

use std::cmp::Ordering;

/// Resolves the minimal fixed version of a range, or `None` when the range
/// has no inclusive lower bound.
///
/// Only the first comma-delimited segment is consulted.
pub fn parse_fix_version(range: &str) -> Option<String> {
    let lower = range.split(',').next()?.trim();
    if lower.starts_with('(') {
        return None;
    }
    let version = lower.trim_start_matches('[').trim_end_matches(']').trim();
    if version.is_empty() {
        return None;
    }
    Some(version.to_string())
}

/// Orders two version strings the way release numbers are read.
///
/// A leading `v` and `+build` metadata are ignored. Dot-separated segments
/// compare numerically when both are numbers and lexically otherwise;
/// missing segments count as zero. A pre-release (`1.0.0-rc1`) sorts before
/// its release.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let (a_core, a_pre) = split_version(a);
    let (b_core, b_pre) = split_version(b);

    let a_segments: Vec<&str> = a_core.split('.').collect();
    let b_segments: Vec<&str> = b_core.split('.').collect();
    for i in 0..a_segments.len().max(b_segments.len()) {
        let ordering = compare_segment(
            a_segments.get(i).copied().unwrap_or("0"),
            b_segments.get(i).copied().unwrap_or("0"),
        );
        if ordering != Ordering::Equal {
            return ordering;
        }
    }

    match (a_pre, b_pre) {
        (None, None) => Ordering::Equal,
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (Some(a_pre), Some(b_pre)) => a_pre
            .split('.')
            .zip(b_pre.split('.'))
            .map(|(x, y)| compare_segment(x, y))
            .find(|ordering| *ordering != Ordering::Equal)
            .unwrap_or_else(|| a_pre.split('.').count().cmp(&b_pre.split('.').count())),
    }
}

fn split_version(version: &str) -> (&str, Option<&str>) {
    let version = version.trim();
    let version = version.strip_prefix('v').unwrap_or(version);
    let version = version.split_once('+').map_or(version, |(core, _)| core);
    match version.split_once('-') {
        Some((core, pre)) => (core, Some(pre)),
        None => (version, None),
    }
}

fn compare_segment(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}
