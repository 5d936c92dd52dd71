// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded text helpers
//!
//! Logs can be arbitrarily large. Everything that keeps or forwards log text
//! goes through these helpers so the retained size is capped and any cut is
//! visible to the reader.

use std::borrow::Cow;

/// Marker prefixed to text whose head was dropped
pub const TRUNCATED_PREFIX: &str = "[truncated ";

/// Keep at most `max_bytes` from the end of `text`.
///
/// Failures are reported at the end of a log, so the tail is kept. When a
/// cut happens the result starts with `[truncated N bytes]` on its own line.
/// The cut never splits a UTF-8 character.
pub fn truncate_tail(text: &str, max_bytes: usize) -> Cow<'_, str> {
    if text.len() <= max_bytes {
        return Cow::Borrowed(text);
    }
    let mut start = text.len() - max_bytes;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    Cow::Owned(format!(
        "{}{} bytes]\n{}",
        TRUNCATED_PREFIX,
        start,
        &text[start..]
    ))
}

/// Keep at most `max_chars` characters from the end of `text`
pub fn tail_chars(text: &str, max_chars: usize) -> Cow<'_, str> {
    let total = text.chars().count();
    if total <= max_chars {
        return Cow::Borrowed(text);
    }
    let skip = total - max_chars;
    let start = text
        .char_indices()
        .nth(skip)
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    Cow::Owned(format!(
        "{}{} chars]\n{}",
        TRUNCATED_PREFIX,
        skip,
        &text[start..]
    ))
}

/// Window of at most `max_chars` characters around the byte range
/// `start..end`, with `...` where either side was cut.
///
/// The match itself is kept whole when it fits; a match longer than the
/// window is cut at the window edge.
pub fn excerpt_around(text: &str, start: usize, end: usize, max_chars: usize) -> String {
    if max_chars == 0 || text.is_empty() {
        return String::new();
    }
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let first = chars.partition_point(|(i, _)| *i < start);
    let last = chars.partition_point(|(i, _)| *i < end).max(first);
    let match_len = last - first;

    let (from, to) = if match_len >= max_chars {
        (first, first + max_chars)
    } else {
        let spare = max_chars - match_len;
        let before = (spare / 2).min(first);
        let after = (spare - before).min(chars.len() - last);
        // Give unused room on the right back to the left
        let before = (spare - after).min(first);
        (first - before, last + after)
    };

    let mut out = String::new();
    if from > 0 {
        out.push_str("...");
    }
    out.extend(chars[from..to.min(chars.len())].iter().map(|(_, c)| *c));
    if to < chars.len() {
        out.push_str("...");
    }
    out.trim().to_string()
}

/// The excerpted text without the markers added by [`tail_chars`] and
/// [`excerpt_around`]
pub fn excerpt_body(excerpt: &str) -> &str {
    let body = match excerpt.strip_prefix(TRUNCATED_PREFIX) {
        Some(rest) => rest.split_once('\n').map_or("", |(_, tail)| tail),
        None => excerpt,
    };
    let body = body.strip_prefix("...").unwrap_or(body);
    body.strip_suffix("...").unwrap_or(body)
}

#[cfg(test)]
#[path = "text_tests.rs"]
mod tests;
