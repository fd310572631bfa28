//! Capacity model — measures page content against a paper profile.
//!
//! Everything here works on *effective* text: the content string with markup
//! tags removed and basic entities decoded to the single character they
//! render as. Formatting never counts against a page's budget, so the same
//! scanner must back every measurement — `strip_markup`, `effective_length`
//! and the split-point search all walk the content through
//! [`effective_chars`] to stay mutually consistent.

use crate::config::EngineConfig;
use crate::models::page::PageStatus;
use crate::models::paper::PaperProfile;

// ────────────────────────────────────────────────────────────────────────────
// Effective-character scanner
// ────────────────────────────────────────────────────────────────────────────

/// One rendered character of a markup string, with the byte offset of the
/// source sequence that produced it (a plain char or an entity).
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct EffChar {
    pub start: usize,
    pub ch: char,
}

/// Iterator over the effective characters of a markup string.
///
/// Tag tokens (`<` … `>`) are skipped whole. Recognized entities decode to
/// one character; an unrecognized `&` run is emitted literally. A `<` with no
/// closing `>` is treated as a literal character rather than swallowing the
/// rest of the string.
pub(crate) struct EffectiveChars<'a> {
    content: &'a str,
    pos: usize,
}

/// Longest recognized entity is 6 bytes (`&nbsp;`); 8 leaves headroom.
const ENTITY_SCAN_BYTES: usize = 8;

impl<'a> Iterator for EffectiveChars<'a> {
    type Item = EffChar;

    fn next(&mut self) -> Option<EffChar> {
        loop {
            let rest = &self.content[self.pos..];
            let ch = rest.chars().next()?;
            match ch {
                '<' => {
                    if let Some(close) = rest.find('>') {
                        self.pos += close + 1;
                        continue;
                    }
                    let start = self.pos;
                    self.pos += ch.len_utf8();
                    return Some(EffChar { start, ch });
                }
                '&' => {
                    let scan = rest.len().min(ENTITY_SCAN_BYTES);
                    if let Some(semi) = rest.as_bytes()[..scan].iter().position(|&b| b == b';') {
                        if let Some(decoded) = decode_entity(&rest[..=semi]) {
                            let start = self.pos;
                            self.pos += semi + 1;
                            return Some(EffChar { start, ch: decoded });
                        }
                    }
                    let start = self.pos;
                    self.pos += 1;
                    return Some(EffChar { start, ch: '&' });
                }
                _ => {
                    let start = self.pos;
                    self.pos += ch.len_utf8();
                    return Some(EffChar { start, ch });
                }
            }
        }
    }
}

pub(crate) fn effective_chars(content: &str) -> EffectiveChars<'_> {
    EffectiveChars { content, pos: 0 }
}

fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "&nbsp;" => Some(' '),
        "&amp;" => Some('&'),
        "&lt;" => Some('<'),
        "&gt;" => Some('>'),
        "&quot;" => Some('"'),
        "&#39;" | "&apos;" => Some('\''),
        _ => None,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Measurements
// ────────────────────────────────────────────────────────────────────────────

/// Returns the content with markup removed and entities decoded.
pub fn strip_markup(content: &str) -> String {
    effective_chars(content).map(|e| e.ch).collect()
}

/// Stripped character length — the quantity compared against capacity.
pub fn effective_length(content: &str) -> usize {
    effective_chars(content).count()
}

/// Whitespace-separated token count of the stripped text.
pub fn word_count(content: &str) -> usize {
    let mut count = 0;
    let mut in_word = false;
    for e in effective_chars(content) {
        if e.ch.is_whitespace() {
            in_word = false;
        } else if !in_word {
            in_word = true;
            count += 1;
        }
    }
    count
}

/// Stripped length at which a page counts as `Complete` for this profile.
pub fn complete_threshold(profile: &PaperProfile, config: &EngineConfig) -> usize {
    (profile.capacity as f32 * config.complete_ratio).ceil() as usize
}

/// Classifies content as `Empty`, `Draft`, or `Complete`.
pub fn classify(content: &str, profile: &PaperProfile, config: &EngineConfig) -> PageStatus {
    let length = effective_length(content);
    if length == 0 {
        PageStatus::Empty
    } else if length >= complete_threshold(profile, config) {
        PageStatus::Complete
    } else {
        PageStatus::Draft
    }
}

/// True when the join of `prev` and `next` already carries whitespace at the
/// seam, so concatenating them does not glue two words together.
pub(crate) fn seam_has_whitespace(prev: &str, next: &str) -> bool {
    let prev_last = effective_chars(prev).last().map(|e| e.ch);
    let next_first = effective_chars(next).next().map(|e| e.ch);
    match (prev_last, next_first) {
        (Some(p), Some(n)) => p.is_whitespace() || n.is_whitespace(),
        // One side renders no text at all — nothing to glue.
        _ => true,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
