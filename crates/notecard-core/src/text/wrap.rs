//! Greedy line wrapping over a shaped run.

use std::ops::Range;

use unicode_segmentation::UnicodeSegmentation;

use super::shaping::ShapedRun;
use crate::content::TextLine;

/// Splits `line` into rune ranges whose visible width fits `max_width`.
///
/// Breaks happen after whitespace, never inside a classified span. A single
/// word or span wider than the line is cut at grapheme boundaries.
pub fn wrap_line(run: &ShapedRun, line: &TextLine, max_width: f32) -> Vec<Range<usize>> {
    let runes = line.runes();
    let mut lines = Vec::new();
    if runes.is_empty() {
        return lines;
    }

    let mut line_start = 0;
    for unit in break_units(line) {
        let visible_end = trim_trailing_whitespace(runes, unit.clone());

        if unit.start > line_start && run.width_of(line_start..visible_end) > max_width {
            lines.push(line_start..unit.start);
            line_start = unit.start;
        }

        if run.width_of(line_start..visible_end) > max_width {
            line_start = split_oversized(run, runes, line_start..unit.end, max_width, &mut lines);
        }
    }

    if line_start < runes.len() {
        lines.push(line_start..runes.len());
    }
    lines
}

/// Unbreakable units: a word plus its trailing whitespace.
fn break_units(line: &TextLine) -> Vec<Range<usize>> {
    let runes = line.runes();
    let mut units = Vec::new();
    let mut start = 0;
    for pos in 1..runes.len() {
        if is_break_opportunity(line, pos) {
            units.push(start..pos);
            start = pos;
        }
    }
    units.push(start..runes.len());
    units
}

fn is_break_opportunity(line: &TextLine, pos: usize) -> bool {
    let runes = line.runes();
    if !runes[pos - 1].is_whitespace() || runes[pos].is_whitespace() {
        return false;
    }
    match (line.span_at(pos - 1), line.span_at(pos)) {
        (Some(before), Some(after)) => before != after,
        _ => true,
    }
}

fn trim_trailing_whitespace(runes: &[char], range: Range<usize>) -> usize {
    let mut end = range.end;
    while end > range.start && runes[end - 1].is_whitespace() {
        end -= 1;
    }
    end
}

/// Cuts `range` at grapheme boundaries, pushing full lines.
///
/// Returns where the last partial line starts.
fn split_oversized(
    run: &ShapedRun,
    runes: &[char],
    range: Range<usize>,
    max_width: f32,
    lines: &mut Vec<Range<usize>>,
) -> usize {
    let text: String = runes[range.clone()].iter().collect();
    let mut segment_start = range.start;
    let mut pos = range.start;

    for grapheme in text.graphemes(true) {
        let next = pos + grapheme.chars().count();
        let visible_end = trim_trailing_whitespace(runes, segment_start..next);
        if pos > segment_start && run.width_of(segment_start..visible_end) > max_width {
            lines.push(segment_start..pos);
            segment_start = pos;
        }
        pos = next;
    }

    segment_start
}
