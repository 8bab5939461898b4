//! The diff engine: renders the difference between an expected and an
//! actual value.
//!
//! Single-line values produce a scalar `actual != expected` report.
//! As soon as either side spans several lines the values are compared
//! line by line (LCS, via the `difference` crate) and grouped into
//! unified-diff hunks. When every change is a whitespace change, both
//! sides are re-rendered with visible whitespace glyphs.
//!
//! Output depends on nothing but the inputs, so the same pair always
//! renders byte for byte the same.

use std::fmt::Write;

use difference::{Changeset, Difference};

use crate::comparison::Operand;

/// Unchanged lines shown around each hunk unless configured otherwise.
pub const DEFAULT_CONTEXT: usize = 2;

/// One line of a line-oriented diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Equal(String),
    /// Present in the actual value only.
    Insert(String),
    /// Present in the expected value only.
    Delete(String),
}

impl Segment {
    pub fn line(&self) -> &str {
        match self {
            Segment::Equal(s) | Segment::Insert(s) | Segment::Delete(s) => s,
        }
    }

    fn prefix(&self) -> char {
        match self {
            Segment::Equal(_) => ' ',
            Segment::Insert(_) => '+',
            Segment::Delete(_) => '-',
        }
    }

    fn is_change(&self) -> bool {
        !matches!(self, Segment::Equal(_))
    }
}

/// A contiguous group of changes with surrounding context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
    /// Zero-based first line of the hunk in the expected value.
    pub expected_start: usize,
    pub expected_len: usize,
    /// Zero-based first line of the hunk in the actual value.
    pub actual_start: usize,
    pub actual_len: usize,
    pub segments: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffReport {
    /// Both sides are identical.
    Same,
    /// Single-line values. When `whitespace_only` is set the texts have
    /// already been rendered with visible whitespace.
    Scalar {
        expected: String,
        actual: String,
        whitespace_only: bool,
    },
    /// Multi-line values.
    Lines {
        hunks: Vec<Hunk>,
        whitespace_only: bool,
    },
}

/// Label and type shown for one side of a rendered report.
#[derive(Debug, Clone, Copy, Default)]
pub struct Side<'a> {
    pub label: Option<&'a str>,
    pub type_name: Option<&'a str>,
}

impl<'a> Side<'a> {
    pub fn new(label: Option<&'a str>, type_name: Option<&'a str>) -> Self {
        Self { label, type_name }
    }
}

/// Computes the difference between `expected` and `actual`.
pub fn diff(expected: &str, actual: &str) -> DiffReport {
    diff_with_context(expected, actual, DEFAULT_CONTEXT)
}

pub fn diff_with_context(expected: &str, actual: &str, context: usize) -> DiffReport {
    if expected == actual {
        return DiffReport::Same;
    }
    if !expected.contains('\n') && !actual.contains('\n') {
        return scalar(expected, actual);
    }

    let segments = line_segments(expected, actual);
    let whitespace_only = only_whitespace_changes(&segments);
    let hunks = group_hunks(&segments, context);
    DiffReport::Lines {
        hunks,
        whitespace_only,
    }
}

/// Diffs two operands. Text operands are compared on their raw text when
/// that is multi-line or differs only by whitespace; everything else is
/// reported on the operands' renderings.
pub fn diff_operands(expected: &Operand, actual: &Operand, context: usize) -> DiffReport {
    if let (Some(e), Some(a)) = (expected.text(), actual.text()) {
        let report = diff_with_context(e, a, context);
        if report.is_multiline() || report.whitespace_only() {
            return report;
        }
    }
    if expected.rendered() == actual.rendered() {
        // Equal renderings of unequal values; keep the report readable.
        return DiffReport::Scalar {
            expected: expected.rendered().to_string(),
            actual: actual.rendered().to_string(),
            whitespace_only: false,
        };
    }
    diff_with_context(expected.rendered(), actual.rendered(), context)
}

impl DiffReport {
    pub fn is_same(&self) -> bool {
        matches!(self, DiffReport::Same)
    }

    pub fn is_multiline(&self) -> bool {
        matches!(self, DiffReport::Lines { .. })
    }

    pub fn whitespace_only(&self) -> bool {
        match self {
            DiffReport::Same => false,
            DiffReport::Scalar {
                whitespace_only, ..
            }
            | DiffReport::Lines {
                whitespace_only, ..
            } => *whitespace_only,
        }
    }

    /// All segments of all hunks, in order.
    pub fn segments(&self) -> impl Iterator<Item = &Segment> {
        let hunks: &[Hunk] = match self {
            DiffReport::Lines { hunks, .. } => hunks,
            _ => &[],
        };
        hunks.iter().flat_map(|h| h.segments.iter())
    }

    pub fn inserted(&self) -> Vec<&str> {
        self.segments()
            .filter(|s| matches!(s, Segment::Insert(_)))
            .map(Segment::line)
            .collect()
    }

    pub fn deleted(&self) -> Vec<&str> {
        self.segments()
            .filter(|s| matches!(s, Segment::Delete(_)))
            .map(Segment::line)
            .collect()
    }

    /// Renders the report. Scalars read `actual (label type) != expected
    /// (label type)`; line diffs are rendered in unified format.
    pub fn render(&self, expected: Side<'_>, actual: Side<'_>) -> String {
        match self {
            DiffReport::Same => String::new(),
            DiffReport::Scalar {
                expected: e,
                actual: a,
                ..
            } => format!("{}{} != {}{}", a, annotation(actual), e, annotation(expected)),
            DiffReport::Lines {
                hunks,
                whitespace_only,
            } => {
                let mut out = String::new();
                let _ = writeln!(out, "--- {}", expected.label.unwrap_or("expected"));
                let _ = writeln!(out, "+++ {}", actual.label.unwrap_or("actual"));
                for hunk in hunks {
                    let _ = writeln!(
                        out,
                        "@@ -{} +{} @@",
                        unified_range(hunk.expected_start, hunk.expected_len),
                        unified_range(hunk.actual_start, hunk.actual_len)
                    );
                    for segment in &hunk.segments {
                        out.push(segment.prefix());
                        if *whitespace_only {
                            out.push_str(&visible_whitespace(segment.line()));
                        } else {
                            out.push_str(segment.line());
                        }
                        out.push('\n');
                    }
                }
                out
            }
        }
    }
}

// ============================================================================
// PRIVATE HELPERS
// ============================================================================

fn scalar(expected: &str, actual: &str) -> DiffReport {
    if strip_whitespace(expected) == strip_whitespace(actual) {
        return DiffReport::Scalar {
            expected: visible_whitespace(expected),
            actual: visible_whitespace(actual),
            whitespace_only: true,
        };
    }
    DiffReport::Scalar {
        expected: expected.to_string(),
        actual: actual.to_string(),
        whitespace_only: false,
    }
}

fn annotation(side: Side<'_>) -> String {
    match (side.label, side.type_name) {
        (Some(label), Some(ty)) => format!(" ({label} {ty})"),
        (Some(only), None) | (None, Some(only)) => format!(" ({only})"),
        (None, None) => String::new(),
    }
}

fn line_segments(expected: &str, actual: &str) -> Vec<Segment> {
    // A shared trailing newline is not a line of its own.
    let (expected, actual) = match (expected.strip_suffix('\n'), actual.strip_suffix('\n')) {
        (Some(e), Some(a)) => (e, a),
        _ => (expected, actual),
    };

    let changeset = Changeset::new(expected, actual, "\n");
    let mut segments = Vec::new();
    for chunk in &changeset.diffs {
        match chunk {
            Difference::Same(text) => {
                segments.extend(text.split('\n').map(|l| Segment::Equal(l.to_string())))
            }
            Difference::Add(text) => {
                segments.extend(text.split('\n').map(|l| Segment::Insert(l.to_string())))
            }
            Difference::Rem(text) => {
                segments.extend(text.split('\n').map(|l| Segment::Delete(l.to_string())))
            }
        }
    }
    segments
}

/// Each run of changes between unchanged lines must delete and insert the
/// same text once whitespace is stripped. A line that only moved shows up
/// as two runs, each changing non-whitespace text.
fn only_whitespace_changes(segments: &[Segment]) -> bool {
    segments
        .split(|s| !s.is_change())
        .filter(|run| !run.is_empty())
        .all(|run| {
            let mut removed = String::new();
            let mut added = String::new();
            for segment in run {
                match segment {
                    Segment::Delete(l) => removed.push_str(&strip_whitespace(l)),
                    Segment::Insert(l) => added.push_str(&strip_whitespace(l)),
                    Segment::Equal(_) => {}
                }
            }
            removed == added
        })
}

fn group_hunks(segments: &[Segment], context: usize) -> Vec<Hunk> {
    let changes: Vec<usize> = segments
        .iter()
        .enumerate()
        .filter(|(_, s)| s.is_change())
        .map(|(i, _)| i)
        .collect();

    // Merge change positions whose context windows touch or overlap.
    let mut ranges: Vec<(usize, usize)> = Vec::new();
    for &i in &changes {
        let start = i.saturating_sub(context);
        let end = (i + context + 1).min(segments.len());
        match ranges.last_mut() {
            Some(last) if start <= last.1 => last.1 = end,
            _ => ranges.push((start, end)),
        }
    }

    // Line numbers at each segment position.
    let mut positions = Vec::with_capacity(segments.len() + 1);
    let (mut e, mut a) = (0usize, 0usize);
    for segment in segments {
        positions.push((e, a));
        match segment {
            Segment::Equal(_) => {
                e += 1;
                a += 1;
            }
            Segment::Delete(_) => e += 1,
            Segment::Insert(_) => a += 1,
        }
    }
    positions.push((e, a));

    ranges
        .into_iter()
        .map(|(start, end)| {
            let (e0, a0) = positions[start];
            let (e1, a1) = positions[end];
            Hunk {
                expected_start: e0,
                expected_len: e1 - e0,
                actual_start: a0,
                actual_len: a1 - a0,
                segments: segments[start..end].to_vec(),
            }
        })
        .collect()
}

/// Formats a range the way unified diffs do: one-based, with the length
/// omitted when it is one and the start moved back for empty ranges.
fn unified_range(start: usize, len: usize) -> String {
    match len {
        1 => format!("{}", start + 1),
        0 => format!("{},0", start),
        _ => format!("{},{}", start + 1, len),
    }
}

fn strip_whitespace(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Replaces whitespace with visible glyphs. Line breaks are kept.
pub fn visible_whitespace(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '\n' => '\n',
            ' ' => '·',
            '\t' => '▷',
            '\u{0b}' => '▽',
            '\r' => '↵',
            '\u{0c}' => '↓',
            c if c.is_whitespace() => '�',
            c => c,
        })
        .collect()
}
