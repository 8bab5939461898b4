//! Diff engine tests.

use attest::cmp;
use attest::diff::{diff, diff_with_context, DiffReport, Segment, Side};
use attest::host::Recorder;

#[cfg(test)]
mod scalar_tests {
    use super::*;

    #[test]
    fn test_identical_values_are_same() {
        assert!(diff("a\nb", "a\nb").is_same());
        assert_eq!(diff("x", "x").render(Side::default(), Side::default()), "");
    }

    #[test]
    fn test_scalar_rendering() {
        let report = diff("10", "11");
        assert!(!report.is_multiline());
        assert!(!report.whitespace_only());
        assert_eq!(
            report.render(Side::new(Some("want"), Some("u8")), Side::new(Some("got"), Some("u8"))),
            "11 (got u8) != 10 (want u8)"
        );
    }

    #[test]
    fn test_tab_versus_space_is_whitespace_only() {
        let report = diff("a b", "a\tb");
        assert!(report.whitespace_only());
        let rendered = report.render(Side::default(), Side::default());
        assert_eq!(rendered, "a▷b != a·b");
    }
}

#[cfg(test)]
mod line_tests {
    use super::*;

    #[test]
    fn test_inserted_line_lands_in_insert_segment() {
        let report = diff("one\nthree\n", "one\ntwo\nthree\n");
        assert!(report.is_multiline());
        assert_eq!(report.inserted(), vec!["two"]);
        assert!(report.deleted().is_empty());
    }

    #[test]
    fn test_removed_line_lands_in_delete_segment() {
        let report = diff("one\ntwo\nthree", "one\nthree");
        assert_eq!(report.deleted(), vec!["two"]);
        assert!(report.inserted().is_empty());
        let segments: Vec<&Segment> = report.segments().collect();
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[1], &Segment::Delete("two".to_string()));
    }

    #[test]
    fn test_unified_rendering() {
        let report = diff("a\nb\nc\n", "a\nB\nc\n");
        assert_eq!(
            report.render(Side::default(), Side::default()),
            "--- expected\n+++ actual\n@@ -1,3 +1,3 @@\n a\n-b\n+B\n c\n"
        );
    }

    #[test]
    fn test_distant_changes_form_separate_hunks() {
        let expected: Vec<String> = (1..=10).map(|i| format!("line {i}")).collect();
        let mut actual = expected.clone();
        actual[1] = "changed 2".to_string();
        actual[8] = "changed 9".to_string();
        let report = diff(&expected.join("\n"), &actual.join("\n"));
        match &report {
            DiffReport::Lines { hunks, .. } => {
                assert_eq!(hunks.len(), 2);
                assert_eq!((hunks[0].expected_start, hunks[0].expected_len), (0, 4));
                assert_eq!((hunks[1].actual_start, hunks[1].actual_len), (6, 4));
            }
            other => panic!("expected a line diff, got {other:?}"),
        }
    }

    #[test]
    fn test_context_is_configurable() {
        let expected = "1\n2\n3\n4\n5\n6\n7";
        let actual = "1\n2\n3\nfour\n5\n6\n7";
        let report = diff_with_context(expected, actual, 0);
        let rendered = report.render(Side::default(), Side::default());
        assert_eq!(rendered, "--- expected\n+++ actual\n@@ -4 +4 @@\n-4\n+four\n");
    }

    #[test]
    fn test_whitespace_only_lines_use_glyphs() {
        let report = diff("a\n  b\n", "a\n\tb\n");
        assert!(report.whitespace_only());
        let rendered = report.render(Side::default(), Side::default());
        assert!(rendered.contains("\n-··b\n"), "{rendered}");
        assert!(rendered.contains("\n+▷b\n"), "{rendered}");
    }

    #[test]
    fn test_moved_line_is_not_a_whitespace_change() {
        let report = diff("a\nb\nc", "a\nc\nb");
        assert!(!report.whitespace_only());
        let rendered = report.render(Side::default(), Side::default());
        assert!(!rendered.contains('·'), "{rendered}");
    }

    #[test]
    fn test_swapped_lines_through_equal_keep_plain_text() {
        let mut t = Recorder::new();
        let got = "first line\nsecond line\nthird line";
        let want = "second line\nfirst line\nthird line";
        attest::check(&mut t, cmp::equal(&got, &want), &[]);
        let out = t.output();
        assert!(out.starts_with("assertion failed: values are not equal:\n"), "{out}");
        assert!(out.contains("first line"), "{out}");
        assert!(!out.contains('·'), "{out}");
    }

    #[test]
    fn test_output_is_deterministic() {
        let expected = "alpha\nbeta\ngamma\ndelta\n";
        let actual = "alpha\nBETA\ngamma\nepsilon\n";
        let first = diff(expected, actual).render(Side::default(), Side::default());
        for _ in 0..10 {
            let again = diff(expected, actual).render(Side::default(), Side::default());
            assert_eq!(first, again);
        }
    }
}
