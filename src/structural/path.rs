//! Paths into a captured value, and the patterns that select them.

use std::fmt;

use crate::errors::ValueError;

/// One step from a value to one of its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathStep {
    Field(&'static str),
    Index(usize),
    /// A map entry, named by the rendering of its key.
    Key(String),
}

/// A canonical path from the root of a compared value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Path(pub Vec<PathStep>);

impl Path {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn child(&self, step: PathStep) -> Path {
        let mut steps = self.0.clone();
        steps.push(step);
        Path(steps)
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            return write!(f, "(root)");
        }
        for (i, step) in self.0.iter().enumerate() {
            match step {
                PathStep::Field(name) if i == 0 => write!(f, "{name}")?,
                PathStep::Field(name) => write!(f, ".{name}")?,
                PathStep::Index(n) => write!(f, "[{n}]")?,
                PathStep::Key(key) => write!(f, "[{key}]")?,
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PatternStep {
    Field(String),
    /// `[n]`: a sequence index, or a map key rendered as `n`.
    Index(usize),
    /// `["k"]` or any other bracketed text: a map key by rendering.
    Key(String),
    /// `[*]`: any index or key.
    Any,
}

/// A parsed path pattern such as `items[*].id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    source: String,
    steps: Vec<PatternStep>,
}

impl PathPattern {
    pub fn parse(pattern: &str) -> Result<Self, ValueError> {
        let invalid = |reason: &str| ValueError::InvalidPath {
            pattern: pattern.to_string(),
            reason: reason.to_string(),
        };
        let chars: Vec<char> = pattern.trim().chars().collect();
        if chars.is_empty() {
            return Err(invalid("pattern is empty"));
        }

        let mut steps = Vec::new();
        let mut i = 0;
        while i < chars.len() {
            match chars[i] {
                '.' if steps.is_empty() || i + 1 == chars.len() => {
                    return Err(invalid("misplaced `.`"));
                }
                '.' => i += 1,
                '[' => {
                    let close = find_bracket_close(&chars, i)
                        .ok_or_else(|| invalid("unclosed `[`"))?;
                    let inner: String = chars[i + 1..close].iter().collect();
                    let inner = inner.trim();
                    steps.push(match inner {
                        "" => return Err(invalid("empty `[]`")),
                        "*" => PatternStep::Any,
                        _ => match inner.parse::<usize>() {
                            Ok(n) => PatternStep::Index(n),
                            Err(_) => PatternStep::Key(inner.to_string()),
                        },
                    });
                    i = close + 1;
                }
                c if c.is_alphanumeric() || c == '_' => {
                    let start = i;
                    while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                        i += 1;
                    }
                    steps.push(PatternStep::Field(chars[start..i].iter().collect()));
                }
                c => return Err(invalid(&format!("unexpected `{c}`"))),
            }
        }
        Ok(Self {
            source: pattern.to_string(),
            steps,
        })
    }

    pub fn matches(&self, path: &Path) -> bool {
        self.steps.len() == path.0.len()
            && self
                .steps
                .iter()
                .zip(&path.0)
                .all(|(pattern, step)| match (pattern, step) {
                    (PatternStep::Field(p), PathStep::Field(s)) => p.as_str() == *s,
                    (PatternStep::Index(p), PathStep::Index(s)) => p == s,
                    (PatternStep::Index(p), PathStep::Key(k)) => k == &p.to_string(),
                    (PatternStep::Key(p), PathStep::Key(k)) => p == k,
                    (PatternStep::Any, PathStep::Index(_) | PathStep::Key(_)) => true,
                    _ => false,
                })
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}

fn find_bracket_close(chars: &[char], open: usize) -> Option<usize> {
    let mut in_string = false;
    let mut j = open + 1;
    while j < chars.len() {
        match chars[j] {
            '\\' if in_string => j += 1,
            '"' => in_string = !in_string,
            ']' if !in_string => return Some(j),
            _ => {}
        }
        j += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(steps: Vec<PathStep>) -> Path {
        Path(steps)
    }

    #[test]
    fn test_display() {
        assert_eq!(Path::root().to_string(), "(root)");
        let p = path(vec![
            PathStep::Field("items"),
            PathStep::Index(2),
            PathStep::Field("id"),
        ]);
        assert_eq!(p.to_string(), "items[2].id");
        let p = path(vec![PathStep::Key("\"alice\"".into()), PathStep::Field("score")]);
        assert_eq!(p.to_string(), "[\"alice\"].score");
    }

    #[test]
    fn test_pattern_matching() {
        let pattern = PathPattern::parse("items[*].id").unwrap();
        assert!(pattern.matches(&path(vec![
            PathStep::Field("items"),
            PathStep::Index(7),
            PathStep::Field("id"),
        ])));
        assert!(!pattern.matches(&path(vec![PathStep::Field("items"), PathStep::Index(7)])));

        let pattern = PathPattern::parse("scores[\"alice\"]").unwrap();
        assert!(pattern.matches(&path(vec![
            PathStep::Field("scores"),
            PathStep::Key("\"alice\"".into()),
        ])));
        assert!(!pattern.matches(&path(vec![
            PathStep::Field("scores"),
            PathStep::Key("\"bob\"".into()),
        ])));

        let pattern = PathPattern::parse("[0]").unwrap();
        assert!(pattern.matches(&path(vec![PathStep::Index(0)])));
    }

    #[test]
    fn test_invalid_patterns() {
        for bad in ["", ".a", "a.", "a[", "a[]", "a-b"] {
            assert!(
                matches!(PathPattern::parse(bad), Err(ValueError::InvalidPath { .. })),
                "{bad:?} should be rejected"
            );
        }
    }
}
