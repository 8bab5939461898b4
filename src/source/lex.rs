//! A permissive scanner for Rust source snippets.
//!
//! This is not a parser. It only knows enough to tell code apart from
//! string/char literals and comments, and to track bracket nesting, which
//! is all that splitting one call's argument list needs.

/// A scanned snippet: its characters, which of them are code, and the
/// bracket depth at each of them.
pub(crate) struct Scan {
    pub chars: Vec<char>,
    code: Vec<bool>,
    depth: Vec<usize>,
}

impl Scan {
    pub fn new(text: &str) -> Self {
        let chars: Vec<char> = text.chars().collect();
        let code = code_mask(&chars);
        let depth = depths(&chars, &code);
        Self { chars, code, depth }
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_code(&self, i: usize) -> bool {
        self.code.get(i).copied().unwrap_or(false)
    }

    pub fn depth(&self, i: usize) -> usize {
        self.depth.get(i).copied().unwrap_or(0)
    }

    /// True for code characters outside every bracket pair.
    pub fn is_top_level(&self, i: usize) -> bool {
        self.is_code(i) && self.depth(i) == 0 && !self.is_bracket(i)
    }

    pub fn is_bracket(&self, i: usize) -> bool {
        self.is_code(i) && matches!(self.chars[i], '(' | ')' | '[' | ']' | '{' | '}')
            || self.is_angle(i)
    }

    fn is_angle(&self, i: usize) -> bool {
        self.is_code(i)
            && match self.chars[i] {
                '<' => i >= 2 && self.chars[i - 1] == ':' && self.chars[i - 2] == ':',
                '>' => i > 0 && self.depth(i - 1) > self.depth(i),
                _ => false,
            }
    }

    /// Index of the bracket closing the one opened at `open`.
    pub fn matching_close(&self, open: usize) -> Option<usize> {
        let base = self.depth(open);
        (open + 1..self.len()).find(|&j| {
            self.is_code(j) && self.depth(j) == base && is_close(self.chars[j])
        })
    }

    pub fn slice(&self, start: usize, end: usize) -> String {
        self.chars[start.min(self.len())..end.min(self.len())]
            .iter()
            .collect()
    }
}

/// Splits `text` at top-level commas. A trailing comma is ignored.
pub(crate) fn split_top_level(text: &str) -> Vec<String> {
    let scan = Scan::new(text);
    let mut parts = Vec::new();
    let mut start = 0;
    for i in 0..scan.len() {
        if scan.chars[i] == ',' && scan.is_top_level(i) {
            parts.push(scan.slice(start, i).trim().to_string());
            start = i + 1;
        }
    }
    parts.push(scan.slice(start, scan.len()).trim().to_string());
    if parts.last().is_some_and(|p| p.is_empty()) {
        parts.pop();
    }
    parts
}

pub(crate) fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn is_close(c: char) -> bool {
    matches!(c, ')' | ']' | '}' | '>')
}

fn code_mask(chars: &[char]) -> Vec<bool> {
    let mut mask = vec![true; chars.len()];
    let mut i = 0;
    while i < chars.len() {
        let end = match (chars[i], chars.get(i + 1).copied()) {
            ('/', Some('/')) => Some(line_comment_end(chars, i)),
            ('/', Some('*')) => Some(block_comment_end(chars, i)),
            ('"', _) => Some(string_end(chars, i)),
            ('r', Some('"' | '#')) if raw_prefix_allowed(chars, i) => raw_string_end(chars, i),
            ('\'', _) => char_literal_end(chars, i),
            _ => None,
        };
        match end {
            Some(end) => {
                mask[i..end].fill(false);
                i = end;
            }
            None => i += 1,
        }
    }
    mask
}

fn depths(chars: &[char], code: &[bool]) -> Vec<usize> {
    let mut out = Vec::with_capacity(chars.len());
    let mut stack: Vec<char> = Vec::new();
    for (i, &c) in chars.iter().enumerate() {
        if !code[i] {
            out.push(stack.len());
            continue;
        }
        let turbofish = c == '<' && i >= 2 && chars[i - 1] == ':' && chars[i - 2] == ':';
        match c {
            '(' | '[' | '{' => {
                out.push(stack.len());
                stack.push(c);
            }
            _ if turbofish => {
                out.push(stack.len());
                stack.push(c);
            }
            ')' | ']' | '}' => {
                // Unwind any unclosed turbofish first.
                while stack.last() == Some(&'<') {
                    stack.pop();
                }
                stack.pop();
                out.push(stack.len());
            }
            '>' if stack.last() == Some(&'<') => {
                stack.pop();
                out.push(stack.len());
            }
            _ => out.push(stack.len()),
        }
    }
    out
}

fn raw_prefix_allowed(chars: &[char], i: usize) -> bool {
    let before = |k: usize| k.checked_sub(1).map(|p| chars[p]);
    match before(i) {
        None => true,
        Some('b') => before(i - 1).map_or(true, |c| !is_ident_char(c)),
        Some(c) => !is_ident_char(c),
    }
}

fn line_comment_end(chars: &[char], i: usize) -> usize {
    (i..chars.len())
        .find(|&j| chars[j] == '\n')
        .unwrap_or(chars.len())
}

fn block_comment_end(chars: &[char], i: usize) -> usize {
    let mut depth = 0usize;
    let mut j = i;
    while j + 1 < chars.len() {
        match (chars[j], chars[j + 1]) {
            ('/', '*') => {
                depth += 1;
                j += 2;
            }
            ('*', '/') => {
                depth -= 1;
                j += 2;
                if depth == 0 {
                    return j;
                }
            }
            _ => j += 1,
        }
    }
    chars.len()
}

fn string_end(chars: &[char], i: usize) -> usize {
    let mut j = i + 1;
    while j < chars.len() {
        match chars[j] {
            '\\' => j += 2,
            '"' => return j + 1,
            _ => j += 1,
        }
    }
    chars.len()
}

fn raw_string_end(chars: &[char], i: usize) -> Option<usize> {
    let mut j = i + 1;
    let mut hashes = 0;
    while chars.get(j) == Some(&'#') {
        hashes += 1;
        j += 1;
    }
    if chars.get(j) != Some(&'"') {
        // A raw identifier such as `r#type`.
        return None;
    }
    j += 1;
    while j < chars.len() {
        if chars[j] == '"' && (1..=hashes).all(|k| chars.get(j + k) == Some(&'#')) {
            return Some(j + 1 + hashes);
        }
        j += 1;
    }
    Some(chars.len())
}

fn char_literal_end(chars: &[char], i: usize) -> Option<usize> {
    match chars.get(i + 1).copied() {
        Some('\\') => (i + 3..chars.len().min(i + 14))
            .find(|&j| chars[j] == '\'')
            .map(|j| j + 1),
        Some(_) if chars.get(i + 2) == Some(&'\'') => Some(i + 3),
        // A lifetime or a loop label.
        _ => None,
    }
}
