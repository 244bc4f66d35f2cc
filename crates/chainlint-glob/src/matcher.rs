//! Single-component glob matching.
//!
//! Patterns compile to a part list once and match many candidate names, the
//! way a directory scan uses them. Matching is iterative with two-pointer
//! backtracking for `*`, so pathological patterns stay linear-ish instead of
//! exploding recursively.

use crate::PatternError;

/// True when `s` contains a glob metacharacter (`*`, `?`, `[`).
pub fn has_magic(s: &str) -> bool {
    s.contains('*') || s.contains('?') || s.contains('[')
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ClassItem {
    Char(char),
    Range(char, char),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    Literal(char),
    AnyChar,
    AnyRun,
    Class { negated: bool, items: Vec<ClassItem> },
}

impl Part {
    fn matches_one(&self, c: char) -> bool {
        match self {
            Part::Literal(l) => *l == c,
            Part::AnyChar => true,
            Part::AnyRun => false,
            Part::Class { negated, items } => {
                let hit = items.iter().any(|item| match item {
                    ClassItem::Char(x) => *x == c,
                    ClassItem::Range(lo, hi) => (*lo..=*hi).contains(&c),
                });
                hit != *negated
            }
        }
    }
}

/// A compiled single-component glob pattern.
#[derive(Debug, Clone)]
pub struct Pattern {
    parts: Vec<Part>,
    /// Whether the pattern names a leading dot explicitly; hidden files
    /// only match when it does.
    dotted: bool,
}

impl Pattern {
    pub fn new(text: &str) -> Result<Self, PatternError> {
        let chars: Vec<char> = text.chars().collect();
        let mut parts = Vec::new();
        let mut i = 0;
        while i < chars.len() {
            match chars[i] {
                '*' => {
                    // consecutive stars collapse
                    if !matches!(parts.last(), Some(Part::AnyRun)) {
                        parts.push(Part::AnyRun);
                    }
                    i += 1;
                }
                '?' => {
                    parts.push(Part::AnyChar);
                    i += 1;
                }
                '\\' => {
                    let Some(&escaped) = chars.get(i + 1) else {
                        return Err(PatternError::TrailingEscape(text.to_string()));
                    };
                    parts.push(Part::Literal(escaped));
                    i += 2;
                }
                '[' => {
                    let (class, consumed) = parse_class(&chars[i..], text)?;
                    parts.push(class);
                    i += consumed;
                }
                c => {
                    parts.push(Part::Literal(c));
                    i += 1;
                }
            }
        }
        Ok(Self {
            dotted: text.starts_with('.'),
            parts,
        })
    }

    /// True when the pattern should consider hidden names.
    pub fn matches_hidden(&self) -> bool {
        self.dotted
    }

    /// Match the whole of `name` against this pattern.
    pub fn matches(&self, name: &str) -> bool {
        let name: Vec<char> = name.chars().collect();
        let (mut pi, mut ni) = (0usize, 0usize);
        let mut backtrack: Option<(usize, usize)> = None;
        while ni < name.len() {
            if pi < self.parts.len() && self.parts[pi] == Part::AnyRun {
                // tentatively match zero characters; remember where to resume
                backtrack = Some((pi, ni));
                pi += 1;
            } else if pi < self.parts.len() && self.parts[pi].matches_one(name[ni]) {
                pi += 1;
                ni += 1;
            } else if let Some((star_pi, star_ni)) = backtrack {
                // widen the most recent star by one character
                backtrack = Some((star_pi, star_ni + 1));
                pi = star_pi + 1;
                ni = star_ni + 1;
            } else {
                return false;
            }
        }
        while pi < self.parts.len() && self.parts[pi] == Part::AnyRun {
            pi += 1;
        }
        pi == self.parts.len()
    }
}

/// Parse a `[...]` class starting at `chars[0] == '['`. Returns the part and
/// the number of pattern characters consumed.
fn parse_class(chars: &[char], pattern: &str) -> Result<(Part, usize), PatternError> {
    let mut i = 1;
    let mut negated = false;
    if matches!(chars.get(i), Some('!' | '^')) {
        negated = true;
        i += 1;
    }
    let mut items = Vec::new();
    let first = i;
    loop {
        let Some(&c) = chars.get(i) else {
            return Err(PatternError::UnclosedClass(pattern.to_string()));
        };
        // "]" is literal in first position, closing afterwards
        if c == ']' && i > first {
            i += 1;
            break;
        }
        if let (Some('-'), Some(&hi)) = (chars.get(i + 1).copied(), chars.get(i + 2)) {
            if hi != ']' {
                items.push(ClassItem::Range(c, hi));
                i += 3;
                continue;
            }
        }
        items.push(ClassItem::Char(c));
        i += 1;
    }
    Ok((Part::Class { negated, items }, i))
}
