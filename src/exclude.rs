//! File exclusion by glob pattern.
//!
//! Patterns follow minimatch conventions: `*` and `?` stay inside one path
//! segment, `**` spans segments only when it is a whole segment, a leading
//! `.` in a segment has to be matched literally, and `{a,b}` sets expand to
//! one pattern per alternative.

use glob::{MatchOptions, Pattern};

use crate::error::{GateError, Result};

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: true,
};

/// Upper bound on the patterns one brace expression may produce.
const MAX_EXPANSIONS: usize = 1024;

/// One user-supplied pattern and the globs it expanded to.
#[derive(Debug, Clone)]
struct Exclusion {
    source: String,
    compiled: Vec<Pattern>,
}

impl Exclusion {
    fn new(source: &str) -> Result<Self> {
        let mut expanded = Vec::new();
        expand_braces(source, &mut expanded)?;
        let compiled = expanded
            .iter()
            .map(|p| {
                Pattern::new(&collapse_inner_globstars(p)).map_err(|e| {
                    GateError::Config(format!("invalid exclude pattern '{source}': {}", e.msg))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            source: source.to_string(),
            compiled,
        })
    }

    fn matches(&self, path: &str) -> bool {
        self.compiled
            .iter()
            .any(|p| p.matches_with(path, MATCH_OPTIONS))
    }
}

/// Expand `{a,b}` sets, nested ones included, into `out`. A brace with no
/// top-level comma or no closing brace is literal text.
fn expand_braces(pattern: &str, out: &mut Vec<String>) -> Result<()> {
    let mut from = 0;
    while let Some(offset) = pattern[from..].find('{') {
        let open = from + offset;
        if let Some((close, commas)) = brace_group(pattern, open) {
            if !commas.is_empty() {
                let (prefix, suffix) = (&pattern[..open], &pattern[close + 1..]);
                let mut bounds = Vec::with_capacity(commas.len() + 2);
                bounds.push(open);
                bounds.extend(commas);
                bounds.push(close);
                for pair in bounds.windows(2) {
                    let alternative = &pattern[pair[0] + 1..pair[1]];
                    expand_braces(&format!("{prefix}{alternative}{suffix}"), out)?;
                }
                return Ok(());
            }
        }
        from = open + 1;
    }

    if out.len() >= MAX_EXPANSIONS {
        return Err(GateError::Config(format!(
            "exclude pattern expands to more than {MAX_EXPANSIONS} globs"
        )));
    }
    out.push(pattern.to_string());
    Ok(())
}

/// Byte offset of the `}` closing the `{` at `open`, and the offsets of the
/// commas directly inside it.
fn brace_group(pattern: &str, open: usize) -> Option<(usize, Vec<usize>)> {
    let mut depth = 0usize;
    let mut commas = Vec::new();
    for (i, c) in pattern[open..].char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some((open + i, commas));
                }
            }
            ',' if depth == 1 => commas.push(open + i),
            _ => {}
        }
    }
    None
}

/// `**` is recursive only as a whole segment. Anywhere else a run of stars
/// behaves like a single `*`.
fn collapse_inner_globstars(pattern: &str) -> String {
    pattern
        .split('/')
        .map(|segment| {
            if segment == "**" || !segment.contains("**") {
                return segment.to_string();
            }
            let mut out = String::with_capacity(segment.len());
            for c in segment.chars() {
                if !(c == '*' && out.ends_with('*')) {
                    out.push(c);
                }
            }
            out
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// A compiled set of exclusion patterns. A path is excluded when any pattern
/// matches it.
#[derive(Debug, Clone, Default)]
pub struct ExclusionSet {
    patterns: Vec<Exclusion>,
}

impl ExclusionSet {
    /// Compile a whitespace-separated pattern list. An empty or blank string
    /// yields a set that excludes nothing.
    pub fn parse(list: &str) -> Result<Self> {
        Self::from_patterns(list.split_whitespace())
    }

    pub fn from_patterns<'a>(patterns: impl IntoIterator<Item = &'a str>) -> Result<Self> {
        let patterns = patterns
            .into_iter()
            .map(Exclusion::new)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Returns the first pattern matching `path`, as it was written.
    pub fn matching_pattern(&self, path: &str) -> Option<&str> {
        self.patterns
            .iter()
            .find(|p| p.matches(path))
            .map(|p| p.source.as_str())
    }

    pub fn matches(&self, path: &str) -> bool {
        self.matching_pattern(path).is_some()
    }
}
