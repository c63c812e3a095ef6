//! Route predicate evaluation.
//!
//! # Responsibilities
//! - Match request paths against declarative patterns
//! - `**` matches any remaining segments, including none
//! - `*` matches exactly one segment
//!
//! # Design Decisions
//! - Path matching is case-sensitive and segment-wise
//! - `**` is only valid as the final segment of a pattern
//! - No regex in the match path to guarantee O(segments) evaluation

use thiserror::Error;

/// Pattern compilation failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("path pattern must start with '/'")]
    MissingLeadingSlash,
    #[error("'**' is only allowed as the final segment")]
    InteriorRestWildcard,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    /// `*`: exactly one segment.
    Single,
    /// `**`: everything that remains, including nothing.
    Rest,
}

/// A compiled path pattern.
#[derive(Debug, Clone)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Compile a pattern string such as `/api/peliculas/**`.
    pub fn parse(pattern: &str) -> Result<Self, PatternError> {
        if !pattern.starts_with('/') {
            return Err(PatternError::MissingLeadingSlash);
        }
        let raw_segments = split_segments(pattern);
        let mut segments = Vec::with_capacity(raw_segments.len());
        for (i, segment) in raw_segments.iter().enumerate() {
            match *segment {
                "**" => {
                    if i + 1 != raw_segments.len() {
                        return Err(PatternError::InteriorRestWildcard);
                    }
                    segments.push(Segment::Rest);
                }
                "*" => segments.push(Segment::Single),
                literal => segments.push(Segment::Literal(literal.to_string())),
            }
        }
        Ok(Self {
            raw: pattern.to_string(),
            segments,
        })
    }

    /// Returns true if `path` satisfies this pattern.
    ///
    /// A trailing slash on the path is ignored, so `/api/peliculas/`
    /// matches the same patterns as `/api/peliculas`.
    pub fn matches(&self, path: &str) -> bool {
        let path_segments = split_segments(path);
        let mut position = 0;
        for segment in &self.segments {
            match segment {
                Segment::Rest => return true,
                Segment::Single => {
                    if position >= path_segments.len() {
                        return false;
                    }
                    position += 1;
                }
                Segment::Literal(literal) => {
                    if path_segments.get(position) != Some(&literal.as_str()) {
                        return false;
                    }
                    position += 1;
                }
            }
        }
        position == path_segments.len()
    }

    /// True when the pattern contains no wildcard segments.
    pub fn is_exact(&self) -> bool {
        self.segments
            .iter()
            .all(|s| matches!(s, Segment::Literal(_)))
    }

    /// The pattern as written in configuration.
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl std::fmt::Display for PathPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Split on `/`, dropping the leading empty segment and trailing empties.
fn split_segments(path: &str) -> Vec<&str> {
    let mut segments: Vec<&str> = path.split('/').skip(1).collect();
    while segments.last() == Some(&"") {
        segments.pop();
    }
    segments
}
