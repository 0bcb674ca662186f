//! Compiled path patterns.
//!
//! # Responsibilities
//! - Compile a normalized route path into matchable segments
//! - Match a concrete path, extracting decoded params
//! - Render a concrete path from a param map (named navigation,
//!   redirect templates, alias canonicalization)
//!
//! # Design Decisions
//! - Segment-wise matching instead of a regex engine; route paths are
//!   too structured to justify one
//! - Static segments compare case-insensitively unless the route opts
//!   into case sensitivity
//! - A bare `*` pattern captures the entire path under the reserved
//!   param name [`PATH_MATCH`]

use std::collections::HashMap;

use thiserror::Error;

/// Reserved param name that receives the remainder matched by a
/// wildcard segment.
pub const PATH_MATCH: &str = "pathMatch";

/// Per-route matching options.
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternOptions {
    /// Static segments match exactly rather than case-insensitively.
    pub case_sensitive: bool,
    /// Trailing slashes are significant.
    pub strict: bool,
}

/// Failure to render a concrete path from a param map.
#[derive(Debug, Error)]
pub enum PatternError {
    #[error("missing required param \"{name}\"")]
    MissingParam { name: String },
}

#[derive(Debug, Clone)]
enum Segment {
    Static(String),
    Param(String),
    CatchAll(String),
}

/// A route path compiled for matching and rendering.
#[derive(Debug, Clone)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
    options: PatternOptions,
}

impl PathPattern {
    /// Compile a normalized path. Never fails: every path string is a
    /// valid pattern.
    pub fn compile(path: &str, options: PatternOptions) -> Self {
        let trimmed = path.strip_prefix('/').unwrap_or(path);
        let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
        let segments = if trimmed.is_empty() {
            Vec::new()
        } else {
            trimmed
                .split('/')
                .map(|seg| {
                    if seg == "*" {
                        Segment::CatchAll(PATH_MATCH.to_string())
                    } else if let Some(name) = seg.strip_prefix(':') {
                        Segment::Param(name.to_string())
                    } else {
                        Segment::Static(seg.to_string())
                    }
                })
                .collect()
        };

        let mut seen = std::collections::HashSet::new();
        for segment in &segments {
            if let Segment::Param(name) | Segment::CatchAll(name) = segment {
                if !seen.insert(name.as_str()) {
                    tracing::warn!(path, param = %name, "duplicate param name in path");
                }
            }
        }

        Self {
            raw: path.to_string(),
            segments,
            options,
        }
    }

    /// The path this pattern was compiled from.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// True for the bare catch-all pattern `*`.
    pub fn is_wildcard_only(&self) -> bool {
        self.raw == "*"
    }

    /// Names of the params this pattern captures, in path order.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|seg| match seg {
            Segment::Param(name) | Segment::CatchAll(name) => Some(name.as_str()),
            Segment::Static(_) => None,
        })
    }

    /// Match a concrete path, returning decoded params on success.
    pub fn matches(&self, path: &str) -> Option<HashMap<String, String>> {
        let mut params = HashMap::new();

        if self.is_wildcard_only() {
            params.insert(PATH_MATCH.to_string(), path.to_string());
            return Some(params);
        }

        let mut trimmed = path.strip_prefix('/').unwrap_or(path);
        if !self.options.strict && trimmed.len() > 1 && trimmed.ends_with('/') {
            trimmed = &trimmed[..trimmed.len() - 1];
        } else if self.options.strict {
            let raw_trailing = self.raw.len() > 1 && self.raw.ends_with('/');
            let path_trailing = trimmed.ends_with('/');
            if raw_trailing != path_trailing {
                return None;
            }
            trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
        }

        let pieces: Vec<&str> = if trimmed.is_empty() {
            Vec::new()
        } else {
            trimmed.split('/').collect()
        };

        let mut i = 0;
        for segment in &self.segments {
            match segment {
                Segment::Static(expect) => {
                    let got = pieces.get(i)?;
                    let matched = if self.options.case_sensitive {
                        *got == expect.as_str()
                    } else {
                        got.eq_ignore_ascii_case(expect)
                    };
                    if !matched {
                        return None;
                    }
                    i += 1;
                }
                Segment::Param(name) => {
                    let got = pieces.get(i)?;
                    if got.is_empty() {
                        return None;
                    }
                    params.insert(name.clone(), decode_segment(got));
                    i += 1;
                }
                Segment::CatchAll(name) => {
                    // Consumes everything that remains, including an
                    // empty remainder.
                    let rest = pieces[i.min(pieces.len())..].join("/");
                    params.insert(name.clone(), decode_segment(&rest));
                    i = pieces.len();
                }
            }
        }

        if i == pieces.len() {
            Some(params)
        } else {
            None
        }
    }

    /// Render a concrete path by substituting params into the pattern.
    pub fn render(&self, params: &HashMap<String, String>) -> Result<String, PatternError> {
        if self.is_wildcard_only() {
            return params
                .get(PATH_MATCH)
                .cloned()
                .ok_or_else(|| PatternError::MissingParam {
                    name: PATH_MATCH.to_string(),
                });
        }

        let mut out = String::new();
        for segment in &self.segments {
            out.push('/');
            match segment {
                Segment::Static(s) => out.push_str(s),
                Segment::Param(name) => {
                    let value = params.get(name).ok_or_else(|| PatternError::MissingParam {
                        name: name.clone(),
                    })?;
                    out.push_str(&urlencoding::encode(value));
                }
                Segment::CatchAll(name) => {
                    let value = params.get(name).ok_or_else(|| PatternError::MissingParam {
                        name: name.clone(),
                    })?;
                    // Wildcard remainders keep their slashes verbatim.
                    out.push_str(value.trim_start_matches('/'));
                }
            }
        }
        if out.is_empty() {
            out.push('/');
        }
        if self.options.strict && self.raw.len() > 1 && self.raw.ends_with('/') {
            out.push('/');
        }
        Ok(out)
    }
}

fn decode_segment(s: &str) -> String {
    urlencoding::decode(s)
        .map(|cow| cow.into_owned())
        .unwrap_or_else(|_| s.to_string())
}
