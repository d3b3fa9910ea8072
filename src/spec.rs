// src/spec.rs

//! Package specifiers and shorthand resolution
//!
//! A specifier names a vendorable package using the format:
//! `import-path[@constraint]`
//!
//! Examples:
//! - `github.com/acme/foo` - fully qualified import path, default branch
//! - `acme/foo` - shorthand, expands to `github.com/acme/foo`
//! - `acme/foo@v1.2.0` - named constraint (branch or tag)
//! - `acme/foo@7f3acd9` - pinned constraint (revision prefix)
//!
//! Resolution is pure string work: no network, no filesystem. The fetch
//! layer decides what a named constraint means against the actual remote.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Host used when a shorthand `owner/repo` specifier is expanded.
pub const DEFAULT_HOST: &str = "github.com";

/// Hosts recognized as already qualified even without consulting the
/// dotted-first-segment rule.
pub const KNOWN_HOSTS: &[&str] = &[
    "github.com",
    "gitlab.com",
    "bitbucket.org",
    "golang.org",
    "gopkg.in",
    "git.sr.ht",
];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Empty package specifier")]
    Empty,

    #[error("Package path needs at least owner/repo: {0}")]
    ShortPath(String),

    #[error("Package path contains an empty segment: {0}")]
    EmptySegment(String),

    #[error("Package path contains a relative segment: {0}")]
    RelativeSegment(String),

    #[error("Invalid characters in path segment '{segment}' of {path}")]
    InvalidSegment { path: String, segment: String },

    #[error("Cannot determine host for package path: {0}")]
    UnknownHost(String),

    #[error("Empty constraint in specifier: {0}")]
    EmptyConstraint(String),
}

/// What to check out once a package's repository is present.
///
/// A constraint that is 7 to 40 hex digits is treated as a pinned revision;
/// anything else names a branch or tag. `Default` means the remote's default
/// branch tip.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Constraint {
    /// Follow the remote default branch
    #[default]
    Default,
    /// A branch or tag name
    Named(String),
    /// An exact revision (full or abbreviated hash)
    Pinned(String),
}

impl Constraint {
    /// Classify a raw constraint string.
    pub fn parse(raw: &str) -> Self {
        if looks_like_revision(raw) {
            Constraint::Pinned(raw.to_string())
        } else {
            Constraint::Named(raw.to_string())
        }
    }

    /// The ref or revision to pass to the version control layer, if any.
    pub fn target(&self) -> Option<&str> {
        match self {
            Constraint::Default => None,
            Constraint::Named(name) => Some(name),
            Constraint::Pinned(rev) => Some(rev),
        }
    }

    pub fn is_default(&self) -> bool {
        matches!(self, Constraint::Default)
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::Default => write!(f, "default"),
            Constraint::Named(name) => write!(f, "{}", name),
            Constraint::Pinned(rev) => write!(f, "{}", rev),
        }
    }
}

/// Heuristic for revision-vs-name: 7 to 40 hex digits reads as a hash
/// prefix. A branch that happens to be short lowercase hex will be
/// misread; name such branches explicitly longer.
pub fn looks_like_revision(s: &str) -> bool {
    (7..=40).contains(&s.len()) && s.chars().all(|c| c.is_ascii_hexdigit())
}

/// A resolved package specifier: qualified import path plus constraint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackageSpec {
    /// Fully qualified import path, `host/owner/repo[/sub]`
    pub import_path: String,
    /// Checkout constraint
    pub constraint: Constraint,
}

impl PackageSpec {
    /// Parse and resolve a raw specifier as given on the command line.
    ///
    /// Splits an optional `@constraint` suffix, expands two-segment
    /// shorthand against [`DEFAULT_HOST`], and validates every path
    /// segment. Paths with three or more segments must already carry a
    /// recognizable host.
    pub fn parse(raw: &str) -> Result<Self, ResolveError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ResolveError::Empty);
        }

        let (path, constraint) = match raw.split_once('@') {
            Some((path, suffix)) => {
                if suffix.is_empty() {
                    return Err(ResolveError::EmptyConstraint(raw.to_string()));
                }
                (path, Constraint::parse(suffix))
            }
            None => (raw, Constraint::Default),
        };

        let import_path = resolve_import_path(path)?;
        Ok(Self {
            import_path,
            constraint,
        })
    }

    /// Build a spec from already-split manifest fields.
    pub fn from_parts(path: &str, constraint: Option<&str>) -> Result<Self, ResolveError> {
        let import_path = resolve_import_path(path)?;
        let constraint = match constraint {
            Some(raw) if raw.is_empty() => {
                return Err(ResolveError::EmptyConstraint(path.to_string()));
            }
            Some(raw) => Constraint::parse(raw),
            None => Constraint::Default,
        };
        Ok(Self {
            import_path,
            constraint,
        })
    }

    /// HTTPS clone URL for this package's repository.
    pub fn clone_url(&self) -> String {
        format!("https://{}.git", self.import_path)
    }
}

impl fmt::Display for PackageSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.constraint {
            Constraint::Default => write!(f, "{}", self.import_path),
            other => write!(f, "{}@{}", self.import_path, other),
        }
    }
}

impl FromStr for PackageSpec {
    type Err = ResolveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PackageSpec::parse(s)
    }
}

/// Expand shorthand and validate an import path.
pub fn resolve_import_path(path: &str) -> Result<String, ResolveError> {
    if path.is_empty() {
        return Err(ResolveError::Empty);
    }

    let segments: Vec<&str> = path.split('/').collect();
    for segment in &segments {
        if segment.is_empty() {
            return Err(ResolveError::EmptySegment(path.to_string()));
        }
        if *segment == "." || *segment == ".." {
            return Err(ResolveError::RelativeSegment(path.to_string()));
        }
        let valid_chars = |c: char| c.is_alphanumeric() || c == '.' || c == '-' || c == '_';
        if !segment.chars().all(valid_chars) {
            return Err(ResolveError::InvalidSegment {
                path: path.to_string(),
                segment: segment.to_string(),
            });
        }
    }

    // A bare host name is not a package. Anything below it is: gopkg.in
    // uses two-segment paths like gopkg.in/yaml.v2.
    if is_host(segments[0]) {
        if segments.len() < 2 {
            return Err(ResolveError::ShortPath(path.to_string()));
        }
        return Ok(path.to_string());
    }

    match segments.len() {
        1 => Err(ResolveError::ShortPath(path.to_string())),
        2 => Ok(format!("{}/{}", DEFAULT_HOST, path)),
        _ => Err(ResolveError::UnknownHost(path.to_string())),
    }
}

fn is_host(segment: &str) -> bool {
    KNOWN_HOSTS.contains(&segment) || segment.contains('.')
}
