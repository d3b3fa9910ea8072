// src/manifest.rs

//! The Balefile: an ordered, human-editable package manifest
//!
//! Format is one package per line, `import-path [constraint]`, with `#`
//! comments and blank lines preserved verbatim:
//!
//! ```text
//! # Balefile v1
//! github.com/acme/foo
//! acme/bar v1.2.0
//!
//! # tools
//! golang.org/x/tools/cmd/stringer 7f3acd9e21
//! ```
//!
//! The file is parsed into raw lines so that a save after editing one
//! entry reproduces every untouched byte exactly. Shorthand paths in
//! entries are resolved on parse but their written form is kept.
//!
//! The `# Balefile v<N>` header on the first non-blank line carries the
//! format version; a missing header means version 1.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::spec::{Constraint, PackageSpec, ResolveError};

/// Current manifest format version
pub const MANIFEST_VERSION: u32 = 1;

/// Default manifest name, relative to the project root
pub const DEFAULT_MANIFEST_PATH: &str = "Balefile";

const VERSION_PREFIX: &str = "# Balefile v";

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("Failed to read manifest: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to write manifest: {0}")]
    WriteError(std::io::Error),

    #[error("No manifest found at {0}")]
    NotFound(PathBuf),

    #[error("Refusing to overwrite existing manifest at {0}")]
    AlreadyExists(PathBuf),

    #[error("Malformed manifest entry at line {line}: {text}")]
    MalformedEntry { line: usize, text: String },

    #[error("Invalid manifest entry at line {line}: {source}")]
    InvalidEntry { line: usize, source: ResolveError },

    #[error("Manifest version {found} is newer than supported version {supported}")]
    UnsupportedVersion { supported: u32, found: u32 },

    #[error("Malformed manifest version header: {0}")]
    InvalidVersion(String),
}

pub type ManifestResult<T> = Result<T, ManifestError>;

/// A parsed package line, with its original text retained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    /// Fully qualified import path (shorthand already expanded)
    pub import_path: String,
    /// Checkout constraint for this package
    pub constraint: Constraint,
    raw: String,
}

impl ManifestEntry {
    fn from_spec(spec: &PackageSpec) -> Self {
        let raw = match spec.constraint.target() {
            Some(target) => format!("{} {}", spec.import_path, target),
            None => spec.import_path.clone(),
        };
        Self {
            import_path: spec.import_path.clone(),
            constraint: spec.constraint.clone(),
            raw,
        }
    }

    /// The entry as a resolved specifier.
    pub fn to_spec(&self) -> PackageSpec {
        PackageSpec {
            import_path: self.import_path.clone(),
            constraint: self.constraint.clone(),
        }
    }
}

#[derive(Debug, Clone)]
enum Line {
    Blank(String),
    Comment(String),
    Package(ManifestEntry),
}

impl Line {
    fn render(&self) -> &str {
        match self {
            Line::Blank(raw) | Line::Comment(raw) => raw,
            Line::Package(entry) => &entry.raw,
        }
    }
}

/// An ordered manifest bound to its file path.
#[derive(Debug, Clone)]
pub struct Manifest {
    path: PathBuf,
    lines: Vec<Line>,
    version: u32,
}

impl Manifest {
    /// Create an empty manifest that will save to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lines: vec![
                Line::Comment(format!("{}{}", VERSION_PREFIX, MANIFEST_VERSION)),
                Line::Blank(String::new()),
            ],
            version: MANIFEST_VERSION,
        }
    }

    /// Load a manifest, failing if the file does not exist.
    pub fn load(path: impl Into<PathBuf>) -> ManifestResult<Self> {
        let path = path.into();
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ManifestError::NotFound(path));
            }
            Err(e) => return Err(e.into()),
        };
        let mut manifest = Self::parse(&content)?;
        manifest.path = path;
        Ok(manifest)
    }

    /// Load a manifest, starting a fresh one if the file does not exist.
    pub fn load_or_new(path: impl Into<PathBuf>) -> ManifestResult<Self> {
        let path = path.into();
        match Self::load(&path) {
            Ok(manifest) => Ok(manifest),
            Err(ManifestError::NotFound(_)) => Ok(Self::new(path)),
            Err(e) => Err(e),
        }
    }

    /// Parse manifest text. The result saves to [`DEFAULT_MANIFEST_PATH`]
    /// unless loaded through [`Manifest::load`].
    pub fn parse(content: &str) -> ManifestResult<Self> {
        // Split on '\n' keeping every piece, so render() can reproduce the
        // input exactly, including a missing trailing newline.
        let mut lines = Vec::new();
        for (idx, raw) in content.split('\n').enumerate() {
            let trimmed = raw.trim();
            let line = if trimmed.is_empty() {
                Line::Blank(raw.to_string())
            } else if trimmed.starts_with('#') {
                Line::Comment(raw.to_string())
            } else {
                Line::Package(parse_entry(idx + 1, raw, trimmed)?)
            };
            lines.push(line);
        }

        let version = parse_version(&lines)?;
        if version > MANIFEST_VERSION {
            return Err(ManifestError::UnsupportedVersion {
                supported: MANIFEST_VERSION,
                found: version,
            });
        }

        Ok(Self {
            path: PathBuf::from(DEFAULT_MANIFEST_PATH),
            lines,
            version,
        })
    }

    /// Render the manifest back to text.
    pub fn render(&self) -> String {
        let rendered: Vec<&str> = self.lines.iter().map(Line::render).collect();
        rendered.join("\n")
    }

    /// Write atomically: temp file in the same directory, then rename.
    pub fn save(&self) -> ManifestResult<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir).map_err(ManifestError::WriteError)?;
        tmp.write_all(self.render().as_bytes())
            .map_err(ManifestError::WriteError)?;
        tmp.persist(&self.path)
            .map_err(|e| ManifestError::WriteError(e.error))?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// Package entries in file order.
    pub fn packages(&self) -> impl Iterator<Item = &ManifestEntry> {
        self.lines.iter().filter_map(|line| match line {
            Line::Package(entry) => Some(entry),
            _ => None,
        })
    }

    pub fn len(&self) -> usize {
        self.packages().count()
    }

    pub fn is_empty(&self) -> bool {
        self.packages().next().is_none()
    }

    pub fn get(&self, import_path: &str) -> Option<&ManifestEntry> {
        self.packages().find(|e| e.import_path == import_path)
    }

    pub fn contains(&self, import_path: &str) -> bool {
        self.get(import_path).is_some()
    }

    /// Add or update a package. Returns false when the identical spec is
    /// already present. An updated entry is rewritten in canonical form;
    /// every other line keeps its bytes.
    pub fn add_package(&mut self, spec: &PackageSpec) -> bool {
        if let Some(pos) = self.position(&spec.import_path) {
            if let Line::Package(existing) = &self.lines[pos] {
                if existing.constraint == spec.constraint {
                    return false;
                }
            }
            self.lines[pos] = Line::Package(ManifestEntry::from_spec(spec));
        } else {
            let at = self
                .lines
                .iter()
                .rposition(|l| matches!(l, Line::Package(_)))
                .map(|p| p + 1)
                .unwrap_or_else(|| self.tail_position());
            self.lines.insert(at, Line::Package(ManifestEntry::from_spec(spec)));
        }
        self.ensure_trailing_newline();
        true
    }

    /// Remove a package by import path. Removing an absent path is a no-op.
    pub fn remove_package(&mut self, import_path: &str) -> bool {
        match self.position(import_path) {
            Some(pos) => {
                self.lines.remove(pos);
                self.ensure_trailing_newline();
                true
            }
            None => false,
        }
    }

    fn position(&self, import_path: &str) -> Option<usize> {
        self.lines.iter().position(|line| {
            matches!(line, Line::Package(entry) if entry.import_path == import_path)
        })
    }

    /// Insertion point for a first entry: before the trailing newline
    /// piece if the file has one.
    fn tail_position(&self) -> usize {
        match self.lines.last() {
            Some(Line::Blank(raw)) if raw.is_empty() => self.lines.len() - 1,
            _ => self.lines.len(),
        }
    }

    fn ensure_trailing_newline(&mut self) {
        match self.lines.last() {
            Some(Line::Blank(raw)) if raw.is_empty() => {}
            _ => self.lines.push(Line::Blank(String::new())),
        }
    }
}

fn parse_entry(line: usize, raw: &str, trimmed: &str) -> ManifestResult<ManifestEntry> {
    let mut fields = trimmed.split_whitespace();
    let path = fields.next().expect("non-blank line has a first field");
    let constraint = fields.next();
    if fields.next().is_some() {
        return Err(ManifestError::MalformedEntry {
            line,
            text: raw.to_string(),
        });
    }

    let spec = PackageSpec::from_parts(path, constraint)
        .map_err(|source| ManifestError::InvalidEntry { line, source })?;
    Ok(ManifestEntry {
        import_path: spec.import_path,
        constraint: spec.constraint,
        raw: raw.to_string(),
    })
}

/// The version header is only recognized on the first non-blank line.
fn parse_version(lines: &[Line]) -> ManifestResult<u32> {
    for line in lines {
        match line {
            Line::Blank(_) => continue,
            Line::Comment(raw) => {
                let trimmed = raw.trim();
                if let Some(rest) = trimmed.strip_prefix(VERSION_PREFIX) {
                    return rest
                        .trim()
                        .parse()
                        .map_err(|_| ManifestError::InvalidVersion(raw.clone()));
                }
                return Ok(1);
            }
            Line::Package(_) => return Ok(1),
        }
    }
    Ok(1)
}
