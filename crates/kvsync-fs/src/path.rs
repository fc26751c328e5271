//! Normalized path handling for cross-platform compatibility

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// A lexically cleaned path using forward slashes internally.
///
/// On Windows backslashes become forward slashes; elsewhere a backslash
/// is an ordinary file name character. Repeated separators collapse,
/// `.` segments vanish and `..` segments consume their parent. A relative
/// path keeps leading `..` segments so that roots such as `../config`
/// still point where the operator meant. The empty path cleans to `.`.
///
/// Conversion to a platform-native `PathBuf` happens only at I/O
/// boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NormalizedPath {
    /// Internal representation always uses forward slashes
    inner: String,
}

impl NormalizedPath {
    /// Create a new NormalizedPath from any path-like input.
    ///
    /// Names that are not valid UTF-8 are replaced lossily; use
    /// [`NormalizedPath::from_native`] where that must be an error.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let raw = path.as_ref().to_string_lossy();
        Self { inner: clean(&raw) }
    }

    /// Create a NormalizedPath from a path found on disk.
    ///
    /// Fails with [`Error::NonUtf8Path`] instead of rewriting a name that
    /// has no UTF-8 form.
    pub fn from_native(path: &Path) -> Result<Self> {
        let raw = path.to_str().ok_or_else(|| Error::NonUtf8Path {
            path: path.to_path_buf(),
        })?;
        Ok(Self { inner: clean(raw) })
    }

    /// Get the internal normalized string representation.
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Convert to a platform-native PathBuf for I/O operations.
    pub fn to_native(&self) -> PathBuf {
        PathBuf::from(&self.inner)
    }

    /// Whether the path starts at the filesystem root.
    pub fn is_absolute(&self) -> bool {
        self.inner.starts_with('/')
    }

    /// Join this path with a slash-delimited segment and clean the result.
    ///
    /// Joining an empty segment returns the path unchanged.
    pub fn join(&self, segment: &str) -> Self {
        Self {
            inner: clean(&format!("{}/{}", self.inner, segment)),
        }
    }

    /// The part of this path below `base`, without a leading separator.
    ///
    /// Returns `Some("")` when both paths are equal and `None` when this
    /// path does not live under `base`.
    pub fn relative_to(&self, base: &NormalizedPath) -> Option<&str> {
        if self.inner == base.inner {
            return Some("");
        }
        match base.inner.as_str() {
            "." => {
                let escapes = self.is_absolute() || self.inner == ".." || self.inner.starts_with("../");
                (!escapes).then_some(self.inner.as_str())
            }
            "/" => self.inner.strip_prefix('/'),
            prefix => self
                .inner
                .strip_prefix(prefix)
                .and_then(|rest| rest.strip_prefix('/')),
        }
    }

    /// Get the file name component.
    pub fn file_name(&self) -> Option<&str> {
        match self.inner.rsplit('/').next() {
            Some("") | Some(".") | Some("..") | None => None,
            Some(name) => Some(name),
        }
    }

    /// Get the extension if present.
    pub fn extension(&self) -> Option<&str> {
        self.file_name().and_then(|name| {
            let idx = name.rfind('.')?;
            if idx == 0 {
                None
            } else {
                Some(&name[idx + 1..])
            }
        })
    }
}

/// Lexically clean a path string.
fn clean(raw: &str) -> String {
    let slashed = if cfg!(windows) {
        Cow::Owned(raw.replace('\\', "/"))
    } else {
        Cow::Borrowed(raw)
    };
    let absolute = slashed.starts_with('/');

    let mut parts: Vec<&str> = Vec::new();
    for segment in slashed.split('/') {
        match segment {
            "" | "." => {}
            ".." => match parts.last() {
                Some(&last) if last != ".." => {
                    parts.pop();
                }
                // `/..` is `/`
                _ if absolute => {}
                _ => parts.push(".."),
            },
            other => parts.push(other),
        }
    }

    let body = parts.join("/");
    if absolute {
        format!("/{body}")
    } else if body.is_empty() {
        ".".to_string()
    } else {
        body
    }
}

impl AsRef<Path> for NormalizedPath {
    fn as_ref(&self) -> &Path {
        Path::new(&self.inner)
    }
}

impl std::fmt::Display for NormalizedPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl From<&str> for NormalizedPath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for NormalizedPath {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<PathBuf> for NormalizedPath {
    fn from(p: PathBuf) -> Self {
        Self::new(p)
    }
}

impl From<&Path> for NormalizedPath {
    fn from(p: &Path) -> Self {
        Self::new(p)
    }
}
