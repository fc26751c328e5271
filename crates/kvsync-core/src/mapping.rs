//! Translation between local file paths and store keys
//!
//! A [`Mapping`] pairs a local root with a store prefix. A file at
//! `<root>/<rel>` lives at key `<prefix>/<rel>` and back again. With an
//! empty prefix the key is just `<rel>`.

use std::path::Path;

use kvsync_fs::NormalizedPath;

use crate::{Error, Result};

/// A local root and a store prefix, both normalized once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mapping {
    local_root: NormalizedPath,
    store_prefix: String,
}

impl Mapping {
    /// Normalize `local_root` and `store_prefix`.
    ///
    /// The prefix is cleaned like a path and loses any leading or trailing
    /// separator, so `"/svc/"`, `"svc"` and `"svc/./"` are the same prefix,
    /// and `"/"` or `""` both mean the store root.
    pub fn new(local_root: impl AsRef<Path>, store_prefix: &str) -> Self {
        Self {
            local_root: NormalizedPath::new(local_root),
            store_prefix: normalize_prefix(store_prefix),
        }
    }

    pub fn local_root(&self) -> &NormalizedPath {
        &self.local_root
    }

    pub fn store_prefix(&self) -> &str {
        &self.store_prefix
    }

    /// The prefix to enumerate the store with.
    ///
    /// Ends in a separator so that `svc` never matches `svc2/...`.
    pub fn list_prefix(&self) -> String {
        if self.store_prefix.is_empty() {
            String::new()
        } else {
            format!("{}/", self.store_prefix)
        }
    }

    /// The store key for a file under the local root.
    pub fn to_store_key(&self, file: &NormalizedPath) -> Result<String> {
        let relative = file
            .relative_to(&self.local_root)
            .ok_or_else(|| Error::OutsideRoot {
                path: file.clone(),
                root: self.local_root.clone(),
            })?;

        let key = match (self.store_prefix.as_str(), relative) {
            ("", rel) => rel.to_string(),
            (prefix, "") => prefix.to_string(),
            (prefix, rel) => format!("{prefix}/{rel}"),
        };
        Ok(key.trim_start_matches('/').to_string())
    }

    /// The local path for a key under the store prefix.
    ///
    /// Keys with `.` or `..` segments are refused, and so is any key whose
    /// joined path does not land under the local root. On Windows a
    /// backslash separates segments too; elsewhere it is part of a name.
    pub fn to_local_path(&self, key: &str) -> Result<NormalizedPath> {
        let relative = self.relative_key(key)?;

        if let Some(segment) = relative
            .split(is_separator)
            .find(|s| matches!(*s, "." | ".."))
        {
            return Err(Error::UnsafeKey {
                key: key.to_string(),
                segment: segment.to_string(),
            });
        }

        let path = self.local_root.join(relative);
        if path.relative_to(&self.local_root).is_none() {
            return Err(Error::UnsafeKey {
                key: key.to_string(),
                segment: relative.to_string(),
            });
        }
        Ok(path)
    }

    fn relative_key<'k>(&self, key: &'k str) -> Result<&'k str> {
        let key = key.trim_start_matches('/');
        if self.store_prefix.is_empty() {
            return Ok(key);
        }
        match key.strip_prefix(self.store_prefix.as_str()) {
            Some("") => Ok(""),
            Some(rest) if rest.starts_with('/') => Ok(rest.trim_start_matches('/')),
            _ => Err(Error::OutsidePrefix {
                key: key.to_string(),
                prefix: self.store_prefix.clone(),
            }),
        }
    }
}

fn is_separator(c: char) -> bool {
    c == '/' || (cfg!(windows) && c == '\\')
}

fn normalize_prefix(prefix: &str) -> String {
    match NormalizedPath::new(prefix).as_str().trim_start_matches('/') {
        "." => String::new(),
        cleaned => cleaned.to_string(),
    }
}
