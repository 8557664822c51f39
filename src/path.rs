use std::path::{Path, PathBuf};

use crate::errors::{DavError, DavResult};

/// A (URL prefix, canonical docroot) pair, resolved once at startup.
#[derive(Debug, Clone)]
pub struct Mountpoint {
    prefix: String,
    docroot: PathBuf,
}

impl Mountpoint {
    /// Resolve `docroot` to an absolute, symlink-free path now, so that
    /// every later lookup compares against a fixed prefix. `prefix` is the
    /// URL path prefix this mountpoint answers for (e.g. `"/"` or `"/pub"`).
    pub fn new(prefix: impl Into<String>, docroot: impl AsRef<Path>) -> std::io::Result<Self> {
        let docroot = docroot.as_ref().canonicalize()?;
        Ok(Mountpoint { prefix: prefix.into(), docroot })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn docroot(&self) -> &Path {
        &self.docroot
    }

    /// `uri_path` relative to this mountpoint's prefix, with the leading
    /// slash kept (so `strip("/a/b", "/pub")` on mountpoint `/pub` yields `/a/b`).
    pub fn strip_prefix<'a>(&self, uri_path: &'a str) -> Option<&'a str> {
        if self.prefix == "/" {
            return Some(uri_path);
        }
        uri_path.strip_prefix(self.prefix.as_str())
    }
}

/// A table of mountpoints, looked up by URL prefix (longest-prefix-first).
#[derive(Debug, Clone, Default)]
pub struct MountTable {
    mounts: Vec<Mountpoint>,
}

impl MountTable {
    pub fn new() -> Self {
        MountTable { mounts: Vec::new() }
    }

    pub fn add(&mut self, m: Mountpoint) {
        self.mounts.push(m);
        // longest prefix wins on lookup.
        self.mounts.sort_by(|a, b| b.prefix.len().cmp(&a.prefix.len()));
    }

    pub fn is_empty(&self) -> bool {
        self.mounts.is_empty()
    }

    /// Find the mountpoint whose prefix matches `uri_path`, along with the
    /// path-info relative to that mountpoint (leading slash kept).
    pub fn lookup<'a>(&self, uri_path: &'a str) -> Option<(&Mountpoint, &'a str)> {
        for m in &self.mounts {
            if let Some(rest) = m.strip_prefix(uri_path) {
                return Some((m, rest));
            }
        }
        None
    }
}

/// The output of `PathResolver`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedPath {
    /// The target exists; this is its canonical (symlink-resolved) path.
    Existing(PathBuf),
    /// The target does not exist, but its parent does; this is the path the
    /// target would have, suitable for `create`/`mkdir`/`rename` calls.
    Prospective(PathBuf),
}

impl ResolvedPath {
    pub fn as_path(&self) -> &Path {
        match self {
            ResolvedPath::Existing(p) => p,
            ResolvedPath::Prospective(p) => p,
        }
    }
}

/// Maps (mountpoint docroot, URI path) pairs to filesystem paths, with
/// containment enforced against symlink escape.
pub struct PathResolver;

impl PathResolver {
    /// `resolve(mount, "/a/b")` canonicalizes `mount.docroot + "/a/b"`.
    pub fn resolve(mount: &Mountpoint, uri_path: &str) -> DavResult<ResolvedPath> {
        let candidate = join(mount.docroot(), uri_path);
        let real = candidate.canonicalize().map_err(|_| DavError::NotFound)?;
        if !contained(mount.docroot(), &real) {
            return Err(DavError::NotFound);
        }
        Ok(ResolvedPath::Existing(real))
    }

    /// Resolve the parent of `uri_path` and append the leaf, for targets
    /// that do not (yet) exist on disk.
    pub fn resolve_prospective(mount: &Mountpoint, uri_path: &str) -> DavResult<ResolvedPath> {
        let last_slash = uri_path.rfind('/').ok_or(DavError::NotFound)?;
        let parent_uri = &uri_path[..last_slash];
        let leaf = &uri_path[last_slash..];

        let parent_uri = if parent_uri.is_empty() { "/" } else { parent_uri };
        let parent = match Self::resolve(mount, parent_uri)? {
            ResolvedPath::Existing(p) => p,
            ResolvedPath::Prospective(_) => unreachable!("resolve never returns Prospective"),
        };

        let full = format!("{}{}", parent.to_string_lossy(), leaf);
        if full.len() >= libc_path_max() {
            return Err(DavError::NotFound);
        }
        let prospective = PathBuf::from(full);
        if !contained(mount.docroot(), &prospective) {
            return Err(DavError::NotFound);
        }
        Ok(ResolvedPath::Prospective(prospective))
    }
}

fn join(docroot: &Path, uri_path: &str) -> PathBuf {
    let trimmed = uri_path.trim_start_matches('/');
    if trimmed.is_empty() {
        docroot.to_path_buf()
    } else {
        docroot.join(trimmed)
    }
}

/// True if `candidate`'s components stay inside `docroot` after
/// canonicalization. realpath alone does not guarantee containment when a
/// symlink inside the docroot points outside it, so this check runs after
/// every canonicalize.
fn contained(docroot: &Path, candidate: &Path) -> bool {
    candidate.starts_with(docroot)
}

#[cfg(unix)]
fn libc_path_max() -> usize {
    libc::PATH_MAX as usize
}

#[cfg(not(unix))]
fn libc_path_max() -> usize {
    4096
}
