use std::path::Path;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};

use crate::errors::DavResult;

const XATTR_PREFIX: &str = "user.uwsgi.webdav.";
const NS_SEPARATOR: char = '|';

/// Characters percent-encoded in a namespace URI before it's embedded in
/// an attribute name, so that a literal `|` in the URI can't be confused
/// with the namespace/name separator.
const NS_ENCODE_SET: &AsciiSet = &CONTROLS.add(b'|').add(b'%');

/// Reads, writes, and deletes dead properties on a filesystem path,
/// persisted as POSIX extended attributes.
pub struct PropertyStore;

impl PropertyStore {
    /// Attach or replace a dead property.
    pub fn set(path: &Path, local_name: &str, namespace: Option<&str>, value: &[u8]) -> DavResult<()> {
        let attr = encode_name(local_name, namespace);
        backend::set(path, &attr, value)
    }

    /// Remove a dead property. Absence of the attribute is not an error.
    pub fn delete(path: &Path, local_name: &str, namespace: Option<&str>) -> DavResult<()> {
        let attr = encode_name(local_name, namespace);
        backend::remove(path, &attr)
    }

    /// List every dead property on `path`. `with_values` controls whether
    /// values are fetched (PROPFIND "names only" mode skips this).
    pub fn list(path: &Path, with_values: bool) -> DavResult<Vec<(String, Option<String>, Option<Vec<u8>>)>> {
        backend::list(path, with_values)
    }
}

fn encode_name(local_name: &str, namespace: Option<&str>) -> String {
    match namespace {
        Some(ns) => format!(
            "{}{}{}{}",
            XATTR_PREFIX,
            utf8_percent_encode(ns, NS_ENCODE_SET),
            NS_SEPARATOR,
            local_name
        ),
        None => format!("{}{}", XATTR_PREFIX, local_name),
    }
}

fn decode_name(attr: &str) -> Option<(String, Option<String>)> {
    let rest = attr.strip_prefix(XATTR_PREFIX)?;
    match rest.find(NS_SEPARATOR) {
        Some(idx) => {
            let ns_enc = &rest[..idx];
            let local = &rest[idx + 1..];
            let ns = percent_decode_str(ns_enc).decode_utf8().ok()?.into_owned();
            Some((local.to_string(), Some(ns)))
        }
        None => Some((rest.to_string(), None)),
    }
}

#[cfg(unix)]
mod backend {
    use super::*;
    use crate::errors::DavError;

    pub(super) fn set(path: &Path, attr: &str, value: &[u8]) -> DavResult<()> {
        xattr::set(path, attr, value).map_err(|_| DavError::Forbidden)
    }

    pub(super) fn remove(path: &Path, attr: &str) -> DavResult<()> {
        match xattr::remove(path, attr) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(_) => Err(DavError::Forbidden),
        }
    }

    pub(super) fn list(
        path: &Path,
        with_values: bool,
    ) -> DavResult<Vec<(String, Option<String>, Option<Vec<u8>>)>> {
        let names = xattr::list(path).map_err(|_| DavError::Forbidden)?;
        let mut out = Vec::new();
        for name in names {
            let name = name.to_string_lossy().to_string();
            let Some((local, ns)) = decode_name(&name) else { continue };
            let value = if with_values {
                match xattr::get(path, &name) {
                    Ok(v) => v,
                    Err(_) => None,
                }
            } else {
                None
            };
            out.push((local, ns, value));
        }
        Ok(out)
    }
}

#[cfg(not(unix))]
mod backend {
    use super::*;

    pub(super) fn set(_path: &Path, _attr: &str, _value: &[u8]) -> DavResult<()> {
        Ok(())
    }

    pub(super) fn remove(_path: &Path, _attr: &str) -> DavResult<()> {
        Ok(())
    }

    pub(super) fn list(
        _path: &Path,
        _with_values: bool,
    ) -> DavResult<Vec<(String, Option<String>, Option<Vec<u8>>)>> {
        Ok(Vec::new())
    }
}
